//! Tile factory and match-free board generation.

use crate::board::{Board, Position, Special, Tile, TileId, TileKind};
use crate::matcher::find_matches;
use log::trace;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Countdown tiles start appearing at this level.
pub const COUNTDOWN_MIN_LEVEL: u32 = 3;
/// Per-cell chance of a countdown tile once they are enabled.
pub const COUNTDOWN_CHANCE: f64 = 0.05;

/// Source of fresh tiles: a seeded RNG plus a monotonically increasing id counter.
#[derive(Debug, Clone)]
pub struct TileFactory {
    rng: SmallRng,
    next_id: TileId,
}

impl TileFactory {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            next_id: 1,
        }
    }

    /// Factory seeded from the thread RNG.
    pub fn from_entropy() -> Self {
        Self::new(rand::random())
    }

    /// Seed for a follow-up session; keeps restarts reproducible under a fixed seed.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.random()
    }

    fn take_id(&mut self) -> TileId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Uniform over the matchable colours; from `COUNTDOWN_MIN_LEVEL` a small chance of grey.
    pub fn random_kind(&mut self, level: u32) -> TileKind {
        if level >= COUNTDOWN_MIN_LEVEL && self.rng.random_bool(COUNTDOWN_CHANCE) {
            return TileKind::Countdown;
        }
        TileKind::MATCHABLE[self.rng.random_range(0..TileKind::MATCHABLE.len())]
    }

    pub fn tile(&mut self, pos: Position, level: u32) -> Tile {
        let kind = self.random_kind(level);
        let id = self.take_id();
        Tile::new(id, kind, pos)
    }

    pub fn special(&mut self, pos: Position, kind: TileKind, special: Special) -> Tile {
        let id = self.take_id();
        Tile::new(id, kind, pos).with_special(special)
    }

    /// Fully populated board with no matches. Any tile caught in a match is re-rolled
    /// until a scan comes back empty.
    pub fn generate(&mut self, size: usize, level: u32) -> Board {
        let mut board = Board::from_fn(size, |pos| self.tile(pos, level));
        let mut rerolls = 0usize;
        loop {
            let matches = find_matches(&board);
            if matches.is_empty() {
                break;
            }
            for pos in matches.iter().flat_map(|m| m.positions.iter().copied()) {
                let tile = self.tile(pos, level);
                board.set(pos, tile);
                rerolls += 1;
            }
        }
        trace!("generated {size}x{size} board at level {level} after {rerolls} re-rolls\n{board}");
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_is_match_free_and_full() {
        let mut factory = TileFactory::new(7);
        for level in 1..6 {
            let board = factory.generate(8, level);
            assert!(find_matches(&board).is_empty());
            assert_eq!(board.tiles().count(), 64);
            for pos in board.positions() {
                assert_eq!(board[pos].position, pos);
                assert!(!board[pos].matched);
            }
        }
    }

    #[test]
    fn test_no_countdown_below_level_three() {
        let mut factory = TileFactory::new(11);
        for _ in 0..20 {
            let board = factory.generate(8, 2);
            assert!(board.tiles().all(|t| !t.kind.is_countdown()));
        }
    }

    #[test]
    fn test_countdown_appears_from_level_three() {
        let mut factory = TileFactory::new(3);
        let greys = (0..5000)
            .filter(|_| factory.random_kind(3) == TileKind::Countdown)
            .count();
        // 5% of 5000 is 250.
        assert!((150..350).contains(&greys), "got {greys}");
    }

    #[test]
    fn test_countdown_tiles_start_at_three() {
        let mut factory = TileFactory::new(5);
        let tile = (0..1000)
            .map(|i| factory.tile(Position::new(0, i % 8), 4))
            .find(|t| t.kind.is_countdown())
            .expect("a grey tile in 1000 draws");
        assert_eq!(tile.countdown, Some(3));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut factory = TileFactory::new(1);
        let board = factory.generate(8, 1);
        let extra = factory.tile(Position::new(0, 0), 1);
        let mut ids: HashSet<_> = board.tiles().map(|t| t.id).collect();
        assert_eq!(ids.len(), 64);
        assert!(ids.insert(extra.id));
    }

    #[test]
    fn test_same_seed_same_board() {
        let a = TileFactory::new(42).generate(8, 3);
        let b = TileFactory::new(42).generate(8, 3);
        assert_eq!(a, b);
    }
}

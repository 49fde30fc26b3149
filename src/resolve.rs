//! Marking matched tiles and running bolt, line-capture and bomb chain reactions.

use crate::board::{Board, Position, TileKind};
use crate::matcher::{Axis, Match, MatchKind};
use log::debug;
use std::collections::{HashSet, VecDeque};

/// Blast radius of a bomb (Chebyshev distance).
pub const BOMB_RADIUS: usize = 2;

/// Result of marking one match set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Board with every consumed tile flagged `matched`.
    pub board: Board,
    /// Bombs that went off, in detonation order.
    pub detonations: Vec<Position>,
    /// Colours cleared by bolts, in trigger order.
    pub bolts: Vec<TileKind>,
    /// Countdown tiles that reached zero this pass.
    pub expired_countdowns: usize,
}

/// Mark every tile consumed by `matches`, including chain reactions.
///
/// Order: bolts first (colour-wide), then full-line captures of runs of four, then the
/// bomb queue, then the plain match positions, and finally countdown decay next to any
/// original match position. Each cell is marked at most once and each bomb detonates at
/// most once.
pub fn resolve_matches(board: &Board, matches: &[Match]) -> Resolution {
    let mut next = board.clone();
    let mut processed: HashSet<Position> = HashSet::new();
    let mut explosions: VecDeque<Position> = VecDeque::new();
    let mut bolts: Vec<TileKind> = Vec::new();

    let matched: Vec<Position> = matches
        .iter()
        .flat_map(|m| m.positions.iter().copied())
        .collect();

    for &pos in &matched {
        let tile = &board[pos];
        if tile.is_bomb() {
            explosions.push_back(pos);
        }
        if tile.is_bolt() {
            bolts.push(tile.kind);
        }
    }

    for &color in &bolts {
        for pos in board.positions() {
            let tile = &mut next[pos];
            if tile.kind != color || !processed.insert(pos) {
                continue;
            }
            if tile.is_bomb() {
                explosions.push_back(pos);
            } else {
                tile.special = None;
            }
            tile.matched = true;
            tile.highlight = Some(color);
        }
    }

    for m in matches.iter().filter(|m| m.kind == MatchKind::Line4Capture) {
        let (Some(&first), Some(line)) = (m.positions.first(), m.line()) else {
            continue;
        };
        let color = board[first].kind;
        let cells: Vec<Position> = match m.axis {
            Axis::Row => board.row(line).collect(),
            Axis::Column => board.column(line).collect(),
        };
        for pos in cells {
            let tile = &mut next[pos];
            if tile.kind.is_countdown() {
                continue;
            }
            if tile.is_bomb() {
                explosions.push_back(pos);
                continue;
            }
            tile.matched = true;
            tile.highlight = Some(color);
            processed.insert(pos);
        }
    }

    let mut detonated: HashSet<Position> = HashSet::new();
    let mut detonations = Vec::new();
    while let Some(center) = explosions.pop_front() {
        if !detonated.insert(center) {
            continue;
        }
        detonations.push(center);
        let color = next[center].kind;
        for pos in blast_area(center, next.size()) {
            if processed.contains(&pos) {
                continue;
            }
            let tile = &mut next[pos];
            if tile.is_bomb() && !detonated.contains(&pos) {
                explosions.push_back(pos);
            }
            tile.matched = true;
            tile.highlight = Some(color);
            processed.insert(pos);
        }
        let bomb = &mut next[center];
        bomb.special = None;
        bomb.matched = true;
        bomb.highlight = Some(color);
        processed.insert(center);
    }

    for &pos in &matched {
        if processed.insert(pos) {
            next[pos].matched = true;
        }
    }

    let touching: HashSet<Position> = matched
        .iter()
        .flat_map(|p| p.neighbours(board.size()))
        .collect();
    let mut expired_countdowns = 0;
    for pos in board.positions() {
        if processed.contains(&pos) || !touching.contains(&pos) {
            continue;
        }
        let tile = &mut next[pos];
        if !tile.kind.is_countdown() || tile.matched {
            continue;
        }
        let Some(count) = tile.countdown else {
            continue;
        };
        let left = count.saturating_sub(1);
        tile.countdown = Some(left);
        if left == 0 {
            tile.matched = true;
            expired_countdowns += 1;
        }
        processed.insert(pos);
    }

    debug!(
        "resolved {} matches: {} tiles marked, {} bombs, {} bolts",
        matches.len(),
        next.matched_count(),
        detonations.len(),
        bolts.len()
    );

    Resolution {
        board: next,
        detonations,
        bolts,
        expired_countdowns,
    }
}

/// Cells within `BOMB_RADIUS` of `center`, clipped to the board.
pub fn blast_area(center: Position, size: usize) -> impl Iterator<Item = Position> {
    let rows = center.row.saturating_sub(BOMB_RADIUS)..=(center.row + BOMB_RADIUS).min(size - 1);
    let cols = center.col.saturating_sub(BOMB_RADIUS)..=(center.col + BOMB_RADIUS).min(size - 1);
    rows.flat_map(move |row| cols.clone().map(move |col| Position::new(row, col)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Special;
    use crate::matcher::find_matches;

    fn board(s: &str) -> Board {
        s.parse().expect("valid layout")
    }

    fn p(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    fn line3(positions: &[(usize, usize)], axis: Axis) -> Match {
        Match {
            kind: MatchKind::Line3,
            axis,
            positions: positions.iter().map(|&(r, c)| p(r, c)).collect(),
        }
    }

    #[test]
    fn test_plain_match_marks_only_its_tiles() {
        let b = board(
            "RRRBG
             BGBGB
             GBGBG
             BGBGB
             GBGBG",
        );
        let r = resolve_matches(&b, &find_matches(&b));
        assert_eq!(r.board.matched_count(), 3);
        assert!(r.board[p(0, 0)].matched && r.board[p(0, 2)].matched);
        assert!(!r.board[p(0, 3)].matched);
        assert!(r.detonations.is_empty() && r.bolts.is_empty());
        assert!(!b[p(0, 0)].matched, "input untouched");
    }

    #[test]
    fn test_line_capture_marks_whole_row_except_countdown() {
        let b = board(
            "RRRRB#GY
             BGBGBGBG
             GBGBGBGB
             BGBGBGBG
             GBGBGBGB
             BGBGBGBG
             GBGBGBGB
             BGBGBGBG",
        );
        let r = resolve_matches(&b, &find_matches(&b));
        for col in 0..8 {
            let tile = &r.board[p(0, col)];
            assert_eq!(tile.matched, col != 5, "col {col}");
        }
        assert_eq!(r.board[p(0, 4)].highlight, Some(TileKind::Red));
        assert_eq!(r.board.matched_count(), 7);
    }

    #[test]
    fn test_line_capture_hands_bombs_to_the_blast() {
        let mut b = board(
            "RRRRBGBGB
             BGBGBGBGB
             GBGBGBGBG
             BGBGBGBGB
             GBGBGBGBG
             BGBGBGBGB
             GBGBGBGBG
             BGBGBGBGB
             GBGBGBGBG",
        );
        b[p(0, 8)].special = Some(Special::Bomb);
        let r = resolve_matches(&b, &find_matches(&b));
        assert_eq!(r.detonations, vec![p(0, 8)]);
        // Blast covers rows 0..=2, cols 6..=8.
        assert!(r.board[p(2, 6)].matched);
        assert!(!r.board[p(3, 6)].matched);
        assert!(!r.board[p(0, 8)].is_bomb());
        assert_eq!(r.board[p(2, 6)].highlight, Some(TileKind::Blue));
    }

    #[test]
    fn test_bomb_clears_clipped_five_by_five() {
        let mut b = board(
            "RRRBGBG
             BGBGBGB
             GBGBGBG
             BGBGBGB
             GBGBGBG
             BGBGBGB
             GBGBGBG",
        );
        b[p(0, 1)].special = Some(Special::Bomb);
        let r = resolve_matches(&b, &[line3(&[(0, 0), (0, 1), (0, 2)], Axis::Row)]);
        assert_eq!(r.detonations, vec![p(0, 1)]);
        for pos in b.positions() {
            let inside = pos.chebyshev(p(0, 1)) <= 2;
            assert_eq!(r.board[pos].matched, inside, "{pos}");
        }
        assert_eq!(r.board.matched_count(), 3 * 4);
        assert_eq!(r.board[p(0, 1)].special, None);
    }

    #[test]
    fn test_bomb_chain_detonates_each_bomb_once() {
        let mut b = board(
            "RRRBGBGB
             BGBGBGBG
             GBGBGBGB
             BGBGBGBG
             GBGBGBGB
             BGBGBGBG
             GBGBGBGB
             BGBGBGBG",
        );
        b[p(0, 0)].special = Some(Special::Bomb);
        b[p(2, 2)].special = Some(Special::Bomb);
        b[p(4, 4)].special = Some(Special::Bomb);
        b[p(7, 7)].special = Some(Special::Bomb);
        let r = resolve_matches(&b, &[line3(&[(0, 0), (0, 1), (0, 2)], Axis::Row)]);
        assert_eq!(r.detonations, vec![p(0, 0), p(2, 2), p(4, 4)]);
        assert!(r.board[p(6, 6)].matched);
        assert!(!r.board[p(7, 7)].matched);
        assert!(r.board[p(7, 7)].is_bomb());
        let unique: HashSet<_> = r.detonations.iter().collect();
        assert_eq!(unique.len(), r.detonations.len());
    }

    #[test]
    fn test_bolt_clears_every_tile_of_its_colour() {
        let mut b = board(
            "YYYBG
             BGRGB
             GBGBR
             RGBGB
             GBGRG",
        );
        b[p(0, 1)].special = Some(Special::Bolt);
        b[p(0, 1)].kind = TileKind::Red;
        b[p(0, 0)].kind = TileKind::Red;
        b[p(0, 2)].kind = TileKind::Red;
        let r = resolve_matches(&b, &find_matches(&b));
        assert_eq!(r.bolts, vec![TileKind::Red]);
        for pos in b.positions() {
            assert_eq!(r.board[pos].matched, b[pos].kind == TileKind::Red, "{pos}");
        }
        assert!(r.board.tiles().all(|t| !t.is_bolt()));
    }

    #[test]
    fn test_bolt_sets_off_bombs_of_its_colour() {
        let mut b = board(
            "RRRBGBGB
             BGBGBGBG
             GBGBGBGB
             BGBGBGBG
             GBGBGBGB
             BGBGBGBG
             GBGBGBGB
             BGBGBGBR",
        );
        b[p(0, 0)].special = Some(Special::Bolt);
        b[p(7, 7)].special = Some(Special::Bomb);
        let r = resolve_matches(&b, &find_matches(&b));
        assert_eq!(r.detonations, vec![p(7, 7)]);
        assert!(r.board[p(5, 5)].matched);
        assert!(!r.board[p(4, 4)].matched);
        assert!(!r.board[p(7, 7)].is_bomb());
    }

    #[test]
    fn test_countdown_decrements_next_to_match() {
        let b = board(
            "RRRBG
             #G2GB
             GBG1G
             BGBGB
             GBGB#",
        );
        let r = resolve_matches(&b, &find_matches(&b));
        assert_eq!(r.board[p(1, 0)].countdown, Some(2));
        assert!(!r.board[p(1, 0)].matched);
        assert_eq!(r.board[p(1, 2)].countdown, Some(1));
        // Not adjacent to the match.
        assert_eq!(r.board[p(2, 3)].countdown, Some(1));
        assert_eq!(r.board[p(4, 4)].countdown, Some(3));
        assert_eq!(r.expired_countdowns, 0);
    }

    #[test]
    fn test_countdown_at_one_expires() {
        let b = board(
            "RRRBG
             1GBGB
             GBGBG
             BGBGB
             GBGBG",
        );
        let r = resolve_matches(&b, &find_matches(&b));
        assert!(r.board[p(1, 0)].matched);
        assert_eq!(r.board[p(1, 0)].countdown, Some(0));
        assert_eq!(r.expired_countdowns, 1);
    }

    #[test]
    fn test_blast_area_clips_at_corner() {
        let cells: Vec<_> = blast_area(p(0, 0), 8).collect();
        assert_eq!(cells.len(), 9);
        assert_eq!(blast_area(p(4, 4), 8).count(), 25);
        assert_eq!(blast_area(p(7, 6), 8).count(), 12);
    }
}

//! Property-based tests for board generation, resolution and refill.

#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use std::collections::HashSet;

use tilebrawl::generator::TileFactory;
use tilebrawl::gravity::collapse_and_refill;
use tilebrawl::matcher::{MatchKind, find_matches};
use tilebrawl::resolve::resolve_matches;
use tilebrawl::{Position, Special, TileKind};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Fresh boards are full, match-free and carry unique ids.
    #[test]
    fn prop_generated_board_is_match_free(
        seed in any::<u64>(),
        size in 3usize..12,
        level in 1u32..8,
    ) {
        let board = TileFactory::new(seed).generate(size, level);
        prop_assert_eq!(board.size(), size);
        prop_assert!(find_matches(&board).is_empty());
        let ids: HashSet<u64> = board.tiles().map(|t| t.id).collect();
        prop_assert_eq!(ids.len(), size * size);
        for pos in board.positions() {
            prop_assert_eq!(board[pos].position, pos);
            prop_assert!(!board[pos].matched);
        }
        if level < 3 {
            prop_assert!(board.tiles().all(|t| !t.kind.is_countdown()));
        }
    }

    /// Swapping the same pair twice restores the layout.
    #[test]
    fn prop_swap_twice_is_identity(
        seed in any::<u64>(),
        row in 0usize..8,
        col in 0usize..7,
    ) {
        let board = TileFactory::new(seed).generate(8, 1);
        let a = Position::new(row, col);
        let b = Position::new(row, col + 1);
        let back = board.swapped(a, b).swapped(a, b);
        prop_assert!(back.same_layout(&board));
    }

    /// Refill leaves a full board without flags, and spawns exactly one tile per removed one.
    #[test]
    fn prop_refill_replaces_every_matched_tile(
        seed in any::<u64>(),
        marks in prop::collection::vec((0usize..8, 0usize..8), 0..24),
    ) {
        let mut factory = TileFactory::new(seed);
        let mut board = factory.generate(8, 1);
        let marked: HashSet<Position> =
            marks.into_iter().map(|(r, c)| Position::new(r, c)).collect();
        for &pos in &marked {
            board[pos].matched = true;
            board[pos].highlight = Some(board[pos].kind);
        }

        let refill = collapse_and_refill(&board, &mut factory, 1, false);
        prop_assert_eq!(refill.spawned.len(), marked.len());
        prop_assert_eq!(refill.drained, 0);
        for pos in refill.board.positions() {
            let tile = &refill.board[pos];
            prop_assert_eq!(tile.position, pos);
            prop_assert!(!tile.matched);
            prop_assert!(tile.highlight.is_none());
        }
        for col in 0..8 {
            let removed = marked.iter().filter(|p| p.col == col).count();
            // Survivors keep their top-to-bottom order below the spawned tiles.
            let before: Vec<u64> = board
                .column(col)
                .filter(|&p| !marked.contains(&p))
                .map(|p| board[p].id)
                .collect();
            let after: Vec<u64> = refill
                .board
                .column(col)
                .skip(removed)
                .map(|p| refill.board[p].id)
                .collect();
            prop_assert_eq!(before, after);
        }
        for spawn in &refill.spawned {
            prop_assert!(spawn.from_row < 0);
        }
    }

    /// Every bomb on the board goes off at most once, however the chain runs.
    #[test]
    fn prop_bombs_detonate_once(
        seed in any::<u64>(),
        bombs in prop::collection::vec((0usize..8, 0usize..8), 1..10),
    ) {
        let mut board = TileFactory::new(seed).generate(8, 1);
        for &(r, c) in &bombs {
            let pos = Position::new(r, c);
            board[pos].special = Some(Special::Bomb);
        }
        // Force a match through the first bomb by painting its row neighbours.
        let (r, c) = bombs[0];
        let start = c.min(5);
        let kind = board[Position::new(r, start)].kind;
        let kind = if kind.is_countdown() { TileKind::Red } else { kind };
        for col in start..start + 3 {
            board[Position::new(r, col)].kind = kind;
        }
        let matches = find_matches(&board);
        let resolution = resolve_matches(&board, &matches);
        let unique: HashSet<Position> = resolution.detonations.iter().copied().collect();
        prop_assert_eq!(unique.len(), resolution.detonations.len());
        for pos in &resolution.detonations {
            prop_assert!(resolution.board[*pos].matched);
        }
    }

    /// A run of exactly four takes every same-colour tile in its line.
    #[test]
    fn prop_line_of_four_captures_its_row(seed in any::<u64>(), row in 0usize..8) {
        let mut board = TileFactory::new(seed).generate(8, 1);
        for col in 0..8 {
            let kind = if (2..6).contains(&col) { TileKind::Purple } else { board[Position::new(row, col)].kind };
            board[Position::new(row, col)].kind = kind;
        }
        // Break runs that would extend the four.
        board[Position::new(row, 1)].kind = TileKind::Countdown;
        board[Position::new(row, 1)].countdown = Some(3);
        board[Position::new(row, 6)].kind = TileKind::Countdown;
        board[Position::new(row, 6)].countdown = Some(3);

        let matches = find_matches(&board);
        let line4 = matches
            .iter()
            .find(|m| m.kind == MatchKind::Line4Capture && m.line() == Some(row));
        prop_assert!(line4.is_some());
        let resolution = resolve_matches(&board, &matches);
        for pos in board.row(row) {
            if board[pos].kind == TileKind::Purple {
                prop_assert!(resolution.board[pos].matched);
            }
        }
    }
}

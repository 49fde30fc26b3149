//! Gravity and refill: drop survivors, spawn new tiles from above.

use crate::board::{Board, Position, Tile};
use crate::generator::TileFactory;
use log::debug;

/// A tile created by refill. `from_row` is the virtual (negative) row it enters from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawn {
    pub position: Position,
    pub from_row: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refill {
    pub board: Board,
    pub spawned: Vec<Spawn>,
    /// Countdown tiles removed for sitting on the bottom row.
    pub drained: usize,
}

/// Remove matched tiles column by column, compact the rest downward and fill the gap.
///
/// With `drain_bottom`, a countdown tile on the bottom row is removed as well. Highlights
/// are cleared on every tile; the result has no `matched` flags and no empty cells.
pub fn collapse_and_refill(
    board: &Board,
    factory: &mut TileFactory,
    level: u32,
    drain_bottom: bool,
) -> Refill {
    let size = board.size();
    let bottom = size - 1;
    let mut columns: Vec<Vec<Tile>> = Vec::with_capacity(size);
    let mut drained = 0;

    for col in 0..size {
        // Bottom-up survivors.
        let mut survivors: Vec<Tile> = Vec::with_capacity(size);
        for row in (0..size).rev() {
            let tile = &board[Position::new(row, col)];
            let drains = drain_bottom && row == bottom && tile.kind.is_countdown() && !tile.matched;
            if drains {
                drained += 1;
            }
            if tile.matched || drains {
                continue;
            }
            let mut kept = tile.clone();
            kept.highlight = None;
            kept.selected = false;
            survivors.push(kept);
        }
        columns.push(survivors);
    }

    let mut spawned = Vec::new();
    let mut slots: Vec<Option<Tile>> = vec![None; size * size];
    for (col, survivors) in columns.into_iter().enumerate() {
        let vacated = size - survivors.len();
        for (i, mut tile) in survivors.into_iter().enumerate() {
            let pos = Position::new(bottom - i, col);
            tile.position = pos;
            slots[pos.row * size + col] = Some(tile);
        }
        for row in 0..vacated {
            let pos = Position::new(row, col);
            slots[pos.row * size + col] = Some(factory.tile(pos, level));
            spawned.push(Spawn {
                position: pos,
                from_row: row as i32 - vacated as i32,
            });
        }
    }

    let mut slots = slots.into_iter();
    let next = Board::from_fn(size, |pos| {
        slots
            .next()
            .flatten()
            .unwrap_or_else(|| factory.tile(pos, level))
    });

    debug!(
        "refill: {} new tiles, {} bottom countdowns drained",
        spawned.len(),
        drained
    );

    Refill {
        board: next,
        spawned,
        drained,
    }
}

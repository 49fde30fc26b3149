//! Error types for session configuration and board fixtures.

use thiserror::Error;

/// Rejected `SessionConfig` values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("board size {0} is outside 3..=32")]
    BoardSize(usize),
    #[error("starting level must be at least 1")]
    StartingLevel,
    #[error("{name} must be a positive number of seconds, got {value}")]
    Duration { name: &'static str, value: f32 },
    #[error("settle delay must be zero or positive, got {0}")]
    SettleDelay(f32),
}

/// Malformed text board layout (see `Board::from_str`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseBoardError {
    #[error("board layout is empty")]
    Empty,
    #[error("row {row} has {found} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("layout has {rows} rows but {cols} columns; boards are square")]
    NotSquare { rows: usize, cols: usize },
    #[error("unknown tile glyph {glyph:?} at row {row}, col {col}")]
    UnknownGlyph { glyph: char, row: usize, col: usize },
}

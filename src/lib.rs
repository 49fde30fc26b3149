//! Tilebrawl: a tile-matching combat engine.
//!
//! Swap adjacent tiles to line up three or more of a colour. Matches turn into damage,
//! healing, experience and gold against an enemy that doubles in strength every time it
//! falls. Runs of four clear their whole line, groups of five leave a bomb or a bolt
//! behind, and bombs chain into each other.
//!
//! The engine is synchronous and caller-driven: see [`session::RunState`].

pub mod board;
pub mod error;
pub mod generator;
pub mod gravity;
pub mod matcher;
pub mod resolve;
pub mod scoring;
pub mod session;
pub mod specials;

pub use board::{Board, Position, Special, Tile, TileKind};
pub use error::{ConfigError, ParseBoardError};
pub use scoring::ComboMode;
pub use session::{GameEvent, Phase, RunState, SelectOutcome, SessionConfig};

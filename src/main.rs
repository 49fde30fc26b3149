//! Tilebrawl: tile-matching combat puzzle in the terminal.

mod app;
mod highscores;
mod input;
mod logging;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use tilebrawl::{ComboMode, SessionConfig};

/// Front-end options that do not reach the engine.
#[derive(Debug, Clone)]
pub struct UiConfig {
    pub tick_rate: f64,
    pub no_animation: bool,
    pub no_menu: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = args.log_file.as_deref() {
        logging::init(path, args.log_level)?;
    }
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("theme not loaded, using defaults: {e}");
        theme::Theme::default()
    });
    let session = args.session_config();
    session.validate()?;
    let ui = UiConfig {
        tick_rate: args.tick_rate,
        no_animation: args.no_animation,
        no_menu: args.no_menu,
    };
    log::info!("starting tilebrawl: {session:?}");
    let mut app = App::new(session, ui, theme)?;
    app.run()?;
    Ok(())
}

/// Tile-matching combat puzzle in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "tilebrawl",
    version,
    about = "Tile-matching combat puzzle in the terminal. Swap tiles, chain bombs and bolts, outlast a doubling enemy.",
    long_about = "Tilebrawl is a match-3 duel in the terminal.\n\n\
        Swap two neighbouring tiles to line up three or more of a colour. Red and purple hit \
        the enemy, green heals, blue gives experience and yellow gold. Four in a row clears \
        the whole line; five leave a bomb (5x5 blast) or, in a straight line, a bolt that \
        clears its colour. Grey tiles count down as matches land next to them.\n\n\
        CONTROLS:\n  Arrows / hjkl  Move cursor    Enter / Space  Select / swap\n  \
        P  Pause    R  Restart    M  Menu    Q / Esc  Quit\n\n\
        Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Combo counting: one counter for all colours, or one per colour.
    #[arg(short, long, default_value = "unified")]
    pub combo_mode: ComboModeArg,

    /// Board side length in tiles.
    #[arg(short, long, default_value = "8", value_name = "N")]
    pub size: usize,

    /// Starting level: enemy health and attack double per level above 1; grey tiles from level 3.
    #[arg(short, long, default_value = "1", value_name = "N")]
    pub level: u32,

    /// Seed for a reproducible game.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Pause in ms between clearing matches and dropping new tiles.
    #[arg(long, default_value = "300", value_name = "MS")]
    pub settle_ms: u64,

    /// Seconds between enemy attacks.
    #[arg(long, default_value = "3.0", value_name = "SECS")]
    pub attack_interval: f32,

    /// Combo window in unified mode.
    #[arg(long, default_value = "3.0", value_name = "SECS")]
    pub unified_combo_secs: f32,

    /// Combo window in per-colour mode.
    #[arg(long, default_value = "5.0", value_name = "SECS")]
    pub per_color_combo_secs: f32,

    /// Keep grey tiles that reach the bottom row instead of draining them.
    #[arg(long)]
    pub keep_bottom_countdowns: bool,

    /// Disable the clear animation (matches resolve instantly).
    #[arg(long)]
    pub no_animation: bool,

    /// Skip main menu and start game immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Frames per second (game clock and redraw).
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Append engine logs to this file.
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<std::path::PathBuf>,

    /// Log level for --log-file: error, warn, info, debug, trace.
    #[arg(long, default_value = "info", value_name = "LEVEL")]
    pub log_level: log::LevelFilter,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        let settle_secs = if self.no_animation {
            0.0
        } else {
            self.settle_ms as f32 / 1000.0
        };
        SessionConfig {
            board_size: self.size,
            combo_mode: self.combo_mode.into(),
            unified_combo_secs: self.unified_combo_secs,
            per_color_combo_secs: self.per_color_combo_secs,
            enemy_attack_interval_secs: self.attack_interval,
            starting_level: self.level,
            settle_secs,
            seed: self.seed,
            drain_bottom_countdowns: !self.keep_bottom_countdowns,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ComboModeArg {
    #[default]
    Unified,

    #[value(alias = "per-colour", alias = "percolor")]
    PerColor,
}

impl From<ComboModeArg> for ComboMode {
    fn from(arg: ComboModeArg) -> Self {
        match arg {
            ComboModeArg::Unified => Self::Unified,
            ComboModeArg::PerColor => Self::PerColor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_engine_defaults() {
        let args = Args::parse_from(["tilebrawl"]);
        assert_eq!(args.session_config(), SessionConfig::default());
    }

    #[test]
    fn test_flags_reach_session_config() {
        let args = Args::parse_from([
            "tilebrawl",
            "--combo-mode",
            "per-color",
            "--size",
            "6",
            "--seed",
            "42",
            "--no-animation",
            "--keep-bottom-countdowns",
        ]);
        let config = args.session_config();
        assert_eq!(config.combo_mode, ComboMode::PerColor);
        assert_eq!(config.board_size, 6);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.settle_secs, 0.0);
        assert!(!config.drain_bottom_countdowns);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_size_fails_validation() {
        let args = Args::parse_from(["tilebrawl", "--size", "2"]);
        assert!(args.session_config().validate().is_err());
    }
}

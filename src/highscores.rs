//! Persist best scores to disk (XDG config or ~/.config/tilebrawl), one per combo mode.

use anyhow::Result;
use log::debug;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tilebrawl::ComboMode;

const FILENAME: &str = "highscores";

/// Returns the path to the high scores file (config dir / tilebrawl / highscores).
fn config_path() -> PathBuf {
    let home_config = || {
        std::env::var("HOME")
            .map(|h| PathBuf::from(h).join(".config"))
            .unwrap_or_else(|_| PathBuf::from("."))
    };
    let base = match std::env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg),
        _ => home_config(),
    };
    base.join("tilebrawl").join(FILENAME)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HighScores {
    pub unified: u64,
    pub per_color: u64,
}

impl HighScores {
    /// Load from disk; 0 for anything missing or unreadable.
    pub fn load() -> Self {
        match fs::read_to_string(config_path()) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                debug!("no high scores loaded: {e}");
                Self::default()
            }
        }
    }

    /// `unified=N` / `per_color=N` lines; unknown keys and bad numbers are skipped.
    fn parse(content: &str) -> Self {
        let mut scores = Self::default();
        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let Ok(n) = value.trim().parse::<u64>() else {
                continue;
            };
            match key.trim() {
                "unified" => scores.unified = n,
                "per_color" => scores.per_color = n,
                _ => {}
            }
        }
        scores
    }

    fn render(&self) -> String {
        format!(
            "{}={}\n{}={}\n",
            ComboMode::Unified.name(),
            self.unified,
            ComboMode::PerColor.name(),
            self.per_color
        )
    }

    /// Save to disk. Creates the config directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut f = fs::File::create(path)?;
        f.write_all(self.render().as_bytes())?;
        Ok(())
    }

    pub fn best(&self, mode: ComboMode) -> u64 {
        match mode {
            ComboMode::Unified => self.unified,
            ComboMode::PerColor => self.per_color,
        }
    }

    /// Keep `score` if it beats the stored best for `mode`. True when it did.
    pub fn record(&mut self, mode: ComboMode, score: u64) -> bool {
        let slot = match mode {
            ComboMode::Unified => &mut self.unified,
            ComboMode::PerColor => &mut self.per_color,
        };
        if score > *slot {
            *slot = score;
            true
        } else {
            false
        }
    }
}

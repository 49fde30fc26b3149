//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tilebrawl::TileKind;

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

/// One Dark tile colours in `TileKind` order: red, blue, green, yellow, purple, grey.
const ONEDARK_TILES: [Color; 6] = [
    rgb(0xE0_6C_75),
    rgb(0x61_AF_EF),
    rgb(0x98_C3_79),
    rgb(0xE5_C0_7B),
    rgb(0xC6_78_DD),
    rgb(0x5C_63_70),
];

const HIGH_CONTRAST_TILES: [Color; 6] = [
    rgb(0xFF_00_00),
    rgb(0x00_88_FF),
    rgb(0x00_FF_00),
    rgb(0xFF_FF_00),
    rgb(0xFF_00_FF),
    rgb(0xAA_AA_AA),
];

/// Avoids relying on red against green alone.
const COLORBLIND_TILES: [Color; 6] = [
    rgb(0xCC_33_11),
    rgb(0x00_77_BB),
    rgb(0x00_99_88),
    rgb(0xEE_77_33),
    rgb(0xEE_33_77),
    rgb(0xBB_BB_BB),
];

/// Tile palette and UI colours loaded from a theme file.
#[derive(Debug, Clone)]
pub struct Theme {
    pub tiles: [Color; 6],
    /// Board background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, stats).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text: hints, event log.
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    pub const fn onedark_default() -> Self {
        Self {
            tiles: ONEDARK_TILES,
            bg: rgb(0x31_35_3F),
            div_line: rgb(0x3F_44_4F),
            main_fg: rgb(0xAB_B2_BF),
            title: rgb(0xE5_C0_7B),
            inactive_fg: rgb(0x5C_63_70),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map);
        theme.apply_palette(palette);
        Ok(theme)
    }

    fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::onedark_default();
        t.apply_palette(palette);
        t
    }

    /// Override tile colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => self.tiles = HIGH_CONTRAST_TILES,
            crate::Palette::Colorblind => self.tiles = COLORBLIND_TILES,
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| {
            map.get(key)
                .and_then(|v| parse_hex(v.trim_matches('"').trim_matches('\'').trim()).ok())
        };
        let d = Self::onedark_default();
        // Keys match onedark.theme.
        Self {
            tiles: [
                get("cpu_end").or_else(|| get("temp_end")).unwrap_or(d.tiles[0]),
                get("cpu_box").unwrap_or(d.tiles[1]),
                get("mem_box").or_else(|| get("cpu_start")).unwrap_or(d.tiles[2]),
                get("title").or_else(|| get("cpu_mid")).unwrap_or(d.tiles[3]),
                get("net_box").unwrap_or(d.tiles[4]),
                get("inactive_fg").unwrap_or(d.tiles[5]),
            ],
            bg: get("meter_bg").unwrap_or(d.bg),
            div_line: get("div_line").unwrap_or(d.div_line),
            main_fg: get("main_fg").unwrap_or(d.main_fg),
            title: get("title").unwrap_or(d.title),
            inactive_fg: get("inactive_fg").unwrap_or(d.inactive_fg),
        }
    }

    #[inline]
    pub fn tile_color(&self, kind: TileKind) -> Color {
        self.tiles[kind.index() % self.tiles.len()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(eq) = rest.find('=') {
            let value = rest[eq + 1..]
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string();
            if !value.is_empty() {
                map.insert(key.to_string(), value);
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    if !s.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&s[range], 16).map_err(|_| invalid())
    };
    let (r, g, b) = match s.len() {
        6 => (channel(0..2)?, channel(2..4)?, channel(4..6)?),
        3 => (channel(0..1)? * 17, channel(1..2)? * 17, channel(2..3)? * 17),
        _ => return Err(invalid()),
    };
    Ok(Color::Rgb(r, g, b))
}

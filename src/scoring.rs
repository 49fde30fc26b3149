//! Combo, damage and progression arithmetic.
//!
//! Everything here is plain numbers: the session feeds in a match set and the current
//! counters, and applies the resulting [`Tally`] to its [`Enemy`] and [`Player`].

use crate::board::{Board, TileKind};
use crate::matcher::Match;
use log::info;
use std::collections::BTreeMap;

pub const ENEMY_BASE_HEALTH: u64 = 100;
pub const ENEMY_BASE_ATTACK: u64 = 5;
pub const PLAYER_START_HEALTH: u64 = 100;
pub const FIRST_LEVEL_THRESHOLD: u64 = 10;
/// Value multiplier for matched countdown-colour tiles.
pub const COUNTDOWN_VALUE_FACTOR: u64 = 3;

/// How the combo multiplier is counted. Fixed for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComboMode {
    /// One counter shared by every colour.
    #[default]
    Unified,
    /// Each colour keeps its own counter.
    PerColor,
}

impl ComboMode {
    pub fn name(self) -> &'static str {
        match self {
            Self::Unified => "unified",
            Self::PerColor => "per_color",
        }
    }
}

/// What a colour does when matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Damage,
    Heal,
    Experience,
    Gold,
    Nothing,
}

pub fn effect_of(kind: TileKind) -> Effect {
    match kind {
        TileKind::Red | TileKind::Purple => Effect::Damage,
        TileKind::Green => Effect::Heal,
        TileKind::Blue => Effect::Experience,
        TileKind::Yellow => Effect::Gold,
        TileKind::Countdown => Effect::Nothing,
    }
}

/// `tiles × base × combo`, tripled for the countdown colour.
pub fn color_value(kind: TileKind, tiles: usize, base_block_value: u64, combo: u32) -> u64 {
    let value = (tiles as u64)
        .saturating_mul(base_block_value)
        .saturating_mul(u64::from(combo));
    if kind.is_countdown() {
        value.saturating_mul(COUNTDOWN_VALUE_FACTOR)
    } else {
        value
    }
}

/// Global and per-colour combo counters plus the best global value seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComboState {
    pub global: u32,
    pub per_color: BTreeMap<TileKind, u32>,
    pub highest: u32,
}

impl ComboState {
    /// One resolution step: the global counter always moves, each colour present moves once.
    pub fn advance(&mut self, colors: &[TileKind]) {
        self.global = self.global.saturating_add(1);
        self.highest = self.highest.max(self.global);
        for &kind in colors {
            let counter = self.per_color.entry(kind).or_insert(0);
            *counter = counter.saturating_add(1);
        }
    }

    pub fn multiplier(&self, mode: ComboMode, kind: TileKind) -> u32 {
        match mode {
            ComboMode::Unified => self.global,
            ComboMode::PerColor => self.per_color.get(&kind).copied().unwrap_or(0),
        }
    }

    /// Timer lapse: counters drop back to zero, the record stays.
    pub fn reset(&mut self) {
        self.global = 0;
        self.per_color.clear();
    }
}

/// Per-colour line of one resolution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorBreakdown {
    pub kind: TileKind,
    pub matched_tiles: usize,
    pub combo: u32,
    pub value: u64,
}

/// Totals of one resolution step, split by effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tally {
    pub breakdown: Vec<ColorBreakdown>,
    pub damage: u64,
    pub heal: u64,
    pub experience: u64,
    pub gold: u64,
}

/// Advance the combo counters for one step and value the match set colour by colour.
///
/// A match's colour is the kind of its first tile. Tile counts are summed over matches,
/// so a tile shared by a row and a column run counts twice. Colours are listed in the
/// order they first appear.
pub fn tally(
    board: &Board,
    matches: &[Match],
    mode: ComboMode,
    combo: &mut ComboState,
    base_block_value: u64,
) -> Tally {
    let mut counts: Vec<(TileKind, usize)> = Vec::new();
    for m in matches {
        let Some(&first) = m.positions.first() else {
            continue;
        };
        let kind = board[first].kind;
        match counts.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, n)) => *n += m.len(),
            None => counts.push((kind, m.len())),
        }
    }

    let colors: Vec<TileKind> = counts.iter().map(|&(k, _)| k).collect();
    combo.advance(&colors);

    let mut out = Tally::default();
    for (kind, matched_tiles) in counts {
        let multiplier = combo.multiplier(mode, kind);
        let value = color_value(kind, matched_tiles, base_block_value, multiplier);
        let slot = match effect_of(kind) {
            Effect::Damage => Some(&mut out.damage),
            Effect::Heal => Some(&mut out.heal),
            Effect::Experience => Some(&mut out.experience),
            Effect::Gold => Some(&mut out.gold),
            Effect::Nothing => None,
        };
        if let Some(total) = slot {
            *total = total.saturating_add(value);
        }
        out.breakdown.push(ColorBreakdown {
            kind,
            matched_tiles,
            combo: multiplier,
            value,
        });
    }
    out
}

/// Outcome of a lethal hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kill {
    /// Experience awarded: the max health the enemy had when it died.
    pub bonus_experience: u64,
    pub new_max_health: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enemy {
    pub health: u64,
    pub max_health: u64,
    pub attack: u64,
}

impl Enemy {
    /// Enemy for a starting level: base stats doubled once per level above the first.
    pub fn for_level(level: u32) -> Self {
        let scale = 2u64.saturating_pow(level.saturating_sub(1));
        let max_health = ENEMY_BASE_HEALTH.saturating_mul(scale);
        Self {
            health: max_health,
            max_health,
            attack: ENEMY_BASE_ATTACK.saturating_mul(scale),
        }
    }

    /// Subtract `damage`. On reaching zero the enemy comes back doubled at full health.
    pub fn take_damage(&mut self, damage: u64) -> Option<Kill> {
        self.health = self.health.saturating_sub(damage);
        if self.health > 0 {
            return None;
        }
        let bonus_experience = self.max_health;
        self.max_health = self.max_health.saturating_mul(2);
        self.health = self.max_health;
        self.attack = self.attack.saturating_mul(2);
        info!(
            "enemy defeated: max health {} -> {}, attack {}",
            bonus_experience, self.max_health, self.attack
        );
        Some(Kill {
            bonus_experience,
            new_max_health: self.max_health,
        })
    }

    pub fn health_ratio(&self) -> f64 {
        if self.max_health == 0 {
            0.0
        } else {
            self.health as f64 / self.max_health as f64
        }
    }
}

impl Default for Enemy {
    fn default() -> Self {
        Self::for_level(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    pub health: u64,
    pub level: u32,
    pub experience: u64,
    pub experience_to_next: u64,
    pub base_block_value: u64,
    pub gold: u64,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            health: PLAYER_START_HEALTH,
            level: 1,
            experience: 0,
            experience_to_next: FIRST_LEVEL_THRESHOLD,
            base_block_value: 1,
            gold: 0,
        }
    }
}

impl Player {
    /// Add `amount` and clamp to `cap` (the enemy's max health).
    pub fn heal(&mut self, amount: u64, cap: u64) {
        self.health = self.health.saturating_add(amount).min(cap);
    }

    /// Add experience and run the level-up loop. Each level grants +1 base block value
    /// and `boost` health, uncapped. Returns the number of levels gained.
    pub fn gain_experience(&mut self, amount: u64, boost: u64) -> u32 {
        self.experience = self.experience.saturating_add(amount);
        let mut gained = 0;
        while self.experience_to_next > 0 && self.experience >= self.experience_to_next {
            self.experience -= self.experience_to_next;
            self.experience_to_next = self.experience_to_next.saturating_mul(2);
            self.level += 1;
            self.base_block_value += 1;
            self.health = self.health.saturating_add(boost);
            gained += 1;
        }
        if gained > 0 {
            info!("player reached level {} (+{gained})", self.level);
        }
        gained
    }

    /// Saturating hit; true when this hit was fatal.
    pub fn take_hit(&mut self, attack: u64) -> bool {
        self.health = self.health.saturating_sub(attack);
        self.health == 0
    }

    pub fn is_dead(&self) -> bool {
        self.health == 0
    }
}

/// Flat health boost per player level-up.
pub fn level_up_boost(enemy_max_health: u64) -> u64 {
    enemy_max_health / 10
}

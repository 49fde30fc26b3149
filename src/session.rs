//! One play session: selection and swaps, the settle phase, cascades, timers and events.
//!
//! [`RunState`] is driven entirely by its caller. Player input goes through
//! [`RunState::select_or_swap`], time through [`RunState::tick`], and everything that
//! happened in between is collected as [`GameEvent`]s for [`RunState::drain_events`].

use crate::board::{Board, MAX_BOARD_SIZE, MIN_BOARD_SIZE, Position, TileKind, BOARD_SIZE};
use crate::error::ConfigError;
use crate::generator::TileFactory;
use crate::gravity::{Spawn, collapse_and_refill};
use crate::matcher::{Match, find_matches};
use crate::resolve::resolve_matches;
use crate::scoring::{
    ColorBreakdown, ComboMode, ComboState, Enemy, Player, level_up_boost, tally,
};
use crate::specials::{SpecialTile, apply_specials, plan_specials};
use log::{debug, info, warn};

/// Attempts at finding a stable board that still has a legal move.
const RESHUFFLE_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    pub board_size: usize,
    pub combo_mode: ComboMode,
    pub unified_combo_secs: f32,
    pub per_color_combo_secs: f32,
    pub enemy_attack_interval_secs: f32,
    pub starting_level: u32,
    /// Pause between marking matched tiles and refilling. Zero resolves synchronously.
    pub settle_secs: f32,
    /// Fixed seed for a reproducible session.
    pub seed: Option<u64>,
    /// Remove countdown tiles that reach the bottom row during refill.
    pub drain_bottom_countdowns: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            board_size: BOARD_SIZE,
            combo_mode: ComboMode::Unified,
            unified_combo_secs: 3.0,
            per_color_combo_secs: 5.0,
            enemy_attack_interval_secs: 3.0,
            starting_level: 1,
            settle_secs: 0.3,
            seed: None,
            drain_bottom_countdowns: true,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&self.board_size) {
            return Err(ConfigError::BoardSize(self.board_size));
        }
        if self.starting_level == 0 {
            return Err(ConfigError::StartingLevel);
        }
        for (name, value) in [
            ("unified combo window", self.unified_combo_secs),
            ("per-colour combo window", self.per_color_combo_secs),
            ("enemy attack interval", self.enemy_attack_interval_secs),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Duration { name, value });
            }
        }
        if !self.settle_secs.is_finite() || self.settle_secs < 0.0 {
            return Err(ConfigError::SettleDelay(self.settle_secs));
        }
        Ok(())
    }

    /// Combo window for the configured mode.
    pub fn combo_window(&self) -> f32 {
        match self.combo_mode {
            ComboMode::Unified => self.unified_combo_secs,
            ComboMode::PerColor => self.per_color_combo_secs,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for player input.
    Idle,
    /// Matched tiles are on the board; refill happens when the settle delay runs out.
    Settling,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// Busy, game over, or outside the board.
    Ignored,
    /// The tile has no move that would make a match.
    Refused,
    Selected,
    Deselected,
    /// Adjacent swap without a match; the board is unchanged.
    Reverted,
    /// The swap matched and the board is now settling.
    Resolved,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    MatchResolved {
        step: u64,
        /// 0 for the player's own swap, n for the n-th cascade after it.
        cascade: u32,
        breakdown: Vec<ColorBreakdown>,
        damage: u64,
        heal: u64,
        experience: u64,
        gold: u64,
        detonations: Vec<Position>,
        bolts: Vec<TileKind>,
    },
    SpecialCreated(SpecialTile),
    EnemyKilled {
        level: u32,
        bonus_experience: u64,
        enemy_max_health: u64,
    },
    LevelUp {
        level: u32,
        gained: u32,
    },
    EnemyAttack {
        damage: u64,
        player_health: u64,
    },
    ComboExpired {
        combo: u32,
    },
    BoardReshuffled,
    GameOver {
        score: u64,
    },
}

/// Resolution waiting for the settle delay.
#[derive(Debug, Clone)]
struct Pending {
    matches: Vec<Match>,
    last_swap: Option<Position>,
    remaining: f32,
    enemy_killed: bool,
}

#[derive(Debug, Clone)]
pub struct RunState {
    config: SessionConfig,
    factory: TileFactory,
    board: Board,
    phase: Phase,
    pending: Option<Pending>,
    level: u32,
    enemy: Enemy,
    player: Player,
    combo: ComboState,
    combo_timer: f32,
    attack_timer: f32,
    score: u64,
    step: u64,
    cascade: u32,
    last_breakdown: Vec<ColorBreakdown>,
    last_spawns: Vec<Spawn>,
    events: Vec<GameEvent>,
}

impl RunState {
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        Ok(Self::seeded(config, seed))
    }

    /// Start a session on a given layout instead of a generated one.
    pub fn with_board(mut config: SessionConfig, board: Board) -> Result<Self, ConfigError> {
        config.board_size = board.size();
        let mut state = Self::new(config)?;
        state.board = board;
        Ok(state)
    }

    fn seeded(config: SessionConfig, seed: u64) -> Self {
        let mut factory = TileFactory::new(seed);
        let level = config.starting_level;
        let board = playable_board(&mut factory, config.board_size, level);
        debug!("new session: seed {seed}, level {level}, {:?}", config.combo_mode);
        Self {
            combo_timer: config.combo_window(),
            attack_timer: config.enemy_attack_interval_secs,
            factory,
            board,
            phase: Phase::Idle,
            pending: None,
            level,
            enemy: Enemy::for_level(level),
            player: Player::default(),
            combo: ComboState::default(),
            score: 0,
            step: 0,
            cascade: 0,
            last_breakdown: Vec::new(),
            last_spawns: Vec::new(),
            events: Vec::new(),
            config,
        }
    }

    /// Throw the session away and start over with the same settings.
    pub fn restart(&mut self) {
        let seed = self.factory.next_seed();
        *self = Self::seeded(self.config.clone(), seed);
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_busy(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn enemy(&self) -> &Enemy {
        &self.enemy
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn combo(&self) -> &ComboState {
        &self.combo
    }

    pub fn combo_mode(&self) -> ComboMode {
        self.config.combo_mode
    }

    /// Seconds until the combo counters reset.
    pub fn combo_time_left(&self) -> f32 {
        self.combo_timer
    }

    /// Seconds until the enemy's next attack.
    pub fn attack_time_left(&self) -> f32 {
        self.attack_timer
    }

    /// Fraction of the settle delay already elapsed, while settling.
    pub fn settle_progress(&self) -> Option<f32> {
        let pending = self.pending.as_ref()?;
        if self.config.settle_secs <= 0.0 {
            return Some(1.0);
        }
        Some((1.0 - pending.remaining / self.config.settle_secs).clamp(0.0, 1.0))
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn last_breakdown(&self) -> &[ColorBreakdown] {
        &self.last_breakdown
    }

    /// Tiles created by the most recent refill or regeneration.
    pub fn last_spawns(&self) -> &[Spawn] {
        &self.last_spawns
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// True if swapping the tile at `pos` with some neighbour would make a match.
    pub fn has_potential_match(&self, pos: Position) -> bool {
        has_move_from(&self.board, pos)
    }

    pub fn has_any_move(&self) -> bool {
        self.board.positions().any(|p| has_move_from(&self.board, p))
    }

    /// Click on a tile: select it, deselect it, retarget the selection or swap.
    pub fn select_or_swap(&mut self, pos: Position) -> SelectOutcome {
        if self.phase != Phase::Idle || !self.board.contains(pos) {
            return SelectOutcome::Ignored;
        }
        let Some(selected) = self.board.selected() else {
            if !self.has_potential_match(pos) {
                return SelectOutcome::Refused;
            }
            self.board[pos].selected = true;
            return SelectOutcome::Selected;
        };
        if selected == pos {
            self.board.clear_selection();
            return SelectOutcome::Deselected;
        }
        if !self.board.are_adjacent(selected, pos) {
            self.board.clear_selection();
            self.board[pos].selected = true;
            return SelectOutcome::Selected;
        }

        let mut swapped = self.board.swapped(selected, pos);
        swapped.clear_selection();
        let matches = find_matches(&swapped);
        if matches.is_empty() {
            debug!("swap {selected} <-> {pos} reverted");
            self.board.clear_selection();
            return SelectOutcome::Reverted;
        }
        debug!("swap {selected} <-> {pos}: {} matches", matches.len());
        self.board = swapped;
        self.cascade = 0;
        self.begin_resolution(matches, Some(pos));
        if self.config.settle_secs <= 0.0 {
            self.finish_settle();
        }
        SelectOutcome::Resolved
    }

    /// Advance time: settle delay, then combo window, then the enemy attack timer.
    pub fn tick(&mut self, dt: f32) {
        if self.phase == Phase::GameOver {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if let Some(pending) = self.pending.as_mut() {
            pending.remaining -= dt;
            if pending.remaining <= 0.0 {
                self.finish_settle();
            }
        }

        self.combo_timer -= dt;
        if self.combo_timer <= 0.0 {
            let combo = self.combo.global;
            self.combo.reset();
            self.last_breakdown.clear();
            self.combo_timer = self.config.combo_window();
            if combo > 0 {
                debug!("combo of {combo} expired");
                self.events.push(GameEvent::ComboExpired { combo });
            }
        }

        self.attack_timer -= dt;
        while self.attack_timer <= 0.0 {
            self.attack_timer += self.config.enemy_attack_interval_secs;
            let damage = self.enemy.attack;
            let fatal = self.player.take_hit(damage);
            self.events.push(GameEvent::EnemyAttack {
                damage,
                player_health: self.player.health,
            });
            if fatal {
                self.game_over();
                break;
            }
        }
    }

    /// Skip the rest of the settle delay. With a zero delay, cascades finish too.
    pub fn finish_settle(&mut self) {
        while let Some(pending) = self.pending.take() {
            self.complete(pending);
            if self.config.settle_secs > 0.0 {
                break;
            }
        }
    }

    fn game_over(&mut self) {
        self.phase = Phase::GameOver;
        self.pending = None;
        self.board.clear_selection();
        info!("game over: score {}, highest combo {}", self.score, self.combo.highest);
        self.events.push(GameEvent::GameOver { score: self.score });
    }

    /// Score the match set, mark tiles and enter the settle phase.
    fn begin_resolution(&mut self, matches: Vec<Match>, last_swap: Option<Position>) {
        self.step += 1;
        let ceiling = self.enemy.max_health;
        let t = tally(
            &self.board,
            &matches,
            self.config.combo_mode,
            &mut self.combo,
            self.player.base_block_value,
        );
        let resolution = resolve_matches(&self.board, &matches);
        self.board = resolution.board;
        self.combo_timer = self.config.combo_window();

        self.player.heal(t.heal, ceiling);
        self.player.gold = self.player.gold.saturating_add(t.gold);
        self.score = self.score.saturating_add(t.damage);
        let kill = self.enemy.take_damage(t.damage);
        let mut experience = t.experience;
        if let Some(kill) = kill {
            experience = experience.saturating_add(kill.bonus_experience);
            self.level += 1;
            self.events.push(GameEvent::EnemyKilled {
                level: self.level,
                bonus_experience: kill.bonus_experience,
                enemy_max_health: kill.new_max_health,
            });
        }
        let gained = self
            .player
            .gain_experience(experience, level_up_boost(ceiling));
        if gained > 0 {
            self.events.push(GameEvent::LevelUp {
                level: self.player.level,
                gained,
            });
        }

        debug!(
            "step {} (cascade {}): damage {}, heal {}, xp {}, gold {}",
            self.step, self.cascade, t.damage, t.heal, t.experience, t.gold
        );
        self.last_breakdown = t.breakdown.clone();
        self.events.push(GameEvent::MatchResolved {
            step: self.step,
            cascade: self.cascade,
            breakdown: t.breakdown,
            damage: t.damage,
            heal: t.heal,
            experience: t.experience,
            gold: t.gold,
            detonations: resolution.detonations,
            bolts: resolution.bolts,
        });

        self.phase = Phase::Settling;
        self.pending = Some(Pending {
            matches,
            last_swap,
            remaining: self.config.settle_secs,
            enemy_killed: kill.is_some(),
        });
    }

    /// Specials and refill (or a fresh board after a kill), then the cascade scan.
    fn complete(&mut self, pending: Pending) {
        let size = self.board.size();
        if pending.enemy_killed {
            self.board = playable_board(&mut self.factory, size, self.level);
            self.last_spawns = self
                .board
                .positions()
                .map(|position| Spawn {
                    position,
                    from_row: position.row as i32 - size as i32,
                })
                .collect();
        } else {
            let plan = plan_specials(&self.board, &pending.matches, pending.last_swap);
            apply_specials(&mut self.board, &plan.created, &mut self.factory);
            for special in plan.created {
                debug!("{:?} created at {}", special.special, special.position);
                self.events.push(GameEvent::SpecialCreated(special));
            }
            let refill = collapse_and_refill(
                &self.board,
                &mut self.factory,
                self.level,
                self.config.drain_bottom_countdowns,
            );
            self.board = refill.board;
            self.last_spawns = refill.spawned;
        }
        self.phase = Phase::Idle;

        let matches = find_matches(&self.board);
        if !matches.is_empty() {
            self.cascade += 1;
            self.begin_resolution(matches, None);
            return;
        }
        if !self.has_any_move() {
            self.board = playable_board(&mut self.factory, size, self.level);
            info!("no moves left, board reshuffled");
            self.events.push(GameEvent::BoardReshuffled);
        }
    }
}

fn has_move_from(board: &Board, pos: Position) -> bool {
    let Some(tile) = board.get(pos) else {
        return false;
    };
    if tile.kind.is_countdown() {
        return false;
    }
    pos.neighbours(board.size())
        .filter(|&n| board.are_adjacent(pos, n))
        .any(|n| !find_matches(&board.swapped(pos, n)).is_empty())
}

/// Match-free board with at least one legal move, if one turns up within the attempts.
fn playable_board(factory: &mut TileFactory, size: usize, level: u32) -> Board {
    let mut board = factory.generate(size, level);
    for _ in 1..RESHUFFLE_ATTEMPTS {
        if board.positions().any(|p| has_move_from(&board, p)) {
            return board;
        }
        board = factory.generate(size, level);
    }
    warn!("no playable {size}x{size} board after {RESHUFFLE_ATTEMPTS} attempts");
    board
}

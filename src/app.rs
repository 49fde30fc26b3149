//! App: terminal init, main loop, clock and key handling.

use crate::UiConfig;
use crate::highscores::HighScores;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use log::{info, warn};
use ratatui::DefaultTerminal;
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tilebrawl::session::GameEvent;
use tilebrawl::{ComboMode, Phase, Position, RunState, SelectOutcome, SessionConfig, Special};

/// Messages kept for the sidebar event log.
const LOG_LINES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
}

/// Everything the renderer needs besides the effect slots.
pub struct View<'a> {
    pub screen: Screen,
    pub state: &'a RunState,
    pub theme: &'a Theme,
    pub cursor: Position,
    pub paused: bool,
    pub menu_mode: ComboMode,
    pub high_scores: HighScores,
    pub new_record: bool,
    pub messages: &'a VecDeque<String>,
    pub no_animation: bool,
}

pub struct App {
    config: SessionConfig,
    ui: UiConfig,
    theme: Theme,
    state: RunState,
    screen: Screen,
    paused: bool,
    cursor: Position,
    menu_mode: ComboMode,
    high_scores: HighScores,
    new_record: bool,
    messages: VecDeque<String>,
    last_tick: Instant,
    /// TachyonFX fade for the tiles cleared in the current settle phase.
    settle_effect: Option<Effect>,
    /// Last time the settle effect was processed (for delta).
    settle_effect_time: Option<Instant>,
}

impl App {
    pub fn new(config: SessionConfig, ui: UiConfig, theme: Theme) -> Result<Self> {
        let state = RunState::new(config.clone())?;
        let screen = if ui.no_menu {
            Screen::Playing
        } else {
            Screen::Menu
        };
        let center = config.board_size / 2;
        Ok(Self {
            menu_mode: config.combo_mode,
            config,
            ui,
            theme,
            state,
            screen,
            paused: false,
            cursor: Position::new(center, center),
            high_scores: HighScores::load(),
            new_record: false,
            messages: VecDeque::new(),
            last_tick: Instant::now(),
            settle_effect: None,
            settle_effect_time: None,
        })
    }

    fn start_game(&mut self) -> Result<()> {
        self.config.combo_mode = self.menu_mode;
        self.state = RunState::new(self.config.clone())?;
        self.after_reset();
        Ok(())
    }

    fn restart(&mut self) {
        self.state.restart();
        self.after_reset();
    }

    fn after_reset(&mut self) {
        self.screen = Screen::Playing;
        self.paused = false;
        self.new_record = false;
        self.messages.clear();
        self.settle_effect = None;
        self.settle_effect_time = None;
        self.last_tick = Instant::now();
        let center = self.state.board().size() / 2;
        self.cursor = Position::new(center, center);
    }

    fn move_cursor(&mut self, action: Action) {
        let last = self.state.board().size() - 1;
        let Position { row, col } = self.cursor;
        self.cursor = match action {
            Action::Up => Position::new(row.saturating_sub(1), col),
            Action::Down => Position::new((row + 1).min(last), col),
            Action::Left => Position::new(row, col.saturating_sub(1)),
            Action::Right => Position::new(row, (col + 1).min(last)),
            _ => self.cursor,
        };
    }

    fn push_message(&mut self, msg: String) {
        if self.messages.len() == LOG_LINES {
            self.messages.pop_front();
        }
        self.messages.push_back(msg);
    }

    /// Turn engine events into log lines, reset the fade and record the score at game over.
    fn handle_events(&mut self) {
        for event in self.state.drain_events() {
            match event {
                GameEvent::MatchResolved {
                    cascade,
                    damage,
                    heal,
                    detonations,
                    bolts,
                    ..
                } => {
                    self.settle_effect = None;
                    self.settle_effect_time = None;
                    let mut msg = if cascade > 0 {
                        format!("Cascade {cascade}: {damage} dmg")
                    } else {
                        format!("Hit for {damage}")
                    };
                    if heal > 0 {
                        msg.push_str(&format!(", +{heal} hp"));
                    }
                    if !detonations.is_empty() {
                        msg.push_str(&format!(", {} boom", detonations.len()));
                    }
                    if !bolts.is_empty() {
                        msg.push_str(", bolt");
                    }
                    self.push_message(msg);
                }
                GameEvent::SpecialCreated(s) => {
                    let name = match s.special {
                        Special::Bomb => "bomb",
                        Special::Bolt => "bolt",
                    };
                    self.push_message(format!("New {} {name}", s.kind));
                }
                GameEvent::EnemyKilled { level, .. } => {
                    self.push_message(format!("Enemy down! Stage {level}"));
                }
                GameEvent::LevelUp { level, .. } => {
                    self.push_message(format!("Level up: {level}"));
                }
                GameEvent::EnemyAttack { damage, .. } => {
                    self.push_message(format!("Enemy hits for {damage}"));
                }
                GameEvent::ComboExpired { combo } => {
                    self.push_message(format!("Combo x{combo} over"));
                }
                GameEvent::BoardReshuffled => {
                    self.push_message("No moves: reshuffled".to_string());
                }
                GameEvent::GameOver { score } => {
                    self.screen = Screen::GameOver;
                    self.new_record = self.high_scores.record(self.state.combo_mode(), score);
                    if self.new_record {
                        info!("new best score {score} ({})", self.state.combo_mode().name());
                        if let Err(e) = self.high_scores.save() {
                            warn!("could not save high scores: {e}");
                        }
                    }
                }
            }
        }
    }

    fn select(&mut self) {
        match self.state.select_or_swap(self.cursor) {
            SelectOutcome::Refused => self.push_message("No match from there".to_string()),
            SelectOutcome::Reverted => self.push_message("No match".to_string()),
            _ => {}
        }
    }

    /// Returns false when the app should exit.
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match self.screen {
            Screen::Menu => match action {
                Action::Quit => return Ok(false),
                Action::Left | Action::Right | Action::Up | Action::Down => {
                    self.menu_mode = match self.menu_mode {
                        ComboMode::Unified => ComboMode::PerColor,
                        ComboMode::PerColor => ComboMode::Unified,
                    };
                }
                Action::Select => self.start_game()?,
                _ => {}
            },
            Screen::Playing if self.paused => match action {
                Action::Pause => {
                    self.paused = false;
                    self.last_tick = Instant::now();
                }
                Action::Quit | Action::Menu => self.screen = Screen::Menu,
                _ => {}
            },
            Screen::Playing => match action {
                Action::Up | Action::Down | Action::Left | Action::Right => {
                    self.move_cursor(action);
                }
                Action::Select => self.select(),
                Action::Pause => self.paused = true,
                Action::Restart => self.restart(),
                Action::Quit | Action::Menu => self.screen = Screen::Menu,
                Action::None => {}
            },
            Screen::GameOver => match action {
                Action::Quit => return Ok(false),
                Action::Restart | Action::Select => self.restart(),
                Action::Menu => self.screen = Screen::Menu,
                _ => {}
            },
        }
        Ok(true)
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        let result = self.run_loop(&mut terminal);

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let rate = if self.ui.tick_rate.is_finite() && self.ui.tick_rate > 0.0 {
            self.ui.tick_rate
        } else {
            30.0
        };
        let frame_duration = Duration::from_secs_f64(1.0 / rate);
        loop {
            let now = Instant::now();
            let view = View {
                screen: self.screen,
                state: &self.state,
                theme: &self.theme,
                cursor: self.cursor,
                paused: self.paused,
                menu_mode: self.menu_mode,
                high_scores: self.high_scores,
                new_record: self.new_record,
                messages: &self.messages,
                no_animation: self.ui.no_animation,
            };
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    &view,
                    &mut self.settle_effect,
                    &mut self.settle_effect_time,
                    now,
                );
            })?;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let Event::Key(key) = event::read()? else {
                        continue;
                    };
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if !self.handle_action(key_to_action(key))? {
                        return Ok(());
                    }
                }
            }

            let dt = self.last_tick.elapsed();
            self.last_tick = Instant::now();
            if self.screen == Screen::Playing && !self.paused {
                self.state.tick(dt.as_secs_f32());
            }
            self.handle_events();
            if self.state.phase() != Phase::Settling {
                self.settle_effect = None;
                self.settle_effect_time = None;
            }
        }
    }
}

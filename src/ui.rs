//! Layout and drawing: menu, board, sidebar, pause, game over.

use crate::app::{Screen, View};
use crate::theme::Theme;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position as ScreenPos, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};
use tilebrawl::{ComboMode, Phase, Position, RunState, Special, Tile, TileKind};

const SIDEBAR_WIDTH: u16 = 30;
/// Tile sizes in terminal cells, largest first; the first that fits is used.
const CELL_SIZES: [(u16, u16); 3] = [(6, 3), (4, 2), (2, 1)];

/// Tile size for a `size` x `size` board in `area`, leaving room for the sidebar.
fn cell_dims(size: usize, area: Rect) -> (u16, u16) {
    let n = size as u16;
    CELL_SIZES
        .into_iter()
        .find(|&(w, h)| n * w + 2 + SIDEBAR_WIDTH <= area.width && n * h + 2 <= area.height)
        .unwrap_or((2, 1))
}

/// Outer board rect (with border) and sidebar rect, centered in `area`.
fn game_layout(area: Rect, size: usize) -> (Rect, Rect, (u16, u16)) {
    let (cw, ch) = cell_dims(size, area);
    let n = size as u16;
    let pw = n * cw + 2;
    let ph = (n * ch + 2).max(24);
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz[1]);
    let inner = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(vert[1]);
    let board = Rect {
        height: (n * ch + 2).min(inner[0].height),
        ..inner[0]
    };
    (board, inner[1], (cw, ch))
}

/// Screen rect of one tile inside the board's inner rect.
fn tile_rect(inner: Rect, pos: Position, (cw, ch): (u16, u16)) -> Rect {
    let x = inner.x + pos.col as u16 * cw;
    let y = inner.y + pos.row as u16 * ch;
    Rect {
        x,
        y,
        width: cw.min((inner.x + inner.width).saturating_sub(x)),
        height: ch.min((inner.y + inner.height).saturating_sub(y)),
    }
}

/// Draw current screen, with pause overlay, and run the settle fade over matched tiles.
pub fn draw(
    frame: &mut Frame,
    view: &View,
    settle_effect: &mut Option<Effect>,
    settle_effect_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    match view.screen {
        Screen::Menu => draw_menu(frame, view, area),
        Screen::Playing => {
            let inner = draw_game(frame, view, area);
            if view.paused {
                draw_pause_overlay(frame, view.theme, area);
            }
            if view.state.phase() == Phase::Settling && !view.no_animation {
                apply_settle_effect(frame, view, inner, settle_effect, settle_effect_time, now);
            }
        }
        Screen::GameOver => {
            draw_game(frame, view, area);
            draw_game_over(frame, view, area);
        }
    }
}

/// Create or update the settle fade and process it (TachyonFX: matched tiles fade to bg).
fn apply_settle_effect(
    frame: &mut Frame,
    view: &View,
    (inner, cell): (Rect, (u16, u16)),
    settle_effect: &mut Option<Effect>,
    settle_effect_time: &mut Option<Instant>,
    now: Instant,
) {
    let delta = settle_effect_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u128::from(u32::MAX)) as u32;
    *settle_effect_time = Some(now);

    if settle_effect.is_none() {
        let board = view.state.board();
        let mut clearing: HashSet<(u16, u16)> = HashSet::new();
        for tile in board.tiles().filter(|t| t.matched) {
            let r = tile_rect(inner, tile.position, cell);
            for x in r.x..r.x + r.width {
                for y in r.y..r.y + r.height {
                    clearing.insert((x, y));
                }
            }
        }
        let filter = CellFilter::PositionFn(ref_count(move |pos: ScreenPos| {
            clearing.contains(&(pos.x, pos.y))
        }));
        let fade_ms = (view.state.config().settle_secs * 1000.0) as u32;
        let bg = view.theme.bg;
        let effect = fx::fade_to(bg, bg, (fade_ms.max(1), Interpolation::Linear))
            .with_filter(filter)
            .with_area(inner);
        *settle_effect = Some(effect);
    }

    if let Some(effect) = settle_effect {
        frame.render_effect(effect, inner, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_menu(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let popup_w = 44u16.min(area.width);
    let popup_h = 16u16.min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w,
        height: popup_h,
    };
    let option = |mode: ComboMode, label: &'static str| {
        let best = view.high_scores.best(mode);
        let text = format!(" {label:<10} best {best:>6} ");
        if view.menu_mode == mode {
            Span::styled(text, Style::default().fg(theme.bg).bg(theme.title).bold())
        } else {
            Span::styled(text, Style::default().fg(theme.main_fg))
        }
    };
    let strip: Vec<Span> = theme
        .tiles
        .iter()
        .map(|&c| Span::styled("██ ", Style::default().fg(c)))
        .collect();
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(" T I L E B R A W L ", Style::default().fg(theme.title).bold())),
        Line::from(""),
        Line::from(strip),
        Line::from(""),
        Line::from(Span::styled("Combo mode", Style::default().fg(theme.title))),
        Line::from(option(ComboMode::Unified, "Unified")),
        Line::from(option(ComboMode::PerColor, "Per colour")),
        Line::from(""),
        Line::from(Span::styled(
            " ←/→ Choose   Enter Start   Q Quit ",
            Style::default().fg(theme.inactive_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, theme: &Theme, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P Resume    Q Menu ",
            Style::default().fg(theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let state = view.state;
    let popup_w = 34u16.min(area.width);
    let popup_h = 12u16.min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w,
        height: popup_h,
    };
    let fg = Style::default().fg(theme.main_fg);
    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Game Over ",
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(format!(" Score: {} ", state.score()), fg)),
        Line::from(Span::styled(
            format!(" Best: {} ", view.high_scores.best(state.combo_mode())),
            fg,
        )),
        Line::from(Span::styled(
            format!(" Stage {}  Level {} ", state.level(), state.player().level),
            fg,
        )),
        Line::from(Span::styled(
            format!(" Highest combo: x{} ", state.combo().highest),
            fg,
        )),
    ];
    if view.new_record {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(Color::Yellow).bold(),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " R Restart   M Menu   Q Quit ",
        fg,
    )));
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
            .title(Span::styled(" Tilebrawl ", Style::default().fg(theme.title))),
    );
    p.render(popup, frame.buffer_mut());
}

/// Board + sidebar. Returns the board's inner rect and tile size for the settle effect.
fn draw_game(frame: &mut Frame, view: &View, area: Rect) -> (Rect, (u16, u16)) {
    let size = view.state.board().size();
    let (board_area, sidebar_area, cell) = game_layout(area, size);
    let inner = draw_board(frame, view, board_area, cell);
    draw_sidebar(frame, view, sidebar_area);
    (inner, cell)
}

fn tile_symbol(tile: &Tile) -> String {
    if let Some(n) = tile.countdown {
        return n.to_string();
    }
    match tile.special {
        Some(Special::Bomb) => "●".to_string(),
        Some(Special::Bolt) => "≋".to_string(),
        None => String::new(),
    }
}

fn draw_board(frame: &mut Frame, view: &View, area: Rect, cell: (u16, u16)) -> Rect {
    let theme = view.theme;
    let state = view.state;
    let title = format!(" Tilebrawl  Stage {} ", state.level());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.div_line).bg(theme.bg))
        .title(Span::styled(title, Style::default().fg(theme.title)));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    let board = state.board();
    let buf = frame.buffer_mut();
    for pos in board.positions() {
        let tile = &board[pos];
        let r = tile_rect(inner, pos, cell);
        if r.width == 0 || r.height == 0 {
            continue;
        }
        let color = if tile.matched {
            Color::White
        } else {
            theme.tile_color(tile.kind)
        };
        let gap = cell.0 > 2;
        for y in r.y..r.y + r.height {
            for x in r.x..r.x + r.width {
                let edge = gap && x == r.x + r.width - 1;
                let bg = if edge { theme.bg } else { color };
                buf[(x, y)].set_symbol(" ").set_style(Style::default().bg(bg));
            }
        }

        let mid_y = r.y + r.height / 2;
        let symbol = tile_symbol(tile);
        if !symbol.is_empty() {
            let mid_x = r.x + r.width.saturating_sub(1 + u16::from(gap)) / 2;
            buf.set_string(
                mid_x,
                mid_y,
                symbol,
                Style::default().fg(Color::Black).bg(color).bold(),
            );
        }
        if tile.selected {
            let style = Style::default().fg(Color::White).bg(color).bold();
            buf.set_string(r.x, r.y, "◆", style);
        }
        if pos == view.cursor && view.screen == Screen::Playing {
            if r.width >= 3 {
                let style = Style::default().fg(theme.title).bg(theme.bg).bold();
                buf.set_string(r.x, mid_y, "▶", style);
                buf.set_string(r.x + r.width - 1, mid_y, "◀", style);
            } else {
                for x in r.x..r.x + r.width {
                    let cell = &mut buf[(x, mid_y)];
                    cell.set_style(cell.style().add_modifier(Modifier::REVERSED));
                }
            }
        }
    }
    inner
}

fn ratio(value: f64, max: f64) -> f64 {
    if max > 0.0 {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn bar_color(r: f64) -> Color {
    if r > 0.6 {
        Color::Green
    } else if r > 0.3 {
        Color::Yellow
    } else {
        Color::Red
    }
}

fn section(frame: &mut Frame, area: Rect, title: &str, style: Style, border: Style) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(format!(" {title} "), style));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());
    inner
}

fn gauge(frame: &mut Frame, area: Rect, r: f64, color: Color, label: String) {
    Gauge::default()
        .ratio(r)
        .label(label)
        .gauge_style(Style::default().fg(color))
        .render(area, frame.buffer_mut());
}

fn draw_sidebar(frame: &mut Frame, view: &View, area: Rect) {
    let theme = view.theme;
    let state: &RunState = view.state;
    let title_style = Style::default().fg(theme.title);
    let fg_style = Style::default().fg(theme.main_fg);
    let border_style = Style::default().fg(theme.div_line).bg(theme.bg);
    let player = state.player();
    let enemy = state.enemy();
    let config = state.config();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Enemy: health + attack timer
            Constraint::Length(6), // Player: health, xp, stats
            Constraint::Length(5), // Combo
            Constraint::Length(4), // Score / best
            Constraint::Min(3),    // Last breakdown + log
        ])
        .split(area);

    // --- Enemy ---
    let inner = section(frame, chunks[0], "Enemy", title_style, border_style);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);
    let hp = enemy.health_ratio();
    gauge(frame, rows[0], hp, bar_color(hp), format!("{}/{}", enemy.health, enemy.max_health));
    Paragraph::new(Line::from(vec![
        Span::styled("Attack ", title_style),
        Span::styled(enemy.attack.to_string(), fg_style),
    ]))
    .render(rows[1], frame.buffer_mut());
    let attack = ratio(
        f64::from(state.attack_time_left()),
        f64::from(config.enemy_attack_interval_secs),
    );
    gauge(
        frame,
        rows[2],
        attack,
        bar_color(attack),
        format!("{:.1}s", state.attack_time_left().max(0.0)),
    );

    // --- Player ---
    let inner = section(
        frame,
        chunks[1],
        &format!("Player  Lv {}", player.level),
        title_style,
        border_style,
    );
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);
    let php = ratio(player.health as f64, enemy.max_health as f64);
    gauge(frame, rows[0], php, bar_color(php), format!("HP {}", player.health));
    let xp = ratio(player.experience as f64, player.experience_to_next as f64);
    gauge(
        frame,
        rows[1],
        xp,
        Color::Blue,
        format!("XP {}/{}", player.experience, player.experience_to_next),
    );
    Paragraph::new(Line::from(vec![
        Span::styled("Block ", title_style),
        Span::styled(player.base_block_value.to_string(), fg_style),
        Span::styled("  Gold ", title_style),
        Span::styled(
            player.gold.to_string(),
            Style::default().fg(theme.tile_color(TileKind::Yellow)),
        ),
    ]))
    .render(rows[2], frame.buffer_mut());

    // --- Combo ---
    let mode = match state.combo_mode() {
        ComboMode::Unified => "Combo",
        ComboMode::PerColor => "Combo (per colour)",
    };
    let inner = section(frame, chunks[2], mode, title_style, border_style);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);
    let combo = state.combo();
    let counters: Vec<Span> = match state.combo_mode() {
        ComboMode::Unified => vec![Span::styled(format!("x{}", combo.global), fg_style.bold())],
        ComboMode::PerColor => combo
            .per_color
            .iter()
            .map(|(&kind, &n)| {
                Span::styled(format!("x{n} "), Style::default().fg(theme.tile_color(kind)))
            })
            .collect(),
    };
    Paragraph::new(Line::from(counters)).render(rows[0], frame.buffer_mut());
    let window = ratio(f64::from(state.combo_time_left()), f64::from(config.combo_window()));
    let active = combo.global > 0;
    gauge(
        frame,
        rows[1],
        if active { window } else { 0.0 },
        bar_color(window),
        format!("{:.1}s", state.combo_time_left().max(0.0)),
    );
    Paragraph::new(Line::from(vec![
        Span::styled("Best ", title_style),
        Span::styled(format!("x{}", combo.highest), fg_style),
    ]))
    .render(rows[2], frame.buffer_mut());

    // --- Score ---
    let inner = section(frame, chunks[3], "Score", title_style, border_style);
    let lines = vec![
        Line::from(Span::styled(state.score().to_string(), fg_style.bold())),
        Line::from(vec![
            Span::styled("Best ", title_style),
            Span::styled(view.high_scores.best(state.combo_mode()).to_string(), fg_style),
        ]),
    ];
    Paragraph::new(Text::from(lines)).render(inner, frame.buffer_mut());

    // --- Last match + event log ---
    let inner = section(frame, chunks[4], "Last match", title_style, border_style);
    let mut lines: Vec<Line> = state
        .last_breakdown()
        .iter()
        .map(|c| {
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(theme.tile_color(c.kind))),
                Span::styled(
                    format!("{} x{} = {}", c.matched_tiles, c.combo, c.value),
                    fg_style,
                ),
            ])
        })
        .collect();
    lines.push(Line::from(""));
    lines.extend(
        view.messages
            .iter()
            .rev()
            .map(|m| Line::from(Span::styled(m.clone(), Style::default().fg(theme.inactive_fg)))),
    );
    Paragraph::new(Text::from(lines)).render(inner, frame.buffer_mut());
}

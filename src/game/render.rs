//! Idle Fortune rendering: coin display, tabs, upgrade list, prestige panel,
//! and the offline earnings notice.

use std::cell::RefCell;
use std::rc::Rc;

use ratzilla::ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratzilla::ratatui::style::{Color, Modifier, Style};
use ratzilla::ratatui::text::{Line, Span};
use ratzilla::ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};
use ratzilla::ratatui::Frame;

use crate::input::{is_narrow_layout, ClickState};

use super::actions::*;
use super::format::{format_duration, format_number, format_rate};
use super::logic;
use super::save::SaveSlot;
use super::state::{GameState, PRESTIGE_THRESHOLD};
use super::{IdleGame, Tab};

pub fn render<S: SaveSlot>(
    game: &IdleGame<S>,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // coin display
            Constraint::Length(1), // tab bar
            Constraint::Min(8),    // content
            Constraint::Length(1), // key help
        ])
        .split(area);

    render_coin_display(&game.state, f, chunks[0], click_state);
    render_tab_bar(game, f, chunks[1], click_state);
    match game.tab {
        Tab::Upgrades => render_upgrades(&game.state, f, chunks[2], click_state),
        Tab::Prestige => render_prestige(&game.state, f, chunks[2], click_state),
    }
    render_help(f, chunks[3]);

    // Drawn last so its target covers everything underneath.
    if let Some(report) = game.offline_report() {
        render_offline_notice(report, f, area, click_state);
    }
}

fn render_coin_display(
    state: &GameState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let narrow = is_narrow_layout(area.width);
    let borders = if narrow { Borders::TOP | Borders::BOTTOM } else { Borders::ALL };

    let mut rate_line = vec![
        Span::styled(
            format!("+{}/s", format_rate(state.coins_per_second)),
            Style::default().fg(Color::Green),
        ),
        Span::styled("  ·  ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("+{}/tap", format_rate(state.click_power)),
            Style::default().fg(Color::Cyan),
        ),
    ];
    if state.prestige_multiplier > 1.0 {
        rate_line.push(Span::styled(
            format!("  ✨x{:.1}", state.prestige_multiplier),
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let lines = vec![
        Line::from(Span::styled(
            format!("🪙 {}", format_number(state.coins)),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(rate_line),
        Line::from(""),
        Line::from(Span::styled(
            "[C] TAP!",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
    ];

    let widget = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(borders)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Idle Fortune "),
    );
    f.render_widget(widget, area);

    // The whole panel is the tap surface.
    click_state.borrow_mut().add_click_target(area, TAP);
}

fn render_tab_bar<S: SaveSlot>(
    game: &IdleGame<S>,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let pending = logic::prestige_yield(&game.state);
    let prestige_label = if logic::can_prestige(&game.state) {
        format!(" ▸ Prestige [R] (+{}) ", pending)
    } else {
        " ▸ Prestige [R] ".to_string()
    };

    let tab_style = |tab: Tab, color: Color| -> Style {
        if game.tab == tab {
            Style::default()
                .fg(Color::Black)
                .bg(color)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(color)
        }
    };

    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            " ▸ Upgrades [U] ",
            tab_style(Tab::Upgrades, Color::Green),
        ))),
        halves[0],
    );
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            prestige_label,
            tab_style(Tab::Prestige, Color::Magenta),
        ))),
        halves[1],
    );

    let mut cs = click_state.borrow_mut();
    cs.add_click_target(halves[0], TAB_UPGRADES);
    cs.add_click_target(halves[1], TAB_PRESTIGE);
}

fn render_upgrades(
    state: &GameState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let narrow = is_narrow_layout(area.width);

    let items: Vec<ListItem> = state
        .upgrades
        .iter()
        .enumerate()
        .map(|(i, u)| {
            let key = Span::styled(
                format!("[{}] ", i + 1),
                Style::default().fg(Color::Yellow),
            );

            if !logic::is_unlocked(state, u) {
                return ListItem::new(Line::from(vec![
                    key,
                    Span::styled(
                        format!("🔒 {} at {} coins", u.name, format_number(u.unlock_at)),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]));
            }

            let name = Span::styled(
                format!("{} {:<13}", u.icon, u.name),
                Style::default().fg(Color::White),
            );
            let level = Span::styled(
                format!("Lv{:>3} ", u.level),
                Style::default().fg(Color::Cyan),
            );

            if u.is_maxed() {
                return ListItem::new(Line::from(vec![
                    key,
                    name,
                    level,
                    Span::styled(
                        "MAX",
                        Style::default()
                            .fg(Color::Green)
                            .add_modifier(Modifier::BOLD),
                    ),
                ]));
            }

            let cost = logic::purchase_cost(u);
            let cost_style = if logic::can_afford(state, u) {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Red)
            };

            let mut spans = vec![key, name, level, Span::styled(format!("💰{} ", format_number(cost)), cost_style)];
            if !narrow {
                spans.push(Span::styled(
                    u.description.as_str(),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let widget = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green))
            .title(" Upgrades [1-6] "),
    );
    f.render_widget(widget, area);

    let mut cs = click_state.borrow_mut();
    for i in 0..state.upgrades.len() {
        cs.add_row_target(area, area.y + 1 + i as u16, BUY_UPGRADE_BASE + i as u16);
    }
}

fn render_prestige(
    state: &GameState,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let mut lines: Vec<Line> = vec![
        Line::from(vec![
            Span::styled(
                format!(" ✨ Points: {} ", state.prestige_points),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("x{:.2} ", state.prestige_multiplier),
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("({} prestiges)", state.total_prestiges),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(Span::styled(
            format!(" Coins this run: {}", format_number(state.total_coins)),
            Style::default().fg(Color::White),
        )),
        Line::from(""),
    ];

    let button_line = lines.len() as u16;
    let eligible = logic::can_prestige(state);
    if eligible {
        lines.push(Line::from(Span::styled(
            format!(
                " [P] PRESTIGE: +{} points → x{:.2}",
                logic::prestige_yield(state),
                logic::preview_multiplier(state)
            ),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )));
    } else {
        let progress = (state.total_coins / PRESTIGE_THRESHOLD * 100.0).clamp(0.0, 100.0);
        lines.push(Line::from(Span::styled(
            format!(
                " Earn {} coins this run to prestige ({:.0}%)",
                format_number(PRESTIGE_THRESHOLD),
                progress
            ),
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " Prestige resets coins and upgrades. Points and the multiplier are kept.",
        Style::default().fg(Color::DarkGray),
    )));

    let widget = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta))
            .title(" Prestige "),
    );
    f.render_widget(widget, area);

    if eligible {
        click_state
            .borrow_mut()
            .add_row_target(area, area.y + 1 + button_line, PRESTIGE);
    }
}

fn render_help(f: &mut Frame, area: Rect) {
    let text = if is_narrow_layout(area.width) {
        " C tap · 1-6 buy · U/R tabs"
    } else {
        " C/Space tap · 1-6 buy · U upgrades · R prestige · P prestige (on tab)"
    };
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))),
        area,
    );
}

fn render_offline_notice(
    report: &logic::OfflineReport,
    f: &mut Frame,
    area: Rect,
    click_state: &Rc<RefCell<ClickState>>,
) {
    let popup = centered(area, 40, 8);
    let lines = vec![
        Line::from(Span::styled(
            "Welcome back!",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("Away for {}", format_duration(report.seconds_away))),
        Line::from(Span::styled(
            format!("+{} coins", format_number(report.earnings)),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "[Enter] Continue",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
    ];

    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Offline earnings "),
        ),
        popup,
    );

    // Click anywhere to dismiss.
    click_state.borrow_mut().add_click_target(area, DISMISS_OFFLINE);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect::new(
        area.x + (area.width - w) / 2,
        area.y + (area.height - h) / 2,
        w,
        h,
    )
}

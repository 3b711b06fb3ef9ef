//! Renderer — pure function from app state to a terminal frame.
//!
//! ```text
//! ┌─ deckhand ── dashboard ─────────────────────────┐
//! │                                                 │
//! │  (full-screen content for the active view)      │
//! │                                                 │
//! ├─────────────────────────────────────────────────┤
//! │ a start  s stop  r restart  b build  ...        │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! The only state this module touches are the viewport fields the paging
//! keys need (`*_viewport`) and the auto-scroll clamp.

use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::Frame;

use crate::stack::status::StatusCategory;
use crate::tui::wizard::WizardField;

use super::app::{App, View};

/// Draw the full frame.
pub fn draw(f: &mut Frame, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // header
            Constraint::Min(3),    // content
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    draw_header(f, app, outer[0]);

    match app.view {
        View::Dashboard => draw_dashboard(f, app, outer[1]),
        View::Logs | View::Action => draw_log_pane(f, app, outer[1]),
        View::Config => draw_config(f, app, outer[1]),
        View::Wizard => draw_wizard(f, app, outer[1]),
    }

    draw_status_bar(f, app, outer[2]);
}

fn view_title(app: &App) -> String {
    match app.view {
        View::Dashboard => "dashboard".into(),
        View::Logs => "logs".into(),
        View::Action => match app.action.current {
            Some(kind) => format!("{kind}"),
            None => "operation".into(),
        },
        View::Config => "config".into(),
        View::Wizard => "wizard".into(),
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled(
            " deckhand ",
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::styled(view_title(app), Style::default().add_modifier(Modifier::BOLD)),
    ];
    if app.action.running {
        if let Some(kind) = app.action.current {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                format!("[{kind} running]"),
                Style::default().fg(Color::Yellow),
            ));
        }
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn category_style(category: StatusCategory) -> Style {
    match category {
        StatusCategory::Active => Style::default().fg(Color::Green),
        StatusCategory::Warning => Style::default().fg(Color::Yellow),
        StatusCategory::Error => Style::default().fg(Color::Red),
        StatusCategory::Unknown => Style::default().fg(Color::DarkGray),
    }
}

fn draw_dashboard(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default().title(" services ").borders(Borders::ALL);
    if app.statuses.is_empty() {
        let para = Paragraph::new("no containers yet — waiting for the first status poll")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(para, area);
        return;
    }

    let name_width = app
        .statuses
        .iter()
        .map(|s| s.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);
    let items: Vec<ListItem> = app
        .statuses
        .iter()
        .map(|s| {
            let marker = match s.category() {
                StatusCategory::Active => "●",
                StatusCategory::Warning => "◐",
                StatusCategory::Error => "✗",
                StatusCategory::Unknown => "?",
            };
            let health = if s.health.is_empty() {
                String::new()
            } else {
                format!(" ({})", s.health)
            };
            let line = Line::from(vec![
                Span::styled(format!(" {marker} "), category_style(s.category())),
                Span::raw(format!("{:<name_width$}  ", s.name)),
                Span::styled(
                    format!("{}{health}", s.status),
                    category_style(s.category()),
                ),
                Span::styled(
                    format!("  {}", s.age),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            ListItem::new(line)
        })
        .collect();
    f.render_widget(List::new(items).block(block), area);
}

fn draw_log_pane(f: &mut Frame, app: &mut App, area: Rect) {
    let title = format!(" {} ", view_title(app));
    let block = Block::default().title(title).borders(Borders::ALL);

    let inner_height = area.height.saturating_sub(2);
    app.log_viewport = inner_height.max(1);

    // Clamp scroll; auto-scroll pins the viewport to the tail.
    let total = app.logs.len() as u16;
    let max_scroll = total.saturating_sub(inner_height);
    if app.log_auto_scroll {
        app.log_scroll = max_scroll;
    } else {
        app.log_scroll = app.log_scroll.min(max_scroll);
    }

    let text: Vec<Line> = app
        .logs
        .lines()
        .iter()
        .map(|l| Line::from(l.as_str()))
        .collect();
    let para = Paragraph::new(text)
        .block(block)
        .scroll((app.log_scroll, 0));
    f.render_widget(para, area);
}

fn draw_config(f: &mut Frame, app: &mut App, area: Rect) {
    let title = format!(" config ({} keys) ", app.config_pairs.len());
    let block = Block::default().title(title).borders(Borders::ALL);

    let inner_height = area.height.saturating_sub(2);
    app.config_viewport = inner_height.max(1);
    let total = app.config_pairs.len() as u16;
    app.config_scroll = app.config_scroll.min(total.saturating_sub(inner_height));

    let lines: Vec<Line> = app
        .config_pairs
        .iter()
        .map(|(key, value)| {
            let shown = display_value(key, value, app.reveal_secrets);
            Line::from(vec![
                Span::styled(format!(" {key}"), Style::default().fg(Color::Cyan)),
                Span::raw(" = "),
                Span::raw(shown),
            ])
        })
        .collect();
    let para = Paragraph::new(lines)
        .block(block)
        .scroll((app.config_scroll, 0));
    f.render_widget(para, area);
}

fn display_value(key: &str, value: &str, revealed: bool) -> String {
    if value.is_empty() {
        return String::new();
    }
    if super::wizard::is_sensitive(key) && !revealed {
        return "*".repeat(value.chars().count());
    }
    value.to_string()
}

fn field_display(field: &WizardField) -> String {
    if field.masked && !field.revealed {
        "*".repeat(field.input.value.chars().count())
    } else {
        field.input.value.clone()
    }
}

fn draw_wizard(f: &mut Frame, app: &App, area: Rect) {
    let Some(ref session) = app.wizard else {
        return;
    };
    let block = Block::default()
        .title(" edit configuration ")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if session.fields.is_empty() {
        f.render_widget(
            Paragraph::new("no configuration keys found")
                .style(Style::default().fg(Color::DarkGray)),
            inner,
        );
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // position
            Constraint::Length(1), // key
            Constraint::Length(3), // input box
            Constraint::Length(1), // error
            Constraint::Min(0),
        ])
        .split(inner);

    let field = &session.fields[session.index];
    f.render_widget(
        Paragraph::new(format!(
            " field {}/{}",
            session.index + 1,
            session.fields.len()
        ))
        .style(Style::default().fg(Color::DarkGray)),
        rows[0],
    );

    let mut key_line = vec![Span::styled(
        format!(" {}", field.key),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if field.masked {
        key_line.push(Span::styled(
            "  (secret)",
            Style::default().fg(Color::Yellow),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(key_line)), rows[1]);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let input_inner = input_block.inner(rows[2]);
    f.render_widget(input_block, rows[2]);
    let shown = field_display(field);
    f.render_widget(Paragraph::new(shown.as_str()), input_inner);
    if field.input.focused {
        let x = input_inner.x + (field.input.cursor as u16).min(input_inner.width.saturating_sub(1));
        f.set_cursor_position(Position::new(x, input_inner.y));
    }

    if let Some(ref error) = session.error {
        f.render_widget(
            Paragraph::new(format!(" {error}")).style(Style::default().fg(Color::Red)),
            rows[3],
        );
    }
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    if let Some(ref note) = app.success {
        f.render_widget(
            Paragraph::new(format!(" ✓ {}", note.text))
                .style(Style::default().fg(Color::Black).bg(Color::Green)),
            area,
        );
        return;
    }
    let hints = match app.view {
        View::Dashboard => " a start  s stop  r restart  b build  l logs  c config  w wizard  q quit",
        View::Logs => " ↑/↓ scroll  pgup/pgdn page  esc back  q quit",
        View::Action => " ↑/↓ scroll  (returns to dashboard when the operation ends)",
        View::Config => " r reload  space reveal secrets  ↑/↓ scroll  esc back  q quit",
        View::Wizard => " ←/→ field  tab reveal  ctrl+s save  esc cancel",
    };
    f.render_widget(
        Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

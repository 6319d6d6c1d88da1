use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use healthquery_core::auth::Operation;
use healthquery_core::models::AuthMode;

use crate::app::{App, AppState, WorkspaceFocus};

use super::styles;
use super::views::{auth, workspace};

const APP_TITLE: &str = "FHIR Natural Language Health Query Tool";

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);

    // The session alone decides which screen is shown
    if app.is_authenticated() {
        workspace::render(frame, app, chunks[1]);
    } else {
        auth::render(frame, app, chunks[1]);
    }

    render_status_bar(frame, app, chunks[2]);

    if matches!(app.state, AppState::ShowingHelp) {
        render_help_overlay(frame);
    }

    if matches!(app.state, AppState::ConfirmingQuit) {
        render_quit_overlay(frame);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  {}", APP_TITLE);
    let right = if app.is_authenticated() {
        format!("Welcome, {}!  [?] Help ", app.session.username())
    } else {
        "[?] Help ".to_string()
    };

    let padding = (area.width as usize)
        .saturating_sub(title.chars().count() + right.chars().count());

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(padding)),
        Span::styled(right, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

/// Left side of the status bar: in-flight work, then notices, then the server
fn status_text(app: &App) -> String {
    match app.in_flight() {
        Some(Operation::Auth(AuthMode::Login)) => "Signing in...".to_string(),
        Some(Operation::Auth(AuthMode::Signup)) => "Creating account...".to_string(),
        Some(Operation::Query) => "Querying...".to_string(),
        None => app
            .status_message
            .clone()
            .unwrap_or_else(|| format!("Server: {}", app.session.api().base_url())),
    }
}

fn shortcuts(app: &App) -> &'static str {
    if !app.is_authenticated() {
        "[Tab] next field | [Enter] select | [Esc] quit"
    } else if app.workspace_focus == WorkspaceFocus::Query {
        "[Enter] search | [↑/↓] history | [Esc] results"
    } else {
        "[/] query | [l]ogout | [q]uit"
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = format!(" {} ", status_text(app));
    let right_text = format!(" {} ", shortcuts(app));

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 22, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled(" healthquery", styles::title_style())),
        Line::from(Span::styled(format!(" version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Sign in", styles::highlight_style())),
        help_line("Tab/↓", "Next field"),
        help_line("←/→", "Switch Login / Sign Up"),
        help_line("Enter", "Next field / submit"),
        Line::from(""),
        Line::from(Span::styled(" Query field", styles::highlight_style())),
        help_line("Enter", "Run query"),
        help_line("↑/↓", "Recall recent queries"),
        help_line("Esc/Tab", "Move to results"),
        Line::from(""),
        Line::from(Span::styled(" Results", styles::highlight_style())),
        help_line("↑/↓ PgUp", "Scroll table"),
        help_line("/ or i", "Back to query field"),
        help_line("l", "Log out"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(40, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

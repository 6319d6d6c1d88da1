use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use healthquery_core::models::AuthMode;

use crate::app::{App, AuthFocus};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

/// Visible width of the username/password fields
const FIELD_WIDTH: usize = 20;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let has_message = app.error().is_some() || app.status_message.is_some();
    let height = if has_message { 13 } else { 11 };
    let area = centered_rect_fixed(50, height, area);

    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];

    // Mode switch
    let mode_focused = app.auth_focus == AuthFocus::Mode;
    let marker = if mode_focused { "▶ " } else { "  " };
    lines.push(Line::from(vec![
        Span::styled(format!("      {}", marker), styles::highlight_style()),
        Span::styled("Login", styles::tab_style(app.auth_mode == AuthMode::Login)),
        Span::styled("  |  ", styles::muted_style()),
        Span::styled("Sign Up", styles::tab_style(app.auth_mode == AuthMode::Signup)),
    ]));
    lines.push(Line::from(""));

    lines.push(field_line(
        "Username",
        &app.auth_username,
        app.auth_focus == AuthFocus::Username,
    ));

    let masked = "*".repeat(app.auth_password.chars().count());
    lines.push(field_line(
        "Password",
        &masked,
        app.auth_focus == AuthFocus::Password,
    ));

    // Submit button
    lines.push(Line::from(""));
    let button_focused = app.auth_focus == AuthFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let label = if button_focused {
        format!(" ▶ {} ◀ ", app.auth_mode.title())
    } else {
        format!("   {}   ", app.auth_mode.title())
    };
    lines.push(Line::from(vec![
        Span::raw("              ["),
        Span::styled(label, button_style),
        Span::raw("]"),
    ]));

    // Error takes precedence over notices
    if let Some(error) = app.error() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    } else if let Some(ref message) = app.status_message {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", message), styles::success_style())));
    }

    let block = Block::default()
        .title(format!(" {} ", app.auth_mode.title()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// `Label: [value▌]`, showing the tail of long values
fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };

    let count = value.chars().count();
    let visible: String = value.chars().skip(count.saturating_sub(FIELD_WIDTH)).collect();
    let cursor = if focused { "▌" } else { " " };

    Line::from(vec![
        Span::raw("      "),
        Span::styled(format!("{}: [", label), styles::muted_style()),
        Span::styled(format!("{:<width$}{}", visible, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

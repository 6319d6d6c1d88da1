use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use healthquery_core::results::{ResultView, NO_RESULTS_MESSAGE};

use crate::app::{App, WorkspaceFocus};
use crate::ui::styles;

use super::results;

const QUERY_PLACEHOLDER: &str = "Enter query (e.g., patients with asthma)";

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query input
            Constraint::Length(1), // Error / filters line
            Constraint::Min(8),    // Results
            Constraint::Length(7), // Recent queries
        ])
        .split(area);

    render_query_input(frame, app, chunks[0]);
    render_message_line(frame, app, chunks[1]);
    render_results(frame, app, chunks[2]);
    render_history(frame, app, chunks[3]);
}

fn render_query_input(frame: &mut Frame, app: &App, area: Rect) {
    let focused = app.workspace_focus == WorkspaceFocus::Query;

    let line = if app.query_input.is_empty() && !focused {
        Line::from(Span::styled(QUERY_PLACEHOLDER, styles::muted_style()))
    } else {
        let cursor = if focused { "▌" } else { "" };
        Line::from(vec![
            Span::styled(app.query_input.clone(), styles::list_item_style()),
            Span::styled(cursor, styles::highlight_style()),
        ])
    };

    let block = Block::default()
        .title(" Query ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// The current error, or else what the service understood the query to mean
fn render_message_line(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(error) = app.error() {
        Line::from(Span::styled(format!(" {}", error), styles::error_style()))
    } else if let Some(filters) = app
        .result
        .as_ref()
        .and_then(|r| r.filters.as_ref())
        .filter(|f| !f.is_empty())
    {
        Line::from(vec![
            Span::styled(" Filters: ", styles::muted_style()),
            Span::styled(filters.summary(), styles::highlight_style()),
        ])
    } else {
        Line::from("")
    };

    frame.render_widget(Paragraph::new(line), area);
}

fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    match ResultView::of(app.result.as_ref()) {
        ResultView::Absent => {
            let paragraph = Paragraph::new(Span::styled(
                " Results will appear here.",
                styles::muted_style(),
            ))
            .block(results_block(app));
            frame.render_widget(paragraph, area);
        }
        ResultView::Empty => {
            let paragraph = Paragraph::new(Span::styled(
                format!(" {}", NO_RESULTS_MESSAGE),
                styles::muted_style(),
            ))
            .block(results_block(app));
            frame.render_widget(paragraph, area);
        }
        ResultView::Rows(rows) => {
            let chunks = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
                .split(area);

            let focused = app.workspace_focus == WorkspaceFocus::Results;
            results::render_table(frame, &rows, app.result_selection, focused, chunks[0]);
            results::render_chart(frame, &rows, chunks[1]);
        }
    }
}

fn results_block(app: &App) -> Block<'static> {
    Block::default()
        .title(" FHIR Simulated Output ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.workspace_focus == WorkspaceFocus::Results))
}

fn render_history(frame: &mut Frame, app: &App, area: Rect) {
    let lines: Vec<Line> = if app.history.is_empty() {
        vec![Line::from(Span::styled(" No queries yet", styles::muted_style()))]
    } else {
        app.history
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                Line::from(vec![
                    Span::styled(format!(" {}. ", i + 1), styles::muted_style()),
                    Span::styled(entry.text.clone(), styles::list_item_style()),
                    Span::styled(format!("  {}", entry.age_display()), styles::muted_style()),
                ])
            })
            .collect()
    };

    let block = Block::default()
        .title(" Recent Queries ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

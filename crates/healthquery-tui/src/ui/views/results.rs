use ratatui::{
    layout::{Constraint, Direction, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use healthquery_core::models::PatientResource;
use healthquery_core::results::{
    condition_breakdown, NO_CHART_DATA_MESSAGE, NO_TABLE_DATA_MESSAGE,
};

use crate::ui::styles;

/// Rows verbatim: Name, Age, Condition
pub fn render_table(
    frame: &mut Frame,
    rows: &[&PatientResource],
    selection: usize,
    focused: bool,
    area: Rect,
) {
    let block = Block::default()
        .title(format!(" Patients ({}) ", rows.len()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    if rows.is_empty() {
        let paragraph = Paragraph::new(Span::styled(NO_TABLE_DATA_MESSAGE, styles::muted_style()))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new([Cell::from("Name"), Cell::from("Age"), Cell::from("Condition")])
        .style(styles::title_style())
        .height(1);

    let table_rows: Vec<Row> = rows
        .iter()
        .map(|patient| {
            Row::new(vec![
                Cell::from(patient.name_str().to_string()),
                Cell::from(format!("{:>3}", patient.age_str())),
                Cell::from(patient.condition_str().to_string()),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Fill(3),   // Name
        Constraint::Length(4), // Age
        Constraint::Fill(2),   // Condition
    ];

    let table = Table::new(table_rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if focused {
        state.select(Some(selection.min(rows.len() - 1)));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

/// Share of each condition as horizontal bars
pub fn render_chart(frame: &mut Frame, rows: &[&PatientResource], area: Rect) {
    let block = Block::default()
        .title(" Conditions ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let slices = condition_breakdown(rows);
    if slices.is_empty() {
        let paragraph = Paragraph::new(Span::styled(NO_CHART_DATA_MESSAGE, styles::muted_style()))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let total = rows.len();
    let bars: Vec<Bar> = slices
        .iter()
        .enumerate()
        .map(|(i, slice)| {
            let color = styles::chart_color(i);
            Bar::default()
                .value(slice.count as u64)
                .label(Line::from(slice.label.clone()))
                .text_value(format!("{} ({:.0}%)", slice.count, slice.percent(total)))
                .style(Style::default().fg(color))
                .value_style(Style::default().fg(Color::Black).bg(color))
        })
        .collect();

    let chart = BarChart::default()
        .block(block)
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(1)
        .max(total as u64)
        .data(BarGroup::default().bars(&bars));

    frame.render_widget(chart, area);
}

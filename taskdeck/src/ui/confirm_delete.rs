//! Delete-confirmation modal rendering.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use super::theme::Palette;
use crate::app::App;

/// Render the delete-confirmation modal over the task screen.
pub fn render(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let Some(id) = &app.pending_delete else {
        return;
    };
    let text = app
        .tasks
        .iter()
        .find(|t| &t.id == id)
        .map_or("this task", |t| t.text.as_str());

    let modal_area = centered(area, 50, 6);
    frame.render_widget(Clear, modal_area);

    let lines = vec![
        Line::from(Span::styled(format!("Delete \"{text}\"?"), palette.normal())),
        Line::default(),
        Line::from(vec![
            Span::styled("y/Enter", palette.error_text()),
            Span::styled(": delete   ", palette.dimmed()),
            Span::styled("n/Esc", palette.bold()),
            Span::styled(": cancel", palette.dimmed()),
        ]),
    ];

    let block = Block::default()
        .title("Confirm")
        .borders(Borders::ALL)
        .border_style(palette.error_text())
        .style(ratatui::style::Style::default().bg(palette.modal_bg));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(ratatui::layout::Alignment::Center);
    frame.render_widget(paragraph, modal_area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(height.min(area.height)),
            Constraint::Fill(1),
        ])
        .split(area);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(width.min(area.width)),
            Constraint::Fill(1),
        ])
        .split(vertical[1]);
    horizontal[1]
}

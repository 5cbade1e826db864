//! Sign-in screen rendering.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::theme::Palette;
use crate::app::App;

/// Render the centered sign-in prompt.
pub fn render(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let box_area = centered(area, 44, 8);

    let mut lines = vec![
        Line::from(Span::styled("TaskDeck", palette.bold().fg(palette.highlight))),
        Line::default(),
        Line::from(Span::styled(
            "Press Enter to sign in",
            palette.normal(),
        )),
        Line::from(Span::styled("q to quit", palette.dimmed())),
    ];
    if let Some(notice) = &app.notice {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            notice.text.clone(),
            palette.error_text(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.highlighted());
    let paragraph = Paragraph::new(lines)
        .block(block)
        .alignment(ratatui::layout::Alignment::Center);
    frame.render_widget(paragraph, box_area);
}

/// A `width` x `height` rect centered in `area`, clamped to fit.
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

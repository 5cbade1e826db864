//! New-task input form rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::theme::Palette;
use crate::app::{App, Focus};

/// Render the new-task input box.
pub fn render(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let is_focused = app.focus == Focus::Input && app.pending_delete.is_none();

    // Build the input text with an inline cursor.
    let mut display_text = app.input.clone();
    if is_focused {
        display_text.insert(app.byte_index(), '█');
    }

    let input_line = if display_text.is_empty() {
        Line::from(Span::styled("What needs doing?", palette.dimmed()))
    } else {
        Line::from(Span::styled(display_text, palette.normal()))
    };

    let block = Block::default()
        .title("New task")
        .borders(Borders::ALL)
        .border_style(if is_focused {
            palette.highlighted()
        } else {
            palette.dimmed()
        });

    frame.render_widget(Paragraph::new(input_line).block(block), area);
}

//! Status bar rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::theme::Palette;
use crate::app::{App, Focus};
use crate::sync::NoticeLevel;

/// Render the status bar: an active notice takes priority over key hints.
pub fn render(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let line = if let Some(notice) = &app.notice {
        let style = match notice.level {
            NoticeLevel::Info => palette.success_text(),
            NoticeLevel::Error => palette.error_text(),
        };
        Line::from(Span::styled(notice.text.clone(), style))
    } else {
        let hints = match app.focus {
            Focus::Input => "Enter: add | Tab: list | Ctrl-T: theme | Ctrl-O: sign out | Esc: quit",
            Focus::List => {
                "Space: toggle | d: delete | ↑↓/jk: move | Tab: input | Ctrl-O: sign out | Esc: quit"
            }
        };
        Line::from(Span::styled(hints, palette.dimmed()))
    };

    frame.render_widget(Paragraph::new(line).style(palette.status_bar()), area);
}

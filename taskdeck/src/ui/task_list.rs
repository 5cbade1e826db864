//! Task list rendering.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
};

use super::theme::Palette;
use crate::app::{App, Focus};

/// Render the task list.
pub fn render(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let is_focused = app.focus == Focus::List && app.pending_delete.is_none();

    let items: Vec<ListItem> = app
        .tasks
        .iter()
        .enumerate()
        .map(|(i, task)| {
            let is_selected = is_focused && i == app.selected;
            let checkbox = if task.completed { "[✓]" } else { "[ ]" };
            let text_style = if is_selected {
                palette.selected()
            } else if task.completed {
                palette.completed()
            } else {
                palette.normal()
            };
            // A row without a server timestamp has not been confirmed yet.
            let stamp = task.created_at.map_or_else(
                || "…".to_string(),
                |at| at.format("%b %d %H:%M").to_string(),
            );

            let line = Line::from(vec![
                Span::styled(checkbox, if task.completed {
                    palette.success_text()
                } else {
                    palette.dimmed()
                }),
                Span::raw(" "),
                Span::styled(task.text.clone(), text_style),
                Span::raw("  "),
                Span::styled(stamp, palette.dimmed()),
            ]);
            ListItem::new(line)
        })
        .collect();

    let title = format!("Tasks ({})", app.tasks.len());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if is_focused {
            palette.highlighted()
        } else {
            palette.dimmed()
        });

    if app.tasks.is_empty() {
        let empty = ratatui::widgets::Paragraph::new(Line::from(Span::styled(
            "No tasks yet. Type above and press Enter.",
            palette.dimmed(),
        )))
        .block(block);
        frame.render_widget(empty, area);
    } else {
        frame.render_widget(List::new(items).block(block), area);
    }
}

//! Header rendering (app title + signed-in user).

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use super::theme::Palette;
use crate::app::App;

/// Render the header bar with the app title and the current user.
pub fn render(frame: &mut Frame, area: Rect, app: &App, palette: &Palette) {
    let user_part = app.user.as_ref().map_or_else(
        || Span::styled("signed out", palette.dimmed()),
        |user| {
            Span::styled(
                format!("({}) {}", user.initials(), user.display_name),
                palette.normal(),
            )
        },
    );

    let theme_name = if app.dark_mode { "dark" } else { "light" };
    let line = Line::from(vec![
        Span::styled("TaskDeck", palette.bold().fg(palette.highlight)),
        Span::raw("  "),
        user_part,
        Span::styled(format!("  · {theme_name}"), palette.dimmed()),
    ]);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.dimmed());
    frame.render_widget(Paragraph::new(line).block(block), area);
}

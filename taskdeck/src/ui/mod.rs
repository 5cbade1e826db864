//! Terminal UI rendering.

pub mod confirm_delete;
pub mod header;
pub mod sign_in;
pub mod status_bar;
pub mod task_form;
pub mod task_list;
pub mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
};

use crate::app::{App, Screen};

use theme::Palette;

/// Main draw function for the entire UI.
pub fn draw(frame: &mut Frame, app: &App) {
    let palette = if app.dark_mode {
        Palette::dark()
    } else {
        Palette::light()
    };

    match app.screen {
        Screen::SignIn => sign_in::render(frame, frame.area(), app, &palette),
        Screen::Tasks => draw_tasks(frame, app, &palette),
    }
}

fn draw_tasks(frame: &mut Frame, app: &App, palette: &Palette) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // New-task form
            Constraint::Min(3),    // Task list
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    header::render(frame, chunks[0], app, palette);
    task_form::render(frame, chunks[1], app, palette);
    task_list::render(frame, chunks[2], app, palette);
    status_bar::render(frame, chunks[3], app, palette);

    // The confirmation modal draws on top of everything.
    if app.pending_delete.is_some() {
        confirm_delete::render(frame, frame.area(), app, palette);
    }
}

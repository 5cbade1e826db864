//! Theme and styling for the TUI.
//!
//! All colors come from a [`Palette`] so the dark/light toggle swaps the
//! whole scheme at draw time.

use ratatui::style::{Color, Modifier, Style};

/// A full color scheme.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    /// Primary foreground color.
    pub fg_primary: Color,
    /// Secondary foreground color (dimmed text).
    pub fg_secondary: Color,
    /// Highlight color for focused elements.
    pub highlight: Color,
    /// Success indicator color.
    pub success: Color,
    /// Error indicator color.
    pub error: Color,
    /// Status bar background.
    pub status_bg: Color,
    /// Modal background.
    pub modal_bg: Color,
}

impl Palette {
    /// The dark scheme (default).
    #[must_use]
    pub const fn dark() -> Self {
        Self {
            fg_primary: Color::White,
            fg_secondary: Color::Gray,
            highlight: Color::Cyan,
            success: Color::Green,
            error: Color::Red,
            status_bg: Color::Rgb(30, 30, 50),
            modal_bg: Color::Rgb(40, 40, 60),
        }
    }

    /// The light scheme.
    #[must_use]
    pub const fn light() -> Self {
        Self {
            fg_primary: Color::Black,
            fg_secondary: Color::DarkGray,
            highlight: Color::Blue,
            success: Color::Rgb(0, 128, 0),
            error: Color::Rgb(180, 0, 0),
            status_bg: Color::Rgb(220, 220, 235),
            modal_bg: Color::Rgb(235, 235, 245),
        }
    }

    /// Normal text style.
    #[must_use]
    pub fn normal(&self) -> Style {
        Style::default().fg(self.fg_primary)
    }

    /// Dimmed text style (timestamps, metadata, completed tasks).
    #[must_use]
    pub fn dimmed(&self) -> Style {
        Style::default().fg(self.fg_secondary)
    }

    /// Bold text style.
    #[must_use]
    pub fn bold(&self) -> Style {
        Style::default()
            .fg(self.fg_primary)
            .add_modifier(Modifier::BOLD)
    }

    /// Highlighted text style (focused panel borders).
    #[must_use]
    pub fn highlighted(&self) -> Style {
        Style::default()
            .fg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    /// Selected item style (in lists).
    #[must_use]
    pub fn selected(&self) -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(self.highlight)
            .add_modifier(Modifier::BOLD)
    }

    /// Completed-task text style (dim, struck through).
    #[must_use]
    pub fn completed(&self) -> Style {
        Style::default()
            .fg(self.fg_secondary)
            .add_modifier(Modifier::CROSSED_OUT)
    }

    /// Status bar background style.
    #[must_use]
    pub fn status_bar(&self) -> Style {
        Style::default().fg(self.fg_primary).bg(self.status_bg)
    }

    /// Error text style.
    #[must_use]
    pub fn error_text(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }

    /// Success text style.
    #[must_use]
    pub fn success_text(&self) -> Style {
        Style::default().fg(self.success)
    }
}

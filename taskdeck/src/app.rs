//! Application state for the TUI (screens, focus, input handling).
//!
//! `App` is deliberately synchronous: key events come in, optional
//! [`SyncCommand`]s come out, and [`SyncEvent`]s from the synchronization
//! loop are applied to the display state. All remote effects live behind
//! the command channel.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use taskdeck_model::task::{Task, TaskId};
use taskdeck_model::user::AuthUser;

use crate::config::ClientConfig;
use crate::prefs::Prefs;
use crate::sync::{NoticeLevel, SyncCommand, SyncEvent};

/// Which screen is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Unauthenticated: sign-in prompt.
    SignIn,
    /// Authenticated: the task list.
    Tasks,
}

/// Which panel receives keys on the tasks screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// The new-task text input.
    Input,
    /// The task list.
    List,
}

/// A transient status-bar message.
#[derive(Debug, Clone)]
pub struct Notice {
    /// Severity, used for styling.
    pub level: NoticeLevel,
    /// Message text.
    pub text: String,
    /// When the notice appeared, for expiry.
    pub shown_at: Instant,
}

/// Application state.
pub struct App {
    /// Current screen.
    pub screen: Screen,
    /// Current focus on the tasks screen.
    pub focus: Focus,
    /// New-task input buffer.
    pub input: String,
    /// Cursor position in the input, in characters.
    pub cursor_position: usize,
    /// Current task list, as published by the synchronization loop.
    pub tasks: Vec<Task>,
    /// Selected row in the task list.
    pub selected: usize,
    /// Authenticated user, if any.
    pub user: Option<AuthUser>,
    /// Active status-bar notice.
    pub notice: Option<Notice>,
    /// Task awaiting delete confirmation, if the modal is open.
    pub pending_delete: Option<TaskId>,
    /// Render with the dark palette.
    pub dark_mode: bool,
    /// Set when the user asked to quit.
    pub should_quit: bool,

    max_text_len: usize,
    confirm_delete: bool,
    notice_ttl: std::time::Duration,
}

impl App {
    /// Create the application state from resolved config and preferences.
    #[must_use]
    pub const fn new(config: &ClientConfig, prefs: Prefs) -> Self {
        Self {
            screen: Screen::SignIn,
            focus: Focus::Input,
            input: String::new(),
            cursor_position: 0,
            tasks: Vec::new(),
            selected: 0,
            user: None,
            notice: None,
            pending_delete: None,
            dark_mode: prefs.dark_mode,
            should_quit: false,
            max_text_len: config.max_text_len,
            confirm_delete: config.confirm_delete,
            notice_ttl: config.notice_ttl,
        }
    }

    /// Handle a key event, producing a command for the synchronization
    /// loop when the key maps to a remote effect.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        // The confirmation modal swallows everything while open.
        if self.pending_delete.is_some() {
            return self.handle_modal_key(key);
        }

        // Global shortcuts
        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return None;
            }
            (KeyCode::Char('t'), KeyModifiers::CONTROL) => {
                self.dark_mode = !self.dark_mode;
                return None;
            }
            _ => {}
        }

        match self.screen {
            Screen::SignIn => self.handle_sign_in_key(key),
            Screen::Tasks => self.handle_tasks_key(key),
        }
    }

    fn handle_sign_in_key(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        match key.code {
            KeyCode::Enter | KeyCode::Char('s') => Some(SyncCommand::SignIn),
            KeyCode::Esc | KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            _ => None,
        }
    }

    fn handle_tasks_key(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        match (key.code, key.modifiers) {
            (KeyCode::Char('o'), KeyModifiers::CONTROL) => return Some(SyncCommand::SignOut),
            (KeyCode::Tab | KeyCode::BackTab, _) => {
                self.cycle_focus();
                return None;
            }
            (KeyCode::Esc, _) => {
                // Esc peels back one layer: input text first, then quit.
                if self.input.is_empty() {
                    self.should_quit = true;
                } else {
                    self.input.clear();
                    self.cursor_position = 0;
                }
                return None;
            }
            _ => {}
        }

        match self.focus {
            Focus::Input => self.handle_input_key(key),
            Focus::List => self.handle_list_key(key),
        }
    }

    fn handle_modal_key(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        match key.code {
            KeyCode::Enter | KeyCode::Char('y') => {
                let id = self.pending_delete.take()?;
                Some(SyncCommand::DeleteTask { id })
            }
            KeyCode::Esc | KeyCode::Char('n') => {
                self.pending_delete = None;
                None
            }
            _ => None,
        }
    }

    /// Handle key event when the text input is focused.
    fn handle_input_key(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        match key.code {
            KeyCode::Enter => return self.submit_input(),
            KeyCode::Char(c) => self.enter_char(c),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Home => self.cursor_position = 0,
            KeyCode::End => self.cursor_position = self.input.chars().count(),
            KeyCode::Down => self.focus = Focus::List,
            _ => {}
        }
        None
    }

    /// Handle key event when the task list is focused.
    fn handle_list_key(&mut self, key: KeyEvent) -> Option<SyncCommand> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                if self.selected == 0 {
                    self.focus = Focus::Input;
                } else {
                    self.selected -= 1;
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.tasks.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                let task = self.tasks.get(self.selected)?;
                return Some(SyncCommand::ToggleCompleted {
                    id: task.id.clone(),
                });
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let task = self.tasks.get(self.selected)?;
                let id = task.id.clone();
                if self.confirm_delete {
                    self.pending_delete = Some(id);
                } else {
                    return Some(SyncCommand::DeleteTask { id });
                }
            }
            _ => {}
        }
        None
    }

    /// Apply an event published by the synchronization loop.
    pub fn apply_sync_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::UserChanged(user) => {
                self.screen = if user.is_some() {
                    Screen::Tasks
                } else {
                    Screen::SignIn
                };
                if user.is_none() {
                    self.input.clear();
                    self.cursor_position = 0;
                    self.selected = 0;
                    self.pending_delete = None;
                    self.focus = Focus::Input;
                }
                self.user = user;
            }
            SyncEvent::ListChanged(tasks) => {
                self.tasks = tasks;
                if self.selected >= self.tasks.len() {
                    self.selected = self.tasks.len().saturating_sub(1);
                }
                // The confirmed target may have vanished from a snapshot.
                if let Some(id) = &self.pending_delete {
                    if !self.tasks.iter().any(|t| &t.id == id) {
                        self.pending_delete = None;
                    }
                }
            }
            SyncEvent::Notice { level, text } => {
                self.notice = Some(Notice {
                    level,
                    text,
                    shown_at: Instant::now(),
                });
            }
        }
    }

    /// Periodic housekeeping: expire the status-bar notice.
    pub fn tick(&mut self) {
        if let Some(notice) = &self.notice {
            if notice.shown_at.elapsed() >= self.notice_ttl {
                self.notice = None;
            }
        }
    }

    /// Byte offset of the character cursor, for rendering and edits.
    #[must_use]
    pub fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .map(|(i, _)| i)
            .nth(self.cursor_position)
            .unwrap_or(self.input.len())
    }

    const fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::List,
            Focus::List => Focus::Input,
        };
    }

    /// Submit the current input as a new task.
    fn submit_input(&mut self) -> Option<SyncCommand> {
        if self.input.trim().is_empty() {
            return None;
        }
        let text = std::mem::take(&mut self.input);
        self.cursor_position = 0;
        Some(SyncCommand::AddTask { text })
    }

    /// Insert a character at the cursor. Input beyond the text length
    /// limit is dropped at the keyboard, matching the validation applied
    /// again before the create request.
    fn enter_char(&mut self, c: char) {
        if self.input.chars().count() >= self.max_text_len {
            return;
        }
        let index = self.byte_index();
        self.input.insert(index, c);
        self.cursor_position += 1;
    }

    /// Delete the character before the cursor.
    fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        self.cursor_position -= 1;
        let index = self.byte_index();
        self.input.remove(index);
    }

    const fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }
}

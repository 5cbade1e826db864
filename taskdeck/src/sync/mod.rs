//! Synchronization layer: keeps a locally materialized view of the
//! current user's tasks live against the remote collection.
//!
//! The presentation layer talks to this module exclusively through
//! [`SyncCommand`] / [`SyncEvent`] channels returned by
//! [`manager::spawn_sync`]. The manager owns the materialized list (single
//! writer), opens and closes the live subscription in lockstep with
//! identity changes, and absorbs mutation latency with an optimistic
//! overlay for toggles.

pub mod manager;
pub mod optimistic;

pub use manager::{SyncConfig, spawn_sync};

use taskdeck_model::task::{Task, TaskId};
use taskdeck_model::user::AuthUser;

/// Commands from the presentation layer into the synchronization loop.
#[derive(Debug)]
pub enum SyncCommand {
    /// Validate and create a task from raw input text.
    AddTask {
        /// Raw, untrimmed user input.
        text: String,
    },
    /// Flip the `completed` flag of a task, optimistically.
    ToggleCompleted {
        /// Task to flip.
        id: TaskId,
    },
    /// Delete a task.
    DeleteTask {
        /// Task to delete.
        id: TaskId,
    },
    /// Run the interactive sign-in flow.
    SignIn,
    /// Sign out: clears the list and cancels the subscription synchronously.
    SignOut,
    /// Tear down the synchronization loop.
    Shutdown,
}

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational (e.g. "Task added").
    Info,
    /// A failure the user should see; the session continues.
    Error,
}

/// Events from the synchronization loop to the presentation layer.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// The authenticated user changed. `None` means signed out.
    UserChanged(Option<AuthUser>),
    /// The materialized task list changed. Always a full replacement,
    /// already ordered newest-first.
    ListChanged(Vec<Task>),
    /// A user-visible notification (the toast analog).
    Notice {
        /// Severity.
        level: NoticeLevel,
        /// Human-readable message.
        text: String,
    },
}

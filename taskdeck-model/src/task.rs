//! Task document model, local validation, and snapshot ordering.
//!
//! A [`Task`] is the document as the remote collection stores it. The
//! client never invents `id` or `created_at` — both are assigned by the
//! collection service at creation, which is why a create request carries
//! a [`TaskDraft`] instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::user::UserId;

/// Default maximum task text length in characters.
pub const DEFAULT_MAX_TEXT_LENGTH: usize = 1000;

/// Unique identifier for a task, assigned by the collection service at
/// creation time and stable for the task's lifetime.
///
/// This is the reconciliation key for all local/remote merges.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new time-ordered task identifier (UUID v7).
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a `TaskId` from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A task document as stored in the remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned identifier.
    pub id: TaskId,
    /// User-supplied content, non-empty after trimming.
    pub text: String,
    /// Completion flag. The only field that may change post-creation.
    pub completed: bool,
    /// Server-assigned creation time. `None` only for rows the server has
    /// not yet confirmed; such rows sort as most recent.
    pub created_at: Option<DateTime<Utc>>,
    /// Identifier of the user that created the task. Set once, never mutated.
    pub owner_id: UserId,
}

/// The payload of a create request. The server assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Trimmed, validated task text.
    pub text: String,
    /// Always `false` at creation.
    pub completed: bool,
    /// The authenticated user issuing the create.
    pub owner_id: UserId,
}

impl TaskDraft {
    /// Builds a validated draft from raw user input.
    ///
    /// The text is trimmed first; the trimmed text must be non-empty and
    /// at most `max_len` characters. Validation happens locally — a
    /// rejected draft never reaches the collection service.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] for whitespace-only input and
    /// [`ValidationError::TooLong`] when the character count exceeds
    /// `max_len`.
    pub fn new(text: &str, owner_id: UserId, max_len: usize) -> Result<Self, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::Empty);
        }
        let len = trimmed.chars().count();
        if len > max_len {
            return Err(ValidationError::TooLong { len, max: max_len });
        }
        Ok(Self {
            text: trimmed.to_string(),
            completed: false,
            owner_id,
        })
    }
}

/// Local validation failures, detected before any network call.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Task text is empty after trimming.
    #[error("task text cannot be empty")]
    Empty,
    /// Task text exceeds the configured maximum length.
    #[error("task text too long ({len} characters, max {max})")]
    TooLong {
        /// Character count of the trimmed input.
        len: usize,
        /// Configured maximum.
        max: usize,
    },
}

/// Orders a snapshot by creation time, newest first.
///
/// Rows without a confirmed timestamp (just created, not yet acknowledged)
/// sort before everything else. Creation times compare at full precision;
/// exact ties break on the id, so the order is deterministic regardless of
/// how the snapshot was delivered.
pub fn sort_snapshot(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| sort_key(b).cmp(&sort_key(a)));
}

// Sort key: unconfirmed rows rank above all confirmed ones. Ids are
// time-ordered (UUID v7), so the tie-break keeps newest-first too.
fn sort_key(task: &Task) -> (bool, Option<DateTime<Utc>>, &TaskId) {
    (task.created_at.is_none(), task.created_at, &task.id)
}

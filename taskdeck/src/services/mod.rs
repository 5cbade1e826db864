//! Seams for the two external services Taskdeck is a client of.
//!
//! Defines the [`CollectionService`] trait (the managed document store with
//! live filtered subscriptions) and the [`IdentityService`] trait (the
//! identity provider with a current-user observable). Concrete
//! implementations:
//! - [`memory`] — in-process reference services for local mode and tests.
//!
//! Both services are passed into the synchronization layer as explicit
//! dependency objects, never reached through globals, so every test can
//! substitute doubles for them.

pub mod memory;

use std::future::Future;

use tokio::sync::{mpsc, watch};

use taskdeck_model::task::{Task, TaskDraft, TaskId};
use taskdeck_model::user::{AuthUser, UserId};

/// Errors reported by the external services.
///
/// All of these are recoverable at the operation boundary: the
/// synchronization layer converts them to user-visible notices and never
/// lets them escape as faults.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The service could not be reached or rejected the request transiently.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// The authenticated user is not allowed to perform the operation.
    #[error("permission denied")]
    PermissionDenied,

    /// The referenced task no longer exists remotely.
    #[error("no such task: {0}")]
    NotFound(TaskId),

    /// The interactive sign-in flow was rejected or cancelled.
    #[error("sign-in failed: {0}")]
    SignInFailed(String),
}

/// One live subscription delivery: the complete current result set for the
/// active filter. Never a diff.
pub type Snapshot = Vec<Task>;

/// Owned handle to a live filtered subscription.
///
/// Dropping the handle cancels the subscription. This is the structured
/// counterpart of a teardown callback: release is guaranteed on every exit
/// path — identity change, explicit teardown, or task abort — and happens
/// no later than the drop itself.
pub struct Subscription {
    rx: mpsc::Receiver<Snapshot>,
    _guard: CancelGuard,
}

impl Subscription {
    /// Assembles a subscription from its snapshot receiver and cancel guard.
    #[must_use]
    pub const fn new(rx: mpsc::Receiver<Snapshot>, guard: CancelGuard) -> Self {
        Self { rx, _guard: guard }
    }

    /// Waits for the next snapshot push.
    ///
    /// Returns `None` when the service has dropped its sending side. The
    /// caller cannot distinguish that from "no data yet" beyond the stream
    /// ending; it simply stops receiving updates.
    pub async fn next(&mut self) -> Option<Snapshot> {
        self.rx.recv().await
    }
}

/// Runs a cancellation closure exactly once, when dropped.
///
/// The closure must be `Sync` as well as `Send`: the guard sits inside
/// state held across `.await` points by a spawned task, so the holder
/// must stay `Send`.
pub struct CancelGuard(Option<Box<dyn FnOnce() + Send + Sync>>);

impl CancelGuard {
    /// Wraps a cancellation closure.
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self(Some(Box::new(cancel)))
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if let Some(cancel) = self.0.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for CancelGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CancelGuard")
            .field(&self.0.is_some())
            .finish()
    }
}

/// Async seam for the remote document store.
///
/// # Invariant
///
/// A subscription only ever delivers tasks whose `owner_id` equals the
/// filter owner — the filter is enforced by the service, not re-checked
/// by the client.
pub trait CollectionService: Send + Sync + 'static {
    /// Open a live subscription filtered to one owner's tasks.
    ///
    /// The service pushes the complete current result set immediately and
    /// again after every accepted mutation that touches it. `buffer` sizes
    /// the delivery channel.
    fn subscribe(
        &self,
        owner: &UserId,
        buffer: usize,
    ) -> impl Future<Output = Result<Subscription, ServiceError>> + Send;

    /// Create a task. The service assigns the id and creation timestamp.
    fn create(&self, draft: TaskDraft)
    -> impl Future<Output = Result<TaskId, ServiceError>> + Send;

    /// Partial update of the `completed` field only.
    fn set_completed(
        &self,
        id: &TaskId,
        completed: bool,
    ) -> impl Future<Output = Result<(), ServiceError>> + Send;

    /// Delete a task. Terminal — the service retains no tombstone.
    fn delete(&self, id: &TaskId) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

/// Async seam for the identity provider.
pub trait IdentityService: Send + Sync + 'static {
    /// Observable current user. Yields `None` while signed out.
    fn watch_user(&self) -> watch::Receiver<Option<AuthUser>>;

    /// Run the interactive sign-in flow.
    fn sign_in(&self) -> impl Future<Output = Result<AuthUser, ServiceError>> + Send;

    /// Clear the user handle locally (the observable flips to `None`
    /// synchronously) and invalidate the provider-side session.
    fn sign_out(&self) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

//! Synchronization manager: the event loop that keeps the materialized
//! task list consistent with the remote collection.
//!
//! One coordinator task owns all local state (single-writer discipline)
//! and multiplexes four event sources in a `tokio::select!` loop:
//! identity changes, snapshot pushes, UI commands, and completions of
//! in-flight remote mutations. Mutations run in a [`JoinSet`] so an
//! acknowledgment and an unrelated snapshot push may interleave in either
//! order without blocking the loop.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use taskdeck_model::task::{DEFAULT_MAX_TEXT_LENGTH, Task, TaskDraft, TaskId, sort_snapshot};
use taskdeck_model::user::AuthUser;

use crate::services::{
    CollectionService, IdentityService, ServiceError, Snapshot, Subscription,
};

use super::optimistic::ToggleState;
use super::{NoticeLevel, SyncCommand, SyncEvent};

/// Tuning knobs for the synchronization loop.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Capacity of the UI command channel.
    pub command_capacity: usize,
    /// Capacity of the UI event channel.
    pub event_capacity: usize,
    /// Buffer for the live subscription's snapshot channel.
    pub snapshot_buffer: usize,
    /// Maximum task text length in characters.
    pub max_text_len: usize,
    /// Remove rows locally before the delete is acknowledged, restoring
    /// them on failure. Off by default: deletion has no cheap compensating
    /// action, so the row normally stays until a snapshot confirms.
    pub optimistic_delete: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            command_capacity: 64,
            event_capacity: 256,
            snapshot_buffer: 32,
            max_text_len: DEFAULT_MAX_TEXT_LENGTH,
            optimistic_delete: false,
        }
    }
}

/// Outcome of one in-flight remote operation.
#[derive(Debug)]
enum MutationOutcome {
    Created(Result<TaskId, ServiceError>),
    Toggled {
        id: TaskId,
        result: Result<(), ServiceError>,
    },
    Deleted {
        id: TaskId,
        result: Result<(), ServiceError>,
    },
    SignedIn(Result<AuthUser, ServiceError>),
    SignedOut(Result<(), ServiceError>),
}

/// Spawns the synchronization loop and returns its channel handles.
///
/// The loop runs until [`SyncCommand::Shutdown`] arrives or the command
/// sender is dropped; any open subscription is cancelled by the teardown.
pub fn spawn_sync<C, I>(
    collection: Arc<C>,
    identity: Arc<I>,
    config: SyncConfig,
) -> (mpsc::Sender<SyncCommand>, mpsc::Receiver<SyncEvent>)
where
    C: CollectionService,
    I: IdentityService,
{
    let (cmd_tx, cmd_rx) = mpsc::channel(config.command_capacity);
    let (evt_tx, evt_rx) = mpsc::channel(config.event_capacity);

    let manager = SyncManager {
        collection,
        identity,
        config,
        evt_tx,
        tasks: Vec::new(),
        pending_toggles: HashMap::new(),
        pending_deletes: HashMap::new(),
        subscription: None,
        current_user: None,
        in_flight: JoinSet::new(),
    };
    tokio::spawn(manager.run(cmd_rx));

    (cmd_tx, evt_rx)
}

struct SyncManager<C, I> {
    collection: Arc<C>,
    identity: Arc<I>,
    config: SyncConfig,
    evt_tx: mpsc::Sender<SyncEvent>,
    /// The materialized list: the latest snapshot, reordered newest-first,
    /// with in-flight optimistic mutations overlaid. Only this loop
    /// mutates it.
    tasks: Vec<Task>,
    /// In-flight toggle per task. At most one entry per task id.
    pending_toggles: HashMap<TaskId, ToggleState>,
    /// Rows removed optimistically, kept for restoration on failure.
    pending_deletes: HashMap<TaskId, Task>,
    subscription: Option<Subscription>,
    current_user: Option<AuthUser>,
    in_flight: JoinSet<MutationOutcome>,
}

/// Resolves to the next snapshot push, or never when no subscription is
/// held. Keeping the `None` case pending lets the select loop treat the
/// subscription arm uniformly.
async fn next_snapshot(subscription: &mut Option<Subscription>) -> Option<Snapshot> {
    match subscription {
        Some(sub) => sub.next().await,
        None => std::future::pending().await,
    }
}

impl<C, I> SyncManager<C, I>
where
    C: CollectionService,
    I: IdentityService,
{
    async fn run(mut self, mut cmd_rx: mpsc::Receiver<SyncCommand>) {
        let mut user_rx = self.identity.watch_user();

        // Adopt whatever identity is already established at startup.
        let initial = user_rx.borrow_and_update().clone();
        self.apply_user_change(initial).await;

        loop {
            tokio::select! {
                changed = user_rx.changed() => {
                    if changed.is_err() {
                        tracing::warn!("identity service dropped, shutting down sync loop");
                        break;
                    }
                    let user = user_rx.borrow_and_update().clone();
                    self.apply_user_change(user).await;
                }
                snapshot = next_snapshot(&mut self.subscription) => {
                    match snapshot {
                        Some(snapshot) => self.apply_snapshot(snapshot).await,
                        None => {
                            // Connectivity loss is indistinguishable from
                            // "no data yet": hold the last list and stop
                            // polling the dead stream.
                            tracing::warn!("subscription stream ended");
                            self.subscription = None;
                        }
                    }
                }
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(SyncCommand::Shutdown) | None => break,
                        Some(cmd) => self.handle_command(cmd).await,
                    }
                }
                Some(joined) = self.in_flight.join_next() => {
                    match joined {
                        Ok(outcome) => self.handle_outcome(outcome).await,
                        Err(e) => tracing::error!(error = %e, "mutation task failed"),
                    }
                }
            }
        }
        // Teardown: dropping the subscription handle cancels it.
        tracing::debug!("sync loop stopped");
    }

    /// Reacts to an identity change: tears down the old subscription and
    /// list synchronously, then subscribes for the new user, if any.
    async fn apply_user_change(&mut self, user: Option<AuthUser>) {
        if self.current_user == user {
            return;
        }
        tracing::info!(
            user = user.as_ref().map_or("<signed out>", |u| u.id.as_str()),
            "identity changed"
        );

        // Cancel first and clear before subscribing: the next user must
        // never see the previous user's tasks, even transiently.
        self.subscription = None;
        self.tasks.clear();
        self.pending_toggles.clear();
        self.pending_deletes.clear();
        self.current_user = user.clone();
        self.emit_list().await;
        self.emit(SyncEvent::UserChanged(user.clone())).await;

        if let Some(user) = user {
            match self
                .collection
                .subscribe(&user.id, self.config.snapshot_buffer)
                .await
            {
                Ok(sub) => self.subscription = Some(sub),
                Err(e) => {
                    self.notice(NoticeLevel::Error, format!("Could not load tasks: {e}"))
                        .await;
                }
            }
        }
    }

    /// Replaces the materialized list with a pushed snapshot: reorder,
    /// then overlay in-flight optimistic state.
    async fn apply_snapshot(&mut self, mut snapshot: Snapshot) {
        self.pending_toggles
            .retain(|id, _| snapshot.iter().any(|t| &t.id == id));
        snapshot.retain(|t| !self.pending_deletes.contains_key(&t.id));
        sort_snapshot(&mut snapshot);
        for task in &mut snapshot {
            if let Some(state) = self.pending_toggles.get(&task.id) {
                task.completed = state.display();
            }
        }
        self.tasks = snapshot;
        self.emit_list().await;
    }

    async fn handle_command(&mut self, cmd: SyncCommand) {
        match cmd {
            SyncCommand::AddTask { text } => self.add_task(&text).await,
            SyncCommand::ToggleCompleted { id } => self.toggle_completed(id).await,
            SyncCommand::DeleteTask { id } => self.delete_task(id).await,
            SyncCommand::SignIn => {
                let identity = Arc::clone(&self.identity);
                self.in_flight
                    .spawn(async move { MutationOutcome::SignedIn(identity.sign_in().await) });
            }
            SyncCommand::SignOut => self.sign_out().await,
            SyncCommand::Shutdown => unreachable!("handled by the run loop"),
        }
    }

    /// Validates locally, then issues one create request. A rejected draft
    /// never touches the service; no placeholder row is inserted — the
    /// authoritative row arrives with the next snapshot push.
    async fn add_task(&mut self, text: &str) {
        let Some(user) = &self.current_user else {
            self.notice(NoticeLevel::Error, "Sign in to add tasks").await;
            return;
        };
        match TaskDraft::new(text, user.id.clone(), self.config.max_text_len) {
            Ok(draft) => {
                let collection = Arc::clone(&self.collection);
                self.in_flight
                    .spawn(async move { MutationOutcome::Created(collection.create(draft).await) });
            }
            Err(e) => {
                self.notice(NoticeLevel::Error, e.to_string()).await;
            }
        }
    }

    /// Applies the optimistic flip immediately, then issues a partial
    /// update of the `completed` field.
    async fn toggle_completed(&mut self, id: TaskId) {
        let Some(current) = self.tasks.iter().find(|t| t.id == id).map(|t| t.completed) else {
            tracing::debug!(%id, "toggle for unknown task ignored");
            return;
        };
        let state = self
            .pending_toggles
            .entry(id.clone())
            .or_insert(ToggleState::Synced { completed: current });
        let Some(predicted) = state.begin() else {
            tracing::debug!(%id, "toggle already in flight, ignoring");
            return;
        };

        if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
            task.completed = predicted;
        }
        self.emit_list().await;

        let collection = Arc::clone(&self.collection);
        let task_id = id;
        self.in_flight.spawn(async move {
            let result = collection.set_completed(&task_id, predicted).await;
            MutationOutcome::Toggled {
                id: task_id,
                result,
            }
        });
    }

    /// Issues a delete request. With `optimistic_delete` off (the default)
    /// the row stays until a snapshot no longer contains it.
    async fn delete_task(&mut self, id: TaskId) {
        let Some(position) = self.tasks.iter().position(|t| t.id == id) else {
            tracing::debug!(%id, "delete for unknown task ignored");
            return;
        };

        if self.config.optimistic_delete {
            let removed = self.tasks.remove(position);
            self.pending_toggles.remove(&id);
            self.pending_deletes.insert(id.clone(), removed);
            self.emit_list().await;
        }

        let collection = Arc::clone(&self.collection);
        let task_id = id;
        self.in_flight.spawn(async move {
            let result = collection.delete(&task_id).await;
            MutationOutcome::Deleted {
                id: task_id,
                result,
            }
        });
    }

    /// Clears the user handle and the materialized list synchronously and
    /// cancels the subscription, then invalidates the provider session.
    async fn sign_out(&mut self) {
        self.subscription = None;
        self.tasks.clear();
        self.pending_toggles.clear();
        self.pending_deletes.clear();
        self.current_user = None;
        self.emit_list().await;
        self.emit(SyncEvent::UserChanged(None)).await;

        let identity = Arc::clone(&self.identity);
        self.in_flight
            .spawn(async move { MutationOutcome::SignedOut(identity.sign_out().await) });
    }

    async fn handle_outcome(&mut self, outcome: MutationOutcome) {
        match outcome {
            MutationOutcome::Created(Ok(id)) => {
                tracing::debug!(%id, "task created");
                self.notice(NoticeLevel::Info, "Task added").await;
            }
            MutationOutcome::Created(Err(e)) => {
                self.notice(NoticeLevel::Error, format!("Failed to add task: {e}"))
                    .await;
            }
            MutationOutcome::Toggled { id, result: Ok(()) } => {
                // Dropping the entry confirms: the next snapshot already
                // carries the stored value.
                self.pending_toggles.remove(&id);
            }
            MutationOutcome::Toggled {
                id,
                result: Err(e),
            } => {
                // Compensate from the live overlaid value, never a stale
                // capture: interleaved snapshots cannot double-invert.
                if let Some(mut state) = self.pending_toggles.remove(&id) {
                    let restored = state.fail();
                    if let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) {
                        task.completed = restored;
                    }
                    self.emit_list().await;
                }
                self.notice(NoticeLevel::Error, format!("Failed to update task: {e}"))
                    .await;
            }
            MutationOutcome::Deleted { id, result: Ok(()) } => {
                tracing::debug!(%id, "task deleted");
                self.pending_deletes.remove(&id);
            }
            MutationOutcome::Deleted {
                id,
                result: Err(e),
            } => {
                if let Some(restored) = self.pending_deletes.remove(&id) {
                    self.tasks.push(restored);
                    sort_snapshot(&mut self.tasks);
                    self.emit_list().await;
                }
                self.notice(NoticeLevel::Error, format!("Failed to delete task: {e}"))
                    .await;
            }
            MutationOutcome::SignedIn(Ok(user)) => {
                self.notice(NoticeLevel::Info, format!("Welcome, {}!", user.display_name))
                    .await;
            }
            MutationOutcome::SignedIn(Err(e)) => {
                self.notice(NoticeLevel::Error, e.to_string()).await;
            }
            MutationOutcome::SignedOut(Ok(())) => {}
            MutationOutcome::SignedOut(Err(e)) => {
                // Local state is already cleared; only the provider-side
                // invalidation failed.
                tracing::warn!(error = %e, "provider-side sign-out failed");
                self.notice(NoticeLevel::Error, format!("Sign-out failed: {e}"))
                    .await;
            }
        }
    }

    async fn emit(&self, event: SyncEvent) {
        // A dropped UI receiver ends the loop via the command channel;
        // nothing useful to do with the error here.
        let _ = self.evt_tx.send(event).await;
    }

    async fn emit_list(&self) {
        self.emit(SyncEvent::ListChanged(self.tasks.clone())).await;
    }

    async fn notice(&self, level: NoticeLevel, text: impl Into<String>) {
        self.emit(SyncEvent::Notice {
            level,
            text: text.into(),
        })
        .await;
    }
}

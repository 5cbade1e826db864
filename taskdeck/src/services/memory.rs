//! In-process reference services for local mode and tests.
//!
//! [`MemoryCollection`] and [`MemoryIdentity`] implement the service seams
//! entirely in memory: the collection keeps its document map behind a
//! mutex and fans a full filtered snapshot out to every live subscriber
//! after each accepted mutation, which is exactly the contract the real
//! managed store presents. Both services expose failure injection and
//! lifecycle counters so tests can drive the error paths and assert that
//! subscriptions are cancelled exactly once.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use taskdeck_model::task::{Task, TaskDraft, TaskId};
use taskdeck_model::user::{AuthUser, UserId};

use super::{CancelGuard, CollectionService, IdentityService, ServiceError, Snapshot, Subscription};

/// In-memory document store with live filtered subscriptions.
///
/// Cloning is cheap; all clones share the same documents and subscribers.
#[derive(Clone)]
pub struct MemoryCollection {
    inner: Arc<CollectionInner>,
}

struct CollectionInner {
    state: Mutex<CollectionState>,
    opened: AtomicUsize,
    cancelled: AtomicUsize,
    create_calls: AtomicUsize,
    update_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    fail_create: AtomicBool,
    fail_update: AtomicBool,
    fail_delete: AtomicBool,
    /// Artificial latency for `set_completed`, in milliseconds. Lets tests
    /// interleave snapshot pushes between an optimistic flip and its
    /// acknowledgment.
    update_delay_ms: AtomicU64,
    persist_path: Option<PathBuf>,
}

struct CollectionState {
    docs: HashMap<TaskId, Task>,
    subscribers: HashMap<u64, Subscriber>,
    next_sub_id: u64,
}

struct Subscriber {
    owner: UserId,
    tx: mpsc::Sender<Snapshot>,
}

impl MemoryCollection {
    /// Creates an empty in-memory collection.
    #[must_use]
    pub fn new() -> Self {
        Self::build(HashMap::new(), None)
    }

    /// Creates a collection whose document map is loaded from and written
    /// back to a JSON file.
    ///
    /// A missing file starts an empty collection; it is created on the
    /// first mutation.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn with_persistence(path: PathBuf) -> std::io::Result<Self> {
        let docs = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let tasks: Vec<Task> =
                    serde_json::from_str(&contents).map_err(std::io::Error::other)?;
                tasks.into_iter().map(|t| (t.id.clone(), t)).collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e),
        };
        Ok(Self::build(docs, Some(path)))
    }

    fn build(docs: HashMap<TaskId, Task>, persist_path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(CollectionInner {
                state: Mutex::new(CollectionState {
                    docs,
                    subscribers: HashMap::new(),
                    next_sub_id: 0,
                }),
                opened: AtomicUsize::new(0),
                cancelled: AtomicUsize::new(0),
                create_calls: AtomicUsize::new(0),
                update_calls: AtomicUsize::new(0),
                delete_calls: AtomicUsize::new(0),
                fail_create: AtomicBool::new(false),
                fail_update: AtomicBool::new(false),
                fail_delete: AtomicBool::new(false),
                update_delay_ms: AtomicU64::new(0),
                persist_path,
            }),
        }
    }

    /// Rejects the next `create` call with [`ServiceError::Unavailable`].
    pub fn fail_next_create(&self) {
        self.inner.fail_create.store(true, Ordering::SeqCst);
    }

    /// Rejects the next `set_completed` call.
    pub fn fail_next_update(&self) {
        self.inner.fail_update.store(true, Ordering::SeqCst);
    }

    /// Rejects the next `delete` call.
    pub fn fail_next_delete(&self) {
        self.inner.fail_delete.store(true, Ordering::SeqCst);
    }

    /// Delays every `set_completed` acknowledgment by `delay`.
    pub fn set_update_delay(&self, delay: Duration) {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.inner.update_delay_ms.store(ms, Ordering::SeqCst);
    }

    /// Number of subscriptions currently live.
    #[must_use]
    pub fn open_subscriptions(&self) -> usize {
        self.inner.state.lock().subscribers.len()
    }

    /// Total subscriptions ever opened.
    #[must_use]
    pub fn opened_subscriptions(&self) -> usize {
        self.inner.opened.load(Ordering::SeqCst)
    }

    /// Total subscriptions cancelled (guard drops observed).
    #[must_use]
    pub fn cancelled_subscriptions(&self) -> usize {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Total `create` calls received, including rejected ones.
    #[must_use]
    pub fn create_calls(&self) -> usize {
        self.inner.create_calls.load(Ordering::SeqCst)
    }

    /// Total `set_completed` calls received, including rejected ones.
    #[must_use]
    pub fn update_calls(&self) -> usize {
        self.inner.update_calls.load(Ordering::SeqCst)
    }

    /// Total `delete` calls received, including rejected ones.
    #[must_use]
    pub fn delete_calls(&self) -> usize {
        self.inner.delete_calls.load(Ordering::SeqCst)
    }

    /// Pushes the current result set to every live subscriber.
    ///
    /// Uses `try_send`: a subscriber that cannot keep up misses an
    /// intermediate snapshot, which is harmless because every push is a
    /// complete replacement.
    fn broadcast(state: &CollectionState) {
        for sub in state.subscribers.values() {
            let snapshot = Self::snapshot_for(state, &sub.owner);
            if let Err(mpsc::error::TrySendError::Full(_)) = sub.tx.try_send(snapshot) {
                tracing::warn!(owner = %sub.owner, "subscriber lagging, snapshot dropped");
            }
        }
    }

    fn snapshot_for(state: &CollectionState, owner: &UserId) -> Snapshot {
        state
            .docs
            .values()
            .filter(|t| &t.owner_id == owner)
            .cloned()
            .collect()
    }

    /// Writes the document map to the persistence file, if configured.
    /// Write failures are logged, never surfaced: persistence is a local
    /// convenience, not part of the store contract.
    fn persist(&self) {
        let Some(path) = &self.inner.persist_path else {
            return;
        };
        let docs: Vec<Task> = self.inner.state.lock().docs.values().cloned().collect();
        let result = serde_json::to_string_pretty(&docs)
            .map_err(std::io::Error::other)
            .and_then(|json| {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, json)
            });
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "failed to persist tasks");
        }
    }
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionService for MemoryCollection {
    async fn subscribe(
        &self,
        owner: &UserId,
        buffer: usize,
    ) -> Result<Subscription, ServiceError> {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let sub_id = {
            let mut state = self.inner.state.lock();
            let sub_id = state.next_sub_id;
            state.next_sub_id += 1;

            // A live subscription delivers the current result set
            // immediately, before any mutation.
            let initial = Self::snapshot_for(&state, owner);
            let _ = tx.try_send(initial);

            state.subscribers.insert(
                sub_id,
                Subscriber {
                    owner: owner.clone(),
                    tx,
                },
            );
            sub_id
        };
        self.inner.opened.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(%owner, sub_id, "subscription opened");

        let inner = Arc::clone(&self.inner);
        let guard = CancelGuard::new(move || {
            if inner.state.lock().subscribers.remove(&sub_id).is_some() {
                inner.cancelled.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(sub_id, "subscription cancelled");
            }
        });
        Ok(Subscription::new(rx, guard))
    }

    async fn create(&self, draft: TaskDraft) -> Result<TaskId, ServiceError> {
        self.inner.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_create.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("injected create failure".into()));
        }

        let task = Task {
            id: TaskId::new(),
            text: draft.text,
            completed: draft.completed,
            created_at: Some(Utc::now()),
            owner_id: draft.owner_id,
        };
        let id = task.id.clone();
        {
            let mut state = self.inner.state.lock();
            state.docs.insert(id.clone(), task);
            Self::broadcast(&state);
        }
        self.persist();
        Ok(id)
    }

    async fn set_completed(&self, id: &TaskId, completed: bool) -> Result<(), ServiceError> {
        self.inner.update_calls.fetch_add(1, Ordering::SeqCst);

        let delay_ms = self.inner.update_delay_ms.load(Ordering::SeqCst);
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if self.inner.fail_update.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("injected update failure".into()));
        }

        {
            let mut state = self.inner.state.lock();
            let task = state
                .docs
                .get_mut(id)
                .ok_or_else(|| ServiceError::NotFound(id.clone()))?;
            task.completed = completed;
            Self::broadcast(&state);
        }
        self.persist();
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), ServiceError> {
        self.inner.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.fail_delete.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::Unavailable("injected delete failure".into()));
        }

        {
            let mut state = self.inner.state.lock();
            if state.docs.remove(id).is_none() {
                return Err(ServiceError::NotFound(id.clone()));
            }
            Self::broadcast(&state);
        }
        self.persist();
        Ok(())
    }
}

/// In-memory identity provider with a configurable local profile.
#[derive(Clone)]
pub struct MemoryIdentity {
    inner: Arc<IdentityInner>,
}

struct IdentityInner {
    profile: Mutex<AuthUser>,
    tx: watch::Sender<Option<AuthUser>>,
    fail_sign_in: AtomicBool,
}

impl MemoryIdentity {
    /// Creates a signed-out identity service that will sign `profile` in.
    #[must_use]
    pub fn new(profile: AuthUser) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            inner: Arc::new(IdentityInner {
                profile: Mutex::new(profile),
                tx,
                fail_sign_in: AtomicBool::new(false),
            }),
        }
    }

    /// Rejects the next `sign_in` call with [`ServiceError::SignInFailed`].
    pub fn fail_next_sign_in(&self) {
        self.inner.fail_sign_in.store(true, Ordering::SeqCst);
    }

    /// Replaces the profile the next `sign_in` will authenticate as.
    /// Has no effect on a session already signed in.
    pub fn switch_profile(&self, profile: AuthUser) {
        *self.inner.profile.lock() = profile;
    }
}

impl IdentityService for MemoryIdentity {
    fn watch_user(&self) -> watch::Receiver<Option<AuthUser>> {
        self.inner.tx.subscribe()
    }

    async fn sign_in(&self) -> Result<AuthUser, ServiceError> {
        if self.inner.fail_sign_in.swap(false, Ordering::SeqCst) {
            return Err(ServiceError::SignInFailed(
                "provider rejected the request".into(),
            ));
        }
        let user = self.inner.profile.lock().clone();
        self.inner.tx.send_replace(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), ServiceError> {
        self.inner.tx.send_replace(None);
        Ok(())
    }
}

//! Integration tests for the task flow: create, toggle, delete, with
//! optimistic updates and failure compensation, driven end to end through
//! the synchronization loop against the in-memory services.

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::similar_names)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use taskdeck::services::CollectionService;
use taskdeck::services::memory::{MemoryCollection, MemoryIdentity};
use taskdeck::sync::{NoticeLevel, SyncCommand, SyncConfig, SyncEvent, spawn_sync};
use taskdeck_model::task::{Task, TaskDraft};
use taskdeck_model::user::{AuthUser, UserId};

// ---------------------------------------------------------------------------
// Helper functions
// ---------------------------------------------------------------------------

fn ada() -> AuthUser {
    AuthUser {
        id: UserId::new("ada"),
        display_name: "Ada".to_string(),
        photo_url: None,
    }
}

struct Harness {
    collection: MemoryCollection,
    identity: MemoryIdentity,
    cmd_tx: mpsc::Sender<SyncCommand>,
    evt_rx: mpsc::Receiver<SyncEvent>,
}

fn harness(config: SyncConfig) -> Harness {
    let collection = MemoryCollection::new();
    let identity = MemoryIdentity::new(ada());
    let (cmd_tx, evt_rx) = spawn_sync(
        Arc::new(collection.clone()),
        Arc::new(identity.clone()),
        config,
    );
    Harness {
        collection,
        identity,
        cmd_tx,
        evt_rx,
    }
}

/// Spawns the loop and completes the sign-in handshake.
async fn signed_in_harness(config: SyncConfig) -> Harness {
    let mut h = harness(config);
    h.cmd_tx.send(SyncCommand::SignIn).await.unwrap();
    wait_for(&mut h.evt_rx, |e| {
        matches!(e, SyncEvent::UserChanged(Some(_)))
    })
    .await;
    h
}

async fn wait_for<F>(rx: &mut mpsc::Receiver<SyncEvent>, mut pred: F) -> SyncEvent
where
    F: FnMut(&SyncEvent) -> bool,
{
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let event = rx.recv().await.expect("event channel closed");
            if pred(&event) {
                return event;
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Waits for a `ListChanged` whose contents satisfy the predicate.
async fn wait_for_list<F>(rx: &mut mpsc::Receiver<SyncEvent>, mut pred: F) -> Vec<Task>
where
    F: FnMut(&[Task]) -> bool,
{
    let event = wait_for(rx, |e| match e {
        SyncEvent::ListChanged(tasks) => pred(tasks),
        _ => false,
    })
    .await;
    match event {
        SyncEvent::ListChanged(tasks) => tasks,
        _ => unreachable!(),
    }
}

async fn wait_for_error(rx: &mut mpsc::Receiver<SyncEvent>) -> String {
    let event = wait_for(rx, |e| {
        matches!(
            e,
            SyncEvent::Notice {
                level: NoticeLevel::Error,
                ..
            }
        )
    })
    .await;
    match event {
        SyncEvent::Notice { text, .. } => text,
        _ => unreachable!(),
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[tokio::test]
async fn added_tasks_arrive_newest_first() {
    let mut h = signed_in_harness(SyncConfig::default()).await;

    h.cmd_tx
        .send(SyncCommand::AddTask {
            text: "first".into(),
        })
        .await
        .unwrap();
    wait_for_list(&mut h.evt_rx, |tasks| tasks.len() == 1).await;

    h.cmd_tx
        .send(SyncCommand::AddTask {
            text: "second".into(),
        })
        .await
        .unwrap();
    let tasks = wait_for_list(&mut h.evt_rx, |tasks| tasks.len() == 2).await;

    assert_eq!(tasks[0].text, "second");
    assert_eq!(tasks[1].text, "first");
    assert!(tasks.iter().all(|t| t.created_at.is_some()));
}

#[tokio::test]
async fn input_is_trimmed_before_storage() {
    let mut h = signed_in_harness(SyncConfig::default()).await;
    h.cmd_tx
        .send(SyncCommand::AddTask {
            text: "  padded  ".into(),
        })
        .await
        .unwrap();
    let tasks = wait_for_list(&mut h.evt_rx, |tasks| tasks.len() == 1).await;
    assert_eq!(tasks[0].text, "padded");
}

#[tokio::test]
async fn blank_text_is_rejected_without_a_service_call() {
    let mut h = signed_in_harness(SyncConfig::default()).await;
    h.cmd_tx
        .send(SyncCommand::AddTask { text: "   ".into() })
        .await
        .unwrap();
    wait_for_error(&mut h.evt_rx).await;
    assert_eq!(h.collection.create_calls(), 0);
}

#[tokio::test]
async fn over_length_text_is_rejected_without_a_service_call() {
    let config = SyncConfig {
        max_text_len: 5,
        ..SyncConfig::default()
    };
    let mut h = signed_in_harness(config).await;
    h.cmd_tx
        .send(SyncCommand::AddTask {
            text: "six ch".into(),
        })
        .await
        .unwrap();
    let text = wait_for_error(&mut h.evt_rx).await;
    assert!(text.contains('5'), "error should name the limit: {text}");
    assert_eq!(h.collection.create_calls(), 0);
}

#[tokio::test]
async fn create_failure_surfaces_a_notice_and_no_row() {
    let mut h = signed_in_harness(SyncConfig::default()).await;
    h.collection.fail_next_create();
    h.cmd_tx
        .send(SyncCommand::AddTask {
            text: "doomed".into(),
        })
        .await
        .unwrap();
    let text = wait_for_error(&mut h.evt_rx).await;
    assert!(text.contains("add"), "unexpected notice: {text}");
    assert_eq!(h.collection.create_calls(), 1);
}

// ---------------------------------------------------------------------------
// Toggle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn toggle_is_applied_optimistically_then_confirmed() {
    let mut h = signed_in_harness(SyncConfig::default()).await;
    h.cmd_tx
        .send(SyncCommand::AddTask { text: "one".into() })
        .await
        .unwrap();
    let tasks = wait_for_list(&mut h.evt_rx, |tasks| tasks.len() == 1).await;
    let id = tasks[0].id.clone();

    // Hold the acknowledgment back so the first list we see is the
    // optimistic flip, not the confirmed snapshot.
    h.collection.set_update_delay(Duration::from_millis(100));
    h.cmd_tx
        .send(SyncCommand::ToggleCompleted { id: id.clone() })
        .await
        .unwrap();

    let tasks = wait_for_list(&mut h.evt_rx, |tasks| {
        tasks.iter().any(|t| t.id == id && t.completed)
    })
    .await;
    assert!(tasks[0].completed);

    // After the ack the flag must hold steady in store-pushed snapshots.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(h.collection.update_calls(), 1);
}

#[tokio::test]
async fn toggle_failure_reverts_the_optimistic_flip() {
    let mut h = signed_in_harness(SyncConfig::default()).await;
    h.cmd_tx
        .send(SyncCommand::AddTask { text: "one".into() })
        .await
        .unwrap();
    let tasks = wait_for_list(&mut h.evt_rx, |tasks| tasks.len() == 1).await;
    let id = tasks[0].id.clone();

    h.collection.fail_next_update();
    h.cmd_tx
        .send(SyncCommand::ToggleCompleted { id: id.clone() })
        .await
        .unwrap();

    // Optimistic flip first.
    wait_for_list(&mut h.evt_rx, |tasks| {
        tasks.iter().any(|t| t.id == id && t.completed)
    })
    .await;
    // Then the compensation, published before the failure notice.
    let tasks = wait_for_list(&mut h.evt_rx, |tasks| {
        tasks.iter().any(|t| t.id == id && !t.completed)
    })
    .await;
    assert!(!tasks[0].completed);
    wait_for_error(&mut h.evt_rx).await;
}

#[tokio::test]
async fn toggle_failure_with_interleaved_snapshot_does_not_double_invert() {
    let mut h = signed_in_harness(SyncConfig::default()).await;
    h.cmd_tx
        .send(SyncCommand::AddTask {
            text: "target".into(),
        })
        .await
        .unwrap();
    let tasks = wait_for_list(&mut h.evt_rx, |tasks| tasks.len() == 1).await;
    let id = tasks[0].id.clone();

    // The update hangs long enough for an unrelated mutation to push a
    // snapshot while the toggle is still in flight.
    h.collection.set_update_delay(Duration::from_millis(150));
    h.collection.fail_next_update();
    h.cmd_tx
        .send(SyncCommand::ToggleCompleted { id: id.clone() })
        .await
        .unwrap();
    wait_for_list(&mut h.evt_rx, |tasks| {
        tasks.iter().any(|t| t.id == id && t.completed)
    })
    .await;

    // Unrelated concurrent write: pushes a snapshot carrying the target
    // task with its stored (unflipped) value.
    let draft = TaskDraft::new("interleaved", UserId::new("ada"), 1000).unwrap();
    h.collection.create(draft).await.unwrap();

    // The overlay must keep the target flipped in that interleaved push.
    let tasks = wait_for_list(&mut h.evt_rx, |tasks| tasks.len() == 2).await;
    assert!(tasks.iter().any(|t| t.id == id && t.completed));

    // Failure compensation restores the pre-toggle value, exactly once.
    let tasks = wait_for_list(&mut h.evt_rx, |tasks| {
        tasks.iter().any(|t| t.id == id && !t.completed)
    })
    .await;
    assert_eq!(tasks.len(), 2);
    assert!(!tasks.iter().find(|t| t.id == id).unwrap().completed);
    wait_for_error(&mut h.evt_rx).await;
}

#[tokio::test]
async fn second_toggle_while_in_flight_is_ignored() {
    let mut h = signed_in_harness(SyncConfig::default()).await;
    h.cmd_tx
        .send(SyncCommand::AddTask { text: "one".into() })
        .await
        .unwrap();
    let tasks = wait_for_list(&mut h.evt_rx, |tasks| tasks.len() == 1).await;
    let id = tasks[0].id.clone();

    h.collection.set_update_delay(Duration::from_millis(150));
    h.cmd_tx
        .send(SyncCommand::ToggleCompleted { id: id.clone() })
        .await
        .unwrap();
    h.cmd_tx
        .send(SyncCommand::ToggleCompleted { id: id.clone() })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(h.collection.update_calls(), 1);
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_removes_the_row_after_acknowledgment() {
    let mut h = signed_in_harness(SyncConfig::default()).await;
    h.cmd_tx
        .send(SyncCommand::AddTask {
            text: "doomed".into(),
        })
        .await
        .unwrap();
    let tasks = wait_for_list(&mut h.evt_rx, |tasks| tasks.len() == 1).await;

    h.cmd_tx
        .send(SyncCommand::DeleteTask {
            id: tasks[0].id.clone(),
        })
        .await
        .unwrap();
    wait_for_list(&mut h.evt_rx, |tasks| tasks.is_empty()).await;
    assert_eq!(h.collection.delete_calls(), 1);
}

#[tokio::test]
async fn delete_failure_leaves_the_row_in_place() {
    let mut h = signed_in_harness(SyncConfig::default()).await;
    h.cmd_tx
        .send(SyncCommand::AddTask {
            text: "sticky".into(),
        })
        .await
        .unwrap();
    let tasks = wait_for_list(&mut h.evt_rx, |tasks| tasks.len() == 1).await;
    let id = tasks[0].id.clone();

    h.collection.fail_next_delete();
    h.cmd_tx
        .send(SyncCommand::DeleteTask { id: id.clone() })
        .await
        .unwrap();
    let text = wait_for_error(&mut h.evt_rx).await;
    assert!(text.contains("delete"), "unexpected notice: {text}");

    // Row never left the store; a fresh write confirms it is still there.
    let draft = TaskDraft::new("witness", UserId::new("ada"), 1000).unwrap();
    h.collection.create(draft).await.unwrap();
    let tasks = wait_for_list(&mut h.evt_rx, |tasks| tasks.len() == 2).await;
    assert!(tasks.iter().any(|t| t.id == id));
}

#[tokio::test]
async fn optimistic_delete_removes_immediately_and_restores_on_failure() {
    let config = SyncConfig {
        optimistic_delete: true,
        ..SyncConfig::default()
    };
    let mut h = signed_in_harness(config).await;
    h.cmd_tx
        .send(SyncCommand::AddTask {
            text: "boomerang".into(),
        })
        .await
        .unwrap();
    let tasks = wait_for_list(&mut h.evt_rx, |tasks| tasks.len() == 1).await;
    let id = tasks[0].id.clone();

    h.collection.fail_next_delete();
    h.cmd_tx
        .send(SyncCommand::DeleteTask { id: id.clone() })
        .await
        .unwrap();

    // Removed before any acknowledgment.
    wait_for_list(&mut h.evt_rx, |tasks| tasks.is_empty()).await;
    // Restored when the delete is rejected, ahead of the failure notice.
    let tasks = wait_for_list(&mut h.evt_rx, |tasks| tasks.len() == 1).await;
    assert_eq!(tasks[0].id, id);
    wait_for_error(&mut h.evt_rx).await;
}

// ---------------------------------------------------------------------------
// Sign-in failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sign_in_failure_leaves_the_session_unauthenticated() {
    let mut h = harness(SyncConfig::default());
    h.identity.fail_next_sign_in();
    h.cmd_tx.send(SyncCommand::SignIn).await.unwrap();

    wait_for_error(&mut h.evt_rx).await;
    assert_eq!(h.collection.opened_subscriptions(), 0);

    // A retry succeeds and completes the handshake.
    h.cmd_tx.send(SyncCommand::SignIn).await.unwrap();
    wait_for(&mut h.evt_rx, |e| {
        matches!(e, SyncEvent::UserChanged(Some(_)))
    })
    .await;
}

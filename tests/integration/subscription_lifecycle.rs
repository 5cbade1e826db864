//! Integration tests for the subscription lifecycle: the live subscription
//! must open and close in lockstep with identity changes, and a user must
//! never observe another user's tasks.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use taskdeck::services::memory::{MemoryCollection, MemoryIdentity};
use taskdeck::sync::{SyncCommand, SyncConfig, SyncEvent, spawn_sync};
use taskdeck_model::user::{AuthUser, UserId};

fn user(id: &str, name: &str) -> AuthUser {
    AuthUser {
        id: UserId::new(id),
        display_name: name.to_string(),
        photo_url: None,
    }
}

fn spawn(
    collection: &MemoryCollection,
    identity: &MemoryIdentity,
) -> (mpsc::Sender<SyncCommand>, mpsc::Receiver<SyncEvent>) {
    spawn_sync(
        Arc::new(collection.clone()),
        Arc::new(identity.clone()),
        SyncConfig::default(),
    )
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

#[tokio::test]
async fn sign_in_opens_a_subscription_and_delivers_existing_tasks() {
    let collection = MemoryCollection::new();
    let identity = MemoryIdentity::new(user("ada", "Ada"));
    let (cmd_tx, mut evt_rx) = spawn(&collection, &identity);

    cmd_tx.send(SyncCommand::SignIn).await.unwrap();
    wait_for(&mut evt_rx, |e| {
        matches!(e, SyncEvent::UserChanged(Some(_)))
    })
    .await;
    cmd_tx
        .send(SyncCommand::AddTask {
            text: "persisted".into(),
        })
        .await
        .unwrap();
    wait_for(&mut evt_rx, |e| {
        matches!(e, SyncEvent::ListChanged(tasks) if tasks.len() == 1)
    })
    .await;
    assert_eq!(collection.opened_subscriptions(), 1);
    assert_eq!(collection.open_subscriptions(), 1);
}

#[tokio::test]
async fn sign_out_clears_the_list_and_cancels_exactly_once() {
    let collection = MemoryCollection::new();
    let identity = MemoryIdentity::new(user("ada", "Ada"));
    let (cmd_tx, mut evt_rx) = spawn(&collection, &identity);

    cmd_tx.send(SyncCommand::SignIn).await.unwrap();
    wait_for(&mut evt_rx, |e| {
        matches!(e, SyncEvent::UserChanged(Some(_)))
    })
    .await;
    cmd_tx
        .send(SyncCommand::AddTask { text: "one".into() })
        .await
        .unwrap();
    wait_for(&mut evt_rx, |e| {
        matches!(e, SyncEvent::ListChanged(tasks) if tasks.len() == 1)
    })
    .await;

    cmd_tx.send(SyncCommand::SignOut).await.unwrap();

    // The cleared list is published before (or with) the identity change.
    let mut saw_empty_list = false;
    loop {
        let event = wait_for(&mut evt_rx, |_| true).await;
        match event {
            SyncEvent::ListChanged(tasks) if tasks.is_empty() => saw_empty_list = true,
            SyncEvent::UserChanged(None) => break,
            _ => {}
        }
    }
    assert!(saw_empty_list, "list must be cleared on sign-out");
    assert_eq!(collection.cancelled_subscriptions(), 1);
    assert_eq!(collection.open_subscriptions(), 0);
}

#[tokio::test]
async fn switching_users_never_shows_the_previous_users_tasks() {
    let collection = MemoryCollection::new();
    let identity = MemoryIdentity::new(user("ada", "Ada"));
    let (cmd_tx, mut evt_rx) = spawn(&collection, &identity);

    cmd_tx.send(SyncCommand::SignIn).await.unwrap();
    wait_for(&mut evt_rx, |e| {
        matches!(e, SyncEvent::UserChanged(Some(_)))
    })
    .await;
    cmd_tx
        .send(SyncCommand::AddTask {
            text: "ada's secret".into(),
        })
        .await
        .unwrap();
    wait_for(&mut evt_rx, |e| {
        matches!(e, SyncEvent::ListChanged(tasks) if tasks.len() == 1)
    })
    .await;

    // Switch identity without an intervening sign-out.
    identity.switch_profile(user("grace", "Grace"));
    cmd_tx.send(SyncCommand::SignIn).await.unwrap();
    wait_for(&mut evt_rx, |e| {
        matches!(e, SyncEvent::UserChanged(Some(u)) if u.id == UserId::new("grace"))
    })
    .await;

    // Everything published from here on belongs to Grace.
    cmd_tx
        .send(SyncCommand::AddTask {
            text: "grace's task".into(),
        })
        .await
        .unwrap();
    let event = wait_for(&mut evt_rx, |e| {
        matches!(e, SyncEvent::ListChanged(tasks) if !tasks.is_empty())
    })
    .await;
    if let SyncEvent::ListChanged(tasks) = event {
        assert!(tasks.iter().all(|t| t.owner_id == UserId::new("grace")));
    }

    // Old subscription was cancelled, a new one opened.
    assert_eq!(collection.opened_subscriptions(), 2);
    assert_eq!(collection.cancelled_subscriptions(), 1);
    assert_eq!(collection.open_subscriptions(), 1);
}

#[tokio::test]
async fn shutdown_cancels_the_open_subscription() {
    let collection = MemoryCollection::new();
    let identity = MemoryIdentity::new(user("ada", "Ada"));
    let (cmd_tx, mut evt_rx) = spawn(&collection, &identity);

    cmd_tx.send(SyncCommand::SignIn).await.unwrap();
    wait_for(&mut evt_rx, |e| {
        matches!(e, SyncEvent::UserChanged(Some(_)))
    })
    .await;
    assert_eq!(collection.open_subscriptions(), 1);

    cmd_tx.send(SyncCommand::Shutdown).await.unwrap();
    tokio::time::timeout(Duration::from_secs(2), async {
        while collection.open_subscriptions() != 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("subscription not cancelled on shutdown");
    assert_eq!(collection.cancelled_subscriptions(), 1);
}

#[tokio::test]
async fn signing_back_in_redelivers_stored_tasks() {
    let collection = MemoryCollection::new();
    let identity = MemoryIdentity::new(user("ada", "Ada"));
    let (cmd_tx, mut evt_rx) = spawn(&collection, &identity);

    cmd_tx.send(SyncCommand::SignIn).await.unwrap();
    wait_for(&mut evt_rx, |e| {
        matches!(e, SyncEvent::UserChanged(Some(_)))
    })
    .await;
    cmd_tx
        .send(SyncCommand::AddTask {
            text: "durable".into(),
        })
        .await
        .unwrap();
    wait_for(&mut evt_rx, |e| {
        matches!(e, SyncEvent::ListChanged(tasks) if tasks.len() == 1)
    })
    .await;

    cmd_tx.send(SyncCommand::SignOut).await.unwrap();
    wait_for(&mut evt_rx, |e| matches!(e, SyncEvent::UserChanged(None))).await;

    cmd_tx.send(SyncCommand::SignIn).await.unwrap();
    let event = wait_for(&mut evt_rx, |e| {
        matches!(e, SyncEvent::ListChanged(tasks) if tasks.len() == 1)
    })
    .await;
    if let SyncEvent::ListChanged(tasks) = event {
        assert_eq!(tasks[0].text, "durable");
    }
}

//! Integration tests for reminder durability and note append safety.

use std::sync::Arc;
use std::time::Duration;

use optimo_models::{Note, Reminder};
use optimo_persistence::{FileStore, MemoryStore, NoteLog, ReminderStore, SharedKv};
use tempfile::tempdir;

#[tokio::test]
async fn test_reminder_survives_restart() {
    let dir = tempdir().unwrap();
    let reminder = Reminder::new(7, "call mom", 1_000);

    {
        let kv: SharedKv = Arc::new(FileStore::open(dir.path()).unwrap());
        ReminderStore::new(kv).add(&reminder).await.unwrap();
    }

    // Simulated restart
    let kv: SharedKv = Arc::new(FileStore::open(dir.path()).unwrap());
    let store = ReminderStore::new(kv);

    assert!(store.due(999).await.unwrap().is_empty());
    let due = store.due(1_000).await.unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].reminder, reminder);
}

#[tokio::test]
async fn test_lease_survives_restart() {
    let dir = tempdir().unwrap();
    let reminder = Reminder::new(7, "call mom", 1_000);

    {
        let kv: SharedKv = Arc::new(FileStore::open(dir.path()).unwrap());
        let store = ReminderStore::new(kv);
        store.add(&reminder).await.unwrap();
        assert!(store
            .claim(&reminder, Duration::from_secs(60))
            .await
            .unwrap());
    }

    let kv: SharedKv = Arc::new(FileStore::open(dir.path()).unwrap());
    let store = ReminderStore::new(kv);
    assert!(!store
        .claim(&reminder, Duration::from_secs(60))
        .await
        .unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_note_appends_are_all_kept() {
    let log = NoteLog::new(Arc::new(MemoryStore::new()));

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let log = log.clone();
            tokio::spawn(async move { log.append(1, &Note::text(format!("note {}", i))).await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(log.all(1).await.unwrap().len(), 20);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_have_one_winner() {
    let store = ReminderStore::new(Arc::new(MemoryStore::new()));
    let reminder = Reminder::new(1, "x", 0);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            let reminder = reminder.clone();
            tokio::spawn(async move { store.claim(&reminder, Duration::from_secs(60)).await })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap().unwrap() {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);
}

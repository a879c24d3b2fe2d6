//! Integration tests for debounced persistence.
//!
//! Covers the quiet-period write, suppression during drags, load-time
//! validation, write failures, and teardown.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;

use todolist::config::TodoConfig;
use todolist::drag::Rect;
use todolist::input::InputError;
use todolist::notify::{Notification, Silent, ToastKind};
use todolist::reducer::Action;
use todolist::storage::memory::{MemoryContext, MemoryStorage};
use todolist::storage::{Storage, StorageError};
use todolist::store::{StoreError, TodoStore};
use todolist::toast::ToastCenter;
use todolist_proto::record;

const KEY: &str = "todoStorage";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Counts successful writes on top of a memory context.
struct CountingStorage {
    inner: MemoryContext,
    writes: Arc<AtomicUsize>,
}

impl Storage for CountingStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get_item(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.inner.set_item(key, value).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

async fn counting_store(storage: &MemoryStorage) -> (TodoStore, Arc<AtomicUsize>) {
    let writes = Arc::new(AtomicUsize::new(0));
    let backend = CountingStorage {
        inner: storage.context(),
        writes: Arc::clone(&writes),
    };
    let store = TodoStore::spawn(&TodoConfig::default(), backend, None, Silent).await;
    (store, writes)
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

fn stored_texts(storage: &MemoryStorage) -> Vec<String> {
    let raw = storage.peek(KEY).expect("record written");
    record::decode(&raw)
        .unwrap()
        .into_iter()
        .map(|t| t.text)
        .collect()
}

// ---------------------------------------------------------------------------
// Debounce
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn write_happens_after_quiet_period() {
    let storage = MemoryStorage::new();
    let (store, writes) = counting_store(&storage).await;

    store.add_task("Task 1").await.unwrap();

    advance(499).await;
    assert!(storage.peek(KEY).is_none());

    advance(2).await;
    assert_eq!(writes.load(Ordering::SeqCst), 1);
    assert_eq!(stored_texts(&storage), vec!["Task 1"]);
}

#[tokio::test(start_paused = true)]
async fn burst_of_changes_is_written_once() {
    let storage = MemoryStorage::new();
    let (store, writes) = counting_store(&storage).await;

    for i in 1..=5 {
        store.add_task(&format!("Task {i}")).await.unwrap();
        advance(100).await;
    }
    assert_eq!(writes.load(Ordering::SeqCst), 0);

    advance(401).await;
    assert_eq!(writes.load(Ordering::SeqCst), 1);
    assert_eq!(stored_texts(&storage).len(), 5);
}

#[tokio::test(start_paused = true)]
async fn each_change_restarts_the_timer() {
    let storage = MemoryStorage::new();
    let (store, writes) = counting_store(&storage).await;

    store.add_task("first").await.unwrap();
    advance(300).await;
    store.add_task("second").await.unwrap();
    advance(300).await;
    assert_eq!(writes.load(Ordering::SeqCst), 0);

    advance(201).await;
    assert_eq!(writes.load(Ordering::SeqCst), 1);
    assert_eq!(stored_texts(&storage), vec!["first", "second"]);
}

#[tokio::test(start_paused = true)]
async fn configured_debounce_is_honored() {
    let storage = MemoryStorage::new();
    let config = TodoConfig {
        debounce: Duration::from_millis(50),
        ..TodoConfig::default()
    };
    let store = TodoStore::spawn(&config, storage.context(), None, Silent).await;

    store.add_task("quick").await.unwrap();
    advance(51).await;
    assert_eq!(stored_texts(&storage), vec!["quick"]);
}

#[tokio::test(start_paused = true)]
async fn no_op_actions_do_not_write() {
    let storage = MemoryStorage::new();
    let (store, writes) = counting_store(&storage).await;

    store
        .dispatch(Action::FinishTask("missing".into()))
        .await
        .unwrap();
    advance(1000).await;
    assert_eq!(writes.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Drag suppression
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn no_write_while_dragging() {
    let storage = MemoryStorage::new();
    let (store, writes) = counting_store(&storage).await;

    let state = store.add_task("Task 1").await.unwrap();
    let mut drag = store.drag_controller();
    drag.start(&state, &state[0].id, 20.0, Rect::new(0.0, 40.0)).unwrap();
    assert!(store.is_dragging());

    advance(1000).await;
    assert_eq!(writes.load(Ordering::SeqCst), 0);
    assert!(storage.peek(KEY).is_none());
}

#[tokio::test(start_paused = true)]
async fn write_resumes_after_drag_ends() {
    let storage = MemoryStorage::new();
    let (store, writes) = counting_store(&storage).await;

    let state = store.add_task("Task 1").await.unwrap();
    let mut drag = store.drag_controller();
    drag.start(&state, &state[0].id, 20.0, Rect::new(0.0, 40.0)).unwrap();
    advance(1000).await;

    drag.end();
    assert!(!store.is_dragging());

    advance(499).await;
    assert_eq!(writes.load(Ordering::SeqCst), 0);
    advance(2).await;
    assert_eq!(writes.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_controller_mid_drag_lowers_the_flag() {
    let storage = MemoryStorage::new();
    let (store, writes) = counting_store(&storage).await;

    let state = store.add_task("Task 1").await.unwrap();
    {
        let mut drag = store.drag_controller();
        drag.start(&state, &state[0].id, 20.0, Rect::new(0.0, 40.0)).unwrap();
        advance(600).await;
    }
    assert!(!store.is_dragging());

    advance(501).await;
    assert_eq!(writes.load(Ordering::SeqCst), 1);
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

#[tokio::test]
async fn invalid_stored_record_loads_empty() {
    let storage = MemoryStorage::new();
    storage
        .context()
        .set_item(KEY, r#"{"not":"array"}"#)
        .await
        .unwrap();

    let store = TodoStore::spawn(&TodoConfig::default(), storage.context(), None, Silent).await;
    assert!(store.state().is_empty());
}

#[tokio::test(start_paused = true)]
async fn saved_list_is_restored_by_next_store() {
    let storage = MemoryStorage::new();
    let store = TodoStore::spawn(&TodoConfig::default(), storage.context(), None, Silent).await;
    store.add_task("Task 1").await.unwrap();
    let saved = store.add_task("Task 2").await.unwrap();
    advance(501).await;
    store.shutdown().await;

    let reopened =
        TodoStore::spawn(&TodoConfig::default(), storage.context(), None, Silent).await;
    assert_eq!(reopened.state(), saved);
}

// ---------------------------------------------------------------------------
// Failures and teardown
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn failed_write_notifies_and_keeps_state() {
    let storage = MemoryStorage::with_quota(8);
    let (tx, mut notes) = mpsc::unbounded_channel::<Notification>();
    let store = TodoStore::spawn(&TodoConfig::default(), storage.context(), None, tx).await;

    let state = store.add_task("Task 1").await.unwrap();
    advance(501).await;

    let note = notes.try_recv().unwrap();
    assert_eq!(note.kind, ToastKind::Error);
    assert!(note.message.starts_with("Could not save tasks:"));
    assert_eq!(store.state(), state);
    assert!(storage.peek(KEY).is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_write_is_retried_on_next_change() {
    let storage = MemoryStorage::with_quota(8);
    let (tx, mut notes) = mpsc::unbounded_channel::<Notification>();
    let store = TodoStore::spawn(&TodoConfig::default(), storage.context(), None, tx).await;

    store.add_task("Task 1").await.unwrap();
    advance(501).await;
    store.add_task("Task 2").await.unwrap();
    advance(501).await;

    assert!(notes.try_recv().is_ok());
    assert!(notes.try_recv().is_ok());
    assert!(notes.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn shutdown_discards_pending_write() {
    let storage = MemoryStorage::new();
    let store = TodoStore::spawn(&TodoConfig::default(), storage.context(), None, Silent).await;

    store.add_task("never saved").await.unwrap();
    store.shutdown().await;

    advance(1000).await;
    assert!(storage.peek(KEY).is_none());
}

#[tokio::test(start_paused = true)]
async fn dropping_store_releases_its_context() {
    let storage = MemoryStorage::new();
    let store = TodoStore::spawn(&TodoConfig::default(), storage.context(), None, Silent).await;
    assert_eq!(storage.context_count(), 1);

    drop(store);
    advance(1).await;
    assert_eq!(storage.context_count(), 0);
}

// ---------------------------------------------------------------------------
// Input boundary
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_task_is_rejected_with_warning() {
    let storage = MemoryStorage::new();
    let (tx, mut notes) = mpsc::unbounded_channel::<Notification>();
    let store = TodoStore::spawn(&TodoConfig::default(), storage.context(), None, tx).await;

    let result = store.add_task("   ").await;
    assert_eq!(result, Err(StoreError::Rejected(InputError::EmptyTask)));

    let note = notes.try_recv().unwrap();
    assert_eq!(note.kind, ToastKind::Warning);
    assert_eq!(note.message, "You can not add an empty task!");
    assert!(store.state().is_empty());
}

#[tokio::test]
async fn twenty_first_task_is_rejected_with_error() {
    let storage = MemoryStorage::new();
    let (tx, mut notes) = mpsc::unbounded_channel::<Notification>();
    let store = TodoStore::spawn(&TodoConfig::default(), storage.context(), None, tx).await;

    for i in 1..=20 {
        store.add_task(&format!("Task {i}")).await.unwrap();
    }
    let result = store.add_task("Task 21").await;
    assert_eq!(
        result,
        Err(StoreError::Rejected(InputError::TooManyTasks { max: 20 }))
    );

    let note = notes.try_recv().unwrap();
    assert_eq!(note.kind, ToastKind::Error);
    assert_eq!(note.message, "You can not have more than 20!");
    assert_eq!(store.state().len(), 20);
}

#[tokio::test(start_paused = true)]
async fn rejections_surface_as_expiring_toasts() {
    let config = TodoConfig::default();
    let toasts = ToastCenter::new(config.toast_duration);
    let storage = MemoryStorage::new();
    let store = TodoStore::spawn(&config, storage.context(), None, toasts.clone()).await;

    let _ = store.add_task("").await;
    let _ = store.add_task("").await;
    let visible = toasts.toasts();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].kind, ToastKind::Warning);
    assert_eq!(visible[0].message, "You can not add an empty task!");

    advance(3001).await;
    assert!(toasts.toasts().is_empty());
    assert_eq!(toasts.pending_timers(), 0);
}

#[tokio::test]
async fn over_long_task_is_truncated_with_warning() {
    let storage = MemoryStorage::new();
    let (tx, mut notes) = mpsc::unbounded_channel::<Notification>();
    let store = TodoStore::spawn(&TodoConfig::default(), storage.context(), None, tx).await;

    let state = store.add_task(&"x".repeat(60)).await.unwrap();
    assert_eq!(state[0].text.chars().count(), 50);

    let note = notes.try_recv().unwrap();
    assert_eq!(note.kind, ToastKind::Warning);
    assert_eq!(note.message, "Task length can not exceed 50 characters!");
    assert!(notes.try_recv().is_err());
}

#[tokio::test]
async fn task_within_limit_raises_no_warning() {
    let storage = MemoryStorage::new();
    let (tx, mut notes) = mpsc::unbounded_channel::<Notification>();
    let store = TodoStore::spawn(&TodoConfig::default(), storage.context(), None, tx).await;

    store.add_task(&"x".repeat(50)).await.unwrap();
    assert!(notes.try_recv().is_err());
}

#[tokio::test]
async fn over_long_edit_is_truncated_with_warning() {
    let storage = MemoryStorage::new();
    let (tx, mut notes) = mpsc::unbounded_channel::<Notification>();
    let store = TodoStore::spawn(&TodoConfig::default(), storage.context(), None, tx).await;

    let state = store.add_task("Original").await.unwrap();
    let id = state[0].id.clone();
    store.commit_edit(&id, "Original").await.unwrap();

    let state = store.commit_edit(&id, &"y".repeat(70)).await.unwrap();
    assert_eq!(state[0].text, "y".repeat(50));
    assert!(!state[0].is_editing);

    let note = notes.try_recv().unwrap();
    assert_eq!(note.kind, ToastKind::Warning);
    assert_eq!(note.message, "Task length can not exceed 50 characters!");
}

//! The task list store: reducer state, debounced persistence, and
//! cross-context reconciliation.
//!
//! [`TodoStore::spawn`] loads the stored record once, then starts a single
//! background task (the *actor*) that exclusively owns the state. Every
//! mutation goes through it, one reducer call at a time, so no locking is
//! needed around the state itself.
//!
//! # Architecture
//!
//! ```text
//!  view ── StoreCommand ──▶ actor ── watch<TaskList> ──▶ view(s)
//!                            │  ▲
//!        debounce deadline ──┘  └── StorageEvent (other contexts)
//!                            │
//!                            └──▶ Storage::set_item (after quiet period)
//! ```
//!
//! The actor waits on four inputs at once: commands from the view, storage
//! events from other contexts, changes to the drag suppression flag, and the
//! pending write deadline. Each state change pushes the deadline out by the
//! configured debounce; when it finally elapses the whole list is written,
//! unless a drag is in progress, in which case the write is skipped and
//! re-armed once the drag ends.
//!
//! The end of a drag counts as the state change that resumes persistence:
//! lowering the drag flag with unsaved changes arms one fresh deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use todolist_proto::event::StorageEvent;
use todolist_proto::record;
use todolist_proto::task::{TaskId, TaskList};

use crate::config::{Limits, TodoConfig};
use crate::drag::DragController;
use crate::input::{self, InputError};
use crate::notify::{Notifier, ToastKind};
use crate::reducer::{Action, reduce};
use crate::storage::Storage;

/// Errors returned to callers of [`TodoStore`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store has been shut down; the handle outlived its view.
    #[error("task store is closed")]
    Closed,

    /// The input was refused at the boundary (the user has been notified).
    #[error(transparent)]
    Rejected(#[from] InputError),
}

/// Commands sent from a view to the store actor.
#[derive(Debug)]
enum StoreCommand {
    /// Run one reducer step.
    Dispatch {
        action: Action,
        reply: oneshot::Sender<TaskList>,
    },
    /// Validate text against the current list, then add it.
    AddTask {
        text: String,
        reply: oneshot::Sender<Result<TaskList, InputError>>,
    },
    /// Finish an in-place edit, reverting empty input.
    CommitEdit {
        id: TaskId,
        input: String,
        reply: oneshot::Sender<TaskList>,
    },
    /// Stop the actor, discarding any pending write.
    Shutdown { reply: oneshot::Sender<()> },
}

/// Reads and validates the stored record.
///
/// Any failure (unreadable storage, malformed JSON, wrong shape, wrong field
/// types) yields an empty list. Malformed data is never partially adopted.
pub async fn load_initial<S: Storage>(storage: &S, key: &str) -> TaskList {
    let raw = match storage.get_item(key).await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            tracing::debug!(key, "no stored task list");
            return TaskList::new();
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "could not read stored task list");
            return TaskList::new();
        }
    };

    match record::decode(&raw) {
        Ok(tasks) => {
            tracing::info!(key, tasks = tasks.len(), "loaded stored task list");
            TaskList::from(tasks)
        }
        Err(e) => {
            tracing::warn!(key, error = %e, "stored task list is invalid; starting empty");
            TaskList::new()
        }
    }
}

/// Handle to a running task list store.
///
/// Dropping the handle stops the actor without writing; any pending
/// debounced write and the storage subscription are discarded with it.
pub struct TodoStore {
    cmd_tx: mpsc::Sender<StoreCommand>,
    state_rx: watch::Receiver<TaskList>,
    dragging: Arc<watch::Sender<bool>>,
    limits: Limits,
    task: Option<JoinHandle<()>>,
}

impl TodoStore {
    /// Loads the stored list and starts the store actor.
    ///
    /// `events` carries writes made by other contexts sharing `storage`;
    /// pass `None` for a backend without a change feed. Must be called from
    /// within a Tokio runtime.
    pub async fn spawn<S, N>(
        config: &TodoConfig,
        storage: S,
        events: Option<broadcast::Receiver<StorageEvent>>,
        notifier: N,
    ) -> Self
    where
        S: Storage + 'static,
        N: Notifier + 'static,
    {
        let initial = load_initial(&storage, &config.storage_key).await;

        let (cmd_tx, cmd_rx) = mpsc::channel(config.channel_capacity);
        let (state_tx, state_rx) = watch::channel(initial.clone());
        let (dragging, _) = watch::channel(false);
        let dragging = Arc::new(dragging);

        let actor = StoreActor {
            storage,
            notifier,
            key: config.storage_key.clone(),
            debounce: config.debounce,
            limits: config.limits,
            state: initial,
            state_tx,
            cmd_rx,
            events,
            drag_rx: dragging.subscribe(),
            _drag_tx: Arc::clone(&dragging),
            deadline: None,
            dirty: false,
        };
        let task = tokio::spawn(actor.run());

        Self {
            cmd_tx,
            state_rx,
            dragging,
            limits: config.limits,
            task: Some(task),
        }
    }

    /// Current state snapshot.
    #[must_use]
    pub fn state(&self) -> TaskList {
        self.state_rx.borrow().clone()
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TaskList> {
        self.state_rx.clone()
    }

    /// Limits enforced at this store's input boundary.
    #[must_use]
    pub const fn limits(&self) -> Limits {
        self.limits
    }

    /// Whether a drag is currently suppressing writes.
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        *self.dragging.borrow()
    }

    /// Creates a drag controller wired to this store's write suppression.
    #[must_use]
    pub fn drag_controller(&self) -> DragController {
        DragController::new(Arc::clone(&self.dragging))
    }

    /// Runs one reducer step and returns the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Closed`] if the store has shut down.
    pub async fn dispatch(&self, action: Action) -> Result<TaskList, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.request(StoreCommand::Dispatch { action, reply }, rx)
            .await
    }

    /// Adds a task after checking it against the input boundary.
    ///
    /// Rejections are also reported through the store's notifier, as is
    /// text cut to the length limit.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Rejected`] for empty text or a full list, and
    /// [`StoreError::Closed`] if the store has shut down.
    pub async fn add_task(&self, text: &str) -> Result<TaskList, StoreError> {
        let (reply, rx) = oneshot::channel();
        let text = text.to_string();
        self.request(StoreCommand::AddTask { text, reply }, rx)
            .await?
            .map_err(StoreError::from)
    }

    /// Commits an in-place edit; empty input keeps the current text and
    /// over-long input is cut to the length limit with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Closed`] if the store has shut down.
    pub async fn commit_edit(&self, id: &TaskId, input: &str) -> Result<TaskList, StoreError> {
        let (reply, rx) = oneshot::channel();
        let cmd = StoreCommand::CommitEdit {
            id: id.clone(),
            input: input.to_string(),
            reply,
        };
        self.request(cmd, rx).await
    }

    /// Stops the actor and waits for it to finish. Pending writes are
    /// discarded.
    pub async fn shutdown(mut self) {
        let (reply, rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(StoreCommand::Shutdown { reply })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    async fn request<T>(
        &self,
        cmd: StoreCommand,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, StoreError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| StoreError::Closed)?;
        rx.await.map_err(|_| StoreError::Closed)
    }
}

impl Drop for TodoStore {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Background task owning the state.
struct StoreActor<S, N> {
    storage: S,
    notifier: N,
    key: String,
    debounce: Duration,
    limits: Limits,
    state: TaskList,
    state_tx: watch::Sender<TaskList>,
    cmd_rx: mpsc::Receiver<StoreCommand>,
    events: Option<broadcast::Receiver<StorageEvent>>,
    drag_rx: watch::Receiver<bool>,
    /// Keeps the flag channel open for as long as the actor runs.
    _drag_tx: Arc<watch::Sender<bool>>,
    /// When the pending write is due, if one is armed.
    deadline: Option<Instant>,
    /// State changed since the last successful write.
    dirty: bool,
}

impl<S: Storage, N: Notifier> StoreActor<S, N> {
    async fn run(mut self) {
        tracing::debug!(key = %self.key, tasks = self.state.len(), "task store started");

        loop {
            let deadline = self.deadline;
            tokio::select! {
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(StoreCommand::Shutdown { reply }) => {
                        let _ = reply.send(());
                        break;
                    }
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                event = next_event(&mut self.events) => match event {
                    Ok(event) => self.handle_external(event),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "storage events dropped; waiting for the next one");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::debug!("storage event feed closed");
                        self.events = None;
                    }
                },
                Ok(()) = self.drag_rx.changed() => self.handle_drag_flag(),
                () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                    if deadline.is_some() => self.write().await,
            }
        }

        if self.deadline.is_some() {
            tracing::debug!("pending write discarded on shutdown");
        }
        tracing::debug!(key = %self.key, "task store stopped");
    }

    fn handle_command(&mut self, cmd: StoreCommand) {
        match cmd {
            StoreCommand::Dispatch { action, reply } => {
                let state = self.apply(action);
                let _ = reply.send(state);
            }
            StoreCommand::AddTask { text, reply } => {
                let result = match input::validate_new_task(&self.state, &text, self.limits) {
                    Ok((text, warning)) => {
                        self.warn_adjusted(warning);
                        Ok(self.apply(Action::AddTask(text)))
                    }
                    Err(e) => {
                        tracing::debug!(error = %e, "task rejected at input boundary");
                        self.notifier.notify(e.kind(), &e.to_string());
                        Err(e)
                    }
                };
                let _ = reply.send(result);
            }
            StoreCommand::CommitEdit { id, input, reply } => {
                let state = match self.state.find(&id) {
                    Some(task) => {
                        let (action, warning) = input::commit_edit(task, &input, self.limits);
                        self.warn_adjusted(warning);
                        self.apply(action)
                    }
                    None => self.state.clone(),
                };
                let _ = reply.send(state);
            }
            StoreCommand::Shutdown { .. } => {}
        }
    }

    /// Tells the user their input was cut to fit.
    fn warn_adjusted(&self, warning: Option<InputError>) {
        if let Some(w) = warning {
            tracing::debug!(warning = %w, "input truncated at boundary");
            self.notifier.notify(w.kind(), &w.to_string());
        }
    }

    /// Runs the reducer and, if anything changed, publishes the new state
    /// and re-arms the write deadline.
    fn apply(&mut self, action: Action) -> TaskList {
        let name = action.name();
        let next = reduce(&self.state, action);
        if next.ptr_eq(&self.state) {
            tracing::trace!(action = name, "no-op action");
            return next;
        }

        self.state = next.clone();
        self.state_tx.send_replace(next.clone());
        self.schedule_write();
        tracing::debug!(action = name, tasks = next.len(), "state updated");
        next
    }

    fn schedule_write(&mut self) {
        self.dirty = true;
        self.deadline = Some(Instant::now() + self.debounce);
    }

    fn handle_drag_flag(&mut self) {
        let dragging = *self.drag_rx.borrow_and_update();
        if !dragging && self.dirty && self.deadline.is_none() {
            tracing::debug!("drag ended with unsaved changes; write re-armed");
            self.schedule_write();
        }
    }

    fn handle_external(&mut self, event: StorageEvent) {
        if !event.is_for(&self.key) {
            tracing::trace!(key = %event.key, "ignoring storage event for another key");
            return;
        }
        let Some(raw) = event.new_value else {
            tracing::debug!(key = %self.key, "task list removed by another context; ignored");
            return;
        };

        match record::decode(&raw) {
            Ok(tasks) => {
                tracing::info!(tasks = tasks.len(), "task list changed in another context");
                self.apply(Action::SyncStorage(TaskList::from(tasks)));
            }
            Err(e) => {
                tracing::warn!(error = %e, "rejected task list from another context");
                self.notifier.notify(
                    ToastKind::Error,
                    &format!("Invalid data received from another tab: {e}"),
                );
            }
        }
    }

    async fn write(&mut self) {
        self.deadline = None;
        if *self.drag_rx.borrow() {
            tracing::debug!("write skipped while dragging");
            return;
        }

        let raw = match record::encode(&self.state) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(error = %e, "could not encode task list");
                self.notifier
                    .notify(ToastKind::Error, &format!("Could not save tasks: {e}"));
                return;
            }
        };

        match self.storage.set_item(&self.key, &raw).await {
            Ok(()) => {
                self.dirty = false;
                tracing::info!(tasks = self.state.len(), bytes = raw.len(), "task list saved");
            }
            Err(e) => {
                tracing::warn!(error = %e, "task list write failed; will retry on next change");
                self.notifier
                    .notify(ToastKind::Error, &format!("Could not save tasks: {e}"));
            }
        }
    }
}

/// Next event from the feed, or never if there is no feed.
async fn next_event(
    events: &mut Option<broadcast::Receiver<StorageEvent>>,
) -> Result<StorageEvent, broadcast::error::RecvError> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

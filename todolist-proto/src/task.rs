//! Task model for `todolist`.
//!
//! A [`Task`] is a short line of user text with a completion flag, an
//! editing flag, and an `order` value that positions it among its siblings.
//! Collections are held in a [`TaskList`], a shared immutable handle whose
//! identity is observable so that unchanged states can be detected cheaply.

use std::ops::Deref;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of tasks a list may hold.
pub const MAX_TASKS: usize = 20;

/// Maximum task text length in characters.
pub const MAX_TASK_TEXT_LENGTH: usize = 50;

/// Opaque unique task identifier.
///
/// Freshly created ids are UUID v7 strings, so they are time-ordered and
/// never collide with an id that was deleted earlier. Ids read back from
/// storage are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new time-ordered task identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Returns the string form of this id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single list entry.
///
/// Field names serialize in camelCase so the stored record reads
/// `{"id","text","isDone","isEditing","order"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, stable for the task's lifetime.
    pub id: TaskId,
    /// User content (at most [`MAX_TASK_TEXT_LENGTH`] characters once it has
    /// passed the input boundary).
    pub text: String,
    /// Whether the task has been completed.
    pub is_done: bool,
    /// Whether the task is currently being edited in place.
    pub is_editing: bool,
    /// Display position. Dense after a reorder, possibly sparse otherwise.
    pub order: u64,
}

impl Task {
    /// Creates a fresh, incomplete, non-editing task.
    #[must_use]
    pub fn new(text: impl Into<String>, order: u64) -> Self {
        Self {
            id: TaskId::new(),
            text: text.into(),
            is_done: false,
            is_editing: false,
            order,
        }
    }
}

/// An ordered, immutable, cheaply clonable collection of tasks.
///
/// Cloning shares the underlying allocation; [`TaskList::ptr_eq`] tells
/// whether two handles refer to the very same state.
#[derive(Debug, Clone)]
pub struct TaskList(Arc<[Task]>);

impl TaskList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// Returns `true` if both handles share the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Looks up a task by id.
    #[must_use]
    pub fn find(&self, id: &TaskId) -> Option<&Task> {
        self.0.iter().find(|t| t.id == *id)
    }

    /// Returns the position of a task by id.
    #[must_use]
    pub fn position(&self, id: &TaskId) -> Option<usize> {
        self.0.iter().position(|t| t.id == *id)
    }

    /// Returns `true` if a task with this id is present.
    #[must_use]
    pub fn contains(&self, id: &TaskId) -> bool {
        self.position(id).is_some()
    }

    /// The `order` a newly appended task receives: one past the largest
    /// stored order, or `1` for an empty list.
    ///
    /// This reads the stored values rather than the length, since deletions
    /// and reorders let the two drift apart.
    #[must_use]
    pub fn next_order(&self) -> u64 {
        self.0
            .iter()
            .map(|t| t.order)
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    /// Copies the tasks into an owned vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Task> {
        self.0.to_vec()
    }
}

impl Default for TaskList {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for TaskList {
    type Target = [Task];

    fn deref(&self) -> &[Task] {
        &self.0
    }
}

impl PartialEq for TaskList {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0[..] == other.0[..]
    }
}

impl Eq for TaskList {}

impl From<Vec<Task>> for TaskList {
    fn from(tasks: Vec<Task>) -> Self {
        Self(Arc::from(tasks))
    }
}

impl FromIterator<Task> for TaskList {
    fn from_iter<I: IntoIterator<Item = Task>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

//! Pure state transitions over a [`TaskList`].
//!
//! [`reduce`] is the only place the task collection is mutated. It performs
//! no I/O; every other component requests changes by producing an
//! [`Action`]. Transitions that change nothing hand back the input handle
//! itself, so callers can detect "no change" with [`TaskList::ptr_eq`].

use todolist_proto::task::{Task, TaskId, TaskList};

/// A requested change to the task collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Append a new task with the given (pre-validated) text.
    AddTask(String),
    /// Remove the task with this id.
    DeleteTask(TaskId),
    /// Flip the completion flag of the task with this id.
    FinishTask(TaskId),
    /// Store `input_text` as the task text and flip its editing flag.
    ToggleTaskEditing {
        /// Task being edited.
        id: TaskId,
        /// Text to store. Callers substitute the prior text for empty input.
        input_text: String,
    },
    /// Move `dragged_item_id` to the position held by `item_below_id`,
    /// then renumber every task.
    ReorderTasks {
        /// Task being dragged.
        dragged_item_id: TaskId,
        /// Task currently under the drag ghost.
        item_below_id: TaskId,
    },
    /// Replace the whole collection with an externally observed state.
    SyncStorage(TaskList),
}

impl Action {
    /// Short name used in log fields.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddTask(_) => "ADD_TASK",
            Self::DeleteTask(_) => "DELETE_TASK",
            Self::FinishTask(_) => "FINISH_TASK",
            Self::ToggleTaskEditing { .. } => "TOGGLE_TASK_EDITING",
            Self::ReorderTasks { .. } => "REORDER_TASKS",
            Self::SyncStorage(_) => "SYNC_STORAGE",
        }
    }
}

/// Applies `action` to `state` and returns the resulting state.
#[must_use]
pub fn reduce(state: &TaskList, action: Action) -> TaskList {
    match action {
        Action::AddTask(text) => {
            let task = Task::new(text, state.next_order());
            state.iter().cloned().chain(std::iter::once(task)).collect()
        }
        Action::DeleteTask(id) => {
            if !state.contains(&id) {
                return state.clone();
            }
            state.iter().filter(|t| t.id != id).cloned().collect()
        }
        Action::FinishTask(id) => update_one(state, &id, |t| t.is_done = !t.is_done),
        Action::ToggleTaskEditing { id, input_text } => update_one(state, &id, |t| {
            t.text = input_text;
            t.is_editing = !t.is_editing;
        }),
        Action::ReorderTasks {
            dragged_item_id,
            item_below_id,
        } => reorder(state, &dragged_item_id, &item_below_id),
        Action::SyncStorage(payload) => payload,
    }
}

/// Rebuilds the list with one task modified, or returns `state` untouched
/// if no task has this id.
fn update_one(state: &TaskList, id: &TaskId, edit: impl FnOnce(&mut Task)) -> TaskList {
    let Some(index) = state.position(id) else {
        return state.clone();
    };
    let mut tasks = state.to_vec();
    edit(&mut tasks[index]);
    TaskList::from(tasks)
}

/// Removes the dragged task and re-inserts it at the index the below task
/// held before the removal, then renumbers `order` as 1-based positions.
fn reorder(state: &TaskList, dragged: &TaskId, below: &TaskId) -> TaskList {
    let (Some(from), Some(to)) = (state.position(dragged), state.position(below)) else {
        return state.clone();
    };

    let mut tasks = state.to_vec();
    let moved = tasks.remove(from);
    tasks.insert(to, moved);

    for (position, task) in (1u64..).zip(tasks.iter_mut()) {
        task.order = position;
    }
    TaskList::from(tasks)
}

//! Display ordering for a task list.
//!
//! Completion never changes a task's stored `order`; instead the view shows
//! incomplete tasks first and completed ones after, each group by `order`.

use todolist_proto::task::Task;

/// Tasks split into display groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition<'a> {
    /// Incomplete tasks by ascending `order`.
    pub active: Vec<&'a Task>,
    /// Completed tasks by ascending `order`.
    pub done: Vec<&'a Task>,
}

impl<'a> Partition<'a> {
    /// All tasks in display order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Task> + '_ {
        self.active.iter().chain(self.done.iter()).copied()
    }
}

/// Splits `tasks` into display groups.
#[must_use]
pub fn partition(tasks: &[Task]) -> Partition<'_> {
    let (mut active, mut done): (Vec<&Task>, Vec<&Task>) =
        tasks.iter().partition(|t| !t.is_done);
    active.sort_by_key(|t| t.order);
    done.sort_by_key(|t| t.order);
    Partition { active, done }
}

/// Whether a task may be picked up for dragging.
#[must_use]
pub const fn is_draggable(task: &Task) -> bool {
    !task.is_done
}

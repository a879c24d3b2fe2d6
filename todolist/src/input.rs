//! Input-boundary checks.
//!
//! Everything that can make an action invalid is caught here, before the
//! reducer sees it: empty text, a full list, over-long text. Rejections carry
//! the user-facing message and severity so callers can hand them straight
//! to a [`Notifier`](crate::notify::Notifier).

use todolist_proto::task::{Task, TaskList};

use crate::config::Limits;
use crate::notify::ToastKind;
use crate::reducer::Action;

/// Reasons an input is refused at the boundary.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum InputError {
    /// The submitted text is empty or whitespace.
    #[error("You can not add an empty task!")]
    EmptyTask,
    /// The list already holds the maximum number of tasks.
    #[error("You can not have more than {max}!")]
    TooManyTasks {
        /// Configured maximum.
        max: usize,
    },
    /// The text was cut to the maximum length.
    #[error("Task length can not exceed {max} characters!")]
    TextTooLong {
        /// Configured maximum, in characters.
        max: usize,
    },
}

impl InputError {
    /// Severity to notify with.
    #[must_use]
    pub const fn kind(&self) -> ToastKind {
        match self {
            Self::TooManyTasks { .. } => ToastKind::Error,
            Self::EmptyTask | Self::TextTooLong { .. } => ToastKind::Warning,
        }
    }
}

/// Cuts `raw` to at most `max` characters.
///
/// Returns the kept text and, if anything was cut, the warning to show.
#[must_use]
pub fn truncate_input(raw: &str, max: usize) -> (String, Option<InputError>) {
    match raw.char_indices().nth(max) {
        Some((cut, _)) => (raw[..cut].to_string(), Some(InputError::TextTooLong { max })),
        None => (raw.to_string(), None),
    }
}

/// Validates text submitted for a new task against the current list.
///
/// Over-long text is truncated rather than refused, since the input field
/// would never have accepted the extra characters. The returned warning is
/// `Some` when that happened and should be shown to the user.
///
/// # Errors
///
/// Returns [`InputError::EmptyTask`] for blank text and
/// [`InputError::TooManyTasks`] when the list is full.
pub fn validate_new_task(
    tasks: &TaskList,
    text: &str,
    limits: Limits,
) -> Result<(String, Option<InputError>), InputError> {
    if text.trim().is_empty() {
        return Err(InputError::EmptyTask);
    }
    if tasks.len() >= limits.max_tasks {
        return Err(InputError::TooManyTasks {
            max: limits.max_tasks,
        });
    }
    Ok(truncate_input(text, limits.max_text_len))
}

/// Builds the action that commits an in-place edit of `task`.
///
/// Empty input reverts to the task's current text instead of clearing it.
/// Over-long input is truncated and reported through the returned warning.
#[must_use]
pub fn commit_edit(task: &Task, input: &str, limits: Limits) -> (Action, Option<InputError>) {
    let (input_text, warning) = if input.trim().is_empty() {
        (task.text.clone(), None)
    } else {
        truncate_input(input, limits.max_text_len)
    };
    let action = Action::ToggleTaskEditing {
        id: task.id.clone(),
        input_text,
    };
    (action, warning)
}

//! JSON storage record for a task list.
//!
//! The record is a bare JSON array of task objects with no envelope and no
//! version field. [`decode`] validates the whole payload before returning
//! anything: a single bad element rejects the record, so malformed data is
//! never partially adopted.

use serde_json::Value;

use crate::task::Task;

/// Errors produced while reading or writing a storage record.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// The payload is not valid JSON.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload is valid JSON but not an array.
    #[error("expected an array of tasks, found {found}")]
    NotAnArray {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// An element is missing a field or carries a field of the wrong type.
    #[error("invalid task at index {index}: {reason}")]
    InvalidTask {
        /// Position of the offending element.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },
}

/// Encodes tasks into the stored JSON form.
///
/// # Errors
///
/// Returns [`RecordError::Json`] if serialization fails.
pub fn encode(tasks: &[Task]) -> Result<String, RecordError> {
    Ok(serde_json::to_string(tasks)?)
}

/// Decodes and validates a stored JSON record.
///
/// Every element must be an object with `id` (string), `text` (string),
/// `isDone` (bool), `isEditing` (bool) and `order` (non-negative integer).
/// Unknown extra fields are ignored.
///
/// # Errors
///
/// Returns [`RecordError`] describing the first problem found.
pub fn decode(raw: &str) -> Result<Vec<Task>, RecordError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Array(items) = value else {
        return Err(RecordError::NotAnArray {
            found: json_type(&value),
        });
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            if !item.is_object() {
                return Err(RecordError::InvalidTask {
                    index,
                    reason: format!("expected an object, found {}", json_type(&item)),
                });
            }
            serde_json::from_value(item).map_err(|e| RecordError::InvalidTask {
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

//! Shared definitions for the `todolist` storage boundary: the task model,
//! the cross-context change signal, and the JSON record codec.

pub mod event;
pub mod record;
pub mod task;

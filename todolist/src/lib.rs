//! `todolist`: an ordered task list engine.
//!
//! The pieces, bottom-up:
//!
//! - [`reducer`]: the pure state transition for every task action
//! - [`drag`]: pointer-driven reordering with hysteresis
//! - [`storage`]: the key-value backend seam (in-memory contexts, files)
//! - [`store`]: the actor that owns state, debounces writes, and reconciles
//!   changes made by other contexts
//! - [`toast`] and [`notify`]: transient user notifications
//! - [`input`] and [`view`]: the checks and ordering a view applies
//!
//! Records themselves live in the `todolist-proto` crate.

pub mod config;
pub mod drag;
pub mod input;
pub mod logging;
pub mod notify;
pub mod reducer;
pub mod storage;
pub mod store;
pub mod toast;
pub mod view;

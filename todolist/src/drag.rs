//! Pointer-drag reordering with directional hysteresis.
//!
//! A [`DragController`] turns a continuous stream of pointer positions into
//! discrete [`Action::ReorderTasks`] requests. Decisions are made on the
//! *ghost* position (the dragged item's own vertical center, tracked via the
//! offset captured at drag start) rather than on the raw cursor.
//!
//! Around the hovered item's middle there is a dead zone between 50% and
//! 150% of its half-height:
//!
//! ```text
//!  top ─────────────┐
//!                   │  ghost above `low`  → moving up past the item
//!  low  (h/2 · 0.5) ┤
//!                   │  dead zone: no reorder
//!  high (h/2 · 1.5) ┤
//!                   │  ghost below `high` → moving down past the item
//!  bottom ──────────┘
//! ```
//!
//! Two adjacent items of similar height cannot flip back and forth on a
//! single pointer jitter.

use std::sync::Arc;

use tokio::sync::watch;

use todolist_proto::task::{TaskId, TaskList};

use crate::reducer::Action;

/// Vertical extent of a rendered item, in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Distance from the top of the viewport.
    pub top: f64,
    /// Rendered height.
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle from its top edge and height.
    #[must_use]
    pub const fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    /// Vertical center in viewport coordinates.
    #[must_use]
    pub fn center(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Resolves the current on-screen box of a rendered task.
///
/// Implemented by whatever owns the layout. Returning `None` (the item is
/// not rendered) suppresses any reorder decision for that item.
pub trait ItemGeometry {
    /// Current bounding box of the task with this id.
    fn bounding_box(&self, id: &TaskId) -> Option<Rect>;
}

impl<F> ItemGeometry for F
where
    F: Fn(&TaskId) -> Option<Rect>,
{
    fn bounding_box(&self, id: &TaskId) -> Option<Rect> {
        self(id)
    }
}

/// Reasons a drag cannot start.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DragError {
    /// The task is not in the collection.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// Completed tasks are not draggable.
    #[error("task is completed and cannot be dragged: {0}")]
    TaskCompleted(TaskId),
}

/// Hysteresis thresholds relative to an item's top edge.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Thresholds {
    low: f64,
    high: f64,
}

impl Thresholds {
    fn for_height(height: f64) -> Self {
        let middle = height / 2.0;
        Self {
            low: middle - middle / 2.0,
            high: middle + middle / 2.0,
        }
    }
}

/// Per-view drag state.
///
/// While a drag is active the shared suppression flag is raised so the
/// persistence controller holds off writing intermediate orderings. The
/// flag is lowered on [`end`](Self::end) and when the controller is dropped
/// mid-drag.
pub struct DragController {
    dragged_id: Option<TaskId>,
    drag_offset: f64,
    suppress: Arc<watch::Sender<bool>>,
}

impl DragController {
    /// Creates a controller that raises `suppress` while a drag is active.
    #[must_use]
    pub const fn new(suppress: Arc<watch::Sender<bool>>) -> Self {
        Self {
            dragged_id: None,
            drag_offset: 0.0,
            suppress,
        }
    }

    /// The task currently being dragged, if any.
    #[must_use]
    pub const fn dragged_id(&self) -> Option<&TaskId> {
        self.dragged_id.as_ref()
    }

    /// Offset between the pointer and the dragged item's center, captured
    /// at drag start.
    #[must_use]
    pub const fn drag_offset(&self) -> f64 {
        self.drag_offset
    }

    /// Begins dragging `id`, whose element currently occupies `rect`, with
    /// the pointer at `pointer_y`.
    ///
    /// # Errors
    ///
    /// Returns [`DragError::TaskNotFound`] for an unknown id and
    /// [`DragError::TaskCompleted`] for a completed task.
    pub fn start(
        &mut self,
        tasks: &TaskList,
        id: &TaskId,
        pointer_y: f64,
        rect: Rect,
    ) -> Result<(), DragError> {
        let task = tasks
            .find(id)
            .ok_or_else(|| DragError::TaskNotFound(id.clone()))?;
        if task.is_done {
            return Err(DragError::TaskCompleted(id.clone()));
        }

        self.dragged_id = Some(id.clone());
        self.drag_offset = pointer_y - rect.center();
        self.suppress.send_replace(true);
        tracing::debug!(task_id = %id, offset = self.drag_offset, "drag started");
        Ok(())
    }

    /// Handles one pointer movement over `hovered_id`.
    ///
    /// Returns a reorder request when the ghost has moved far enough past
    /// the hovered item in the direction of travel, `None` otherwise.
    #[must_use]
    pub fn over(
        &self,
        tasks: &TaskList,
        hovered_id: &TaskId,
        pointer_y: f64,
        geometry: &impl ItemGeometry,
    ) -> Option<Action> {
        let dragged_id = self.dragged_id.as_ref()?;
        if dragged_id == hovered_id {
            return None;
        }
        let dragged_order = tasks.find(dragged_id)?.order;
        let hovered_order = tasks.find(hovered_id)?.order;
        let rect = geometry.bounding_box(hovered_id)?;

        let ghost_middle = pointer_y - self.drag_offset;
        let relative = ghost_middle - rect.top;
        let thresholds = Thresholds::for_height(rect.height);

        let moving_down = dragged_order < hovered_order && relative > thresholds.high;
        let moving_up = dragged_order > hovered_order && relative < thresholds.low;
        if !(moving_down || moving_up) {
            return None;
        }

        tracing::trace!(
            dragged = %dragged_id,
            below = %hovered_id,
            relative,
            "reorder threshold crossed"
        );
        Some(Action::ReorderTasks {
            dragged_item_id: dragged_id.clone(),
            item_below_id: hovered_id.clone(),
        })
    }

    /// Ends the current drag, if any.
    pub fn end(&mut self) {
        if let Some(id) = self.dragged_id.take() {
            tracing::debug!(task_id = %id, "drag ended");
        }
        self.suppress.send_replace(false);
    }
}

impl Drop for DragController {
    fn drop(&mut self) {
        if self.dragged_id.is_some() {
            self.end();
        }
    }
}

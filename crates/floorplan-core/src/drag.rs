#![forbid(unsafe_code)]

//! Pointer drags turned into grid moves.
//!
//! A drag is tracked from pointer-down to pointer-up as an accumulated pixel
//! delta. On drop the delta is snapped to whole cells, added to the
//! department's position and clamped into the grid.
//!
//! # Invariants
//!
//! 1. After a drop, `0 <= pos <= resolution - size` on each axis (or `0`
//!    when the department is larger than the grid).
//! 2. A locked or unknown department is never moved.
//! 3. Overlap with other departments is not checked.

use serde::{Deserialize, Serialize};

use crate::department::{DepartmentStore, DeptId};
use crate::geometry::{Canvas, GridPoint, Zoom};

/// A pointer displacement in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelDelta {
    pub x: f64,
    pub y: f64,
}

impl PixelDelta {
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Why a drop left the roster untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragRejection {
    Locked,
    NotFound,
}

/// Result of dropping a dragged department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// Position committed. `from == to` when the delta snapped to zero or
    /// was fully clamped away.
    Moved {
        id: DeptId,
        from: GridPoint,
        to: GridPoint,
    },
    Rejected { id: DeptId, reason: DragRejection },
}

impl DropOutcome {
    #[must_use]
    pub fn is_moved(&self) -> bool {
        matches!(self, Self::Moved { .. })
    }
}

/// Drop `id` after a drag of `delta` screen pixels.
pub fn apply_drag(
    store: &mut DepartmentStore,
    id: &DeptId,
    delta: PixelDelta,
    canvas: Canvas,
    resolution: u32,
    zoom: Zoom,
) -> DropOutcome {
    let Some(dept) = store.get(id) else {
        tracing::debug!(id = %id, "drop ignored: department not found");
        return DropOutcome::Rejected {
            id: id.clone(),
            reason: DragRejection::NotFound,
        };
    };
    if dept.locked {
        tracing::debug!(id = %id, name = %dept.name, "drop ignored: department locked");
        return DropOutcome::Rejected {
            id: id.clone(),
            reason: DragRejection::Locked,
        };
    }

    let from = dept.position();
    let dx = canvas.delta_to_cells(delta.x, resolution, zoom);
    let dy = canvas.delta_to_cells(delta.y, resolution, zoom);
    let target_x = i64::from(from.x).saturating_add(dx);
    let target_y = i64::from(from.y).saturating_add(dy);

    match store.move_to(id, target_x, target_y, resolution) {
        Ok(to) => {
            tracing::debug!(
                id = %id,
                dx,
                dy,
                to_x = to.x,
                to_y = to.y,
                "department dropped"
            );
            DropOutcome::Moved {
                id: id.clone(),
                from,
                to,
            }
        }
        // Lock and presence were checked above; nothing else can fail.
        Err(_) => DropOutcome::Rejected {
            id: id.clone(),
            reason: DragRejection::NotFound,
        },
    }
}

#[derive(Debug, Clone)]
struct DragTracker {
    id: DeptId,
    delta: PixelDelta,
}

/// Tracks the drag in progress, if any.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    active: Option<DragTracker>,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start dragging `id`. Replaces any drag already in progress.
    pub fn begin(&mut self, id: DeptId) {
        self.active = Some(DragTracker {
            id,
            delta: PixelDelta::default(),
        });
    }

    /// Accumulate pointer motion. Ignored when no drag is active.
    pub fn motion(&mut self, dx: f64, dy: f64) {
        if let Some(drag) = self.active.as_mut() {
            drag.delta.x += dx;
            drag.delta.y += dy;
        }
    }

    /// Whether a drag is currently in progress.
    #[inline]
    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.active.is_some()
    }

    /// Department being dragged and its accumulated delta.
    pub fn current(&self) -> Option<(&DeptId, PixelDelta)> {
        self.active.as_ref().map(|drag| (&drag.id, drag.delta))
    }

    /// Abandon the drag without touching the roster.
    pub fn cancel(&mut self) {
        self.active = None;
    }

    /// Finish the drag and drop the department. `None` when no drag was active.
    pub fn end(
        &mut self,
        store: &mut DepartmentStore,
        canvas: Canvas,
        resolution: u32,
        zoom: Zoom,
    ) -> Option<DropOutcome> {
        let drag = self.active.take()?;
        Some(apply_drag(store, &drag.id, drag.delta, canvas, resolution, zoom))
    }
}

#[cfg(test)]
mod tests {
    use super::{DragController, DragRejection, DropOutcome, PixelDelta, apply_drag};
    use crate::department::{DepartmentStore, DeptId, DeptKind, NewDepartment};
    use crate::geometry::{Canvas, GridPoint, GridRect, Zoom};

    fn store_with(rect: GridRect) -> (DepartmentStore, DeptId) {
        let mut store = DepartmentStore::new();
        let id = store
            .add(
                NewDepartment {
                    name: "A".to_string(),
                    kind: DeptKind::Dept,
                    rect,
                },
                30,
            )
            .expect("add")
            .id
            .clone();
        (store, id)
    }

    #[test]
    fn one_cell_drag_at_zoom_one() {
        let (mut store, id) = store_with(GridRect::new(0, 0, 5, 5));
        let outcome = apply_drag(
            &mut store,
            &id,
            PixelDelta::new(30.0, 0.0),
            Canvas::default(),
            30,
            Zoom::default(),
        );
        assert_eq!(
            outcome,
            DropOutcome::Moved {
                id: id.clone(),
                from: GridPoint::new(0, 0),
                to: GridPoint::new(1, 0),
            }
        );
    }

    #[test]
    fn drop_clamps_to_both_edges() {
        let (mut store, id) = store_with(GridRect::new(2, 2, 5, 5));
        apply_drag(
            &mut store,
            &id,
            PixelDelta::new(-900.0, 9000.0),
            Canvas::default(),
            30,
            Zoom::default(),
        );
        assert_eq!(store.get(&id).map(|d| d.position()), Some(GridPoint::new(0, 25)));
    }

    #[test]
    fn locked_department_stays_put() {
        let (mut store, id) = store_with(GridRect::new(3, 3, 2, 2));
        store.toggle_lock(&id).expect("lock");
        let outcome = apply_drag(
            &mut store,
            &id,
            PixelDelta::new(120.0, 120.0),
            Canvas::default(),
            30,
            Zoom::default(),
        );
        assert_eq!(
            outcome,
            DropOutcome::Rejected {
                id: id.clone(),
                reason: DragRejection::Locked
            }
        );
        assert_eq!(store.get(&id).map(|d| d.position()), Some(GridPoint::new(3, 3)));
    }

    #[test]
    fn unknown_department_is_rejected() {
        let (mut store, _) = store_with(GridRect::new(0, 0, 1, 1));
        let outcome = apply_drag(
            &mut store,
            &DeptId::new("dept_missing"),
            PixelDelta::new(30.0, 0.0),
            Canvas::default(),
            30,
            Zoom::default(),
        );
        assert!(!outcome.is_moved());
    }

    #[test]
    fn controller_accumulates_motion_until_drop() {
        let (mut store, id) = store_with(GridRect::new(0, 0, 2, 2));
        let mut drag = DragController::new();
        assert!(drag
            .end(&mut store, Canvas::default(), 30, Zoom::default())
            .is_none());

        drag.begin(id.clone());
        drag.motion(20.0, 5.0);
        drag.motion(25.0, 5.0);
        assert!(drag.is_dragging());
        assert_eq!(drag.current().map(|(_, d)| d), Some(PixelDelta::new(45.0, 10.0)));

        let outcome = drag
            .end(&mut store, Canvas::default(), 30, Zoom::default())
            .expect("drag was active");
        assert!(outcome.is_moved());
        assert!(!drag.is_dragging());
        assert_eq!(store.get(&id).map(|d| d.position()), Some(GridPoint::new(2, 0)));
    }

    #[test]
    fn cancel_leaves_roster_untouched() {
        let (mut store, id) = store_with(GridRect::new(4, 4, 2, 2));
        let mut drag = DragController::new();
        drag.begin(id.clone());
        drag.motion(300.0, 300.0);
        drag.cancel();
        assert!(drag
            .end(&mut store, Canvas::default(), 30, Zoom::default())
            .is_none());
        assert_eq!(store.get(&id).map(|d| d.position()), Some(GridPoint::new(4, 4)));
    }
}

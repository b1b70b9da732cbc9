#![forbid(unsafe_code)]

//! Optimizer candidates: preview diff and attribute-preserving merge.
//!
//! Candidates come from a process that knows nothing about client-side ids,
//! so every match against the live roster is by department name, first
//! match wins.

use serde::{Deserialize, Serialize};

use crate::department::{Department, DepartmentStore, DeptKind};
use crate::error::{EditorError, Result};
use crate::geometry::{GridPoint, GridRect};

/// One placed department in an optimizer result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    #[inline]
    pub const fn rect(&self) -> GridRect {
        GridRect::new(self.x, self.y, self.width, self.height)
    }
}

/// Which quantity the optimizer scored the layout by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreKind {
    TotalCost,
    TotalDistance,
    Score,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub kind: ScoreKind,
    pub value: f64,
}

/// A candidate layout returned by the optimizer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub placements: Vec<Placement>,
    pub score: Option<Score>,
}

/// A department whose position differs between the live roster and a
/// candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRow {
    pub name: String,
    pub from: GridPoint,
    pub to: GridPoint,
}

/// Position changes a candidate would make. Candidate entries with no
/// department of the same name, or at the same position, produce no row.
#[must_use]
pub fn diff(current: &DepartmentStore, candidate: &OptimizationResult) -> Vec<DiffRow> {
    candidate
        .placements
        .iter()
        .filter_map(|placement| {
            let existing = current.find_by_name(&placement.name)?;
            let to = GridPoint::new(placement.x, placement.y);
            (existing.position() != to).then(|| DiffRow {
                name: placement.name.clone(),
                from: existing.position(),
                to,
            })
        })
        .collect()
}

/// Build the roster that replaces `current` when `candidate` is accepted.
///
/// Geometry comes from the candidate. `locked`, `kind` and `id` carry over
/// from the existing department of the same name; new names get a fresh id,
/// `locked = false` and `kind = dept`. Departments absent from the candidate
/// are dropped. Every entry is stamped with `grid_size`.
#[must_use]
pub fn merge(
    current: &mut DepartmentStore,
    candidate: &OptimizationResult,
    grid_size: u32,
) -> Vec<Department> {
    let mut merged = Vec::with_capacity(candidate.placements.len());
    for placement in &candidate.placements {
        let existing = current
            .find_by_name(&placement.name)
            .map(|d| (d.id.clone(), d.locked, d.kind));
        let (id, locked, kind) = match existing {
            // A name repeated in the candidate keeps the old id only once.
            Some((id, locked, kind)) if !merged.iter().any(|d: &Department| d.id == id) => {
                (id, locked, kind)
            }
            Some((_, locked, kind)) => (current.fresh_id(), locked, kind),
            None => (current.fresh_id(), false, DeptKind::Dept),
        };
        merged.push(Department {
            id,
            name: placement.name.clone(),
            kind,
            x: placement.x,
            y: placement.y,
            width: placement.width,
            height: placement.height,
            locked,
            grid_size,
        });
    }
    merged
}

/// Candidates held for preview until accepted or discarded.
#[derive(Debug, Clone, Default)]
pub struct OptimizationPreview {
    candidates: Vec<OptimizationResult>,
    selected: usize,
}

impl OptimizationPreview {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold a single candidate, replacing anything pending.
    pub fn set(&mut self, candidate: OptimizationResult) {
        self.set_many(vec![candidate]);
    }

    /// Hold several candidates, selecting the first.
    pub fn set_many(&mut self, candidates: Vec<OptimizationResult>) {
        tracing::debug!(count = candidates.len(), "preview candidates held");
        self.candidates = candidates;
        self.selected = 0;
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        !self.candidates.is_empty()
    }

    pub fn candidates(&self) -> &[OptimizationResult] {
        &self.candidates
    }

    #[inline]
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// The candidate currently shown.
    pub fn selected(&self) -> Option<&OptimizationResult> {
        self.candidates.get(self.selected)
    }

    pub fn select_candidate(&mut self, index: usize) -> Result<()> {
        if index >= self.candidates.len() {
            return Err(EditorError::NoPreview);
        }
        self.selected = index;
        Ok(())
    }

    /// Diff of the selected candidate against `current`. Empty when nothing
    /// is pending.
    pub fn diff(&self, current: &DepartmentStore) -> Vec<DiffRow> {
        self.selected()
            .map(|candidate| diff(current, candidate))
            .unwrap_or_default()
    }

    /// Merge the selected candidate into `current` (full replace) and clear
    /// the preview. Returns the number of departments in the new roster.
    pub fn apply(&mut self, current: &mut DepartmentStore, grid_size: u32) -> Result<usize> {
        let candidate = self
            .candidates
            .get(self.selected)
            .ok_or(EditorError::NoPreview)?;
        let merged = merge(current, candidate, grid_size);
        let count = merged.len();
        current.replace_all(merged);
        self.discard();
        tracing::debug!(count, grid_size, "preview applied");
        Ok(count)
    }

    /// Drop all pending candidates. The roster is untouched.
    pub fn discard(&mut self) {
        self.candidates.clear();
        self.selected = 0;
    }
}

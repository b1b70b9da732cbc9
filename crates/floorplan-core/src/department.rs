#![forbid(unsafe_code)]

//! Placed departments and the ordered store that owns them.
//!
//! A department's `name` is its join key: relation matrices are indexed by
//! name order and optimizer results are matched back by name. The `id` is
//! only meaningful inside this editing session.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};
use crate::geometry::{GridPoint, GridRect};

/// Session-unique department identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeptId(String);

impl DeptId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a placed block represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeptKind {
    /// A real department: takes part in relation matrices and optimization.
    #[default]
    Dept,
    /// Reserved floor space: occupies the canvas, excluded from matrices.
    Void,
}

impl DeptKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dept => "dept",
            Self::Void => "void",
        }
    }

    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "dept" | "department" => Ok(Self::Dept),
            "void" => Ok(Self::Void),
            other => Err(EditorError::validation(
                "kind",
                format!("unknown kind '{other}'"),
            )),
        }
    }
}

/// A department placed on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DeptId,
    pub name: String,
    #[serde(default)]
    pub kind: DeptKind,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub locked: bool,
    /// Resolution the coordinates are expressed in; kept on the entity for
    /// rendering.
    pub grid_size: u32,
}

impl Department {
    #[inline]
    pub const fn rect(&self) -> GridRect {
        GridRect::new(self.x, self.y, self.width, self.height)
    }

    #[inline]
    pub const fn position(&self) -> GridPoint {
        GridPoint::new(self.x, self.y)
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        self.kind == DeptKind::Void
    }
}

/// Typed input for a new department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDepartment {
    pub name: String,
    pub kind: DeptKind,
    pub rect: GridRect,
}

/// Raw text of the add-department form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DepartmentForm {
    pub name: String,
    pub width: String,
    pub height: String,
    pub x: String,
    pub y: String,
    pub kind: String,
}

impl DepartmentForm {
    /// Parse the form fields. Fails on the first missing or non-numeric
    /// field, in form order.
    pub fn parse(&self) -> Result<NewDepartment> {
        let name = required_text("name", &self.name)?;
        let width = parse_int("width", &self.width)?;
        let height = parse_int("height", &self.height)?;
        let x = parse_int("x", &self.x)?;
        let y = parse_int("y", &self.y)?;
        let kind = DeptKind::parse(&self.kind)?;

        if width <= 0 {
            return Err(EditorError::validation("width", "must be greater than 0"));
        }
        if height <= 0 {
            return Err(EditorError::validation("height", "must be greater than 0"));
        }
        if x < 0 {
            return Err(EditorError::validation("x", "must not be negative"));
        }
        if y < 0 {
            return Err(EditorError::validation("y", "must not be negative"));
        }

        Ok(NewDepartment {
            name,
            kind,
            rect: GridRect::new(
                to_cells("x", x)?,
                to_cells("y", y)?,
                to_cells("width", width)?,
                to_cells("height", height)?,
            ),
        })
    }
}

pub(crate) fn required_text(field: &'static str, raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EditorError::validation(field, "required"));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn parse_int(field: &'static str, raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EditorError::validation(field, "required"));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| EditorError::validation(field, format!("must be a number, got '{trimmed}'")))
}

pub(crate) fn to_cells(field: &'static str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| EditorError::validation(field, "out of range"))
}

/// Ordered collection of placed departments.
#[derive(Debug, Clone, Default)]
pub struct DepartmentStore {
    departments: Vec<Department>,
    next_id: u64,
}

impl DepartmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from saved departments. Each one is checked the way
    /// [`add`](Self::add) checks it, against its own `grid_size`, which may
    /// not exceed `max_resolution`. Ids must be unique.
    pub fn restore(departments: Vec<Department>, max_resolution: u32) -> Result<Self> {
        let mut seen = HashSet::with_capacity(departments.len());
        for dept in &departments {
            if !seen.insert(dept.id.clone()) {
                return Err(EditorError::validation(
                    "id",
                    format!("duplicate department id '{}'", dept.id),
                ));
            }
            required_text("name", &dept.name)?;
            if dept.grid_size == 0 || dept.grid_size > max_resolution {
                return Err(EditorError::validation(
                    "gridSize",
                    format!(
                        "{}: {} is outside 1..={max_resolution}",
                        dept.name, dept.grid_size
                    ),
                ));
            }
            check_placement(dept.rect(), dept.grid_size)?;
        }
        let mut store = Self::default();
        store.replace_all(departments);
        Ok(store)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.departments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Department> {
        self.departments.iter()
    }

    pub fn as_slice(&self) -> &[Department] {
        &self.departments
    }

    pub fn get(&self, id: &DeptId) -> Option<&Department> {
        self.departments.iter().find(|d| &d.id == id)
    }

    /// First department carrying `name`.
    pub fn find_by_name(&self, name: &str) -> Option<&Department> {
        self.departments.iter().find(|d| d.name == name)
    }

    /// Names feeding the relation matrices: every non-void department, in
    /// roster order.
    pub fn matrix_names(&self) -> Vec<String> {
        self.departments
            .iter()
            .filter(|d| !d.is_void())
            .map(|d| d.name.clone())
            .collect()
    }

    /// Validate and append a department. Returns the stored entity.
    pub fn add(&mut self, new: NewDepartment, grid_size: u32) -> Result<&Department> {
        let name = required_text("name", &new.name)?;
        let rect = new.rect;
        check_placement(rect, grid_size)?;

        let id = self.fresh_id();
        tracing::debug!(id = %id, name = %name, x = rect.x, y = rect.y, "department added");
        self.departments.push(Department {
            id,
            name,
            kind: new.kind,
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            locked: false,
            grid_size,
        });
        Ok(&self.departments[self.departments.len() - 1])
    }

    /// Parse the add form and append.
    pub fn add_from_form(&mut self, form: &DepartmentForm, grid_size: u32) -> Result<&Department> {
        let new = form.parse()?;
        self.add(new, grid_size)
    }

    /// Remove by id.
    pub fn remove(&mut self, id: &DeptId) -> Result<Department> {
        let index = self.index_of(id)?;
        let removed = self.departments.remove(index);
        tracing::debug!(id = %removed.id, name = %removed.name, "department removed");
        Ok(removed)
    }

    /// Flip the lock flag. Returns the new value.
    pub fn toggle_lock(&mut self, id: &DeptId) -> Result<bool> {
        let index = self.index_of(id)?;
        let dept = &mut self.departments[index];
        dept.locked = !dept.locked;
        Ok(dept.locked)
    }

    /// Move a department, clamping the target into `[0, resolution - size]`
    /// on each axis. Locked departments are rejected untouched.
    pub fn move_to(&mut self, id: &DeptId, x: i64, y: i64, resolution: u32) -> Result<GridPoint> {
        let index = self.index_of(id)?;
        let dept = &mut self.departments[index];
        if dept.locked {
            return Err(EditorError::Locked {
                name: dept.name.clone(),
            });
        }
        dept.x = clamp_axis(x, dept.width, resolution);
        dept.y = clamp_axis(y, dept.height, resolution);
        dept.grid_size = resolution;
        Ok(dept.position())
    }

    /// Replace the whole roster. Ids already used are never handed out again.
    pub fn replace_all(&mut self, departments: Vec<Department>) {
        for dept in &departments {
            if let Some(n) = id_suffix(dept.id.as_str(), "dept_") {
                self.next_id = self.next_id.max(n.saturating_add(1));
            }
        }
        self.departments = departments;
    }

    /// First department that would not fit a `grid_size` grid where it
    /// stands.
    pub fn check_fits(&self, grid_size: u32) -> Result<()> {
        match self
            .departments
            .iter()
            .find(|d| !d.rect().fits_within(grid_size, grid_size))
        {
            Some(dept) => Err(EditorError::validation(
                "gridSize",
                format!("{} does not fit a {grid_size}x{grid_size} grid", dept.name),
            )),
            None => Ok(()),
        }
    }

    /// Re-express every department in a new grid resolution. Coordinates are
    /// left as they are.
    pub fn restamp_grid_size(&mut self, grid_size: u32) {
        for dept in &mut self.departments {
            dept.grid_size = grid_size;
        }
    }

    /// Copy of the roster shifted so the smallest x and smallest y are zero.
    pub fn normalized_to_origin(&self) -> Vec<Department> {
        let min_x = self.departments.iter().map(|d| d.x).min().unwrap_or(0);
        let min_y = self.departments.iter().map(|d| d.y).min().unwrap_or(0);
        self.departments
            .iter()
            .map(|d| Department {
                x: d.x - min_x,
                y: d.y - min_y,
                ..d.clone()
            })
            .collect()
    }

    pub(crate) fn fresh_id(&mut self) -> DeptId {
        loop {
            let candidate = DeptId(format!("dept_{}", self.next_id));
            self.next_id = self.next_id.saturating_add(1);
            if self.get(&candidate).is_none() {
                return candidate;
            }
        }
    }

    fn index_of(&self, id: &DeptId) -> Result<usize> {
        self.departments
            .iter()
            .position(|d| &d.id == id)
            .ok_or_else(|| EditorError::UnknownDepartment { id: id.to_string() })
    }
}

fn check_placement(rect: GridRect, grid_size: u32) -> Result<()> {
    if rect.width == 0 {
        return Err(EditorError::validation("width", "must be greater than 0"));
    }
    if rect.height == 0 {
        return Err(EditorError::validation("height", "must be greater than 0"));
    }
    if !rect.fits_within(grid_size, grid_size) {
        return Err(EditorError::validation(
            "position",
            format!(
                "{}x{} at ({}, {}) exceeds the {grid_size}x{grid_size} grid",
                rect.width, rect.height, rect.x, rect.y
            ),
        ));
    }
    Ok(())
}

/// Clamp one axis of a candidate position into the grid. When the entity is
/// larger than the grid the only admissible position is 0.
#[inline]
pub(crate) fn clamp_axis(candidate: i64, size: u32, resolution: u32) -> u32 {
    let upper = (i64::from(resolution) - i64::from(size)).max(0);
    // upper <= u32::MAX, so the clamped value always fits.
    candidate.clamp(0, upper) as u32
}

pub(crate) fn id_suffix(id: &str, prefix: &str) -> Option<u64> {
    id.strip_prefix(prefix)?.parse().ok()
}

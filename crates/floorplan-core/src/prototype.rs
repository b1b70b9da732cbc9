#![forbid(unsafe_code)]

//! Unplaced department prototypes for the build-from-relations modes.
//!
//! A prototype carries only a name and a cell-area requirement; placing it
//! is the optimizer's job.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::department::{id_suffix, parse_int, required_text};
use crate::error::{EditorError, Result};

/// Session-unique prototype identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtoId(String);

impl ProtoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProtoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPrototype {
    pub id: ProtoId,
    pub name: String,
    pub cell_area: u32,
    /// Hint for the optimizer to keep this department where it is.
    #[serde(default)]
    pub fixed: bool,
}

/// Raw text of the add-prototype form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrototypeForm {
    pub name: String,
    pub area: String,
    pub fixed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PrototypeStore {
    prototypes: Vec<DepartmentPrototype>,
    next_id: u64,
}

impl PrototypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from saved prototypes: names required, areas positive,
    /// ids unique.
    pub fn restore(prototypes: Vec<DepartmentPrototype>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(prototypes.len());
        for proto in &prototypes {
            if !seen.insert(proto.id.clone()) {
                return Err(EditorError::validation(
                    "id",
                    format!("duplicate prototype id '{}'", proto.id),
                ));
            }
            required_text("name", &proto.name)?;
            if proto.cell_area == 0 {
                return Err(EditorError::validation("area", "must be greater than 0"));
            }
        }
        let mut store = Self::default();
        store.replace_all(prototypes);
        Ok(store)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DepartmentPrototype> {
        self.prototypes.iter()
    }

    pub fn as_slice(&self) -> &[DepartmentPrototype] {
        &self.prototypes
    }

    pub fn get(&self, id: &ProtoId) -> Option<&DepartmentPrototype> {
        self.prototypes.iter().find(|p| &p.id == id)
    }

    pub fn names(&self) -> Vec<String> {
        self.prototypes.iter().map(|p| p.name.clone()).collect()
    }

    /// Sum of all area requirements in cells.
    pub fn total_area(&self) -> u64 {
        self.prototypes.iter().map(|p| u64::from(p.cell_area)).sum()
    }

    pub fn add(&mut self, name: &str, cell_area: u32, fixed: bool) -> Result<&DepartmentPrototype> {
        let name = required_text("name", name)?;
        if cell_area == 0 {
            return Err(EditorError::validation("area", "must be greater than 0"));
        }
        let id = self.fresh_id();
        tracing::debug!(id = %id, name = %name, cell_area, "prototype added");
        self.prototypes.push(DepartmentPrototype {
            id,
            name,
            cell_area,
            fixed,
        });
        Ok(&self.prototypes[self.prototypes.len() - 1])
    }

    pub fn add_from_form(&mut self, form: &PrototypeForm) -> Result<&DepartmentPrototype> {
        let name = required_text("name", &form.name)?;
        let area = parse_int("area", &form.area)?;
        if area <= 0 {
            return Err(EditorError::validation("area", "must be greater than 0"));
        }
        let area = u32::try_from(area).map_err(|_| EditorError::validation("area", "out of range"))?;
        self.add(&name, area, form.fixed)
    }

    pub fn remove(&mut self, id: &ProtoId) -> Result<DepartmentPrototype> {
        let index = self.index_of(id)?;
        Ok(self.prototypes.remove(index))
    }

    /// Flip the `fixed` hint. Returns the new value.
    pub fn toggle_fixed(&mut self, id: &ProtoId) -> Result<bool> {
        let index = self.index_of(id)?;
        let proto = &mut self.prototypes[index];
        proto.fixed = !proto.fixed;
        Ok(proto.fixed)
    }

    pub fn replace_all(&mut self, prototypes: Vec<DepartmentPrototype>) {
        for proto in &prototypes {
            if let Some(n) = id_suffix(proto.id.as_str(), "proto_") {
                self.next_id = self.next_id.max(n.saturating_add(1));
            }
        }
        self.prototypes = prototypes;
    }

    fn fresh_id(&mut self) -> ProtoId {
        loop {
            let candidate = ProtoId(format!("proto_{}", self.next_id));
            self.next_id = self.next_id.saturating_add(1);
            if self.get(&candidate).is_none() {
                return candidate;
            }
        }
    }

    fn index_of(&self, id: &ProtoId) -> Result<usize> {
        self.prototypes
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| EditorError::UnknownPrototype { id: id.to_string() })
    }
}

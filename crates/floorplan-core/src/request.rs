#![forbid(unsafe_code)]

//! Request bodies sent to the optimizer service.
//!
//! These are plain data; building them from editor state (and validating
//! that state first) happens in [`crate::editor`].

use serde::{Deserialize, Serialize};

use crate::department::{Department, DeptKind};
use crate::mode::Mode;
use crate::prototype::DepartmentPrototype;
use crate::relation::Closeness;

/// Distance metric used to score CRAFT layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Rectilinear,
    Euclidean,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    pub user_id: String,
}

/// A project as acknowledged by the optimizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
}

/// One department in a CRAFT submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutDepartment {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub locked: bool,
    #[serde(rename = "type")]
    pub kind: DeptKind,
}

impl From<&Department> for LayoutDepartment {
    fn from(dept: &Department) -> Self {
        Self {
            name: dept.name.clone(),
            x: dept.x,
            y: dept.y,
            width: dept.width,
            height: dept.height,
            locked: dept.locked,
            kind: dept.kind,
        }
    }
}

/// Body of `POST {api_base}/craft/layout`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutRequest {
    pub name: String,
    pub grid_size: u32,
    pub project_id: String,
    pub departments: Vec<LayoutDepartment>,
    pub flow_matrix: Vec<Vec<f64>>,
    pub closeness_matrix: Vec<Vec<Closeness>>,
    pub metric: DistanceMetric,
}

/// One prototype in a CORELAP/ALDEP submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildDepartment {
    pub name: String,
    pub fixed: bool,
    pub area: u32,
}

impl From<&DepartmentPrototype> for BuildDepartment {
    fn from(proto: &DepartmentPrototype) -> Self {
        Self {
            name: proto.name.clone(),
            fixed: proto.fixed,
            area: proto.cell_area,
        }
    }
}

/// Numeric weight for each closeness rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosenessWeights {
    #[serde(rename = "A")]
    pub a: f64,
    #[serde(rename = "E")]
    pub e: f64,
    #[serde(rename = "I")]
    pub i: f64,
    #[serde(rename = "O")]
    pub o: f64,
    #[serde(rename = "U")]
    pub u: f64,
    #[serde(rename = "X")]
    pub x: f64,
}

impl ClosenessWeights {
    /// Conventional CORELAP closeness ratings.
    pub const CORELAP: Self = Self {
        a: 6.0,
        e: 5.0,
        i: 4.0,
        o: 3.0,
        u: 2.0,
        x: 1.0,
    };

    /// Conventional ALDEP scoring weights.
    pub const ALDEP: Self = Self {
        a: 64.0,
        e: 16.0,
        i: 4.0,
        o: 1.0,
        u: 0.0,
        x: -1024.0,
    };

    /// Default weights for a build algorithm. CRAFT does not use weights and
    /// gets the CORELAP table.
    #[must_use]
    pub const fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Aldep => Self::ALDEP,
            Mode::Craft | Mode::Corelap => Self::CORELAP,
        }
    }

    /// Weight of a rating. Blank cells weigh nothing.
    #[must_use]
    pub const fn weight(&self, rating: Closeness) -> f64 {
        match rating {
            Closeness::A => self.a,
            Closeness::E => self.e,
            Closeness::I => self.i,
            Closeness::O => self.o,
            Closeness::U => self.u,
            Closeness::X => self.x,
            Closeness::Blank => 0.0,
        }
    }
}

/// Algorithm knobs for build modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSettings {
    /// How many candidate layouts to ask for.
    pub candidates: u32,
    /// ALDEP vertical sweep width in cells.
    pub sweep_width: u32,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            candidates: 3,
            sweep_width: 2,
        }
    }
}

/// Body of `POST {api_base}/{corelap|aldep}/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    pub name: String,
    pub project_id: String,
    pub grid_width: u32,
    pub grid_height: u32,
    pub algorithm: Mode,
    pub departments: Vec<BuildDepartment>,
    pub closeness_matrix: Vec<Vec<Closeness>>,
    pub weights: ClosenessWeights,
    pub settings: BuildSettings,
}

/// A submission ready to hand to the optimizer.
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    Layout(LayoutRequest),
    Build(BuildRequest),
}

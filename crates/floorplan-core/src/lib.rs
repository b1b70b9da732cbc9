#![forbid(unsafe_code)]

//! Layout state engine for the floorplan editor.
//!
//! Users place rectangular departments on a square grid, describe how they
//! relate (numeric flow, closeness ratings) and hand the configuration to an
//! external optimizer (CRAFT, CORELAP or ALDEP). The optimizer's candidate
//! is previewed against the live layout and may be merged back in.
//!
//! This crate holds the state and its rules; it performs no I/O. Requests
//! leave the editor as [`editor::Effect`]s and responses come back as
//! [`editor::Msg`]s.
//!
//! # Modules
//!
//! - [`geometry`]: grid rectangles and the cell to pixel mapping.
//! - [`department`], [`prototype`]: placed and unplaced department stores.
//! - [`relation`]: flow and closeness matrices aligned with the roster.
//! - [`drag`]: pointer drags snapped to grid moves.
//! - [`mode`]: CRAFT / CORELAP / ALDEP and their grid settings.
//! - [`preview`]: candidate diff and merge.
//! - [`editor`]: the message loop tying everything together.

pub mod config;
pub mod department;
pub mod drag;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod mode;
pub mod preview;
pub mod prototype;
pub mod relation;
pub mod request;
pub mod snapshot;

pub use config::{ConfigError, EditorConfig, SyncConfig};
pub use department::{Department, DepartmentForm, DepartmentStore, DeptId, DeptKind};
pub use prototype::{DepartmentPrototype, ProtoId, PrototypeForm};
pub use editor::{Editor, Effect, Msg, RequestTag};
pub use error::{EditorError, Result};
pub use mode::Mode;
pub use preview::{DiffRow, OptimizationResult, Placement, Score, ScoreKind};
pub use relation::Closeness;
pub use snapshot::EditorSnapshot;

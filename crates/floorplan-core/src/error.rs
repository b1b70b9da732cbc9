use thiserror::Error;

use crate::mode::Mode;

pub type Result<T> = std::result::Result<T, EditorError>;

/// Failures raised by editor operations.
///
/// Every variant is a local, recoverable condition: the operation that
/// produced it has not mutated any store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    #[error("{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error("department not found: {id}")]
    UnknownDepartment { id: String },

    #[error("prototype not found: {id}")]
    UnknownPrototype { id: String },

    #[error("department is locked: {name}")]
    Locked { name: String },

    #[error("matrix index out of range: ({row}, {col}) in {size}x{size}")]
    IndexOutOfRange { row: usize, col: usize, size: usize },

    #[error("{matrix} matrix is {found}x{found}, expected {expected}x{expected}")]
    MatrixDimension {
        matrix: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("nothing to submit: the {what} list is empty")]
    EmptyRoster { what: &'static str },

    #[error("prototype area {total} exceeds the {width}x{height} grid")]
    AreaExceedsGrid { total: u64, width: u32, height: u32 },

    #[error("operation not available in {mode} mode")]
    WrongMode { mode: Mode },

    #[error("no optimization preview is pending")]
    NoPreview,

    #[error("no project has been created yet")]
    NoProject,
}

impl EditorError {
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Whether this is a form/bounds validation failure (as opposed to a
    /// missing entity or wrong-state condition).
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::MatrixDimension { .. }
                | Self::EmptyRoster { .. }
                | Self::AreaExceedsGrid { .. }
        )
    }
}

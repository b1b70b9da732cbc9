#![forbid(unsafe_code)]

//! Flow and closeness matrices kept aligned with the active name list.
//!
//! # Invariants
//!
//! 1. Both matrices are always `N x N`, where `N` is the length of the
//!    active name list.
//! 2. Whenever `N` changes the matrices are rebuilt from scratch: flow cells
//!    become `0`, closeness cells become blank, closeness diagonal becomes
//!    `X`. Values are not carried over, even for names that survived.
//! 3. After every closeness write the diagonal is `X`.
//! 4. Flow cells are finite and non-negative.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EditorError, Result};

/// Qualitative adjacency preference between two departments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Closeness {
    /// Absolutely necessary.
    A,
    /// Especially important.
    E,
    /// Important.
    I,
    /// Ordinary closeness.
    O,
    /// Unimportant.
    U,
    /// Not desirable.
    X,
    /// No preference.
    #[default]
    #[serde(rename = "")]
    Blank,
}

impl Closeness {
    /// Every rating, strongest first, blank last.
    pub const ALL: [Closeness; 7] = [
        Self::A,
        Self::E,
        Self::I,
        Self::O,
        Self::U,
        Self::X,
        Self::Blank,
    ];

    /// Parse a single-character rating. Case-insensitive; anything else,
    /// padding included, becomes [`Closeness::Blank`].
    #[must_use]
    pub fn from_input(raw: &str) -> Self {
        match raw.to_ascii_uppercase().as_str() {
            "A" => Self::A,
            "E" => Self::E,
            "I" => Self::I,
            "O" => Self::O,
            "U" => Self::U,
            "X" => Self::X,
            _ => Self::Blank,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::E => "E",
            Self::I => "I",
            Self::O => "O",
            Self::U => "U",
            Self::X => "X",
            Self::Blank => "",
        }
    }
}

impl fmt::Display for Closeness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coerce flow input text to a cell value. Non-numeric, non-finite and
/// negative input all become `0`.
#[must_use]
pub fn parse_flow(raw: &str) -> f64 {
    raw.trim().parse::<f64>().map_or(0.0, sanitize_flow)
}

#[inline]
fn sanitize_flow(value: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        0.0
    }
}

fn blank_closeness(n: usize) -> Vec<Vec<Closeness>> {
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| if i == j { Closeness::X } else { Closeness::Blank })
                .collect()
        })
        .collect()
}

fn is_square<T>(matrix: &[Vec<T>], n: usize) -> bool {
    matrix.len() == n && matrix.iter().all(|row| row.len() == n)
}

/// The two relation matrices plus the names that index them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationMatrices {
    names: Vec<String>,
    flow: Vec<Vec<f64>>,
    closeness: Vec<Vec<Closeness>>,
}

impl RelationMatrices {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh matrices for `names`.
    pub fn for_names(names: Vec<String>) -> Self {
        let n = names.len();
        Self {
            names,
            flow: vec![vec![0.0; n]; n],
            closeness: blank_closeness(n),
        }
    }

    /// Matrix dimension.
    #[inline]
    pub fn size(&self) -> usize {
        self.names.len()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn flow(&self) -> &[Vec<f64>] {
        &self.flow
    }

    pub fn closeness(&self) -> &[Vec<Closeness>] {
        &self.closeness
    }

    /// Align with a new active name list. Rebuilds both matrices when the
    /// length changes; otherwise only the labels are updated. Returns whether
    /// a rebuild happened.
    pub fn sync_names(&mut self, names: Vec<String>) -> bool {
        if names.len() == self.names.len() {
            self.names = names;
            return false;
        }
        tracing::debug!(from = self.names.len(), to = names.len(), "relation matrices rebuilt");
        *self = Self::for_names(names);
        true
    }

    /// Restore saved matrices. Matrices whose shape does not match `names`
    /// are replaced by fresh ones.
    pub fn restore(
        names: Vec<String>,
        flow: Vec<Vec<f64>>,
        closeness: Vec<Vec<Closeness>>,
    ) -> Self {
        let n = names.len();
        if !is_square(&flow, n) || !is_square(&closeness, n) {
            tracing::debug!(size = n, "saved matrices do not match roster; rebuilding");
            return Self::for_names(names);
        }
        let mut restored = Self {
            names,
            flow: flow
                .into_iter()
                .map(|row| row.into_iter().map(sanitize_flow).collect())
                .collect(),
            closeness,
        };
        restored.sanitize();
        restored
    }

    /// Write a flow cell from user text. Returns the stored value.
    pub fn set_flow_cell(&mut self, row: usize, col: usize, raw: &str) -> Result<f64> {
        self.set_flow(row, col, parse_flow(raw))
    }

    /// Write a flow cell. Invalid values are stored as `0`.
    pub fn set_flow(&mut self, row: usize, col: usize, value: f64) -> Result<f64> {
        self.check_index(row, col)?;
        let value = sanitize_flow(value);
        self.flow[row][col] = value;
        Ok(value)
    }

    /// Write a closeness cell from user text, then force the diagonal back
    /// to `X`. Returns the value the cell holds afterwards.
    pub fn set_closeness_cell(&mut self, row: usize, col: usize, raw: &str) -> Result<Closeness> {
        self.check_index(row, col)?;
        self.closeness[row][col] = Closeness::from_input(raw);
        self.sanitize();
        Ok(self.closeness[row][col])
    }

    /// Force every diagonal closeness cell to `X`.
    pub fn sanitize(&mut self) {
        for (i, row) in self.closeness.iter_mut().enumerate() {
            if let Some(cell) = row.get_mut(i) {
                *cell = Closeness::X;
            }
        }
    }

    /// Check both matrices are `expected x expected`.
    pub fn check_dimensions(&self, expected: usize) -> Result<()> {
        if !is_square(&self.flow, expected) {
            return Err(EditorError::MatrixDimension {
                matrix: "flow",
                expected,
                found: self.flow.len(),
            });
        }
        if !is_square(&self.closeness, expected) {
            return Err(EditorError::MatrixDimension {
                matrix: "closeness",
                expected,
                found: self.closeness.len(),
            });
        }
        Ok(())
    }

    fn check_index(&self, row: usize, col: usize) -> Result<()> {
        let size = self.size();
        if row >= size || col >= size {
            return Err(EditorError::IndexOutOfRange { row, col, size });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Closeness, RelationMatrices, parse_flow};
    use crate::error::EditorError;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn fresh_matrices_have_x_diagonal() {
        let m = RelationMatrices::for_names(names(&["A", "B", "C"]));
        assert_eq!(m.size(), 3);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(m.flow()[i][j], 0.0);
                let expected = if i == j { Closeness::X } else { Closeness::Blank };
                assert_eq!(m.closeness()[i][j], expected);
            }
        }
    }

    #[test]
    fn closeness_input_is_case_folded() {
        assert_eq!(Closeness::from_input("a"), Closeness::A);
        assert_eq!(Closeness::from_input("E"), Closeness::E);
        assert_eq!(Closeness::from_input(" e "), Closeness::Blank);
        assert_eq!(Closeness::from_input(" a"), Closeness::Blank);
        assert_eq!(Closeness::from_input("x"), Closeness::X);
        assert_eq!(Closeness::from_input(""), Closeness::Blank);
        assert_eq!(Closeness::from_input("b"), Closeness::Blank);
        assert_eq!(Closeness::from_input("AE"), Closeness::Blank);
        assert_eq!(Closeness::from_input("7"), Closeness::Blank);
    }

    #[test]
    fn closeness_write_cannot_override_diagonal() {
        let mut m = RelationMatrices::for_names(names(&["A", "B"]));
        assert_eq!(m.set_closeness_cell(0, 0, "a"), Ok(Closeness::X));
        assert_eq!(m.set_closeness_cell(0, 1, "i"), Ok(Closeness::I));
        assert_eq!(m.closeness()[1][0], Closeness::Blank);
        assert_eq!(m.set_closeness_cell(0, 1, "q"), Ok(Closeness::Blank));
    }

    #[test]
    fn flow_input_coerces_invalid_to_zero() {
        assert_eq!(parse_flow("12.5"), 12.5);
        assert_eq!(parse_flow("abc"), 0.0);
        assert_eq!(parse_flow("-3"), 0.0);
        assert_eq!(parse_flow("NaN"), 0.0);
        assert_eq!(parse_flow("inf"), 0.0);
        assert_eq!(parse_flow(""), 0.0);
    }

    #[test]
    fn out_of_range_writes_are_rejected() {
        let mut m = RelationMatrices::for_names(names(&["A", "B"]));
        assert_eq!(
            m.set_flow_cell(2, 0, "1"),
            Err(EditorError::IndexOutOfRange {
                row: 2,
                col: 0,
                size: 2
            })
        );
        assert!(m.set_closeness_cell(0, 5, "A").is_err());
    }

    #[test]
    fn size_change_resets_all_values() {
        let mut m = RelationMatrices::for_names(names(&["A", "B", "C"]));
        m.set_flow_cell(0, 1, "7").expect("write");
        m.set_closeness_cell(0, 1, "A").expect("write");
        assert!(m.sync_names(names(&["A", "B"])));
        assert_eq!(m, RelationMatrices::for_names(names(&["A", "B"])));
    }

    #[test]
    fn same_size_rename_keeps_values() {
        let mut m = RelationMatrices::for_names(names(&["A", "B"]));
        m.set_flow_cell(0, 1, "4").expect("write");
        assert!(!m.sync_names(names(&["A", "Z"])));
        assert_eq!(m.flow()[0][1], 4.0);
        assert_eq!(m.names(), names(&["A", "Z"]).as_slice());
    }

    #[test]
    fn restore_rebuilds_mismatched_shapes() {
        let restored = RelationMatrices::restore(
            names(&["A", "B"]),
            vec![vec![0.0, 3.0], vec![1.0]],
            vec![vec![Closeness::X, Closeness::A], vec![Closeness::A, Closeness::X]],
        );
        assert_eq!(restored, RelationMatrices::for_names(names(&["A", "B"])));
    }

    #[test]
    fn restore_sanitizes_diagonal_and_flow() {
        let restored = RelationMatrices::restore(
            names(&["A", "B"]),
            vec![vec![0.0, -3.0], vec![2.0, 0.0]],
            vec![vec![Closeness::A, Closeness::E], vec![Closeness::E, Closeness::U]],
        );
        assert_eq!(restored.flow()[0][1], 0.0);
        assert_eq!(restored.flow()[1][0], 2.0);
        assert_eq!(restored.closeness()[0][0], Closeness::X);
        assert_eq!(restored.closeness()[1][1], Closeness::X);
        assert_eq!(restored.closeness()[0][1], Closeness::E);
    }

    #[test]
    fn closeness_serializes_blank_as_empty_string() {
        let json = serde_json::to_string(&[Closeness::A, Closeness::Blank]).expect("serialize");
        assert_eq!(json, r#"["A",""]"#);
    }

    #[test]
    fn check_dimensions_reports_mismatch() {
        let m = RelationMatrices::for_names(names(&["A", "B"]));
        assert!(m.check_dimensions(2).is_ok());
        assert_eq!(
            m.check_dimensions(3),
            Err(EditorError::MatrixDimension {
                matrix: "flow",
                expected: 3,
                found: 2
            })
        );
    }
}

#![forbid(unsafe_code)]

//! Saved editor state.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::department::Department;
use crate::mode::Mode;
use crate::prototype::DepartmentPrototype;
use crate::relation::Closeness;
use crate::request::{BuildSettings, ClosenessWeights, Project};

fn default_name() -> String {
    "Untitled layout".to_string()
}

const fn default_grid_size() -> u32 {
    30
}

const fn default_build_axis() -> u32 {
    20
}

/// Everything needed to resume an editing session.
///
/// Missing fields take the editor defaults, so a file holding only
/// `departments` is a valid snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSnapshot {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default = "default_grid_size")]
    pub grid_size: u32,
    #[serde(default = "default_build_axis")]
    pub grid_width: u32,
    #[serde(default = "default_build_axis")]
    pub grid_height: u32,
    #[serde(default)]
    pub departments: Vec<Department>,
    #[serde(default)]
    pub prototypes: Vec<DepartmentPrototype>,
    #[serde(default)]
    pub flow_matrix: Vec<Vec<f64>>,
    #[serde(default)]
    pub closeness_matrix: Vec<Vec<Closeness>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weights: Option<ClosenessWeights>,
    #[serde(default)]
    pub settings: BuildSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
}

impl EditorSnapshot {
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(ConfigError::Json)
    }

    pub fn write_json_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = self.to_json_string()?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::EditorSnapshot;
    use crate::config::EditorConfig;
    use crate::department::DepartmentForm;
    use crate::editor::Editor;
    use crate::mode::Mode;
    use crate::relation::Closeness;

    #[test]
    fn minimal_snapshot_takes_defaults() {
        let snapshot = EditorSnapshot::from_json_str(
            r#"{"departments":[{"id":"dept_4","name":"A","x":1,"y":2,"width":3,"height":4,"gridSize":30}]}"#,
        )
        .expect("parse");
        assert_eq!(snapshot.mode, Mode::Craft);
        assert_eq!(snapshot.grid_size, 30);
        assert_eq!(snapshot.departments.len(), 1);
        assert!(!snapshot.departments[0].locked);

        let editor = Editor::from_snapshot(EditorConfig::default(), snapshot).expect("restore");
        assert_eq!(editor.relations().size(), 1);
        assert_eq!(editor.relations().closeness()[0][0], Closeness::X);
    }

    #[test]
    fn editor_state_survives_a_file_round_trip() {
        let mut editor = Editor::default();
        editor
            .add_department(&DepartmentForm {
                name: "Press".to_string(),
                width: "3".to_string(),
                height: "3".to_string(),
                x: "1".to_string(),
                y: "1".to_string(),
                kind: String::new(),
            })
            .expect("add");
        editor.set_flow_cell(0, 0, "2").expect("flow");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("layout.json");
        editor.snapshot().write_json_file(&path).expect("write");

        let loaded = EditorSnapshot::from_json_file(&path).expect("read");
        assert_eq!(loaded, editor.snapshot());
        let restored = Editor::from_snapshot(EditorConfig::default(), loaded).expect("restore");
        assert_eq!(restored.relations().flow()[0][0], 2.0);
        assert_eq!(restored.departments().len(), 1);
    }

    #[test]
    fn restore_checks_departments_like_add_does() {
        let overflowing = EditorSnapshot::from_json_str(
            r#"{"gridSize": 30, "departments": [
                {"id":"dept_1","name":"A","x":28,"y":0,"width":5,"height":2,"gridSize":30}
            ]}"#,
        )
        .expect("parse");
        let error = Editor::from_snapshot(EditorConfig::default(), overflowing)
            .expect_err("x + width exceeds the grid");
        assert!(error.is_validation());

        let flat = EditorSnapshot::from_json_str(
            r#"{"departments": [
                {"id":"dept_1","name":"A","x":0,"y":0,"width":0,"height":2,"gridSize":30}
            ]}"#,
        )
        .expect("parse");
        assert!(Editor::from_snapshot(EditorConfig::default(), flat).is_err());

        let duplicated = EditorSnapshot::from_json_str(
            r#"{"departments": [
                {"id":"dept_1","name":"A","x":0,"y":0,"width":2,"height":2,"gridSize":30},
                {"id":"dept_1","name":"B","x":4,"y":0,"width":2,"height":2,"gridSize":30}
            ]}"#,
        )
        .expect("parse");
        let error = Editor::from_snapshot(EditorConfig::default(), duplicated)
            .expect_err("duplicate id");
        assert_eq!(error.to_string(), "id: duplicate department id 'dept_1'");
    }

    #[test]
    fn restore_rejects_duplicate_prototype_ids() {
        let snapshot = EditorSnapshot::from_json_str(
            r#"{"mode": "corelap", "prototypes": [
                {"id":"proto_0","name":"Press","cellArea":4},
                {"id":"proto_0","name":"Weld","cellArea":4}
            ]}"#,
        )
        .expect("parse");
        assert!(Editor::from_snapshot(EditorConfig::default(), snapshot).is_err());
    }

    #[test]
    fn snapshot_with_invalid_grid_size_is_rejected() {
        let snapshot =
            EditorSnapshot::from_json_str(r#"{"gridSize": 2}"#).expect("parse");
        assert!(Editor::from_snapshot(EditorConfig::default(), snapshot).is_err());
    }
}

#![forbid(unsafe_code)]

//! Response-shape normalization.
//!
//! The optimizer's envelopes are not fixed: the same value may sit at the
//! top level, under `result` or under `data`, and ids may be strings or
//! numbers. Each function here probes a documented list of JSON pointers in
//! order and takes the first usable value.
//!
//! | Value        | Probe order                                                        |
//! |--------------|--------------------------------------------------------------------|
//! | project id   | `/id`, `/projectId`, `/project/id`, `/data/id`, `/data/project/id` |
//! | layout id    | `/layoutId`, `/layout_id`, `/id`, `/layout/id`, `/data/layoutId`, `/data/id`, `/data/layout/id` |
//! | placements   | `/assignment`, `/placements`, `/result/assignment`, `/result/placements`, `/data/assignment`, `/data/placements` |
//! | score        | `totalCost`, `totalDistance`, `score` at the top level, then in the envelope holding the placements |
//! | candidates   | `/candidates`, `/result/candidates`, `/data/candidates`, else the whole body as one result |
//!
//! Inside a placement entry the name is read from `name`, `department` or
//! `dept`, the size from `width`/`w` and `height`/`h`. Entries missing any of
//! these are skipped.

use floorplan_core::preview::{OptimizationResult, Placement, Score, ScoreKind};
use floorplan_core::request::Project;
use serde_json::Value;

use crate::error::{Result, SyncError};

const PROJECT_ID_PATHS: &[&str] = &[
    "/id",
    "/projectId",
    "/project/id",
    "/data/id",
    "/data/project/id",
];

const LAYOUT_ID_PATHS: &[&str] = &[
    "/layoutId",
    "/layout_id",
    "/id",
    "/layout/id",
    "/data/layoutId",
    "/data/id",
    "/data/layout/id",
];

/// Placement arrays, paired with the envelope their score lives in.
const PLACEMENT_PATHS: &[(&str, &str)] = &[
    ("/assignment", ""),
    ("/placements", ""),
    ("/result/assignment", "/result"),
    ("/result/placements", "/result"),
    ("/data/assignment", "/data"),
    ("/data/placements", "/data"),
];

const CANDIDATE_PATHS: &[&str] = &["/candidates", "/result/candidates", "/data/candidates"];

const SCORE_KEYS: &[(&str, ScoreKind)] = &[
    ("totalCost", ScoreKind::TotalCost),
    ("totalDistance", ScoreKind::TotalDistance),
    ("score", ScoreKind::Score),
];

/// An id given as a non-empty string or as an integer.
fn id_at(body: &Value, pointer: &str) -> Option<String> {
    match body.pointer(pointer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_id(body: &Value, paths: &[&str]) -> Option<String> {
    paths.iter().find_map(|path| id_at(body, path))
}

/// Project acknowledgement from `POST craft/project`. A response without a
/// name keeps the one that was requested.
pub fn project(body: &Value, requested_name: &str) -> Result<Project> {
    let id = first_id(body, PROJECT_ID_PATHS).ok_or_else(|| SyncError::missing("project id"))?;
    let name = ["/name", "/project/name", "/data/name"]
        .iter()
        .find_map(|path| body.pointer(path).and_then(Value::as_str))
        .unwrap_or(requested_name)
        .to_string();
    Ok(Project { id, name })
}

/// Layout id from `POST craft/layout`.
pub fn layout_id(body: &Value) -> Result<String> {
    first_id(body, LAYOUT_ID_PATHS).ok_or_else(|| SyncError::missing("layoutId"))
}

/// A grid coordinate: a non-negative integer, or a float rounded to one.
fn cell(entry: &Value, keys: &[&str]) -> Option<u32> {
    keys.iter().find_map(|key| {
        let value = entry.get(key)?;
        if let Some(n) = value.as_u64() {
            return u32::try_from(n).ok();
        }
        let f = value.as_f64()?;
        (f.is_finite() && f >= 0.0 && f <= f64::from(u32::MAX)).then(|| f.round() as u32)
    })
}

fn placement(entry: &Value) -> Option<Placement> {
    let name = ["name", "department", "dept"]
        .iter()
        .find_map(|key| entry.get(key).and_then(Value::as_str))?;
    Some(Placement {
        name: name.to_string(),
        x: cell(entry, &["x"])?,
        y: cell(entry, &["y"])?,
        width: cell(entry, &["width", "w"])?,
        height: cell(entry, &["height", "h"])?,
    })
}

fn score_in(envelope: &Value) -> Option<Score> {
    SCORE_KEYS.iter().find_map(|(key, kind)| {
        let value = envelope.get(key)?.as_f64()?;
        Some(Score { kind: *kind, value })
    })
}

/// One optimizer result: `craft/result`, or a single build candidate.
pub fn result(body: &Value) -> Result<OptimizationResult> {
    let (entries, envelope) = PLACEMENT_PATHS
        .iter()
        .find_map(|(path, envelope)| {
            let entries = body.pointer(path)?.as_array()?;
            Some((entries, *envelope))
        })
        .ok_or(SyncError::NoPlacements)?;

    let placements: Vec<Placement> = entries.iter().filter_map(placement).collect();
    if placements.len() < entries.len() {
        tracing::debug!(
            skipped = entries.len() - placements.len(),
            "skipped malformed placement entries"
        );
    }
    if placements.is_empty() {
        return Err(SyncError::NoPlacements);
    }

    let score = score_in(body).or_else(|| body.pointer(envelope).and_then(score_in));
    Ok(OptimizationResult { placements, score })
}

/// Build-mode response: every usable candidate in the order returned.
/// Falls back to reading the whole body as a single result.
pub fn candidates(body: &Value) -> Result<Vec<OptimizationResult>> {
    let listed = CANDIDATE_PATHS
        .iter()
        .find_map(|path| body.pointer(path)?.as_array());

    let Some(listed) = listed else {
        return result(body).map(|single| vec![single]);
    };

    let parsed: Vec<OptimizationResult> = listed
        .iter()
        .filter_map(|candidate| match result(candidate) {
            Ok(parsed) => Some(parsed),
            Err(error) => {
                tracing::debug!(%error, "skipped unusable candidate");
                None
            }
        })
        .collect();
    if parsed.is_empty() {
        return Err(SyncError::NoPlacements);
    }
    Ok(parsed)
}

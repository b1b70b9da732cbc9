#![forbid(unsafe_code)]

//! Subcommand bodies. Each drives an [`Editor`] restored from a snapshot
//! through the same messages the interactive editor would send.

use std::io::Write;
use std::path::{Path, PathBuf};

use floorplan_core::config::ConfigError;
use floorplan_core::editor::{Editor, Effect, Msg};
use floorplan_core::preview::{DiffRow, Score, ScoreKind};
use floorplan_core::{EditorConfig, EditorSnapshot, Mode};
use floorplan_sync::{SyncClient, normalize};
use serde::Serialize;
use serde_json::Value;

use crate::cli::{DiffArgs, GlobalOpts, ModeArg, RunArgs, ValidateArgs};
use crate::error::{CliError, Result};

/// What a preview would change, as printed by `run` and `diff`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewReport {
    pub mode: Mode,
    pub candidates: usize,
    pub selected: usize,
    pub score: Option<Score>,
    pub diff: Vec<DiffRow>,
    pub applied: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub mode: Mode,
    pub departments: usize,
    pub prototypes: usize,
    pub names: Vec<String>,
}

pub fn load_config(opts: &GlobalOpts) -> Result<EditorConfig> {
    let mut config = match &opts.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    if let Some(api_base) = &opts.api_base {
        config.sync.api_base = api_base.clone();
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(ConfigError::Validation(errors).into());
        }
    }
    Ok(config)
}

pub fn load_editor(opts: &GlobalOpts, snapshot: &Path, mode: Option<ModeArg>) -> Result<Editor> {
    let config = load_config(opts)?;
    let snapshot = EditorSnapshot::from_json_file(snapshot)?;
    let mut editor = Editor::from_snapshot(config, snapshot)?;
    if let Some(mode) = mode {
        editor.select_mode(mode.into());
    }
    tracing::debug!(
        mode = %editor.mode(),
        departments = editor.departments().len(),
        prototypes = editor.prototypes().len(),
        "snapshot loaded"
    );
    Ok(editor)
}

pub fn run_validate(opts: &GlobalOpts, args: ValidateArgs, out: &mut dyn Write) -> Result<()> {
    let editor = load_editor(opts, &args.snapshot, args.mode)?;
    editor.validate_submission()?;
    let report = ValidationReport {
        mode: editor.mode(),
        departments: editor.departments().len(),
        prototypes: editor.prototypes().len(),
        names: editor.active_names(),
    };
    if opts.json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        writeln!(
            out,
            "ok: {} snapshot with {} relation rows ({})",
            report.mode,
            report.names.len(),
            report.names.join(", ")
        )?;
    }
    Ok(())
}

pub fn run_diff(opts: &GlobalOpts, args: DiffArgs, out: &mut dyn Write) -> Result<()> {
    let mut editor = load_editor(opts, &args.snapshot, args.mode)?;
    let body: Value = serde_json::from_str(&std::fs::read_to_string(&args.result)?)?;
    let candidates = normalize::candidates(&body)?;
    let tag = editor.request_tag();
    editor.update(Msg::CandidatesReceived { tag, candidates });

    select(&mut editor, args.candidate)?;
    let mut report = preview_report(&editor);
    if let Some(path) = args.apply {
        if let Effect::SyncLayout(departments) = editor.update(Msg::ApplyPreview) {
            tracing::debug!(count = departments.len(), "offline: live layout sync skipped");
        }
        raise_alert(&editor, 2)?;
        editor.snapshot().write_json_file(&path)?;
        report.applied = Some(path);
    }
    print_preview(opts, &report, out)
}

pub fn run_optimize(opts: &GlobalOpts, args: RunArgs, out: &mut dyn Write) -> Result<()> {
    let mut editor = load_editor(opts, &args.snapshot, args.mode)?;
    editor.validate_submission()?;
    let client = SyncClient::new(&editor.config().sync)?;
    tracing::info!(mode = %editor.mode(), api_base = client.api_base(), "submitting layout");

    client.dispatch(&mut editor, Msg::Optimize);
    raise_alert(&editor, 3)?;

    select(&mut editor, args.candidate)?;
    let mut report = preview_report(&editor);
    if let Some(path) = args.apply {
        client.dispatch(&mut editor, Msg::ApplyPreview);
        raise_alert(&editor, 2)?;
        editor.snapshot().write_json_file(&path)?;
        report.applied = Some(path);
    }
    print_preview(opts, &report, out)
}

fn raise_alert(editor: &Editor, code: i32) -> Result<()> {
    match editor.alert() {
        Some(alert) => Err(CliError::exit(code, alert)),
        None => Ok(()),
    }
}

fn select(editor: &mut Editor, index: usize) -> Result<()> {
    let available = editor.preview().candidates().len();
    if index >= available {
        return Err(CliError::invalid(format!(
            "candidate {index} requested but {available} available"
        )));
    }
    editor.update(Msg::SelectCandidate(index));
    Ok(())
}

fn preview_report(editor: &Editor) -> PreviewReport {
    let preview = editor.preview();
    PreviewReport {
        mode: editor.mode(),
        candidates: preview.candidates().len(),
        selected: preview.selected_index(),
        score: preview.selected().and_then(|candidate| candidate.score),
        diff: editor.preview_diff(),
        applied: None,
    }
}

fn score_label(score: Score) -> String {
    let kind = match score.kind {
        ScoreKind::TotalCost => "total cost",
        ScoreKind::TotalDistance => "total distance",
        ScoreKind::Score => "score",
    };
    format!("{kind} {}", score.value)
}

fn print_preview(opts: &GlobalOpts, report: &PreviewReport, out: &mut dyn Write) -> Result<()> {
    if opts.json {
        writeln!(out, "{}", serde_json::to_string_pretty(report)?)?;
        return Ok(());
    }

    let score = report.score.map(score_label).unwrap_or_else(|| "unscored".to_string());
    writeln!(
        out,
        "{} preview: candidate {} of {}, {score}",
        report.mode,
        report.selected + 1,
        report.candidates
    )?;
    if report.diff.is_empty() {
        writeln!(out, "  no position changes")?;
    }
    for row in &report.diff {
        writeln!(
            out,
            "  {}: ({}, {}) -> ({}, {})",
            row.name, row.from.x, row.from.y, row.to.x, row.to.y
        )?;
    }
    if let Some(path) = &report.applied {
        writeln!(out, "applied: {}", path.display())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use floorplan_core::preview::{Score, ScoreKind};

    use super::{load_config, score_label};
    use crate::cli::GlobalOpts;
    use crate::error::CliError;

    #[test]
    fn api_base_override_wins_over_default() {
        let config = load_config(&GlobalOpts {
            api_base: Some("http://optimizer/api".to_string()),
            ..GlobalOpts::default()
        })
        .expect("config");
        assert_eq!(config.sync.api_base, "http://optimizer/api");
    }

    #[test]
    fn blank_api_base_override_is_rejected() {
        let error = load_config(&GlobalOpts {
            api_base: Some("  ".to_string()),
            ..GlobalOpts::default()
        })
        .expect_err("blank base");
        assert!(matches!(error, CliError::Config(_)));
    }

    #[test]
    fn score_labels_name_the_quantity() {
        assert_eq!(
            score_label(Score {
                kind: ScoreKind::TotalCost,
                value: 42.5
            }),
            "total cost 42.5"
        );
    }
}

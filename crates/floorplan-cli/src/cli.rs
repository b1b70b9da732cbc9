use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use floorplan_core::Mode;

use crate::commands::{run_diff, run_optimize, run_validate};
use crate::error::Result;

#[derive(Debug, Parser)]
#[command(
    name = "floorplan",
    about = "Validate floorplan snapshots and round-trip them through the layout optimizer",
    version
)]
pub struct Cli {
    /// Editor configuration (TOML, or JSON by extension).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the optimizer API base URL.
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Submit a snapshot to the optimizer and preview the result.
    Run(RunArgs),

    /// Preview a saved optimizer response against a snapshot, offline.
    Diff(DiffArgs),

    /// Check a snapshot can be submitted.
    Validate(ValidateArgs),
}

/// Mode names as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    Craft,
    Corelap,
    Aldep,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Craft => Mode::Craft,
            ModeArg::Corelap => Mode::Corelap,
            ModeArg::Aldep => Mode::Aldep,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Editor snapshot (JSON).
    pub snapshot: PathBuf,

    /// Switch to this mode before submitting.
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Candidate to preview when the optimizer returns several.
    #[arg(long, default_value_t = 0)]
    pub candidate: usize,

    /// Accept the preview and write the merged snapshot here.
    #[arg(long)]
    pub apply: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct DiffArgs {
    /// Editor snapshot (JSON).
    pub snapshot: PathBuf,

    /// Saved optimizer response (any accepted envelope).
    pub result: PathBuf,

    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    #[arg(long, default_value_t = 0)]
    pub candidate: usize,

    #[arg(long)]
    pub apply: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct ValidateArgs {
    /// Editor snapshot (JSON).
    pub snapshot: PathBuf,

    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    pub config: Option<PathBuf>,
    pub api_base: Option<String>,
    pub json: bool,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    crate::logging::init(cli.log_json);
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}

pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    let opts = GlobalOpts {
        config: cli.config,
        api_base: cli.api_base,
        json: cli.json,
    };
    match cli.command {
        Commands::Run(args) => run_optimize(&opts, args, out),
        Commands::Diff(args) => run_diff(&opts, args, out),
        Commands::Validate(args) => run_validate(&opts, args, out),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::{Cli, Commands, ModeArg, ValidateArgs, run};
    use crate::error::CliError;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "floorplan",
            "run",
            "layout.json",
            "--mode",
            "aldep",
            "--json",
            "--api-base",
            "http://optimizer:8000/api",
        ])
        .expect("parse");
        assert!(cli.json);
        assert_eq!(cli.api_base.as_deref(), Some("http://optimizer:8000/api"));
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.mode, Some(ModeArg::Aldep));
                assert_eq!(args.candidate, 0);
                assert_eq!(args.snapshot, PathBuf::from("layout.json"));
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn unknown_mode_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["floorplan", "validate", "x.json", "--mode", "slp"]).is_err());
    }

    #[test]
    fn validate_dispatches_missing_file_error() {
        let mut out = Vec::new();
        let result = run(
            Cli {
                config: None,
                api_base: None,
                json: false,
                log_json: false,
                command: Commands::Validate(ValidateArgs {
                    snapshot: PathBuf::from("/tmp/floorplan-cli/does-not-exist.json"),
                    mode: None,
                }),
            },
            &mut out,
        );
        match result.expect_err("missing snapshot should fail") {
            CliError::Config(_) => {}
            other => panic!("expected Config error, got {other}"),
        }
        assert!(out.is_empty());
    }
}

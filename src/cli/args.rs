//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Baton - Run reporting workflows step by step.
#[derive(Debug, Parser)]
#[command(name = "baton")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config file (overrides default .baton/config.yml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the workflow (default if no command specified)
    Run(RunArgs),

    /// List the steps of the workflow
    List(ListArgs),

    /// Check which input files are covered by uploads
    Check(CheckArgs),

    /// Show past runs
    History(HistoryArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RunArgs {
    /// Input file to upload before the run (repeatable)
    #[arg(short, long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,

    /// Refuse to start unless every required input has an upload
    #[arg(long)]
    pub strict: bool,

    /// Run independent steps concurrently
    #[arg(long)]
    pub graph: bool,

    /// Multiply every simulated step duration (0 runs instantly)
    #[arg(long, value_name = "FACTOR", value_parser = parse_time_scale)]
    pub time_scale: Option<f64>,

    /// Approve review steps without asking
    #[arg(short = 'y', long)]
    pub auto_approve: bool,

    /// Make a step fail (repeatable)
    #[arg(long, value_name = "STEP")]
    pub fail: Vec<String>,

    /// Print the final run state as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `list` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `check` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct CheckArgs {
    /// Input file to check (repeatable)
    #[arg(short, long = "file", value_name = "PATH")]
    pub files: Vec<PathBuf>,
}

/// Arguments for the `history` command.
#[derive(Debug, Clone, clap::Args)]
pub struct HistoryArgs {
    /// Number of runs to show
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl Default for HistoryArgs {
    fn default() -> Self {
        Self {
            limit: 10,
            json: false,
        }
    }
}

fn parse_time_scale(value: &str) -> Result<f64, String> {
    let scale: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !scale.is_finite() || scale < 0.0 {
        return Err(format!("'{}' must be a finite number >= 0", value));
    }
    Ok(scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn time_scale_rejects_negative_and_non_finite() {
        for bad in ["-1", "inf", "NaN", "fast"] {
            assert!(
                Cli::try_parse_from(["baton", "run", "--time-scale", bad]).is_err(),
                "{bad} was accepted"
            );
        }
        let cli = Cli::try_parse_from(["baton", "run", "--time-scale", "1e300"]).unwrap();
        let Some(Commands::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.time_scale, Some(1e300));
    }

    #[test]
    fn no_subcommand_parses() {
        let cli = Cli::try_parse_from(["baton"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn run_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "baton",
            "run",
            "-f",
            "Budget_Data.xlsx",
            "--file",
            "notes.pdf",
            "--fail",
            "step-3",
            "--graph",
            "--time-scale",
            "0.5",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.files.len(), 2);
                assert_eq!(args.fail, ["step-3"]);
                assert!(args.graph);
                assert!(!args.strict);
                assert_eq!(args.time_scale, Some(0.5));
            }
            other => panic!("expected run, got {:?}", other),
        }
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = Cli::try_parse_from(["baton", "list", "--quiet", "--no-color"]).unwrap();
        assert!(cli.quiet);
        assert!(cli.no_color);
    }

    #[test]
    fn history_limit_defaults_to_ten() {
        let cli = Cli::try_parse_from(["baton", "history"]).unwrap();
        match cli.command {
            Some(Commands::History(args)) => assert_eq!(args.limit, 10),
            other => panic!("expected history, got {:?}", other),
        }
    }

    #[test]
    fn rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["baton", "deploy"]).is_err());
    }
}

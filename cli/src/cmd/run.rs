use std::path::PathBuf;

use solbench_core::{
    action::{self, RunRequest},
    config::Config,
    puzzle::PuzzleId,
    style,
    verify::RunReport,
};

use super::{ArgBaseline, ArgProvider, GlobalArgs, SubcmdResult};
use crate::config;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Puzzle id, zero-padded to two digits ("9" => "09").
    pub puzzle: PuzzleId,

    /// Input file passed to every solution [default: <root>/inputs/<puzzle>.txt]
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Write the JSON report here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(short, long, value_enum)]
    pub baseline: Option<ArgBaseline>,

    /// Number of solutions run at once.
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Execution time limit per solution.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Only run solutions of this provider kind.
    #[arg(long, value_enum)]
    pub only: Option<ArgProvider>,

    /// Only run these languages (repeatable).
    #[arg(short, long)]
    pub lang: Vec<String>,

    /// Exit with code 1 unless every solution matches the baseline.
    #[arg(long)]
    pub strict: bool,
}

impl Args {
    fn apply(&self, cfg: &mut Config) {
        if let Some(baseline) = self.baseline {
            cfg.run.baseline = baseline.into();
        }
        if let Some(jobs) = self.jobs {
            cfg.run.jobs = jobs;
        }
        if let Some(ms) = self.timeout_ms {
            cfg.run.timeout.execute_ms = ms;
        }
    }
}

pub async fn exec(args: &Args, global_args: &GlobalArgs) -> SubcmdResult {
    let mut cfg = config::load_config(&global_args.root)?;
    args.apply(&mut cfg);

    let req = RunRequest {
        puzzle: args.puzzle.clone(),
        root: global_args.root.clone(),
        input: args.input.clone(),
        only: args.only.map(Into::into),
        languages: args.lang.clone(),
        show_progress: !global_args.quiet,
    };

    let report = action::run_puzzle(&req, &cfg).await?;
    action::write_report(&report, args.output.as_deref())?;

    if !global_args.quiet {
        style::print_run_summary(&report);
    }

    if args.strict && !all_accepted(&report) {
        anyhow::bail!(
            "{}/{} solutions did not match the baseline",
            report.summary.total - accepted_count(&report),
            report.summary.total
        );
    }
    Ok(())
}

fn accepted_count(report: &RunReport) -> usize {
    report
        .results
        .iter()
        .filter(|r| r.matches_baseline == Some(true))
        .count()
}

fn all_accepted(report: &RunReport) -> bool {
    report.baseline.is_some() && accepted_count(report) == report.summary.total
}

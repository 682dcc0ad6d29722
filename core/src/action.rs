pub mod error {
    #[allow(unused_imports)]
    pub(crate) use anyhow::{anyhow, bail, ensure, Context as _};
    pub use anyhow::{Error, Result};
}
use std::path::{Path, PathBuf};
use std::time::Duration;

use error::*;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::harness::Coordinator;
use crate::locator::{self, ProviderKind, SolutionEntry};
use crate::puzzle::PuzzleId;
use crate::verify::{self, RunMeta, RunReport};

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub puzzle: PuzzleId,
    pub root: PathBuf,

    /// Defaults to `<root>/<input_dir>/<puzzle>.txt`.
    pub input: Option<PathBuf>,

    pub only: Option<ProviderKind>,

    /// Language directory names to keep. Empty keeps all.
    pub languages: Vec<String>,

    pub show_progress: bool,
}

impl RunRequest {
    pub fn new(puzzle: PuzzleId, root: impl Into<PathBuf>) -> Self {
        Self {
            puzzle,
            root: root.into(),
            input: None,
            only: None,
            languages: Vec::new(),
            show_progress: false,
        }
    }
}

pub fn init_config(dir: impl AsRef<Path>) -> Result<PathBuf> {
    Config::init_example(dir).context("Failed to init config")
}

pub fn resolve_input_file(req: &RunRequest, cfg: &Config) -> Result<PathBuf> {
    let input_file = match &req.input {
        Some(path) => path.to_owned(),
        None => req
            .root
            .join(&cfg.locate.input_dir)
            .join(format!("{}.txt", req.puzzle)),
    };
    ensure!(
        input_file.is_file(),
        "Input file not found: {}",
        input_file.to_string_lossy()
    );
    Ok(input_file)
}

/// Located entries narrowed by provider kind and language.
pub fn locate_entries(req: &RunRequest, cfg: &Config) -> Result<Vec<SolutionEntry>> {
    let entries = locator::locate(&req.puzzle, &req.root, &cfg.locate)
        .with_context(|| format!("Failed to locate solutions for puzzle {}", req.puzzle))?;

    let entries: Vec<_> = entries
        .into_iter()
        .filter(|e| req.only.map(|p| p == e.provider).unwrap_or(true))
        .filter(|e| {
            req.languages.is_empty() || req.languages.iter().any(|l| l == e.language.dir_name())
        })
        .collect();

    if entries.is_empty() {
        bail!(
            "No solutions for puzzle {} matched the filters (only: {}, languages: [{}])",
            req.puzzle,
            req.only
                .map(|p| p.to_string())
                .unwrap_or_else(|| "any".to_owned()),
            req.languages.join(", ")
        );
    }
    Ok(entries)
}

/// Locates, runs and verifies every solution of one puzzle.
pub async fn run_puzzle(req: &RunRequest, cfg: &Config) -> Result<RunReport> {
    let input_file = self::resolve_input_file(req, cfg)?;
    let entries = self::locate_entries(req, cfg)?;

    log::info!(
        "Running {} solutions for puzzle {} with {}",
        entries.len(),
        req.puzzle,
        input_file.to_string_lossy()
    );

    let mut coordinator = Coordinator::from_config(cfg);
    let bar = req.show_progress.then(|| {
        let style = ProgressStyle::default_bar()
            .template("{spinner} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        let bar = ProgressBar::new(entries.len() as u64).with_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));
        bar
    });
    if let Some(bar) = &bar {
        coordinator = coordinator.progress(bar.clone());
    }

    let results = coordinator.run_all(&entries, &input_file).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let baseline = verify::select(&results, cfg.run.baseline);
    let meta = RunMeta::collect(req.puzzle.clone(), input_file, &req.root, cfg.run.baseline)
        .context("Failed to collect run metadata")?;
    Ok(RunReport::aggregate(meta, results, baseline))
}

/// Pretty JSON to `output`, or to stdout when `None`.
pub fn write_report(report: &RunReport, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => fsutil::write_json_pretty_with_mkdir(path, report)
            .with_context(|| format!("Failed to write report to {}", path.to_string_lossy())),
        None => {
            let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
            println!("{}", json);
            Ok(())
        }
    }
}

use std::{path::Path, sync::Arc};

use indicatif::ProgressBar;
use tokio::sync::Semaphore;

use super::{
    error::RunError,
    result::{CaptureLimits, ExecutionResult},
    runner::{self, RunContext, Runner},
    stats::{self, CodeStats},
};
use crate::config::Config;
use crate::locator::SolutionEntry;

/// Runs every entry through its runner and collects one result per entry, in entry order.
#[derive(Clone)]
pub struct Coordinator {
    ctx: Arc<RunContext>,
    jobs: usize,
    capture: CaptureLimits,
    progress: Option<ProgressBar>,
}

impl Coordinator {
    pub fn new(ctx: RunContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            jobs: 1,
            capture: CaptureLimits::default(),
            progress: None,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(RunContext::from_config(cfg))
            .jobs(cfg.run.jobs)
            .capture_limits(CaptureLimits {
                stdout_max_bytes: cfg.run.stdout_capture_max_bytes,
                stderr_max_bytes: cfg.run.stderr_capture_max_bytes,
            })
    }

    /// Max number of entries running at once. `0` is treated as `1`.
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn capture_limits(mut self, capture: CaptureLimits) -> Self {
        self.capture = capture;
        self
    }

    /// Ticked once per finished entry.
    pub fn progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub async fn run_all(&self, entries: &[SolutionEntry], input_file: &Path) -> Vec<ExecutionResult> {
        let input_file = Arc::new(runner::absolute(input_file).unwrap_or_else(|e| {
            log::warn!("{}", e);
            input_file.to_owned()
        }));
        let semaphore = Arc::new(Semaphore::new(self.jobs));

        let handles: Vec<_> = entries
            .iter()
            .cloned()
            .map(|entry| {
                let semaphore = semaphore.clone();
                let input_file = input_file.clone();
                let ctx = self.ctx.clone();
                let capture = self.capture;
                let progress = self.progress.clone();

                tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    let res = run_entry(entry, &input_file, &ctx, &capture).await;
                    if let Some(bar) = progress {
                        bar.set_message(res.entry.label());
                        bar.inc(1);
                    }
                    res
                })
            })
            .collect();

        let mut results = Vec::with_capacity(entries.len());
        for (entry, handle) in entries.iter().zip(handles) {
            let res = match handle.await {
                Ok(res) => res,
                Err(e) => ExecutionResult::new(
                    entry.to_owned(),
                    Err(RunError::Unexpected(anyhow::anyhow!("Worker task failed: {}", e))),
                    CodeStats::default(),
                    &self.capture,
                ),
            };
            results.push(res);
        }
        results
    }
}

/// Runs a single entry. Never fails: every error ends up in the returned result.
pub async fn run_entry(
    entry: SolutionEntry,
    input_file: &Path,
    ctx: &RunContext,
    capture: &CaptureLimits,
) -> ExecutionResult {
    let code_stats = {
        let dir = entry.directory.clone();
        let language = entry.language.clone();
        tokio::task::spawn_blocking(move || stats::compute(&dir, &language))
            .await
            .unwrap_or_else(|e| {
                log::warn!("Failed to collect code stats of {}: {}", entry.label(), e);
                CodeStats::default()
            })
    };

    let (outcome, warnings) = match Runner::for_language(&entry.language) {
        Some(runner) => {
            log::debug!("Running {} with the {} runner", entry.label(), runner);
            let warnings = runner.install(&entry.directory, ctx).await;
            (runner.run(&entry.directory, input_file, ctx).await, warnings)
        }
        None => (
            Err(RunError::UnknownLanguage(entry.language.to_string())),
            Vec::new(),
        ),
    };
    if let Err(e) = &outcome {
        log::info!("{}: {}", entry.label(), e);
    }

    ExecutionResult::new(entry, outcome, code_stats, capture).with_warnings(warnings)
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::*;
    use crate::harness::error::FailureKind;
    use crate::locator::{Language, ProviderKind};

    fn python_entry(root: &Path, author: &str, script: &str) -> SolutionEntry {
        let directory = root.join(author).join("python");
        fsutil::write_with_mkdir(directory.join("main.py"), script).unwrap();
        SolutionEntry {
            author: author.into(),
            language: Language::Python,
            provider: ProviderKind::Contributed,
            directory,
        }
    }

    fn input(root: &Path) -> PathBuf {
        let path = root.join("input.txt");
        fsutil::write(&path, "10\n").unwrap();
        path
    }

    #[tokio::test]
    async fn results_follow_entry_order_not_completion_order() {
        let root = tempfile::tempdir().unwrap();
        let entries: Vec<_> = [("slow", 0.6), ("medium", 0.3), ("fast", 0.0)]
            .iter()
            .map(|(name, secs)| {
                python_entry(
                    root.path(),
                    name,
                    &format!("import time\ntime.sleep({})\nprint('{}')\n", secs, name),
                )
            })
            .collect();

        let results = Coordinator::new(RunContext::default())
            .jobs(4)
            .run_all(&entries, &input(root.path()))
            .await;

        assert_eq!(results.len(), entries.len());
        for (res, entry) in results.iter().zip(&entries) {
            assert_eq!(&res.entry, entry);
            assert_eq!(res.stdout, entry.author);
            assert!(res.success);
        }
    }

    #[tokio::test]
    async fn unknown_language_is_a_failed_result() {
        let root = tempfile::tempdir().unwrap();
        let directory = root.path().join("human/go");
        fsutil::mkdir_all(&directory).unwrap();
        let entry = SolutionEntry {
            author: "human".into(),
            language: Language::Other("go".into()),
            provider: ProviderKind::Reference,
            directory,
        };

        let results = Coordinator::new(RunContext::default())
            .run_all(&[entry], &input(root.path()))
            .await;
        assert!(!results[0].success);
        assert_eq!(results[0].failure, Some(FailureKind::UnknownLanguage));
        assert_eq!(results[0].error.as_deref(), Some("Unknown language: go"));
    }

    #[tokio::test]
    async fn deterministic_entry_is_idempotent() {
        let root = tempfile::tempdir().unwrap();
        let entry = python_entry(
            root.path(),
            "model",
            "import sys\nn = int(open(sys.argv[1]).read())\nprint(sum(range(n)))\n",
        );
        let coordinator = Coordinator::new(RunContext::default());
        let input = input(root.path());

        let first = coordinator.run_all(&[entry.clone()], &input).await;
        let second = coordinator.run_all(&[entry], &input).await;
        assert_eq!(first[0].stdout, "45");
        assert_eq!(first[0].stdout, second[0].stdout);
    }

    const RUST_SUM: &str = r#"
fn main() {
    let path = std::env::args().nth(1).unwrap();
    let n: u64 = std::fs::read_to_string(path).unwrap().trim().parse().unwrap();
    println!("{}", (0..n).sum::<u64>());
}
"#;

    fn rust_entry(root: &Path, author: &str, files: &[(&str, &str)]) -> SolutionEntry {
        let directory = root.join(author).join("rust");
        for (name, contents) in files {
            fsutil::write_with_mkdir(directory.join(name), contents).unwrap();
        }
        SolutionEntry {
            author: author.into(),
            language: Language::Rust,
            provider: ProviderKind::Contributed,
            directory,
        }
    }

    #[tokio::test]
    async fn cargo_entry_is_idempotent_with_reused_target_dir() {
        let root = tempfile::tempdir().unwrap();
        let entry = rust_entry(
            root.path(),
            "model",
            &[
                (
                    "Cargo.toml",
                    "[package]\nname = \"sum\"\nversion = \"0.1.0\"\nedition = \"2021\"\n",
                ),
                ("src/main.rs", RUST_SUM),
            ],
        );
        let coordinator = Coordinator::new(RunContext::default());
        let input = input(root.path());

        let first = dbg!(coordinator.run_all(&[entry.clone()], &input).await);
        assert!(entry.directory.join("target/release").is_dir());
        let second = dbg!(coordinator.run_all(&[entry], &input).await);

        assert!(first[0].success && second[0].success);
        assert_eq!(first[0].stdout, "45");
        assert_eq!(first[0].stdout, second[0].stdout);
    }

    #[tokio::test]
    async fn single_file_rust_entry_is_idempotent_and_leaves_no_binary() {
        let root = tempfile::tempdir().unwrap();
        let entry = rust_entry(root.path(), "model", &[("main.rs", RUST_SUM)]);
        let coordinator = Coordinator::new(RunContext::default());
        let input = input(root.path());

        let leftovers = || -> Vec<PathBuf> {
            fsutil::walk_files(&entry.directory, &[])
                .into_iter()
                .filter(|p| p.to_string_lossy().contains(".tmp-bench-"))
                .collect()
        };

        let first = dbg!(coordinator.run_all(&[entry.clone()], &input).await);
        assert_eq!(leftovers(), Vec::<PathBuf>::new());
        let second = dbg!(coordinator.run_all(&[entry.clone()], &input).await);
        assert_eq!(leftovers(), Vec::<PathBuf>::new());

        assert!(first[0].success && second[0].success);
        assert_eq!(first[0].stdout, "45");
        assert_eq!(first[0].stdout, second[0].stdout);
    }

    #[tokio::test]
    async fn install_warning_is_kept_when_the_entry_fails() {
        let root = tempfile::tempdir().unwrap();
        let directory = root.path().join("model/js");
        fsutil::write_with_mkdir(directory.join("package.json"), "{}").unwrap();
        let entry = SolutionEntry {
            author: "model".into(),
            language: Language::Js,
            provider: ProviderKind::Contributed,
            directory,
        };
        let mut ctx = RunContext::default();
        ctx.toolchain.npm = "false".into();

        let res = run_entry(entry, &input(root.path()), &ctx, &CaptureLimits::default()).await;
        assert!(!res.success);
        assert_eq!(res.failure, Some(FailureKind::EntryPointNotFound));
        assert_eq!(res.warnings.len(), 1);
        assert!(res.warnings[0].starts_with("Dependency install failed"));
    }

    #[tokio::test]
    async fn code_stats_are_collected_for_each_entry() {
        let root = tempfile::tempdir().unwrap();
        let entry = python_entry(root.path(), "model", "import sys\nprint(1)\n");
        fsutil::write(entry.directory.join("util.py"), "X = 1\n").unwrap();

        let res = run_entry(
            entry,
            &input(root.path()),
            &RunContext::default(),
            &CaptureLimits::default(),
        )
        .await;
        assert_eq!(res.code_stats.file_count, 2);
        assert_eq!(res.code_stats.line_count, 3);
    }

    #[tokio::test]
    async fn progress_bar_counts_finished_entries() {
        let root = tempfile::tempdir().unwrap();
        let entries = vec![
            python_entry(root.path(), "a", "print(1)"),
            python_entry(root.path(), "b", "raise SystemExit(1)"),
        ];
        let bar = ProgressBar::hidden();

        let results = Coordinator::new(RunContext::default())
            .progress(bar.clone())
            .run_all(&entries, &input(root.path()))
            .await;
        assert_eq!(bar.position(), 2);
        assert!(results[0].success);
        assert!(!results[1].success);
    }
}

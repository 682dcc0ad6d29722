use serde::{Deserialize, Serialize};

use super::{baseline::BaselineChoice, meta::RunMeta};
use crate::harness::{result::round2, ExecutionResult, FailureKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedResult {
    /// See [`SolutionEntry::stable_id`](crate::locator::SolutionEntry::stable_id).
    pub solution_id: String,

    #[serde(flatten)]
    pub result: ExecutionResult,

    /// Absent for failed results and when no baseline was chosen.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matches_baseline: Option<bool>,

    /// Set exactly when `matches_baseline` is.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline_solution_id: Option<String>,
}

/// Per-entry verdict shown in summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum Verdict {
    /// Matches the baseline.
    AC,
    /// Differs from the baseline.
    WA,
    /// Succeeded, nothing to compare against.
    OK,
    TLE,
    RE,
    /// Could not be built or launched.
    CE,
}

impl AnnotatedResult {
    pub fn verdict(&self) -> Verdict {
        match (self.result.success, self.matches_baseline) {
            (true, Some(true)) => Verdict::AC,
            (true, Some(false)) => Verdict::WA,
            (true, None) => Verdict::OK,
            (false, _) => match self.result.failure {
                Some(FailureKind::Timeout) => Verdict::TLE,
                Some(FailureKind::RuntimeError | FailureKind::UnexpectedFailure) | None => {
                    Verdict::RE
                }
                Some(_) => Verdict::CE,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStats {
    pub key: String,
    pub total: usize,
    pub successful: usize,
    pub failed: usize,

    /// Mean wall time over successful results only.
    pub avg_time_ms: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub by_author: Vec<GroupStats>,
    pub by_language: Vec<GroupStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    #[serde(flatten)]
    pub meta: RunMeta,
    pub baseline: Option<BaselineChoice>,
    pub results: Vec<AnnotatedResult>,
    pub summary: Summary,
}

impl RunReport {
    /// Compares every successful result against `baseline` and builds the grouped summary.
    pub fn aggregate(
        meta: RunMeta,
        results: Vec<ExecutionResult>,
        baseline: Option<BaselineChoice>,
    ) -> Self {
        let ids: Vec<String> = results
            .iter()
            .map(|r| r.entry.stable_id(&meta.puzzle))
            .collect();
        let baseline_id = baseline.as_ref().and_then(|b| ids.get(b.index).cloned());

        let results: Vec<AnnotatedResult> = results
            .into_iter()
            .zip(ids)
            .map(|(result, solution_id)| {
                let (matches_baseline, baseline_solution_id) = match &baseline {
                    Some(b) if result.success => {
                        (Some(result.stdout == b.stdout), baseline_id.clone())
                    }
                    _ => (None, None),
                };
                AnnotatedResult {
                    solution_id,
                    result,
                    matches_baseline,
                    baseline_solution_id,
                }
            })
            .collect();

        let successful = results.iter().filter(|r| r.result.success).count();
        let summary = Summary {
            total: results.len(),
            successful,
            failed: results.len() - successful,
            by_author: group_by(&results, |r| r.entry.author.clone()),
            by_language: group_by(&results, |r| r.entry.language.to_string()),
        };

        Self {
            meta,
            baseline,
            results,
            summary,
        }
    }

    pub fn count_verdicts(&self, verdict: Verdict) -> usize {
        self.results
            .iter()
            .filter(|r| r.verdict() == verdict)
            .count()
    }
}

/// Stable partition of `results` by `key`, groups in first-appearance order.
fn group_by(results: &[AnnotatedResult], key: impl Fn(&ExecutionResult) -> String) -> Vec<GroupStats> {
    let mut groups: Vec<(GroupStats, Vec<f64>)> = Vec::new();

    for AnnotatedResult { result, .. } in results {
        let k = key(result);
        let idx = match groups.iter().position(|(g, _)| g.key == k) {
            Some(idx) => idx,
            None => {
                groups.push((
                    GroupStats {
                        key: k,
                        total: 0,
                        successful: 0,
                        failed: 0,
                        avg_time_ms: None,
                    },
                    Vec::new(),
                ));
                groups.len() - 1
            }
        };

        let (stats, times) = &mut groups[idx];
        stats.total += 1;
        if result.success {
            stats.successful += 1;
            times.push(result.wall_time_ms);
        } else {
            stats.failed += 1;
        }
    }

    groups
        .into_iter()
        .map(|(mut stats, times)| {
            if !times.is_empty() {
                stats.avg_time_ms = Some(round2(times.iter().sum::<f64>() / times.len() as f64));
            }
            stats
        })
        .collect()
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use chrono::Local;

    use super::*;
    use crate::harness::{CaptureLimits, CodeStats, RunError, RunOutput, Stage};
    use crate::locator::{Language, ProviderKind, SolutionEntry};
    use crate::puzzle::PuzzleId;
    use crate::verify::{baseline, BaselinePolicy, InputDigest, Platform};

    fn entry(author: &str, language: Language) -> SolutionEntry {
        let provider = if author == "human" {
            ProviderKind::Reference
        } else {
            ProviderKind::Contributed
        };
        SolutionEntry {
            author: author.into(),
            directory: format!("{}/{}", author, language).into(),
            language,
            provider,
        }
    }

    fn succeeded(author: &str, language: Language, stdout: &str, ms: u64) -> ExecutionResult {
        let out = RunOutput {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
            elapsed: Duration::from_millis(ms),
        };
        ExecutionResult::new(
            entry(author, language),
            Ok(out),
            CodeStats::default(),
            &CaptureLimits::default(),
        )
    }

    fn failed(author: &str, language: Language, err: RunError) -> ExecutionResult {
        ExecutionResult::new(
            entry(author, language),
            Err(err),
            CodeStats::default(),
            &CaptureLimits::default(),
        )
    }

    fn meta(policy: BaselinePolicy) -> RunMeta {
        RunMeta {
            puzzle: PuzzleId::parse("1").unwrap(),
            input_file: "inputs/01.txt".into(),
            input: InputDigest::of_bytes(b"1 2 3\n"),
            generated_at: Local::now(),
            git_sha: None,
            platform: Platform::current(),
            baseline_policy: policy,
        }
    }

    /// human (python, "3\n4"), modelA (rust, build fails),
    /// modelB (python, "3\n4"), modelC (js, "3\n5")
    fn scenario() -> Vec<ExecutionResult> {
        vec![
            succeeded("human", Language::Python, "3\n4", 10),
            failed(
                "modelA",
                Language::Rust,
                RunError::BuildFailed {
                    stage: Stage::Build,
                    command: "cargo build --release".into(),
                    exit_code: 101,
                    stderr: "error[E0308]".into(),
                },
            ),
            succeeded("modelB", Language::Python, "3\n4", 20),
            succeeded("modelC", Language::Js, "3\n5", 5),
        ]
    }

    fn build(results: Vec<ExecutionResult>, policy: BaselinePolicy) -> RunReport {
        let baseline = baseline::select(&results, policy);
        RunReport::aggregate(meta(policy), results, baseline)
    }

    #[test]
    fn scenario_with_prefer_human() {
        let report = build(scenario(), BaselinePolicy::PreferHuman);

        assert_eq!(report.baseline.as_ref().unwrap().stdout, "3\n4");
        assert_eq!(report.baseline.as_ref().unwrap().author, "human");
        let matches: Vec<_> = report.results.iter().map(|r| r.matches_baseline).collect();
        assert_eq!(matches, vec![Some(true), None, Some(true), Some(false)]);
        assert!(!report.results[1].result.success);

        let verdicts: Vec<_> = report.results.iter().map(AnnotatedResult::verdict).collect();
        assert_eq!(verdicts, vec![Verdict::AC, Verdict::CE, Verdict::AC, Verdict::WA]);

        let by_language: Vec<_> = report
            .summary
            .by_language
            .iter()
            .map(|g| (g.key.as_str(), g.total, g.successful))
            .collect();
        assert_eq!(
            by_language,
            vec![("python", 2, 2), ("rust", 1, 0), ("js", 1, 1)]
        );
        assert_eq!(report.summary.by_language[0].avg_time_ms, Some(15.0));
        assert_eq!(report.summary.by_language[1].avg_time_ms, None);
        assert_eq!(report.summary.total, 4);
        assert_eq!(report.summary.successful, 3);
        assert_eq!(report.summary.failed, 1);
    }

    #[test]
    fn failed_results_never_carry_a_comparison() {
        for policy in [
            BaselinePolicy::None,
            BaselinePolicy::FirstSuccess,
            BaselinePolicy::PreferHuman,
            BaselinePolicy::HumanOnly,
        ] {
            let report = build(scenario(), policy);
            for r in &report.results {
                if !r.result.success {
                    assert_eq!(r.matches_baseline, None);
                } else if report.baseline.is_some() {
                    assert!(r.matches_baseline.is_some());
                }
            }
        }
    }

    #[test]
    fn baseline_is_frozen_across_comparisons() {
        // modelC would also qualify, but modelB came first.
        let mut results = scenario();
        results.remove(0);
        let report = build(results, BaselinePolicy::FirstSuccess);

        let baseline = report.baseline.as_ref().unwrap();
        assert_eq!(baseline.author, "modelB");
        assert_eq!(baseline.index, 1);
        assert_eq!(report.results[2].matches_baseline, Some(false));
    }

    #[test]
    fn no_baseline_means_ok_verdicts() {
        let report = build(scenario(), BaselinePolicy::None);
        assert_eq!(report.baseline, None);
        assert_eq!(report.count_verdicts(Verdict::OK), 3);
        assert!(report.results.iter().all(|r| r.matches_baseline.is_none()));
    }

    #[test]
    fn timeout_verdict() {
        let err = RunError::Timeout {
            stage: Stage::Execution,
            limit: Duration::from_secs(1),
            elapsed: Duration::from_secs(1),
        };
        let report = build(
            vec![failed("m", Language::Python, err)],
            BaselinePolicy::FirstSuccess,
        );
        assert_eq!(report.results[0].verdict(), Verdict::TLE);
        assert_eq!(report.summary.by_author[0].avg_time_ms, None);
    }

    #[test]
    fn report_json_shape() {
        let report = build(scenario(), BaselinePolicy::PreferHuman);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["puzzle"], "01");
        assert_eq!(json["baseline_policy"], "prefer_human");
        assert_eq!(json["results"][0]["matches_baseline"], true);
        assert!(json["results"][1].get("matches_baseline").is_none());
        assert_eq!(json["summary"]["by_author"][0]["key"], "human");
        assert_eq!(json["input"]["bytes"], 6);
        assert_eq!(json["platform"]["os"], std::env::consts::OS);
        assert!(json.get("git_sha").is_none());
    }

    #[test]
    fn results_link_to_baseline_by_solution_id() {
        let report = build(scenario(), BaselinePolicy::PreferHuman);
        let human_id = &report.results[0].solution_id;
        assert_eq!(human_id.len(), 16);

        let linked: Vec<_> = report
            .results
            .iter()
            .map(|r| r.baseline_solution_id.as_ref())
            .collect();
        assert_eq!(linked, vec![Some(human_id), None, Some(human_id), Some(human_id)]);

        let again = build(scenario(), BaselinePolicy::PreferHuman);
        let ids = |r: &RunReport| r.results.iter().map(|a| a.solution_id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&report), ids(&again));

        let none = build(scenario(), BaselinePolicy::None);
        assert!(none.results.iter().all(|r| r.baseline_solution_id.is_none()));
    }
}

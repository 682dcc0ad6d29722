use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{
    error::{FailureKind, RunError},
    runner::RunOutput,
    stats::CodeStats,
};
use crate::locator::SolutionEntry;

/// Outcome of one solution entry. Built exactly once per entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(flatten)]
    pub entry: SolutionEntry,

    pub success: bool,
    pub exit_code: i32,
    pub wall_time_ms: f64,
    pub timed_out: bool,
    pub stdout: String,
    pub stderr: String,
    pub error: Option<String>,
    pub failure: Option<FailureKind>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    pub code_stats: CodeStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureLimits {
    pub stdout_max_bytes: usize,
    pub stderr_max_bytes: usize,
}

impl Default for CaptureLimits {
    fn default() -> Self {
        Self {
            stdout_max_bytes: 1 << 20,
            stderr_max_bytes: 64 << 10,
        }
    }
}

impl ExecutionResult {
    pub fn new(
        entry: SolutionEntry,
        outcome: Result<RunOutput, RunError>,
        code_stats: CodeStats,
        capture: &CaptureLimits,
    ) -> Self {
        match outcome {
            Ok(out) => {
                let stderr = normalize_output(&out.stderr, capture.stderr_max_bytes);
                let success = out.exit_code == 0;
                let error = (!success).then(|| runtime_error_message(out.exit_code, &stderr));
                Self {
                    entry,
                    success,
                    exit_code: out.exit_code,
                    wall_time_ms: duration_ms(out.elapsed),
                    timed_out: false,
                    stdout: normalize_output(&out.stdout, capture.stdout_max_bytes),
                    stderr,
                    error,
                    failure: (!success).then_some(FailureKind::RuntimeError),
                    warnings: Vec::new(),
                    code_stats,
                }
            }

            Err(e) => Self {
                entry,
                success: false,
                exit_code: e.exit_code(),
                wall_time_ms: duration_ms(e.elapsed()),
                timed_out: matches!(e, RunError::Timeout { .. }),
                stdout: String::new(),
                stderr: normalize_output(e.captured_stderr(), capture.stderr_max_bytes),
                error: Some(e.to_string()),
                failure: Some(e.kind()),
                warnings: Vec::new(),
                code_stats,
            },
        }
    }

    /// Prepends warnings raised before the outcome was known (e.g. a failed install).
    pub fn with_warnings(mut self, mut warnings: Vec<String>) -> Self {
        warnings.append(&mut self.warnings);
        self.warnings = warnings;
        self
    }
}

fn runtime_error_message(exit_code: i32, stderr: &str) -> String {
    match stderr.lines().rev().find(|line| !line.trim().is_empty()) {
        Some(last) => format!("Exited with code {}: {}", exit_code, last.trim()),
        None => format!("Exited with code {}", exit_code),
    }
}

pub fn duration_ms(d: Duration) -> f64 {
    round2(d.as_secs_f64() * 1000.0)
}

pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// CRLF → LF, trailing whitespace trimmed, then cut to at most `max_bytes`
/// (on a char boundary) followed by a truncation marker.
pub fn normalize_output(raw: &str, max_bytes: usize) -> String {
    let normalized = raw.replace("\r\n", "\n");
    let trimmed = normalized.trim_end();
    if trimmed.len() <= max_bytes {
        return trimmed.to_owned();
    }

    let mut end = max_bytes;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!(
        "{}\n... [truncated {} bytes]",
        &trimmed[..end],
        trimmed.len() - end
    )
}

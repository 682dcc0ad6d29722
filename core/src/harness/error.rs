use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use super::process::{ProcessError, TIMEOUT_EXIT_CODE};

/// Kind of child process a runner launches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    Install,
    Build,
    Compile,
    Execution,
}

/// Why an entry failed, as recorded in the report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FailureKind {
    EntryPointNotFound,
    BuildFailed,
    BinaryNotFound,
    RunnerUnavailable,
    Timeout,
    UnknownLanguage,
    UnexpectedFailure,
    /// The solution ran to completion but exited nonzero.
    RuntimeError,
}

/// Every way a single entry can fail before producing an exit code of its own.
/// All of these are recovered per entry; none aborts a batch.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("No entry point found in '{}' (looked for {}, then any *.{{{}}} file)", .dir.to_string_lossy(), .candidates.join(", "), .extensions.join(","))]
    EntryPointNotFound {
        dir: PathBuf,
        candidates: &'static [&'static str],
        extensions: &'static [&'static str],
    },

    #[error("{stage} failed: `{command}` exited with code {exit_code}")]
    BuildFailed {
        stage: Stage,
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Binary not found after build (checked: {})", .checked.join(", "))]
    BinaryNotFound { checked: Vec<String> },

    #[error("No runner available (tried: {})", .tried.join(", "))]
    RunnerUnavailable { tried: Vec<String> },

    #[error("{stage} timed out after {limit:?}")]
    Timeout {
        stage: Stage,
        limit: Duration,
        elapsed: Duration,
    },

    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Unexpected failure: {0:#}")]
    Unexpected(anyhow::Error),
}

impl RunError {
    pub fn kind(&self) -> FailureKind {
        use RunError::*;
        match self {
            EntryPointNotFound { .. } => FailureKind::EntryPointNotFound,
            BuildFailed { .. } => FailureKind::BuildFailed,
            BinaryNotFound { .. } => FailureKind::BinaryNotFound,
            RunnerUnavailable { .. } => FailureKind::RunnerUnavailable,
            Timeout { .. } => FailureKind::Timeout,
            UnknownLanguage(_) => FailureKind::UnknownLanguage,
            Unexpected(_) => FailureKind::UnexpectedFailure,
        }
    }

    /// Exit code recorded for this failure. Only timeouts get a dedicated code.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Timeout { .. } => TIMEOUT_EXIT_CODE,
            _ => 1,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            RunError::Timeout { elapsed, .. } => *elapsed,
            _ => Duration::ZERO,
        }
    }

    /// stderr worth surfacing in the result (compiler diagnostics).
    pub fn captured_stderr(&self) -> &str {
        match self {
            RunError::BuildFailed { stderr, .. } => stderr,
            _ => "",
        }
    }
}

impl From<ProcessError> for RunError {
    fn from(value: ProcessError) -> Self {
        RunError::Unexpected(value.into())
    }
}

impl From<fsutil::Error> for RunError {
    fn from(value: fsutil::Error) -> Self {
        RunError::Unexpected(value.into())
    }
}

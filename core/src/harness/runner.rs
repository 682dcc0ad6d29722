use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use tempfile::NamedTempFile;
use tokio::process::Command;

use super::{
    compiled,
    error::{RunError, Stage},
    interpreted,
    process::{self, Captured, ProcessError},
    scripted::{self, Flavor, InstallOutcome},
};
use crate::config::{Config, Limits, ToolchainConfig};
use crate::locator::Language;

/// What a runner hands back when the solution itself ran to completion (any exit code).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub elapsed: Duration,
}

/// Toolchain and limits shared by every runner invocation of one run.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub toolchain: ToolchainConfig,
    pub limits: Limits,
}

/// One strategy per supported language family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum Runner {
    Interpreted,
    CompiledSystems,
    ScriptedDynamic,
    ScriptedStatic,
}

impl Runner {
    pub fn for_language(language: &Language) -> Option<Self> {
        use Language::*;
        match language {
            Python => Some(Runner::Interpreted),
            Rust => Some(Runner::CompiledSystems),
            Js => Some(Runner::ScriptedDynamic),
            Ts => Some(Runner::ScriptedStatic),
            Other(_) => None,
        }
    }

    /// Best-effort setup that never fails the entry. Returns warnings for the report.
    pub async fn install(self, dir: &Path, ctx: &RunContext) -> Vec<String> {
        match self {
            Runner::ScriptedDynamic | Runner::ScriptedStatic => {
                match scripted::install_dependencies(dir, ctx).await {
                    InstallOutcome::Failed(msg) => vec![msg],
                    InstallOutcome::Skipped | InstallOutcome::Installed => Vec::new(),
                }
            }
            Runner::Interpreted | Runner::CompiledSystems => Vec::new(),
        }
    }

    /// Builds (if needed) and executes the solution in `dir`, passing `input_file` as
    /// its only argument. The working directory of every child is `dir`.
    pub async fn run(
        self,
        dir: &Path,
        input_file: &Path,
        ctx: &RunContext,
    ) -> Result<RunOutput, RunError> {
        use Runner::*;
        match self {
            Interpreted => interpreted::run(dir, input_file, ctx).await,
            CompiledSystems => compiled::run(dir, input_file, ctx).await,
            ScriptedDynamic => scripted::run(dir, input_file, ctx, Flavor::Dynamic).await,
            ScriptedStatic => scripted::run(dir, input_file, ctx, Flavor::Static).await,
        }
    }
}

impl RunContext {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            toolchain: cfg.toolchain.clone(),
            limits: cfg.run.timeout.limits(),
        }
    }

    /// Runs the solution process under the execution limit.
    pub(crate) async fn execute(&self, cmd: Command) -> Result<RunOutput, RunError> {
        let captured = process::run(cmd, self.limits.execute).await;
        self.finish_execution(captured)
    }

    pub(crate) fn finish_execution(
        &self,
        captured: Result<Captured, ProcessError>,
    ) -> Result<RunOutput, RunError> {
        let captured = captured?;
        // Partial output of a killed solution is not compared.
        if captured.timed_out {
            return Err(RunError::Timeout {
                stage: Stage::Execution,
                limit: self.limits.execute,
                elapsed: captured.elapsed,
            });
        }
        Ok(RunOutput {
            exit_code: captured.exit_code,
            stdout: captured.stdout,
            stderr: captured.stderr,
            elapsed: captured.elapsed,
        })
    }

    /// Runs a build/compile step that must succeed before execution.
    pub(crate) async fn prepare(
        &self,
        cmd: Command,
        stage: Stage,
        limit: Duration,
    ) -> Result<Captured, RunError> {
        let command = self::describe(&cmd);
        log::info!("{}: {}", stage, command);

        let captured = process::run(cmd, limit).await?;
        if captured.timed_out {
            return Err(RunError::Timeout {
                stage,
                limit,
                elapsed: captured.elapsed,
            });
        }
        if captured.exit_code != 0 {
            return Err(RunError::BuildFailed {
                stage,
                command,
                exit_code: captured.exit_code,
                stderr: captured.stderr,
            });
        }
        Ok(captured)
    }
}

pub(crate) fn command(program: impl AsRef<Path>, working_dir: &Path) -> Command {
    let mut cmd = Command::new(program.as_ref());
    cmd.current_dir(working_dir);
    cmd
}

pub(crate) fn absolute(path: &Path) -> Result<PathBuf, RunError> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }
    let cwd = std::env::current_dir()
        .context("Cannot get current dir")
        .map_err(RunError::Unexpected)?;
    Ok(cwd.join(path))
}

/// `program arg1 arg2 ...`, for logs and error messages.
pub(crate) fn describe(cmd: &Command) -> String {
    let std_cmd = cmd.as_std();
    std::iter::once(std_cmd.get_program())
        .chain(std_cmd.get_args())
        .map(|s| s.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Hidden temp file next to a solution's sources, named `.tmp-bench-<stem>-XXXXXX<suffix>`.
/// Removed when the returned value (or its `TempPath`) is dropped.
pub(crate) fn temp_file_in(dir: &Path, stem: &str, suffix: &str) -> Result<NamedTempFile, RunError> {
    tempfile::Builder::new()
        .prefix(&format!(".tmp-bench-{}-", stem))
        .suffix(suffix)
        .tempfile_in(dir)
        .with_context(|| format!("Cannot create temp file in {}", dir.to_string_lossy()))
        .map_err(RunError::Unexpected)
}

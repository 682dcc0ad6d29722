use std::{io::Write as _, path::Path};

use anyhow::Context as _;
use lazy_regex::regex_is_match;

use super::{
    entrypoint,
    error::{RunError, Stage},
    process,
    runner::{self, RunContext, RunOutput},
};

pub const JS_ENTRY_POINTS: &[&str] = &[
    "index.js",
    "main.js",
    "solution.js",
    "index.ts",
    "main.ts",
    "solution.ts",
];
pub const TS_ENTRY_POINTS: &[&str] = &[
    "index.ts",
    "main.ts",
    "solution.ts",
    "index.js",
    "main.js",
    "solution.js",
];
pub const EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "ts", "tsx", "mts"];

const TS_EXTENSIONS: &[&str] = &["ts", "tsx", "mts"];

/// Which entry names a scripted solution prefers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Dynamic,
    Static,
}

impl Flavor {
    pub fn entry_points(self) -> &'static [&'static str] {
        match self {
            Flavor::Dynamic => JS_ENTRY_POINTS,
            Flavor::Static => TS_ENTRY_POINTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Skipped,
    Installed,
    Failed(String),
}

/// Runs the entry file of `dir`. Dependencies are installed beforehand by
/// [`Runner::install`](super::Runner::install).
pub async fn run(
    dir: &Path,
    input_file: &Path,
    ctx: &RunContext,
    flavor: Flavor,
) -> Result<RunOutput, RunError> {
    let entry = entrypoint::find(dir, flavor.entry_points(), EXTENSIONS)?;
    if is_typescript(&entry) {
        run_typescript(dir, &entry, input_file, ctx).await
    } else {
        run_javascript(dir, &entry, input_file, ctx).await
    }
}

/// Installs npm dependencies when `package.json` exists and `node_modules` does not.
///
/// Never fails: a failed or timed-out install is logged and reported as
/// [`InstallOutcome::Failed`], and the solution is executed anyway.
pub async fn install_dependencies(dir: &Path, ctx: &RunContext) -> InstallOutcome {
    if !dir.join("package.json").is_file() || dir.join("node_modules").exists() {
        return InstallOutcome::Skipped;
    }

    let subcommand = if dir.join("package-lock.json").is_file() {
        "ci"
    } else {
        "install"
    };
    let mut cmd = runner::command(&ctx.toolchain.npm, dir);
    cmd.arg(subcommand);

    match ctx.prepare(cmd, Stage::Install, ctx.limits.install).await {
        Ok(_) => InstallOutcome::Installed,
        Err(e) => {
            log::warn!(
                "Dependency install failed in {}: {}",
                dir.to_string_lossy(),
                e
            );
            InstallOutcome::Failed(format!("Dependency install failed: {}", e))
        }
    }
}

/// Whether `source` looks like a CommonJS module.
///
/// A plain token match on `require(`, `module.exports` and `exports.<name>`.
/// Computed or aliased `require` calls go undetected, and the tokens also match
/// inside comments and string literals.
pub fn looks_like_commonjs(source: &str) -> bool {
    regex_is_match!(r"\brequire\s*\(", source)
        || regex_is_match!(r"\bmodule\.exports\b", source)
        || regex_is_match!(r"\bexports\.[A-Za-z_$][\w$]*", source)
}

fn is_typescript(entry: &Path) -> bool {
    entry
        .extension()
        .map(|ext| TS_EXTENSIONS.contains(&ext.to_string_lossy().as_ref()))
        .unwrap_or(false)
}

async fn run_javascript(
    dir: &Path,
    entry: &Path,
    input_file: &Path,
    ctx: &RunContext,
) -> Result<RunOutput, RunError> {
    let is_plain_js = entry.extension().map(|ext| ext == "js").unwrap_or(false);
    let source = if is_plain_js {
        // Unreadable sources are treated as ES modules and run in place.
        fsutil::read(entry)
            .map_err(|e| log::debug!("Skipping CommonJS check: {}", e))
            .ok()
    } else {
        None
    };

    match source {
        Some(source) if looks_like_commonjs(&String::from_utf8_lossy(&source)) => {
            let stem = entry
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut copy = runner::temp_file_in(dir, &stem, ".cjs")?;
            copy.write_all(&source)
                .with_context(|| format!("Cannot write {}", copy.path().to_string_lossy()))
                .map_err(RunError::Unexpected)?;
            let copy = copy.into_temp_path();
            log::debug!(
                "Running {} as CommonJS via {}",
                entry.to_string_lossy(),
                copy.to_string_lossy()
            );

            let mut cmd = runner::command(&ctx.toolchain.node, dir);
            cmd.arg(&*copy).arg(input_file);
            ctx.execute(cmd).await
        }
        _ => {
            let mut cmd = runner::command(&ctx.toolchain.node, dir);
            cmd.arg(entry).arg(input_file);
            ctx.execute(cmd).await
        }
    }
}

async fn run_typescript(
    dir: &Path,
    entry: &Path,
    input_file: &Path,
    ctx: &RunContext,
) -> Result<RunOutput, RunError> {
    let mut tried = Vec::new();
    for program in &ctx.toolchain.typescript {
        let mut cmd = runner::command(program, dir);
        cmd.arg(entry).arg(input_file);

        match process::run(cmd, ctx.limits.execute).await {
            Err(e) if e.is_program_missing() => {
                log::debug!("TypeScript runner unavailable: {}", e);
                tried.push(program.to_string_lossy().into_owned());
            }
            captured => return ctx.finish_execution(captured),
        }
    }
    Err(RunError::RunnerUnavailable { tried })
}

use std::path::Path;

use anyhow::Context as _;

use super::{
    entrypoint,
    error::{RunError, Stage},
    runner::{self, RunContext, RunOutput},
};

pub const MANIFEST: &str = "Cargo.toml";
pub const ENTRY_POINTS: &[&str] = &["main.rs", "solution.rs"];
pub const EXTENSIONS: &[&str] = &["rs"];

/// Binary names tried after the ones declared in the manifest.
const FALLBACK_BINARIES: &[&str] = &["main", "solution"];

pub async fn run(dir: &Path, input_file: &Path, ctx: &RunContext) -> Result<RunOutput, RunError> {
    let input_file = runner::absolute(input_file)?;

    if dir.join(MANIFEST).is_file() {
        run_cargo_project(dir, &input_file, ctx).await
    } else {
        run_single_file(dir, &input_file, ctx).await
    }
}

async fn run_cargo_project(
    dir: &Path,
    input_file: &Path,
    ctx: &RunContext,
) -> Result<RunOutput, RunError> {
    let target_dir = dir.join("target");

    let mut cmd = runner::command(&ctx.toolchain.cargo, dir);
    cmd.args(["build", "--release", "--quiet", "--target-dir"])
        .arg(&target_dir);
    ctx.prepare(cmd, Stage::Build, ctx.limits.build).await?;

    let release_dir = target_dir.join("release");
    let candidates = self::binary_candidates(dir)?;
    let binary = candidates
        .iter()
        .map(|name| release_dir.join(format!("{}{}", name, std::env::consts::EXE_SUFFIX)))
        .find(|path| path.is_file())
        .ok_or_else(|| RunError::BinaryNotFound {
            checked: candidates.clone(),
        })?;

    let mut cmd = runner::command(&binary, dir);
    cmd.arg(input_file);
    ctx.execute(cmd).await
}

async fn run_single_file(
    dir: &Path,
    input_file: &Path,
    ctx: &RunContext,
) -> Result<RunOutput, RunError> {
    let source = entrypoint::find(dir, ENTRY_POINTS, EXTENSIONS)?;
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_owned());

    // Reserved before compiling so a partial output is removed too. The handle is
    // closed right away: rustc rewrites the file and it is then executed.
    let binary = runner::temp_file_in(dir, &stem, std::env::consts::EXE_SUFFIX)?.into_temp_path();

    let mut cmd = runner::command(&ctx.toolchain.rustc, dir);
    cmd.arg("-O").arg("-o").arg(&*binary).arg(&source);
    ctx.prepare(cmd, Stage::Compile, ctx.limits.compile).await?;

    let mut cmd = runner::command(&*binary, dir);
    cmd.arg(input_file);
    ctx.execute(cmd).await
}

/// Names a Cargo build may have produced, most specific first:
/// declared `[[bin]]` names, the package name, the directory name, then conventional names.
fn binary_candidates(dir: &Path) -> Result<Vec<String>, RunError> {
    let manifest_path = dir.join(MANIFEST);
    let manifest: toml::Table = toml::from_str(&fsutil::read_to_string(&manifest_path)?)
        .with_context(|| format!("Invalid manifest: {}", manifest_path.to_string_lossy()))
        .map_err(RunError::Unexpected)?;

    let mut names = Vec::new();
    if let Some(bins) = manifest.get("bin").and_then(toml::Value::as_array) {
        names.extend(
            bins.iter()
                .filter_map(|bin| bin.get("name").and_then(toml::Value::as_str))
                .map(String::from),
        );
    }
    if let Some(name) = manifest
        .get("package")
        .and_then(|pkg| pkg.get("name"))
        .and_then(toml::Value::as_str)
    {
        names.push(name.to_owned());
    }
    if let Some(name) = dir.file_name() {
        names.push(name.to_string_lossy().into_owned());
    }
    names.extend(FALLBACK_BINARIES.iter().map(|s| s.to_string()));

    let mut seen = std::collections::HashSet::new();
    names.retain(|name| seen.insert(name.clone()));
    Ok(names)
}

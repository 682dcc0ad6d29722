use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use super::baseline::BaselinePolicy;
use crate::puzzle::PuzzleId;

/// Size and content hash of an input file, so reports can be matched to the exact input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDigest {
    pub bytes: u64,
    pub sha256: String,
}

impl InputDigest {
    #[must_use]
    pub fn of_file(path: impl AsRef<Path>) -> fsutil::Result<Self> {
        fsutil::read(path).map(|data| Self::of_bytes(&data))
    }

    pub fn of_bytes(data: &[u8]) -> Self {
        Self {
            bytes: data.len() as u64,
            sha256: hex::encode(Sha256::digest(data)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub os: String,
    pub arch: String,
    pub cpu_count: usize,
}

impl Platform {
    pub fn current() -> Self {
        Self {
            os: std::env::consts::OS.to_owned(),
            arch: std::env::consts::ARCH.to_owned(),
            cpu_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMeta {
    pub puzzle: PuzzleId,
    pub input_file: PathBuf,
    pub input: InputDigest,
    pub generated_at: DateTime<Local>,

    /// Commit checked out in the repository containing the solutions root, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_sha: Option<String>,

    pub platform: Platform,
    pub baseline_policy: BaselinePolicy,
}

impl RunMeta {
    pub fn collect(
        puzzle: PuzzleId,
        input_file: PathBuf,
        root: &Path,
        baseline_policy: BaselinePolicy,
    ) -> fsutil::Result<Self> {
        Ok(Self {
            puzzle,
            input: InputDigest::of_file(&input_file)?,
            input_file,
            generated_at: Local::now(),
            git_sha: self::git_sha(root),
            platform: Platform::current(),
            baseline_policy,
        })
    }
}

/// Reads the commit of the nearest `.git` directory above `start`, without running git.
pub fn git_sha(start: &Path) -> Option<String> {
    let start = fsutil::canonicalize_path(start).ok()?;
    let git_dir = start
        .ancestors()
        .map(|dir| dir.join(".git"))
        .find(|dir| dir.is_dir())?;
    let sha = resolve_head(&git_dir);
    log::debug!("git HEAD of {}: {:?}", git_dir.to_string_lossy(), sha);
    sha
}

fn resolve_head(git_dir: &Path) -> Option<String> {
    let head = fsutil::read_to_string(git_dir.join("HEAD")).ok()?;
    let Some(refname) = head.trim().strip_prefix("ref:").map(str::trim) else {
        // Detached HEAD holds the commit itself.
        return Some(head.trim().to_owned()).filter(|s| !s.is_empty());
    };

    if let Ok(sha) = fsutil::read_to_string(git_dir.join(refname)) {
        return Some(sha.trim().to_owned());
    }
    let packed = fsutil::read_to_string(git_dir.join("packed-refs")).ok()?;
    packed
        .lines()
        .filter(|line| !line.starts_with('#') && !line.starts_with('^'))
        .find_map(|line| {
            let (sha, name) = line.split_once(' ')?;
            (name.trim() == refname).then(|| sha.to_owned())
        })
}

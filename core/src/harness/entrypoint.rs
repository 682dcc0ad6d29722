use std::path::{Path, PathBuf};

use super::error::RunError;

/// Picks the file to launch in `dir`.
///
/// Conventional names in `candidates` win in order. Otherwise the first file (by name)
/// with one of `extensions` is used. Hidden files never qualify, so transient copies
/// left by an interrupted run are not picked up.
pub fn find(
    dir: &Path,
    candidates: &'static [&'static str],
    extensions: &'static [&'static str],
) -> Result<PathBuf, RunError> {
    if let Some(path) = candidates
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
    {
        return Ok(path);
    }

    let mut fallback = Vec::new();
    for ext in extensions {
        let pattern = glob::Pattern::new(&format!("*.{}", ext))
            .map_err(|e| RunError::Unexpected(e.into()))?;
        fallback.extend(
            fsutil::find_files_matching_glob(dir, &pattern)?
                .into_iter()
                .filter(|path| !is_hidden(path)),
        );
    }
    fallback.sort();

    fallback
        .into_iter()
        .next()
        .ok_or_else(|| RunError::EntryPointNotFound {
            dir: dir.to_owned(),
            candidates,
            extensions,
        })
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

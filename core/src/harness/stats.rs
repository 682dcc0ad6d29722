use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::locator::Language;

/// Directories that hold build output or vendored code rather than the solution itself.
pub const SKIP_DIRS: &[&str] = &["node_modules", "target", ".git", "__pycache__"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeStats {
    pub line_count: usize,
    pub file_count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependency_count: Option<usize>,
}

/// Counts source files and their lines under `dir`. Unreadable files are skipped.
pub fn compute(dir: &Path, language: &Language) -> CodeStats {
    let extensions = language.source_extensions();

    let mut stats = CodeStats::default();
    for path in fsutil::walk_files(dir, SKIP_DIRS) {
        let is_source = path
            .extension()
            .map(|ext| extensions.contains(&ext.to_string_lossy().as_ref()))
            .unwrap_or(false);
        if !is_source || is_transient(&path) {
            continue;
        }
        let Ok(contents) = fsutil::read_to_string(&path) else {
            continue
        };
        stats.file_count += 1;
        stats.line_count += contents.lines().count();
    }

    if matches!(language, Language::Js | Language::Ts) {
        stats.dependency_count = count_npm_dependencies(dir);
    }
    stats
}

fn is_transient(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with(".tmp-bench-"))
        .unwrap_or(false)
}

/// `dependencies` + `devDependencies` declared in `package.json`.
fn count_npm_dependencies(dir: &Path) -> Option<usize> {
    let manifest_path = dir.join("package.json");
    if !manifest_path.is_file() {
        return None;
    }
    let manifest: serde_json::Value = match fsutil::read_json_with_deserialize(&manifest_path) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("{}", e);
            return None;
        }
    };

    let count = ["dependencies", "devDependencies"]
        .iter()
        .filter_map(|key| manifest.get(key).and_then(serde_json::Value::as_object))
        .map(|deps| deps.len())
        .sum();
    Some(count)
}

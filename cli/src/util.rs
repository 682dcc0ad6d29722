use std::path::{Path, PathBuf};

/// `~/foo` instead of `/home/me/foo`, for messages.
pub fn replace_homedir_to_tilde(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    let Some(home_dir) = ::dirs::home_dir() else {
        return path
    };
    path.strip_prefix(home_dir)
        .map(|path| Path::new("~").join(path))
        .unwrap_or(path)
}

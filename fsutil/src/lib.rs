use serde::{de::DeserializeOwned, Serialize};
use std::{
    fs::{self, File, ReadDir},
    io::BufReader,
    path::{Path, PathBuf},
};

pub mod error {
    use std::{io, path::PathBuf};

    pub type Result<T> = std::result::Result<T, self::Error>;

    type Msg = &'static str;

    #[derive(Debug, thiserror::Error)]
    pub enum Error {
        #[error("{0} ({1}): {2}")]
        SingleIO(Msg, PathBuf, #[source] io::Error),

        #[error("Failed to canonicalize path '{0}': {1}")]
        CanonicalizePath(PathBuf, #[source] io::Error),

        #[error("Cannot serialize to JSON (dest='{0}'): {1}")]
        SerializeToJson(PathBuf, #[source] serde_json::Error),

        #[error("Cannot deserialize from JSON (src='{0}'): {1}")]
        DeserializeFromJson(PathBuf, #[source] serde_json::Error),
    }
}
pub use error::{Error, Result};

#[must_use]
pub fn mkdir_all(path: impl AsRef<Path>) -> Result<()> {
    let dir = path.as_ref();
    fs::create_dir_all(dir).map_err(|e| Error::SingleIO("Cannot create dir", dir.to_owned(), e))
}

#[must_use]
pub fn write<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    fs::write(&filepath, contents)
        .map_err(|e| Error::SingleIO("Cannot write file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn write_with_mkdir<P, C>(filepath: P, contents: C) -> Result<()>
where
    P: AsRef<Path>,
    C: AsRef<[u8]>,
{
    if let Some(dir) = filepath.as_ref().parent() {
        self::mkdir_all(dir)?;
    }
    self::write(filepath, contents)
}

#[must_use]
pub fn read(filepath: impl AsRef<Path>) -> Result<Vec<u8>> {
    fs::read(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn read_to_string(filepath: impl AsRef<Path>) -> Result<String> {
    fs::read_to_string(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.as_ref().to_owned(), e))
}

#[must_use]
pub fn write_json_pretty_with_mkdir<P, T>(filepath: P, data: &T) -> Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let mut s = serde_json::to_string_pretty(data)
        .map_err(|e| Error::SerializeToJson(filepath.as_ref().to_owned(), e))?;
    s.push('\n');
    write_with_mkdir(filepath, &s)
}

#[must_use]
pub fn read_json_with_deserialize<P, T>(filepath: P) -> Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let filepath = filepath.as_ref();
    let f = File::open(&filepath)
        .map_err(|e| Error::SingleIO("Cannot read file", filepath.to_owned(), e))?;
    serde_json::from_reader(BufReader::new(f))
        .map_err(|e| Error::DeserializeFromJson(filepath.to_owned(), e))
}

#[must_use]
pub fn read_dir(dir: impl AsRef<Path>) -> Result<ReadDir> {
    fs::read_dir(&dir).map_err(|e| Error::SingleIO("Cannot read dir", dir.as_ref().to_owned(), e))
}

pub fn canonicalize_path(path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    path.canonicalize()
        .map_err(|e| Error::CanonicalizePath(path.to_owned(), e))
}

/// Names of the direct subdirectories of `dir`, sorted.
/// Entries whose file type cannot be determined are skipped.
pub fn list_subdir_names(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let mut names: Vec<String> = self::read_dir(&dir)?
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false))
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    Ok(names)
}

/// Regular files directly under `dir` whose name matches `filename_pattern`, sorted by name.
pub fn find_files_matching_glob(
    dir: impl AsRef<Path>,
    filename_pattern: &::glob::Pattern,
) -> Result<Vec<PathBuf>> {
    let mut res = Vec::new();
    for entry in self::read_dir(&dir)?.filter_map(std::result::Result::ok) {
        let Ok(file_type) = entry.file_type() else {
            continue
        };
        if file_type.is_dir() {
            continue;
        }
        let filename = entry.file_name();
        if filename_pattern.matches(filename.to_string_lossy().as_ref()) {
            res.push(entry.path());
        }
    }
    res.sort();
    Ok(res)
}

/// Recursively collects regular files under `root`.
/// Directories named in `skip_dir_names` are not descended into; unreadable dirs are ignored.
pub fn walk_files(root: impl AsRef<Path>, skip_dir_names: &[&str]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let mut stack = vec![root.as_ref().to_owned()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue
        };
        for entry in entries.filter_map(std::result::Result::ok) {
            let Ok(ft) = entry.file_type() else {
                continue
            };
            if ft.is_dir() {
                let name = entry.file_name();
                if !skip_dir_names.contains(&name.to_string_lossy().as_ref()) {
                    stack.push(entry.path());
                }
            } else if ft.is_file() {
                files.push(entry.path());
            }
        }
    }
    files.sort();
    files
}

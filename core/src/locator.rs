use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::config::LocateConfig;
use crate::puzzle::PuzzleId;

pub type Result<T> = std::result::Result<T, LocateError>;

#[derive(Debug, thiserror::Error)]
pub enum LocateError {
    #[error("No solutions found for puzzle {puzzle} under '{}'", .root.to_string_lossy())]
    NotFound { puzzle: PuzzleId, root: PathBuf },

    #[error(transparent)]
    Fs(#[from] fsutil::Error),
}

/// Language tag, named after the directory a solution lives in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Language {
    Python,
    Rust,
    Js,
    Ts,
    /// A directory name outside the supported set. Dispatching it yields `UnknownLanguage`.
    Other(String),
}

impl Language {
    pub fn dir_name(&self) -> &str {
        use Language::*;
        match self {
            Python => "python",
            Rust => "rust",
            Js => "js",
            Ts => "ts",
            Other(name) => name,
        }
    }

    /// Source extensions counted by code-size stats.
    pub fn source_extensions(&self) -> &'static [&'static str] {
        use Language::*;
        match self {
            Python => &["py"],
            Rust => &["rs"],
            Js | Ts => &["js", "mjs", "cjs", "ts", "tsx"],
            Other(_) => &[],
        }
    }
}

impl From<&str> for Language {
    fn from(value: &str) -> Self {
        use Language::*;
        match value {
            "python" => Python,
            "rust" => Rust,
            "js" => Js,
            "ts" => Ts,
            other => Other(other.to_owned()),
        }
    }
}

impl From<String> for Language {
    fn from(value: String) -> Self {
        value.as_str().into()
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.dir_name().to_owned()
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProviderKind {
    /// Trusted source, preferred as baseline.
    Reference,
    Contributed,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SolutionEntry {
    pub author: String,
    pub language: Language,
    pub provider: ProviderKind,
    pub directory: PathBuf,
}

impl SolutionEntry {
    pub fn label(&self) -> String {
        format!("{}/{}", self.author, self.language)
    }

    /// 16 hex digits derived from puzzle, provider, author, language and directory,
    /// so the same solution gets the same id in every report.
    pub fn stable_id(&self, puzzle: &PuzzleId) -> String {
        let raw = format!(
            "{}|{}:{}|{}|{}",
            puzzle,
            self.provider,
            self.author,
            self.language,
            self.directory.to_string_lossy()
        );
        let mut id = hex::encode(Sha256::digest(raw.as_bytes()));
        id.truncate(16);
        id
    }
}

/// Enumerates solution entries for `puzzle` under `root`.
///
/// Layout:
/// ```text
/// <root>/<reference_dir>/<puzzle>/<language>/          author = reference_author
/// <root>/<contributed_dir>/<puzzle>/<author>/<language>/
/// ```
/// Reference entries come first, then contributed authors sorted by name.
/// Within one author, languages follow `cfg.languages`.
pub fn locate(
    puzzle: &PuzzleId,
    root: impl AsRef<Path>,
    cfg: &LocateConfig,
) -> Result<Vec<SolutionEntry>> {
    let root = root.as_ref();
    let mut entries = Vec::new();

    let reference_dir = root.join(&cfg.reference_dir).join(puzzle);
    if reference_dir.is_dir() {
        push_language_entries(
            &mut entries,
            &reference_dir,
            &cfg.reference_author,
            ProviderKind::Reference,
            &cfg.languages,
        );
    }

    let contributed_dir = root.join(&cfg.contributed_dir).join(puzzle);
    if contributed_dir.is_dir() {
        for author in fsutil::list_subdir_names(&contributed_dir)? {
            push_language_entries(
                &mut entries,
                &contributed_dir.join(&author),
                &author,
                ProviderKind::Contributed,
                &cfg.languages,
            );
        }
    }

    if entries.is_empty() {
        return Err(LocateError::NotFound {
            puzzle: puzzle.to_owned(),
            root: root.to_owned(),
        });
    }
    log::debug!("Located {} entries for puzzle {}", entries.len(), puzzle);
    Ok(entries)
}

fn push_language_entries(
    entries: &mut Vec<SolutionEntry>,
    author_dir: &Path,
    author: &str,
    provider: ProviderKind,
    languages: &[String],
) {
    for lang in languages {
        let dir = author_dir.join(lang);
        if dir.is_dir() {
            entries.push(SolutionEntry {
                author: author.to_owned(),
                language: lang.as_str().into(),
                provider,
                directory: dir,
            });
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn mkdirs(root: &Path, dirs: &[&str]) {
        for d in dirs {
            fsutil::mkdir_all(root.join(d)).unwrap();
        }
    }

    fn labels(entries: &[SolutionEntry]) -> Vec<String> {
        entries.iter().map(SolutionEntry::label).collect()
    }

    #[test]
    fn stable_id_depends_on_every_key() {
        let entry = SolutionEntry {
            author: "human".into(),
            language: Language::Python,
            provider: ProviderKind::Reference,
            directory: "human-solutions/01/python".into(),
        };
        let p1 = PuzzleId::parse("1").unwrap();
        let id = entry.stable_id(&p1);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, entry.clone().stable_id(&p1));

        assert_ne!(id, entry.stable_id(&PuzzleId::parse("2").unwrap()));
        let mut other = entry.clone();
        other.language = Language::Rust;
        assert_ne!(id, other.stable_id(&p1));
        let mut other = entry.clone();
        other.provider = ProviderKind::Contributed;
        assert_ne!(id, other.stable_id(&p1));
    }

    #[test]
    fn reference_first_then_contributed_sorted() {
        let root = tempfile::tempdir().unwrap();
        mkdirs(
            root.path(),
            &[
                "ai-solutions/03/sonnet/python",
                "ai-solutions/03/gemini/rust",
                "ai-solutions/03/gemini/js",
                "human-solutions/03/js",
                "human-solutions/03/python",
                "human-solutions/04/rust",
            ],
        );
        let puzzle = PuzzleId::parse("3").unwrap();
        let entries = dbg!(locate(&puzzle, root.path(), &LocateConfig::default())).unwrap();

        assert_eq!(
            labels(&entries),
            vec![
                "human/python",
                "human/js",
                "gemini/rust",
                "gemini/js",
                "sonnet/python",
            ]
        );
        assert_eq!(entries[0].provider, ProviderKind::Reference);
        assert_eq!(entries[2].provider, ProviderKind::Contributed);
        assert_eq!(
            entries[0].directory,
            root.path().join("human-solutions/03/python")
        );
    }

    #[test]
    fn author_without_language_dirs_is_skipped() {
        let root = tempfile::tempdir().unwrap();
        mkdirs(
            root.path(),
            &["ai-solutions/01/empty-model", "ai-solutions/01/m/rust"],
        );
        fsutil::write(root.path().join("ai-solutions/01/m/solution.py"), "").unwrap();

        let puzzle = PuzzleId::parse("1").unwrap();
        let entries = locate(&puzzle, root.path(), &LocateConfig::default()).unwrap();
        assert_eq!(labels(&entries), vec!["m/rust"]);
    }

    #[test]
    fn not_found_when_nothing_matches() {
        let root = tempfile::tempdir().unwrap();
        mkdirs(root.path(), &["human-solutions/01/python"]);
        let puzzle = PuzzleId::parse("09").unwrap();
        let err = locate(&puzzle, root.path(), &LocateConfig::default()).unwrap_err();
        assert!(matches!(err, LocateError::NotFound { ref puzzle, .. } if puzzle.as_str() == "09"));
    }

    #[test]
    fn unsupported_configured_language_is_tagged_other() {
        let root = tempfile::tempdir().unwrap();
        mkdirs(root.path(), &["human-solutions/02/go"]);
        let cfg = LocateConfig {
            languages: vec!["python".into(), "go".into()],
            ..LocateConfig::default()
        };
        let puzzle = PuzzleId::parse("2").unwrap();
        let entries = locate(&puzzle, root.path(), &cfg).unwrap();
        assert_eq!(entries[0].language, Language::Other("go".into()));
    }
}

use std::path::Path;

use serde::{Deserialize, Serialize};

pub type Result<T> = std::result::Result<T, PuzzleIdError>;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PuzzleIdError {
    #[error("Puzzle id is empty")]
    Empty,

    #[error("Puzzle id must not contain path separators or dots (given '{0}')")]
    InvalidChar(String),
}

/// Puzzle identification, zero-padded to a fixed width.
/// (e.g.) "1" => "01", "09" => "09", "12" => "12", "123" => "123"
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PuzzleId(String);

impl PuzzleId {
    pub const WIDTH: usize = 2;

    pub fn parse(s: impl AsRef<str>) -> Result<Self> {
        let s = s.as_ref().trim();
        if s.is_empty() {
            return Err(PuzzleIdError::Empty);
        }
        if s.contains(|c: char| c == '/' || c == '\\' || c == '.') {
            return Err(PuzzleIdError::InvalidChar(s.to_owned()));
        }
        Ok(Self(format!("{:0>width$}", s, width = Self::WIDTH)))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::str::FromStr for PuzzleId {
    type Err = PuzzleIdError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PuzzleId {
    type Error = PuzzleIdError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl std::fmt::Display for PuzzleId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PuzzleId {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

impl AsRef<Path> for PuzzleId {
    fn as_ref(&self) -> &Path {
        self.0.as_ref()
    }
}

impl From<PuzzleId> for String {
    fn from(value: PuzzleId) -> Self {
        value.0
    }
}

use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::time::Duration;

use anyhow::Context as _;
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};

use crate::verify::BaselinePolicy;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    pub locate: LocateConfig,
    pub run: RunConfig,
    pub toolchain: ToolchainConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LocateConfig {
    pub reference_dir: String,
    pub reference_author: String,
    pub contributed_dir: String,
    pub input_dir: String,
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    pub jobs: usize,
    pub baseline: BaselinePolicy,
    pub stdout_capture_max_bytes: usize,
    pub stderr_capture_max_bytes: usize,
    pub timeout: TimeoutConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub execute_ms: u64,
    pub build_ms: u64,
    pub compile_ms: u64,
    pub install_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ToolchainConfig {
    pub python: PathBuf,
    pub cargo: PathBuf,
    pub rustc: PathBuf,
    pub node: PathBuf,
    pub npm: PathBuf,
    /// Tried in order; the first one that can be spawned runs `.ts` entries.
    pub typescript: Vec<PathBuf>,
}

/// Wall-clock limits for each kind of child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub execute: Duration,
    pub build: Duration,
    pub compile: Duration,
    pub install: Duration,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            reference_dir: "human-solutions".into(),
            reference_author: "human".into(),
            contributed_dir: "ai-solutions".into(),
            input_dir: "inputs".into(),
            languages: ["python", "rust", "js", "ts"].map(String::from).to_vec(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            jobs: 1,
            baseline: BaselinePolicy::FirstSuccess,
            stdout_capture_max_bytes: 1 << 20,
            stderr_capture_max_bytes: 64 << 10,
            timeout: TimeoutConfig::default(),
        }
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            execute_ms: 60_000,
            build_ms: 120_000,
            compile_ms: 30_000,
            install_ms: 60_000,
        }
    }
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            python: "python3".into(),
            cargo: "cargo".into(),
            rustc: "rustc".into(),
            node: "node".into(),
            npm: "npm".into(),
            typescript: vec!["tsx".into(), "ts-node".into(), "bun".into()],
        }
    }
}

impl TimeoutConfig {
    pub fn limits(&self) -> Limits {
        Limits {
            execute: Duration::from_millis(self.execute_ms),
            build: Duration::from_millis(self.build_ms),
            compile: Duration::from_millis(self.compile_ms),
            install: Duration::from_millis(self.install_ms),
        }
    }
}

impl Default for Limits {
    fn default() -> Self {
        TimeoutConfig::default().limits()
    }
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl Config {
    pub const FILENAME: &str = "solbench.toml";
    pub const APP_NAME: &str = "solbench";

    pub fn example_toml() -> String {
        Asset::get(Self::FILENAME)
            .map(|file| String::from_utf8_lossy(file.data.as_ref()).into_owned())
            .unwrap_or_default()
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Find config file ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> Option<PathBuf> {
        cur_dir
            .as_ref()
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
    }

    pub fn user_config_filepath() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(Self::APP_NAME).join(Self::FILENAME))
    }

    /// Loads the nearest `solbench.toml` above `dir`, then the user-level one,
    /// falling back to built-in defaults when neither exists.
    pub fn load(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = fsutil::canonicalize_path(&dir).unwrap_or_else(|_| dir.as_ref().to_owned());
        let found = Self::find_file_in_ancestors(&dir)
            .or_else(|| Self::user_config_filepath().filter(|path| path.is_file()));
        match found {
            Some(filepath) => {
                log::debug!("Using config {}", filepath.to_string_lossy());
                Self::from_toml_file(filepath)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn init_example(dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let filepath = dir.as_ref().join(Self::FILENAME);
        anyhow::ensure!(
            !filepath.exists(),
            "Config already exists: {}",
            filepath.to_string_lossy()
        );
        fsutil::write_with_mkdir(&filepath, Self::example_toml())?;
        Ok(filepath)
    }
}

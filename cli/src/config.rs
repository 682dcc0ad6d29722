use std::path::Path;
use std::str::FromStr;

use anyhow::Context as _;
use serde::Deserialize;
use solbench_core::{config::Config, verify::BaselinePolicy};

use crate::util;

/// Settings taken from `SOLBENCH_*` environment variables.
/// They override the config file; command line flags override them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EnvOverrides {
    pub jobs: Option<usize>,
    pub baseline: Option<String>,
    pub execute_timeout_ms: Option<u64>,
}

impl EnvOverrides {
    pub const PREFIX: &str = "SOLBENCH_";

    pub fn from_env() -> anyhow::Result<Self> {
        envy::prefixed(Self::PREFIX)
            .from_env::<Self>()
            .context("Invalid SOLBENCH_* environment variable")
    }

    pub fn from_iter<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::prefixed(Self::PREFIX)
            .from_iter(vars)
            .context("Invalid SOLBENCH_* environment variable")
    }

    pub fn apply(&self, cfg: &mut Config) -> anyhow::Result<()> {
        if let Some(jobs) = self.jobs {
            cfg.run.jobs = jobs;
        }
        if let Some(baseline) = &self.baseline {
            cfg.run.baseline = BaselinePolicy::from_str(baseline)
                .with_context(|| format!("Unknown baseline policy in SOLBENCH_BASELINE: {}", baseline))?;
        }
        if let Some(ms) = self.execute_timeout_ms {
            cfg.run.timeout.execute_ms = ms;
        }
        Ok(())
    }
}

/// Config file found from `root` (or defaults), with environment overrides applied.
pub fn load_config(root: &Path) -> anyhow::Result<Config> {
    let mut cfg = Config::load(root)?;
    match &cfg.source_config_file {
        Some(path) => log::debug!(
            "Loaded config from {}",
            util::replace_homedir_to_tilde(path).to_string_lossy()
        ),
        None => log::debug!("No {} found, using defaults", Config::FILENAME),
    }

    EnvOverrides::from_env()?.apply(&mut cfg)?;
    Ok(cfg)
}

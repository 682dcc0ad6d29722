pub mod init;
pub mod list;
pub mod run;

use std::path::PathBuf;

use solbench_core::{locator::ProviderKind, verify::BaselinePolicy};

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,

    /// Directory holding the solution trees and inputs.
    #[arg(long, global = true, default_value = "./")]
    pub root: PathBuf,

    /// More logs (-v: debug, -vv: trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only warnings and errors are logged.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    #[command(alias("r"))]
    Run(run::Args),

    #[command(alias("ls"))]
    List(list::Args),

    Init(init::Args),
}

pub type SubcmdResult = anyhow::Result<()>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Run(args) => run::exec(args, self).await,
            List(args) => list::exec(args, self),
            Init(args) => init::exec(args, self),
        }
    }

    pub fn log_level(&self) -> log::LevelFilter {
        if self.quiet {
            return log::LevelFilter::Warn;
        }
        match self.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[clap(rename_all = "snake_case")]
pub enum ArgBaseline {
    None,
    FirstSuccess,
    #[value(alias = "human")]
    PreferHuman,
    HumanOnly,
}

impl From<ArgBaseline> for BaselinePolicy {
    fn from(value: ArgBaseline) -> Self {
        match value {
            ArgBaseline::None => BaselinePolicy::None,
            ArgBaseline::FirstSuccess => BaselinePolicy::FirstSuccess,
            ArgBaseline::PreferHuman => BaselinePolicy::PreferHuman,
            ArgBaseline::HumanOnly => BaselinePolicy::HumanOnly,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[clap(rename_all = "lower")]
pub enum ArgProvider {
    Reference,
    Contributed,
}

impl From<ArgProvider> for ProviderKind {
    fn from(value: ArgProvider) -> Self {
        match value {
            ArgProvider::Reference => ProviderKind::Reference,
            ArgProvider::Contributed => ProviderKind::Contributed,
        }
    }
}

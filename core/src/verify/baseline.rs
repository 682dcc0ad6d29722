use serde::{Deserialize, Serialize};

use crate::harness::ExecutionResult;
use crate::locator::{Language, ProviderKind};

/// How the reference output of a run is chosen.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BaselinePolicy {
    /// No comparison is performed.
    None,

    /// First successful entry, in entry order.
    #[default]
    FirstSuccess,

    /// First successful reference entry, else [`BaselinePolicy::FirstSuccess`].
    #[serde(alias = "human")]
    #[strum(to_string = "prefer_human", serialize = "human")]
    PreferHuman,

    /// First successful reference entry, without fallback.
    HumanOnly,
}

/// The output every other result is compared against. Frozen once selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineChoice {
    /// Position of the chosen result in the run's result list.
    pub index: usize,
    pub author: String,
    pub language: Language,
    pub provider: ProviderKind,
    pub stdout: String,
}

impl BaselineChoice {
    fn from_result(index: usize, res: &ExecutionResult) -> Self {
        Self {
            index,
            author: res.entry.author.clone(),
            language: res.entry.language.clone(),
            provider: res.entry.provider,
            stdout: res.stdout.clone(),
        }
    }
}

pub fn select(results: &[ExecutionResult], policy: BaselinePolicy) -> Option<BaselineChoice> {
    let first_success = move |accept: fn(&ExecutionResult) -> bool| {
        results
            .iter()
            .enumerate()
            .find(|(_, res)| res.success && accept(res))
    };
    let any: fn(&ExecutionResult) -> bool = |_| true;
    let reference: fn(&ExecutionResult) -> bool =
        |res| res.entry.provider == ProviderKind::Reference;

    let found = match policy {
        BaselinePolicy::None => None,
        BaselinePolicy::FirstSuccess => first_success(any),
        BaselinePolicy::PreferHuman => first_success(reference).or_else(|| first_success(any)),
        BaselinePolicy::HumanOnly => first_success(reference),
    };

    let choice = found.map(|(index, res)| BaselineChoice::from_result(index, res));
    match &choice {
        Some(c) => log::debug!("Baseline ({}): {}/{}", policy, c.author, c.language),
        None => log::debug!("No baseline ({})", policy),
    }
    choice
}

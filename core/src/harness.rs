pub mod compiled;
pub mod coordinator;
pub mod entrypoint;
pub mod error;
pub mod interpreted;
pub mod process;
pub mod result;
pub mod runner;
pub mod scripted;
pub mod stats;

pub use coordinator::*;
pub use error::{FailureKind, RunError, Stage};
pub use result::*;
pub use runner::{RunContext, RunOutput, Runner};
pub use stats::CodeStats;

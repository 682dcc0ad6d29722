pub mod baseline;
pub mod meta;
pub mod report;

pub use baseline::{select, BaselineChoice, BaselinePolicy};
pub use meta::{InputDigest, Platform, RunMeta};
pub use report::*;

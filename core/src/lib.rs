pub mod action;
pub mod config;
pub mod harness;
pub mod locator;
pub mod puzzle;
pub mod style;
pub mod verify;

pub use crate::config::Config;

//! CLI module for Bargain

pub mod app;
pub mod commands;

pub use app::{summarize, BargainApp};
pub use commands::{Cli, CommonArgs, Commands};

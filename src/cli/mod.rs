//! Command-line interface components
//!
//! This module contains CLI-specific code for the Hospital Fetcher
//! application: argument parsing, progress display and the run handler.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{Cli, GlobalArgs, RunArgs};
pub use commands::handle_run;
pub use progress::{DisplayTotals, ProgressDisplay};

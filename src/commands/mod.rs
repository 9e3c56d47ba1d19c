//! CLI command implementations for herakles-system-monitor.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Source and sensor validation
//! - `config`: Configuration file generation
//! - `sample`: One-shot sampling with printed results

pub mod check;
pub mod config;
pub mod sample;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use sample::{command_sample, render_summary, top_processes};

//! CLI arguments and subcommands for herakles-system-monitor.
//!
//! This module defines the command-line interface structure using the clap library,
//! including all flags, options, and subcommands.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Log level options for CLI parsing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Configuration format options for output
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

/// Main CLI arguments structure
#[derive(Parser, Debug)]
#[command(
    name = "herakles-system-monitor",
    about = "Live CPU, memory, sensor, storage, network and process sampler",
    long_about = "Live CPU, memory, sensor, storage, network and process sampler.\n\n\
                  Samples kernel counters on a data timeline and a decoupled graph \
                  timeline, derives CPU and process usage from consecutive readings and \
                  keeps fixed-size graph histories. Without a subcommand it runs a \
                  headless live loop that logs a summary every data interval.",
    version,
    propagate_version = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (overrides logging.level)
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Config file (YAML/JSON/TOML)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Disable all config file loading
    #[arg(long)]
    pub no_config: bool,

    /// Print effective merged config and exit
    #[arg(long)]
    pub show_config: bool,

    /// Output format for --show-config
    #[arg(long, value_enum, default_value = "yaml")]
    pub config_format: ConfigFormat,

    /// Validate config and exit (return code 1 on error)
    #[arg(long)]
    pub check_config: bool,

    /// Data refresh interval in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    /// Frames per second of the sampler loop
    #[arg(long)]
    pub frame_rate: Option<u32>,

    /// Graph refresh rate (1-60)
    #[arg(long)]
    pub fps: Option<u32>,

    /// Graph vertical scale (0-100)
    #[arg(long)]
    pub yscale: Option<f32>,

    /// Refresh graph metrics inside the data tick instead of animating
    #[arg(long)]
    pub no_animate: bool,

    /// Slots per graph history
    #[arg(long)]
    pub history: Option<usize>,

    /// procfs mount point
    #[arg(long)]
    pub proc_dir: Option<PathBuf>,

    /// Thermal sensor file (millidegrees Celsius)
    #[arg(long)]
    pub thermal: Option<PathBuf>,

    /// Fan tachometer file (RPM)
    #[arg(long)]
    pub fan: Option<PathBuf>,

    /// Compute used memory as MemTotal - MemAvailable
    #[arg(long)]
    pub use_mem_available: bool,

    /// Case-sensitive process name filter
    #[arg(long)]
    pub filter: Option<String>,
}

/// Subcommands for additional functionality
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate configuration and counter sources
    Check {
        /// Check /proc counter files
        #[arg(long)]
        proc: bool,

        /// Check battery, thermal and fan sensors
        #[arg(long)]
        sensors: bool,

        /// Check everything
        #[arg(long)]
        all: bool,
    },

    /// Generate configuration files
    Config {
        /// Output file path
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Include comments and examples
        #[arg(long)]
        commented: bool,
    },

    /// Run a few data ticks and print the resulting snapshot
    Sample {
        /// Number of data ticks
        #[arg(short = 'n', long, default_value_t = 2)]
        iterations: usize,

        /// Pause between ticks in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,

        /// Processes to print, by CPU usage
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Output format
        #[arg(long, value_enum, default_value = "yaml")]
        format: ConfigFormat,

        /// Print the full snapshot instead of a summary
        #[arg(long)]
        verbose: bool,
    },
}

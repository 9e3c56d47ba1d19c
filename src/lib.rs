//! Herakles System Monitor Library
//!
//! Sampling and delta-computation core of a live system dashboard. Raw
//! kernel counters are read on two independent timelines, paired with the
//! previous reading to derive CPU and per-process usage, and appended to
//! fixed-size graph histories.
//!
//! # Usage
//!
//! ```no_run
//! use herakles_system_monitor::{Config, Monitor, ProcSources};
//! use std::time::Duration;
//!
//! let config = Config::default();
//! let sources = ProcSources::open(&config)?;
//! let mut monitor = Monitor::new(sources, &config)?;
//!
//! // one render frame
//! monitor.frame(Duration::from_millis(16));
//!
//! let snapshot = monitor.snapshot();
//! println!("CPU {:.1}%", snapshot.cpu_percent);
//! for process in snapshot.filtered_processes() {
//!     println!("{} {} {:.0}%", process.pid, process.name, process.cpu_percent);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod collectors;
pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod format;
pub mod host;
pub mod monitor;
pub mod process;
pub mod publisher;
pub mod rate;
pub mod ringbuffer;
pub mod sample_store;
pub mod scheduler;
pub mod sources;
pub mod system;

// Re-export main types for convenience
pub use config::Config;
pub use error::{ReadError, SetupError};
pub use monitor::{Monitor, MonitorSnapshot, UiCommand};
pub use publisher::SnapshotCell;
pub use ringbuffer::RingBuffer;
pub use sample_store::GenerationPair;
pub use scheduler::{DualRateScheduler, GraphConfig, TickPlan};
pub use sources::{ProcSources, Sources};

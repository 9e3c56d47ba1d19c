//! Process-related modules for per-process counters and reconciliation.
//!
//! This module provides:
//! - `stat`: Parsing of /proc/<pid>/stat and /proc/<pid>/statm
//! - `scanner`: Process discovery and snapshot reading
//! - `reconcile`: Pairing two generations by pid into display rows

pub mod reconcile;
pub mod scanner;
pub mod stat;

use ahash::AHashMap as HashMap;

/// Pid-keyed process snapshots from one scan.
pub type ProcessTable = HashMap<u32, ProcessSnapshot>;

// Re-export commonly used types
pub use reconcile::{
    filter_views, reconcile, ProcessCounters, ProcessGeneration, ProcessView, UsageScale,
};
pub use scanner::{
    collect_proc_entries, read_process_snapshot, scan_processes, ProcEntry, ProcessSnapshot,
};
pub use stat::{parse_stat, parse_statm, ProcStat, ProcStatm, ProcessState, StatRecord};

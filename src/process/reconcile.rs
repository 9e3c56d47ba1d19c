//! Process table reconciliation.
//!
//! Matches two process generations by pid and derives per-process CPU and
//! memory percentages for the processes present in both.

use serde::Serialize;

use crate::process::stat::{ProcStat, ProcStatm, ProcessState};
use crate::process::ProcessTable;
use crate::rate::{process_cpu_percent, process_mem_percent};

/// One generation of the process table plus the aggregate CPU total read
/// in the same refresh tick, which is the baseline for process CPU%.
#[derive(Debug, Clone, Default)]
pub struct ProcessGeneration {
    pub processes: ProcessTable,
    pub cpu_total: u64,
}

/// Raw counters of one process in one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ProcessCounters {
    pub stat: ProcStat,
    pub statm: ProcStatm,
}

/// Host constants needed to turn raw process counters into percentages.
#[derive(Debug, Clone, Copy)]
pub struct UsageScale {
    pub cores: u32,
    pub page_size: u64,
    pub total_memory: u64,
}

/// Derived, display-ready process row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessView {
    pub pid: u32,
    pub name: String,
    pub state: ProcessState,
    pub cpu_percent: f32,
    pub mem_percent: f32,
    pub present: ProcessCounters,
    /// `None` for a process first observed in the present generation.
    pub past: Option<ProcessCounters>,
}

/// Builds one view per pid in `present`, ordered by pid.
///
/// Processes missing from `past` are new and report zero usage; processes
/// missing from `present` have exited and are dropped.
pub fn reconcile(
    past: &ProcessGeneration,
    present: &ProcessGeneration,
    scale: &UsageScale,
) -> Vec<ProcessView> {
    let mut views: Vec<ProcessView> = present
        .processes
        .values()
        .map(|pres| {
            let now = ProcessCounters {
                stat: pres.stat,
                statm: pres.statm,
            };
            match past.processes.get(&pres.pid) {
                Some(prev) => ProcessView {
                    pid: pres.pid,
                    name: pres.name.clone(),
                    state: pres.state,
                    cpu_percent: process_cpu_percent(
                        &prev.stat,
                        &pres.stat,
                        past.cpu_total,
                        present.cpu_total,
                        scale.cores,
                    ),
                    mem_percent: process_mem_percent(
                        pres.stat.rss,
                        scale.page_size,
                        scale.total_memory,
                    ),
                    present: now,
                    past: Some(ProcessCounters {
                        stat: prev.stat,
                        statm: prev.statm,
                    }),
                },
                None => ProcessView {
                    pid: pres.pid,
                    name: pres.name.clone(),
                    state: pres.state,
                    cpu_percent: 0.0,
                    mem_percent: 0.0,
                    present: now,
                    past: None,
                },
            }
        })
        .collect();

    views.sort_by_key(|v| v.pid);
    views
}

/// Case-sensitive substring filter on process name. Empty matches all.
pub fn filter_views<'a>(views: &'a [ProcessView], needle: &str) -> Vec<&'a ProcessView> {
    views
        .iter()
        .filter(|v| needle.is_empty() || v.name.contains(needle))
        .collect()
}

//! Process scanning utilities for discovering and reading process entries from /proc.
//!
//! A process that exits between directory listing and reading its stat file
//! is normal churn: it is skipped for this scan and never aborts enumeration.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ReadError;
use crate::process::stat::{read_stat, read_statm, ProcStat, ProcStatm, ProcessState};
use crate::process::ProcessTable;

/// Process entry representing a directory in /proc filesystem.
#[derive(Debug, Clone)]
pub struct ProcEntry {
    pub pid: u32,
    pub proc_path: PathBuf,
}

/// Point-in-time reading of one process.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub name: String,
    pub state: ProcessState,
    pub stat: ProcStat,
    pub statm: ProcStatm,
}

/// Scans a /proc-shaped directory for entries with numeric, non-zero PIDs.
pub fn collect_proc_entries(root: &Path) -> Result<Vec<ProcEntry>, ReadError> {
    let entries = fs::read_dir(root).map_err(|e| ReadError::unavailable(root, e))?;

    let mut out = Vec::new();
    for entry in entries.flatten() {
        let p = entry.path();
        let name = match p.file_name().and_then(|s| s.to_str()) {
            Some(v) => v,
            None => continue,
        };
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        let pid: u32 = match name.parse() {
            Ok(0) | Err(_) => continue,
            Ok(v) => v,
        };
        out.push(ProcEntry { pid, proc_path: p });
    }
    Ok(out)
}

/// Reads stat and statm for one process.
///
/// A missing file (or ESRCH from the kernel) is reported as
/// [`ReadError::ProcessVanished`].
pub fn read_process_snapshot(entry: &ProcEntry) -> Result<ProcessSnapshot, ReadError> {
    let vanished = |err: ReadError| match err {
        ReadError::SourceUnavailable { ref source, .. }
            if source.kind() == std::io::ErrorKind::NotFound
                || source.raw_os_error() == Some(libc::ESRCH) =>
        {
            ReadError::ProcessVanished(entry.pid)
        }
        other => other,
    };

    let record = read_stat(&entry.proc_path).map_err(vanished)?;
    let statm = read_statm(&entry.proc_path).map_err(vanished)?;

    Ok(ProcessSnapshot {
        pid: entry.pid,
        name: record.comm,
        state: ProcessState(record.stat.state),
        stat: record.stat,
        statm,
    })
}

/// Enumerates every process under `root` into a pid-keyed table.
///
/// Only an unreadable root is an error; per-process failures are skipped.
pub fn scan_processes(root: &Path) -> Result<ProcessTable, ReadError> {
    let entries = collect_proc_entries(root)?;
    let mut table = ProcessTable::with_capacity(entries.len());
    let mut skipped = 0usize;

    for entry in &entries {
        match read_process_snapshot(entry) {
            Ok(snap) => {
                table.insert(snap.pid, snap);
            }
            Err(e) => {
                skipped += 1;
                debug!("Skipping pid {}: {}", entry.pid, e);
            }
        }
    }

    if skipped > 0 {
        debug!(
            "Process scan: {} read, {} skipped of {} entries",
            table.len(),
            skipped,
            entries.len()
        );
    }
    Ok(table)
}

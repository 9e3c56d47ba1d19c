//! System-wide counter readers for the /proc filesystem.
//!
//! This module parses the aggregate CPU line of `/proc/stat` and the
//! key/value table of `/proc/meminfo` into immutable snapshots.

use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::error::ReadError;

/// Aggregate CPU time counters from the first line of /proc/stat, in jiffies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CpuCounters {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CpuCounters {
    /// Number of counter fields on the aggregate line.
    pub const FIELDS: usize = 10;

    /// Builds counters from the ten fields in /proc/stat column order.
    pub fn from_fields(f: [u64; Self::FIELDS]) -> Self {
        Self {
            user: f[0],
            nice: f[1],
            system: f[2],
            idle: f[3],
            iowait: f[4],
            irq: f[5],
            softirq: f[6],
            steal: f[7],
            guest: f[8],
            guest_nice: f[9],
        }
    }

    /// Sum of all ten fields.
    pub fn total(&self) -> u64 {
        [
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
            self.guest,
            self.guest_nice,
        ]
        .iter()
        .fold(self.user, |acc, v| acc.saturating_add(*v))
    }
}

/// Parses an aggregate CPU line: a leading label followed by ten integers.
///
/// Older kernels expose fewer columns; missing trailing fields read as zero,
/// but at least the first four (user, nice, system, idle) are required.
pub fn parse_cpu_line(line: &str) -> Result<CpuCounters, ReadError> {
    let mut parts = line.split_whitespace();
    match parts.next() {
        Some(label) if label.starts_with("cpu") => {}
        _ => return Err(ReadError::malformed("/proc/stat", "missing cpu label")),
    }

    let mut fields = [0u64; CpuCounters::FIELDS];
    let mut seen = 0;
    for (slot, raw) in fields.iter_mut().zip(parts) {
        *slot = raw
            .parse()
            .map_err(|e| ReadError::malformed("/proc/stat", format!("field {}: {}", seen, e)))?;
        seen += 1;
    }

    if seen < 4 {
        return Err(ReadError::malformed(
            "/proc/stat",
            format!("expected {} cpu fields, got {}", CpuCounters::FIELDS, seen),
        ));
    }

    Ok(CpuCounters::from_fields(fields))
}

/// Reads the aggregate ("cpu ") line of a /proc/stat-shaped file.
pub fn read_cpu_counters(path: &Path) -> Result<CpuCounters, ReadError> {
    let content = fs::read_to_string(path).map_err(|e| ReadError::unavailable(path, e))?;
    let line = content
        .lines()
        .find(|l| l.starts_with("cpu "))
        .ok_or_else(|| ReadError::malformed("/proc/stat", "no aggregate cpu line"))?;
    parse_cpu_line(line)
}

/// Raw /proc/meminfo fields in kilobytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemInfo {
    pub mem_total_kb: u64,
    pub mem_free_kb: u64,
    pub mem_available_kb: u64,
    pub buffers_kb: u64,
    pub cached_kb: u64,
    pub sreclaimable_kb: u64,
    pub swap_total_kb: u64,
    pub swap_free_kb: u64,
}

/// Used/total pair in bytes with the used fraction in `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct UsageStats {
    pub used: u64,
    pub total: u64,
    pub fraction: f64,
}

impl UsageStats {
    pub fn new(used: u64, total: u64) -> Self {
        let fraction = if total == 0 {
            0.0
        } else {
            used as f64 / total as f64
        };
        Self {
            used,
            total,
            fraction,
        }
    }
}

/// Physical memory and swap usage derived from one /proc/meminfo read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MemoryUsage {
    pub physical: UsageStats,
    pub swap: UsageStats,
}

/// Parses the `Key:   value kB` table of /proc/meminfo.
pub fn parse_meminfo(content: &str) -> Result<MemInfo, ReadError> {
    let mut info = MemInfo::default();
    let mut found_total = false;

    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else {
            continue;
        };
        let Some(value) = parse_kb_value(rest) else {
            continue;
        };

        match key.trim() {
            "MemTotal" => {
                info.mem_total_kb = value;
                found_total = true;
            }
            "MemFree" => info.mem_free_kb = value,
            "MemAvailable" => info.mem_available_kb = value,
            "Buffers" => info.buffers_kb = value,
            "Cached" => info.cached_kb = value,
            "SReclaimable" => info.sreclaimable_kb = value,
            "SwapTotal" => info.swap_total_kb = value,
            "SwapFree" => info.swap_free_kb = value,
            _ => {}
        }
    }

    if !found_total {
        return Err(ReadError::malformed("/proc/meminfo", "MemTotal missing"));
    }
    Ok(info)
}

/// Parses kilobyte values such as `"   1234 kB"`.
pub fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

impl MemInfo {
    /// Derives used/total for physical memory and swap.
    ///
    /// With `use_available` the used figure is `MemTotal - MemAvailable`,
    /// otherwise `MemTotal - (MemFree + Buffers + Cached + SReclaimable)`.
    pub fn usage(&self, use_available: bool) -> MemoryUsage {
        let reclaimable_kb = if use_available {
            self.mem_available_kb
        } else {
            self.mem_free_kb + self.buffers_kb + self.cached_kb + self.sreclaimable_kb
        };
        let phys_used = self.mem_total_kb.saturating_sub(reclaimable_kb) * 1024;
        let swap_used = self.swap_total_kb.saturating_sub(self.swap_free_kb) * 1024;

        MemoryUsage {
            physical: UsageStats::new(phys_used, self.mem_total_kb * 1024),
            swap: UsageStats::new(swap_used, self.swap_total_kb * 1024),
        }
    }
}

/// Reads and derives memory usage from a /proc/meminfo-shaped file.
pub fn read_memory_usage(path: &Path, use_available: bool) -> Result<MemoryUsage, ReadError> {
    let content = fs::read_to_string(path).map_err(|e| ReadError::unavailable(path, e))?;
    Ok(parse_meminfo(&content)?.usage(use_available))
}

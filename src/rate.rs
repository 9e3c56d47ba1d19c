//! Rate computations over pairs of counter snapshots.
//!
//! All functions are pure. A zero elapsed delta (two reads too close
//! together, or a frozen source) yields `0.0` rather than NaN or infinity,
//! and counters that appear to go backwards are treated as no progress.

use crate::process::ProcStat;
use crate::system::CpuCounters;

/// Busy percentage of the aggregate CPU between two snapshots.
///
/// Elapsed ticks are the delta of all ten fields; busy ticks are the elapsed
/// ticks minus the idle delta. The result lies in `[0, 100]`.
pub fn cpu_percent(prev: &CpuCounters, curr: &CpuCounters) -> f32 {
    let elapsed = curr.total().saturating_sub(prev.total());
    if elapsed == 0 {
        return 0.0;
    }
    let idle = curr.idle.saturating_sub(prev.idle).min(elapsed);
    let busy = elapsed - idle;

    (busy as f64 * 100.0 / elapsed as f64).clamp(0.0, 100.0) as f32
}

/// CPU percentage used by one process between two stat reads.
///
/// `cores × (Δutime + Δstime) × 100 / Δcpu_total`, rounded up to the next
/// whole percent. A single busy core therefore reads as 100.
pub fn process_cpu_percent(
    prev: &ProcStat,
    curr: &ProcStat,
    cpu_prev_total: u64,
    cpu_curr_total: u64,
    cores: u32,
) -> f32 {
    let elapsed = cpu_curr_total.saturating_sub(cpu_prev_total);
    if elapsed == 0 {
        return 0.0;
    }
    let used = curr
        .utime
        .saturating_add(curr.stime)
        .saturating_sub(prev.utime.saturating_add(prev.stime));

    (cores.max(1) as f64 * used as f64 * 100.0 / elapsed as f64).ceil() as f32
}

/// Resident memory of a process as a percentage of physical memory.
pub fn process_mem_percent(resident_pages: u64, page_size: u64, total_memory: u64) -> f32 {
    if total_memory == 0 {
        return 0.0;
    }
    (100.0 * (resident_pages as f64 * page_size as f64) / total_memory as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters(user: u64, system: u64, idle: u64, iowait: u64) -> CpuCounters {
        CpuCounters {
            user,
            system,
            idle,
            iowait,
            ..Default::default()
        }
    }

    fn stat(utime: u64, stime: u64) -> ProcStat {
        ProcStat {
            utime,
            stime,
            ..Default::default()
        }
    }

    #[test]
    fn test_cpu_percent_identical_snapshots_is_zero() {
        let x = counters(100, 50, 800, 10);
        assert_eq!(cpu_percent(&x, &x), 0.0);
        assert_eq!(cpu_percent(&CpuCounters::default(), &CpuCounters::default()), 0.0);
    }

    #[test]
    fn test_cpu_percent_half_busy() {
        let prev = counters(100, 0, 100, 0);
        let curr = counters(150, 0, 150, 0);
        assert!((cpu_percent(&prev, &curr) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_cpu_percent_bounds() {
        let base = counters(1000, 500, 8000, 100);
        let steps = [(0, 0, 10, 0), (10, 0, 0, 0), (3, 7, 90, 5), (0, 0, 0, 1), (999, 1, 0, 0)];
        for (du, ds, di, dw) in steps {
            let next = counters(base.user + du, base.system + ds, base.idle + di, base.iowait + dw);
            let pct = cpu_percent(&base, &next);
            assert!((0.0..=100.0).contains(&pct), "{} out of range", pct);
        }
        // all-idle interval
        assert_eq!(cpu_percent(&base, &counters(1000, 500, 8100, 100)), 0.0);
        // fully busy interval
        assert_eq!(cpu_percent(&base, &counters(1100, 500, 8000, 100)), 100.0);
    }

    #[test]
    fn test_cpu_percent_counter_reset_is_zero() {
        let prev = counters(1000, 1000, 1000, 0);
        let curr = counters(10, 10, 10, 0);
        assert_eq!(cpu_percent(&prev, &curr), 0.0);
    }

    #[test]
    fn test_process_cpu_percent_rounds_up() {
        // 1 core-tick of 300 elapsed ticks on 4 cores -> 1.33% -> 2%
        let pct = process_cpu_percent(&stat(10, 10), &stat(11, 10), 1000, 1300, 4);
        assert_eq!(pct, 2.0);
    }

    #[test]
    fn test_process_cpu_percent_one_full_core() {
        // 4 cores, 400 aggregate ticks elapsed, process burned 100 -> one core
        let pct = process_cpu_percent(&stat(0, 0), &stat(60, 40), 0, 400, 4);
        assert_eq!(pct, 100.0);
    }

    #[test]
    fn test_process_cpu_percent_degenerate() {
        assert_eq!(process_cpu_percent(&stat(1, 1), &stat(5, 5), 500, 500, 8), 0.0);
        // pid reuse: counters went backwards
        assert_eq!(process_cpu_percent(&stat(90, 90), &stat(1, 1), 0, 100, 2), 0.0);
    }

    #[test]
    fn test_process_cpu_percent_huge_counters() {
        let pct = process_cpu_percent(&stat(0, 0), &stat(u64::MAX, u64::MAX), 0, 400, 4);
        assert!(pct.is_finite());
        assert_eq!(cpu_percent(&counters(u64::MAX, u64::MAX, 0, 0), &counters(0, 0, 0, 0)), 0.0);
    }

    #[test]
    fn test_process_mem_percent() {
        assert!((process_mem_percent(256, 4096, 4 * 1024 * 1024) - 25.0).abs() < 1e-4);
        assert_eq!(process_mem_percent(256, 4096, 0), 0.0);
    }
}

//! Integration tests driving the monitor with synthetic counters.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use herakles_system_monitor::collectors::netdev::NetworkInterface;
use herakles_system_monitor::collectors::storage::StorageDevice;
use herakles_system_monitor::host::HostFacts;
use herakles_system_monitor::process::{
    ProcStat, ProcStatm, ProcessSnapshot, ProcessState, ProcessTable,
};
use herakles_system_monitor::system::{CpuCounters, MemoryUsage, UsageStats};
use herakles_system_monitor::{
    Config, Monitor, ReadError, SetupError, SnapshotCell, Sources, UiCommand,
};

/// Shared knobs the test turns while the monitor owns the source.
#[derive(Clone, Default)]
struct Knobs {
    clock_ms: Arc<AtomicU64>,
    utime: Arc<AtomicU64>,
    scans: Arc<AtomicU64>,
    thermal_milli: Arc<AtomicU64>,
    fail_cpu: Arc<AtomicBool>,
    fail_sensors: Arc<AtomicBool>,
    fail_battery_full: Arc<AtomicBool>,
    pids: Arc<Mutex<Vec<(u32, &'static str)>>>,
}

struct FakeSources {
    knobs: Knobs,
}

fn broken(what: &str) -> ReadError {
    ReadError::malformed(what, "synthetic failure")
}

impl Sources for FakeSources {
    fn host_facts(&self) -> HostFacts {
        HostFacts {
            hostname: "testbox".into(),
            processors: 2,
            page_size: 4096,
            total_memory: 4096 * 1000,
            ..Default::default()
        }
    }

    // user and idle both advance one tick per millisecond: a steady 50% load
    fn read_cpu(&self) -> Result<CpuCounters, ReadError> {
        if self.knobs.fail_cpu.load(Ordering::SeqCst) {
            return Err(broken("stat"));
        }
        let ms = self.knobs.clock_ms.load(Ordering::SeqCst);
        Ok(CpuCounters {
            user: ms,
            idle: ms,
            ..Default::default()
        })
    }

    fn read_memory(&self) -> Result<MemoryUsage, ReadError> {
        Ok(MemoryUsage {
            physical: UsageStats::new(700 * 1024, 1000 * 1024),
            swap: UsageStats::new(0, 0),
        })
    }

    fn read_storages(&self) -> Result<Vec<StorageDevice>, ReadError> {
        Ok(Vec::new())
    }

    fn read_interfaces(&self) -> Result<Vec<NetworkInterface>, ReadError> {
        Ok(Vec::new())
    }

    fn scan_processes(&self) -> Result<ProcessTable, ReadError> {
        self.knobs.scans.fetch_add(1, Ordering::SeqCst);
        let utime = self.knobs.utime.load(Ordering::SeqCst);
        let pids = self.knobs.pids.lock().unwrap().clone();
        Ok(pids
            .into_iter()
            .map(|(pid, name)| {
                let snap = ProcessSnapshot {
                    pid,
                    name: name.to_string(),
                    state: ProcessState('R'),
                    stat: ProcStat {
                        pid,
                        state: 'R',
                        utime,
                        rss: 100,
                        ..Default::default()
                    },
                    statm: ProcStatm {
                        resident: 100,
                        ..Default::default()
                    },
                };
                (pid, snap)
            })
            .collect())
    }

    fn read_battery_full(&self) -> Result<u64, ReadError> {
        if self.knobs.fail_battery_full.load(Ordering::SeqCst) {
            return Err(broken("energy_full"));
        }
        Ok(200)
    }

    fn read_battery(&self) -> Result<(u64, String), ReadError> {
        if self.knobs.fail_sensors.load(Ordering::SeqCst) {
            return Err(broken("energy_now"));
        }
        Ok((150, "Discharging".into()))
    }

    fn read_thermal(&self) -> Result<f32, ReadError> {
        if self.knobs.fail_sensors.load(Ordering::SeqCst) {
            return Err(broken("temp1_input"));
        }
        Ok(self.knobs.thermal_milli.load(Ordering::SeqCst) as f32 / 1000.0)
    }

    fn read_fan(&self) -> Result<u64, ReadError> {
        if self.knobs.fail_sensors.load(Ordering::SeqCst) {
            return Err(broken("fan1_input"));
        }
        Ok(2400)
    }
}

fn knobs() -> Knobs {
    let knobs = Knobs::default();
    knobs.thermal_milli.store(40_000, Ordering::SeqCst);
    *knobs.pids.lock().unwrap() = vec![(7, "firefox"), (8, "bash"), (9, "Firefox-bin")];
    knobs
}

fn monitor(knobs: &Knobs, animated: bool) -> Monitor<FakeSources> {
    let mut config = Config::default();
    config.graph.animated = animated;
    Monitor::new(
        FakeSources {
            knobs: knobs.clone(),
        },
        &config,
    )
    .expect("monitor should start")
}

fn advance(knobs: &Knobs, ms: u64) {
    knobs.clock_ms.fetch_add(ms, Ordering::SeqCst);
}

#[test]
fn test_dual_rate_timelines_are_independent() {
    let knobs = knobs();
    let mut monitor = monitor(&knobs, true);
    let frame = Duration::from_millis(10);

    for _ in 0..10_000 {
        advance(&knobs, 10);
        monitor.frame(frame);
    }

    assert_eq!(monitor.data_cpu().ticks(), 100);
    let graph_ticks = monitor.graph_cpu().ticks();
    assert!((2990..=3000).contains(&graph_ticks), "graph ticks {}", graph_ticks);
    assert_eq!(monitor.data_ticks(), 100);
    assert_eq!(monitor.graph_ticks(), graph_ticks);

    // the data pair spans one second, the graph pair a single 1/30 s frame
    let data_span = monitor.data_cpu().delta(|a, b| b.total() - a.total()).unwrap();
    let graph_span = monitor.graph_cpu().delta(|a, b| b.total() - a.total()).unwrap();
    assert_eq!(data_span, 2000);
    assert!(graph_span > 0 && graph_span < 100, "graph span {}", graph_span);

    assert_eq!(monitor.cpu_percent(), 50.0);
    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.graph_cpu_percent, 50.0);
    assert_eq!(snapshot.history.cpu.len(), 60);
    assert_eq!(snapshot.history.cpu.latest(), 50.0);
}

#[test]
fn test_selection_freezes_process_table() {
    let knobs = knobs();
    let mut monitor = monitor(&knobs, true);

    advance(&knobs, 1000);
    monitor.data_tick();
    assert_eq!(knobs.scans.load(Ordering::SeqCst), 2);
    let before = monitor.views().to_vec();
    assert_eq!(before.len(), 3);
    assert!(before.iter().all(|v| v.cpu_percent == 0.0));

    monitor.toggle_selection(7);
    for _ in 0..3 {
        advance(&knobs, 1000);
        knobs.utime.fetch_add(20, Ordering::SeqCst);
        knobs.thermal_milli.fetch_add(1000, Ordering::SeqCst);
        monitor.data_tick();
        monitor.graph_tick();
    }

    // processes frozen, everything else kept refreshing
    assert_eq!(knobs.scans.load(Ordering::SeqCst), 2);
    assert_eq!(monitor.views(), &before[..]);
    assert_eq!(monitor.process_generations().ticks(), 1);
    assert_eq!(monitor.data_cpu().ticks(), 4);
    assert_eq!(monitor.sensors().thermal_celsius, 43.0);
    assert_eq!(monitor.snapshot().selection, vec![7]);

    // toggling twice deselects
    monitor.toggle_selection(8);
    monitor.toggle_selection(8);
    assert_eq!(monitor.snapshot().selection, vec![7]);

    monitor.clear_selection();
    advance(&knobs, 1000);
    monitor.data_tick();
    assert_eq!(knobs.scans.load(Ordering::SeqCst), 3);

    // 2 cores * 60 ticks * 100 / 8000 elapsed ticks = 1.5, rounded up
    let firefox = monitor.views().iter().find(|v| v.pid == 7).unwrap();
    assert_eq!(firefox.cpu_percent, 2.0);
    assert_eq!(firefox.past.unwrap().stat.utime, 0);
    assert_eq!(firefox.present.stat.utime, 60);
}

#[test]
fn test_exited_and_new_processes() {
    let knobs = knobs();
    let mut monitor = monitor(&knobs, true);

    *knobs.pids.lock().unwrap() = vec![(8, "bash"), (10, "vim")];
    advance(&knobs, 1000);
    monitor.data_tick();

    let pids: Vec<u32> = monitor.views().iter().map(|v| v.pid).collect();
    assert_eq!(pids, vec![8, 10]);
    let vim = &monitor.views()[1];
    assert!(vim.past.is_none());
    assert_eq!((vim.cpu_percent, vim.mem_percent), (0.0, 0.0));
    // 100 pages of 4096 bytes out of 1000 pages
    assert!((monitor.views()[0].mem_percent - 10.0).abs() < 1e-4);
}

#[test]
fn test_filter_does_not_mutate_table() {
    let knobs = knobs();
    let mut monitor = monitor(&knobs, true);
    advance(&knobs, 1000);
    monitor.data_tick();

    monitor.apply(UiCommand::Filter("fire".into()));
    let snapshot = monitor.snapshot();
    let hits: Vec<u32> = snapshot.filtered_processes().iter().map(|v| v.pid).collect();
    assert_eq!(hits, vec![7]);
    assert_eq!(snapshot.processes.len(), 3);
    assert_eq!(monitor.views().len(), 3);
    assert_eq!(monitor.filtered_views().len(), 1);

    monitor.set_filter("");
    assert_eq!(monitor.filtered_views().len(), 3);
}

#[test]
fn test_missing_sensor_refuses_start() {
    let knobs = knobs();
    knobs.fail_battery_full.store(true, Ordering::SeqCst);
    let result = Monitor::new(
        FakeSources {
            knobs: knobs.clone(),
        },
        &Config::default(),
    );
    assert!(matches!(
        result,
        Err(SetupError::SensorUnavailable {
            sensor: "battery",
            ..
        })
    ));

    let knobs = self::knobs();
    knobs.fail_sensors.store(true, Ordering::SeqCst);
    let result = Monitor::new(FakeSources { knobs }, &Config::default());
    assert!(result.is_err());
}

#[test]
fn test_unreadable_cpu_refuses_start() {
    let knobs = knobs();
    knobs.fail_cpu.store(true, Ordering::SeqCst);
    let result = Monitor::new(FakeSources { knobs }, &Config::default());
    assert!(matches!(result, Err(SetupError::Seed { what: "cpu", .. })));
}

#[test]
fn test_failed_reads_keep_previous_values() {
    let knobs = knobs();
    let mut monitor = monitor(&knobs, false);

    advance(&knobs, 1000);
    monitor.data_tick();
    assert_eq!(monitor.sensors().thermal_celsius, 40.0);
    assert_eq!(monitor.cpu_percent(), 50.0);

    knobs.fail_sensors.store(true, Ordering::SeqCst);
    knobs.fail_cpu.store(true, Ordering::SeqCst);
    knobs.thermal_milli.store(99_000, Ordering::SeqCst);
    advance(&knobs, 1000);
    monitor.data_tick();

    let sensors = monitor.sensors();
    assert_eq!(sensors.thermal_celsius, 40.0);
    assert_eq!(sensors.fan_rpm, 2400);
    assert_eq!(sensors.battery.status, "Discharging");
    assert_eq!(monitor.cpu_percent(), 50.0);
    assert_eq!(monitor.data_cpu().ticks(), 1);
    // history still advances with the last-known value
    assert_eq!(monitor.history().thermal.latest(), 40.0);
    let thermal = monitor.history().thermal.values();
    assert_eq!(&thermal[58..], &[40.0, 40.0]);

    knobs.fail_sensors.store(false, Ordering::SeqCst);
    knobs.fail_cpu.store(false, Ordering::SeqCst);
    advance(&knobs, 1000);
    monitor.data_tick();
    assert_eq!(monitor.sensors().thermal_celsius, 99.0);
}

#[test]
fn test_non_animated_sensors_refresh_on_data_tick() {
    let knobs = knobs();
    let mut monitor = monitor(&knobs, false);
    let frame = Duration::from_millis(100);

    for _ in 0..50 {
        advance(&knobs, 100);
        knobs.thermal_milli.fetch_add(100, Ordering::SeqCst);
        monitor.frame(frame);
    }

    // ticks at 0s, 1s, 2s, 3s and 4s of accumulated time
    assert_eq!(monitor.data_ticks(), 5);
    assert_eq!(monitor.graph_ticks(), 0);
    assert_eq!(monitor.graph_cpu().ticks(), 0);

    let snapshot = monitor.snapshot();
    assert_eq!(snapshot.battery_percent, 75.0);
    assert_eq!(snapshot.history.battery.latest(), 75.0);
    assert_eq!(snapshot.history.fan.latest(), 2400.0);
    assert!(snapshot.history.thermal.latest() > 40.0);
    // the CPU graph only moves on graph ticks
    assert!(snapshot.history.cpu.values().iter().all(|v| *v == 0.0));

    monitor.apply(UiCommand::Animate(true));
    for _ in 0..10 {
        advance(&knobs, 100);
        monitor.frame(frame);
    }
    assert!(monitor.graph_ticks() > 0);
}

#[test]
fn test_graph_commands_are_clamped() {
    let knobs = knobs();
    let mut monitor = monitor(&knobs, true);
    monitor.apply(UiCommand::Fps(500));
    monitor.apply(UiCommand::YScale(-1.0));
    assert_eq!(monitor.graph().fps, 60);
    assert_eq!(monitor.graph().yscale, 0.0);

    monitor.apply(UiCommand::Fps(0));
    assert_eq!(monitor.graph().fps, 1);
}

#[test]
fn test_snapshot_cell_handoff() {
    let knobs = knobs();
    let mut monitor = monitor(&knobs, true);
    let cell = SnapshotCell::new(monitor.snapshot());

    let held = cell.load();
    assert_eq!(held.data_ticks, 0);

    advance(&knobs, 1000);
    monitor.data_tick();
    cell.publish(monitor.snapshot());

    // a reader keeps its consistent view until it loads again
    assert_eq!(held.data_ticks, 0);
    assert!(held.processes.is_empty());
    let fresh = cell.load();
    assert_eq!(fresh.data_ticks, 1);
    assert_eq!(fresh.processes.len(), 3);
    assert_eq!(fresh.host.hostname, "testbox");
}

#[test]
fn test_snapshot_serializes() {
    let knobs = knobs();
    let mut monitor = monitor(&knobs, true);
    advance(&knobs, 1000);
    monitor.data_tick();

    let json = serde_json::to_value(monitor.snapshot()).unwrap();
    assert_eq!(json["cpu_percent"], 50.0);
    assert_eq!(json["history"]["cpu"].as_array().unwrap().len(), 60);
    assert_eq!(json["processes"][0]["state"], "R");
}

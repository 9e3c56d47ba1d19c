//! Sample command implementation.
//!
//! Runs a few data ticks against the live system and prints the result.

use std::fmt::Write as _;
use std::thread;
use std::time::{Duration, Instant};

use crate::cli::ConfigFormat;
use crate::collectors::netdev::{RX_BYTES, TX_BYTES};
use crate::config::Config;
use crate::format::{human_readable, human_readable_si};
use crate::monitor::{Monitor, MonitorSnapshot};
use crate::process::ProcessView;
use crate::sources::ProcSources;

/// Filtered processes ordered by CPU, then memory, highest first.
pub fn top_processes(snapshot: &MonitorSnapshot, top: usize) -> Vec<&ProcessView> {
    let mut rows = snapshot.filtered_processes();
    rows.sort_by(|a, b| {
        b.cpu_percent
            .total_cmp(&a.cpu_percent)
            .then(b.mem_percent.total_cmp(&a.mem_percent))
            .then(a.pid.cmp(&b.pid))
    });
    rows.truncate(top);
    rows
}

/// Multi-line console summary of one snapshot.
pub fn render_summary(snapshot: &MonitorSnapshot, top: usize) -> String {
    let mut out = String::new();
    let host = &snapshot.host;
    let mem = &snapshot.memory;
    let sensors = &snapshot.sensors;

    // fmt::Write into a String cannot fail
    let _ = writeln!(
        out,
        "🖥️  {}@{} | {} {} | {}",
        host.user, host.hostname, host.os_name, host.kernel_release, host.cpu_model
    );
    let _ = writeln!(
        out,
        "   CPU {:5.1}% (avg {:5.1}%) | RAM {} / {} ({:.1}%) | Swap {} / {}",
        snapshot.cpu_percent,
        snapshot.history.cpu.average(),
        human_readable(mem.physical.used),
        human_readable(mem.physical.total),
        mem.physical.fraction * 100.0,
        human_readable(mem.swap.used),
        human_readable(mem.swap.total),
    );
    let _ = writeln!(
        out,
        "   Battery {:.0}% ({}) | Thermal {:.1} °C | Fan {} RPM",
        snapshot.battery_percent,
        sensors.battery.status,
        sensors.thermal_celsius,
        sensors.fan_rpm
    );

    for dev in &snapshot.storages {
        let _ = writeln!(
            out,
            "   💽 {} {} / {} ({:.1}%)",
            dev.device,
            human_readable_si(dev.used),
            human_readable_si(dev.total),
            dev.fraction * 100.0
        );
    }
    for iface in &snapshot.interfaces {
        let _ = writeln!(
            out,
            "   🌐 {} {} [{}] rx {} tx {}",
            iface.name,
            iface.addr,
            if iface.is_up { "up" } else { "down" },
            human_readable(iface.values[RX_BYTES]),
            human_readable(iface.values[TX_BYTES])
        );
    }

    let rows = top_processes(snapshot, top);
    let _ = writeln!(
        out,
        "   ⚙️  {} processes{}",
        snapshot.processes.len(),
        if snapshot.filter.is_empty() {
            String::new()
        } else {
            format!(", {} matching '{}'", snapshot.filtered_processes().len(), snapshot.filter)
        }
    );
    for p in rows {
        let _ = writeln!(
            out,
            "   ├─ {:>7} {:<20} {} {:>5.1}% cpu {:>5.1}% mem",
            p.pid,
            p.name,
            p.state.code(),
            p.cpu_percent,
            p.mem_percent
        );
    }
    out
}

/// Runs `iterations` data ticks and prints the final snapshot.
pub fn command_sample(
    iterations: usize,
    interval_ms: u64,
    top: usize,
    format: ConfigFormat,
    verbose: bool,
    config: &Config,
) -> anyhow::Result<()> {
    println!("🧪 Herakles System Monitor - Sample Mode");
    println!("========================================");

    let sources = ProcSources::open(config)?;
    let mut monitor = Monitor::new(sources, config)?;

    for iteration in 1..=iterations.max(1) {
        if iteration > 1 {
            thread::sleep(Duration::from_millis(interval_ms));
        }
        let start = Instant::now();
        monitor.data_tick();
        monitor.graph_tick();
        println!(
            "🔄 Tick {}/{}: {:.2}ms, CPU {:.1}%, {} processes",
            iteration,
            iterations.max(1),
            start.elapsed().as_secs_f64() * 1000.0,
            monitor.cpu_percent(),
            monitor.views().len()
        );
    }

    let snapshot = monitor.snapshot();
    if verbose {
        let output = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(&snapshot)?,
            // through Value so scalar fields are emitted before nested tables
            ConfigFormat::Toml => toml::to_string_pretty(&toml::Value::try_from(&snapshot)?)?,
            ConfigFormat::Yaml => serde_yaml::to_string(&snapshot)?,
        };
        println!("{}", output);
    } else {
        print!("{}", render_summary(&snapshot, top));
    }

    println!("\n✅ Sample completed successfully");
    Ok(())
}

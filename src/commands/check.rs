//! Check command implementation.
//!
//! Validates counter sources, sensors and configuration.

use anyhow::bail;

use crate::collectors::netdev::read_netdev;
use crate::collectors::sensors::SensorSet;
use crate::collectors::storage::read_storages;
use crate::config::{validate_effective_config, Config};
use crate::format::human_readable;
use crate::process::scan_processes;
use crate::system::{read_cpu_counters, read_memory_usage};

fn report<T, E: std::fmt::Display>(
    label: &str,
    result: Result<T, E>,
    ok: impl FnOnce(T) -> String,
) -> bool {
    match result {
        Ok(v) => {
            println!("   ✅ {}: {}", label, ok(v));
            true
        }
        Err(e) => {
            println!("   ❌ {}: {}", label, e);
            false
        }
    }
}

/// Validates counter sources and configuration.
pub fn command_check(proc: bool, sensors: bool, all: bool, config: &Config) -> anyhow::Result<()> {
    println!("🔍 Herakles System Monitor - System Check");
    println!("=========================================");

    let mut all_ok = true;
    let src = &config.sources;

    if proc || all {
        println!("\n📁 Checking {} counters...", src.proc_dir.display());
        all_ok &= report("CPU stat", read_cpu_counters(&src.stat_path()), |c| {
            format!("{} ticks total", c.total())
        });
        all_ok &= report(
            "Memory",
            read_memory_usage(&src.meminfo_path(), config.memory.use_mem_available),
            |m| {
                format!(
                    "{} of {} used",
                    human_readable(m.physical.used),
                    human_readable(m.physical.total)
                )
            },
        );
        all_ok &= report("Network devices", read_netdev(&src.netdev_path()), |d| {
            format!("{} interfaces", d.len())
        });
        all_ok &= report("Processes", scan_processes(&src.proc_dir), |t| {
            format!("{} readable", t.len())
        });
        // storage is optional on containers and VMs
        report(
            "Storage",
            read_storages(&src.disk_by_path_dir, &src.mounts_path()),
            |s| format!("{} mounted devices", s.len()),
        );
    }

    if sensors || all {
        println!("\n🌡️  Checking sensors...");
        match SensorSet::open(&config.sensors) {
            Ok(set) => {
                all_ok &= report("Battery", set.battery.read_full(), |full| {
                    format!("full charge {}", full)
                });
                all_ok &= report("Thermal", set.thermal.read_celsius(), |c| {
                    format!("{:.1} °C", c)
                });
                all_ok &= report("Fan", set.fan.read_rpm(), |rpm| format!("{} RPM", rpm));
            }
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }
    }

    println!("\n⚙️  Checking configuration...");
    all_ok &= report("Configuration", validate_effective_config(config), |_| "valid".to_string());

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        bail!("system check failed")
    }
}

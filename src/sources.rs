//! Counter sources consumed by the monitor.
//!
//! [`Sources`] is the seam between the sampling core and the machine. The
//! production implementation reads procfs, sysfs and `statvfs`; tests plug
//! in synthetic counters.

use std::path::Path;
use tracing::info;

use crate::collectors::netdev::{read_interfaces, NetworkInterface};
use crate::collectors::sensors::SensorSet;
use crate::collectors::storage::{read_storages, StorageDevice};
use crate::config::{Config, SourcesConfig};
use crate::error::{ReadError, SetupError};
use crate::host::HostFacts;
use crate::process::{scan_processes, ProcessTable};
use crate::system::{read_cpu_counters, read_memory_usage, CpuCounters, MemoryUsage};

/// Everything the monitor reads. Each call is one fresh, stateless read.
pub trait Sources {
    fn host_facts(&self) -> HostFacts;
    fn read_cpu(&self) -> Result<CpuCounters, ReadError>;
    fn read_memory(&self) -> Result<MemoryUsage, ReadError>;
    fn read_storages(&self) -> Result<Vec<StorageDevice>, ReadError>;
    fn read_interfaces(&self) -> Result<Vec<NetworkInterface>, ReadError>;
    fn scan_processes(&self) -> Result<ProcessTable, ReadError>;
    /// Full battery capacity; read once at start-up.
    fn read_battery_full(&self) -> Result<u64, ReadError>;
    /// Current battery charge and status.
    fn read_battery(&self) -> Result<(u64, String), ReadError>;
    /// Degrees Celsius.
    fn read_thermal(&self) -> Result<f32, ReadError>;
    /// Revolutions per minute.
    fn read_fan(&self) -> Result<u64, ReadError>;
}

/// procfs/sysfs backed sources.
#[derive(Debug, Clone)]
pub struct ProcSources {
    paths: SourcesConfig,
    sensors: SensorSet,
    use_mem_available: bool,
    host: HostFacts,
}

impl ProcSources {
    /// Opens the mandatory sensors and reads host facts.
    pub fn open(cfg: &Config) -> Result<Self, SetupError> {
        let sensors = SensorSet::open(&cfg.sensors)?;
        let host = HostFacts::read(&cfg.sources.cpuinfo_path());
        info!(
            "Host: {} ({} {}), {} processors, {} bytes memory",
            host.hostname, host.os_name, host.kernel_release, host.processors, host.total_memory
        );
        Ok(Self {
            paths: cfg.sources.clone(),
            sensors,
            use_mem_available: cfg.memory.use_mem_available,
            host,
        })
    }

    pub fn proc_dir(&self) -> &Path {
        &self.paths.proc_dir
    }
}

impl Sources for ProcSources {
    fn host_facts(&self) -> HostFacts {
        self.host.clone()
    }

    fn read_cpu(&self) -> Result<CpuCounters, ReadError> {
        read_cpu_counters(&self.paths.stat_path())
    }

    fn read_memory(&self) -> Result<MemoryUsage, ReadError> {
        read_memory_usage(&self.paths.meminfo_path(), self.use_mem_available)
    }

    fn read_storages(&self) -> Result<Vec<StorageDevice>, ReadError> {
        read_storages(&self.paths.disk_by_path_dir, &self.paths.mounts_path())
    }

    fn read_interfaces(&self) -> Result<Vec<NetworkInterface>, ReadError> {
        read_interfaces(&self.paths.netdev_path())
    }

    fn scan_processes(&self) -> Result<ProcessTable, ReadError> {
        scan_processes(&self.paths.proc_dir)
    }

    fn read_battery_full(&self) -> Result<u64, ReadError> {
        self.sensors.battery.read_full()
    }

    fn read_battery(&self) -> Result<(u64, String), ReadError> {
        self.sensors.battery.read_now()
    }

    fn read_thermal(&self) -> Result<f32, ReadError> {
        self.sensors.thermal.read_celsius()
    }

    fn read_fan(&self) -> Result<u64, ReadError> {
        self.sensors.fan.read_rpm()
    }
}

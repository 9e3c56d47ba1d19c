//! The sampling context: owns every piece of sampled state and advances it
//! one render frame at a time.
//!
//! Within a frame the order is fixed: CPU stat, memory, storage, network,
//! processes, then graph metrics. Readers that fail keep the previous value
//! on screen; only start-up is allowed to fail hard.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::collectors::netdev::NetworkInterface;
use crate::collectors::sensors::BatteryReading;
use crate::collectors::storage::StorageDevice;
use crate::config::Config;
use crate::error::SetupError;
use crate::host::HostFacts;
use crate::process::{filter_views, reconcile, ProcessGeneration, ProcessView, UsageScale};
use crate::rate::cpu_percent;
use crate::ringbuffer::RingBuffer;
use crate::sample_store::GenerationPair;
use crate::scheduler::{DualRateScheduler, GraphConfig, TickPlan};
use crate::sources::Sources;
use crate::system::{CpuCounters, MemoryUsage};

/// Graph histories, one per graphed metric.
#[derive(Debug, Clone, Serialize)]
pub struct Histories {
    pub cpu: RingBuffer<f32>,
    pub battery: RingBuffer<f32>,
    pub thermal: RingBuffer<f32>,
    pub fan: RingBuffer<f32>,
}

impl Histories {
    pub fn new(capacity: usize) -> Self {
        Self {
            cpu: RingBuffer::new(capacity),
            battery: RingBuffer::new(capacity),
            thermal: RingBuffer::new(capacity),
            fan: RingBuffer::new(capacity),
        }
    }
}

/// Latest battery, thermal and fan values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensorReadings {
    pub battery: BatteryReading,
    pub thermal_celsius: f32,
    pub fan_rpm: u64,
}

/// Immutable view of the monitor handed to the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct MonitorSnapshot {
    pub taken_at: DateTime<Utc>,
    pub host: HostFacts,
    pub cpu_percent: f32,
    pub graph_cpu_percent: f32,
    pub cpu: Option<CpuCounters>,
    pub memory: MemoryUsage,
    pub storages: Vec<StorageDevice>,
    pub interfaces: Vec<NetworkInterface>,
    pub processes: Vec<ProcessView>,
    pub filter: String,
    pub selection: Vec<u32>,
    pub sensors: SensorReadings,
    pub battery_percent: f32,
    pub history: Histories,
    pub graph: GraphConfig,
    pub data_ticks: u64,
    pub graph_ticks: u64,
}

impl MonitorSnapshot {
    /// Process rows passing the current name filter.
    pub fn filtered_processes(&self) -> Vec<&ProcessView> {
        filter_views(&self.processes, &self.filter)
    }
}

/// Writes the renderer is allowed to make into monitor state.
#[derive(Debug, Clone, PartialEq)]
pub enum UiCommand {
    Filter(String),
    ToggleSelection(u32),
    ClearSelection,
    Animate(bool),
    Fps(u32),
    YScale(f32),
}

impl FromStr for UiCommand {
    type Err = String;

    /// Parses console commands such as `filter ssh`, `select 42`, `fps 20`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, arg) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        let arg = arg.trim();
        let number = |what: &str| format!("{} expects a number, got '{}'", what, arg);

        match verb {
            "filter" => Ok(UiCommand::Filter(arg.to_string())),
            "select" => arg
                .parse()
                .map(UiCommand::ToggleSelection)
                .map_err(|_| number("select")),
            "clear" => Ok(UiCommand::ClearSelection),
            "animate" => match arg {
                "on" | "true" | "1" => Ok(UiCommand::Animate(true)),
                "off" | "false" | "0" => Ok(UiCommand::Animate(false)),
                _ => Err(format!("animate expects on/off, got '{}'", arg)),
            },
            "fps" => arg.parse().map(UiCommand::Fps).map_err(|_| number("fps")),
            "yscale" => arg.parse().map(UiCommand::YScale).map_err(|_| number("yscale")),
            other => Err(format!("unknown command '{}'", other)),
        }
    }
}

/// Sampling context over a set of counter sources.
pub struct Monitor<S> {
    sources: S,
    host: HostFacts,
    scale: UsageScale,
    scheduler: DualRateScheduler,
    graph: GraphConfig,

    data_cpu: GenerationPair<CpuCounters>,
    graph_cpu: GenerationPair<CpuCounters>,
    processes: GenerationPair<ProcessGeneration>,

    cpu_percent: f32,
    graph_cpu_percent: f32,
    memory: MemoryUsage,
    storages: Vec<StorageDevice>,
    interfaces: Vec<NetworkInterface>,
    views: Vec<ProcessView>,
    sensors: SensorReadings,
    history: Histories,

    filter: String,
    selection: BTreeSet<u32>,
    data_ticks: u64,
    graph_ticks: u64,
}

impl<S: Sources> Monitor<S> {
    /// Seeds both CPU timelines and the process table, and takes the first
    /// sensor readings. Any failure here refuses start-up.
    pub fn new(sources: S, cfg: &Config) -> Result<Self, SetupError> {
        let host = sources.host_facts();
        let scale = UsageScale {
            cores: host.processors.max(1),
            page_size: host.page_size,
            total_memory: host.total_memory,
        };

        let seed_cpu = || {
            sources
                .read_cpu()
                .map_err(|source| SetupError::Seed { what: "cpu", source })
        };
        let mut data_cpu = GenerationPair::new();
        data_cpu.observe(seed_cpu()?);
        let mut graph_cpu = GenerationPair::new();
        graph_cpu.observe(seed_cpu()?);

        let table = sources.scan_processes().map_err(|source| SetupError::Seed {
            what: "processes",
            source,
        })?;
        let mut processes = GenerationPair::new();
        processes.observe(ProcessGeneration {
            processes: table,
            cpu_total: data_cpu.latest().map(CpuCounters::total).unwrap_or(0),
        });

        let battery_err = |source| SetupError::SensorUnavailable {
            sensor: "battery",
            source,
        };
        let full = sources.read_battery_full().map_err(battery_err)?;
        let (now, status) = sources.read_battery().map_err(battery_err)?;
        let thermal_celsius = sources
            .read_thermal()
            .map_err(|source| SetupError::SensorUnavailable {
                sensor: "thermal",
                source,
            })?;
        let fan_rpm = sources
            .read_fan()
            .map_err(|source| SetupError::SensorUnavailable {
                sensor: "fan",
                source,
            })?;

        let mut graph = cfg.graph.clone();
        graph.set_fps(graph.fps);
        graph.set_yscale(graph.yscale);

        info!(
            "Monitor seeded: {} processes, data interval {}ms, graph {} fps (animated: {})",
            processes.latest().map(|g| g.processes.len()).unwrap_or(0),
            cfg.refresh.data_interval_ms,
            graph.fps,
            graph.animated
        );

        Ok(Self {
            sources,
            host,
            scale,
            scheduler: DualRateScheduler::new(Duration::from_millis(cfg.refresh.data_interval_ms)),
            graph,
            data_cpu,
            graph_cpu,
            processes,
            cpu_percent: 0.0,
            graph_cpu_percent: 0.0,
            memory: MemoryUsage::default(),
            storages: Vec::new(),
            interfaces: Vec::new(),
            views: Vec::new(),
            sensors: SensorReadings {
                battery: BatteryReading { now, full, status },
                thermal_celsius,
                fan_rpm,
            },
            history: Histories::new(cfg.history.capacity),
            filter: cfg.process.filter.clone(),
            selection: BTreeSet::new(),
            data_ticks: 0,
            graph_ticks: 0,
        })
    }

    /// Advances both timelines by one render frame of length `dt`.
    pub fn frame(&mut self, dt: Duration) -> TickPlan {
        let plan = self.scheduler.poll(dt, &self.graph);
        if plan.data {
            self.data_tick();
        }
        if plan.graph {
            self.graph_tick();
        }
        plan
    }

    /// Runs one data tick immediately, outside the scheduler.
    pub fn data_tick(&mut self) {
        match self.sources.read_cpu() {
            Ok(cpu) => {
                self.data_cpu.observe(cpu);
                self.cpu_percent = self.data_cpu.delta(cpu_percent).unwrap_or(0.0);
            }
            Err(e) => warn!("CPU stat read failed, keeping previous value: {}", e),
        }

        match self.sources.read_memory() {
            Ok(memory) => self.memory = memory,
            Err(e) => warn!("Memory read failed, keeping previous value: {}", e),
        }

        match self.sources.read_storages() {
            Ok(storages) => self.storages = storages,
            Err(e) => warn!("Storage read failed, keeping previous list: {}", e),
        }

        match self.sources.read_interfaces() {
            Ok(interfaces) => self.interfaces = interfaces,
            Err(e) => warn!("Interface read failed, keeping previous list: {}", e),
        }

        if self.selection.is_empty() {
            self.refresh_processes();
        } else {
            debug!(
                "Process table frozen while {} rows are selected",
                self.selection.len()
            );
        }

        if !self.graph.animated {
            self.refresh_sensors();
            self.push_sensor_history();
        }

        self.data_ticks += 1;
    }

    fn refresh_processes(&mut self) {
        let table = match self.sources.scan_processes() {
            Ok(table) => table,
            Err(e) => {
                warn!("Process scan failed, keeping previous table: {}", e);
                return;
            }
        };

        self.processes.observe(ProcessGeneration {
            processes: table,
            cpu_total: self.data_cpu.latest().map(CpuCounters::total).unwrap_or(0),
        });
        let scale = self.scale;
        self.views = self
            .processes
            .delta(|past, present| reconcile(past, present, &scale))
            .unwrap_or_default();
    }

    /// Runs one graph tick immediately, outside the scheduler.
    pub fn graph_tick(&mut self) {
        match self.sources.read_cpu() {
            Ok(cpu) => {
                self.graph_cpu.observe(cpu);
                self.graph_cpu_percent = self.graph_cpu.delta(cpu_percent).unwrap_or(0.0);
            }
            Err(e) => warn!("Graph CPU read failed, keeping previous value: {}", e),
        }
        self.history.cpu.push(self.graph_cpu_percent);

        self.refresh_sensors();
        self.push_sensor_history();
        self.graph_ticks += 1;
    }

    fn refresh_sensors(&mut self) {
        match self.sources.read_battery() {
            Ok((now, status)) => {
                self.sensors.battery.now = now;
                self.sensors.battery.status = status;
            }
            Err(e) => warn!("Battery read failed, keeping previous value: {}", e),
        }
        match self.sources.read_thermal() {
            Ok(celsius) => self.sensors.thermal_celsius = celsius,
            Err(e) => warn!("Thermal read failed, keeping previous value: {}", e),
        }
        match self.sources.read_fan() {
            Ok(rpm) => self.sensors.fan_rpm = rpm,
            Err(e) => warn!("Fan read failed, keeping previous value: {}", e),
        }
    }

    fn push_sensor_history(&mut self) {
        self.history.battery.push(self.sensors.battery.percent());
        self.history.thermal.push(self.sensors.thermal_celsius);
        self.history.fan.push(self.sensors.fan_rpm as f32);
    }

    /// Applies one renderer write.
    pub fn apply(&mut self, cmd: UiCommand) {
        debug!("UI command: {:?}", cmd);
        match cmd {
            UiCommand::Filter(text) => self.set_filter(text),
            UiCommand::ToggleSelection(pid) => self.toggle_selection(pid),
            UiCommand::ClearSelection => self.clear_selection(),
            UiCommand::Animate(on) => self.graph.set_animated(on),
            UiCommand::Fps(fps) => self.graph.set_fps(fps),
            UiCommand::YScale(scale) => self.graph.set_yscale(scale),
        }
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    /// Selects `pid`, or deselects it when already selected.
    pub fn toggle_selection(&mut self, pid: u32) {
        if !self.selection.remove(&pid) {
            self.selection.insert(pid);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn graph_mut(&mut self) -> &mut GraphConfig {
        &mut self.graph
    }

    pub fn graph(&self) -> &GraphConfig {
        &self.graph
    }

    pub fn data_cpu(&self) -> &GenerationPair<CpuCounters> {
        &self.data_cpu
    }

    pub fn graph_cpu(&self) -> &GenerationPair<CpuCounters> {
        &self.graph_cpu
    }

    pub fn process_generations(&self) -> &GenerationPair<ProcessGeneration> {
        &self.processes
    }

    pub fn cpu_percent(&self) -> f32 {
        self.cpu_percent
    }

    pub fn views(&self) -> &[ProcessView] {
        &self.views
    }

    pub fn filtered_views(&self) -> Vec<&ProcessView> {
        filter_views(&self.views, &self.filter)
    }

    pub fn sensors(&self) -> &SensorReadings {
        &self.sensors
    }

    pub fn history(&self) -> &Histories {
        &self.history
    }

    pub fn memory(&self) -> &MemoryUsage {
        &self.memory
    }

    pub fn host(&self) -> &HostFacts {
        &self.host
    }

    pub fn sources(&self) -> &S {
        &self.sources
    }

    pub fn data_ticks(&self) -> u64 {
        self.data_ticks
    }

    pub fn graph_ticks(&self) -> u64 {
        self.graph_ticks
    }

    /// Copies the current state into an immutable snapshot.
    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            taken_at: Utc::now(),
            host: self.host.clone(),
            cpu_percent: self.cpu_percent,
            graph_cpu_percent: self.graph_cpu_percent,
            cpu: self.data_cpu.latest().copied(),
            memory: self.memory,
            storages: self.storages.clone(),
            interfaces: self.interfaces.clone(),
            processes: self.views.clone(),
            filter: self.filter.clone(),
            selection: self.selection.iter().copied().collect(),
            sensors: self.sensors.clone(),
            battery_percent: self.sensors.battery.percent(),
            history: self.history.clone(),
            graph: self.graph.clone(),
            data_ticks: self.data_ticks,
            graph_ticks: self.graph_ticks,
        }
    }
}

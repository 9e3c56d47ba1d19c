//! Configuration management for herakles-system-monitor.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use crate::scheduler::{GraphConfig, MAX_FPS, MAX_YSCALE, MIN_FPS};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_DATA_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_FRAME_RATE: u32 = 60;
pub const DEFAULT_HISTORY_CAPACITY: usize = 60;

const DEFAULT_CONFIG_PATHS: [&str; 8] = [
    "/etc/herakles/system-monitor.yaml",
    "/etc/herakles/system-monitor.yml",
    "/etc/herakles/system-monitor.json",
    "/etc/herakles/system-monitor.toml",
    "./herakles-system-monitor.yaml",
    "./herakles-system-monitor.yml",
    "./herakles-system-monitor.json",
    "./herakles-system-monitor.toml",
];

/// Refresh cadence of the sampling loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Data refresh interval in milliseconds (default: 1000)
    #[serde(default = "default_data_interval_ms")]
    pub data_interval_ms: u64,

    /// Frames per second of the headless sampler loop (default: 60)
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

fn default_data_interval_ms() -> u64 {
    DEFAULT_DATA_INTERVAL_MS
}
fn default_frame_rate() -> u32 {
    DEFAULT_FRAME_RATE
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            data_interval_ms: default_data_interval_ms(),
            frame_rate: default_frame_rate(),
        }
    }
}

/// Graph history settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Slots per graphed metric (default: 60)
    #[serde(default = "default_history_capacity")]
    pub capacity: usize,
}

fn default_history_capacity() -> usize {
    DEFAULT_HISTORY_CAPACITY
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_history_capacity(),
        }
    }
}

/// Kernel counter locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    /// procfs mount point; stat, meminfo, net/dev, mounts and cpuinfo live here
    #[serde(default = "default_proc_dir")]
    pub proc_dir: PathBuf,

    /// Block-device-by-path enumeration
    #[serde(default = "default_disk_by_path_dir")]
    pub disk_by_path_dir: PathBuf,
}

fn default_proc_dir() -> PathBuf {
    PathBuf::from("/proc")
}
fn default_disk_by_path_dir() -> PathBuf {
    PathBuf::from("/dev/disk/by-path")
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            proc_dir: default_proc_dir(),
            disk_by_path_dir: default_disk_by_path_dir(),
        }
    }
}

impl SourcesConfig {
    pub fn stat_path(&self) -> PathBuf {
        self.proc_dir.join("stat")
    }
    pub fn meminfo_path(&self) -> PathBuf {
        self.proc_dir.join("meminfo")
    }
    pub fn netdev_path(&self) -> PathBuf {
        self.proc_dir.join("net").join("dev")
    }
    pub fn mounts_path(&self) -> PathBuf {
        self.proc_dir.join("mounts")
    }
    pub fn cpuinfo_path(&self) -> PathBuf {
        self.proc_dir.join("cpuinfo")
    }
}

/// Sensor file overrides and discovery roots.
///
/// Unset paths are discovered under the `*_dir` roots at start-up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_now: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_full: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub battery_status: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fan: Option<PathBuf>,

    #[serde(default = "default_power_supply_dir")]
    pub power_supply_dir: PathBuf,
    #[serde(default = "default_hwmon_dir")]
    pub hwmon_dir: PathBuf,
    #[serde(default = "default_thermal_dir")]
    pub thermal_dir: PathBuf,
}

fn default_power_supply_dir() -> PathBuf {
    PathBuf::from("/sys/class/power_supply")
}
fn default_hwmon_dir() -> PathBuf {
    PathBuf::from("/sys/class/hwmon")
}
fn default_thermal_dir() -> PathBuf {
    PathBuf::from("/sys/class/thermal")
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            battery_now: None,
            battery_full: None,
            battery_status: None,
            thermal: None,
            fan: None,
            power_supply_dir: default_power_supply_dir(),
            hwmon_dir: default_hwmon_dir(),
            thermal_dir: default_thermal_dir(),
        }
    }
}

/// Memory accounting mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Use `MemTotal - MemAvailable` instead of subtracting free, buffers and cache
    #[serde(default)]
    pub use_mem_available: bool,
}

/// Process table settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessConfig {
    /// Case-sensitive name filter applied before display
    #[serde(default)]
    pub filter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,
}

/// Top-level configuration; every section falls back to its defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub sensors: SensorsConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub process: ProcessConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.refresh.data_interval_ms == 0 {
        bail!("refresh.data_interval_ms must be greater than 0");
    }
    if cfg.refresh.frame_rate == 0 {
        bail!("refresh.frame_rate must be greater than 0");
    }
    if !(MIN_FPS..=MAX_FPS).contains(&cfg.graph.fps) {
        bail!(
            "graph.fps {} out of range, expected {}-{}",
            cfg.graph.fps,
            MIN_FPS,
            MAX_FPS
        );
    }
    if !(0.0..=MAX_YSCALE).contains(&cfg.graph.yscale) {
        bail!(
            "graph.yscale {} out of range, expected 0-{}",
            cfg.graph.yscale,
            MAX_YSCALE
        );
    }
    if cfg.history.capacity == 0 {
        bail!("history.capacity must be at least 1");
    }
    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    if let Some(ms) = args.interval_ms {
        config.refresh.data_interval_ms = ms;
    }
    if let Some(rate) = args.frame_rate {
        config.refresh.frame_rate = rate;
    }
    if let Some(fps) = args.fps {
        config.graph.fps = fps;
    }
    if let Some(yscale) = args.yscale {
        config.graph.yscale = yscale;
    }
    if args.no_animate {
        config.graph.animated = false;
    }
    if let Some(capacity) = args.history {
        config.history.capacity = capacity;
    }
    if let Some(proc_dir) = &args.proc_dir {
        config.sources.proc_dir = proc_dir.clone();
    }
    if let Some(thermal) = &args.thermal {
        config.sensors.thermal = Some(thermal.clone());
    }
    if let Some(fan) = &args.fan {
        config.sensors.fan = Some(fan.clone());
    }
    if args.use_mem_available {
        config.memory.use_mem_available = true;
    }
    if let Some(filter) = &args.filter {
        config.process.filter = filter.clone();
    }

    Ok(config)
}

fn find_default_config() -> Option<PathBuf> {
    DEFAULT_CONFIG_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

/// Loads a config file by extension; a missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match find_default_config() {
            Some(p) => p,
            None => return Ok(Config::default()),
        },
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&content, &path)
}

/// Parses configuration text, choosing the format from the file extension.
pub fn parse_config(content: &str, path: &Path) -> anyhow::Result<Config> {
    let config = match path.extension().and_then(|s| s.to_str()) {
        Some("json") => serde_json::from_str(content)
            .with_context(|| format!("invalid JSON in {}", path.display()))?,
        Some("toml") => toml::from_str(content)
            .with_context(|| format!("invalid TOML in {}", path.display()))?,
        // Default to YAML
        _ => serde_yaml::from_str(content)
            .with_context(|| format!("invalid YAML in {}", path.display()))?,
    };
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Renders configuration in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> anyhow::Result<()> {
    println!("{}", render_config(config, format)?);
    Ok(())
}

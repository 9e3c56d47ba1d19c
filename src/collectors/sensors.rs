//! Single-scalar sensor readers for battery, thermal and fan.
//!
//! Each sensor is a sysfs file holding one token. Files are opened, read and
//! closed on every tick so each read observes the current value. Missing
//! paths are discovered under:
//! - /sys/class/power_supply/BAT*/{energy,charge}_{now,full} and status
//! - /sys/class/hwmon/hwmon*/temp1_input whose temp1_label mentions "Package"
//! - /sys/class/thermal/thermal_zone0/temp as the thermal fallback
//! - /sys/class/hwmon/hwmon*/fan1_input

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::SensorsConfig;
use crate::error::{ReadError, SetupError};

/// A sysfs file read as a single whitespace-delimited token.
#[derive(Debug, Clone)]
pub struct SensorFile {
    path: PathBuf,
}

impl SensorFile {
    /// Opens the sensor and performs one read to prove it is usable.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ReadError> {
        let sensor = Self { path: path.into() };
        sensor.read_token()?;
        Ok(sensor)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the first token of the file.
    pub fn read_token(&self) -> Result<String, ReadError> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| ReadError::unavailable(&self.path, e))?;
        content
            .split_whitespace()
            .next()
            .map(str::to_string)
            .ok_or_else(|| {
                ReadError::malformed(self.path.display().to_string(), "empty sensor file")
            })
    }

    pub fn read_u64(&self) -> Result<u64, ReadError> {
        let token = self.read_token()?;
        token.parse().map_err(|e| {
            ReadError::malformed(
                self.path.display().to_string(),
                format!("'{}': {}", token, e),
            )
        })
    }
}

/// One battery reading. `now`/`full` are in the sensor's native unit
/// (µWh for energy_*, µAh for charge_*).
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct BatteryReading {
    pub now: u64,
    pub full: u64,
    pub status: String,
}

impl BatteryReading {
    /// Charge level in percent; 0 when the full capacity is unknown.
    pub fn percent(&self) -> f32 {
        if self.full == 0 {
            return 0.0;
        }
        (100.0 * self.now as f64 / self.full as f64) as f32
    }
}

/// Battery charge files.
#[derive(Debug, Clone)]
pub struct BatterySensor {
    now: SensorFile,
    full: SensorFile,
    status: SensorFile,
}

impl BatterySensor {
    pub fn open(now: &Path, full: &Path, status: &Path) -> Result<Self, ReadError> {
        Ok(Self {
            now: SensorFile::open(now)?,
            full: SensorFile::open(full)?,
            status: SensorFile::open(status)?,
        })
    }

    /// Full capacity; read once at start-up.
    pub fn read_full(&self) -> Result<u64, ReadError> {
        self.full.read_u64()
    }

    /// Current charge and status string.
    pub fn read_now(&self) -> Result<(u64, String), ReadError> {
        Ok((self.now.read_u64()?, self.status.read_token()?))
    }
}

/// Temperature sensor in millidegrees Celsius.
#[derive(Debug, Clone)]
pub struct ThermalSensor(SensorFile);

impl ThermalSensor {
    pub fn open(path: &Path) -> Result<Self, ReadError> {
        SensorFile::open(path).map(Self)
    }

    /// Temperature in degrees Celsius.
    pub fn read_celsius(&self) -> Result<f32, ReadError> {
        let millidegrees: i64 = self.0.read_token()?.parse().map_err(|e| {
            ReadError::malformed(self.0.path().display().to_string(), format!("{}", e))
        })?;
        Ok(millidegrees as f32 / 1000.0)
    }
}

/// Fan tachometer in RPM.
#[derive(Debug, Clone)]
pub struct FanSensor(SensorFile);

impl FanSensor {
    pub fn open(path: &Path) -> Result<Self, ReadError> {
        SensorFile::open(path).map(Self)
    }

    pub fn read_rpm(&self) -> Result<u64, ReadError> {
        self.0.read_u64()
    }
}

/// The three mandatory sensors, resolved and opened.
#[derive(Debug, Clone)]
pub struct SensorSet {
    pub battery: BatterySensor,
    pub thermal: ThermalSensor,
    pub fan: FanSensor,
}

impl SensorSet {
    /// Resolves configured or discovered paths and opens every sensor.
    ///
    /// Any sensor that cannot be found or read is a start-up failure.
    pub fn open(cfg: &SensorsConfig) -> Result<Self, SetupError> {
        let (now, full, status) = match (&cfg.battery_now, &cfg.battery_full, &cfg.battery_status) {
            (Some(n), Some(f), Some(s)) => (n.clone(), f.clone(), s.clone()),
            _ => discover_battery(&cfg.power_supply_dir)
                .ok_or(SetupError::NoSensorFound("battery"))?,
        };
        let battery = BatterySensor::open(&now, &full, &status).map_err(|source| {
            SetupError::SensorUnavailable {
                sensor: "battery",
                source,
            }
        })?;

        let thermal_path = match &cfg.thermal {
            Some(p) => p.clone(),
            None => discover_thermal(&cfg.hwmon_dir, &cfg.thermal_dir)
                .ok_or(SetupError::NoSensorFound("thermal"))?,
        };
        let thermal =
            ThermalSensor::open(&thermal_path).map_err(|source| SetupError::SensorUnavailable {
                sensor: "thermal",
                source,
            })?;

        let fan_path = match &cfg.fan {
            Some(p) => p.clone(),
            None => discover_fan(&cfg.hwmon_dir).ok_or(SetupError::NoSensorFound("fan"))?,
        };
        let fan = FanSensor::open(&fan_path).map_err(|source| SetupError::SensorUnavailable {
            sensor: "fan",
            source,
        })?;

        info!(
            "Sensors: battery={} thermal={} fan={}",
            now.display(),
            thermal_path.display(),
            fan_path.display()
        );

        Ok(Self {
            battery,
            thermal,
            fan,
        })
    }
}

fn sorted_entries(dir: &Path, prefix: &str) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(prefix))
            })
            .collect(),
        Err(e) => {
            debug!("Cannot list {}: {}", dir.display(), e);
            Vec::new()
        }
    };
    paths.sort();
    paths
}

/// Finds the first `BAT*` supply exposing now/full/status files.
///
/// Prefers `energy_*` and falls back to `charge_*`.
pub fn discover_battery(power_supply_dir: &Path) -> Option<(PathBuf, PathBuf, PathBuf)> {
    for bat in sorted_entries(power_supply_dir, "BAT") {
        let status = bat.join("status");
        if !status.exists() {
            continue;
        }
        for kind in ["energy", "charge"] {
            let now = bat.join(format!("{}_now", kind));
            let full = bat.join(format!("{}_full", kind));
            if now.exists() && full.exists() {
                return Some((now, full, status));
            }
        }
    }
    None
}

/// Finds the hwmon device whose first temperature label is the CPU package.
pub fn find_cpu_sensor(hwmon_dir: &Path) -> Option<PathBuf> {
    sorted_entries(hwmon_dir, "hwmon").into_iter().find_map(|dev| {
        let label = fs::read_to_string(dev.join("temp1_label")).ok()?;
        label.contains("Package").then(|| dev.join("temp1_input"))
    })
}

/// CPU package sensor, falling back to the first thermal zone.
pub fn discover_thermal(hwmon_dir: &Path, thermal_dir: &Path) -> Option<PathBuf> {
    find_cpu_sensor(hwmon_dir).or_else(|| {
        let zone = thermal_dir.join("thermal_zone0").join("temp");
        zone.exists().then_some(zone)
    })
}

/// First hwmon device exposing `fan1_input`.
pub fn discover_fan(hwmon_dir: &Path) -> Option<PathBuf> {
    sorted_entries(hwmon_dir, "hwmon")
        .into_iter()
        .map(|dev| dev.join("fan1_input"))
        .find(|p| p.exists())
}

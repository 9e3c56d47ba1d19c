//! Config command implementation.
//!
//! Generates configuration files in various formats.

use anyhow::Context;
use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from("herakles-system-monitor.yaml"));
    let content = default_config_text(format, commented)?;

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)
            .with_context(|| format!("failed to write {}", output.display()))?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Default configuration text; YAML output may carry a comment header.
pub fn default_config_text(format: ConfigFormat, commented: bool) -> anyhow::Result<String> {
    let content = render_config(&Config::default(), format)?;
    Ok(match format {
        ConfigFormat::Yaml if commented => add_config_comments(content),
        _ => content,
    })
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# Herakles System Monitor Configuration
# =====================================
#
# Refresh
# -------
# refresh.data_interval_ms: 1000   # CPU, memory, storage, network, process refresh
# refresh.frame_rate: 60           # Sampler loop frames per second
#
# Graph
# -----
# graph.animated: true             # Graph metrics on their own timeline
# graph.fps: 30                    # Graph refresh rate (1-60)
# graph.yscale: 100.0              # Vertical scale (0-100)
# history.capacity: 60             # Slots per graph history
#
# Sources
# -------
# sources.proc_dir: /proc
# sources.disk_by_path_dir: /dev/disk/by-path
#
# Sensors (unset paths are discovered; a missing sensor refuses start-up)
# -------
# sensors.battery_now: /sys/class/power_supply/BAT0/energy_now
# sensors.battery_full: /sys/class/power_supply/BAT0/energy_full
# sensors.battery_status: /sys/class/power_supply/BAT0/status
# sensors.thermal: /sys/class/hwmon/hwmon3/temp1_input
# sensors.fan: /sys/class/hwmon/hwmon5/fan1_input
#
# Memory / processes / logging
# ----------------------------
# memory.use_mem_available: false  # used = MemTotal - MemAvailable
# process.filter: ""               # Case-sensitive process name filter
# logging.level: info              # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use std::path::Path;
    use tempfile::tempdir;

    #[test]
    fn test_commented_yaml_still_parses() {
        let text = default_config_text(ConfigFormat::Yaml, true).unwrap();
        assert!(text.starts_with("# Herakles System Monitor"));
        let cfg = parse_config(&text, Path::new("c.yaml")).unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_writes_file() {
        let dir = tempdir().expect("Failed to create temp dir");
        let out = dir.path().join("monitor.toml");
        command_config(Some(out.clone()), ConfigFormat::Toml, true).unwrap();
        let cfg = parse_config(&fs::read_to_string(&out).unwrap(), &out).unwrap();
        assert_eq!(cfg.graph.fps, 30);
    }
}

//! Configuration file management for gnss-processor.
//!
//! Reads/writes `~/.gnss-processor/config.yaml` with the serial port, relay
//! pipe, snapshot path and loop cadence. Every key is optional; missing keys
//! keep their defaults.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cadence::{DIAGNOSTICS_PERIOD, PUBLISH_PERIOD, RESET_PERIOD};
use crate::types::GnssError;

/// Default idle wait for serial input.
pub const READ_TIMEOUT: Duration = Duration::from_millis(10);
/// Longest idle wait allowed; keeps the loop timers responsive.
pub const MAX_READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Full configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial: SerialConfig,
    pub relay: RelayConfig,
    pub snapshot: SnapshotConfig,
    pub cadence: CadenceConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud: u32,
    /// Upper bound on one idle wait for input, milliseconds. Zero falls
    /// back to the default; values above 50 are capped.
    pub read_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Named pipe the relay consumer reads from.
    pub fifo_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub publish_secs: f64,
    pub reset_secs: f64,
    /// `null` disables the periodic diagnostics line.
    pub diagnostics_secs: Option<f64>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            port: "/dev/serial0".into(),
            baud: 115_200,
            read_timeout_ms: READ_TIMEOUT.as_millis() as u64,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            fifo_path: PathBuf::from("/tmp/gnssai_smart"),
        }
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        SnapshotConfig {
            path: PathBuf::from("/tmp/gnssai_dashboard_data.json"),
        }
    }
}

impl Default for CadenceConfig {
    fn default() -> Self {
        CadenceConfig {
            publish_secs: PUBLISH_PERIOD.as_secs_f64(),
            reset_secs: RESET_PERIOD.as_secs_f64(),
            diagnostics_secs: Some(DIAGNOSTICS_PERIOD.as_secs_f64()),
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        match self.read_timeout_ms {
            0 => READ_TIMEOUT,
            ms => Duration::from_millis(ms).min(MAX_READ_TIMEOUT),
        }
    }
}

impl CadenceConfig {
    pub fn publish_period(&self) -> Duration {
        secs_or(self.publish_secs, PUBLISH_PERIOD)
    }

    pub fn reset_period(&self) -> Duration {
        secs_or(self.reset_secs, RESET_PERIOD)
    }

    pub fn diagnostics_period(&self) -> Option<Duration> {
        self.diagnostics_secs.map(|s| secs_or(s, DIAGNOSTICS_PERIOD))
    }
}

/// Positive finite seconds, or the fallback.
fn secs_or(secs: f64, fallback: Duration) -> Duration {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or(fallback)
}

/// Get the config directory path (`~/.gnss-processor/`).
pub fn config_dir() -> PathBuf {
    dirs_home().join(".gnss-processor")
}

/// Get the config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.yaml")
}

fn dirs_home() -> PathBuf {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}

/// Load config from `path`, or from `~/.gnss-processor/config.yaml`.
///
/// Returns the default config if the file doesn't exist or can't be read.
pub fn load_config(path: Option<&std::path::Path>) -> Config {
    let path = path.map(PathBuf::from).unwrap_or_else(config_file);
    if !path.exists() {
        return Config::default();
    }

    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(_) => return Config::default(),
    };

    parse_config(&text).unwrap_or_default()
}

/// Save config to `~/.gnss-processor/config.yaml`.
pub fn save_config(config: &Config) -> Result<PathBuf, GnssError> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir).map_err(|e| GnssError::Config(e.to_string()))?;

    let path = config_file();
    let text = serialize_config(config)?;
    std::fs::write(&path, text).map_err(|e| GnssError::Config(e.to_string()))?;

    Ok(path)
}

/// Parse YAML config text. Text with no keys is the default config.
pub fn parse_config(text: &str) -> Result<Config, GnssError> {
    let has_keys = text.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#')
    });
    if !has_keys {
        return Ok(Config::default());
    }
    serde_yaml::from_str(text).map_err(|e| GnssError::Config(e.to_string()))
}

/// Serialize config to YAML text.
pub fn serialize_config(config: &Config) -> Result<String, GnssError> {
    let body = serde_yaml::to_string(config).map_err(|e| GnssError::Config(e.to_string()))?;
    Ok(format!("# gnss-processor configuration\n\n{body}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config file")]
    ReadFailed(#[source] std::io::Error),
    #[error("failed to write config file")]
    WriteFailed(#[source] std::io::Error),
    #[error("failed to parse config file")]
    ParseFailed,
    #[error("no usable config directory")]
    ConfigPathUnavailable,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub monitoring: MonitoringConfig,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the libsql database file.
    pub path: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Seconds between monitoring loop ticks.
    pub tick_seconds: u64,
    /// Per-probe timeout in seconds.
    pub probe_timeout_seconds: u64,
    /// Latency above which a reachable service is degraded.
    pub degraded_threshold_ms: u64,
    /// Upper bound on simultaneous outbound probes per tick.
    pub max_concurrent_probes: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Optional webhook endpoint for transition notifications.
    pub webhook_url: Option<String>,
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/vigil/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(Error::ConfigPathUnavailable);
    };

    Ok(path.join("vigil/config.toml"))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig { path: "vigil.db".into() },
            monitoring: MonitoringConfig {
                tick_seconds: 30,
                probe_timeout_seconds: 5,
                degraded_threshold_ms: 1000,
                max_concurrent_probes: 16,
            },
            notifications: NotificationsConfig { webhook_url: None },
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Current Internal Configuration State:")?;
        writeln!(f, "  Database")?;
        writeln!(f, "    Path: {}", self.database.path)?;
        writeln!(f, "  Monitoring")?;
        writeln!(f, "    Tick: {}s", self.monitoring.tick_seconds)?;
        writeln!(f, "    Probe Timeout: {}s", self.monitoring.probe_timeout_seconds)?;
        writeln!(f, "    Degraded Threshold: {}ms", self.monitoring.degraded_threshold_ms)?;
        writeln!(f, "    Max Concurrent Probes: {}", self.monitoring.max_concurrent_probes)?;
        writeln!(f, "  Notifications")?;
        writeln!(
            f,
            "    Webhook: {}",
            self.notifications.webhook_url.as_deref().unwrap_or("(disabled)")
        )
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/vigil/config.toml
    /// or the specified path, with the name config.toml, if one does not
    /// exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path).map_err(Error::ReadFailed)?;
            toml::from_str(raw_string.as_str()).map_err(|_err| Error::ParseFailed)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            Ok(config)
        }
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String =
            toml::to_string_pretty(self).map_err(|_err| Error::ParseFailed)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(Error::WriteFailed)?;
        }

        fs::write(path, config_str).map_err(Error::WriteFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_writes_defaults_and_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let written = Config::from_config(Some(&path)).unwrap();
        assert_eq!(written.monitoring.tick_seconds, 30);
        assert!(path.exists());

        let read_back = Config::from_config(Some(&path)).unwrap();
        assert_eq!(read_back.monitoring.degraded_threshold_ms, 1000);
        assert_eq!(read_back.database.path, "vigil.db");
        assert!(read_back.notifications.webhook_url.is_none());
    }

    #[test]
    fn non_toml_extension_is_normalized() {
        assert_eq!(
            normalize_toml_path(path::Path::new("/tmp/vigil/config.yaml")),
            path::PathBuf::from("/tmp/vigil/config.toml")
        );
    }
}

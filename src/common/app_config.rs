//! Dashboard configuration file.
//!
//! ```toml
//! device-url = "http://192.168.4.1"
//! poll-interval-ms = 5000
//! request-timeout-ms = 4000
//! websocket-path = "/ws"
//! ```
//!
//! Every key is optional. A missing file means all defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

/// Overrides `device-url` when set.
pub const DEVICE_URL_ENV: &str = "DASHBOARD_DEVICE_URL";

#[derive(Debug)]
pub enum ConfigLoadError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: toml::de::Error },
    Invalid(String),
}

impl std::fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigLoadError::Read { path, source } => write!(f, "Failed to read {}: {}", path.display(), source),
            ConfigLoadError::Parse { path, source } => write!(f, "Failed to parse {}: {}", path.display(), source),
            ConfigLoadError::Invalid(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigLoadError::Read { source, .. } => Some(source),
            ConfigLoadError::Parse { source, .. } => Some(source),
            ConfigLoadError::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct DashboardConfig {
    /// Scheme and host of the device, e.g. `http://192.168.4.1`.
    pub device_url: String,
    pub poll_interval_ms: u64,
    pub request_timeout_ms: u64,
    pub websocket_path: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            device_url: "http://192.168.4.1".to_string(),
            poll_interval_ms: 5000,
            request_timeout_ms: 4000,
            websocket_path: "/ws".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Load the configuration from `path`, falling back to defaults when the
    /// file does not exist, then apply the environment override.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let config = match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content).map_err(|e| match e {
                ConfigLoadError::Parse { source, .. } => ConfigLoadError::Parse {
                    path: path.to_path_buf(),
                    source,
                },
                other => other,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No {} found, using defaults", path.display());
                Self::default()
            }
            Err(source) => {
                return Err(ConfigLoadError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        config.with_device_url_override(std::env::var(DEVICE_URL_ENV).ok())
    }

    /// Parse TOML text and check the values.
    pub fn parse(content: &str) -> Result<Self, ConfigLoadError> {
        let config: Self = toml::from_str(content).map_err(|source| ConfigLoadError::Parse {
            path: PathBuf::from(DEFAULT_CONFIG_FILE),
            source,
        })?;
        config.checked()
    }

    fn with_device_url_override(mut self, device_url: Option<String>) -> Result<Self, ConfigLoadError> {
        if let Some(url) = device_url.filter(|u| !u.trim().is_empty()) {
            log::info!("Device URL taken from {}", DEVICE_URL_ENV);
            self.device_url = url.trim().to_string();
        }
        self.checked()
    }

    fn checked(self) -> Result<Self, ConfigLoadError> {
        if !(self.device_url.starts_with("http://") || self.device_url.starts_with("https://")) {
            return Err(ConfigLoadError::Invalid(format!(
                "device-url must start with http:// or https://, got '{}'",
                self.device_url
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigLoadError::Invalid("poll-interval-ms must be positive".to_string()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigLoadError::Invalid("request-timeout-ms must be positive".to_string()));
        }
        Ok(self)
    }

    /// Tick period for the telemetry task's executor timer.
    pub fn poll_interval(&self) -> embassy_time::Duration {
        embassy_time::Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// WebSocket URL on the same host as the HTTP API.
    pub fn websocket_url(&self) -> String {
        let base = self.device_url.trim_end_matches('/');
        let host = base
            .strip_prefix("https://")
            .map(|rest| format!("wss://{}", rest))
            .or_else(|| base.strip_prefix("http://").map(|rest| format!("ws://{}", rest)))
            .unwrap_or_else(|| base.to_string());

        if self.websocket_path.starts_with('/') {
            format!("{}{}", host, self.websocket_path)
        } else {
            format!("{}/{}", host, self.websocket_path)
        }
    }

    /// Config path from the command line, or the default file name.
    pub fn path_from_args(mut args: impl Iterator<Item = String>) -> PathBuf {
        args.nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(DashboardConfig::parse("").unwrap(), DashboardConfig::default());
    }

    #[test]
    fn keys_are_kebab_case() {
        let config = DashboardConfig::parse(
            r#"
            device-url = "http://10.0.0.9"
            poll-interval-ms = 1000
            websocket-path = "cmd"
            "#,
        )
        .unwrap();
        assert_eq!(config.device_url, "http://10.0.0.9");
        assert_eq!(config.poll_interval(), embassy_time::Duration::from_secs(1));
        assert_eq!(config.request_timeout_ms, 4000);
        assert_eq!(config.websocket_url(), "ws://10.0.0.9/cmd");
    }

    #[test]
    fn websocket_url_follows_scheme() {
        let mut config = DashboardConfig::default();
        assert_eq!(config.websocket_url(), "ws://192.168.4.1/ws");

        config.device_url = "https://chute.local/".to_string();
        assert_eq!(config.websocket_url(), "wss://chute.local/ws");
    }

    #[test]
    fn malformed_or_invalid_files_are_errors() {
        assert!(matches!(DashboardConfig::parse("device-url = "), Err(ConfigLoadError::Parse { .. })));
        assert!(matches!(DashboardConfig::parse("unknown-key = 1"), Err(ConfigLoadError::Parse { .. })));
        assert!(matches!(DashboardConfig::parse("poll-interval-ms = 0"), Err(ConfigLoadError::Invalid(_))));
        assert!(matches!(DashboardConfig::parse("device-url = \"192.168.4.1\""), Err(ConfigLoadError::Invalid(_))));
    }

    #[test]
    fn environment_override_replaces_device_url() {
        let config = DashboardConfig::default()
            .with_device_url_override(Some(" http://172.16.0.2 ".to_string()))
            .unwrap();
        assert_eq!(config.device_url, "http://172.16.0.2");

        let unchanged = DashboardConfig::default().with_device_url_override(Some(String::new())).unwrap();
        assert_eq!(unchanged, DashboardConfig::default());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("chute-dashboard-does-not-exist.toml");
        let config = DashboardConfig::load(&path).unwrap();
        assert_eq!(config.poll_interval_ms, 5000);
    }

    #[test]
    fn path_comes_from_first_argument() {
        let args = vec!["dashboard".to_string(), "/etc/chute.toml".to_string()];
        assert_eq!(DashboardConfig::path_from_args(args.into_iter()), PathBuf::from("/etc/chute.toml"));
        assert_eq!(
            DashboardConfig::path_from_args(vec!["dashboard".to_string()].into_iter()),
            PathBuf::from(DEFAULT_CONFIG_FILE)
        );
    }
}

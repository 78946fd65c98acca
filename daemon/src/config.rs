/// Daemon configuration
use crate::errors::{DaemonError, DaemonResult};
use crate::headers::{default_headers, HeaderEntry};
use serde::{Deserialize, Serialize};
use staticd_core::{parse_preferred_port, PortList, COMMON_FALLBACKS, DEFAULT_PORT, PORT_ENV_VAR};
use std::path::PathBuf;

/// Daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub server: ServerConfig,
    pub headers: Vec<HeaderEntry>,
    pub recovery: RecoveryConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub bind_addr: String,
    /// Preferred port
    pub port: u16,
    /// Fallback ports tried after the preferred port and its neighbors
    pub fallback_ports: Vec<u16>,
    /// Directory the site is served from
    pub site_root: PathBuf,
    /// File served for `/`
    pub index_file: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_addr: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            fallback_ports: COMMON_FALLBACKS.to_vec(),
            site_root: PathBuf::from("."),
            index_file: "index.html".to_string(),
        }
    }
}

/// Recovery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Terminate whatever holds the preferred port before falling back.
    /// Destructive; requires explicit opt-in.
    pub evict_holder: bool,
    /// When set, retry the whole candidate list once after this many
    /// seconds if the first scan exhausts every port.
    pub retry_after_secs: Option<u64>,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        RecoveryConfig {
            evict_holder: false,
            retry_after_secs: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        DaemonConfig {
            server: ServerConfig::default(),
            headers: default_headers(),
            recovery: RecoveryConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from file
    pub fn load(path: &str) -> DaemonResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DaemonError::ConfigError(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| DaemonError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Load from TOML file or use defaults
    pub fn load_or_default(path: Option<&str>) -> DaemonResult<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Apply the `PORT` environment variable on top of file defaults.
    /// An unset variable leaves the configured port alone; a set but
    /// unparsable value resets the port to the literal default.
    pub fn apply_env(&mut self) {
        if let Ok(raw) = std::env::var(PORT_ENV_VAR) {
            self.server.port = parse_preferred_port(Some(&raw));
        }
    }

    /// The full ordered candidate scan for this configuration
    pub fn port_list(&self) -> PortList {
        PortList::with_neighbors(self.server.port, &self.server.fallback_ports)
    }

    /// Validate configuration
    pub fn validate(&self) -> DaemonResult<()> {
        if self.server.bind_addr.parse::<std::net::IpAddr>().is_err() {
            return Err(DaemonError::ConfigError(format!(
                "bind_addr is not a valid IP address: {}",
                self.server.bind_addr
            )));
        }

        if !self.server.site_root.is_dir() {
            return Err(DaemonError::ConfigError(format!(
                "site_root is not a directory: {}",
                self.server.site_root.display()
            )));
        }

        if self.server.index_file.is_empty()
            || self.server.index_file.contains('/')
            || self.server.index_file.contains('\\')
        {
            return Err(DaemonError::ConfigError(format!(
                "index_file must be a bare file name: {}",
                self.server.index_file
            )));
        }

        Ok(())
    }
}

//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a TOML file. Everything has a
//! compiled default, so a missing file only produces a warning.
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (handled by the binary)
//! 2. Environment variables (handled by the binary, `CFM_ROOT_FOLDER` here)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the data root folder
pub const ROOT_FOLDER_ENV: &str = "CFM_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "cfm.db";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file (defaults to `<root folder>/cfm.db`)
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Address the HTTP server binds to
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub mbs: MbsConfig,

    #[serde(default)]
    pub matching: MatchingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Catalog lookup service (mbs) connection settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MbsConfig {
    #[serde(default = "default_mbs_base_url")]
    pub base_url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_mbs_timeout_ms")]
    pub timeout_ms: u64,
}

/// Matching settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MatchingConfig {
    /// Threshold used when a request does not carry one
    #[serde(default = "default_threshold")]
    pub default_threshold: i32,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5810
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_mbs_base_url() -> String {
    "http://127.0.0.1:5811".to_string()
}

fn default_mbs_timeout_ms() -> u64 {
    5000
}

fn default_threshold() -> i32 {
    80
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            bind_address: default_bind_address(),
            port: default_port(),
            logging: LoggingConfig::default(),
            mbs: MbsConfig::default(),
            matching: MatchingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for MbsConfig {
    fn default() -> Self {
        Self {
            base_url: default_mbs_base_url(),
            timeout_ms: default_mbs_timeout_ms(),
        }
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            default_threshold: default_threshold(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the services cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(0..=100).contains(&self.matching.default_threshold) {
            return Err(Error::Config(format!(
                "matching.default_threshold must be within 0..=100, got {}",
                self.matching.default_threshold
            )));
        }
        if self.mbs.timeout_ms == 0 {
            return Err(Error::Config("mbs.timeout_ms must be > 0".to_string()));
        }
        self.listen_addr()?;
        Ok(())
    }

    /// Socket address to listen on; IPv6 addresses are given bare (`::1`)
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.bind_address.parse().map_err(|e| {
            Error::Config(format!("Invalid bind address {}: {}", self.bind_address, e))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Database path from the file, or `<root folder>/cfm.db`
    pub fn resolved_database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| resolve_root_folder().join(DATABASE_FILE_NAME))
    }
}

/// Load configuration from `path`, or from the platform default location
///
/// A missing file is not an error: a warning is logged and compiled
/// defaults are used. An unreadable or malformed file is an error.
pub fn load_config(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path.map(Path::to_path_buf).or_else(default_config_file) {
        Some(path) => path,
        None => {
            warn!("No config file found, using built-in defaults");
            return Ok(TomlConfig::default());
        }
    };

    if !path.exists() {
        warn!("Config file {} not found, using built-in defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    let config = TomlConfig::from_toml_str(&content)?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Default configuration file for the platform, if one exists
///
/// Tries `<config dir>/cfm/recorder.toml` first, then `/etc/cfm/recorder.toml` on Linux.
fn default_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("cfm").join("recorder.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/cfm/recorder.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Resolve the data root folder
///
/// `CFM_ROOT_FOLDER` wins, then the OS data directory, then `./cfm_data`.
pub fn resolve_root_folder() -> PathBuf {
    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    get_default_root_folder()
}

/// OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("cfm"))
        .unwrap_or_else(|| PathBuf::from("./cfm_data"))
}

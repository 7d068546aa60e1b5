//! Daemon configuration with TOML file support.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use vetting_store_lmdb::DEFAULT_MAP_SIZE;
use vetting_utils::LogFormat;
use vetting_verification::{DocumentRequirements, PageLimits};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for the verification daemon.
///
/// Every field has a default, so an empty file is a valid configuration.
/// CLI flags and `VETTING_*` environment variables override file values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB memory map size in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Address the HTTP API binds to.
    #[serde(default = "default_rpc_bind")]
    pub rpc_bind: IpAddr,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Whether to serve Prometheus metrics on `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter, e.g. `"info"` or `"warn,vetting_verification=debug"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Buffered review events per notification subscriber.
    #[serde(default = "default_notification_capacity")]
    pub notification_capacity: usize,

    /// Review queue page sizes.
    #[serde(default)]
    pub queue: PageLimits,

    /// Required document slots per role.
    #[serde(default)]
    pub requirements: DocumentRequirements,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./vetting_data")
}

fn default_map_size() -> usize {
    DEFAULT_MAP_SIZE
}

fn default_rpc_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_rpc_port() -> u16 {
    7080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_notification_capacity() -> usize {
    256
}

// ── Impl ───────────────────────────────────────────────────────────────

impl DaemonConfig {
    /// Load and validate configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.map_size == 0 {
            return Err(ConfigError::Invalid("map_size must be non-zero".into()));
        }
        if self.queue.default_limit == 0 || self.queue.default_limit > self.queue.max_limit {
            return Err(ConfigError::Invalid(format!(
                "queue.default_limit must be in 1..={}, got {}",
                self.queue.max_limit, self.queue.default_limit
            )));
        }
        self.requirements.validate().map_err(ConfigError::Invalid)
    }

    pub fn rpc_addr(&self) -> SocketAddr {
        SocketAddr::new(self.rpc_bind, self.rpc_port)
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size: default_map_size(),
            rpc_bind: default_rpc_bind(),
            rpc_port: default_rpc_port(),
            enable_metrics: false,
            log_format: LogFormat::default(),
            log_level: default_log_level(),
            notification_capacity: default_notification_capacity(),
            queue: PageLimits::default(),
            requirements: DocumentRequirements::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vetting_types::{DocumentSlot, Role};

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = DaemonConfig::default();
        let toml_str = config.to_toml_string().expect("serializable");
        let parsed = DaemonConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = DaemonConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.rpc_port, 7080);
        assert_eq!(config.rpc_addr().to_string(), "127.0.0.1:7080");
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.queue, PageLimits::default());
        assert!(!config.enable_metrics);
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            rpc_port = 9999
            enable_metrics = true
            log_format = "json"

            [queue]
            default_limit = 20
            max_limit = 50

            [requirements]
            investor = ["idDocument"]
            max_additional = 2
        "#;
        let config = DaemonConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.rpc_port, 9999);
        assert!(config.enable_metrics);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.queue.default_limit, 20);
        assert_eq!(
            config.requirements.required_for(Role::Investor),
            &[DocumentSlot::IdDocument]
        );
        // Unlisted roles keep their defaults.
        assert_eq!(config.requirements.required_for(Role::Founder).len(), 3);
        assert_eq!(config.requirements.additional_limit(), 2);
    }

    #[test]
    fn default_limit_above_max_is_rejected() {
        let toml = r#"
            [queue]
            default_limit = 200
            max_limit = 100
        "#;
        assert!(matches!(
            DaemonConfig::from_toml_str(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn unknown_slot_is_a_parse_error() {
        let toml = r#"
            [requirements]
            founder = ["selfie"]
        "#;
        assert!(matches!(
            DaemonConfig::from_toml_str(toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = DaemonConfig::from_toml_file(Path::new("/nonexistent/vetting.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/vetting.toml"));
    }
}

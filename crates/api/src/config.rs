//! Server configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `EMOTION__*` environment variables
//! (e.g. `EMOTION__SESSION__REPORT_INTERVAL=5`).

use emotion_detect::DetectorConfig;
use report::ReportConfig;
use serde::{Deserialize, Serialize};
use session::SessionConfig;
use std::path::Path;
use std::time::Duration;

use crate::ServerError;

/// Config file read when `EMOTION_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "emotion-server.toml";

/// Environment variable overriding the config file path
pub const CONFIG_PATH_ENV: &str = "EMOTION_CONFIG";

/// Top-level server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,

    /// Maximum tracing level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Pause before restarting after a server failure (seconds)
    pub restart_backoff_secs: u64,

    pub session: SessionConfig,
    pub detector: DetectorConfig,
    pub report: ReportConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8765".to_string(),
            log_level: "info".to_string(),
            restart_backoff_secs: 5,
            session: SessionConfig::default(),
            detector: DetectorConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load from `$EMOTION_CONFIG` or `emotion-server.toml`, then the environment
    pub fn load() -> Result<Self, ServerError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Load with `path` as the (optional) file layer
    pub fn load_from(path: &Path) -> Result<Self, ServerError> {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("EMOTION")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn restart_backoff(&self) -> Duration {
        Duration::from_secs(self.restart_backoff_secs)
    }
}

//! Session configuration

use frame_intake::IntakeConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-session behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Render a report every N classified frames (0 disables periodic renders)
    pub report_interval: u64,

    /// Largest accepted image message in bytes
    pub max_payload_bytes: usize,

    /// Upper bound for one classification (milliseconds)
    pub classify_timeout_ms: u64,

    /// Decoded image bounds
    pub intake: IntakeConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            report_interval: 10,
            max_payload_bytes: 2 * 1024 * 1024,
            classify_timeout_ms: 5000,
            intake: IntakeConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn classify_timeout(&self) -> Duration {
        Duration::from_millis(self.classify_timeout_ms)
    }
}

//! Settings schema.

use agon_core::RetryConfig;
use serde::{Deserialize, Serialize};

/// Top-level agon client settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgonSettings {
    /// Settings schema version.
    pub version: String,
    /// Connection parameters.
    pub connection: ConnectionSettings,
    /// Logging parameters.
    pub logging: LoggingSettings,
}

impl Default for AgonSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".into(),
            connection: ConnectionSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Connection parameters for the judge endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionSettings {
    /// WebSocket endpoint of the judge service.
    pub endpoint: String,
    /// Dial-retry behavior for explicit connect/reconnect.
    pub retry: RetryConfig,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            endpoint: "ws://127.0.0.1:3000/ws".into(),
            retry: RetryConfig::default(),
        }
    }
}

/// Logging parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Minimum level for the tracing subscriber (`trace` … `error`).
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

//! Layered settings: defaults, optional `attendance.toml`, then
//! `ATTENDANCE__SECTION__KEY` environment overrides.

use crate::SessionError;
use alerting::AlertConfig;
use chrono::Duration;
use config::{Config, Environment, File, FileFormat};
use liveness::LivenessConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracker::TrackerConfig;

/// Default settings file looked up next to the binary
pub const DEFAULT_SETTINGS_FILE: &str = "attendance.toml";

/// Orchestrator parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Frames between full identity re-matches
    pub recognition_interval: u64,
    /// Unseen this long (milliseconds) closes a subject
    pub absence_timeout_ms: u64,
    /// Maximum accepted match distance
    pub match_threshold: f32,
    /// Same-subject radius between re-matches (pixels)
    pub proximity_radius: f64,
    /// Frame reports buffered per live viewer
    pub broadcast_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            recognition_interval: 30,
            absence_timeout_ms: 10_000,
            match_threshold: identity::DEFAULT_MATCH_THRESHOLD,
            proximity_radius: identity::DEFAULT_PROXIMITY_RADIUS,
            broadcast_capacity: 16,
        }
    }
}

impl SessionSettings {
    pub fn absence_timeout(&self) -> Duration {
        tracker::config::millis(self.absence_timeout_ms)
    }
}

/// HTTP server parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_addr: String,
    /// Rate limit replenishment period (seconds per request)
    pub rate_limit_per_second: u64,
    pub rate_limit_burst: u32,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            rate_limit_per_second: 1,
            rate_limit_burst: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info` or `session=debug,info`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

/// All service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub session: SessionSettings,
    pub tracker: TrackerConfig,
    pub liveness: LivenessConfig,
    pub alerts: AlertConfig,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load from an optional TOML file plus `ATTENDANCE__*` environment
    /// variables (e.g. `ATTENDANCE__SESSION__RECOGNITION_INTERVAL=15`)
    pub fn load(path: Option<&Path>) -> Result<Self, SessionError> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_SETTINGS_FILE));
        let settings: Settings = Config::builder()
            .add_source(File::from(file).format(FileFormat::Toml).required(path.is_some()))
            .add_source(
                Environment::with_prefix("ATTENDANCE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()
    }

    /// Load from TOML text only
    pub fn from_toml(text: &str) -> Result<Self, SessionError> {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        settings.validate()
    }

    fn validate(self) -> Result<Self, SessionError> {
        if self.session.recognition_interval == 0 {
            return Err(SessionError::InvalidSetting(
                "session.recognition_interval must be at least 1".to_string(),
            ));
        }
        let threshold = self.session.match_threshold;
        if threshold.is_nan() || threshold < 0.0 {
            return Err(SessionError::InvalidSetting(
                "session.match_threshold must be non-negative".to_string(),
            ));
        }
        if self.session.broadcast_capacity == 0 {
            return Err(SessionError::InvalidSetting(
                "session.broadcast_capacity must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}

//! Tracker configuration

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Suspicion above this flags the subject
    pub suspicion_threshold: f64,

    /// Added on every not-live verdict
    pub spoof_penalty: f64,

    /// Added when the buffered movement is too static
    pub static_penalty: f64,

    /// Subtracted otherwise (never below zero)
    pub decay: f64,

    /// Mean displacement (pixels) below which movement counts as static
    pub static_mean_threshold: f64,

    /// Samples needed before the static-behaviour adjustment applies
    pub min_samples_for_static: usize,

    /// Time allowed to answer a challenge (milliseconds)
    pub challenge_timeout_ms: u64,

    /// Number of latest samples averaged for the challenge response
    pub challenge_window: usize,

    /// Mean displacement over the window that passes a challenge
    pub challenge_min_movement: f64,

    /// Movement samples kept per subject
    pub history_capacity: usize,

    /// Liveness records kept per subject
    pub recent_checks_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            suspicion_threshold: 10.0,
            spoof_penalty: 5.0,
            static_penalty: 1.0,
            decay: 0.5,
            static_mean_threshold: 2.0,
            min_samples_for_static: 20,
            challenge_timeout_ms: 10_000,
            challenge_window: 5,
            challenge_min_movement: 5.0,
            history_capacity: 30,
            recent_checks_capacity: 10,
        }
    }
}

impl TrackerConfig {
    pub fn challenge_timeout(&self) -> Duration {
        millis(self.challenge_timeout_ms)
    }
}

/// Clamp a millisecond count into a chrono duration
pub fn millis(ms: u64) -> Duration {
    Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX / 1_000))
}

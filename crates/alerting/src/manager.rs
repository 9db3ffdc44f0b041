//! Alert Manager Implementation

use crate::kind::{ActivityKind, Severity};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Cooldown between duplicate alerts for one subject and kind (seconds)
    pub cooldown_seconds: u64,
    /// Maximum alerts per hour across all subjects before throttling
    pub max_alerts_per_hour: usize,
    /// Spoof certainty (1 - liveness confidence) for critical severity
    pub critical_threshold: f64,
    /// Spoof certainty for high severity
    pub high_threshold: f64,
    /// Spoof certainty for medium severity
    pub medium_threshold: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown_seconds: 60,
            max_alerts_per_hour: 500,
            critical_threshold: 0.75,
            high_threshold: 0.6,
            medium_threshold: 0.45,
        }
    }
}

/// State of one (subject, kind) alert stream
#[derive(Debug, Clone)]
struct AlertState {
    last_fired: DateTime<Utc>,
    fire_count: usize,
}

type AlertKey = (String, ActivityKind);

/// Alert manager for deduplication and throttling
pub struct AlertManager {
    config: AlertConfig,
    states: HashMap<AlertKey, AlertState>,
    /// Alerts fired in the current hour
    hourly_count: usize,
    hour_start: Option<DateTime<Utc>>,
}

impl AlertManager {
    pub fn new(config: AlertConfig) -> Self {
        info!(?config, "Creating alert manager");
        Self {
            config,
            states: HashMap::new(),
            hourly_count: 0,
            hour_start: None,
        }
    }

    /// Check whether an alert may fire, based on the per-subject cooldown
    /// and the hourly cap
    pub fn should_fire(&mut self, subject_id: &str, kind: ActivityKind, now: DateTime<Utc>) -> bool {
        let hour_elapsed = self
            .hour_start
            .map_or(true, |start| now - start >= Duration::hours(1));
        if hour_elapsed {
            self.hourly_count = 0;
            self.hour_start = Some(now);
        }

        if self.hourly_count >= self.config.max_alerts_per_hour {
            warn!(subject = subject_id, %kind, "Alert throttled: max alerts per hour reached");
            return false;
        }

        let key = (subject_id.to_string(), kind);
        if let Some(state) = self.states.get(&key) {
            if now - state.last_fired < seconds(self.config.cooldown_seconds) {
                debug!(subject = subject_id, %kind, "Alert suppressed: in cooldown period");
                return false;
            }
        }

        true
    }

    /// Record that an alert was fired
    pub fn record_fire(&mut self, subject_id: &str, kind: ActivityKind, now: DateTime<Utc>) {
        self.hourly_count += 1;

        let state = self
            .states
            .entry((subject_id.to_string(), kind))
            .or_insert(AlertState {
                last_fired: now,
                fire_count: 0,
            });
        state.last_fired = now;
        state.fire_count += 1;

        info!(subject = subject_id, %kind, count = state.fire_count, "Alert recorded");
    }

    /// `should_fire` followed by `record_fire` when allowed
    pub fn try_fire(&mut self, subject_id: &str, kind: ActivityKind, now: DateTime<Utc>) -> bool {
        let allowed = self.should_fire(subject_id, kind, now);
        if allowed {
            self.record_fire(subject_id, kind, now);
        }
        allowed
    }

    /// Severity for an activity. Spoofing attempts scale with how far the
    /// liveness confidence fell; other kinds have a fixed severity.
    pub fn severity(&self, kind: ActivityKind, liveness_confidence: Option<f64>) -> Severity {
        match kind {
            ActivityKind::SpoofingAttempt => {
                let certainty = 1.0 - liveness_confidence.unwrap_or(0.5).clamp(0.0, 1.0);
                if certainty >= self.config.critical_threshold {
                    Severity::Critical
                } else if certainty >= self.config.high_threshold {
                    Severity::High
                } else if certainty >= self.config.medium_threshold {
                    Severity::Medium
                } else {
                    Severity::Low
                }
            }
            ActivityKind::ChallengeFailed => Severity::High,
            ActivityKind::UnknownPerson => Severity::Medium,
            ActivityKind::StaticBehavior => Severity::Low,
        }
    }

    pub fn hourly_count(&self) -> usize {
        self.hourly_count
    }
}

/// Saturating seconds-to-duration; configured cooldowns may exceed chrono's range
fn seconds(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

impl Default for AlertManager {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap() + Duration::seconds(secs)
    }

    #[test]
    fn test_deduplication_per_subject_and_kind() {
        let mut manager = AlertManager::default();

        assert!(manager.try_fire("s-1", ActivityKind::SpoofingAttempt, t(0)));
        assert!(!manager.try_fire("s-1", ActivityKind::SpoofingAttempt, t(10)));

        // Other kinds and other subjects are independent
        assert!(manager.try_fire("s-1", ActivityKind::StaticBehavior, t(10)));
        assert!(manager.try_fire("s-2", ActivityKind::SpoofingAttempt, t(10)));

        assert!(manager.try_fire("s-1", ActivityKind::SpoofingAttempt, t(60)));
        assert_eq!(manager.hourly_count(), 4);
    }

    #[test]
    fn test_hourly_throttle() {
        let mut manager = AlertManager::new(AlertConfig {
            max_alerts_per_hour: 2,
            ..Default::default()
        });
        assert!(manager.try_fire("a", ActivityKind::UnknownPerson, t(0)));
        assert!(manager.try_fire("b", ActivityKind::UnknownPerson, t(1)));
        assert!(!manager.try_fire("c", ActivityKind::UnknownPerson, t(2)));
        assert!(manager.try_fire("c", ActivityKind::UnknownPerson, t(3_600)));
    }

    #[test]
    fn test_severity_levels() {
        let manager = AlertManager::default();

        assert_eq!(manager.severity(ActivityKind::SpoofingAttempt, Some(0.1)), Severity::Critical);
        assert_eq!(manager.severity(ActivityKind::SpoofingAttempt, Some(0.35)), Severity::High);
        assert_eq!(manager.severity(ActivityKind::SpoofingAttempt, Some(0.5)), Severity::Medium);
        assert_eq!(manager.severity(ActivityKind::SpoofingAttempt, Some(0.64)), Severity::Low);
        assert_eq!(manager.severity(ActivityKind::ChallengeFailed, None), Severity::High);
        assert_eq!(manager.severity(ActivityKind::StaticBehavior, None), Severity::Low);
    }

    #[test]
    fn test_huge_cooldown_saturates() {
        for cooldown_seconds in [i64::MAX as u64 / 1_000 + 1, i64::MAX as u64, u64::MAX] {
            let mut manager = AlertManager::new(AlertConfig {
                cooldown_seconds,
                ..Default::default()
            });
            assert!(manager.try_fire("s-1", ActivityKind::StaticBehavior, t(0)));
            assert!(!manager.try_fire("s-1", ActivityKind::StaticBehavior, t(86_400 * 365)));
        }
    }
}

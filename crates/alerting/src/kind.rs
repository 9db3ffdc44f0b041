//! Activity kinds and severities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Kind of suspicious activity logged against a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    SpoofingAttempt,
    StaticBehavior,
    UnknownPerson,
    ChallengeFailed,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::SpoofingAttempt => "spoofing_attempt",
            ActivityKind::StaticBehavior => "static_behavior",
            ActivityKind::UnknownPerson => "unknown_person",
            ActivityKind::ChallengeFailed => "challenge_failed",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown activity kind: {0}")]
pub struct ParseKindError(pub String);

impl FromStr for ActivityKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spoofing_attempt" => Ok(ActivityKind::SpoofingAttempt),
            "static_behavior" => Ok(ActivityKind::StaticBehavior),
            "unknown_person" => Ok(ActivityKind::UnknownPerson),
            "challenge_failed" => Ok(ActivityKind::ChallengeFailed),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Subject state machine types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prompt shown to a subject under challenge
pub const CHALLENGE_INSTRUCTION: &str = "Please turn your head left and right to verify presence";

/// Whether the subject resolved to an enrolled identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Enrolled,
    /// Placeholder for an unresolved sighting; never credited with attendance
    Unknown,
}

/// Behavioural status of a subject
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectStatus {
    #[default]
    Verified,
    ChallengePending,
    Suspicious,
}

impl SubjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectStatus::Verified => "verified",
            SubjectStatus::ChallengePending => "challenge_pending",
            SubjectStatus::Suspicious => "suspicious",
        }
    }
}

/// An outstanding challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub instruction: String,
    pub issued_at: DateTime<Utc>,
}

impl Challenge {
    pub fn new(issued_at: DateTime<Utc>) -> Self {
        Self {
            instruction: CHALLENGE_INSTRUCTION.to_string(),
            issued_at,
        }
    }
}

/// Result of evaluating the challenge state machine for one frame
#[derive(Debug, Clone, PartialEq)]
pub enum ChallengeEvent {
    /// Nothing to do
    Idle,
    /// A new challenge was issued
    Issued(Challenge),
    /// Challenge outstanding, not yet answered
    Pending,
    /// Subject moved enough within the window; suspicion cleared
    Passed,
    /// Window elapsed without a pass; subject escalated for the session
    Expired,
}

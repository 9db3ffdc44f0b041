//! Per-frame and end-of-session reports

use alerting::{ActivityKind, Severity};
use camera_capture::BoundingBox;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracker::SubjectStatusReport;

/// One resolved detection in a frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub bbox: BoundingBox,
    #[serde(flatten)]
    pub subject: SubjectStatusReport,
}

/// Something the session did while processing a frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    Entry {
        subject_id: String,
        at: DateTime<Utc>,
    },
    Exit {
        subject_id: String,
        at: DateTime<Utc>,
    },
    UnknownDetected {
        subject_id: String,
    },
    ChallengeIssued {
        subject_id: String,
        instruction: String,
    },
    ChallengePassed {
        subject_id: String,
    },
    Suspicious {
        subject_id: String,
        kind: ActivityKind,
        severity: Severity,
        description: String,
    },
}

impl SessionEvent {
    pub fn subject_id(&self) -> &str {
        match self {
            SessionEvent::Entry { subject_id, .. }
            | SessionEvent::Exit { subject_id, .. }
            | SessionEvent::UnknownDetected { subject_id }
            | SessionEvent::ChallengeIssued { subject_id, .. }
            | SessionEvent::ChallengePassed { subject_id }
            | SessionEvent::Suspicious { subject_id, .. } => subject_id,
        }
    }
}

/// Snapshot broadcast to live viewers after every frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameReport {
    pub sequence: u32,
    pub at: DateTime<Utc>,
    pub detections: Vec<DetectionReport>,
    /// Unknown subjects currently tracked
    pub unknown_count: usize,
    /// Enrolled subjects with an open attendance entry
    pub present_count: usize,
    pub events: Vec<SessionEvent>,
}

impl FrameReport {
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.events.iter().filter_map(|e| match e {
            SessionEvent::Entry { subject_id, .. } => Some(subject_id.as_str()),
            _ => None,
        })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Totals for a finished session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub frames_processed: u64,
    pub subjects_seen: usize,
    pub unknown_seen: usize,
    pub entries: usize,
    pub exits: usize,
    pub suspicious_activities: usize,
}

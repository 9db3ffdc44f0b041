//! Stored record types

use alerting::{ActivityKind, Severity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Enrolled student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Left,
}

/// One attendance interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: u64,
    pub subject_id: String,
    pub date: NaiveDate,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub suspicion_score: f64,
    pub notes: Option<String>,
}

impl AttendanceRecord {
    pub fn status(&self) -> AttendanceStatus {
        if self.exit_time.is_some() {
            AttendanceStatus::Left
        } else {
            AttendanceStatus::Present
        }
    }

    pub fn is_open(&self) -> bool {
        self.exit_time.is_none()
    }
}

/// Attendance interval joined with the student's name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceView {
    pub subject_id: String,
    pub name: Option<String>,
    pub date: NaiveDate,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub status: AttendanceStatus,
    pub suspicion_score: f64,
    pub notes: Option<String>,
}

/// Logged suspicious activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuspiciousActivity {
    pub id: u64,
    pub subject_id: String,
    pub at: DateTime<Utc>,
    pub kind: ActivityKind,
    pub severity: Severity,
    pub description: String,
    pub resolved: bool,
}

/// Aggregate attendance figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceStats {
    /// Distinct subjects with at least one record
    pub total_subjects: usize,
    pub total_records: usize,
    /// Records still open (no exit)
    pub present_count: usize,
    pub avg_suspicion: f64,
    /// Unresolved suspicious activities
    pub open_activities: usize,
}

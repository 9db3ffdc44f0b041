//! Storage Layer
//!
//! Attendance ledger, student directory, and suspicious-activity log behind
//! the `AttendanceSink` boundary the monitoring loop writes through.

mod records;
mod repository;

pub use records::{
    AttendanceRecord, AttendanceStats, AttendanceStatus, AttendanceView, StudentRecord,
    SuspiciousActivity,
};
pub use repository::{AttendanceSink, Repository};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found")]
    NotFound,
    #[error("Duplicate record: {0}")]
    Duplicate(String),
}

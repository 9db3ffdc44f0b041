//! Repository Implementation

use crate::records::{
    AttendanceRecord, AttendanceStats, AttendanceView, StudentRecord, SuspiciousActivity,
};
use crate::StorageError;
use alerting::{ActivityKind, Severity};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Write boundary used by the monitoring loop
pub trait AttendanceSink: Send + Sync {
    /// Open an attendance interval; returns the record ID. Re-recording an
    /// already-open interval for the same day returns the existing ID.
    fn record_entry(&self, subject_id: &str, at: DateTime<Utc>) -> Result<u64, StorageError>;

    /// Close the subject's open interval; false if none was open
    fn record_exit(&self, subject_id: &str, at: DateTime<Utc>) -> Result<bool, StorageError>;

    fn record_suspicious_activity(
        &self,
        subject_id: &str,
        kind: ActivityKind,
        severity: Severity,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, StorageError>;

    /// Store the subject's closing suspicion score on that day's record
    fn record_suspicion(&self, _subject_id: &str, _at: DateTime<Utc>, _score: f64) -> Result<(), StorageError> {
        Ok(())
    }
}

impl<T: AttendanceSink + ?Sized> AttendanceSink for Arc<T> {
    fn record_entry(&self, subject_id: &str, at: DateTime<Utc>) -> Result<u64, StorageError> {
        (**self).record_entry(subject_id, at)
    }

    fn record_exit(&self, subject_id: &str, at: DateTime<Utc>) -> Result<bool, StorageError> {
        (**self).record_exit(subject_id, at)
    }

    fn record_suspicious_activity(
        &self,
        subject_id: &str,
        kind: ActivityKind,
        severity: Severity,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        (**self).record_suspicious_activity(subject_id, kind, severity, description, at)
    }

    fn record_suspicion(&self, subject_id: &str, at: DateTime<Utc>, score: f64) -> Result<(), StorageError> {
        (**self).record_suspicion(subject_id, at, score)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::DatabaseError(format!("Lock error: {}", e)))
}

/// In-memory attendance repository
pub struct Repository {
    students: Mutex<BTreeMap<String, StudentRecord>>,
    attendance: Mutex<Vec<AttendanceRecord>>,
    activities: Mutex<Vec<SuspiciousActivity>>,
    next_attendance_id: AtomicU64,
    next_activity_id: AtomicU64,
}

impl Repository {
    pub fn new() -> Self {
        info!("Creating in-memory attendance repository");
        Self {
            students: Mutex::new(BTreeMap::new()),
            attendance: Mutex::new(Vec::with_capacity(256)),
            activities: Mutex::new(Vec::with_capacity(256)),
            next_attendance_id: AtomicU64::new(1),
            next_activity_id: AtomicU64::new(1),
        }
    }

    // ---- Students ----

    pub fn add_student(&self, student: StudentRecord) -> Result<(), StorageError> {
        let mut students = lock(&self.students)?;
        if students.contains_key(&student.id) {
            return Err(StorageError::Duplicate(student.id));
        }
        debug!(student = %student.id, "Student added");
        students.insert(student.id.clone(), student);
        Ok(())
    }

    pub fn get_student(&self, id: &str) -> Result<StudentRecord, StorageError> {
        lock(&self.students)?.get(id).cloned().ok_or(StorageError::NotFound)
    }

    pub fn list_students(&self) -> Result<Vec<StudentRecord>, StorageError> {
        Ok(lock(&self.students)?.values().cloned().collect())
    }

    pub fn remove_student(&self, id: &str) -> Result<(), StorageError> {
        lock(&self.students)?
            .remove(id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    pub fn student_count(&self) -> usize {
        self.students.lock().map(|s| s.len()).unwrap_or(0)
    }

    // ---- Attendance ----

    /// Store the latest suspicion score on the subject's record for `date`
    pub fn update_suspicion_score(
        &self,
        subject_id: &str,
        date: NaiveDate,
        score: f64,
    ) -> Result<(), StorageError> {
        let mut attendance = lock(&self.attendance)?;
        let record = attendance
            .iter_mut()
            .rev()
            .find(|r| r.subject_id == subject_id && r.date == date)
            .ok_or(StorageError::NotFound)?;
        record.suspicion_score = score;
        Ok(())
    }

    /// Attendance for one calendar day, by entry time
    pub fn attendance_on(&self, date: NaiveDate) -> Result<Vec<AttendanceView>, StorageError> {
        let attendance = lock(&self.attendance)?;
        let students = lock(&self.students)?;

        let mut views: Vec<AttendanceView> = attendance
            .iter()
            .filter(|r| r.date == date)
            .map(|r| view(r, &students))
            .collect();
        views.sort_by_key(|v| v.entry_time);
        Ok(views)
    }

    pub fn today(&self, now: DateTime<Utc>) -> Result<Vec<AttendanceView>, StorageError> {
        self.attendance_on(now.date_naive())
    }

    /// A subject's most recent records first
    pub fn subject_history(
        &self,
        subject_id: &str,
        limit: usize,
    ) -> Result<Vec<AttendanceRecord>, StorageError> {
        let attendance = lock(&self.attendance)?;
        let mut records: Vec<AttendanceRecord> = attendance
            .iter()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.entry_time.cmp(&a.entry_time));
        records.truncate(limit);
        Ok(records)
    }

    // ---- Suspicious activity ----

    /// Activities with the given resolved flag, newest first
    pub fn suspicious_activities(
        &self,
        resolved: bool,
        limit: usize,
    ) -> Result<Vec<SuspiciousActivity>, StorageError> {
        let activities = lock(&self.activities)?;
        let mut selected: Vec<SuspiciousActivity> = activities
            .iter()
            .filter(|a| a.resolved == resolved)
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.at.cmp(&a.at).then(b.id.cmp(&a.id)));
        selected.truncate(limit);
        Ok(selected)
    }

    pub fn resolve_activity(&self, id: u64) -> Result<(), StorageError> {
        let mut activities = lock(&self.activities)?;
        let activity = activities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StorageError::NotFound)?;
        activity.resolved = true;
        info!(activity = id, "Suspicious activity resolved");
        Ok(())
    }

    // ---- Statistics ----

    /// Aggregates over records whose date falls in `range` (inclusive), or
    /// over everything
    pub fn statistics(
        &self,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<AttendanceStats, StorageError> {
        let attendance = lock(&self.attendance)?;
        let records: Vec<&AttendanceRecord> = attendance
            .iter()
            .filter(|r| range.map_or(true, |(from, to)| r.date >= from && r.date <= to))
            .collect();

        let subjects: HashSet<&str> = records.iter().map(|r| r.subject_id.as_str()).collect();
        let avg_suspicion = if records.is_empty() {
            0.0
        } else {
            records.iter().map(|r| r.suspicion_score).sum::<f64>() / records.len() as f64
        };
        let open_activities = lock(&self.activities)?.iter().filter(|a| !a.resolved).count();

        Ok(AttendanceStats {
            total_subjects: subjects.len(),
            total_records: records.len(),
            present_count: records.iter().filter(|r| r.is_open()).count(),
            avg_suspicion,
            open_activities,
        })
    }

    pub fn attendance_count(&self) -> usize {
        self.attendance.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn activity_count(&self) -> usize {
        self.activities.lock().map(|a| a.len()).unwrap_or(0)
    }

    /// Clear all data (for testing)
    pub fn clear(&self) {
        if let Ok(mut attendance) = self.attendance.lock() {
            attendance.clear();
        }
        if let Ok(mut activities) = self.activities.lock() {
            activities.clear();
        }
    }
}

fn view(record: &AttendanceRecord, students: &BTreeMap<String, StudentRecord>) -> AttendanceView {
    AttendanceView {
        subject_id: record.subject_id.clone(),
        name: students.get(&record.subject_id).map(|s| s.name.clone()),
        date: record.date,
        entry_time: record.entry_time,
        exit_time: record.exit_time,
        status: record.status(),
        suspicion_score: record.suspicion_score,
        notes: record.notes.clone(),
    }
}

impl AttendanceSink for Repository {
    fn record_entry(&self, subject_id: &str, at: DateTime<Utc>) -> Result<u64, StorageError> {
        let date = at.date_naive();
        let mut attendance = lock(&self.attendance)?;

        if let Some(open) = attendance
            .iter()
            .find(|r| r.subject_id == subject_id && r.date == date && r.is_open())
        {
            debug!(subject = subject_id, record = open.id, "Entry already open for today");
            return Ok(open.id);
        }

        let id = self.next_attendance_id.fetch_add(1, Ordering::Relaxed);
        attendance.push(AttendanceRecord {
            id,
            subject_id: subject_id.to_string(),
            date,
            entry_time: at,
            exit_time: None,
            suspicion_score: 0.0,
            notes: None,
        });
        info!(subject = subject_id, record = id, "Entry recorded");
        Ok(id)
    }

    fn record_exit(&self, subject_id: &str, at: DateTime<Utc>) -> Result<bool, StorageError> {
        let mut attendance = lock(&self.attendance)?;
        match attendance
            .iter_mut()
            .rev()
            .find(|r| r.subject_id == subject_id && r.is_open())
        {
            Some(record) => {
                record.exit_time = Some(at);
                info!(subject = subject_id, record = record.id, "Exit recorded");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn record_suspicious_activity(
        &self,
        subject_id: &str,
        kind: ActivityKind,
        severity: Severity,
        description: &str,
        at: DateTime<Utc>,
    ) -> Result<u64, StorageError> {
        let id = self.next_activity_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.activities)?.push(SuspiciousActivity {
            id,
            subject_id: subject_id.to_string(),
            at,
            kind,
            severity,
            description: description.to_string(),
            resolved: false,
        });
        info!(subject = subject_id, %kind, %severity, "Suspicious activity logged");
        Ok(id)
    }

    fn record_suspicion(&self, subject_id: &str, at: DateTime<Utc>, score: f64) -> Result<(), StorageError> {
        self.update_suspicion_score(subject_id, at.date_naive(), score)
    }
}

impl Default for Repository {
    fn default() -> Self {
        Self::new()
    }
}

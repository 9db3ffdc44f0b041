//! One-shot recognition of a single uploaded frame
//!
//! No tracker state: liveness is judged on the crop alone (the movement
//! check is left out), and an entry is recorded only for a live, accepted
//! match.

use crate::settings::Settings;
use crate::SessionError;
use alerting::{ActivityKind, AlertManager};
use camera_capture::{BoundingBox, FaceLocalizer, VideoFrame};
use chrono::{DateTime, Utc};
use identity::{AcceptancePolicy, IdentityDecision, IdentityMatcher};
use liveness::{LivenessEngine, SpoofType};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::AttendanceSink;
use tracing::{debug, info, warn};

/// Per-face result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceRecognition {
    pub bbox: BoundingBox,
    /// Accepted identity; None for unknown faces
    pub subject_id: Option<String>,
    pub display_name: Option<String>,
    /// Distance of the best candidate, accepted or not
    pub distance: Option<f32>,
    pub is_live: bool,
    pub liveness_confidence: f64,
    pub spoofing_type: Option<SpoofType>,
    pub entry_recorded: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognitionReport {
    pub faces: Vec<FaceRecognition>,
    pub entries: usize,
    pub spoof_count: usize,
    pub unknown_count: usize,
}

/// Shared, stateless pieces the one-shot path needs
pub struct RecognitionContext {
    pub policy: AcceptancePolicy,
    pub engine: Arc<LivenessEngine>,
    alerts: AlertManager,
}

impl RecognitionContext {
    pub fn new(settings: &Settings, engine: Arc<LivenessEngine>) -> Self {
        Self {
            policy: AcceptancePolicy::new(settings.session.match_threshold),
            engine,
            alerts: AlertManager::new(settings.alerts.clone()),
        }
    }
}

/// Detect, match and liveness-check every face in `frame`.
///
/// A localizer failure fails the whole call; a matcher failure only drops
/// that face. Sink errors are logged.
pub fn recognize_frame(
    frame: &VideoFrame,
    localizer: &dyn FaceLocalizer,
    matcher: &dyn IdentityMatcher,
    context: &RecognitionContext,
    sink: &dyn AttendanceSink,
    now: DateTime<Utc>,
) -> Result<RecognitionReport, SessionError> {
    let boxes = localizer.locate(frame)?;
    let mut report = RecognitionReport::default();

    for bbox in boxes {
        let Some(crop) = frame.crop_box(&bbox) else {
            continue;
        };

        let candidate = match matcher.best_match(&crop) {
            Ok(candidate) => candidate,
            Err(e) => {
                warn!(error = %e, "Identity matching failed; face skipped");
                continue;
            }
        };
        let distance = candidate.as_ref().map(|c| c.distance);

        let verdict = context.engine.detect_liveness(Some(&crop), None);
        counter!("liveness_evaluations_total").increment(1);
        let spoof = verdict.spoof_type();

        let mut face = FaceRecognition {
            bbox,
            subject_id: None,
            display_name: None,
            distance,
            is_live: verdict.is_live,
            liveness_confidence: verdict.confidence,
            spoofing_type: spoof,
            entry_recorded: false,
        };

        let subject_id = match context.policy.decide(candidate) {
            IdentityDecision::Accepted(candidate) => {
                face.display_name = Some(candidate.display_name);
                face.subject_id = Some(candidate.subject_id.clone());
                candidate.subject_id
            }
            IdentityDecision::Unknown { .. } => {
                report.unknown_count += 1;
                record_activity(
                    context,
                    sink,
                    "unknown",
                    ActivityKind::UnknownPerson,
                    None,
                    "Unrecognised person in uploaded frame",
                    now,
                );
                report.faces.push(face);
                continue;
            }
        };

        match spoof {
            None => match sink.record_entry(&subject_id, now) {
                Ok(record) => {
                    info!(subject = %subject_id, record, "Attendance entry from uploaded frame");
                    counter!("attendance_entries_total").increment(1);
                    face.entry_recorded = true;
                    report.entries += 1;
                }
                Err(e) => warn!(subject = %subject_id, error = %e, "Failed to record entry"),
            },
            Some(spoof) => {
                report.spoof_count += 1;
                counter!("spoof_detections_total", "spoof_type" => spoof.label()).increment(1);
                let description = format!(
                    "Spoofing attempt detected: {} (liveness confidence {:.2})",
                    spoof, verdict.confidence
                );
                record_activity(
                    context,
                    sink,
                    &subject_id,
                    ActivityKind::SpoofingAttempt,
                    Some(verdict.confidence),
                    &description,
                    now,
                );
            }
        }

        report.faces.push(face);
    }

    debug!(
        faces = report.faces.len(),
        entries = report.entries,
        spoofs = report.spoof_count,
        unknown = report.unknown_count,
        "Frame recognized"
    );
    Ok(report)
}

fn record_activity(
    context: &RecognitionContext,
    sink: &dyn AttendanceSink,
    subject_id: &str,
    kind: ActivityKind,
    liveness_confidence: Option<f64>,
    description: &str,
    now: DateTime<Utc>,
) {
    let severity = context.alerts.severity(kind, liveness_confidence);
    if let Err(e) = sink.record_suspicious_activity(subject_id, kind, severity, description, now) {
        warn!(subject = subject_id, %kind, error = %e, "Failed to record suspicious activity");
    }
}

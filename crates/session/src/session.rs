//! Monitoring session: tracker registry and the per-frame pipeline

use crate::report::{DetectionReport, FrameReport, SessionEvent, SessionSummary};
use crate::settings::{SessionSettings, Settings};
use crate::SessionError;
use alerting::{ActivityKind, AlertManager};
use camera_capture::{BoundingBox, FaceLocalizer, FrameSource, VideoFrame};
use chrono::{DateTime, Utc};
use identity::{associate_by_proximity, AcceptancePolicy, IdentityDecision, IdentityMatcher};
use liveness::LivenessEngine;
use metrics::{counter, gauge};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use storage::AttendanceSink;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};
use tracker::{ChallengeEvent, Subject, SubjectKind, TrackerConfig};

const UNKNOWN_NAME: &str = "Unknown";

/// One camera stream's monitoring state. Owns the subject registry; frames
/// are processed strictly one at a time.
pub struct MonitoringSession {
    settings: SessionSettings,
    tracker_config: TrackerConfig,
    engine: Arc<LivenessEngine>,
    policy: AcceptancePolicy,
    alerts: AlertManager,
    registry: HashMap<String, Subject>,
    reports: broadcast::Sender<FrameReport>,

    frames_processed: u64,
    unknown_sequence: u64,
    summary: SessionSummary,
}

impl MonitoringSession {
    pub fn new(settings: &Settings) -> Self {
        Self::with_engine(settings, Arc::new(LivenessEngine::new(settings.liveness.clone())))
    }

    /// Share an engine with other callers (e.g. the HTTP one-shot path)
    pub fn with_engine(settings: &Settings, engine: Arc<LivenessEngine>) -> Self {
        let (reports, _) = broadcast::channel(settings.session.broadcast_capacity.max(1));
        Self {
            settings: settings.session.clone(),
            tracker_config: settings.tracker.clone(),
            engine,
            policy: AcceptancePolicy::new(settings.session.match_threshold),
            alerts: AlertManager::new(settings.alerts.clone()),
            registry: HashMap::new(),
            reports,
            frames_processed: 0,
            unknown_sequence: 0,
            summary: SessionSummary::default(),
        }
    }

    /// Live viewer feed. A lagging receiver drops old reports; it never
    /// slows the loop.
    pub fn subscribe(&self) -> broadcast::Receiver<FrameReport> {
        self.reports.subscribe()
    }

    pub fn subject(&self, id: &str) -> Option<&Subject> {
        self.registry.get(id)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.registry.values()
    }

    /// Subjects not yet closed by absence or session end
    pub fn open_subjects(&self) -> usize {
        self.registry.values().filter(|s| !s.is_closed()).count()
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// Run one frame through detection, identity resolution, liveness and
    /// tracking, then emit attendance and activity through `sink`.
    pub fn process_frame(
        &mut self,
        frame: &VideoFrame,
        localizer: &dyn FaceLocalizer,
        matcher: &dyn IdentityMatcher,
        sink: &dyn AttendanceSink,
        now: DateTime<Utc>,
    ) -> FrameReport {
        let interval = self.settings.recognition_interval.max(1);
        let rematch = self.frames_processed % interval == 0;
        self.frames_processed += 1;
        self.summary.frames_processed = self.frames_processed;
        counter!("frames_processed_total").increment(1);

        let mut events = Vec::new();
        let mut detections = Vec::new();

        match localizer.locate(frame) {
            Ok(boxes) => {
                debug!(sequence = frame.sequence, faces = boxes.len(), rematch, "Faces located");
                let mut claimed = HashSet::new();
                for bbox in boxes {
                    if let Some(detection) =
                        self.process_detection(frame, bbox, rematch, &mut claimed, matcher, sink, &mut events, now)
                    {
                        detections.push(detection);
                    }
                }
            }
            Err(e) => {
                warn!(sequence = frame.sequence, error = %e, "Face localization failed; skipping frame");
            }
        }

        self.sweep_absent(sink, &mut events, now);
        self.publish(frame.sequence, detections, events, now)
    }

    #[allow(clippy::too_many_arguments)]
    fn process_detection(
        &mut self,
        frame: &VideoFrame,
        bbox: BoundingBox,
        rematch: bool,
        claimed: &mut HashSet<String>,
        matcher: &dyn IdentityMatcher,
        sink: &dyn AttendanceSink,
        events: &mut Vec<SessionEvent>,
        now: DateTime<Utc>,
    ) -> Option<DetectionReport> {
        let crop = frame.crop_box(&bbox);

        // Attendance only counts on frames where the matcher vouched for the face
        let mut identity_confirmed = false;
        let id = if rematch {
            let Some(crop) = crop.as_ref() else {
                debug!(?bbox, "Empty crop; detection skipped");
                return None;
            };
            let candidate = match matcher.best_match(crop) {
                Ok(candidate) => candidate,
                Err(e) => {
                    warn!(error = %e, "Identity matching failed; detection skipped");
                    return None;
                }
            };
            match self.policy.decide(candidate) {
                IdentityDecision::Accepted(candidate) => {
                    if claimed.contains(&candidate.subject_id) {
                        debug!(subject = %candidate.subject_id, "Duplicate match in frame; detection skipped");
                        return None;
                    }
                    self.admit_enrolled(&candidate.subject_id, &candidate.display_name, now);
                    identity_confirmed = true;
                    candidate.subject_id
                }
                IdentityDecision::Unknown { .. } => self.resolve_unknown(&bbox, claimed, sink, events, now),
            }
        } else {
            let candidates = self
                .registry
                .iter()
                .filter(|(id, s)| !s.is_closed() && !claimed.contains(*id))
                .filter_map(|(id, s)| s.last_position().map(|p| (id.clone(), p)));
            match associate_by_proximity(bbox.center(), candidates, self.settings.proximity_radius) {
                Some(id) => id,
                None => {
                    debug!(?bbox, "No tracked subject nearby; waiting for next re-match");
                    return None;
                }
            }
        };
        claimed.insert(id.clone());

        let subject = self.registry.get_mut(&id)?;
        let outcome = subject.update(&bbox, crop.as_ref(), &self.engine, now);

        if let Some(verdict) = &outcome.verdict {
            counter!("liveness_evaluations_total").increment(1);
            if let Some(spoof) = outcome.spoof {
                if outcome.spoof_started {
                    counter!("spoof_detections_total", "spoof_type" => spoof.label()).increment(1);
                }
                let description = format!(
                    "Spoofing attempt detected: {} (liveness confidence {:.2})",
                    spoof, verdict.confidence
                );
                log_activity(
                    &mut self.alerts,
                    sink,
                    &id,
                    ActivityKind::SpoofingAttempt,
                    Some(verdict.confidence),
                    description,
                    &mut self.summary,
                    events,
                    now,
                );
            }
        }

        if outcome.static_behavior {
            let description = format!(
                "Static behaviour: little movement over recent frames (suspicion {:.1})",
                outcome.suspicion_score
            );
            log_activity(
                &mut self.alerts,
                sink,
                &id,
                ActivityKind::StaticBehavior,
                None,
                description,
                &mut self.summary,
                events,
                now,
            );
        }

        match subject.evaluate_challenge(now) {
            ChallengeEvent::Issued(challenge) => events.push(SessionEvent::ChallengeIssued {
                subject_id: id.clone(),
                instruction: challenge.instruction,
            }),
            ChallengeEvent::Passed => events.push(SessionEvent::ChallengePassed { subject_id: id.clone() }),
            ChallengeEvent::Expired => {
                let description = format!(
                    "Liveness challenge not completed in time (suspicion {:.1})",
                    subject.suspicion_score()
                );
                log_activity(
                    &mut self.alerts,
                    sink,
                    &id,
                    ActivityKind::ChallengeFailed,
                    None,
                    description,
                    &mut self.summary,
                    events,
                    now,
                );
            }
            ChallengeEvent::Idle | ChallengeEvent::Pending => {}
        }

        if identity_confirmed && subject.try_mark_entry(now) {
            info!(subject = %id, name = subject.display_name(), "Attendance entry");
            counter!("attendance_entries_total").increment(1);
            self.summary.entries += 1;
            if let Err(e) = sink.record_entry(&id, now) {
                warn!(subject = %id, error = %e, "Failed to record entry");
            }
            events.push(SessionEvent::Entry {
                subject_id: id.clone(),
                at: now,
            });
        }

        Some(DetectionReport {
            bbox,
            subject: subject.snapshot(),
        })
    }

    /// Ensure an open tracker exists for an accepted identity. A closed one
    /// (left earlier this session) is replaced so the return is a new entry.
    fn admit_enrolled(&mut self, id: &str, display_name: &str, now: DateTime<Utc>) {
        let reopen = self.registry.get(id).map_or(true, Subject::is_closed);
        if reopen {
            debug!(subject = id, "Tracking enrolled subject");
            self.summary.subjects_seen += 1;
            self.registry.insert(
                id.to_string(),
                Subject::with_config(id, display_name, SubjectKind::Enrolled, self.tracker_config.clone(), now),
            );
        }
    }

    /// Reuse a nearby unknown tracker, or start one and log the sighting once
    fn resolve_unknown(
        &mut self,
        bbox: &BoundingBox,
        claimed: &HashSet<String>,
        sink: &dyn AttendanceSink,
        events: &mut Vec<SessionEvent>,
        now: DateTime<Utc>,
    ) -> String {
        let nearby = self
            .registry
            .iter()
            .filter(|(id, s)| s.kind() == SubjectKind::Unknown && !s.is_closed() && !claimed.contains(*id))
            .filter_map(|(id, s)| s.last_position().map(|p| (id.clone(), p)));
        if let Some(id) = associate_by_proximity(bbox.center(), nearby, self.settings.proximity_radius) {
            return id;
        }

        self.unknown_sequence += 1;
        let id = format!("unknown-{}", self.unknown_sequence);
        info!(subject = %id, ?bbox, "Unknown person detected");
        self.summary.subjects_seen += 1;
        self.summary.unknown_seen += 1;
        self.registry.insert(
            id.clone(),
            Subject::with_config(&id, UNKNOWN_NAME, SubjectKind::Unknown, self.tracker_config.clone(), now),
        );
        events.push(SessionEvent::UnknownDetected { subject_id: id.clone() });
        log_activity(
            &mut self.alerts,
            sink,
            &id,
            ActivityKind::UnknownPerson,
            None,
            "Unrecognised person in the classroom".to_string(),
            &mut self.summary,
            events,
            now,
        );
        id
    }

    /// Close subjects unseen for longer than the absence timeout
    fn sweep_absent(&mut self, sink: &dyn AttendanceSink, events: &mut Vec<SessionEvent>, now: DateTime<Utc>) {
        let timeout = self.settings.absence_timeout();
        for (id, subject) in self.registry.iter_mut() {
            if !subject.check_absence(now, timeout) {
                continue;
            }
            info!(subject = %id, "Subject left");
            if subject.entry_logged() {
                record_exit(sink, id, subject.suspicion_score(), now, &mut self.summary);
                events.push(SessionEvent::Exit {
                    subject_id: id.clone(),
                    at: now,
                });
            }
        }
        // Closed unknown trackers have nothing left to report
        self.registry
            .retain(|_, s| !(s.kind() == SubjectKind::Unknown && s.is_closed()));
    }

    fn publish(
        &self,
        sequence: u32,
        detections: Vec<DetectionReport>,
        events: Vec<SessionEvent>,
        now: DateTime<Utc>,
    ) -> FrameReport {
        let open = self.registry.values().filter(|s| !s.is_closed());
        let (mut unknown_count, mut present_count, mut tracked) = (0, 0, 0usize);
        for subject in open {
            tracked += 1;
            match subject.kind() {
                SubjectKind::Unknown => unknown_count += 1,
                SubjectKind::Enrolled if subject.entry_logged() => present_count += 1,
                SubjectKind::Enrolled => {}
            }
        }
        gauge!("subjects_tracked").set(tracked as f64);

        let report = FrameReport {
            sequence,
            at: now,
            detections,
            unknown_count,
            present_count,
            events,
        };
        // Err only means nobody is watching
        let _ = self.reports.send(report.clone());
        report
    }

    /// Pull frames until the stream ends, fails, or `shutdown` turns true,
    /// then release the source and close the session.
    pub async fn run(
        &mut self,
        source: &mut dyn FrameSource,
        localizer: &dyn FaceLocalizer,
        matcher: &dyn IdentityMatcher,
        sink: &dyn AttendanceSink,
        shutdown: watch::Receiver<bool>,
    ) -> Result<SessionSummary, SessionError> {
        info!(
            recognition_interval = self.settings.recognition_interval,
            absence_timeout_ms = self.settings.absence_timeout_ms,
            "Monitoring session started"
        );

        let mut failure = None;
        loop {
            if *shutdown.borrow() {
                info!("Shutdown requested; stopping monitoring");
                break;
            }

            match source.next_frame() {
                Ok(Some(frame)) => {
                    self.process_frame(&frame, localizer, matcher, sink, Utc::now());
                }
                Ok(None) => {
                    info!("Frame source exhausted");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Frame source failed; stopping monitoring");
                    failure = Some(e);
                    break;
                }
            }

            tokio::task::yield_now().await;
        }

        source.release();
        let summary = self.finish(Utc::now(), sink);
        match failure {
            Some(e) => Err(SessionError::Camera(e)),
            None => Ok(summary),
        }
    }

    /// Close every open subject, recording exits for those with an entry
    pub fn finish(&mut self, now: DateTime<Utc>, sink: &dyn AttendanceSink) -> SessionSummary {
        for (id, subject) in self.registry.iter_mut() {
            if subject.close(now) && subject.entry_logged() {
                record_exit(sink, id, subject.suspicion_score(), now, &mut self.summary);
            }
        }
        gauge!("subjects_tracked").set(0.0);
        info!(
            frames = self.summary.frames_processed,
            subjects = self.summary.subjects_seen,
            entries = self.summary.entries,
            exits = self.summary.exits,
            "Monitoring session finished"
        );
        self.summary.clone()
    }
}

fn record_exit(sink: &dyn AttendanceSink, id: &str, suspicion: f64, now: DateTime<Utc>, summary: &mut SessionSummary) {
    summary.exits += 1;
    if let Err(e) = sink.record_suspicion(id, now, suspicion) {
        warn!(subject = id, error = %e, "Failed to store suspicion score");
    }
    if let Err(e) = sink.record_exit(id, now) {
        warn!(subject = id, error = %e, "Failed to record exit");
    }
}

/// Log a suspicious activity unless the same (subject, kind) is in cooldown
#[allow(clippy::too_many_arguments)]
fn log_activity(
    alerts: &mut AlertManager,
    sink: &dyn AttendanceSink,
    subject_id: &str,
    kind: ActivityKind,
    liveness_confidence: Option<f64>,
    description: String,
    summary: &mut SessionSummary,
    events: &mut Vec<SessionEvent>,
    now: DateTime<Utc>,
) {
    if !alerts.try_fire(subject_id, kind, now) {
        return;
    }
    let severity = alerts.severity(kind, liveness_confidence);
    summary.suspicious_activities += 1;
    if let Err(e) = sink.record_suspicious_activity(subject_id, kind, severity, &description, now) {
        warn!(subject = subject_id, %kind, error = %e, "Failed to record suspicious activity");
    }
    events.push(SessionEvent::Suspicious {
        subject_id: subject_id.to_string(),
        kind,
        severity,
        description,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use camera_capture::CameraError;
    use chrono::{Duration, TimeZone};
    use identity::{IdentityError, MatchCandidate};
    use storage::Repository;

    fn t(ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap() + Duration::milliseconds(ms)
    }

    /// Deterministic high-texture RGB noise below the glare levels
    fn noisy_frame(width: u32, height: u32, seed: u32) -> VideoFrame {
        let mut state = seed.wrapping_mul(2_654_435_761).max(1);
        let data = (0..width * height * 3)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state % 190) as u8
            })
            .collect();
        VideoFrame::new(data, width, height, 0, 0)
    }

    struct FixedMatcher(Option<MatchCandidate>);

    impl IdentityMatcher for FixedMatcher {
        fn best_match(&self, _crop: &VideoFrame) -> Result<Option<MatchCandidate>, IdentityError> {
            Ok(self.0.clone())
        }
    }

    struct FailingMatcher;

    impl IdentityMatcher for FailingMatcher {
        fn best_match(&self, _crop: &VideoFrame) -> Result<Option<MatchCandidate>, IdentityError> {
            Err(IdentityError::Unavailable("offline".to_string()))
        }
    }

    fn alice(distance: f32) -> FixedMatcher {
        FixedMatcher(Some(MatchCandidate {
            subject_id: "s-alice".to_string(),
            display_name: "Alice".to_string(),
            distance,
        }))
    }

    fn one_face(x: f32) -> impl Fn(&VideoFrame) -> Result<Vec<BoundingBox>, CameraError> {
        move |_frame: &VideoFrame| Ok(vec![BoundingBox::new(x, 20.0, 64.0, 64.0)])
    }

    #[test]
    fn test_live_enrolled_subject_enters_once() {
        let settings = Settings::default();
        let mut session = MonitoringSession::new(&settings);
        let repo = Repository::new();
        let matcher = alice(0.1);

        let first = session.process_frame(&noisy_frame(160, 120, 1), &one_face(40.0), &matcher, &repo, t(0));
        assert_eq!(first.entries().collect::<Vec<_>>(), vec!["s-alice"]);
        assert_eq!(first.present_count, 1);

        let second = session.process_frame(&noisy_frame(160, 120, 2), &one_face(40.0), &matcher, &repo, t(100));
        assert_eq!(second.entries().count(), 0);
        assert_eq!(second.detections.len(), 1);
        assert_eq!(repo.attendance_count(), 1);
        assert_eq!(session.summary().entries, 1);
    }

    #[test]
    fn test_rejected_match_creates_unknown_logged_once() {
        let settings = Settings::default();
        let mut session = MonitoringSession::new(&settings);
        let repo = Repository::new();
        let matcher = alice(0.35);

        let first = session.process_frame(&noisy_frame(160, 120, 1), &one_face(40.0), &matcher, &repo, t(0));
        assert!(first
            .events
            .iter()
            .any(|e| matches!(e, SessionEvent::UnknownDetected { subject_id } if subject_id == "unknown-1")));
        assert_eq!(first.unknown_count, 1);

        // Re-match every frame: the same sighting keeps its tracker
        let settings = Settings {
            session: SessionSettings {
                recognition_interval: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut session = MonitoringSession::new(&settings);
        let repo = Repository::new();
        for i in 0..5 {
            session.process_frame(&noisy_frame(160, 120, i), &one_face(40.0), &matcher, &repo, t(i as i64 * 100));
        }
        assert_eq!(session.summary().unknown_seen, 1);
        assert_eq!(repo.activity_count(), 1);
        assert_eq!(repo.attendance_count(), 0);
    }

    #[test]
    fn test_proximity_between_rematches() {
        let settings = Settings::default();
        let mut session = MonitoringSession::new(&settings);
        let repo = Repository::new();

        session.process_frame(&noisy_frame(320, 120, 1), &one_face(40.0), &alice(0.1), &repo, t(0));
        // Matcher would now say unknown, but it is not consulted between re-matches
        let report = session.process_frame(&noisy_frame(320, 120, 2), &one_face(70.0), &alice(0.9), &repo, t(100));
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.detections[0].subject.id, "s-alice");

        // Too far from any tracker: left unresolved until the next re-match
        let report = session.process_frame(&noisy_frame(320, 120, 3), &one_face(250.0), &alice(0.1), &repo, t(200));
        assert!(report.detections.is_empty());
        assert_eq!(session.summary().unknown_seen, 0);
    }

    #[test]
    fn test_no_entry_credited_between_rematches() {
        let settings = Settings::default();
        let mut session = MonitoringSession::new(&settings);
        let repo = Repository::new();
        let photo = VideoFrame::filled(160, 120, [128, 128, 128]);

        // Matched photo fails liveness
        let first = session.process_frame(&photo, &one_face(40.0), &alice(0.1), &repo, t(0));
        assert_eq!(first.entries().count(), 0);

        // A live face takes its place while identity is only tracked by position
        let second = session.process_frame(&noisy_frame(160, 120, 2), &one_face(45.0), &alice(0.9), &repo, t(100));
        assert_eq!(second.detections.len(), 1);
        assert_eq!(second.detections[0].subject.id, "s-alice");
        assert_eq!(second.entries().count(), 0);
        assert_eq!(repo.attendance_count(), 0);
        assert!(!session.subject("s-alice").unwrap().entry_logged());
    }

    #[test]
    fn test_entry_credited_on_next_accepted_rematch() {
        let settings = Settings {
            session: SessionSettings {
                recognition_interval: 2,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut session = MonitoringSession::new(&settings);
        let repo = Repository::new();
        let photo = VideoFrame::filled(160, 120, [128, 128, 128]);

        session.process_frame(&photo, &one_face(40.0), &alice(0.1), &repo, t(0));
        let tracked = session.process_frame(&noisy_frame(160, 120, 2), &one_face(40.0), &alice(0.1), &repo, t(100));
        assert_eq!(tracked.entries().count(), 0);

        let rematched = session.process_frame(&noisy_frame(160, 120, 3), &one_face(40.0), &alice(0.1), &repo, t(200));
        assert_eq!(rematched.entries().collect::<Vec<_>>(), vec!["s-alice"]);
        assert_eq!(repo.attendance_count(), 1);
    }

    #[test]
    fn test_upstream_failures_do_not_abort() {
        let settings = Settings {
            session: SessionSettings {
                recognition_interval: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut session = MonitoringSession::new(&settings);
        let repo = Repository::new();

        let broken = |_: &VideoFrame| -> Result<Vec<BoundingBox>, CameraError> {
            Err(CameraError::Localizer("model missing".to_string()))
        };
        let report = session.process_frame(&noisy_frame(160, 120, 1), &broken, &alice(0.1), &repo, t(0));
        assert!(report.detections.is_empty());

        let report = session.process_frame(&noisy_frame(160, 120, 2), &one_face(40.0), &FailingMatcher, &repo, t(100));
        assert!(report.detections.is_empty());
        assert_eq!(session.frames_processed(), 2);
        assert_eq!(session.open_subjects(), 0);
    }

    #[test]
    fn test_absence_records_exit_once() {
        let settings = Settings::default();
        let mut session = MonitoringSession::new(&settings);
        let repo = Repository::new();
        let nobody = |_: &VideoFrame| -> Result<Vec<BoundingBox>, CameraError> { Ok(vec![]) };

        session.process_frame(&noisy_frame(160, 120, 1), &one_face(40.0), &alice(0.1), &repo, t(0));
        let report = session.process_frame(&noisy_frame(160, 120, 2), &nobody, &alice(0.1), &repo, t(11_000));
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, SessionEvent::Exit { subject_id, .. } if subject_id == "s-alice")));
        assert_eq!(report.present_count, 0);

        let report = session.process_frame(&noisy_frame(160, 120, 3), &nobody, &alice(0.1), &repo, t(20_000));
        assert!(report.events.is_empty());
        assert_eq!(session.summary().exits, 1);

        let day = repo.today(t(20_000)).unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day[0].exit_time, Some(t(11_000)));
    }

    #[test]
    fn test_spoof_logged_with_cooldown() {
        let settings = Settings {
            session: SessionSettings {
                recognition_interval: 1,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut session = MonitoringSession::new(&settings);
        let repo = Repository::new();
        let photo = VideoFrame::filled(160, 120, [128, 128, 128]);

        for i in 0..3 {
            session.process_frame(&photo, &one_face(40.0), &alice(0.1), &repo, t(i * 100));
        }

        let activities = repo.suspicious_activities(false, 10).unwrap();
        assert_eq!(activities.len(), 1);
        assert_eq!(activities[0].kind, ActivityKind::SpoofingAttempt);
        assert!(activities[0].description.contains("printed_photo"));
        assert_eq!(repo.attendance_count(), 0);

        let alice = session.subject("s-alice").unwrap();
        assert!(alice.spoofing_detected());
        assert!(alice.challenge().is_some());
    }

    #[test]
    fn test_finish_closes_open_subjects() {
        let settings = Settings::default();
        let mut session = MonitoringSession::new(&settings);
        let repo = Repository::new();

        session.process_frame(&noisy_frame(160, 120, 1), &one_face(40.0), &alice(0.1), &repo, t(0));
        let summary = session.finish(t(1_000), &repo);

        assert_eq!(summary.entries, 1);
        assert_eq!(summary.exits, 1);
        assert_eq!(session.open_subjects(), 0);
        assert!(repo.today(t(1_000)).unwrap().iter().all(|r| r.exit_time.is_some()));
    }

    #[test]
    fn test_reports_are_broadcast() {
        let settings = Settings::default();
        let mut session = MonitoringSession::new(&settings);
        let mut viewer = session.subscribe();
        let repo = Repository::new();

        let sent = session.process_frame(&noisy_frame(160, 120, 1), &one_face(40.0), &alice(0.1), &repo, t(0));
        let received = viewer.try_recv().unwrap();
        assert_eq!(received.sequence, sent.sequence);
        assert_eq!(received.detections.len(), 1);
    }
}

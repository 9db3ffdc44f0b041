//! Per-subject tracking state

use crate::config::TrackerConfig;
use crate::state::{Challenge, ChallengeEvent, SubjectKind, SubjectStatus};
use camera_capture::{BoundingBox, Point, VideoFrame};
use chrono::{DateTime, Duration, Utc};
use liveness::{CheckResults, LivenessEngine, LivenessVerdict, SpoofType};
use ring_buffer::RingBuffer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// One liveness evaluation kept for audit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessRecord {
    pub at: DateTime<Utc>,
    pub is_live: bool,
    pub confidence: f64,
    pub checks: CheckResults,
}

/// What changed during one `Subject::update`
#[derive(Debug, Clone, Default)]
pub struct UpdateOutcome {
    /// Verdict for this frame, if a crop was evaluated
    pub verdict: Option<LivenessVerdict>,
    /// Attack type when the verdict was not live
    pub spoof: Option<SpoofType>,
    /// True when this frame turned a clean subject into a spoofing one
    pub spoof_started: bool,
    /// True when the static-behaviour penalty was applied
    pub static_behavior: bool,
    pub suspicion_score: f64,
}

/// Serializable view of a subject for reports and the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectStatusReport {
    pub id: String,
    pub display_name: String,
    pub kind: SubjectKind,
    pub status: SubjectStatus,
    pub suspicion_score: f64,
    pub is_live: bool,
    pub liveness_confidence: f64,
    pub spoofing_type: Option<SpoofType>,
    pub challenge: Option<String>,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub last_seen: DateTime<Utc>,
}

/// A tracked identity within a monitoring session
#[derive(Debug, Clone)]
pub struct Subject {
    id: String,
    display_name: String,
    kind: SubjectKind,
    config: TrackerConfig,

    movement_history: RingBuffer<f64>,
    last_position: Option<Point>,
    first_seen: DateTime<Utc>,
    last_seen: DateTime<Utc>,
    frames_seen: u64,

    suspicion_score: f64,
    is_live: bool,
    liveness_confidence: f64,
    liveness_resolved: bool,
    spoofing_detected: bool,
    spoofing_type: Option<SpoofType>,
    recent_checks: RingBuffer<LivenessRecord>,

    challenge: Option<Challenge>,
    escalated: bool,

    entry_logged: bool,
    entry_time: Option<DateTime<Utc>>,
    exit_time: Option<DateTime<Utc>>,
}

impl Subject {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        kind: SubjectKind,
        now: DateTime<Utc>,
    ) -> Self {
        Self::with_config(id, display_name, kind, TrackerConfig::default(), now)
    }

    pub fn with_config(
        id: impl Into<String>,
        display_name: impl Into<String>,
        kind: SubjectKind,
        config: TrackerConfig,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            kind,
            movement_history: RingBuffer::new(config.history_capacity.max(1)),
            recent_checks: RingBuffer::new(config.recent_checks_capacity.max(1)),
            config,
            last_position: None,
            first_seen: now,
            last_seen: now,
            frames_seen: 0,
            suspicion_score: 0.0,
            is_live: false,
            liveness_confidence: 0.0,
            liveness_resolved: false,
            spoofing_detected: false,
            spoofing_type: None,
            challenge: None,
            escalated: false,
            entry_logged: false,
            entry_time: None,
            exit_time: None,
        }
    }

    /// Ingest one detection of this subject
    pub fn update(
        &mut self,
        bbox: &BoundingBox,
        crop: Option<&VideoFrame>,
        engine: &LivenessEngine,
        now: DateTime<Utc>,
    ) -> UpdateOutcome {
        let center = bbox.center();
        if let Some(previous) = self.last_position {
            self.movement_history.push(previous.distance(&center));
        }
        self.last_position = Some(center);
        self.last_seen = now;
        self.frames_seen += 1;

        let mut outcome = UpdateOutcome::default();

        if let Some(crop) = crop {
            let history = self.movement_history.to_vec();
            let verdict = engine.detect_liveness(Some(crop), Some(&history));
            self.apply_verdict(&verdict, now, &mut outcome);
            outcome.verdict = Some(verdict);
        }

        outcome.static_behavior = self.adjust_for_movement();
        outcome.suspicion_score = self.suspicion_score;
        outcome
    }

    fn apply_verdict(&mut self, verdict: &LivenessVerdict, now: DateTime<Utc>, outcome: &mut UpdateOutcome) {
        self.is_live = verdict.is_live;
        self.liveness_confidence = verdict.confidence;
        self.liveness_resolved = true;
        self.recent_checks.push(LivenessRecord {
            at: now,
            is_live: verdict.is_live,
            confidence: verdict.confidence,
            checks: verdict.checks.clone(),
        });

        match verdict.spoof_type() {
            Some(spoof) => {
                outcome.spoof_started = !self.spoofing_detected;
                outcome.spoof = Some(spoof);
                self.spoofing_detected = true;
                self.spoofing_type = Some(spoof);
                self.suspicion_score += self.config.spoof_penalty;
                if outcome.spoof_started {
                    warn!(
                        subject = %self.id,
                        spoof_type = %spoof,
                        confidence = verdict.confidence,
                        "Spoofing detected"
                    );
                }
            }
            None => {
                self.spoofing_detected = false;
                self.spoofing_type = None;
            }
        }
    }

    /// Coarse static-behaviour signal over the whole movement buffer
    fn adjust_for_movement(&mut self) -> bool {
        if self.movement_history.len() < self.config.min_samples_for_static {
            return false;
        }

        let mean = self.movement_history.iter().sum::<f64>() / self.movement_history.len() as f64;
        if mean < self.config.static_mean_threshold {
            self.suspicion_score += self.config.static_penalty;
            true
        } else {
            self.suspicion_score = (self.suspicion_score - self.config.decay).max(0.0);
            false
        }
    }

    pub fn is_suspicious(&self) -> bool {
        self.suspicion_score > self.config.suspicion_threshold || self.spoofing_detected
    }

    /// Mean of the latest challenge-window samples; None until enough exist
    pub fn recent_movement(&self) -> Option<f64> {
        let window = self.config.challenge_window.max(1);
        if self.movement_history.len() < window {
            return None;
        }
        let latest = self.movement_history.read_last(window);
        Some(latest.iter().sum::<f64>() / window as f64)
    }

    /// Advance the challenge state machine.
    ///
    /// A challenge is only issued once the score is over the threshold; a
    /// spoof flag alone marks the subject suspicious without prompting it.
    /// A pass is judged on the latest movement samples, which may predate
    /// the challenge: history is not reset on issue.
    pub fn evaluate_challenge(&mut self, now: DateTime<Utc>) -> ChallengeEvent {
        if self.escalated {
            return ChallengeEvent::Idle;
        }

        let Some(issued_at) = self.challenge.as_ref().map(|c| c.issued_at) else {
            if self.suspicion_score > self.config.suspicion_threshold {
                let challenge = Challenge::new(now);
                info!(subject = %self.id, suspicion = self.suspicion_score, "Challenge issued");
                self.challenge = Some(challenge.clone());
                return ChallengeEvent::Issued(challenge);
            }
            return ChallengeEvent::Idle;
        };

        if now - issued_at < self.config.challenge_timeout() {
            let passed = self
                .recent_movement()
                .map_or(false, |m| m > self.config.challenge_min_movement);
            if !passed {
                return ChallengeEvent::Pending;
            }

            info!(subject = %self.id, "Challenge passed");
            self.challenge = None;
            self.suspicion_score = 0.0;
            self.spoofing_detected = false;
            self.spoofing_type = None;
            ChallengeEvent::Passed
        } else {
            warn!(subject = %self.id, suspicion = self.suspicion_score, "Challenge expired");
            self.challenge = None;
            self.escalated = true;
            ChallengeEvent::Expired
        }
    }

    pub fn status(&self) -> SubjectStatus {
        if self.escalated {
            SubjectStatus::Suspicious
        } else if self.challenge.is_some() {
            SubjectStatus::ChallengePending
        } else if self.is_suspicious() {
            SubjectStatus::Suspicious
        } else {
            SubjectStatus::Verified
        }
    }

    /// Close the subject once it has been unseen for longer than `timeout`.
    /// Returns true only on the transition.
    pub fn check_absence(&mut self, now: DateTime<Utc>, timeout: Duration) -> bool {
        if self.exit_time.is_some() || now - self.last_seen <= timeout {
            return false;
        }
        debug!(subject = %self.id, last_seen = %self.last_seen, "Subject absent");
        self.exit_time = Some(now);
        true
    }

    /// Close the subject unconditionally (session end). Returns false if
    /// it was already closed.
    pub fn close(&mut self, now: DateTime<Utc>) -> bool {
        if self.exit_time.is_some() {
            return false;
        }
        self.exit_time = Some(now);
        true
    }

    /// Mark attendance once the subject is verified live. True exactly once.
    pub fn try_mark_entry(&mut self, now: DateTime<Utc>) -> bool {
        let eligible = self.kind == SubjectKind::Enrolled
            && self.liveness_resolved
            && self.is_live
            && !self.spoofing_detected
            && !self.entry_logged
            && self.exit_time.is_none();
        if eligible {
            self.entry_logged = true;
            self.entry_time = Some(now);
        }
        eligible
    }

    pub fn snapshot(&self) -> SubjectStatusReport {
        SubjectStatusReport {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            kind: self.kind,
            status: self.status(),
            suspicion_score: self.suspicion_score,
            is_live: self.is_live,
            liveness_confidence: self.liveness_confidence,
            spoofing_type: self.spoofing_type,
            challenge: self.challenge.as_ref().map(|c| c.instruction.clone()),
            entry_time: self.entry_time,
            exit_time: self.exit_time,
            last_seen: self.last_seen,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn kind(&self) -> SubjectKind {
        self.kind
    }

    pub fn last_position(&self) -> Option<Point> {
        self.last_position
    }

    pub fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }

    pub fn last_seen(&self) -> DateTime<Utc> {
        self.last_seen
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    pub fn suspicion_score(&self) -> f64 {
        self.suspicion_score
    }

    pub fn is_live(&self) -> bool {
        self.is_live
    }

    pub fn liveness_confidence(&self) -> f64 {
        self.liveness_confidence
    }

    pub fn spoofing_detected(&self) -> bool {
        self.spoofing_detected
    }

    pub fn spoofing_type(&self) -> Option<SpoofType> {
        self.spoofing_type
    }

    pub fn challenge(&self) -> Option<&Challenge> {
        self.challenge.as_ref()
    }

    pub fn entry_logged(&self) -> bool {
        self.entry_logged
    }

    pub fn entry_time(&self) -> Option<DateTime<Utc>> {
        self.entry_time
    }

    pub fn exit_time(&self) -> Option<DateTime<Utc>> {
        self.exit_time
    }

    /// True once an exit has been recorded
    pub fn is_closed(&self) -> bool {
        self.exit_time.is_some()
    }

    pub fn movement_history(&self) -> &RingBuffer<f64> {
        &self.movement_history
    }

    pub fn recent_checks(&self) -> &RingBuffer<LivenessRecord> {
        &self.recent_checks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
    }

    fn at(ms: i64) -> DateTime<Utc> {
        t0() + Duration::milliseconds(ms)
    }

    fn bbox_at(x: f32) -> BoundingBox {
        BoundingBox::new(x, 50.0, 80.0, 80.0)
    }

    fn uniform_crop() -> VideoFrame {
        VideoFrame::filled(64, 64, [128, 128, 128])
    }

    fn noisy_crop() -> VideoFrame {
        let mut state = 0x9e37_79b9_u32;
        let mut data = Vec::with_capacity(64 * 64 * 3);
        for _ in 0..64 * 64 * 3 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            data.push((state % 190) as u8);
        }
        VideoFrame::new(data, 64, 64, 0, 0)
    }

    fn student() -> Subject {
        Subject::new("s-001", "Ada Lovelace", SubjectKind::Enrolled, t0())
    }

    /// Three photo frames at t0 take the score to 15, over the threshold
    fn spoofed_student(engine: &LivenessEngine) -> Subject {
        let mut subject = student();
        for _ in 0..3 {
            subject.update(&bbox_at(100.0), Some(&uniform_crop()), engine, t0());
        }
        subject
    }

    #[test]
    fn test_movement_history_is_bounded() {
        let engine = LivenessEngine::default();
        let mut subject = student();
        for i in 0..40 {
            subject.update(&bbox_at(i as f32 * 3.0), None, &engine, at(i * 100));
        }
        assert_eq!(subject.movement_history().len(), 30);
        assert!(subject.movement_history().iter().all(|&d| (d - 3.0).abs() < 1e-9));
        assert_eq!(subject.frames_seen(), 40);
    }

    #[test]
    fn test_static_uniform_crop_becomes_suspicious() {
        let engine = LivenessEngine::default();
        let mut subject = student();
        let crop = uniform_crop();

        let mut issued = false;
        for i in 0..25 {
            let outcome = subject.update(&bbox_at(100.0), Some(&crop), &engine, at(i * 100));
            assert_eq!(outcome.spoof, Some(SpoofType::PrintedPhoto));
            assert_eq!(outcome.spoof_started, i == 0);
            // 20 samples are buffered from the 21st frame on
            assert_eq!(outcome.static_behavior, i >= 20);

            if let ChallengeEvent::Issued(challenge) = subject.evaluate_challenge(at(i * 100)) {
                assert!(!challenge.instruction.is_empty());
                issued = true;
            }
        }

        assert!(issued);
        assert!(subject.is_suspicious());
        assert_eq!(subject.status(), SubjectStatus::ChallengePending);
        assert_eq!(subject.suspicion_score(), 25.0 * 5.0 + 5.0);
        assert_eq!(subject.recent_checks().len(), 10);
        assert!(!subject.try_mark_entry(at(2_500)));
    }

    #[test]
    fn test_challenge_passed_by_movement() {
        let engine = LivenessEngine::default();
        let mut subject = spoofed_student(&engine);
        assert!(matches!(subject.evaluate_challenge(t0()), ChallengeEvent::Issued(_)));

        for step in 1..=5 {
            let x = 100.0 + 8.0 * step as f32;
            subject.update(&bbox_at(x), None, &engine, at(step * 1_000));
        }
        assert_eq!(subject.recent_movement(), Some(8.0));

        assert_eq!(subject.evaluate_challenge(at(5_000)), ChallengeEvent::Passed);
        assert!(subject.challenge().is_none());
        assert_eq!(subject.suspicion_score(), 0.0);
        assert_eq!(subject.status(), SubjectStatus::Verified);
    }

    #[test]
    fn test_challenge_pending_then_expired() {
        let engine = LivenessEngine::default();
        let mut subject = spoofed_student(&engine);
        subject.evaluate_challenge(t0());

        assert_eq!(subject.evaluate_challenge(at(4_000)), ChallengeEvent::Pending);
        assert_eq!(subject.status(), SubjectStatus::ChallengePending);

        assert_eq!(subject.evaluate_challenge(at(10_000)), ChallengeEvent::Expired);
        assert_eq!(subject.status(), SubjectStatus::Suspicious);

        // Terminal for the session
        assert_eq!(subject.evaluate_challenge(at(11_000)), ChallengeEvent::Idle);
        assert_eq!(subject.status(), SubjectStatus::Suspicious);
    }

    #[test]
    fn test_challenge_not_reissued_while_outstanding() {
        let engine = LivenessEngine::default();
        let mut subject = spoofed_student(&engine);
        assert!(matches!(subject.evaluate_challenge(t0()), ChallengeEvent::Issued(_)));
        assert_eq!(subject.evaluate_challenge(at(100)), ChallengeEvent::Pending);
    }

    #[test]
    fn test_spoof_flag_alone_does_not_issue_challenge() {
        let engine = LivenessEngine::default();
        let mut subject = student();
        subject.update(&bbox_at(100.0), Some(&uniform_crop()), &engine, t0());
        assert_eq!(subject.suspicion_score(), 5.0);
        assert!(subject.spoofing_detected());

        assert_eq!(subject.evaluate_challenge(t0()), ChallengeEvent::Idle);
        assert!(subject.challenge().is_none());
        assert_eq!(subject.status(), SubjectStatus::Suspicious);

        // Exactly at the threshold is still not enough
        subject.update(&bbox_at(100.0), Some(&uniform_crop()), &engine, at(100));
        assert_eq!(subject.suspicion_score(), 10.0);
        assert_eq!(subject.evaluate_challenge(at(100)), ChallengeEvent::Idle);

        subject.update(&bbox_at(100.0), Some(&uniform_crop()), &engine, at(200));
        assert!(matches!(subject.evaluate_challenge(at(200)), ChallengeEvent::Issued(_)));
        assert_eq!(subject.status(), SubjectStatus::ChallengePending);
    }

    #[test]
    fn test_verified_subject_gets_no_challenge() {
        let mut subject = student();
        assert_eq!(subject.evaluate_challenge(t0()), ChallengeEvent::Idle);
        assert_eq!(subject.status(), SubjectStatus::Verified);
    }

    #[test]
    fn test_entry_marked_once() {
        let engine = LivenessEngine::default();
        let mut subject = student();
        let crop = noisy_crop();

        let mut entries = 0;
        for _ in 0..2 {
            let outcome = subject.update(&bbox_at(100.0), Some(&crop), &engine, t0());
            assert!(outcome.verdict.map_or(false, |v| v.is_live));
            if subject.try_mark_entry(t0()) {
                entries += 1;
            }
        }

        assert_eq!(entries, 1);
        assert!(subject.entry_logged());
        assert_eq!(subject.entry_time(), Some(t0()));
    }

    #[test]
    fn test_entry_requires_resolved_liveness() {
        let engine = LivenessEngine::default();
        let mut subject = student();
        subject.update(&bbox_at(100.0), None, &engine, t0());
        assert!(!subject.try_mark_entry(t0()));
    }

    #[test]
    fn test_unknown_subject_never_credited() {
        let engine = LivenessEngine::default();
        let mut subject = Subject::new("unknown-1", "Unknown", SubjectKind::Unknown, t0());
        subject.update(&bbox_at(100.0), Some(&noisy_crop()), &engine, t0());
        assert!(subject.is_live());
        assert!(!subject.try_mark_entry(t0()));
    }

    #[test]
    fn test_absence_sets_exit_once() {
        let mut subject = student();
        let timeout = Duration::seconds(10);

        assert!(!subject.check_absence(at(5_000), timeout));
        assert!(subject.check_absence(at(11_000), timeout));
        assert_eq!(subject.exit_time(), Some(at(11_000)));

        assert!(!subject.check_absence(at(20_000), timeout));
        assert_eq!(subject.exit_time(), Some(at(11_000)));
        assert!(!subject.close(at(30_000)));
    }

    #[test]
    fn test_no_entry_after_exit() {
        let engine = LivenessEngine::default();
        let mut subject = student();
        assert!(subject.check_absence(at(11_000), Duration::seconds(10)));
        subject.update(&bbox_at(100.0), Some(&noisy_crop()), &engine, at(12_000));
        assert!(!subject.try_mark_entry(at(12_000)));
    }

    #[test]
    fn test_snapshot_serializes() {
        let engine = LivenessEngine::default();
        let mut subject = spoofed_student(&engine);
        subject.evaluate_challenge(t0());

        let json = serde_json::to_value(subject.snapshot()).unwrap();
        assert_eq!(json["status"], "challenge_pending");
        assert_eq!(json["spoofing_type"], "printed_photo");
        assert_eq!(json["kind"], "enrolled");
    }

    proptest! {
        #[test]
        fn prop_suspicion_never_negative(steps in proptest::collection::vec(0.0f32..20.0, 1..80)) {
            let engine = LivenessEngine::default();
            let mut subject = student();
            let mut x = 0.0;
            for (i, dx) in steps.iter().enumerate() {
                x += *dx;
                subject.update(&bbox_at(x), None, &engine, at(i as i64 * 33));
                prop_assert!(subject.suspicion_score() >= 0.0);
            }
        }

        #[test]
        fn prop_decay_floors_at_zero(moving in 1usize..60) {
            let engine = LivenessEngine::default();
            let mut subject = student();
            subject.update(&bbox_at(0.0), Some(&uniform_crop()), &engine, t0());
            prop_assert_eq!(subject.suspicion_score(), 5.0);

            for i in 1..=(20 + moving) {
                subject.update(&bbox_at(i as f32 * 10.0), None, &engine, at(i as i64 * 33));
            }
            // One decay per update from the 20th buffered sample on
            let expected = (5.0 - 0.5 * (moving as f64 + 1.0)).max(0.0);
            prop_assert_eq!(subject.suspicion_score(), expected);
        }
    }
}

//! Subject Tracker
//!
//! One `Subject` per identity seen during a monitoring session:
//! - Bounded movement history from successive face centres
//! - Liveness verdicts from the stateless engine, with a short audit log
//! - Cumulative suspicion score with a floor at zero
//! - Challenge state machine (verified / challenge pending / suspicious)
//! - Absence detection and one-shot attendance entry eligibility

pub mod config;
pub mod state;
pub mod subject;

pub use config::TrackerConfig;
pub use state::{Challenge, ChallengeEvent, SubjectKind, SubjectStatus, CHALLENGE_INSTRUCTION};
pub use subject::{LivenessRecord, Subject, SubjectStatusReport, UpdateOutcome};

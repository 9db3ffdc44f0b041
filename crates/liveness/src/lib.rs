//! Liveness Engine
//!
//! Decides whether a face crop shows a live, three-dimensional person or a
//! reproduction (printed photo, phone/monitor screen, static image):
//! - Six independent heuristic checks, each scoring `(is_live, score)`
//! - A conjunctive fusion rule requiring broad agreement plus at least two
//!   strongly confident signals
//! - Spoof-type classification from the failed checks
//!
//! Evaluation is total: missing or degenerate input falls back to neutral
//! check results, never to an error.

pub mod checks;
pub mod config;
pub mod engine;
pub mod spoof;
pub mod verdict;

pub use checks::{CheckFn, CheckInput, CHECKS};
pub use config::LivenessConfig;
pub use engine::LivenessEngine;
pub use spoof::{classify_spoof, SpoofType};
pub use verdict::{CheckName, CheckResult, CheckResults, LivenessVerdict};

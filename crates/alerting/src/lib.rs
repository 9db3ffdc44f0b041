//! Alerting System
//!
//! Suspicious-activity kinds, severity mapping, and per-subject alert
//! deduplication with a cooldown and an hourly cap.

mod kind;
mod manager;

pub use kind::{ActivityKind, ParseKindError, Severity};
pub use manager::{AlertConfig, AlertManager};

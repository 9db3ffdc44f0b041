//! Match acceptance

use crate::IdentityError;
use camera_capture::VideoFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Accept matches at or below this distance (70% similarity)
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.3;

/// Best gallery candidate returned by a matcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub subject_id: String,
    pub display_name: String,
    /// Dissimilarity; lower is more similar
    pub distance: f32,
}

/// External face matcher
pub trait IdentityMatcher: Send + Sync {
    /// Best candidate for a face crop, or None for an empty gallery
    fn best_match(&self, crop: &VideoFrame) -> Result<Option<MatchCandidate>, IdentityError>;
}

/// Outcome of applying the acceptance policy
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityDecision {
    Accepted(MatchCandidate),
    /// No acceptable candidate; the rejected one is kept for logging
    Unknown { rejected: Option<MatchCandidate> },
}

impl IdentityDecision {
    pub fn accepted(&self) -> Option<&MatchCandidate> {
        match self {
            IdentityDecision::Accepted(candidate) => Some(candidate),
            IdentityDecision::Unknown { .. } => None,
        }
    }
}

/// Distance threshold policy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AcceptancePolicy {
    pub threshold: f32,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl AcceptancePolicy {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Accept the single best candidate iff its distance is within the
    /// threshold. There is no fallback to weaker candidates.
    pub fn decide(&self, candidate: Option<MatchCandidate>) -> IdentityDecision {
        match candidate {
            Some(c) if c.distance.is_finite() && c.distance <= self.threshold => {
                IdentityDecision::Accepted(c)
            }
            Some(c) => {
                debug!(
                    subject = %c.subject_id,
                    distance = c.distance,
                    threshold = self.threshold,
                    "Match rejected"
                );
                IdentityDecision::Unknown { rejected: Some(c) }
            }
            None => IdentityDecision::Unknown { rejected: None },
        }
    }
}

//! Liveness evaluation

use crate::checks::{CheckInput, CHECKS};
use crate::config::LivenessConfig;
use crate::verdict::{CheckResults, LivenessVerdict};
use camera_capture::VideoFrame;
use feature_engine::FeatureExtractor;
use tracing::debug;

/// Stateless liveness engine; safe to share across threads
#[derive(Debug, Clone, Default)]
pub struct LivenessEngine {
    config: LivenessConfig,
    extractor: FeatureExtractor,
}

impl LivenessEngine {
    pub fn new(config: LivenessConfig) -> Self {
        let extractor =
            FeatureExtractor::new(config.reflection.bright_level, config.reflection.moderate_level);
        Self { config, extractor }
    }

    pub fn config(&self) -> &LivenessConfig {
        &self.config
    }

    /// Evaluate a face crop and its recent displacement history.
    ///
    /// Never fails: a missing or degenerate crop yields neutral image checks,
    /// and an absent or empty history leaves the movement check out.
    pub fn detect_liveness(
        &self,
        crop: Option<&VideoFrame>,
        movement_history: Option<&[f64]>,
    ) -> LivenessVerdict {
        let features = crop.and_then(|c| self.extractor.extract(c));
        let input = CheckInput {
            features: features.as_ref(),
            movement_history,
        };

        let checks: CheckResults = CHECKS
            .iter()
            .filter_map(|(name, check)| check(&input, &self.config).map(|r| (*name, r)))
            .collect();

        let verdict = LivenessVerdict::fuse(checks, &self.config.fusion);
        debug!(
            is_live = verdict.is_live,
            confidence = verdict.confidence,
            passing = verdict.passing,
            high_confidence = verdict.high_confidence,
            failing = verdict.failing,
            "Liveness decision"
        );
        verdict
    }
}

//! Liveness heuristics
//!
//! Each check is a pure function from the shared per-crop features (and the
//! movement history) to a `CheckResult`. Image checks return the neutral
//! result when no features could be extracted. The movement check returns
//! `None` when no history was supplied, which drops it from fusion.

use crate::config::{Band, LivenessConfig};
use crate::verdict::{CheckName, CheckResult};
use feature_engine::{ImageFeatures, StatisticalFeatures};

/// Inputs shared by all checks
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckInput<'a> {
    pub features: Option<&'a ImageFeatures>,
    pub movement_history: Option<&'a [f64]>,
}

/// A liveness heuristic; `None` means the check did not run
pub type CheckFn = fn(&CheckInput<'_>, &LivenessConfig) -> Option<CheckResult>;

/// The fixed check table, fused by `LivenessVerdict::fuse`
pub const CHECKS: [(CheckName, CheckFn); 6] = [
    (CheckName::Movement, movement),
    (CheckName::Texture, texture),
    (CheckName::Color, color),
    (CheckName::Reflection, reflection),
    (CheckName::ScreenPattern, screen_pattern),
    (CheckName::Depth, depth),
];

const STATIC_SCORE: f64 = 0.2;
const SMOOTH_SCORE: f64 = 0.2;
const LOW_ENTROPY_SCORE: f64 = 0.4;
const GLARE_SCORE: f64 = 0.2;
const PIXEL_GRID_SCORE: f64 = 0.3;
const FLAT_SCORE: f64 = 0.3;

/// Below the band fails, above it is live, inside is borderline
fn banded(value: f64, band: &Band, fail_score: f64) -> CheckResult {
    if value < band.spoof_below {
        CheckResult::spoof(fail_score, value)
    } else if value > band.live_above {
        CheckResult::live(value)
    } else {
        CheckResult::borderline(Some(value))
    }
}

/// Natural head motion vs a static reproduction
pub fn movement(input: &CheckInput<'_>, config: &LivenessConfig) -> Option<CheckResult> {
    let history = input.movement_history.filter(|h| !h.is_empty())?;
    let t = &config.movement;
    if history.len() < t.min_samples {
        return Some(CheckResult::neutral());
    }

    let stats = StatisticalFeatures::compute(history);
    let result = if stats.mean < t.static_mean && stats.std_dev < t.static_std_dev {
        CheckResult::spoof(STATIC_SCORE, stats.mean)
    } else if stats.mean > t.natural_mean && stats.std_dev > t.natural_std_dev {
        CheckResult::live(stats.mean)
    } else {
        CheckResult::borderline(Some(stats.mean))
    };
    Some(result)
}

/// Skin micro-texture; prints and screens are too smooth
pub fn texture(input: &CheckInput<'_>, config: &LivenessConfig) -> Option<CheckResult> {
    Some(match input.features {
        Some(f) => banded(f.laplacian_variance, &config.texture, SMOOTH_SCORE),
        None => CheckResult::neutral(),
    })
}

/// Colour diversity; reproductions lose dynamic range
pub fn color(input: &CheckInput<'_>, config: &LivenessConfig) -> Option<CheckResult> {
    Some(match input.features {
        Some(f) => banded(f.mean_entropy(), &config.color, LOW_ENTROPY_SCORE),
        None => CheckResult::neutral(),
    })
}

/// Specular glare and screen glow
pub fn reflection(input: &CheckInput<'_>, config: &LivenessConfig) -> Option<CheckResult> {
    let Some(f) = input.features else {
        return Some(CheckResult::neutral());
    };
    let t = &config.reflection;

    let result = if f.bright_ratio > t.bright_max || f.moderate_ratio > t.moderate_max {
        CheckResult::spoof(GLARE_SCORE, f.bright_ratio)
    } else if f.bright_ratio < t.bright_clean && f.moderate_ratio < t.moderate_clean {
        CheckResult::live(f.bright_ratio)
    } else {
        CheckResult::borderline(Some(f.bright_ratio))
    };
    Some(result)
}

/// Display pixel grid in the high-frequency spectrum
pub fn screen_pattern(input: &CheckInput<'_>, config: &LivenessConfig) -> Option<CheckResult> {
    let Some(f) = input.features else {
        return Some(CheckResult::neutral());
    };
    let Some(energy) = f.high_freq_energy else {
        return Some(CheckResult::borderline(None));
    };
    let t = &config.screen_pattern;

    let result = if energy > t.grid_low && energy < t.grid_high {
        CheckResult::spoof(PIXEL_GRID_SCORE, energy)
    } else if energy < t.clean_low || energy > t.clean_high {
        CheckResult::live(energy)
    } else {
        CheckResult::borderline(Some(energy))
    };
    Some(result)
}

/// Edge variance as a proxy for 3-D structure
pub fn depth(input: &CheckInput<'_>, config: &LivenessConfig) -> Option<CheckResult> {
    Some(match input.features {
        Some(f) => banded(f.gradient_variance, &config.depth, FLAT_SCORE),
        None => CheckResult::neutral(),
    })
}

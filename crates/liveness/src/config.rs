//! Liveness configuration

use serde::{Deserialize, Serialize};

/// Movement check thresholds (pixel displacement between frame centres)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementThresholds {
    /// Samples needed before the check gives a non-neutral answer
    pub min_samples: usize,
    /// Mean below this (with low spread) is too static
    pub static_mean: f64,
    pub static_std_dev: f64,
    /// Mean and spread above these look like natural motion
    pub natural_mean: f64,
    pub natural_std_dev: f64,
}

impl Default for MovementThresholds {
    fn default() -> Self {
        Self {
            min_samples: 10,
            static_mean: 1.0,
            static_std_dev: 0.5,
            natural_mean: 0.5,
            natural_std_dev: 0.3,
        }
    }
}

/// Lower/upper decision band for a single scalar statistic
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Band {
    /// At or below: reproduction suspected
    pub spoof_below: f64,
    /// Above: live
    pub live_above: f64,
}

/// Glare check thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionThresholds {
    /// Gray level for specular highlights
    pub bright_level: u8,
    /// Gray level for screen glow
    pub moderate_level: u8,
    /// Ratios above which a screen is suspected
    pub bright_max: f64,
    pub moderate_max: f64,
    /// Ratios below which the crop is clean
    pub bright_clean: f64,
    pub moderate_clean: f64,
}

impl Default for ReflectionThresholds {
    fn default() -> Self {
        Self {
            bright_level: 240,
            moderate_level: 200,
            bright_max: 0.20,
            moderate_max: 0.35,
            bright_clean: 0.10,
            moderate_clean: 0.25,
        }
    }
}

/// Screen pixel-grid thresholds on high-frequency spectral energy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenPatternThresholds {
    /// Energy strictly inside (grid_low, grid_high) suggests a pixel grid
    pub grid_low: f64,
    pub grid_high: f64,
    /// Energy below clean_low or above clean_high is camera-like
    pub clean_low: f64,
    pub clean_high: f64,
}

impl Default for ScreenPatternThresholds {
    fn default() -> Self {
        Self {
            grid_low: 20.0,
            grid_high: 80.0,
            clean_low: 15.0,
            clean_high: 100.0,
        }
    }
}

/// Fusion rule parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionRule {
    pub min_passing: usize,
    pub min_confidence: f64,
    pub min_high_confidence: usize,
    pub max_failing: usize,
    /// A live check counts as passing above this score
    pub pass_score: f64,
    /// A check counts as high-confidence above this score
    pub high_score: f64,
}

impl Default for FusionRule {
    fn default() -> Self {
        Self {
            min_passing: 4,
            min_confidence: 0.65,
            min_high_confidence: 2,
            max_failing: 2,
            pass_score: 0.5,
            high_score: 0.7,
        }
    }
}

/// Liveness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    pub movement: MovementThresholds,
    /// Laplacian variance band
    pub texture: Band,
    /// Mean channel entropy band (bits)
    pub color: Band,
    pub reflection: ReflectionThresholds,
    pub screen_pattern: ScreenPatternThresholds,
    /// Sobel magnitude variance band
    pub depth: Band,
    pub fusion: FusionRule,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            movement: MovementThresholds::default(),
            texture: Band {
                spoof_below: 15.0,
                live_above: 25.0,
            },
            color: Band {
                spoof_below: 4.0,
                live_above: 5.5,
            },
            reflection: ReflectionThresholds::default(),
            screen_pattern: ScreenPatternThresholds::default(),
            depth: Band {
                spoof_below: 100.0,
                live_above: 400.0,
            },
            fusion: FusionRule::default(),
        }
    }
}

impl LivenessConfig {
    /// Stricter fusion: five passing checks and higher mean confidence
    pub fn strict() -> Self {
        Self {
            fusion: FusionRule {
                min_passing: 5,
                min_confidence: 0.75,
                min_high_confidence: 3,
                max_failing: 1,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LivenessConfig::default();
        assert_eq!(config.movement.min_samples, 10);
        assert_eq!(config.texture.spoof_below, 15.0);
        assert_eq!(config.fusion.min_passing, 4);
        assert_eq!(config.reflection.bright_level, 240);
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config: LivenessConfig =
            serde_json::from_str(r#"{"fusion": {"min_passing": 3}}"#).unwrap();
        assert_eq!(config.fusion.min_passing, 3);
        assert_eq!(config.fusion.max_failing, 2);
        assert_eq!(config.depth.live_above, 400.0);
    }
}

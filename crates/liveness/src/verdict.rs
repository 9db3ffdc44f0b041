//! Check results and the fused verdict

use crate::config::FusionRule;
use crate::spoof::{classify_spoof, SpoofType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Liveness heuristic identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    Movement,
    Texture,
    Color,
    Reflection,
    ScreenPattern,
    Depth,
}

impl CheckName {
    pub const ALL: [CheckName; 6] = [
        CheckName::Movement,
        CheckName::Texture,
        CheckName::Color,
        CheckName::Reflection,
        CheckName::ScreenPattern,
        CheckName::Depth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::Movement => "movement",
            CheckName::Texture => "texture",
            CheckName::Color => "color",
            CheckName::Reflection => "reflection",
            CheckName::ScreenPattern => "screen_pattern",
            CheckName::Depth => "depth",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of one liveness heuristic
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub is_live: bool,
    /// Score in [0, 1]
    pub score: f64,
    /// The statistic the decision was made on, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measured: Option<f64>,
}

impl CheckResult {
    pub const NEUTRAL_SCORE: f64 = 0.5;
    pub const BORDERLINE_SCORE: f64 = 0.6;
    pub const LIVE_SCORE: f64 = 0.9;

    /// Neutral default for missing or degenerate input
    pub fn neutral() -> Self {
        Self {
            is_live: true,
            score: Self::NEUTRAL_SCORE,
            measured: None,
        }
    }

    pub fn live(measured: f64) -> Self {
        Self {
            is_live: true,
            score: Self::LIVE_SCORE,
            measured: Some(measured),
        }
    }

    pub fn borderline(measured: Option<f64>) -> Self {
        Self {
            is_live: true,
            score: Self::BORDERLINE_SCORE,
            measured,
        }
    }

    pub fn spoof(score: f64, measured: f64) -> Self {
        Self {
            is_live: false,
            score,
            measured: Some(measured),
        }
    }
}

/// Per-check breakdown, ordered by check name
pub type CheckResults = BTreeMap<CheckName, CheckResult>;

/// Fused liveness decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LivenessVerdict {
    pub is_live: bool,
    /// Mean score of the checks that ran
    pub confidence: f64,
    pub checks: CheckResults,
    /// Checks that are live with a score above the pass score
    pub passing: usize,
    /// Checks scoring above the high-confidence score
    pub high_confidence: usize,
    pub failing: usize,
}

impl LivenessVerdict {
    /// Apply the fusion rule to a set of check results
    pub fn fuse(checks: CheckResults, rule: &FusionRule) -> Self {
        let ran = checks.len();
        let confidence = if ran == 0 {
            0.0
        } else {
            checks.values().map(|c| c.score).sum::<f64>() / ran as f64
        };

        let passing = checks
            .values()
            .filter(|c| c.is_live && c.score > rule.pass_score)
            .count();
        let high_confidence = checks.values().filter(|c| c.score > rule.high_score).count();
        let failing = checks.values().filter(|c| !c.is_live).count();

        let is_live = passing >= rule.min_passing
            && confidence > rule.min_confidence
            && high_confidence >= rule.min_high_confidence
            && failing <= rule.max_failing;

        Self {
            is_live,
            confidence,
            checks,
            passing,
            high_confidence,
            failing,
        }
    }

    /// Attack type for a negative verdict; None when live
    pub fn spoof_type(&self) -> Option<SpoofType> {
        if self.is_live {
            None
        } else {
            Some(classify_spoof(&self.checks))
        }
    }

    /// Names of the checks that failed
    pub fn failed_checks(&self) -> Vec<CheckName> {
        self.checks
            .iter()
            .filter(|(_, c)| !c.is_live)
            .map(|(name, _)| *name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn result(is_live: bool, score: f64) -> CheckResult {
        CheckResult {
            is_live,
            score,
            measured: None,
        }
    }

    fn checks(results: &[(CheckName, bool, f64)]) -> CheckResults {
        results
            .iter()
            .map(|&(name, live, score)| (name, result(live, score)))
            .collect()
    }

    #[test]
    fn test_all_live_passes() {
        let all = CheckName::ALL.iter().map(|&n| (n, result(true, 0.9))).collect();
        let verdict = LivenessVerdict::fuse(all, &FusionRule::default());
        assert!(verdict.is_live);
        assert_eq!(verdict.passing, 6);
        assert!((verdict.confidence - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_borderline_only_fails_high_confidence_requirement() {
        // Five borderline passes and one strong pass: only one score above 0.7
        let mut all: CheckResults = CheckName::ALL.iter().map(|&n| (n, result(true, 0.6))).collect();
        all.insert(CheckName::Texture, result(true, 0.9));
        let verdict = LivenessVerdict::fuse(all, &FusionRule::default());
        assert_eq!(verdict.passing, 6);
        assert_eq!(verdict.high_confidence, 1);
        assert!(!verdict.is_live);
    }

    #[test]
    fn test_three_failures_reject() {
        let verdict = LivenessVerdict::fuse(
            checks(&[
                (CheckName::Movement, true, 0.9),
                (CheckName::Texture, false, 0.2),
                (CheckName::Color, true, 0.9),
                (CheckName::Reflection, true, 0.9),
                (CheckName::ScreenPattern, false, 0.3),
                (CheckName::Depth, false, 0.3),
            ]),
            &FusionRule::default(),
        );
        assert_eq!(verdict.failing, 3);
        assert!(!verdict.is_live);
        assert_eq!(verdict.spoof_type(), Some(SpoofType::PhoneScreenDisplay));
    }

    #[test]
    fn test_five_checks_without_movement() {
        let verdict = LivenessVerdict::fuse(
            checks(&[
                (CheckName::Texture, true, 0.9),
                (CheckName::Color, true, 0.6),
                (CheckName::Reflection, true, 0.9),
                (CheckName::ScreenPattern, true, 0.6),
                (CheckName::Depth, true, 0.9),
            ]),
            &FusionRule::default(),
        );
        assert!((verdict.confidence - 0.78).abs() < 1e-9);
        assert!(verdict.is_live);
        assert_eq!(verdict.spoof_type(), None);
    }

    #[test]
    fn test_empty_checks_are_not_live() {
        let verdict = LivenessVerdict::fuse(CheckResults::new(), &FusionRule::default());
        assert!(!verdict.is_live);
        assert_eq!(verdict.confidence, 0.0);
    }

    #[test]
    fn test_serializes_check_names_as_keys() {
        let verdict = LivenessVerdict::fuse(
            checks(&[(CheckName::ScreenPattern, true, 0.9)]),
            &FusionRule::default(),
        );
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["checks"]["screen_pattern"]["score"], 0.9);
    }

    fn any_result() -> impl Strategy<Value = CheckResult> {
        prop_oneof![
            Just(result(true, 0.5)),
            Just(result(true, 0.6)),
            Just(result(true, 0.9)),
            Just(result(false, 0.2)),
            Just(result(false, 0.3)),
            Just(result(false, 0.4)),
        ]
    }

    proptest! {
        #[test]
        fn prop_three_failures_and_low_confidence_reject(
            results in proptest::collection::vec(any_result(), 6),
        ) {
            let all: CheckResults = CheckName::ALL.iter().copied().zip(results).collect();
            let verdict = LivenessVerdict::fuse(all, &FusionRule::default());
            if verdict.failing >= 3 && verdict.confidence <= 0.65 {
                prop_assert!(!verdict.is_live);
            }
            if verdict.is_live {
                prop_assert!(verdict.passing >= 4);
                prop_assert!(verdict.failing <= 2);
                prop_assert!(verdict.confidence > 0.65);
            }
        }
    }
}

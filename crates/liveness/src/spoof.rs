//! Spoof-type classification

use crate::verdict::{CheckName, CheckResults};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Presentation attack inferred from failed checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpoofType {
    PhoneScreenDisplay,
    PrintedPhoto,
    ScreenDisplay,
    StaticImage,
    LowQualityReproduction,
    UnknownSpoof,
}

impl SpoofType {
    pub fn label(&self) -> &'static str {
        match self {
            SpoofType::PhoneScreenDisplay => "phone_screen_display",
            SpoofType::PrintedPhoto => "printed_photo",
            SpoofType::ScreenDisplay => "screen_display",
            SpoofType::StaticImage => "static_image",
            SpoofType::LowQualityReproduction => "low_quality_reproduction",
            SpoofType::UnknownSpoof => "unknown_spoof",
        }
    }
}

impl fmt::Display for SpoofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Name the attack from the check breakdown. First match wins; a check
/// missing from the map is treated as not failed.
pub fn classify_spoof(checks: &CheckResults) -> SpoofType {
    let failed = |name: CheckName| checks.get(&name).map_or(false, |c| !c.is_live);

    if failed(CheckName::ScreenPattern) {
        SpoofType::PhoneScreenDisplay
    } else if failed(CheckName::Texture) && failed(CheckName::Depth) {
        SpoofType::PrintedPhoto
    } else if failed(CheckName::Reflection) {
        SpoofType::ScreenDisplay
    } else if failed(CheckName::Movement) {
        SpoofType::StaticImage
    } else if failed(CheckName::Color) {
        SpoofType::LowQualityReproduction
    } else {
        SpoofType::UnknownSpoof
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verdict::CheckResult;
    use proptest::prelude::*;

    fn failing(names: &[CheckName]) -> CheckResults {
        CheckName::ALL
            .iter()
            .map(|&n| {
                let result = if names.contains(&n) {
                    CheckResult::spoof(0.2, 0.0)
                } else {
                    CheckResult::live(0.0)
                };
                (n, result)
            })
            .collect()
    }

    #[test]
    fn test_screen_pattern_outranks_printed_photo() {
        let checks = failing(&[CheckName::ScreenPattern, CheckName::Texture, CheckName::Depth]);
        assert_eq!(classify_spoof(&checks).label(), "phone_screen_display");

        let checks = failing(&[CheckName::ScreenPattern, CheckName::Texture]);
        assert_eq!(classify_spoof(&checks), SpoofType::PhoneScreenDisplay);
    }

    #[test]
    fn test_priority_order() {
        assert_eq!(
            classify_spoof(&failing(&[CheckName::Texture, CheckName::Depth, CheckName::Reflection])),
            SpoofType::PrintedPhoto
        );
        assert_eq!(
            classify_spoof(&failing(&[CheckName::Texture, CheckName::Reflection])),
            SpoofType::ScreenDisplay
        );
        assert_eq!(
            classify_spoof(&failing(&[CheckName::Movement, CheckName::Color])),
            SpoofType::StaticImage
        );
        assert_eq!(classify_spoof(&failing(&[CheckName::Color])), SpoofType::LowQualityReproduction);
        assert_eq!(classify_spoof(&failing(&[CheckName::Texture])), SpoofType::UnknownSpoof);
        assert_eq!(classify_spoof(&failing(&[])), SpoofType::UnknownSpoof);
    }

    #[test]
    fn test_missing_check_is_not_failed() {
        let mut checks = failing(&[CheckName::Movement]);
        checks.remove(&CheckName::Movement);
        assert_eq!(classify_spoof(&checks), SpoofType::UnknownSpoof);
    }

    #[test]
    fn test_label_matches_serde() {
        let json = serde_json::to_string(&SpoofType::LowQualityReproduction).unwrap();
        assert_eq!(json, "\"low_quality_reproduction\"");
    }

    proptest! {
        #[test]
        fn prop_failed_screen_pattern_always_wins(mask in 0u8..64) {
            let names: Vec<CheckName> = CheckName::ALL
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, &n)| n)
                .collect();
            let mut with_screen = names.clone();
            with_screen.push(CheckName::ScreenPattern);
            let checks = failing(&with_screen);
            prop_assert_eq!(classify_spoof(&checks), SpoofType::PhoneScreenDisplay);
            prop_assert_eq!(classify_spoof(&checks), classify_spoof(&checks.clone()));
        }
    }
}

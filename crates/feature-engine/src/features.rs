//! Image Feature Extraction
//!
//! Computes every per-crop statistic the liveness checks need from a single
//! grayscale conversion.

use crate::fft::SpectrumAnalyzer;
use crate::statistics::StatisticalFeatures;
use camera_capture::VideoFrame;
use image::{GrayImage, RgbImage};
use imageproc::filter::laplacian_filter;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use imageproc::stats::histogram;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Smallest crop side the 3x3 filters are evaluated on
pub const MIN_SIDE: u32 = 3;

/// Per-crop image statistics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageFeatures {
    /// Variance of the 3x3 Laplacian response (texture / sharpness)
    pub laplacian_variance: f64,
    /// Shannon entropy (bits) of each colour channel's 256-bin histogram
    pub channel_entropy: [f64; 3],
    /// Fraction of gray pixels strictly above the bright level
    pub bright_ratio: f64,
    /// Fraction of gray pixels strictly above the moderate level
    pub moderate_ratio: f64,
    /// Mean log-magnitude in the sampled high-frequency band; None if the
    /// crop is too small for the band to exist
    pub high_freq_energy: Option<f64>,
    /// Variance of the Sobel gradient magnitude (edge / depth cues)
    pub gradient_variance: f64,
}

impl ImageFeatures {
    /// Average entropy across the three channels
    pub fn mean_entropy(&self) -> f64 {
        self.channel_entropy.iter().sum::<f64>() / 3.0
    }
}

/// Feature extractor for face crops
#[derive(Debug, Clone, Copy)]
pub struct FeatureExtractor {
    /// Gray level above which a pixel counts as a specular highlight
    pub bright_level: u8,
    /// Gray level above which a pixel counts as screen glow
    pub moderate_level: u8,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self {
            bright_level: 240,
            moderate_level: 200,
        }
    }
}

impl FeatureExtractor {
    /// Create a feature extractor with custom glare levels
    pub fn new(bright_level: u8, moderate_level: u8) -> Self {
        Self {
            bright_level,
            moderate_level,
        }
    }

    /// Extract features from a crop. None for malformed crops and crops
    /// smaller than the 3x3 filter support.
    pub fn extract(&self, crop: &VideoFrame) -> Option<ImageFeatures> {
        if crop.width < MIN_SIDE || crop.height < MIN_SIDE {
            return None;
        }
        let rgb = crop.to_rgb_image()?;
        let gray = crop.to_gray_image()?;

        let (bright_ratio, moderate_ratio) = self.brightness_ratios(&gray);
        let features = ImageFeatures {
            laplacian_variance: laplacian_variance(&gray),
            channel_entropy: channel_entropy(&rgb),
            bright_ratio,
            moderate_ratio,
            high_freq_energy: high_frequency_energy(&gray),
            gradient_variance: gradient_variance(&gray),
        };

        debug!(
            width = crop.width,
            height = crop.height,
            laplacian_variance = features.laplacian_variance,
            mean_entropy = features.mean_entropy(),
            bright_ratio,
            moderate_ratio,
            high_freq_energy = ?features.high_freq_energy,
            gradient_variance = features.gradient_variance,
            "Extracted crop features"
        );

        Some(features)
    }

    /// Ratios of pixels brighter than the bright and moderate levels
    pub fn brightness_ratios(&self, gray: &GrayImage) -> (f64, f64) {
        let total = gray.as_raw().len();
        if total == 0 {
            return (0.0, 0.0);
        }

        let (mut bright, mut moderate) = (0usize, 0usize);
        for &v in gray.as_raw() {
            if v > self.bright_level {
                bright += 1;
            }
            if v > self.moderate_level {
                moderate += 1;
            }
        }
        (bright as f64 / total as f64, moderate as f64 / total as f64)
    }
}

/// Variance of the Laplacian response
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let response = laplacian_filter(gray);
    StatisticalFeatures::from_samples(response.as_raw().iter().map(|&v| v as f64)).variance
}

/// Variance of `sqrt(gx^2 + gy^2)` for 3x3 Sobel derivatives
pub fn gradient_variance(gray: &GrayImage) -> f64 {
    let gx = horizontal_sobel(gray);
    let gy = vertical_sobel(gray);
    let magnitudes = gx
        .as_raw()
        .iter()
        .zip(gy.as_raw().iter())
        .map(|(&x, &y)| ((x as f64).powi(2) + (y as f64).powi(2)).sqrt());
    StatisticalFeatures::from_samples(magnitudes).variance
}

/// Shannon entropy of each RGB channel histogram
pub fn channel_entropy(rgb: &RgbImage) -> [f64; 3] {
    let hist = histogram(rgb);
    let mut entropy = [0.0; 3];
    for (slot, channel) in entropy.iter_mut().zip(hist.channels.iter()) {
        *slot = shannon_entropy(channel);
    }
    entropy
}

/// Shannon entropy in bits of a histogram; 0 for an empty histogram
pub fn shannon_entropy(hist: &[u32]) -> f64 {
    let total: u64 = hist.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return 0.0;
    }

    hist.iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.log2()
        })
        .sum()
}

fn high_frequency_energy(gray: &GrayImage) -> Option<f64> {
    let (w, h) = gray.dimensions();
    let pixels: Vec<f64> = gray.as_raw().iter().map(|&v| v as f64).collect();
    SpectrumAnalyzer::new()
        .magnitude_spectrum(&pixels, w as usize, h as usize)
        .high_frequency_energy()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(size: u32, cell: u32) -> VideoFrame {
        let mut data = Vec::new();
        for y in 0..size {
            for x in 0..size {
                let v = if ((x / cell) + (y / cell)) % 2 == 0 { 30 } else { 170 };
                data.extend_from_slice(&[v, v, v]);
            }
        }
        VideoFrame::new(data, size, size, 0, 0)
    }

    #[test]
    fn test_uniform_crop_is_flat() {
        let crop = VideoFrame::filled(48, 48, [128, 128, 128]);
        let features = FeatureExtractor::default().extract(&crop).unwrap();

        assert_eq!(features.laplacian_variance, 0.0);
        assert_eq!(features.gradient_variance, 0.0);
        assert_eq!(features.mean_entropy(), 0.0);
        assert_eq!(features.bright_ratio, 0.0);
        assert_eq!(features.moderate_ratio, 0.0);
        assert!(features.high_freq_energy.unwrap() < 1e-6);
    }

    #[test]
    fn test_checkerboard_has_texture() {
        let features = FeatureExtractor::default().extract(&checkerboard(48, 3)).unwrap();
        assert!(features.laplacian_variance > 25.0);
        assert!(features.gradient_variance > 400.0);
    }

    #[test]
    fn test_white_crop_is_all_glare() {
        let crop = VideoFrame::filled(16, 16, [255, 255, 255]);
        let features = FeatureExtractor::default().extract(&crop).unwrap();
        assert_eq!(features.bright_ratio, 1.0);
        assert_eq!(features.moderate_ratio, 1.0);
    }

    #[test]
    fn test_degenerate_crop_yields_none() {
        let extractor = FeatureExtractor::default();
        assert!(extractor.extract(&VideoFrame::new(Vec::new(), 0, 0, 0, 0)).is_none());
        assert!(extractor.extract(&VideoFrame::new(vec![0; 5], 4, 4, 0, 0)).is_none());
        assert!(extractor.extract(&VideoFrame::filled(2, 40, [9, 9, 9])).is_none());
        assert!(extractor.extract(&VideoFrame::filled(3, 3, [9, 9, 9])).is_some());
    }

    #[test]
    fn test_shannon_entropy() {
        assert_eq!(shannon_entropy(&[0; 256]), 0.0);
        assert_eq!(shannon_entropy(&[10]), 0.0);
        assert!((shannon_entropy(&[5, 5]) - 1.0).abs() < 1e-12);

        let uniform = [1u32; 256];
        assert!((shannon_entropy(&uniform) - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_channel_entropy_per_channel() {
        // Red varies across 4 levels, green and blue constant
        let mut data = Vec::new();
        for i in 0..16u32 {
            data.extend_from_slice(&[(i % 4 * 60) as u8, 7, 7]);
        }
        let rgb = RgbImage::from_raw(4, 4, data).unwrap();
        let entropy = channel_entropy(&rgb);
        assert!((entropy[0] - 2.0).abs() < 1e-9);
        assert_eq!(entropy[1], 0.0);
        assert_eq!(entropy[2], 0.0);
    }
}

//! Feature Engineering Engine
//!
//! Image statistics consumed by the liveness checks: texture (Laplacian
//! variance), colour entropy, glare ratios, gradient variance, and the
//! 2-D magnitude spectrum used to spot screen pixel grids.

mod features;
mod fft;
mod statistics;

pub use features::{shannon_entropy, FeatureExtractor, ImageFeatures};
pub use fft::{MagnitudeSpectrum, SpectrumAnalyzer};
pub use statistics::StatisticalFeatures;

//! Statistical Features Computation

/// Summary statistics for a sample (population moments, as numpy computes them)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatisticalFeatures {
    /// Number of samples
    pub count: usize,
    /// Mean value
    pub mean: f64,
    /// Population variance
    pub variance: f64,
    /// Standard deviation
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
}

impl StatisticalFeatures {
    /// Compute statistical features from a slice of values
    pub fn compute(values: &[f64]) -> Self {
        Self::from_samples(values.iter().copied())
    }

    /// Compute from any iterator of samples in a single pass (Welford)
    pub fn from_samples(values: impl IntoIterator<Item = f64>) -> Self {
        let mut count = 0usize;
        let mut mean = 0.0;
        let mut m2 = 0.0;
        let mut min = f64::MAX;
        let mut max = f64::MIN;

        for v in values {
            count += 1;
            let delta = v - mean;
            mean += delta / count as f64;
            m2 += delta * (v - mean);
            min = min.min(v);
            max = max.max(v);
        }

        if count == 0 {
            return Self::default();
        }

        let variance = (m2 / count as f64).max(0.0);
        Self {
            count,
            mean,
            variance,
            std_dev: variance.sqrt(),
            min,
            max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mean_computation() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = StatisticalFeatures::compute(&values);
        assert!((stats.mean - 3.0).abs() < 0.001);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 5.0);
    }

    #[test]
    fn test_std_dev_computation() {
        let values = vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = StatisticalFeatures::compute(&values);
        // Population std dev is exactly 2.0 for this dataset
        assert!((stats.std_dev - 2.0).abs() < 1e-9);
        assert!((stats.variance - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_values() {
        let stats = StatisticalFeatures::compute(&[3.5; 12]);
        assert_eq!(stats.variance, 0.0);
        assert_eq!(stats.count, 12);
    }

    #[test]
    fn test_empty_values() {
        let values: Vec<f64> = vec![];
        let stats = StatisticalFeatures::compute(&values);
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.count, 0);
    }

    proptest! {
        #[test]
        fn prop_matches_two_pass_variance(values in proptest::collection::vec(-1000.0f64..1000.0, 1..100)) {
            let n = values.len() as f64;
            let mean = values.iter().sum::<f64>() / n;
            let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

            let stats = StatisticalFeatures::compute(&values);
            prop_assert!((stats.mean - mean).abs() < 1e-6);
            prop_assert!((stats.variance - var).abs() < 1e-4 * var.max(1.0));
        }
    }
}

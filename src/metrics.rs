//! Quality metrics reported alongside an enhanced image.
//!
//! The [`QualityEstimator`] trait is the seam for a real measurement. The
//! only implementation today, [`SimulatedEstimator`], does not look at the
//! pixels at all: it draws placeholder values from fixed ranges so a UI has
//! something plausible to display. Treat its numbers as illustrative.

use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::RasterImage;

/// Range of simulated sharpness scores.
pub const SHARPNESS_RANGE: Range<u8> = 75..95;
/// Range of simulated noise scores.
pub const NOISE_RANGE: Range<u8> = 0..15;
/// Range of simulated colour enhancement scores.
pub const COLOR_ENHANCE_RANGE: Range<u8> = 80..95;

/// Three bounded percentages (0-100) describing an enhancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityMetrics {
    /// Perceived sharpness, higher is sharper.
    pub sharpness: u8,
    /// Residual noise, lower is cleaner.
    pub noise: u8,
    /// Colour enhancement strength.
    pub color_enhance: u8,
}

impl QualityMetrics {
    /// Noise expressed as a reduction score (`100 - noise`), the way it is
    /// usually displayed next to the other two values.
    #[must_use]
    pub fn noise_reduction(&self) -> u8 {
        100u8.saturating_sub(self.noise)
    }
}

/// Produces [`QualityMetrics`] for an original/enhanced pair.
pub trait QualityEstimator: Send + Sync {
    /// Estimate quality metrics for `enhanced` relative to `original`.
    fn estimate(&self, original: &RasterImage, enhanced: &RasterImage) -> QualityMetrics;
}

/// Placeholder estimator returning random values from fixed ranges.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatedEstimator {
    seed: Option<u64>,
}

impl SimulatedEstimator {
    /// Estimator drawing from the thread-local RNG.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Estimator returning the same values on every call.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn sample(rng: &mut impl Rng) -> QualityMetrics {
        QualityMetrics {
            sharpness: rng.random_range(SHARPNESS_RANGE),
            noise: rng.random_range(NOISE_RANGE),
            color_enhance: rng.random_range(COLOR_ENHANCE_RANGE),
        }
    }
}

impl QualityEstimator for SimulatedEstimator {
    fn estimate(&self, _original: &RasterImage, _enhanced: &RasterImage) -> QualityMetrics {
        match self.seed {
            Some(seed) => Self::sample(&mut StdRng::seed_from_u64(seed)),
            None => Self::sample(&mut rand::rng()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> RasterImage {
        RasterImage::new(3, 3)
    }

    #[test]
    fn simulated_values_stay_in_range() {
        let estimator = SimulatedEstimator::new();
        let img = blank();
        for _ in 0..500 {
            let m = estimator.estimate(&img, &img);
            assert!(SHARPNESS_RANGE.contains(&m.sharpness), "sharpness {}", m.sharpness);
            assert!(NOISE_RANGE.contains(&m.noise), "noise {}", m.noise);
            assert!(
                COLOR_ENHANCE_RANGE.contains(&m.color_enhance),
                "color_enhance {}",
                m.color_enhance
            );
        }
    }

    #[test]
    fn seeded_estimator_is_repeatable() {
        let img = blank();
        let a = SimulatedEstimator::seeded(7).estimate(&img, &img);
        let b = SimulatedEstimator::seeded(7).estimate(&img, &img);
        assert_eq!(a, b);
    }

    #[test]
    fn noise_reduction_inverts_noise() {
        let m = QualityMetrics {
            sharpness: 80,
            noise: 12,
            color_enhance: 90,
        };
        assert_eq!(m.noise_reduction(), 88);
    }
}

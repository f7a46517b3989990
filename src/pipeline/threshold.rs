//! Gesture confirmation threshold.

use crate::classifier::ConfidenceScore;

/// Score a frame must exceed for the gesture to count as present.
///
/// Not derived from a documented calibration of the model.
pub const CONFIDENCE_THRESHOLD: f32 = 0.8;

/// Strict lower bound on the confidence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionThreshold(f32);

impl Default for DetectionThreshold {
    fn default() -> Self {
        Self(CONFIDENCE_THRESHOLD)
    }
}

impl DetectionThreshold {
    /// Creates a threshold, clamped into `[0, 1]`.
    pub fn new(value: f32) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    /// Returns the raw value.
    pub fn value(self) -> f32 {
        self.0
    }

    /// True only if `score` is strictly above the threshold.
    #[inline]
    pub fn is_confirmed(self, score: ConfidenceScore) -> bool {
        score.value() > self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn score(v: f32) -> ConfidenceScore {
        ConfidenceScore::new(v).unwrap()
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let threshold = DetectionThreshold::default();

        assert!(!threshold.is_confirmed(score(0.8)));
        assert!(threshold.is_confirmed(score(0.800_000_1)));
        assert!(!threshold.is_confirmed(score(0.0)));
        assert!(threshold.is_confirmed(score(1.0)));
    }

    #[test]
    fn test_new_clamps() {
        assert_eq!(DetectionThreshold::new(1.5).value(), 1.0);
        assert_eq!(DetectionThreshold::new(-1.0).value(), 0.0);
    }

    proptest! {
        #[test]
        fn prop_confirmed_iff_strictly_above(v in 0.0f32..=1.0) {
            let threshold = DetectionThreshold::default();
            prop_assert_eq!(threshold.is_confirmed(score(v)), v > CONFIDENCE_THRESHOLD);
        }
    }
}

use crate::config::ForceWeights;
use crate::types::{EmbeddingVector, Forces};

/// Blends the rule forces into the single vector that steers the next word.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SteeringEngine {
    pub weights: ForceWeights,
}

impl Default for SteeringEngine {
    fn default() -> Self {
        Self::new(ForceWeights::default())
    }
}

impl SteeringEngine {
    pub fn new(weights: ForceWeights) -> Self {
        Self { weights }
    }

    /// `ws * sep + wa * align + wc * coh`. Not normalised or clamped.
    pub fn combine(&self, forces: &Forces) -> EmbeddingVector {
        let w = &self.weights;
        &forces.separation * w.separation + &forces.alignment * w.alignment + &forces.cohesion * w.cohesion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(xs: &[f32]) -> EmbeddingVector {
        EmbeddingVector::from_row_slice(xs)
    }

    fn sample_forces() -> Forces {
        Forces {
            separation: v(&[1.0, 0.0, -1.0]),
            alignment: v(&[0.5, 0.5, 0.5]),
            cohesion: v(&[-2.0, 1.0, 0.0]),
        }
    }

    #[test]
    fn combine_uses_default_weights() {
        let total = SteeringEngine::default().combine(&sample_forces());
        // 1.5 * sep + 1.0 * align + 1.2 * coh
        let expected = v(&[1.5 + 0.5 - 2.4, 0.5 + 1.2, -1.5 + 0.5]);
        assert!((total - expected).norm() < 1e-5);
    }

    #[test]
    fn zero_forces_combine_to_zero() {
        let total = SteeringEngine::default().combine(&Forces::zeros(4));
        assert_eq!(total, EmbeddingVector::zeros(4));
    }

    #[test]
    fn scaling_one_force_scales_only_its_contribution() {
        let engine = SteeringEngine::default();
        let base = sample_forces();
        let base_total = engine.combine(&base);

        let mut scaled = base.clone();
        scaled.cohesion *= 3.0;
        let scaled_total = engine.combine(&scaled);

        let delta = scaled_total - base_total;
        let expected = &base.cohesion * (2.0 * engine.weights.cohesion);
        assert!((delta - expected).norm() < 1e-5);
    }

    #[test]
    fn magnitude_is_not_clamped() {
        let engine = SteeringEngine::default();
        let forces = Forces {
            separation: v(&[10.0, 0.0]),
            alignment: v(&[10.0, 0.0]),
            cohesion: v(&[10.0, 0.0]),
        };
        let total = engine.combine(&forces);
        assert!((total.norm() - 37.0).abs() < 1e-4);
    }
}

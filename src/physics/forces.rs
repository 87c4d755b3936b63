//! Flocking rules evaluated for the trailing word against its neighbors.
//!
//! All three are pure: the same inputs always give the same force, and an
//! empty neighbor list always gives the zero vector.

use crate::config::RuleKnobs;
use crate::types::{EmbeddingVector, Forces};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceCalculator {
    pub separation_threshold: f32,
    pub epsilon: f32,
}

impl Default for ForceCalculator {
    fn default() -> Self {
        Self::from(&RuleKnobs::default())
    }
}

impl From<&RuleKnobs> for ForceCalculator {
    fn from(rules: &RuleKnobs) -> Self {
        Self {
            separation_threshold: rules.separation_threshold,
            epsilon: rules.epsilon,
        }
    }
}

impl ForceCalculator {
    /// Repulsion from every neighbor closer than the threshold.
    /// Each term is `(v - n) / (d + eps)`; eps only keeps coincident vectors finite.
    pub fn separation(&self, word_vec: &EmbeddingVector, neighbors: &[EmbeddingVector]) -> EmbeddingVector {
        let mut acc = EmbeddingVector::zeros(word_vec.len());
        for neighbor in neighbors {
            let direction = word_vec - neighbor;
            let distance = direction.norm();
            if distance < self.separation_threshold {
                acc += direction / (distance + self.epsilon);
            }
        }
        acc
    }

    /// Mean neighbor position. `word_vec` only fixes the dimensionality.
    pub fn alignment(&self, word_vec: &EmbeddingVector, neighbors: &[EmbeddingVector]) -> EmbeddingVector {
        mean(neighbors).unwrap_or_else(|| EmbeddingVector::zeros(word_vec.len()))
    }

    /// Points from the current word toward the neighborhood centroid.
    pub fn cohesion(&self, word_vec: &EmbeddingVector, neighbors: &[EmbeddingVector]) -> EmbeddingVector {
        match mean(neighbors) {
            Some(centroid) => centroid - word_vec,
            None => EmbeddingVector::zeros(word_vec.len()),
        }
    }

    pub fn forces(&self, word_vec: &EmbeddingVector, neighbors: &[EmbeddingVector]) -> Forces {
        Forces {
            separation: self.separation(word_vec, neighbors),
            alignment: self.alignment(word_vec, neighbors),
            cohesion: self.cohesion(word_vec, neighbors),
        }
    }
}

fn mean(vectors: &[EmbeddingVector]) -> Option<EmbeddingVector> {
    let (first, rest) = vectors.split_first()?;
    let sum = rest.iter().fold(first.clone(), |acc, v| acc + v);
    Some(sum / vectors.len() as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(xs: &[f32]) -> EmbeddingVector {
        EmbeddingVector::from_row_slice(xs)
    }

    fn assert_close(a: &EmbeddingVector, b: &EmbeddingVector) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-5, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn empty_neighbors_give_zero_forces() {
        let calc = ForceCalculator::default();
        let word = v(&[0.3, -1.2, 4.0]);
        let zero = EmbeddingVector::zeros(3);
        assert_eq!(calc.separation(&word, &[]), zero);
        assert_eq!(calc.alignment(&word, &[]), zero);
        assert_eq!(calc.cohesion(&word, &[]), zero);
        assert_eq!(calc.forces(&word, &[]), Forces::zeros(3));
    }

    #[test]
    fn distant_neighbor_does_not_repel() {
        let calc = ForceCalculator::default();
        let word = v(&[0.0, 0.0]);
        assert_eq!(calc.separation(&word, &[v(&[0.5, 0.0])]), EmbeddingVector::zeros(2));
        assert_eq!(calc.separation(&word, &[v(&[3.0, 4.0])]), EmbeddingVector::zeros(2));
    }

    #[test]
    fn close_neighbor_repels_along_difference() {
        let calc = ForceCalculator::default();
        let word = v(&[1.0, 1.0]);
        let neighbor = v(&[0.9, 1.0]);
        let force = calc.separation(&word, &[neighbor.clone()]);
        let diff = &word - &neighbor;
        // Parallel and same direction as (v - n).
        let cos = force.dot(&diff) / (force.norm() * diff.norm());
        assert!((cos - 1.0).abs() < 1e-5);
        assert!(force[0] > 0.0);
    }

    #[test]
    fn each_close_neighbor_contributes_a_near_unit_push() {
        let calc = ForceCalculator::default();
        let word = v(&[0.0, 0.0]);
        for d in [0.4f32, 0.2, 0.1, 0.01] {
            let magnitude = calc.separation(&word, &[v(&[d, 0.0])]).norm();
            assert!(magnitude > 0.99 && magnitude <= 1.0, "magnitude {magnitude} at d={d}");
        }
        let twice = calc.separation(&word, &[v(&[0.1, 0.0]), v(&[0.2, 0.0])]);
        assert!((twice[0] + 2.0).abs() < 1e-3);
        assert_eq!(twice[1], 0.0);
    }

    #[test]
    fn coincident_vectors_stay_finite() {
        let calc = ForceCalculator::default();
        let word = v(&[0.2, 0.2]);
        let force = calc.separation(&word, &[word.clone()]);
        assert!(force.iter().all(|x| x.is_finite()));
        assert_eq!(force, EmbeddingVector::zeros(2));
    }

    #[test]
    fn separation_points_away_from_closer_neighbor() {
        let calc = ForceCalculator::default();
        let word = v(&[0.0, 0.0]);
        let near = v(&[0.1, 0.0]);
        let far = v(&[0.0, 0.6]);
        let force = calc.separation(&word, &[near.clone(), far]);
        assert!(force.norm() > 0.0);
        assert!(force.dot(&(near - &word)) < 0.0);
        assert_eq!(force[1], 0.0);
    }

    #[test]
    fn alignment_is_mean_of_neighbors() {
        let calc = ForceCalculator::default();
        let word = v(&[100.0, 100.0]);
        let neighbors = [v(&[1.0, 0.0]), v(&[0.0, 1.0]), v(&[2.0, 2.0])];
        assert_close(&calc.alignment(&word, &neighbors), &v(&[1.0, 1.0]));
    }

    #[test]
    fn alignment_and_cohesion_ignore_neighbor_order() {
        let calc = ForceCalculator::default();
        let word = v(&[0.5, -0.5, 0.1]);
        let forward = [v(&[1.0, 2.0, 3.0]), v(&[-1.0, 0.0, 0.5]), v(&[0.2, 0.2, 0.2])];
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_close(&calc.alignment(&word, &forward), &calc.alignment(&word, &reversed));
        assert_close(&calc.cohesion(&word, &forward), &calc.cohesion(&word, &reversed));
    }

    #[test]
    fn cohesion_plus_word_is_centroid() {
        let calc = ForceCalculator::default();
        let word = v(&[0.7, -0.3]);
        let neighbors = [v(&[1.0, 1.0]), v(&[-1.0, 3.0])];
        let centroid = calc.alignment(&word, &neighbors);
        assert_close(&(calc.cohesion(&word, &neighbors) + &word), &centroid);
        assert_close(&centroid, &v(&[0.0, 2.0]));
    }
}

//! The generation loop: the last word of the text is the agent, the words
//! before it are its flock, and each iteration appends one steered word.

use crate::config::BoidsConfig;
use crate::embeddings::VectorLookup;
use crate::physics::forces::ForceCalculator;
use crate::physics::steering::SteeringEngine;
use crate::retrieval::{Resolution, ResolutionPath, StepError, StepResolver};
use crate::types::{neighbor_window, EmbeddingVector, Text, Word};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    /// All requested iterations completed.
    Done,
    /// Stopped early. `iteration` is the 1-based iteration that failed.
    Failed { iteration: usize, reason: StepError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutcome {
    pub text: Text,
    pub status: RunStatus,
    /// Words chosen through the random fallback.
    pub fallbacks: usize,
}

impl SimulationOutcome {
    pub fn is_done(&self) -> bool {
        self.status == RunStatus::Done
    }

    pub fn render(&self, separator: &str) -> String {
        self.text.join(separator)
    }
}

pub struct TextualBoids<L> {
    lookup: L,
    calculator: ForceCalculator,
    steering: SteeringEngine,
    resolver: StepResolver,
    neighbor_window: usize,
    rng: Box<dyn RngCore>,
}

impl<L: VectorLookup> TextualBoids<L> {
    /// Seeds from `config.run.seed` when set, otherwise from entropy.
    pub fn new(lookup: L, config: &BoidsConfig) -> Self {
        let rng = match config.run.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(lookup, config, Box::new(rng))
    }

    pub fn with_seed(lookup: L, config: &BoidsConfig, seed: u64) -> Self {
        Self::with_rng(lookup, config, Box::new(StdRng::seed_from_u64(seed)))
    }

    pub fn with_rng(lookup: L, config: &BoidsConfig, rng: Box<dyn RngCore>) -> Self {
        Self {
            lookup,
            calculator: ForceCalculator::from(&config.rules),
            steering: SteeringEngine::new(config.weights),
            resolver: StepResolver::from(&config.resolver),
            neighbor_window: config.rules.neighbor_window,
            rng,
        }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Steering vector for the last word of `text`.
    pub fn total_force(&self, text: &[Word]) -> Result<EmbeddingVector, StepError> {
        let current = text.last().ok_or(StepError::EmptyText)?;
        let current_vec = self.lookup.get(current);
        let neighbor_vecs: Vec<EmbeddingVector> = neighbor_window(text, self.neighbor_window)
            .iter()
            .map(|w| self.lookup.get(w))
            .collect();

        let forces = self.calculator.forces(&current_vec, &neighbor_vecs);
        tracing::debug!(
            current = %current,
            neighbors = neighbor_vecs.len(),
            separation = forces.separation.norm(),
            alignment = forces.alignment.norm(),
            cohesion = forces.cohesion.norm(),
            "forces computed"
        );
        Ok(self.steering.combine(&forces))
    }

    /// Resolves the word that would follow `text`. Every word of `text` is excluded.
    pub fn step(&mut self, text: &[Word]) -> Result<Resolution, StepError> {
        let total = self.total_force(text)?;
        let excluded: HashSet<Word> = text.iter().cloned().collect();
        self.resolver
            .resolve(&self.lookup, &total, &excluded, self.rng.as_mut())
    }

    /// Runs up to `iterations` steps from a copy of `initial_words`.
    ///
    /// Never fails: a step error ends the run and the partial text is
    /// returned with `RunStatus::Failed`.
    pub fn run(&mut self, initial_words: &[Word], iterations: usize) -> SimulationOutcome {
        let mut text: Text = initial_words.to_vec();
        let mut fallbacks = 0;

        for iteration in 1..=iterations {
            match self.step(&text) {
                Ok(resolution) => {
                    if resolution.path == ResolutionPath::Fallback {
                        fallbacks += 1;
                    }
                    text.push(resolution.word);
                    tracing::info!(iteration, text = %text.join(" "), "step");
                }
                Err(reason) => {
                    tracing::error!(iteration, error = %reason, "failed to find the next word");
                    return SimulationOutcome {
                        text,
                        status: RunStatus::Failed { iteration, reason },
                        fallbacks,
                    };
                }
            }
        }

        SimulationOutcome {
            text,
            status: RunStatus::Done,
            fallbacks,
        }
    }
}

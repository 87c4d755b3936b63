//! Text generation as a flock: each appended word is an agent steered by
//! separation, alignment and cohesion over a word-embedding space, then
//! snapped back to the nearest vocabulary word.

pub mod config;
pub mod embeddings;
pub mod physics;
pub mod retrieval;
pub mod simulation;
pub mod types;

// Re-exports
pub use config::BoidsConfig;
pub use embeddings::{EmbeddingFormat, EmbeddingTable, LookupError, VectorLookup};
pub use simulation::{RunStatus, SimulationOutcome, TextualBoids};
pub use types::{EmbeddingVector, Forces, Text, Word};

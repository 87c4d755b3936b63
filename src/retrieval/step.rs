use crate::config::ResolverKnobs;
use crate::embeddings::{LookupError, VectorLookup};
use crate::types::{EmbeddingVector, Word};
use rand::RngCore;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub enum ResolutionPath {
    /// Ranked candidate from the reverse search (`rank` is 0-based).
    Nearest { rank: usize, similarity: f32 },
    /// Every candidate was already used; picked uniformly from the vocabulary.
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub word: Word,
    pub path: ResolutionPath,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StepError {
    #[error("reverse search failed: {0}")]
    Search(#[from] LookupError),
    #[error("vocabulary is empty, no fallback word available")]
    NoFallback,
    #[error("text is empty, there is no current word")]
    EmptyText,
}

/// Maps a steering vector back to a concrete next word.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepResolver {
    pub top_k: usize,
}

impl Default for StepResolver {
    fn default() -> Self {
        Self::from(&ResolverKnobs::default())
    }
}

impl From<&ResolverKnobs> for StepResolver {
    fn from(knobs: &ResolverKnobs) -> Self {
        Self { top_k: knobs.top_k }
    }
}

impl StepResolver {
    /// First top-k candidate not in `excluded`, else a random vocabulary word.
    ///
    /// The random pick does not consult `excluded`, so it is the only way a
    /// word can enter the text twice.
    pub fn resolve<L: VectorLookup + ?Sized>(
        &self,
        lookup: &L,
        total: &EmbeddingVector,
        excluded: &HashSet<Word>,
        rng: &mut dyn RngCore,
    ) -> Result<Resolution, StepError> {
        let candidates = lookup.nearest(total, self.top_k)?;

        let picked = candidates
            .into_iter()
            .enumerate()
            .find(|(_, (word, _))| !excluded.contains(word));
        if let Some((rank, (word, similarity))) = picked {
            return Ok(Resolution {
                word,
                path: ResolutionPath::Nearest { rank, similarity },
            });
        }

        let word = lookup.random_word(rng).ok_or(StepError::NoFallback)?;
        tracing::warn!(word = %word, top_k = self.top_k, "all candidates already used, falling back to random word");
        Ok(Resolution {
            word,
            path: ResolutionPath::Fallback,
        })
    }
}

use crate::types::{EmbeddingVector, Word};
use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::RngCore;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Upper bound on the vector size accepted from a file header.
pub const MAX_EMBED_DIM: usize = 1 << 16;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LookupError {
    #[error("vocabulary is empty")]
    EmptyVocabulary,
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("query vector has non-finite components")]
    NonFiniteQuery,
    #[error("vector for {word:?} has non-finite components")]
    NonFiniteRow { word: Word },
}

/// Word <-> vector services the simulation depends on.
///
/// `get` never fails: a word outside the vocabulary maps to the zero vector.
/// `nearest` ranks by similarity, highest first, and may fail.
pub trait VectorLookup {
    fn dim(&self) -> usize;

    fn get(&self, word: &str) -> EmbeddingVector;

    fn nearest(&self, vector: &EmbeddingVector, k: usize)
        -> Result<Vec<(Word, f32)>, LookupError>;

    /// Uniform pick over the whole vocabulary. `None` only when it is empty.
    fn random_word(&self, rng: &mut dyn RngCore) -> Option<Word>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingFormat {
    Text,
    Binary,
}

/// In-memory embedding table with brute-force cosine search.
#[derive(Debug, Clone)]
pub struct EmbeddingTable {
    dim: usize,
    index_to_key: Vec<Word>,
    key_to_index: HashMap<Word, usize>,
    vectors: Vec<EmbeddingVector>,
    norms: Vec<f32>,
}

impl EmbeddingTable {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            index_to_key: Vec::new(),
            key_to_index: HashMap::new(),
            vectors: Vec::new(),
            norms: Vec::new(),
        }
    }

    pub fn from_rows<I, W>(dim: usize, rows: I) -> Result<Self, LookupError>
    where
        I: IntoIterator<Item = (W, Vec<f32>)>,
        W: Into<Word>,
    {
        let mut table = Self::new(dim);
        for (word, values) in rows {
            table.insert(word, values)?;
        }
        Ok(table)
    }

    /// Adds a row. A repeated word keeps its vocabulary slot and takes the new vector.
    pub fn insert(&mut self, word: impl Into<Word>, values: Vec<f32>) -> Result<(), LookupError> {
        if values.len() != self.dim {
            return Err(LookupError::DimensionMismatch {
                expected: self.dim,
                got: values.len(),
            });
        }
        let word = word.into();
        if values.iter().any(|x| !x.is_finite()) {
            return Err(LookupError::NonFiniteRow { word });
        }
        let vector = EmbeddingVector::from_vec(values);
        let norm = vector.norm();
        match self.key_to_index.get(&word) {
            Some(&idx) => {
                self.vectors[idx] = vector;
                self.norms[idx] = norm;
            }
            None => {
                self.key_to_index.insert(word.clone(), self.index_to_key.len());
                self.index_to_key.push(word);
                self.vectors.push(vector);
                self.norms.push(norm);
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.index_to_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_key.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.key_to_index.contains_key(word)
    }

    /// Words in load order.
    pub fn vocabulary(&self) -> &[Word] {
        &self.index_to_key
    }

    /// Loads a word2vec file. `limit` caps the number of rows read.
    pub fn load_word2vec(
        path: impl AsRef<Path>,
        format: EmbeddingFormat,
        limit: Option<usize>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open embeddings {}", path.display()))?;
        let reader = BufReader::new(file);
        let table = match format {
            EmbeddingFormat::Text => Self::read_text(reader, limit),
            EmbeddingFormat::Binary => Self::read_binary(reader, limit),
        }
        .with_context(|| format!("Failed to load embeddings {}", path.display()))?;
        tracing::info!(
            words = table.len(),
            dim = table.dim,
            path = %path.display(),
            "embedding table loaded"
        );
        Ok(table)
    }

    fn read_header<R: BufRead>(reader: &mut R) -> Result<(usize, usize)> {
        let mut header = String::new();
        reader
            .read_line(&mut header)
            .context("Failed to read header")?;
        let mut parts = header.split_whitespace();
        let count = parts
            .next()
            .context("Header is missing the word count")?
            .parse::<usize>()
            .context("Invalid word count in header")?;
        let dim = parts
            .next()
            .context("Header is missing the vector size")?
            .parse::<usize>()
            .context("Invalid vector size in header")?;
        if dim == 0 || dim > MAX_EMBED_DIM {
            anyhow::bail!("Vector size {} in header is outside 1..={}", dim, MAX_EMBED_DIM);
        }
        Ok((count, dim))
    }

    fn read_text<R: BufRead>(mut reader: R, limit: Option<usize>) -> Result<Self> {
        let (count, dim) = Self::read_header(&mut reader)?;
        let wanted = limit.map_or(count, |l| l.min(count));
        let mut table = Self::new(dim);

        for (row, line) in reader.lines().enumerate() {
            if table.len() >= wanted {
                break;
            }
            let line = line.with_context(|| format!("Failed to read row {}", row + 1))?;
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else {
                continue;
            };
            let values = parts
                .map(str::parse::<f32>)
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("Invalid component in row {} ({})", row + 1, word))?;
            table
                .insert(word, values)
                .with_context(|| format!("Bad row {} ({})", row + 1, word))?;
        }
        Ok(table)
    }

    fn read_binary<R: BufRead>(mut reader: R, limit: Option<usize>) -> Result<Self> {
        let (count, dim) = Self::read_header(&mut reader)?;
        let wanted = limit.map_or(count, |l| l.min(count));
        let mut table = Self::new(dim);
        let mut word_buf = Vec::new();
        let row_bytes = dim.checked_mul(4).context("Vector size too large")?;
        let mut value_buf = vec![0u8; row_bytes];

        for row in 0..wanted {
            word_buf.clear();
            reader
                .read_until(b' ', &mut word_buf)
                .with_context(|| format!("Failed to read word of row {}", row + 1))?;
            // Rows may be separated by a newline that ends up in front of the next word.
            let raw = String::from_utf8_lossy(&word_buf);
            let word = raw.trim();
            if word.is_empty() {
                anyhow::bail!("Unexpected end of file at row {}", row + 1);
            }
            reader
                .read_exact(&mut value_buf)
                .with_context(|| format!("Truncated vector in row {} ({})", row + 1, word))?;
            let values = value_buf
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                .collect();
            table.insert(word, values)?;
        }
        Ok(table)
    }

    fn cosine(query: &EmbeddingVector, query_norm: f32, row: &EmbeddingVector, row_norm: f32) -> f32 {
        if query_norm == 0.0 || row_norm == 0.0 {
            return 0.0;
        }
        query.dot(row) / (query_norm * row_norm)
    }
}

impl VectorLookup for EmbeddingTable {
    fn dim(&self) -> usize {
        self.dim
    }

    fn get(&self, word: &str) -> EmbeddingVector {
        match self.key_to_index.get(word) {
            Some(&idx) => self.vectors[idx].clone(),
            None => EmbeddingVector::zeros(self.dim),
        }
    }

    fn nearest(
        &self,
        vector: &EmbeddingVector,
        k: usize,
    ) -> Result<Vec<(Word, f32)>, LookupError> {
        if self.is_empty() {
            return Err(LookupError::EmptyVocabulary);
        }
        if vector.len() != self.dim {
            return Err(LookupError::DimensionMismatch {
                expected: self.dim,
                got: vector.len(),
            });
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(LookupError::NonFiniteQuery);
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_norm = vector.norm();
        // A huge finite query can overflow the norm and score NaN; such rows are not ranked.
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .par_iter()
            .zip(self.norms.par_iter())
            .enumerate()
            .map(|(idx, (row, &row_norm))| (idx, Self::cosine(vector, query_norm, row, row_norm)))
            .filter(|(_, score)| !score.is_nan())
            .collect();

        // Stable: ties keep vocabulary order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(idx, score)| (self.index_to_key[idx].clone(), score))
            .collect())
    }

    fn random_word(&self, rng: &mut dyn RngCore) -> Option<Word> {
        self.index_to_key.choose(rng).cloned()
    }
}

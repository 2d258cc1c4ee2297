//! Core vector types for word embeddings.
//!
//! A [`WordVec`] is a single embedding point: the word (or a synthetic
//! cluster label) plus its fixed-dimension coordinates. The dimension is
//! constant for a whole run, fixed by the embedding model that produced the
//! lexicon.

use thiserror::Error;

/// Errors that can occur during vector operations.
#[derive(Error, Debug)]
pub enum VectorError {
    #[error(
        "Vector dimension mismatch: expected {expected}, got {actual}\nSuggestion: Ensure all vectors come from the same embedding model"
    )]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector dimension: {dimension}\nReason: {reason}")]
    InvalidDimension {
        dimension: usize,
        reason: &'static str,
    },
}

/// Type-safe wrapper for the embedding dimension.
///
/// The dimension is a process-wide constant once the lexicon is loaded;
/// this newtype keeps validation in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorDimension(usize);

impl VectorDimension {
    /// Creates a new `VectorDimension` with validation.
    ///
    /// Returns an error if the dimension is zero.
    pub fn new(dim: usize) -> Result<Self, VectorError> {
        if dim == 0 {
            return Err(VectorError::InvalidDimension {
                dimension: 0,
                reason: "Vector dimension cannot be zero",
            });
        }
        Ok(Self(dim))
    }

    /// Returns the underlying dimension value.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }

    /// Validates that a coordinate slice has the expected dimension.
    pub fn validate(&self, coords: &[f32]) -> Result<(), VectorError> {
        if coords.len() != self.0 {
            return Err(VectorError::DimensionMismatch {
                expected: self.0,
                actual: coords.len(),
            });
        }
        Ok(())
    }
}

/// A single word-embedding point.
///
/// The word is either a real vocabulary entry or a synthetic cluster label
/// such as `Cluster_0`. Coordinates are immutable after construction except
/// for the explicit [`WordVec::normalize`] operation, which is applied only
/// to query-term vectors (document vectors stay unnormalized; this asymmetry
/// is part of the scoring contract).
#[derive(Debug, Clone, PartialEq)]
pub struct WordVec {
    word: String,
    coords: Vec<f32>,
}

impl WordVec {
    pub fn new(word: impl Into<String>, coords: Vec<f32>) -> Self {
        Self {
            word: word.into(),
            coords,
        }
    }

    #[must_use]
    pub fn word(&self) -> &str {
        &self.word
    }

    #[must_use]
    pub fn coords(&self) -> &[f32] {
        &self.coords
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.coords.len()
    }

    /// Scales the coordinates to unit L2 norm in place.
    ///
    /// A zero vector is left unchanged.
    pub fn normalize(&mut self) {
        let norm: f32 = self.coords.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            for value in self.coords.iter_mut() {
                *value /= norm;
            }
        }
    }

    /// Cosine similarity against another vector.
    ///
    /// Dimensions must match; this never occurs with vectors from a single
    /// lexicon, so the debug assertion is the only guard on this hot path.
    /// Use [`WordVec::checked_cosine_sim`] at trust boundaries.
    #[must_use]
    pub fn cosine_sim(&self, other: &WordVec) -> f32 {
        cosine_similarity(&self.coords, &other.coords)
    }

    /// Cosine similarity with an explicit dimension check.
    pub fn checked_cosine_sim(&self, other: &WordVec) -> Result<f32, VectorError> {
        if self.coords.len() != other.coords.len() {
            return Err(VectorError::DimensionMismatch {
                expected: self.coords.len(),
                actual: other.coords.len(),
            });
        }
        Ok(cosine_similarity(&self.coords, &other.coords))
    }
}

/// Computes cosine similarity between two coordinate slices.
///
/// Returns a value in [-1, 1]; either operand having zero norm yields 0.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

/// Componentwise mean of a group of vectors, labeled by the caller.
///
/// Returns `None` for an empty group; callers must guard before invoking.
#[must_use]
pub fn centroid(label: impl Into<String>, group: &[&WordVec]) -> Option<WordVec> {
    let first = group.first()?;
    let dim = first.dimension();
    let mut mean = vec![0.0f32; dim];

    for wv in group {
        debug_assert_eq!(wv.dimension(), dim, "Vectors must have same dimension");
        for (acc, &value) in mean.iter_mut().zip(wv.coords()) {
            *acc += value;
        }
    }
    let n = group.len() as f32;
    for value in mean.iter_mut() {
        *value /= n;
    }

    Some(WordVec::new(label, mean))
}

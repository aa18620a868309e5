// Copyright 2025 Skygraph Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Embedding abstraction shared by index build and query paths.
//!
//! Vectors from different embedding functions are not comparable, so the same
//! `Embedder` instance must be used to build an index and to query it. The
//! persisted index records `Embedder::id()` and the dimension; loads verify
//! both.

use std::fmt;
use thiserror::Error;

/// Errors from embedding computation.
#[derive(Error, Debug, Clone)]
pub enum EmbeddingError {
    /// The provider could not embed this input.
    #[error("embedding failed: {0}")]
    Failed(String),
}

/// A text embedding function with a fixed output dimension.
pub trait Embedder: Send + Sync {
    /// Embed a single text into a fixed-dimension vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Output dimension.
    fn dimension(&self) -> usize;

    /// Stable identifier persisted with the index, used to reject loading an
    /// index built with a different embedding function.
    fn id(&self) -> String;
}

/// Deterministic feature-hashing embedder.
///
/// Hashes lowercased alphanumeric token unigrams and bigrams into a
/// fixed-dimension vector with seahash, alternating sign by hash bit, then
/// L2-normalizes. No model weights, fully reproducible across processes,
/// which makes it the reference implementation for tests and offline use;
/// a learned model plugs in behind the same trait.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl HashEmbedder {
    /// Create an embedder with the given output dimension.
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "embedding dimension must be non-zero");
        Self { dimension }
    }

    fn tokens(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn bump(&self, vector: &mut [f32], feature: &str) {
        let hash = seahash::hash(feature.as_bytes());
        let slot = (hash % self.dimension as u64) as usize;
        // One hash bit decides the sign so unrelated features cancel rather
        // than accumulate.
        let sign = if hash & (1 << 63) == 0 { 1.0 } else { -1.0 };
        vector[slot] += sign;
    }
}

impl fmt::Display for HashEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "hash-v1/{}", self.dimension)
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; self.dimension];
        let tokens = Self::tokens(text);

        for token in &tokens {
            self.bump(&mut vector, token);
        }
        for pair in tokens.windows(2) {
            self.bump(&mut vector, &format!("{} {}", pair[0], pair[1]));
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 1e-8 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn id(&self) -> String {
        self.to_string()
    }
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 on length mismatch or when either norm is near zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a < 1e-8 || norm_b < 1e-8 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_is_deterministic() {
        let embedder = HashEmbedder::new(64);
        let a = embedder.embed("SCATSAT-1 wind vectors").unwrap();
        let b = embedder.embed("SCATSAT-1 wind vectors").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn embedding_has_declared_dimension_and_unit_norm() {
        let embedder = HashEmbedder::new(128);
        let v = embedder.embed("ocean surface current").unwrap();
        assert_eq!(v.len(), 128);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn empty_text_embeds_to_zero_vector() {
        let embedder = HashEmbedder::new(32);
        let v = embedder.embed("").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn similar_texts_score_higher_than_unrelated() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed("rainfall data download").unwrap();
        let near = embedder.embed("download rainfall data products").unwrap();
        let far = embedder.embed("spacecraft attitude control thruster").unwrap();
        assert!(cosine_similarity(&query, &near) > cosine_similarity(&query, &far));
    }

    #[test]
    fn embedder_id_encodes_dimension() {
        assert_eq!(HashEmbedder::new(384).id(), "hash-v1/384");
    }

    #[test]
    fn cosine_similarity_basics() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 1e-5);

        // Length mismatch and zero vectors are defined as 0.0.
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }
}

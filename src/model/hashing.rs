//! Local feature-hashing embedding model
//!
//! Each lowercase word token and each of its padded character trigrams is
//! hashed with FNV-1a into one of `ndims` buckets, with the sign taken from the
//! top hash bit. The vector is L2-normalized, so cosine similarity reflects
//! shared vocabulary and spelling overlap. No network access, no randomness.

use crate::model::embedding::l2_normalize;
use crate::scorer::tokenize;
use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};

/// Default vector size
pub const DEFAULT_DIMENSIONS: usize = 384;

const TRIGRAM_WEIGHT: f64 = 0.5;

/// Deterministic embedding model based on the hashing trick
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    ndims: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl HashingEmbedder {
    /// Create a model producing `ndims`-dimensional vectors
    pub fn new(ndims: usize) -> Self {
        Self {
            ndims: ndims.max(1),
        }
    }

    /// Embed a single text
    pub fn embed(&self, text: &str) -> Vec<f64> {
        let mut vec = vec![0.0; self.ndims];
        for token in tokenize(text) {
            self.add(&mut vec, token.as_bytes(), 1.0);

            let padded: Vec<char> = format!("<{}>", token).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.add(&mut vec, trigram.as_bytes(), TRIGRAM_WEIGHT);
            }
        }
        l2_normalize(&mut vec);
        vec
    }

    fn add(&self, vec: &mut [f64], feature: &[u8], weight: f64) {
        let hash = fnv1a(feature);
        let bucket = (hash % self.ndims as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vec[bucket] += sign * weight;
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(*byte)).wrapping_mul(PRIME))
}

impl EmbeddingModel for HashingEmbedder {
    const MAX_DOCUMENTS: usize = 1024;

    fn ndims(&self) -> usize {
        self.ndims
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let texts: Vec<String> = texts.into_iter().collect();
        Ok(texts
            .into_iter()
            .map(|document| Embedding {
                vec: self.embed(&document),
                document,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cosine_similarity;

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(fnv1a(b""), 0xcbf29ce484222325);
        assert_eq!(fnv1a(b"a"), 0xaf63dc4c8601ec8c);
    }

    #[test]
    fn test_embed_is_deterministic_and_normalized() {
        let model = HashingEmbedder::default();
        let a = model.embed("Rust web crawler");
        let b = model.embed("Rust web crawler");

        assert_eq!(a, b);
        assert_eq!(a.len(), DEFAULT_DIMENSIONS);
        let norm: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_similar_texts_score_higher() {
        let model = HashingEmbedder::default();
        let query = model.embed("rust crawler");
        let close = model.embed("a fast crawler written in rust");
        let far = model.embed("tomato gardening advice for beginners");

        assert!(cosine_similarity(&query, &close) > cosine_similarity(&query, &far));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let model = HashingEmbedder::new(8);
        assert_eq!(model.embed("  "), vec![0.0; 8]);
    }

    #[tokio::test]
    async fn test_embed_texts() {
        let model = HashingEmbedder::default();
        let embeddings = model
            .embed_texts(vec!["one text".to_string(), "another".to_string()])
            .await
            .unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].document, "one text");
        assert_eq!(embeddings[1].vec.len(), model.ndims());
    }
}

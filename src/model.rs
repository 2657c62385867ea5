//! # Embedding Model Module
//!
//! Embedding models used by relevance scoring, all implementing rig's
//! `EmbeddingModel` trait so the scorer can work with any of them.
//!
//! ## Key Components
//!
//! - `HashingEmbedder`: local, deterministic feature-hashing model used by
//!   default and in tests
//! - `RateLimitedEmbeddingModel`: a wrapper that adds rate limiting to any
//!   embedding model
//! - `gemini_embedding_from_env`: rate-limited Gemini embeddings when
//!   `GEMINI_API_KEY` is set
//! - `cosine_similarity`: vector comparison shared by the scorer

use std::num::NonZeroU32;

use governor::{Quota, RateLimiter};
use rig::providers::gemini;
use tracing::info;

pub mod embedding;
pub mod hashing;
pub mod ratelimited_embedding;

pub use embedding::cosine_similarity;
pub use hashing::HashingEmbedder;
pub use ratelimited_embedding::RateLimitedEmbeddingModel;

/// Gemini embedding model behind a per-minute rate limit
pub type GeminiEmbeddingModel = RateLimitedEmbeddingModel<gemini::embedding::EmbeddingModel>;

/// Requests per minute allowed against the Gemini embedding endpoint
const GEMINI_EMBEDDINGS_PER_MINUTE: u32 = 1000;

/// Build a rate-limited Gemini embedding model if `GEMINI_API_KEY` is set
pub fn gemini_embedding_from_env() -> Option<GeminiEmbeddingModel> {
    let api_key = std::env::var("GEMINI_API_KEY").ok()?;
    if api_key.trim().is_empty() {
        return None;
    }

    let client = gemini::Client::new(&api_key);
    Some(new_gemini_embedding(&client))
}

/// Wrap the Gemini `text-embedding-004` model of `client` in a rate limiter
pub fn new_gemini_embedding(client: &gemini::Client) -> GeminiEmbeddingModel {
    let quota = NonZeroU32::new(GEMINI_EMBEDDINGS_PER_MINUTE).unwrap_or(NonZeroU32::MIN);
    let limiter = RateLimiter::direct(Quota::per_minute(quota));
    info!("Using Gemini embeddings ({})", gemini::embedding::EMBEDDING_004);
    RateLimitedEmbeddingModel::new(
        client.embedding_model(gemini::embedding::EMBEDDING_004),
        limiter,
    )
}

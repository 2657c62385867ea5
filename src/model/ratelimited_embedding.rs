use std::sync::Arc;

use governor::DefaultDirectRateLimiter;
use rig::embeddings::{Embedding, EmbeddingError, EmbeddingModel};
use tracing::{Instrument, debug_span, info_span};

/// Embedding model that waits for a rate limiter before every request
#[derive(Clone)]
pub struct RateLimitedEmbeddingModel<M: EmbeddingModel> {
    model: M,
    limiter: Arc<DefaultDirectRateLimiter>,
}

impl<M> RateLimitedEmbeddingModel<M>
where
    M: EmbeddingModel,
{
    pub fn new(model: M, limiter: DefaultDirectRateLimiter) -> Self {
        Self {
            model,
            limiter: Arc::new(limiter),
        }
    }

    /// The wrapped model
    pub fn inner(&self) -> &M {
        &self.model
    }
}

impl<M: EmbeddingModel> EmbeddingModel for RateLimitedEmbeddingModel<M> {
    const MAX_DOCUMENTS: usize = M::MAX_DOCUMENTS;

    fn ndims(&self) -> usize {
        self.model.ndims()
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let texts: Vec<String> = texts.into_iter().collect();
        let mut embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(M::MAX_DOCUMENTS.max(1)) {
            self.limiter
                .until_ready()
                .instrument(debug_span!("limiter"))
                .await;
            let batch = self
                .model
                .embed_texts(chunk.to_vec())
                .instrument(info_span!("embed_texts", documents = chunk.len()))
                .await?;
            embeddings.extend(batch);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HashingEmbedder;
    use governor::{Quota, RateLimiter};
    use std::num::NonZeroU32;

    #[tokio::test]
    async fn test_wrapper_delegates() {
        let limiter = RateLimiter::direct(Quota::per_second(NonZeroU32::new(100).unwrap()));
        let model = RateLimitedEmbeddingModel::new(HashingEmbedder::new(16), limiter);

        assert_eq!(model.ndims(), 16);
        let embeddings = model
            .embed_texts(vec!["alpha beta".to_string(), "gamma".to_string()])
            .await
            .unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0].vec, model.inner().embed("alpha beta"));
    }
}

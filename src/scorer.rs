//! # Scorer Module
//!
//! Grades how well an indexed corpus fits a set of target keywords.
//!
//! A scoring run looks at one fixed result set. Three signals are computed
//! from it:
//!
//! - the most important terms, by mean TF-IDF weight
//! - keyword relevance, the mean cosine similarity between the joined
//!   keywords and every result's text under an embedding model
//! - content quality, from title length, snippet length and the relevance the
//!   index reported for each result
//!
//! The composite score weights keyword relevance over content quality and
//! selects one tier of recommendations. The term and similarity steps degrade
//! to empty output on failure; scoring itself never fails.

mod error;
pub mod report;
mod stop_words;
mod tfidf;

pub use error::ScoreError;
pub use report::{render_report, save_analysis};
pub use stop_words::is_stop_word;
pub use tfidf::{TfidfMatrix, tokenize, top_terms};

use crate::index::SearchResult;
use crate::model::cosine_similarity;
use rig::embeddings::EmbeddingModel;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Weight of content quality in the composite score
pub const CONTENT_QUALITY_WEIGHT: f64 = 0.4;
/// Weight of keyword relevance in the composite score
pub const KEYWORD_RELEVANCE_WEIGHT: f64 = 0.6;
/// Title token count at which the title factor saturates
pub const TITLE_TOKEN_CAP: usize = 10;
/// Snippet token count at which the snippet factor saturates
pub const SNIPPET_TOKEN_CAP: usize = 50;
/// Composite scores below this get fundamental guidance
pub const FUNDAMENTAL_THRESHOLD: f64 = 0.3;
/// Composite scores at or above this get maintenance guidance
pub const MAINTENANCE_THRESHOLD: f64 = 0.6;

/// Recommendation attached to an analysis of an empty result set
pub const NO_RESULTS_RECOMMENDATION: &str = "No search results found";

/// Structural suggestions attached to every non-empty analysis
pub const OPTIMIZATION_SUGGESTIONS: [&str; 5] = [
    "Improve the H1-H6 heading structure",
    "Add FAQ sections",
    "Use list formatting",
    "Write paragraphs that answer questions directly",
    "Add statistics and data points",
];

/// Configuration for the relevance scorer
#[derive(Debug, Clone)]
pub struct ScorerConfig {
    /// Vocabulary cap for term statistics
    pub max_features: usize,

    /// Number of top terms kept
    pub top_terms: usize,

    /// Number of most similar results kept
    pub top_content: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            max_features: 100,
            top_terms: 10,
            top_content: 3,
        }
    }
}

impl ScorerConfig {
    /// Create a new builder
    pub fn builder() -> ScorerConfigBuilder {
        ScorerConfigBuilder::default()
    }
}

/// Builder for ScorerConfig
#[derive(Debug, Default)]
pub struct ScorerConfigBuilder {
    config: ScorerConfig,
}

impl ScorerConfigBuilder {
    /// Set the vocabulary cap
    pub fn max_features(mut self, max_features: usize) -> Self {
        self.config.max_features = max_features;
        self
    }

    /// Set the number of top terms
    pub fn top_terms(mut self, top_terms: usize) -> Self {
        self.config.top_terms = top_terms;
        self
    }

    /// Set the number of top performing results
    pub fn top_content(mut self, top_content: usize) -> Self {
        self.config.top_content = top_content;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ScorerConfig {
        self.config
    }
}

/// One of the results most similar to the target keywords
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopContent {
    pub title: String,
    pub similarity_score: f64,
    pub uri: String,
}

/// Outcome of one scoring run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceAnalysis {
    pub total_documents: usize,
    pub content_quality_score: f64,
    pub keyword_relevance_score: f64,
    pub composite_score: f64,
    pub top_terms: Vec<String>,
    pub top_performing_content: Vec<TopContent>,
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub optimization_suggestions: Vec<String>,
}

impl RelevanceAnalysis {
    /// Analysis of an empty result set
    pub fn empty() -> Self {
        Self {
            total_documents: 0,
            content_quality_score: 0.0,
            keyword_relevance_score: 0.0,
            composite_score: 0.0,
            top_terms: Vec::new(),
            top_performing_content: Vec::new(),
            recommendations: vec![NO_RESULTS_RECOMMENDATION.to_string()],
            optimization_suggestions: Vec::new(),
        }
    }

    /// Recommendation tier of the composite score
    pub fn tier(&self) -> RecommendationTier {
        RecommendationTier::from_score(self.composite_score)
    }
}

/// Recommendation set selected by the composite score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationTier {
    /// Below [`FUNDAMENTAL_THRESHOLD`]
    Fundamental,
    /// From [`FUNDAMENTAL_THRESHOLD`] up to [`MAINTENANCE_THRESHOLD`]
    Structural,
    /// At or above [`MAINTENANCE_THRESHOLD`]
    Maintenance,
}

impl RecommendationTier {
    pub fn from_score(score: f64) -> Self {
        if score < FUNDAMENTAL_THRESHOLD {
            Self::Fundamental
        } else if score < MAINTENANCE_THRESHOLD {
            Self::Structural
        } else {
            Self::Maintenance
        }
    }

    pub fn recommendations(self) -> [&'static str; 3] {
        match self {
            Self::Fundamental => [
                "Improve content quality",
                "Add longer and more detailed descriptions",
                "Create content better aligned with the target keywords",
            ],
            Self::Structural => [
                "Optimize page titles",
                "Improve meta descriptions",
                "Add structured data",
            ],
            Self::Maintenance => [
                "Maintain the current quality",
                "Update content regularly",
                "Expand coverage to new keywords",
            ],
        }
    }
}

/// Scores search results against target keywords
#[derive(Debug, Clone)]
pub struct RelevanceScorer<E: EmbeddingModel> {
    embedder: E,
    config: ScorerConfig,
}

impl<E: EmbeddingModel> RelevanceScorer<E> {
    pub fn new(embedder: E, config: ScorerConfig) -> Self {
        Self { embedder, config }
    }

    /// Score `results` against `keywords`
    ///
    /// An empty result set yields [`RelevanceAnalysis::empty`]. Term and
    /// similarity failures are logged and leave their fields empty or zero.
    #[instrument(skip_all, fields(results = results.len(), keywords = keywords.len()))]
    pub async fn score(&self, results: &[SearchResult], keywords: &[String]) -> RelevanceAnalysis {
        if results.is_empty() {
            info!("No search results to score");
            return RelevanceAnalysis::empty();
        }

        let texts: Vec<String> = results
            .iter()
            .map(|r| format!("{} {}", r.snippet, r.title))
            .collect();

        let top_terms = match top_terms(&texts, self.config.max_features, self.config.top_terms) {
            Ok(terms) => terms,
            Err(e) => {
                warn!("Term analysis failed: {}", e);
                Vec::new()
            }
        };

        let (keyword_relevance_score, top_performing_content) =
            match self.similarities(&texts, keywords).await {
                Ok(similarities) => {
                    let mean = similarities.iter().sum::<f64>() / similarities.len() as f64;
                    (
                        unit_interval(mean),
                        self.top_content(results, &similarities),
                    )
                }
                Err(ScoreError::NoKeywords) => {
                    debug!("No keywords given, skipping similarity analysis");
                    (0.0, Vec::new())
                }
                Err(e) => {
                    warn!("Similarity analysis failed: {}", e);
                    (0.0, Vec::new())
                }
            };

        let content_quality_score =
            results.iter().map(content_quality).sum::<f64>() / results.len() as f64;

        let composite_score = unit_interval(
            CONTENT_QUALITY_WEIGHT * content_quality_score
                + KEYWORD_RELEVANCE_WEIGHT * keyword_relevance_score,
        );

        let recommendations = RecommendationTier::from_score(composite_score)
            .recommendations()
            .iter()
            .map(|r| r.to_string())
            .collect();

        info!("Relevance analysis complete. Score: {:.2}", composite_score);

        RelevanceAnalysis {
            total_documents: results.len(),
            content_quality_score,
            keyword_relevance_score,
            composite_score,
            top_terms,
            top_performing_content,
            recommendations,
            optimization_suggestions: OPTIMIZATION_SUGGESTIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Cosine similarity of the joined keywords to every text
    async fn similarities(
        &self,
        texts: &[String],
        keywords: &[String],
    ) -> Result<Vec<f64>, ScoreError> {
        if keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(ScoreError::NoKeywords);
        }

        let mut inputs = Vec::with_capacity(texts.len() + 1);
        inputs.push(keywords.join(" "));
        inputs.extend(texts.iter().cloned());
        let expected = inputs.len();

        let embeddings = self.embedder.embed_texts(inputs).await?;
        if embeddings.len() != expected {
            return Err(ScoreError::MissingEmbeddings {
                expected,
                actual: embeddings.len(),
            });
        }

        let (query, documents) = embeddings.split_at(1);
        Ok(documents
            .iter()
            .map(|d| cosine_similarity(&query[0].vec, &d.vec))
            .map(|similarity| if similarity.is_finite() { similarity } else { 0.0 })
            .collect())
    }

    fn top_content(&self, results: &[SearchResult], similarities: &[f64]) -> Vec<TopContent> {
        let mut order: Vec<usize> = (0..similarities.len()).collect();
        order.sort_by(|&a, &b| similarities[b].total_cmp(&similarities[a]));

        order
            .into_iter()
            .take(self.config.top_content)
            .map(|i| TopContent {
                title: results[i].title.clone(),
                similarity_score: similarities[i],
                uri: results[i].uri.clone(),
            })
            .collect()
    }
}

/// Quality of one result: mean of the title, snippet and relevance factors
pub fn content_quality(result: &SearchResult) -> f64 {
    let title_tokens = result.title.split_whitespace().count().min(TITLE_TOKEN_CAP);
    let snippet_tokens = result
        .snippet
        .split_whitespace()
        .count()
        .min(SNIPPET_TOKEN_CAP);

    let title_score = title_tokens as f64 / TITLE_TOKEN_CAP as f64;
    let snippet_score = snippet_tokens as f64 / SNIPPET_TOKEN_CAP as f64;
    let relevance = unit_interval(result.relevance_score);

    (title_score + snippet_score + relevance) / 3.0
}

/// Clamp to `[0, 1]`, mapping NaN and infinities to 0
fn unit_interval(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

//! Term-importance weighting over a small document set
//!
//! Documents are tokenized into lowercase terms of at least two word
//! characters with English stop words removed. The vocabulary keeps the
//! `max_features` terms with the highest corpus frequency (ties broken
//! alphabetically) and is then ordered alphabetically. Each document row
//! holds raw term counts scaled by the smoothed inverse document frequency
//! `ln((1 + n) / (1 + df)) + 1` and is L2-normalized.

use crate::model::embedding::l2_normalize;
use crate::scorer::error::ScoreError;
use crate::scorer::stop_words::is_stop_word;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?u)\b\w\w+\b").expect("token pattern is valid"));

/// Lowercase word tokens of at least two characters, in text order
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    TOKEN_PATTERN
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

fn analyze(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !is_stop_word(t))
        .collect()
}

/// Fitted TF-IDF weights
#[derive(Debug, Clone)]
pub struct TfidfMatrix {
    /// Vocabulary terms in column order
    pub vocabulary: Vec<String>,
    /// One L2-normalized row per document
    pub rows: Vec<Vec<f64>>,
}

impl TfidfMatrix {
    /// Fit the matrix over `documents`
    pub fn fit<S: AsRef<str>>(documents: &[S], max_features: usize) -> Result<Self, ScoreError> {
        let analyzed: Vec<Vec<String>> = documents.iter().map(|d| analyze(d.as_ref())).collect();

        let mut corpus_counts: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &analyzed {
            for token in tokens {
                *corpus_counts.entry(token.as_str()).or_default() += 1;
            }
        }
        if corpus_counts.is_empty() {
            return Err(ScoreError::EmptyVocabulary);
        }

        // BTreeMap iteration is alphabetical, so the stable sort keeps ties in that order
        let mut ranked: Vec<(&str, usize)> = corpus_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(max_features);

        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(t, _)| t.to_string()).collect();
        vocabulary.sort();
        let columns: HashMap<&str, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.as_str(), i))
            .collect();

        let mut counts = vec![vec![0.0; vocabulary.len()]; analyzed.len()];
        let mut document_frequency = vec![0usize; vocabulary.len()];
        for (row, tokens) in counts.iter_mut().zip(&analyzed) {
            for token in tokens {
                if let Some(&col) = columns.get(token.as_str()) {
                    if row[col] == 0.0 {
                        document_frequency[col] += 1;
                    }
                    row[col] += 1.0;
                }
            }
        }

        let n = analyzed.len() as f64;
        let idf: Vec<f64> = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        for row in &mut counts {
            row.iter_mut().zip(&idf).for_each(|(w, idf)| *w *= idf);
            l2_normalize(row);
        }

        Ok(Self {
            vocabulary,
            rows: counts,
        })
    }

    /// Mean weight of every vocabulary term across documents
    pub fn mean_weights(&self) -> Vec<f64> {
        let n = self.rows.len().max(1) as f64;
        (0..self.vocabulary.len())
            .map(|col| self.rows.iter().map(|row| row[col]).sum::<f64>() / n)
            .collect()
    }
}

/// The `n` terms with the highest mean TF-IDF weight over `texts`
///
/// Ties keep vocabulary (alphabetical) order.
pub fn top_terms<S: AsRef<str>>(
    texts: &[S],
    max_features: usize,
    n: usize,
) -> Result<Vec<String>, ScoreError> {
    let matrix = TfidfMatrix::fit(texts, max_features)?;
    let means = matrix.mean_weights();

    let mut order: Vec<usize> = (0..matrix.vocabulary.len()).collect();
    order.sort_by(|&a, &b| means[b].total_cmp(&means[a]));

    Ok(order
        .into_iter()
        .take(n)
        .map(|i| matrix.vocabulary[i].clone())
        .collect())
}

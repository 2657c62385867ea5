//! In-memory document index over blob-stored JSON Lines batches

use crate::batcher::BatchRecord;
use crate::index::{BlobStore, DocumentIndex, ImportStatus, IndexError, Locator, SearchResult};
use crate::scorer::tokenize;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

/// Number of content words used as a snippet when a record has no description
const SNIPPET_WORDS: usize = 60;

#[derive(Debug)]
struct IndexedDocument {
    record: BatchRecord,
    terms: HashSet<String>,
}

/// Indexed documents in import order, with their positions keyed by URL
#[derive(Debug, Default)]
struct Documents {
    entries: Vec<IndexedDocument>,
    positions: HashMap<String, usize>,
}

impl Documents {
    fn upsert(&mut self, document: IndexedDocument) {
        match self.positions.get(&document.record.url) {
            Some(&i) => self.entries[i] = document,
            None => {
                self.positions
                    .insert(document.record.url.clone(), self.entries.len());
                self.entries.push(document);
            }
        }
    }
}

/// Document index kept in memory, fed from a [`BlobStore`]
///
/// Imports are incremental: a record whose URL is already indexed replaces
/// the previous version. Search relevance is the fraction of distinct query
/// and keyword terms a document contains.
#[derive(Debug)]
pub struct MemoryIndex<B> {
    store: B,
    documents: RwLock<Documents>,
}

impl<B: BlobStore> MemoryIndex<B> {
    /// Create an empty index reading batches from `store`
    pub fn new(store: B) -> Self {
        Self {
            store,
            documents: RwLock::new(Documents::default()),
        }
    }

    /// The blob store backing this index
    pub fn store(&self) -> &B {
        &self.store
    }

    /// Number of indexed documents
    pub async fn len(&self) -> usize {
        self.documents.read().await.entries.len()
    }

    /// Whether the index holds no documents
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.entries.is_empty()
    }
}

impl<B: BlobStore> DocumentIndex for MemoryIndex<B> {
    #[instrument(skip(self), fields(locator = %locator))]
    async fn import(&self, locator: &Locator) -> Result<ImportStatus, IndexError> {
        let bytes = self.store.get(locator).await?;
        let text = String::from_utf8_lossy(&bytes);

        let mut parsed = Vec::new();
        let mut skipped = 0;
        for (line_no, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<BatchRecord>(line) {
                Ok(record) => parsed.push(record),
                Err(e) => {
                    warn!("Skipping line {} of {}: {}", line_no + 1, locator, e);
                    skipped += 1;
                }
            }
        }

        if parsed.is_empty() {
            return Err(IndexError::Import(format!(
                "{} contains no documents",
                locator
            )));
        }

        let imported = parsed.len();
        let mut documents = self.documents.write().await;
        for record in parsed {
            let terms = tokenize(&format!(
                "{} {} {}",
                record.title, record.description, record.content
            ))
            .into_iter()
            .collect();
            documents.upsert(IndexedDocument { record, terms });
        }

        info!("Imported {} documents from {}", imported, locator);
        Ok(ImportStatus {
            locator: locator.clone(),
            documents: imported,
            skipped,
        })
    }

    #[instrument(skip(self))]
    async fn search(
        &self,
        query: &str,
        keywords: &[String],
        limit: usize,
    ) -> Result<Vec<SearchResult>, IndexError> {
        let mut terms = Vec::new();
        for term in tokenize(query)
            .into_iter()
            .chain(keywords.iter().flat_map(|k| tokenize(k)))
        {
            if !terms.contains(&term) {
                terms.push(term);
            }
        }
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let documents = self.documents.read().await;
        let mut hits: Vec<(f64, &IndexedDocument)> = documents
            .entries
            .iter()
            .filter_map(|doc| {
                let matched = terms.iter().filter(|t| doc.terms.contains(*t)).count();
                (matched > 0).then(|| (matched as f64 / terms.len() as f64, doc))
            })
            .collect();
        hits.sort_by(|a, b| b.0.total_cmp(&a.0));
        hits.truncate(limit);

        debug!("{} hits for {:?}", hits.len(), query);
        Ok(hits
            .into_iter()
            .map(|(relevance_score, doc)| SearchResult {
                title: doc.record.title.clone(),
                snippet: snippet(&doc.record),
                relevance_score,
                uri: doc.record.url.clone(),
            })
            .collect())
    }
}

fn snippet(record: &BatchRecord) -> String {
    if !record.description.trim().is_empty() {
        return record.description.clone();
    }
    record
        .content
        .split_whitespace()
        .take(SNIPPET_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::LocalBlobStore;
    use chrono::Utc;
    use std::collections::BTreeSet;
    use tempfile::{TempDir, tempdir};

    fn record(url: &str, title: &str, content: &str) -> BatchRecord {
        BatchRecord {
            url: url.to_string(),
            title: title.to_string(),
            description: String::new(),
            content: content.to_string(),
            headings: Vec::new(),
            links: BTreeSet::new(),
            word_count: content.split_whitespace().count(),
            extracted_at: Utc::now(),
            truncated: false,
        }
    }

    fn jsonl(records: &[BatchRecord]) -> Vec<u8> {
        records
            .iter()
            .map(|r| serde_json::to_string(r).unwrap() + "\n")
            .collect::<String>()
            .into_bytes()
    }

    async fn index_with(records: &[BatchRecord]) -> (TempDir, MemoryIndex<LocalBlobStore>) {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        let locator = store.put("batches/b1.jsonl", jsonl(records)).await.unwrap();
        let index = MemoryIndex::new(store);
        index.import(&locator).await.unwrap();
        (dir, index)
    }

    #[tokio::test]
    async fn test_import_and_search() {
        let (_dir, index) = index_with(&[
            record("https://e.com/a", "Rust crawler", "A crawler written in Rust"),
            record("https://e.com/b", "Gardening", "Tomatoes need sun and water"),
            record("https://e.com/c", "Rust tips", "Ownership and borrowing"),
        ])
        .await;
        assert_eq!(index.len().await, 3);

        let results = index
            .search("rust crawler", &["rust".to_string()], 10)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].uri, "https://e.com/a");
        assert!((results[0].relevance_score - 1.0).abs() < f64::EPSILON);
        assert_eq!(results[1].uri, "https://e.com/c");
        assert!((results[1].relevance_score - 0.5).abs() < f64::EPSILON);
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.relevance_score)));
    }

    #[tokio::test]
    async fn test_search_limit_and_empty_query() {
        let (_dir, index) = index_with(&[
            record("https://e.com/a", "One", "shared term alpha"),
            record("https://e.com/b", "Two", "shared term beta"),
        ])
        .await;

        assert_eq!(index.search("shared", &[], 1).await.unwrap().len(), 1);
        assert!(index.search("", &[], 10).await.unwrap().is_empty());
        assert!(index.search("unrelated", &[], 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reimport_replaces_documents() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        let first = store
            .put("b1.jsonl", jsonl(&[record("https://e.com/a", "Old", "old text")]))
            .await
            .unwrap();
        let second = store
            .put("b2.jsonl", jsonl(&[record("https://e.com/a", "New", "new text")]))
            .await
            .unwrap();

        let index = MemoryIndex::new(store);
        index.import(&first).await.unwrap();
        index.import(&second).await.unwrap();

        assert_eq!(index.len().await, 1);
        let results = index.search("new", &[], 10).await.unwrap();
        assert_eq!(results[0].title, "New");
    }

    #[tokio::test]
    async fn test_reimport_keeps_import_order() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        let first = store
            .put(
                "b1.jsonl",
                jsonl(&[
                    record("https://e.com/a", "Alpha", "shared alpha"),
                    record("https://e.com/b", "Beta", "shared beta"),
                ]),
            )
            .await
            .unwrap();
        let second = store
            .put(
                "b2.jsonl",
                jsonl(&[
                    record("https://e.com/a", "Alpha v2", "shared alpha"),
                    record("https://e.com/c", "Gamma", "shared gamma"),
                ]),
            )
            .await
            .unwrap();

        let index = MemoryIndex::new(store);
        index.import(&first).await.unwrap();
        index.import(&second).await.unwrap();

        assert_eq!(index.len().await, 3);
        let titles: Vec<String> = index
            .search("shared", &[], 10)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["Alpha v2", "Beta", "Gamma"]);
    }

    #[tokio::test]
    async fn test_import_skips_bad_lines() {
        let dir = tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path());
        let mut bytes = jsonl(&[record("https://e.com/a", "Good", "good text")]);
        bytes.extend_from_slice(b"{broken\n");
        let locator = store.put("mixed.jsonl", bytes).await.unwrap();

        let index = MemoryIndex::new(store);
        let status = index.import(&locator).await.unwrap();
        assert_eq!(status.documents, 1);
        assert_eq!(status.skipped, 1);

        let empty = index.store().put("empty.jsonl", Vec::new()).await.unwrap();
        assert!(matches!(
            index.import(&empty).await,
            Err(IndexError::Import(_))
        ));
    }

    #[test]
    fn test_snippet_falls_back_to_content() {
        let mut r = record("https://e.com/a", "T", &"word ".repeat(100));
        assert_eq!(snippet(&r).split_whitespace().count(), SNIPPET_WORDS);
        r.description = "Short description".to_string();
        assert_eq!(snippet(&r), "Short description");
    }
}

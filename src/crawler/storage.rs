//! Persistence of extracted page records
//!
//! A crawl run is stored as one pretty-printed JSON array named
//! `raw_website_data_<timestamp>.json` and is always loaded back as a whole.

use chrono::Utc;
use std::{io, path::Path, path::PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

use super::PageRecord;
use crate::error::Error as CrateError;

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Base path for storage
    pub base_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("data/raw"),
        }
    }
}

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for CrateError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => CrateError::Io(e),
            StorageError::Json(e) => CrateError::Json(e),
            StorageError::NotFound(_) => CrateError::Storage(err.to_string()),
        }
    }
}

type Result<T> = std::result::Result<T, StorageError>;

/// Storage manager for raw page records
#[derive(Debug, Clone, Default)]
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new storage with custom configuration
    pub fn with_config(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Directory the raw files are written to
    pub fn base_path(&self) -> &Path {
        &self.config.base_path
    }

    /// Write `records` as one JSON document, returning the file path
    #[instrument(skip_all, fields(records = records.len()))]
    pub async fn save(&self, records: &[PageRecord]) -> Result<PathBuf> {
        fs::create_dir_all(&self.config.base_path).await?;

        let json = serde_json::to_string_pretty(records)?;
        let stem = format!("raw_website_data_{}", Utc::now().format("%Y%m%d_%H%M%S_%3f"));
        let (path, mut file) = create_unique(&self.config.base_path, &stem, "json").await?;
        file.write_all(json.as_bytes()).await?;
        file.flush().await?;

        info!("Saved {} records to {}", records.len(), path.display());
        Ok(path)
    }

    /// Load a file written by [`Storage::save`]
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<Vec<PageRecord>> {
        load(path).await
    }
}

/// Create `<dir>/<stem>.<ext>`, never replacing an existing file
///
/// When the name is taken, `_001`, `_002`, ... is appended to the stem until
/// a free name is found. Returns the path and the open file.
pub(crate) async fn create_unique(
    dir: &Path,
    stem: &str,
    ext: &str,
) -> io::Result<(PathBuf, fs::File)> {
    let mut attempt = 0u32;
    loop {
        let name = match attempt {
            0 => format!("{}.{}", stem, ext),
            n => format!("{}_{:03}.{}", stem, n, ext),
        };
        let path = dir.join(name);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e),
        }
    }
}

/// Load the records of a raw data file
pub async fn load(path: impl AsRef<Path>) -> Result<Vec<PageRecord>> {
    let path = path.as_ref();
    if !fs::try_exists(path).await? {
        return Err(StorageError::NotFound(path.display().to_string()));
    }

    let json = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::Heading;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn record(url: &str, content: &str) -> PageRecord {
        PageRecord {
            url: url.to_string(),
            title: "Başlık".to_string(),
            description: String::new(),
            content: content.to_string(),
            headings: vec![Heading {
                level: 1,
                text: "Giriş".to_string(),
            }],
            links: BTreeSet::from(["https://example.com/next".to_string()]),
            word_count: content.split_whitespace().count(),
            extracted_at: Utc::now(),
        }
    }

    #[test]
    fn test_default_path() {
        let storage = Storage::new();
        assert_eq!(storage.base_path(), Path::new("data/raw"));
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let storage = Storage::with_config(StorageConfig {
            base_path: dir.path().join("raw"),
        });
        let records = vec![
            record("https://example.com/", "şimdi öğrenme zamanı"),
            record("https://example.com/about", "about us"),
        ];

        let path = storage.save(&records).await.unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("raw_website_data_"));
        assert!(name.ends_with(".json"));

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("şimdi öğrenme"));

        let loaded = storage.load(&path).await.unwrap();
        assert_eq!(loaded, records);
    }

    #[tokio::test]
    async fn test_saves_never_overwrite() {
        let dir = tempdir().unwrap();
        let storage = Storage::with_config(StorageConfig {
            base_path: dir.path().to_path_buf(),
        });
        let first = vec![record("https://example.com/", "first run")];
        let second = vec![record("https://example.com/", "second run")];

        let a = storage.save(&first).await.unwrap();
        let b = storage.save(&second).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(storage.load(&a).await.unwrap(), first);
        assert_eq!(storage.load(&b).await.unwrap(), second);
    }

    #[tokio::test]
    async fn test_create_unique_appends_suffix() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("run.json"), "taken").unwrap();
        std::fs::write(dir.path().join("run_001.json"), "taken").unwrap();

        let (path, _file) = create_unique(dir.path(), "run", "json").await.unwrap();

        assert_eq!(path, dir.path().join("run_002.json"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("run.json")).unwrap(),
            "taken"
        );
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let result = load(dir.path().join("nope.json")).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_load_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(load(&path).await, Err(StorageError::Json(_))));
    }
}

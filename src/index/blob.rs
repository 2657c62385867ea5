//! Directory-backed blob store

use crate::index::{BlobStore, IndexError, Locator};
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, instrument};

/// Blob store keeping every object as a file below a root directory
///
/// Locators are the object paths relative to the root, using `/` separators.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, IndexError> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(IndexError::InvalidPath(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for LocalBlobStore {
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    async fn put(&self, path: &str, bytes: Vec<u8>) -> Result<Locator, IndexError> {
        let locator = self.locate(path);
        let target = self.resolve(locator.as_str())?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, bytes).await?;

        debug!("Stored blob at {}", target.display());
        Ok(locator)
    }

    async fn get(&self, locator: &Locator) -> Result<Vec<u8>, IndexError> {
        let target = self.resolve(locator.as_str())?;
        match fs::read(&target).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(IndexError::NotFound(locator.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, locator: &Locator) -> Result<bool, IndexError> {
        let target = self.resolve(locator.as_str())?;
        Ok(fs::try_exists(target).await?)
    }

    fn locate(&self, path: &str) -> Locator {
        Locator::new(path.trim_start_matches('/'))
    }
}

//! File-backed cache index

use super::{ArtifactCache, CacheEntry};
use crate::error::{KilnError, KilnResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const INDEX_FILE: &str = "index.json";

/// Cache entries serialized as one JSON map inside the cache directory
pub struct FileCache {
    dir: PathBuf,
    index_path: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let index_path = dir.join(INDEX_FILE);
        Self { dir, index_path }
    }

    /// Path of the JSON index file
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// All entries, sorted by key
    pub async fn entries(&self) -> KilnResult<Vec<(String, CacheEntry)>> {
        Ok(self.read_index().await?.into_iter().collect())
    }

    /// Remove the index and every artifact directory it refers to.
    /// Returns the number of entries dropped.
    pub async fn clear(&self) -> KilnResult<usize> {
        let index = self.read_index().await.unwrap_or_else(|e| {
            warn!("Cache index unreadable, clearing anyway: {}", e);
            BTreeMap::new()
        });

        for key in index.keys() {
            let mut parts = key.split(':');
            let (Some(org), Some(repo)) = (parts.next(), parts.next()) else {
                continue;
            };
            let repo_dir = self.dir.join(org).join(repo);
            if repo_dir.exists() {
                debug!("Removing {}", repo_dir.display());
                fs::remove_dir_all(&repo_dir).await.map_err(|e| {
                    KilnError::io(format!("removing {}", repo_dir.display()), e)
                })?;
            }
            // Only succeeds once the organization directory is empty
            let _ = fs::remove_dir(self.dir.join(org)).await;
        }

        if self.index_path.exists() {
            fs::remove_file(&self.index_path).await.map_err(|e| {
                KilnError::io(format!("removing {}", self.index_path.display()), e)
            })?;
        }

        Ok(index.len())
    }

    async fn read_index(&self) -> KilnResult<BTreeMap<String, CacheEntry>> {
        if !self.index_path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.index_path).await.map_err(|e| {
            KilnError::io(format!("reading cache index {}", self.index_path.display()), e)
        })?;

        Ok(serde_json::from_str(&content)?)
    }

    async fn write_index(&self, index: &BTreeMap<String, CacheEntry>) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await?;

        let content = serde_json::to_string_pretty(index)?;
        let tmp = self.index_path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &self.index_path).await
    }
}

#[async_trait]
impl ArtifactCache for FileCache {
    fn dir(&self) -> &Path {
        &self.dir
    }

    async fn get(&self, key: &str) -> Option<CacheEntry> {
        match self.read_index().await {
            Ok(mut index) => index.remove(key),
            Err(e) => {
                warn!("Ignoring unreadable cache index: {}", e);
                None
            }
        }
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> KilnResult<()> {
        let mut index = self.read_index().await.unwrap_or_else(|e| {
            warn!("Replacing unreadable cache index: {}", e);
            BTreeMap::new()
        });

        debug!("Recording {} -> {} ({})", key, entry.location, entry.version);
        index.insert(key.to_string(), entry);

        self.write_index(&index).await.map_err(|e| {
            KilnError::CachePersist(format!(
                "writing cache index {}: {}",
                self.index_path.display(),
                e
            ))
        })
    }
}

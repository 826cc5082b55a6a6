//! Artifact cache
//!
//! Records which artifact was produced for which release tag, keyed per
//! package and variant. An entry is only trusted while its version equals
//! the remote's current tag; any mismatch or absence forces a rebuild.
//!
//! # Keys
//!
//! | Variant | Key |
//! |---------|-----|
//! | plain | `{organization}:{repository}` |
//! | cached | `{organization}:{repository}:cached` |

mod store;

pub use store::FileCache;

use crate::error::KilnResult;
use crate::package::RemotePackage;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Suffix distinguishing the packaged variant's key
const CACHED_SUFFIX: &str = "cached";

/// The artifact built for `version` lives at `location`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Release tag the artifact was built from
    pub version: String,

    /// Path or URI of the artifact
    pub location: String,

    /// When the entry was written
    #[serde(default = "Utc::now")]
    pub recorded_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(version: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            location: location.into(),
            recorded_at: Utc::now(),
        }
    }

    /// Whether this entry is still current for the given release tag
    pub fn is_current(&self, tag: &str) -> bool {
        self.version == tag
    }
}

/// Derive the cache key for a package variant
pub fn cache_key(package: &RemotePackage, cached: bool) -> String {
    let mut key = format!("{}:{}", package.organization(), package.repository());
    if cached {
        key.push(':');
        key.push_str(CACHED_SUFFIX);
    }
    key
}

/// Key-value store of cache entries with an associated base directory
#[async_trait]
pub trait ArtifactCache: Send + Sync {
    /// Base directory under which artifacts are written
    fn dir(&self) -> &Path;

    /// Look up an entry. Lookups never fail; unreadable state reads as absent.
    async fn get(&self, key: &str) -> Option<CacheEntry>;

    /// Create or overwrite the entry for `key`
    async fn set(&self, key: &str, entry: CacheEntry) -> KilnResult<()>;
}

//! Fetch planning
//!
//! Pure decision over a release descriptor and the current cache entry:
//! reuse the cached artifact, or download and possibly build a new one.

use crate::cache::CacheEntry;
use crate::package::RemotePackage;
use crate::release::ReleaseDescriptor;
use std::path::{Path, PathBuf};

/// Artifact extension used for every materialized output
const ARTIFACT_EXT: &str = "tgz";

/// Subdirectory holding the packaged variant
const CACHED_DIR: &str = "cached";

/// Where the bytes of a new artifact come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactSource {
    /// First release asset, used verbatim
    Precompiled,
    /// Source tarball, extracted then packaged
    SourceTarball { cached: bool },
}

/// What to download and produce on a cache miss
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub download_url: String,
    pub output_path: PathBuf,
    pub source: ArtifactSource,
}

impl FetchPlan {
    pub fn requires_extraction(&self) -> bool {
        matches!(self.source, ArtifactSource::SourceTarball { .. })
    }

    pub fn requires_packaging(&self) -> bool {
        matches!(self.source, ArtifactSource::SourceTarball { .. })
    }

    /// Variant flag handed to the packager
    pub fn cached(&self) -> bool {
        matches!(self.source, ArtifactSource::SourceTarball { cached: true })
    }
}

/// Result of planning a fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchDecision {
    /// The cached artifact is current; reuse `location` verbatim
    Hit { location: String },
    /// Work is required
    Miss(FetchPlan),
}

impl FetchDecision {
    pub fn needs_work(&self) -> bool {
        matches!(self, Self::Miss(_))
    }
}

/// Output path for a package variant at `tag`:
/// `{root}/{org}/{repo}/{tag}.tgz` or `{root}/{org}/{repo}/cached/{tag}.tgz`
pub fn artifact_path(root: &Path, package: &RemotePackage, tag: &str, cached: bool) -> PathBuf {
    let mut path = root.join(package.organization()).join(package.repository());
    if cached {
        path.push(CACHED_DIR);
    }
    path.join(format!("{}.{}", tag, ARTIFACT_EXT))
}

/// Decide between reusing `existing` and producing a new artifact
pub fn plan_fetch(
    descriptor: &ReleaseDescriptor,
    existing: Option<&CacheEntry>,
    package: &RemotePackage,
    cached: bool,
    cache_root: &Path,
) -> FetchDecision {
    if let Some(entry) = existing.filter(|e| e.is_current(&descriptor.tag)) {
        return FetchDecision::Hit {
            location: entry.location.clone(),
        };
    }

    let output_path = artifact_path(cache_root, package, &descriptor.tag, cached);

    // A precompiled asset is only usable as-is for the plain variant
    let (download_url, source) = match descriptor.assets.first() {
        Some(asset) if !cached => (asset.download_url.clone(), ArtifactSource::Precompiled),
        _ => (
            descriptor.tarball_url.clone(),
            ArtifactSource::SourceTarball { cached },
        ),
    };

    FetchDecision::Miss(FetchPlan {
        download_url,
        output_path,
        source,
    })
}

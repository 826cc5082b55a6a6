//! Release metadata
//!
//! A `ReleaseDescriptor` is a snapshot of the latest published version of a
//! remote package. It is fetched fresh on every lookup and never cached.

mod github;

pub use github::GithubReleases;

use crate::error::{KilnError, KilnResult};
use crate::package::RemotePackage;
use async_trait::async_trait;
use std::path::{Component, Path};

/// A precompiled file attached to a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseAsset {
    pub download_url: String,
}

/// Latest release of a remote package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseDescriptor {
    /// Release tag, compared by exact string equality only
    pub tag: String,

    /// Precompiled assets in the order the forge lists them
    pub assets: Vec<ReleaseAsset>,

    /// Source archive for the tagged commit
    pub tarball_url: String,
}

impl ReleaseDescriptor {
    /// Reject tags that cannot be used as a single file name component.
    ///
    /// The tag names the artifact file under the cache directory, so it
    /// must not be empty, absolute, or contain `.`/`..`, separators, or NUL.
    pub fn check_tag(&self) -> KilnResult<()> {
        let tag = self.tag.as_str();
        let single_component = matches!(
            Path::new(tag).components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(part)] if part.to_str() == Some(tag)
        );

        if tag.is_empty() || !single_component || tag.contains(['\\', '\0']) {
            return Err(KilnError::Metadata(format!("unsafe release tag '{}'", tag)));
        }
        Ok(())
    }
}

/// Source of release metadata
#[async_trait]
pub trait ReleaseProvider: Send + Sync {
    /// Look up the latest release of `package`
    async fn latest(&self, package: &RemotePackage) -> KilnResult<ReleaseDescriptor>;
}

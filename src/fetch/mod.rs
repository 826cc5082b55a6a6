//! Fetch-or-build orchestration
//!
//! `RemoteFetcher::get` resolves the latest release of a package and either
//! returns the cached artifact for it or produces and records a new one.
//!
//! ```text
//! latest release ──► cache lookup ──► plan ──┬─► HIT: return cached location
//!                                            └─► materialize ──► record ──► BUILT
//! ```

mod materialize;
mod plan;

pub use materialize::ArtifactMaterializer;
pub use plan::{artifact_path, plan_fetch, ArtifactSource, FetchDecision, FetchPlan};

use crate::cache::{cache_key, ArtifactCache, CacheEntry, FileCache};
use crate::config::{Config, ConfigManager};
use crate::error::KilnResult;
use crate::package::RemotePackage;
use crate::packager::{CommandPackager, Packager};
use crate::release::{GithubReleases, ReleaseProvider};
use crate::transport::{HttpTransport, Transport};
use crate::workdir::FileSystem;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// How a fetch concluded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Reused the artifact recorded for the current tag
    Hit,
    /// Produced and recorded a new artifact
    Built,
}

/// Result of a successful fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched {
    pub location: String,
    pub version: String,
    pub outcome: FetchOutcome,
}

/// Fetches release artifacts, reusing cached ones while they are current
pub struct RemoteFetcher {
    cache: Arc<dyn ArtifactCache>,
    releases: Arc<dyn ReleaseProvider>,
    materializer: ArtifactMaterializer,
}

impl RemoteFetcher {
    pub fn new(
        cache: Arc<dyn ArtifactCache>,
        releases: Arc<dyn ReleaseProvider>,
        transport: Arc<dyn Transport>,
        packager: Arc<dyn Packager>,
        file_system: FileSystem,
    ) -> Self {
        Self {
            cache,
            releases,
            materializer: ArtifactMaterializer::new(transport, packager, file_system),
        }
    }

    /// Build the production fetcher from configuration
    pub fn from_config(config: &Config) -> Self {
        let timeout = Duration::from_secs(config.github.timeout_secs);
        let fetcher = Self::new(
            Arc::new(FileCache::new(ConfigManager::cache_dir(config))),
            Arc::new(GithubReleases::new(&config.github)),
            Arc::new(HttpTransport::new(config.github.user_agent.clone(), timeout)),
            Arc::new(CommandPackager::new(&config.packager)),
            FileSystem::temp(),
        );
        fetcher.with_workdir(
            config.workdir.base.clone().unwrap_or_default(),
            config.workdir.prefix.clone(),
        )
    }

    /// Place source-build working directories under `base` with `prefix`
    pub fn with_workdir(
        mut self,
        base: impl Into<std::path::PathBuf>,
        prefix: impl Into<String>,
    ) -> Self {
        self.materializer = self.materializer.with_workdir(base, prefix);
        self
    }

    /// Return the location of the artifact for the latest release of `package`
    pub async fn get(&self, package: &RemotePackage, want_cached: bool) -> KilnResult<String> {
        self.fetch(package, want_cached).await.map(|f| f.location)
    }

    /// Like [`get`](Self::get), also reporting the release tag and outcome
    pub async fn fetch(&self, package: &RemotePackage, want_cached: bool) -> KilnResult<Fetched> {
        let release = self.releases.latest(package).await?;
        release.check_tag()?;
        debug!("Latest release of {} is {}", package, release.tag);

        let key = cache_key(package, want_cached);
        let existing = self.cache.get(&key).await;

        let plan = match plan_fetch(
            &release,
            existing.as_ref(),
            package,
            want_cached,
            self.cache.dir(),
        ) {
            FetchDecision::Hit { location } => {
                info!("HIT {} {} -> {}", key, release.tag, location);
                return Ok(Fetched {
                    location,
                    version: release.tag,
                    outcome: FetchOutcome::Hit,
                });
            }
            FetchDecision::Miss(plan) => plan,
        };

        match &existing {
            Some(entry) => debug!(
                "Cached {} is {}, remote is {}",
                key, entry.version, release.tag
            ),
            None => debug!("No cache entry for {}", key),
        }
        debug!("Source for {}: {:?} from {}", key, plan.source, plan.download_url);

        let location = self.materializer.materialize(&plan, &release.tag).await?;

        self.cache
            .set(&key, CacheEntry::new(release.tag.clone(), location.clone()))
            .await?;

        info!("BUILT {} {} -> {}", key, release.tag, location);
        Ok(Fetched {
            location,
            version: release.tag,
            outcome: FetchOutcome::Built,
        })
    }
}

//! GitHub releases API client

use super::{ReleaseAsset, ReleaseDescriptor, ReleaseProvider};
use crate::config::schema::GithubConfig;
use crate::error::{KilnError, KilnResult};
use crate::package::RemotePackage;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Wire shape of `GET /repos/{owner}/{repo}/releases/latest`
#[derive(Debug, Deserialize)]
struct GithubRelease {
    tag_name: String,
    #[serde(default)]
    assets: Vec<GithubAsset>,
    #[serde(default)]
    tarball_url: String,
}

#[derive(Debug, Deserialize)]
struct GithubAsset {
    browser_download_url: String,
}

impl From<GithubRelease> for ReleaseDescriptor {
    fn from(release: GithubRelease) -> Self {
        Self {
            tag: release.tag_name,
            assets: release
                .assets
                .into_iter()
                .map(|a| ReleaseAsset {
                    download_url: a.browser_download_url,
                })
                .collect(),
            tarball_url: release.tarball_url,
        }
    }
}

/// Release provider backed by the GitHub REST API (unauthenticated)
pub struct GithubReleases {
    agent: ureq::Agent,
    api_url: String,
    user_agent: String,
}

impl GithubReleases {
    pub fn new(config: &GithubConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();

        Self {
            agent,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn latest_url(&self, package: &RemotePackage) -> String {
        format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_url,
            package.organization(),
            package.repository()
        )
    }
}

#[async_trait]
impl ReleaseProvider for GithubReleases {
    async fn latest(&self, package: &RemotePackage) -> KilnResult<ReleaseDescriptor> {
        let url = self.latest_url(package);
        debug!("Fetching release metadata from {}", url);

        let agent = self.agent.clone();
        let user_agent = self.user_agent.clone();
        let body = tokio::task::spawn_blocking(move || -> Result<String, ureq::Error> {
            let mut response = agent
                .get(&url)
                .header("Accept", "application/vnd.github+json")
                .header("User-Agent", user_agent.as_str())
                .call()?;
            response.body_mut().read_to_string()
        })
        .await
        .map_err(|e| KilnError::Metadata(format!("release lookup task failed: {}", e)))?
        .map_err(|e| {
            KilnError::Metadata(format!("fetching latest release of {}: {}", package, e))
        })?;

        let descriptor = parse_release(&body).map_err(|e| {
            KilnError::Metadata(format!("decoding release of {}: {}", package, e))
        })?;

        debug!(
            "Latest release of {} is {} ({} asset(s))",
            package,
            descriptor.tag,
            descriptor.assets.len()
        );
        Ok(descriptor)
    }
}

fn parse_release(body: &str) -> serde_json::Result<ReleaseDescriptor> {
    serde_json::from_str::<GithubRelease>(body).map(ReleaseDescriptor::from)
}

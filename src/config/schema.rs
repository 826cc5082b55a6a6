//! Configuration schema for kiln
//!
//! Configuration is stored at `~/.config/kiln/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Artifact cache settings
    pub cache: CacheConfig,

    /// Release metadata source
    pub github: GithubConfig,

    /// External packaging tool
    pub packager: PackagerConfig,

    /// Scratch directories for source builds
    pub workdir: WorkdirConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root (defaults to the platform cache dir)
    pub dir: Option<PathBuf>,
}

/// GitHub API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    /// API base URL (for GitHub Enterprise: https://host/api/v3)
    pub api_url: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Overall request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            user_agent: concat!("kiln/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 300,
        }
    }
}

/// Packager settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagerConfig {
    /// Program invoked as `{program} pack ...`
    pub program: String,

    /// Flag appended when building the cached variant
    pub offline_flag: String,
}

impl Default for PackagerConfig {
    fn default() -> Self {
        Self {
            program: "jam".to_string(),
            offline_flag: "--offline".to_string(),
        }
    }
}

/// Working directory settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkdirConfig {
    /// Parent for scratch directories (defaults to the system temp dir)
    pub base: Option<PathBuf>,

    /// Name prefix for scratch directories
    pub prefix: String,
}

impl Default for WorkdirConfig {
    fn default() -> Self {
        Self {
            base: None,
            prefix: "kiln-build-".to_string(),
        }
    }
}

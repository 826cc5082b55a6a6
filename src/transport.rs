//! Byte-stream transport for release artifacts

use crate::error::{KilnError, KilnResult};
use async_trait::async_trait;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncRead;
use tracing::debug;

/// A readable stream of downloaded bytes
pub type ByteStream = Box<dyn AsyncRead + Send + Unpin>;

/// Fetches the resource at a URI
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open `uri`. `root` resolves relative paths and may be empty.
    async fn open(&self, root: &str, uri: &str) -> KilnResult<ByteStream>;
}

/// Transport for `http(s)://` and `file://` URIs
pub struct HttpTransport {
    agent: ureq::Agent,
    user_agent: String,
}

impl HttpTransport {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Self {
            agent,
            user_agent: user_agent.into(),
        }
    }

    async fn download(&self, uri: &str) -> KilnResult<ByteStream> {
        let agent = self.agent.clone();
        let user_agent = self.user_agent.clone();
        let url = uri.to_string();

        let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, String> {
            let response = agent
                .get(&url)
                .header("User-Agent", user_agent.as_str())
                .call()
                .map_err(|e| e.to_string())?;

            let mut bytes = Vec::new();
            response
                .into_body()
                .into_reader()
                .read_to_end(&mut bytes)
                .map_err(|e| e.to_string())?;
            Ok(bytes)
        })
        .await
        .map_err(|e| KilnError::Download(format!("download task failed: {}", e)))?
        .map_err(|e| KilnError::Download(format!("downloading {}: {}", uri, e)))?;

        debug!("Downloaded {} bytes from {}", bytes.len(), uri);
        Ok(Box::new(Cursor::new(bytes)))
    }

    async fn open_file(path: &Path) -> KilnResult<ByteStream> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| KilnError::Download(format!("opening {}: {}", path.display(), e)))?;
        Ok(Box::new(file))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(&self, root: &str, uri: &str) -> KilnResult<ByteStream> {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            return self.download(uri).await;
        }

        let path = local_path(root, uri);
        debug!("Reading {} from local filesystem", path.display());
        Self::open_file(&path).await
    }
}

/// Resolve a `file://` URI or bare path against `root`
fn local_path(root: &str, uri: &str) -> PathBuf {
    let path = Path::new(uri.strip_prefix("file://").unwrap_or(uri));
    if path.is_relative() && !root.is_empty() {
        Path::new(root).join(path)
    } else {
        path.to_path_buf()
    }
}

//! Artifact materialization
//!
//! Executes a `FetchPlan`: download, then either write the bytes verbatim or
//! extract them into a fresh working directory and run the packager.

use super::plan::FetchPlan;
use crate::archive;
use crate::error::{KilnError, KilnResult};
use crate::packager::Packager;
use crate::transport::{ByteStream, Transport};
use crate::workdir::FileSystem;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, info};

/// Source tarballs wrap the tree in a single top-level directory
const TARBALL_STRIP_COMPONENTS: usize = 1;

const DEFAULT_WORKDIR_PREFIX: &str = "kiln-build-";

/// Turns fetch plans into artifacts on disk
pub struct ArtifactMaterializer {
    transport: Arc<dyn Transport>,
    packager: Arc<dyn Packager>,
    file_system: FileSystem,
    workdir_base: PathBuf,
    workdir_prefix: String,
}

impl ArtifactMaterializer {
    pub fn new(
        transport: Arc<dyn Transport>,
        packager: Arc<dyn Packager>,
        file_system: FileSystem,
    ) -> Self {
        Self {
            transport,
            packager,
            file_system,
            workdir_base: PathBuf::new(),
            workdir_prefix: DEFAULT_WORKDIR_PREFIX.to_string(),
        }
    }

    /// Place working directories under `base` with the given name prefix
    pub fn with_workdir(mut self, base: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        self.workdir_base = base.into();
        self.workdir_prefix = prefix.into();
        self
    }

    /// Produce the artifact described by `plan` and return its location
    pub async fn materialize(&self, plan: &FetchPlan, version: &str) -> KilnResult<String> {
        debug!("Downloading {}", plan.download_url);
        let mut stream = self.transport.open("", &plan.download_url).await?;

        if !plan.requires_extraction() {
            write_verbatim(&mut stream, &plan.output_path).await?;
            info!("Saved {} to {}", plan.download_url, plan.output_path.display());
            return Ok(location(&plan.output_path));
        }

        let work_dir = self
            .file_system
            .make_working_dir(&self.workdir_base, &self.workdir_prefix)
            .map_err(KilnError::WorkDir)?;
        debug!("Extracting {} into {}", plan.download_url, work_dir.display());

        extract(stream, &work_dir).await?;

        ensure_parent(&plan.output_path).await?;
        self.packager
            .execute(&work_dir, &plan.output_path, version, plan.cached())
            .await?;

        Ok(location(&plan.output_path))
    }
}

async fn ensure_parent(path: &Path) -> KilnResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| KilnError::io(format!("creating directory {}", parent.display()), e))?;
    }
    Ok(())
}

async fn write_verbatim(stream: &mut ByteStream, output: &Path) -> KilnResult<()> {
    ensure_parent(output).await?;

    let context = || format!("writing artifact to {}", output.display());
    let mut file = fs::File::create(output)
        .await
        .map_err(|e| KilnError::io(context(), e))?;
    tokio::io::copy(stream, &mut file)
        .await
        .map_err(|e| KilnError::io(context(), e))?;
    file.flush().await.map_err(|e| KilnError::io(context(), e))
}

async fn extract(mut stream: ByteStream, work_dir: &Path) -> KilnResult<()> {
    let mut bytes = Vec::new();
    stream
        .read_to_end(&mut bytes)
        .await
        .map_err(|e| KilnError::Download(format!("reading source tarball: {}", e)))?;

    let dest = work_dir.to_path_buf();
    tokio::task::spawn_blocking(move || {
        archive::unpack_tar_gz(Cursor::new(bytes), &dest, TARBALL_STRIP_COMPONENTS)
    })
    .await
    .map_err(|e| KilnError::io("extraction task failed", std::io::Error::other(e)))??;

    Ok(())
}

fn location(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

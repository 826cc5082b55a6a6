//! Scratch directories for source builds

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type MakeDir = dyn Fn(&Path, &str) -> io::Result<PathBuf> + Send + Sync;

/// Factory for freshly created, uniquely named working directories.
///
/// Directories are handed over to the caller and never removed here.
#[derive(Clone)]
pub struct FileSystem {
    make_dir: Arc<MakeDir>,
}

impl FileSystem {
    /// Wrap a directory factory taking `(base, prefix)`
    pub fn new<F>(make_dir: F) -> Self
    where
        F: Fn(&Path, &str) -> io::Result<PathBuf> + Send + Sync + 'static,
    {
        Self {
            make_dir: Arc::new(make_dir),
        }
    }

    /// Directories under `base` (or the system temp dir when `base` is empty)
    pub fn temp() -> Self {
        Self::new(|base, prefix| {
            let base = if base.as_os_str().is_empty() {
                std::env::temp_dir()
            } else {
                base.to_path_buf()
            };
            std::fs::create_dir_all(&base)?;
            let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(&base)?;
            Ok(dir.keep())
        })
    }

    pub fn make_working_dir(&self, base: &Path, prefix: &str) -> io::Result<PathBuf> {
        (self.make_dir)(base, prefix)
    }
}

impl Default for FileSystem {
    fn default() -> Self {
        Self::temp()
    }
}

impl std::fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystem").finish_non_exhaustive()
    }
}

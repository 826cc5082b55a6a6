//! In-memory collaborators for driving `RemoteFetcher` without a network

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use kiln::cache::{ArtifactCache, CacheEntry};
use kiln::packager::Packager;
use kiln::release::{ReleaseAsset, ReleaseDescriptor, ReleaseProvider};
use kiln::transport::{ByteStream, Transport};
use kiln::workdir::FileSystem;
use kiln::{KilnError, KilnResult, RemoteFetcher, RemotePackage};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub fn release(tag: &str, assets: &[&str], tarball_url: &str) -> ReleaseDescriptor {
    ReleaseDescriptor {
        tag: tag.to_string(),
        assets: assets
            .iter()
            .map(|url| ReleaseAsset {
                download_url: url.to_string(),
            })
            .collect(),
        tarball_url: tarball_url.to_string(),
    }
}

/// Gzip `bytes` without any tar framing
pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    use std::io::Write;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// Gzipped tar of `(path, contents)` files; a trailing `/` marks a directory
pub fn tar_gz(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, contents) in entries {
        let mut header = tar::Header::new_gnu();
        if path.ends_with('/') {
            header.set_entry_type(tar::EntryType::Directory);
            header.set_size(0);
        } else {
            header.set_size(contents.len() as u64);
        }
        header.set_mode(0o755);
        header.set_cksum();
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

#[derive(Default)]
pub struct FakeReleases {
    pub release: Mutex<Option<ReleaseDescriptor>>,
    pub error: Mutex<Option<String>>,
    pub calls: Mutex<Vec<RemotePackage>>,
}

#[async_trait]
impl ReleaseProvider for FakeReleases {
    async fn latest(&self, package: &RemotePackage) -> KilnResult<ReleaseDescriptor> {
        self.calls.lock().unwrap().push(package.clone());
        if let Some(msg) = self.error.lock().unwrap().clone() {
            return Err(KilnError::Metadata(msg));
        }
        Ok(self
            .release
            .lock()
            .unwrap()
            .clone()
            .expect("release configured"))
    }
}

#[derive(Default)]
pub struct FakeTransport {
    pub body: Mutex<Vec<u8>>,
    pub error: Mutex<Option<String>>,
    pub calls: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Transport for FakeTransport {
    async fn open(&self, root: &str, uri: &str) -> KilnResult<ByteStream> {
        self.calls
            .lock()
            .unwrap()
            .push((root.to_string(), uri.to_string()));
        if let Some(msg) = self.error.lock().unwrap().clone() {
            return Err(KilnError::Download(msg));
        }
        Ok(Box::new(Cursor::new(self.body.lock().unwrap().clone())))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagerCall {
    pub buildpack_dir: PathBuf,
    pub output: PathBuf,
    pub version: String,
    pub cached: bool,
}

#[derive(Default)]
pub struct FakePackager {
    pub error: Mutex<Option<String>>,
    pub calls: Mutex<Vec<PackagerCall>>,
    /// Contents of `some-file` in the working dir at the time of the call
    pub seen_file: Mutex<Option<String>>,
}

#[async_trait]
impl Packager for FakePackager {
    async fn execute(
        &self,
        buildpack_dir: &Path,
        output: &Path,
        version: &str,
        cached: bool,
    ) -> KilnResult<()> {
        self.calls.lock().unwrap().push(PackagerCall {
            buildpack_dir: buildpack_dir.to_path_buf(),
            output: output.to_path_buf(),
            version: version.to_string(),
            cached,
        });
        *self.seen_file.lock().unwrap() =
            std::fs::read_to_string(buildpack_dir.join("some-file")).ok();
        if let Some(msg) = self.error.lock().unwrap().clone() {
            return Err(KilnError::Packaging(msg));
        }
        Ok(())
    }
}

pub struct MemoryCache {
    pub dir: PathBuf,
    pub entries: Mutex<HashMap<String, CacheEntry>>,
    pub get_calls: Mutex<Vec<String>>,
    pub set_calls: Mutex<Vec<(String, CacheEntry)>>,
    pub set_error: Mutex<Option<String>>,
}

impl MemoryCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            entries: Mutex::new(HashMap::new()),
            get_calls: Mutex::new(Vec::new()),
            set_calls: Mutex::new(Vec::new()),
            set_error: Mutex::new(None),
        }
    }

    pub fn insert(&self, key: &str, entry: CacheEntry) {
        self.entries.lock().unwrap().insert(key.to_string(), entry);
    }
}

#[async_trait]
impl ArtifactCache for MemoryCache {
    fn dir(&self) -> &Path {
        &self.dir
    }

    async fn get(&self, key: &str) -> Option<CacheEntry> {
        self.get_calls.lock().unwrap().push(key.to_string());
        self.entries.lock().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, entry: CacheEntry) -> KilnResult<()> {
        self.set_calls
            .lock()
            .unwrap()
            .push((key.to_string(), entry.clone()));
        if let Some(msg) = self.set_error.lock().unwrap().clone() {
            return Err(KilnError::CachePersist(msg));
        }
        self.entries.lock().unwrap().insert(key.to_string(), entry);
        Ok(())
    }
}

/// A fetcher wired to fakes, with a fixed working directory
pub struct Harness {
    pub temp: TempDir,
    pub cache_dir: PathBuf,
    pub download_dir: PathBuf,
    pub releases: Arc<FakeReleases>,
    pub transport: Arc<FakeTransport>,
    pub packager: Arc<FakePackager>,
    pub cache: Arc<MemoryCache>,
}

impl Harness {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let cache_dir = temp.path().join("cache");
        let download_dir = temp.path().join("download");
        std::fs::create_dir_all(&cache_dir).unwrap();
        std::fs::create_dir_all(&download_dir).unwrap();

        let releases = Arc::new(FakeReleases::default());
        *releases.release.lock().unwrap() = Some(release(
            "some-tag",
            &["some-browser-download-url"],
            "some-tarball-url",
        ));

        let transport = Arc::new(FakeTransport::default());
        *transport.body.lock().unwrap() = tar_gz(&[("some-file", "some content")]);

        Self {
            cache: Arc::new(MemoryCache::new(&cache_dir)),
            temp,
            cache_dir,
            download_dir,
            releases,
            transport,
            packager: Arc::new(FakePackager::default()),
        }
    }

    pub fn set_release(&self, release: ReleaseDescriptor) {
        *self.releases.release.lock().unwrap() = Some(release);
    }

    pub fn set_body(&self, body: Vec<u8>) {
        *self.transport.body.lock().unwrap() = body;
    }

    pub fn fetcher(&self) -> RemoteFetcher {
        let download_dir = self.download_dir.clone();
        self.fetcher_with(FileSystem::new(move |_, _| Ok(download_dir.clone())))
    }

    pub fn fetcher_with(&self, file_system: FileSystem) -> RemoteFetcher {
        RemoteFetcher::new(
            self.cache.clone(),
            self.releases.clone(),
            self.transport.clone(),
            self.packager.clone(),
            file_system,
        )
    }

    pub fn artifact(&self, cached: bool, tag: &str) -> PathBuf {
        let mut path = self.cache_dir.join("some-org").join("some-repo");
        if cached {
            path.push("cached");
        }
        path.join(format!("{}.tgz", tag))
    }

    pub fn transport_calls(&self) -> Vec<(String, String)> {
        self.transport.calls.lock().unwrap().clone()
    }

    pub fn packager_calls(&self) -> Vec<PackagerCall> {
        self.packager.calls.lock().unwrap().clone()
    }

    pub fn set_count(&self) -> usize {
        self.cache.set_calls.lock().unwrap().len()
    }
}

pub fn package() -> RemotePackage {
    RemotePackage::new("some-org", "some-repo")
}

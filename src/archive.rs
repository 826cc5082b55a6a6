//! Tar+gzip extraction for source tarballs
//!
//! Extraction is confined to the destination directory: entry paths and
//! link targets are resolved inside it, and nothing is written through a
//! symlink that leads elsewhere.

use crate::error::{KilnError, KilnResult};
use flate2::read::GzDecoder;
use std::fs;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tar::EntryType;
use tracing::debug;

const GZIP_READER: &str = "failed to create gzip reader";
const UNSAFE_PATH: &str = "unsafe tar entry path";

/// Extract a gzip-compressed tar stream into `dest`.
///
/// The first `strip_components` path components of every entry are dropped;
/// entries left with no path are skipped. Hardlink names are stripped the
/// same way. Symlinks must point inside `dest`. Modes recorded in the archive
/// are preserved. Returns the number of entries written.
pub fn unpack_tar_gz<R: Read>(
    reader: R,
    dest: &Path,
    strip_components: usize,
) -> KilnResult<usize> {
    let decoder = GzDecoder::new(reader);
    if decoder.header().is_none() {
        return Err(KilnError::decompression(
            GZIP_READER,
            io::Error::new(io::ErrorKind::InvalidData, "invalid gzip header"),
        ));
    }

    fs::create_dir_all(dest)
        .map_err(|e| KilnError::decompression("failed to create directory", e))?;
    let root = fs::canonicalize(dest)
        .map_err(|e| KilnError::decompression("failed to create directory", e))?;

    let mut archive = tar::Archive::new(decoder);
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);

    let entries = archive
        .entries()
        .map_err(|e| KilnError::decompression("failed to read tar archive", e))?;

    let mut unpacked = 0;
    for entry in entries {
        let mut entry =
            entry.map_err(|e| KilnError::decompression("failed to read tar entry", e))?;
        let entry_type = entry.header().entry_type();

        if entry_type.is_pax_global_extensions() {
            continue;
        }

        let path = entry
            .path()
            .map_err(|e| KilnError::decompression("invalid tar entry path", e))?
            .into_owned();

        let Some(relative) = strip_path(&path, strip_components)
            .map_err(|e| KilnError::decompression(UNSAFE_PATH, e))?
        else {
            continue;
        };

        let target = root.join(&relative);
        let parent = target.parent().unwrap_or(root.as_path());

        // A directory entry may land on an existing path; check the path itself
        let guarded = if entry_type.is_dir() {
            target.as_path()
        } else {
            parent
        };
        ensure_within(&root, guarded).map_err(|e| KilnError::decompression(UNSAFE_PATH, e))?;
        fs::create_dir_all(parent)
            .map_err(|e| KilnError::decompression("failed to create directory", e))?;

        match entry_type {
            EntryType::Link => {
                let source = link_source(&entry, strip_components)
                    .and_then(|source| {
                        let source = root.join(source);
                        ensure_within(&root, &source).map(|()| source)
                    })
                    .map_err(|e| KilnError::decompression(UNSAFE_PATH, e))?;
                hard_link(&source, &target)
                    .map_err(|e| KilnError::decompression("failed to extract tar entry", e))?;
            }
            EntryType::Symlink => {
                check_symlink(&entry, &relative)
                    .map_err(|e| KilnError::decompression(UNSAFE_PATH, e))?;
                entry
                    .unpack(&target)
                    .map_err(|e| KilnError::decompression("failed to extract tar entry", e))?;
            }
            _ => {
                entry
                    .unpack(&target)
                    .map_err(|e| KilnError::decompression("failed to extract tar entry", e))?;
            }
        }
        unpacked += 1;
    }

    debug!("Unpacked {} entries into {}", unpacked, dest.display());
    Ok(unpacked)
}

/// Drop leading components, refusing anything that could escape `dest`
fn strip_path(path: &Path, strip_components: usize) -> io::Result<Option<PathBuf>> {
    let mut normal = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => normal.push(part),
            Component::CurDir => {}
            _ => return Err(unsafe_path(path)),
        }
    }

    if normal.len() <= strip_components {
        return Ok(None);
    }
    Ok(Some(normal[strip_components..].iter().collect()))
}

/// Archive-relative source of a hardlink, stripped like entry paths
fn link_source<R: Read>(
    entry: &tar::Entry<'_, R>,
    strip_components: usize,
) -> io::Result<PathBuf> {
    let link = entry
        .link_name()?
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "hardlink without a target"))?;
    strip_path(&link, strip_components)?.ok_or_else(|| unsafe_path(&link))
}

/// Symlink targets must be relative and resolve inside the destination
fn check_symlink<R: Read>(entry: &tar::Entry<'_, R>, relative: &Path) -> io::Result<()> {
    let link = entry
        .link_name()?
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "symlink without a target"))?;

    let mut depth = relative.components().count().saturating_sub(1);
    for component in link.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir if depth > 0 => depth -= 1,
            _ => return Err(unsafe_path(&link)),
        }
    }
    Ok(())
}

/// Fail if the deepest existing ancestor of `path` resolves outside `root`
fn ensure_within(root: &Path, path: &Path) -> io::Result<()> {
    let mut existing = path;
    while fs::symlink_metadata(existing).is_err() {
        match existing.parent() {
            Some(parent) => existing = parent,
            None => return Err(unsafe_path(path)),
        }
    }

    if fs::canonicalize(existing)?.starts_with(root) {
        Ok(())
    } else {
        Err(unsafe_path(path))
    }
}

fn hard_link(source: &Path, target: &Path) -> io::Result<()> {
    if fs::symlink_metadata(target).is_ok() {
        fs::remove_file(target)?;
    }
    fs::hard_link(source, target)
}

fn unsafe_path(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("refusing to extract {}", path.display()),
    )
}

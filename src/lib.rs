//! Kiln - fetch or build release artifacts
//!
//! Resolves the latest release of a remote package and returns a local
//! artifact for it: the cached one while the release tag is unchanged,
//! otherwise a downloaded precompiled asset or a source tarball run
//! through an external packager.

pub mod archive;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod package;
pub mod packager;
pub mod release;
pub mod transport;
pub mod ui;
pub mod workdir;

pub use error::{KilnError, KilnResult};
pub use fetch::RemoteFetcher;
pub use package::RemotePackage;

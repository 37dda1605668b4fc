//! Store traits: the abstract interfaces for release persistence and
//! artifact bytes.
//!
//! These traits keep the engine storage-agnostic. Implementations include
//! SQLite (primary) and in-memory (for tests) for releases, and a directory
//! on disk or a map in memory for artifacts.

use async_trait::async_trait;
use bytes::Bytes;
use ota_attest_core::{Build, OtaPackage, Release, VersionLedger};

use crate::error::Result;

/// Result of writing a release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutResult {
    /// The build was new; `seq` is its freshly assigned insertion order.
    Inserted { seq: u64 },
    /// The build existed and was overwritten; it keeps its original `seq`.
    Replaced { seq: u64 },
}

impl PutResult {
    /// The insertion sequence of the written build.
    pub fn seq(&self) -> u64 {
        match self {
            PutResult::Inserted { seq } | PutResult::Replaced { seq } => *seq,
        }
    }
}

/// The Store trait: async interface for release persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, we use `spawn_blocking` internally to avoid blocking the runtime.
///
/// # Design Notes
///
/// - **Atomic publish**: a build and its package are written in one
///   operation. Readers see either the old pair or the new pair, never a new
///   checksum next to an old signature.
/// - **Stable insertion order**: the first write of a build id assigns a
///   monotonically increasing `seq`. Overwrites keep it.
/// - **Composition**: deleting a build deletes its package.
#[async_trait]
pub trait Store: Send + Sync {
    /// Insert or replace a build together with its package.
    ///
    /// Passing `None` for `package` stores a bare build and removes any
    /// package it previously had.
    async fn put_release(&self, build: &Build, package: Option<&OtaPackage>) -> Result<PutResult>;

    /// Get a release by build id.
    async fn get_release(&self, build_id: &str) -> Result<Option<Release>>;

    /// Check if a build exists.
    async fn has_build(&self, build_id: &str) -> Result<bool>;

    /// All releases, ordered by insertion sequence.
    async fn list_releases(&self) -> Result<Vec<Release>>;

    /// Delete a build and its package. Returns whether anything was removed.
    async fn delete_release(&self, build_id: &str) -> Result<bool>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// Snapshot every release into a [`VersionLedger`].
    fn load_ledger(&self) -> impl std::future::Future<Output = Result<VersionLedger>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn load_ledger(&self) -> Result<VersionLedger> {
        let releases = self.list_releases().await?;
        Ok(VersionLedger::from_releases(releases))
    }
}

/// Byte-addressable access to package artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Read an artifact's bytes. `None` if it does not exist.
    async fn get_artifact(&self, artifact_ref: &str) -> Result<Option<Bytes>>;

    /// Check whether an artifact exists.
    async fn has_artifact(&self, artifact_ref: &str) -> Result<bool>;
}

//! In-memory implementations of the store traits.
//!
//! These are primarily for testing. They have the same semantics as the
//! SQLite and filesystem stores but keep everything in memory with no
//! persistence.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use bytes::Bytes;

use ota_attest_core::{Build, BuildId, OtaPackage, Release};

use crate::error::{Result, StoreError};
use crate::traits::{ArtifactStore, PutResult, Store};

/// In-memory release store.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock; each
/// write replaces a whole [`Release`] under the write lock.
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

struct MemoryStoreInner {
    releases: HashMap<BuildId, Release>,
    /// Last assigned insertion sequence.
    last_seq: u64,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(MemoryStoreInner {
                releases: HashMap::new(),
                last_seq: 0,
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn put_release(&self, build: &Build, package: Option<&OtaPackage>) -> Result<PutResult> {
        let mut inner = self.write()?;

        let existing_seq = inner.releases.get(&build.build_id).map(|r| r.seq);
        let result = match existing_seq {
            Some(seq) => PutResult::Replaced { seq },
            None => {
                inner.last_seq += 1;
                PutResult::Inserted {
                    seq: inner.last_seq,
                }
            }
        };

        inner.releases.insert(
            build.build_id.clone(),
            Release {
                seq: result.seq(),
                build: build.clone(),
                package: package.cloned(),
            },
        );

        Ok(result)
    }

    async fn get_release(&self, build_id: &str) -> Result<Option<Release>> {
        let inner = self.read()?;
        Ok(inner.releases.get(build_id).cloned())
    }

    async fn has_build(&self, build_id: &str) -> Result<bool> {
        let inner = self.read()?;
        Ok(inner.releases.contains_key(build_id))
    }

    async fn list_releases(&self) -> Result<Vec<Release>> {
        let inner = self.read()?;
        let mut releases: Vec<Release> = inner.releases.values().cloned().collect();
        releases.sort_by_key(|r| r.seq);
        Ok(releases)
    }

    async fn delete_release(&self, build_id: &str) -> Result<bool> {
        let mut inner = self.write()?;
        Ok(inner.releases.remove(build_id).is_some())
    }
}

/// In-memory artifact store keyed by artifact reference.
#[derive(Default)]
pub struct MemoryArtifactStore {
    artifacts: RwLock<HashMap<String, Bytes>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an artifact.
    pub fn insert(&self, artifact_ref: impl Into<String>, bytes: impl Into<Bytes>) -> Result<()> {
        let mut artifacts = self
            .artifacts
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        artifacts.insert(artifact_ref.into(), bytes.into());
        Ok(())
    }

    /// Remove an artifact. Returns whether it existed.
    pub fn remove(&self, artifact_ref: &str) -> Result<bool> {
        let mut artifacts = self
            .artifacts
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(artifacts.remove(artifact_ref).is_some())
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn get_artifact(&self, artifact_ref: &str) -> Result<Option<Bytes>> {
        let artifacts = self
            .artifacts
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(artifacts.get(artifact_ref).cloned())
    }

    async fn has_artifact(&self, artifact_ref: &str) -> Result<bool> {
        let artifacts = self
            .artifacts
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(artifacts.contains_key(artifact_ref))
    }
}

//! Filesystem artifact store.
//!
//! Artifacts live as files under a single root directory (the package
//! directory). An artifact reference is a relative path below that root.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{Result, StoreError};
use crate::traits::ArtifactStore;

/// Artifact store backed by a directory.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Create a store rooted at `root`. The directory does not have to exist
    /// yet; missing files read as `None`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a reference to a path under the root.
    ///
    /// Rejects empty references, absolute paths and any `..` component.
    pub fn resolve(&self, artifact_ref: &str) -> Result<PathBuf> {
        if artifact_ref.is_empty() {
            return Err(StoreError::InvalidArtifactRef(artifact_ref.to_string()));
        }
        let relative = Path::new(artifact_ref);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(StoreError::InvalidArtifactRef(artifact_ref.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn get_artifact(&self, artifact_ref: &str) -> Result<Option<Bytes>> {
        let path = self.resolve(artifact_ref)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(Bytes::from(bytes))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "artifact not found");
                Ok(None)
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn has_artifact(&self, artifact_ref: &str) -> Result<bool> {
        let path = self.resolve(artifact_ref)?;
        match tokio::fs::metadata(&path).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }
}

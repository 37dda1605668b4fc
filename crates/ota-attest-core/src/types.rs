//! Strong type definitions for OTA Attest.
//!
//! Identifiers are newtypes so a build id can never be passed where an
//! artifact reference is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::{Checksum, PackageSignature};
use crate::error::CoreError;

/// Opaque, unique identifier of a firmware build (e.g. `build-1001`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildId(String);

impl BuildId {
    /// Create a build id, rejecting empty or whitespace-padded tokens.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        if id.is_empty() {
            return Err(CoreError::InvalidBuildId("empty build id".into()));
        }
        if id.trim() != id {
            return Err(CoreError::InvalidBuildId(format!(
                "build id {:?} has surrounding whitespace",
                id
            )));
        }
        Ok(Self(id))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BuildId({})", self.0)
    }
}

impl fmt::Display for BuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for BuildId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets maps keyed by BuildId be queried with &str.
impl std::borrow::Borrow<str> for BuildId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for BuildId {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

/// A firmware revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Build {
    /// Unique identity.
    pub build_id: BuildId,
    /// Display-only version string.
    pub version: String,
    /// Ordering key, Unix milliseconds.
    pub created_at: i64,
}

impl Build {
    pub fn new(build_id: BuildId, version: impl Into<String>, created_at: i64) -> Self {
        Self {
            build_id,
            version: version.into(),
            created_at,
        }
    }
}

/// The artifact of a build together with its integrity metadata.
///
/// `checksum` and `signature` are only ever set together, from a single
/// [`Attestation`](crate::attest::Attestation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtaPackage {
    /// Locator of the artifact bytes (a file name for the filesystem store).
    pub artifact_ref: String,
    pub checksum: Checksum,
    pub signature: PackageSignature,
    pub patch_notes: String,
}

/// A build as persisted: its insertion sequence plus its optional package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Insertion order assigned by the store on first write. Breaks
    /// `created_at` ties.
    pub seq: u64,
    pub build: Build,
    pub package: Option<OtaPackage>,
}

impl Release {
    /// The build id of this release.
    pub fn build_id(&self) -> &BuildId {
        &self.build.build_id
    }

    /// The total ordering key: `created_at`, then insertion order.
    pub fn order_key(&self) -> (i64, u64) {
        (self.build.created_at, self.seq)
    }
}

//! Integrity attestation: binding package bytes to an offline-verifiable
//! signature.
//!
//! An [`Attestation`] is the (checksum, signature) pair for one artifact.
//! The pair is produced in one step and consumed in one step; there is no
//! way to build one from a checksum and a signature computed separately
//! except through [`Attestation::from_parts`], which is for loading stored
//! records.

use serde::{Deserialize, Serialize};

use crate::crypto::{Checksum, PackageSignature, PublicKey, SigningKey};
use crate::error::SigningError;
use crate::types::OtaPackage;

/// A checksum together with the signature over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    pub checksum: Checksum,
    pub signature: PackageSignature,
}

impl Attestation {
    /// Reassemble a stored attestation.
    pub fn from_parts(checksum: Checksum, signature: PackageSignature) -> Self {
        Self {
            checksum,
            signature,
        }
    }

    /// Check this attestation against a public key.
    pub fn verify(&self, public_key: &PublicKey) -> bool {
        verify(&self.checksum.to_hex(), &self.signature.to_hex(), public_key)
    }

    /// Attach the attestation to an artifact, producing a package.
    pub fn into_package(
        self,
        artifact_ref: impl Into<String>,
        patch_notes: impl Into<String>,
    ) -> OtaPackage {
        OtaPackage {
            artifact_ref: artifact_ref.into(),
            checksum: self.checksum,
            signature: self.signature,
            patch_notes: patch_notes.into(),
        }
    }
}

impl From<&OtaPackage> for Attestation {
    fn from(p: &OtaPackage) -> Self {
        Self::from_parts(p.checksum, p.signature.clone())
    }
}

/// Hash the artifact and sign the resulting hex checksum.
///
/// Deterministic for a given `(artifact, key)` pair.
pub fn attest(artifact: &[u8], key: &SigningKey) -> Result<Attestation, SigningError> {
    let checksum = Checksum::compute(artifact);
    let signature = key.sign(&checksum.signing_message())?;
    Ok(Attestation {
        checksum,
        signature,
    })
}

/// Like [`attest`], then verify the new signature with the key's own public
/// half before returning it.
pub fn attest_checked(artifact: &[u8], key: &SigningKey) -> Result<Attestation, SigningError> {
    let attestation = attest(artifact, key)?;
    if !attestation.verify(key.public_key()) {
        return Err(SigningError::SelfCheckFailed);
    }
    Ok(attestation)
}

/// Device-side verification of a hex checksum and hex signature.
///
/// Never errors. Malformed hex, a wrong key, or any tampering yields
/// `false`. The checksum is verified exactly as given; devices must pass the
/// lowercase hex string the server published.
pub fn verify(checksum_hex: &str, signature_hex: &str, public_key: &PublicKey) -> bool {
    let Ok(signature) = PackageSignature::from_hex(signature_hex) else {
        return false;
    };
    public_key.verify(checksum_hex.as_bytes(), &signature)
}

/// Outcome of comparing a device-computed checksum with the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumValidation {
    /// Candidate matches the stored checksum.
    Valid,
    /// Candidate differs (or is not a checksum at all).
    Invalid,
    /// No package is registered for the build.
    NotFound,
}

impl ChecksumValidation {
    /// Compare a candidate against a stored checksum.
    ///
    /// The candidate is trimmed and lowercased. Checksums are public, so
    /// ordinary string equality is used.
    pub fn compare(stored: &Checksum, candidate: &str) -> Self {
        let normalized = candidate.trim().to_ascii_lowercase();
        if normalized == stored.to_hex() {
            ChecksumValidation::Valid
        } else {
            ChecksumValidation::Invalid
        }
    }

    /// Whether the result is [`ChecksumValidation::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, ChecksumValidation::Valid)
    }
}

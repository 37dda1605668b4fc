//! Error types for OTA Attest Core.

use thiserror::Error;

/// Core errors raised while parsing identifiers, checksums and keys.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid build id: {0}")]
    InvalidBuildId(String),

    #[error("invalid checksum: {0}")]
    InvalidChecksum(String),

    #[error("invalid signature encoding: {0}")]
    InvalidSignature(String),

    #[error("invalid signing key: {0}")]
    InvalidSigningKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("key encoding error: {0}")]
    KeyEncoding(String),
}

/// Errors that abort an attestation.
///
/// A package is never produced when one of these is returned.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("signing backend rejected the operation: {0}")]
    Backend(String),

    #[error("signing key is unusable: {0}")]
    UnusableKey(String),

    #[error("backend produced an empty signature")]
    EmptySignature,

    #[error("fresh signature failed verification against the signing key")]
    SelfCheckFailed,
}

impl From<CoreError> for SigningError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidSigningKey(msg)
            | CoreError::InvalidPublicKey(msg)
            | CoreError::KeyEncoding(msg) => SigningError::UnusableKey(msg),
            other => SigningError::Backend(other.to_string()),
        }
    }
}

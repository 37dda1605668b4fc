//! Error types for the Engine.

use ota_attest_core::{BuildId, CoreError, SigningError};
use ota_attest_store::StoreError;
use thiserror::Error;

/// Errors that can occur during Engine operations.
///
/// Unknown builds and up-to-date devices are not errors; they are variants
/// of the operation results.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Malformed identifier, checksum or key.
    #[error("invalid input: {0}")]
    Core(#[from] CoreError),

    /// The package could not be signed. Nothing was stored.
    #[error("signing error: {0}")]
    Signing(#[from] SigningError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The artifact store has nothing under this reference.
    #[error("artifact not found: {0}")]
    ArtifactNotFound(String),

    /// The next build exists but has no package to offer.
    #[error("build {0} has no registered package")]
    PackageMissing(BuildId),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// Legacy metadata could not be parsed or rendered.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// A blocking task failed to run to completion.
    #[error("blocking task failed: {0}")]
    Task(String),
}

/// Result type for Engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

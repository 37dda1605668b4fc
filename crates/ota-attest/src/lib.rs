//! # OTA Attest
//!
//! Update negotiation and integrity attestation for over-the-air firmware
//! updates.
//!
//! ## Overview
//!
//! A device reports the build it runs; the engine answers with the
//! immediate next build in release order, together with the SHA-256
//! checksum of the package and an RSA signature over that checksum.
//!
//! - **Ledger**: builds ordered by creation time, ties broken by insertion order
//! - **Attestation**: checksum and signature computed once, at registration
//! - **Validation**: device-computed checksums compared with the stored one
//! - **Rotation**: the signing key can be swapped while the engine runs
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ota_attest::{Engine, EngineConfig, NewRelease, UpdateCheck};
//! use ota_attest::core::BuildId;
//!
//! async fn example() -> ota_attest::Result<()> {
//!     let engine = Engine::open(EngineConfig::default())?;
//!
//!     engine
//!         .register(NewRelease {
//!             build_id: BuildId::new("build-1002")?,
//!             version: "1.0.2".into(),
//!             created_at: 1_706_745_600_000,
//!             artifact_ref: "ota-build-1002.zip".into(),
//!             patch_notes: "Bug fixes".into(),
//!         })
//!         .await?;
//!
//!     if let UpdateCheck::Available(update) = engine.check_update("build-1001").await? {
//!         println!("{} -> {}", update.build.build_id, update.package_url);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `ota_attest::core` - Ledger, checksums and signatures
//! - `ota_attest::store` - Release and artifact storage

pub mod config;
pub mod engine;
pub mod error;
pub mod keys;
pub mod metadata;
pub mod wire;

// Re-export component crates
pub use ota_attest_core as core;
pub use ota_attest_store as store;

// Re-export main types for convenience
pub use config::EngineConfig;
pub use engine::{AvailableUpdate, Engine, NewRelease, UpdateCheck};
pub use error::{EngineError, Result};
pub use keys::KeyHolder;
pub use metadata::{ImportReport, LegacyEntry, LegacyMetadata, PreviewEntry};

// Re-export commonly used core types
pub use ota_attest_core::{
    Attestation, Build, BuildId, Checksum, ChecksumValidation, NextBuild, OtaPackage,
    PackageSignature, PublicKey, Release, SigningKey, VersionLedger,
};

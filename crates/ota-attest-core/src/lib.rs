//! # OTA Attest Core
//!
//! Pure primitives for OTA Attest: builds, the version ledger, checksums and
//! package signatures.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over build records and cryptographic data.
//!
//! ## Key Types
//!
//! - [`VersionLedger`] - Ordered builds; answers "what comes after X?"
//! - [`Release`] - A stored build with its optional [`OtaPackage`]
//! - [`Checksum`] - SHA-256 of package bytes, hex on the wire
//! - [`SigningKey`] / [`PublicKey`] - RSA PKCS#1 v1.5 with SHA-256
//! - [`Attestation`] - A checksum and the signature over it
//!
//! ## Signing
//!
//! The signed message is the lowercase hex checksum as UTF-8 bytes. See the
//! [`crypto`] module.

pub mod attest;
pub mod crypto;
pub mod error;
pub mod ledger;
pub mod types;

pub use attest::{attest, attest_checked, verify, Attestation, ChecksumValidation};
pub use crypto::{Checksum, PackageSignature, PublicKey, SigningKey};
pub use error::{CoreError, SigningError};
pub use ledger::{NextBuild, VersionLedger};
pub use types::{Build, BuildId, OtaPackage, Release};

//! # OTA Attest Testkit
//!
//! Testing utilities for OTA Attest.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Keys**: Fixed RSA keys, so signatures are reproducible
//! - **Golden vectors**: Checksums and signatures produced with OpenSSL
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Memory stores pre-loaded with a three-build scenario
//!
//! ## Golden Vectors
//!
//! ```rust
//! use ota_attest_core::attest;
//! use ota_attest_testkit::{keys, vectors};
//!
//! let attestation = attest(vectors::TEST_PAYLOAD, &keys::primary()).unwrap();
//! assert_eq!(attestation.checksum.to_hex(), vectors::TEST_PAYLOAD_CHECKSUM);
//! assert_eq!(attestation.signature.to_hex(), vectors::test_payload_signature());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use ota_attest_core::VersionLedger;
//! use ota_attest_testkit::generators::releases;
//!
//! proptest! {
//!     #[test]
//!     fn ledger_len_matches(releases in releases(16)) {
//!         let n = releases.len();
//!         prop_assert_eq!(VersionLedger::from_releases(releases).len(), n);
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,ignore
//! use ota_attest_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::scenario().await;
//! let (store, artifacts, key) = fixture.into_parts();
//! ```

pub mod fixtures;
pub mod generators;
pub mod keys;
pub mod vectors;

pub use fixtures::{TestFixture, SCENARIO_BUILDS, UNKNOWN_BUILD};

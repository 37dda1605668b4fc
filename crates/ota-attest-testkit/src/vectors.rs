//! Golden vectors.
//!
//! Produced independently with OpenSSL:
//!
//! ```text
//! printf test-payload | sha256sum
//! printf <checksum-hex> | openssl dgst -sha256 -sign keys/primary.pem | xxd -p
//! ```
//!
//! PKCS#1 v1.5 signatures are deterministic, so any conforming signer with
//! the primary key must reproduce them byte for byte.

/// Payload of the golden attestation.
pub const TEST_PAYLOAD: &[u8] = b"test-payload";

/// SHA-256 of [`TEST_PAYLOAD`].
pub const TEST_PAYLOAD_CHECKSUM: &str =
    "6f06dd0e26608013eff30bb1e951cda7de3fdd9e78e907470e0dd5c0ed25e273";

/// SHA-256 of the empty input.
pub const EMPTY_CHECKSUM: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

const TEST_PAYLOAD_SIGNATURE: &str = include_str!("../keys/test_payload.sig.hex");

/// Hex signature of [`TEST_PAYLOAD_CHECKSUM`] under the primary key.
pub fn test_payload_signature() -> &'static str {
    TEST_PAYLOAD_SIGNATURE.trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys;
    use ota_attest_core::{attest, verify, Checksum};

    #[test]
    fn test_checksums_match() {
        assert_eq!(Checksum::compute(TEST_PAYLOAD).to_hex(), TEST_PAYLOAD_CHECKSUM);
        assert_eq!(Checksum::compute(b"").to_hex(), EMPTY_CHECKSUM);
    }

    #[test]
    fn test_signature_reproduces() {
        let attestation = attest(TEST_PAYLOAD, &keys::primary()).unwrap();
        assert_eq!(attestation.signature.to_hex(), test_payload_signature());
        assert_eq!(test_payload_signature().len(), 512);
    }

    #[test]
    fn test_signature_verifies_only_under_primary() {
        let sig = test_payload_signature();
        assert!(verify(TEST_PAYLOAD_CHECKSUM, sig, &keys::primary_public()));
        assert!(!verify(TEST_PAYLOAD_CHECKSUM, sig, &keys::unrelated_public()));
        assert!(!verify(EMPTY_CHECKSUM, sig, &keys::primary_public()));
    }
}

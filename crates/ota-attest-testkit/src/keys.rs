//! Fixed RSA keys.
//!
//! 2048-bit keys checked into `keys/`, so signatures are reproducible across
//! runs and against other tooling (`openssl dgst -sha256 -sign`).

use ota_attest_core::{PublicKey, SigningKey};

/// Primary signing key, PKCS#8.
pub const PRIMARY_PEM: &str = include_str!("../keys/primary.pem");
/// Primary signing key, PKCS#1.
pub const PRIMARY_PKCS1_PEM: &str = include_str!("../keys/primary.pkcs1.pem");
/// Public half of the primary key, SPKI.
pub const PRIMARY_PUBLIC_PEM: &str = include_str!("../keys/primary.pub.pem");
/// A second key, unrelated to the primary one.
pub const UNRELATED_PEM: &str = include_str!("../keys/unrelated.pem");
/// Public half of the unrelated key.
pub const UNRELATED_PUBLIC_PEM: &str = include_str!("../keys/unrelated.pub.pem");

/// The primary signing key.
pub fn primary() -> SigningKey {
    SigningKey::from_pem(PRIMARY_PEM).expect("primary test key parses")
}

pub fn primary_public() -> PublicKey {
    PublicKey::from_pem(PRIMARY_PUBLIC_PEM).expect("primary public key parses")
}

/// A key that did not sign anything the primary key signed.
pub fn unrelated() -> SigningKey {
    SigningKey::from_pem(UNRELATED_PEM).expect("unrelated test key parses")
}

pub fn unrelated_public() -> PublicKey {
    PublicKey::from_pem(UNRELATED_PUBLIC_PEM).expect("unrelated public key parses")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pem_forms_agree() {
        let pkcs8 = primary();
        let pkcs1 = SigningKey::from_pem(PRIMARY_PKCS1_PEM).unwrap();
        assert_eq!(pkcs8.public_key(), pkcs1.public_key());
        assert_eq!(pkcs8.public_key(), &primary_public());
    }

    #[test]
    fn test_keys_differ() {
        assert_ne!(primary_public(), unrelated_public());
        assert_eq!(unrelated().public_key(), &unrelated_public());
    }
}

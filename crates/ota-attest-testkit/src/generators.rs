//! Proptest generators for property-based testing.

use proptest::prelude::*;

use ota_attest_core::{Build, BuildId, Checksum, OtaPackage, PackageSignature, Release};

/// Generate a valid build id.
pub fn build_id() -> impl Strategy<Value = BuildId> {
    "[a-z0-9][a-z0-9._-]{0,15}".prop_map(|s| BuildId::new(s).expect("pattern yields valid ids"))
}

/// Generate a creation time from a narrow range, so ties are common.
pub fn created_at() -> impl Strategy<Value = i64> {
    0i64..8
}

/// Generate a Build.
pub fn build() -> impl Strategy<Value = Build> {
    (build_id(), "[0-9]\\.[0-9]\\.[0-9]", created_at())
        .prop_map(|(id, version, t)| Build::new(id, version, t))
}

/// Generate a Checksum.
pub fn checksum() -> impl Strategy<Value = Checksum> {
    any::<[u8; 32]>().prop_map(Checksum::from_bytes)
}

/// Generate a package with arbitrary (not verifiable) checksum and signature.
pub fn package() -> impl Strategy<Value = OtaPackage> {
    (checksum(), prop::collection::vec(any::<u8>(), 1..=64), "[ -~]{0,32}").prop_map(
        |(checksum, sig, notes)| OtaPackage {
            artifact_ref: format!("ota-{}.zip", checksum.to_hex()),
            checksum,
            signature: PackageSignature::from_bytes(sig),
            patch_notes: notes,
        },
    )
}

/// Generate artifact bytes of at most `max_len` bytes.
pub fn artifact(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate releases with distinct build ids, in arbitrary insertion order.
///
/// `seq` follows the generated order, as a store would assign it.
pub fn releases(max: usize) -> impl Strategy<Value = Vec<Release>> {
    prop::collection::btree_map(build_id(), (created_at(), prop::option::of(package())), 0..=max)
        .prop_map(|map| map.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
        .prop_map(|entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(i, (id, (t, package)))| Release {
                    seq: i as u64 + 1,
                    build: Build::new(id, "1.0.0", t),
                    package,
                })
                .collect()
        })
}

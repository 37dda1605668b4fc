//! Property tests over the engine with arbitrary artifacts.

use bytes::Bytes;
use proptest::prelude::*;

use ota_attest::core::verify;
use ota_attest::store::{MemoryArtifactStore, MemoryStore};
use ota_attest::{Build, Checksum, ChecksumValidation, Engine, EngineConfig, NewRelease};
use ota_attest_testkit::generators::{artifact, build, checksum};
use ota_attest_testkit::keys;

fn engine() -> Engine<MemoryStore, MemoryArtifactStore> {
    Engine::new(
        MemoryStore::new(),
        MemoryArtifactStore::new(),
        keys::primary(),
        EngineConfig::default(),
    )
}

fn new_release(build: &Build) -> NewRelease {
    NewRelease {
        build_id: build.build_id.clone(),
        version: build.version.clone(),
        created_at: build.created_at,
        artifact_ref: format!("ota-{}.zip", build.build_id),
        patch_notes: String::new(),
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    // RSA signing dominates; keep the case count low.
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn reregister_keeps_seq_and_replaces_pair(b in build(), first in artifact(256), second in artifact(256)) {
        runtime().block_on(async {
            let engine = engine();
            let a = engine.register_bytes(new_release(&b), Bytes::from(first.clone())).await.unwrap();
            let r = engine.register_bytes(new_release(&b), Bytes::from(second.clone())).await.unwrap();
            assert_eq!(a.seq, r.seq);

            let (pa, pr) = (a.package.unwrap(), r.package.unwrap());
            assert_eq!(pr.checksum, Checksum::compute(&second));
            assert_eq!(pa.checksum == pr.checksum, first == second);
            assert_eq!(pa.signature == pr.signature, first == second);

            let stored = engine.get_build(b.build_id.as_str()).await.unwrap().unwrap();
            let package = stored.package.unwrap();
            assert_eq!(package.checksum, pr.checksum);
            assert!(verify(&package.checksum.to_hex(), &package.signature.to_hex(), &keys::primary_public()));
        });
    }

    #[test]
    fn validate_accepts_only_the_stored_checksum(b in build(), bytes in artifact(256), other in checksum()) {
        runtime().block_on(async {
            let engine = engine();
            let release = engine.register_bytes(new_release(&b), Bytes::from(bytes)).await.unwrap();
            let stored = release.package.unwrap().checksum;
            let id = b.build_id.as_str();

            assert_eq!(
                engine.validate_checksum(id, &stored.to_hex().to_uppercase()).await.unwrap(),
                ChecksumValidation::Valid
            );
            let expected = if other == stored { ChecksumValidation::Valid } else { ChecksumValidation::Invalid };
            assert_eq!(engine.validate_checksum(id, &other.to_hex()).await.unwrap(), expected);
        });
    }
}

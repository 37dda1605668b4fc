//! Test fixtures and helpers.
//!
//! Common setup code for engine and store tests.

use ota_attest_core::{attest, Build, BuildId, OtaPackage, Release, SigningKey};
use ota_attest_store::{MemoryArtifactStore, MemoryStore, Store};

use crate::keys;

/// The three-build ledger used across the test suites, in release order.
pub const SCENARIO_BUILDS: [(&str, &str, i64); 3] = [
    ("build-1001", "1.0.1", 1_704_067_200_000),
    ("build-1002", "1.0.2", 1_706_745_600_000),
    ("build-1003", "1.0.3", 1_709_251_200_000),
];

/// A build id no scenario registers.
pub const UNKNOWN_BUILD: &str = "build-9999";

/// Artifact reference for a build.
pub fn artifact_ref(build_id: &str) -> String {
    format!("ota-{}.zip", build_id)
}

/// Distinct artifact contents for a build.
pub fn artifact_bytes(build_id: &str) -> Vec<u8> {
    format!("firmware image for {}", build_id).into_bytes()
}

/// A memory store, a memory artifact store and the primary key.
pub struct TestFixture {
    pub key: SigningKey,
    pub store: MemoryStore,
    pub artifacts: MemoryArtifactStore,
}

impl TestFixture {
    /// Empty stores signed by the primary key.
    pub fn new() -> Self {
        Self {
            key: keys::primary(),
            store: MemoryStore::new(),
            artifacts: MemoryArtifactStore::new(),
        }
    }

    /// Stores holding the artifacts of [`SCENARIO_BUILDS`], with no builds
    /// registered yet.
    pub fn with_scenario_artifacts() -> Self {
        let fixture = Self::new();
        for (id, _, _) in SCENARIO_BUILDS {
            fixture.add_artifact(id);
        }
        fixture
    }

    /// Stores holding [`SCENARIO_BUILDS`], attested and registered.
    pub async fn scenario() -> Self {
        let fixture = Self::with_scenario_artifacts();
        for (id, version, created_at) in SCENARIO_BUILDS {
            fixture.put_attested(id, version, created_at).await;
        }
        fixture
    }

    /// Place the artifact for `build_id` in the artifact store.
    pub fn add_artifact(&self, build_id: &str) {
        self.artifacts
            .insert(artifact_ref(build_id), artifact_bytes(build_id))
            .expect("artifact insert");
    }

    /// The package `build_id` would get when signed with the fixture key.
    pub fn package(&self, build_id: &str) -> OtaPackage {
        attest(&artifact_bytes(build_id), &self.key)
            .expect("attestation")
            .into_package(artifact_ref(build_id), format!("Update to {}", build_id))
    }

    /// Attest and store a build directly, bypassing any engine.
    pub async fn put_attested(&self, build_id: &str, version: &str, created_at: i64) -> Release {
        let build = Build::new(BuildId::new(build_id).expect("valid build id"), version, created_at);
        let package = self.package(build_id);
        let seq = self
            .store
            .put_release(&build, Some(&package))
            .await
            .expect("put release")
            .seq();
        Release {
            seq,
            build,
            package: Some(package),
        }
    }

    /// Hand the parts over, e.g. to build an engine.
    pub fn into_parts(self) -> (MemoryStore, MemoryArtifactStore, SigningKey) {
        (self.store, self.artifacts, self.key)
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ota_attest_core::NextBuild;
    use ota_attest_store::{ArtifactStore, StoreExt};

    #[tokio::test]
    async fn test_scenario_ledger() {
        let fixture = TestFixture::scenario().await;
        let ledger = fixture.store.load_ledger().await.unwrap();

        assert_eq!(ledger.len(), 3);
        match ledger.next_build("build-1001") {
            NextBuild::Next(r) => assert_eq!(r.build.build_id.as_str(), "build-1002"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(ledger.next_build("build-1003"), NextBuild::UpToDate);
        assert_eq!(ledger.next_build(UNKNOWN_BUILD), NextBuild::NotFound);
    }

    #[tokio::test]
    async fn test_artifacts_present() {
        let fixture = TestFixture::with_scenario_artifacts();
        let bytes = fixture
            .artifacts
            .get_artifact("ota-build-1002.zip")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&bytes[..], &artifact_bytes("build-1002")[..]);
    }

    #[test]
    fn test_package_verifies() {
        let fixture = TestFixture::new();
        let package = fixture.package("build-1001");
        assert!(ota_attest_core::Attestation::from(&package).verify(&keys::primary_public()));
    }
}

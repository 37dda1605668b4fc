//! The Engine: update negotiation and package attestation.
//!
//! The Engine brings together the release store, the artifact store and the
//! signing key. Queries read a fresh [`VersionLedger`] snapshot from the
//! store; registrations are serialized and publish each build with its
//! checksum and signature in a single store write.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;

use ota_attest_core::{
    attest, attest_checked, Attestation, Build, BuildId, ChecksumValidation, NextBuild,
    OtaPackage, PublicKey, Release, SigningKey, VersionLedger,
};
use ota_attest_store::{
    ArtifactStore, FsArtifactStore, PutResult, SqliteStore, Store, StoreExt,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::keys::KeyHolder;

/// A build to register, before its artifact has been attested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelease {
    pub build_id: BuildId,
    pub version: String,
    /// Ordering key, Unix milliseconds.
    pub created_at: i64,
    /// Locator of the artifact in the artifact store.
    pub artifact_ref: String,
    pub patch_notes: String,
}

impl NewRelease {
    fn build(&self) -> Build {
        Build::new(self.build_id.clone(), self.version.clone(), self.created_at)
    }
}

/// An update offered to a device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableUpdate {
    pub build: Build,
    pub package: OtaPackage,
    /// Where the device downloads the artifact.
    pub package_url: String,
}

/// Result of an update check. The single semantic result the wire adapters
/// present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCheck {
    /// The immediate next build, with its checksum and signature.
    Available(AvailableUpdate),
    /// The device runs the newest build.
    UpToDate,
    /// The device reported a build the ledger does not know.
    UnknownBuild,
}

/// The main Engine struct.
///
/// Provides a unified API for:
/// - Resolving the next build for a device
/// - Registering builds and attesting their artifacts
/// - Validating device-computed checksums
/// - Rotating the signing key
pub struct Engine<S: Store, A: ArtifactStore> {
    /// Release persistence.
    store: Arc<S>,
    /// Artifact bytes.
    artifacts: Arc<A>,
    /// The active signing key.
    keys: KeyHolder,
    /// Configuration.
    config: EngineConfig,
    /// Serializes registrations and deletions.
    write_lock: Mutex<()>,
}

impl Engine<SqliteStore, FsArtifactStore> {
    /// Open the SQLite store, package directory and signing key named by
    /// `config`.
    pub fn open(config: EngineConfig) -> Result<Self> {
        let store = SqliteStore::open(&config.database_path)?;
        let artifacts = FsArtifactStore::new(&config.packages_dir);
        let key = config.load_signing_key()?;
        tracing::info!(
            database = %config.database_path.display(),
            packages = %config.packages_dir.display(),
            key = ?key,
            "engine opened"
        );
        Ok(Self::new(store, artifacts, key, config))
    }
}

impl<S: Store, A: ArtifactStore> Engine<S, A> {
    /// Create a new engine instance.
    pub fn new(store: S, artifacts: A, key: SigningKey, config: EngineConfig) -> Self {
        Self {
            store: Arc::new(store),
            artifacts: Arc::new(artifacts),
            keys: KeyHolder::new(key),
            config,
            write_lock: Mutex::new(()),
        }
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the artifact store reference.
    pub fn artifacts(&self) -> &A {
        &self.artifacts
    }

    /// Get the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Public key devices verify against.
    pub fn public_key(&self) -> PublicKey {
        self.keys.public_key()
    }

    /// Swap the signing key. Returns the previous key.
    ///
    /// Packages already stored keep their old signatures until they are
    /// registered again.
    pub fn rotate_key(&self, key: SigningKey) -> Arc<SigningKey> {
        let old = self.keys.replace(key);
        tracing::info!(old = ?old, new = ?self.keys.current(), "signing key rotated");
        old
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ledger Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Snapshot the current ledger.
    pub async fn ledger(&self) -> Result<VersionLedger> {
        Ok(self.store.load_ledger().await?)
    }

    /// Resolve the build a device on `current` should install next.
    pub async fn next_build(&self, current: &str) -> Result<NextBuild> {
        let ledger = self.ledger().await?;
        let next = ledger.next_build(current);
        if next == NextBuild::NotFound {
            tracing::debug!(build_id = current, "unknown build in next_build");
        }
        Ok(next)
    }

    /// Whether a build id is registered.
    pub async fn is_known(&self, build_id: &str) -> Result<bool> {
        Ok(self.store.has_build(build_id).await?)
    }

    /// Get a single release.
    pub async fn get_build(&self, build_id: &str) -> Result<Option<Release>> {
        Ok(self.store.get_release(build_id).await?)
    }

    /// All releases in ledger order.
    pub async fn list_builds(&self) -> Result<Vec<Release>> {
        Ok(self.ledger().await?.iter().cloned().collect())
    }

    /// Answer a device's update check.
    ///
    /// The offered checksum and signature are the ones stored at
    /// registration; nothing is rehashed here.
    pub async fn check_update(&self, current: &str) -> Result<UpdateCheck> {
        match self.next_build(current).await? {
            NextBuild::NotFound => Ok(UpdateCheck::UnknownBuild),
            NextBuild::UpToDate => Ok(UpdateCheck::UpToDate),
            NextBuild::Next(release) => {
                let Some(package) = release.package else {
                    tracing::warn!(build_id = %release.build.build_id, "next build has no package");
                    return Err(EngineError::PackageMissing(release.build.build_id));
                };
                let package_url = self.config.package_url(&package.artifact_ref);
                Ok(UpdateCheck::Available(AvailableUpdate {
                    build: release.build,
                    package,
                    package_url,
                }))
            }
        }
    }

    /// Compare a device-computed checksum with the stored one.
    pub async fn validate_checksum(&self, build_id: &str, candidate: &str) -> Result<ChecksumValidation> {
        // Unknown builds and builds without a package are both NotFound.
        let package = self
            .store
            .get_release(build_id)
            .await?
            .and_then(|r| r.package);
        Ok(match package {
            Some(p) => ChecksumValidation::compare(&p.checksum, candidate),
            None => ChecksumValidation::NotFound,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attestation
    // ─────────────────────────────────────────────────────────────────────────

    /// Hash and sign bytes with the active key, off the async runtime.
    pub async fn attest_bytes(&self, bytes: Bytes) -> Result<Attestation> {
        let key = self.keys.current();
        let checked = self.config.verify_after_sign;

        let attestation = tokio::task::spawn_blocking(move || {
            if checked {
                attest_checked(&bytes, &key)
            } else {
                attest(&bytes, &key)
            }
        })
        .await
        .map_err(|e| EngineError::Task(format!("attestation task failed: {}", e)))??;

        Ok(attestation)
    }

    /// Hash and sign an artifact straight from the artifact store, without
    /// touching the ledger.
    pub async fn attest_artifact(&self, artifact_ref: &str) -> Result<Attestation> {
        let bytes = self.read_artifact(artifact_ref).await?;
        self.attest_bytes(bytes).await
    }

    async fn read_artifact(&self, artifact_ref: &str) -> Result<Bytes> {
        match self.artifacts.get_artifact(artifact_ref).await? {
            Some(bytes) => Ok(bytes),
            None => {
                tracing::warn!(artifact = artifact_ref, "artifact not found");
                Err(EngineError::ArtifactNotFound(artifact_ref.to_string()))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Register a build, reading its artifact from the artifact store.
    ///
    /// Re-registering an existing build replaces its checksum and signature
    /// together and keeps its ledger position among equal timestamps.
    pub async fn register(&self, new: NewRelease) -> Result<Release> {
        let _guard = self.write_lock.lock().await;
        let bytes = self.read_artifact(&new.artifact_ref).await?;
        self.publish(new, bytes).await
    }

    /// Register a build from bytes already in hand.
    pub async fn register_bytes(&self, new: NewRelease, bytes: Bytes) -> Result<Release> {
        let _guard = self.write_lock.lock().await;
        self.publish(new, bytes).await
    }

    /// Store a build with no package.
    pub async fn put_bare_build(&self, build: Build) -> Result<Release> {
        let _guard = self.write_lock.lock().await;
        let result = self.store.put_release(&build, None).await?;
        Ok(Release {
            seq: result.seq(),
            build,
            package: None,
        })
    }

    /// Delete a build and its package.
    pub async fn delete_build(&self, build_id: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let removed = self.store.delete_release(build_id).await?;
        if removed {
            tracing::info!(build_id, "build deleted");
        }
        Ok(removed)
    }

    // Caller holds write_lock.
    async fn publish(&self, new: NewRelease, bytes: Bytes) -> Result<Release> {
        tracing::debug!(build_id = %new.build_id, size = bytes.len(), "attesting artifact");

        // Signing happens before the store is touched, so a failure leaves
        // the previous release in place.
        let attestation = self.attest_bytes(bytes).await?;

        let build = new.build();
        let package = attestation.into_package(new.artifact_ref, new.patch_notes);
        let result = self.store.put_release(&build, Some(&package)).await?;

        match result {
            PutResult::Inserted { seq } => {
                tracing::info!(build_id = %build.build_id, seq, checksum = %package.checksum, "build registered")
            }
            PutResult::Replaced { seq } => {
                tracing::info!(build_id = %build.build_id, seq, checksum = %package.checksum, "build re-registered")
            }
        }

        Ok(Release {
            seq: result.seq(),
            build,
            package: Some(package),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ota_attest_core::{verify, Checksum};
    use ota_attest_store::{MemoryArtifactStore, MemoryStore};
    use ota_attest_testkit::{keys, vectors};

    fn engine() -> Engine<MemoryStore, MemoryArtifactStore> {
        Engine::new(
            MemoryStore::new(),
            MemoryArtifactStore::new(),
            keys::primary(),
            EngineConfig::default(),
        )
    }

    fn new_release(id: &str, created_at: i64) -> NewRelease {
        NewRelease {
            build_id: BuildId::new(id).unwrap(),
            version: format!("1.0.{}", created_at),
            created_at,
            artifact_ref: format!("ota-{}.zip", id),
            patch_notes: format!("notes for {}", id),
        }
    }

    async fn register(engine: &Engine<MemoryStore, MemoryArtifactStore>, id: &str, t: i64) -> Release {
        let new = new_release(id, t);
        engine
            .artifacts()
            .insert(new.artifact_ref.clone(), format!("payload {}", id).into_bytes())
            .unwrap();
        engine.register(new).await.unwrap()
    }

    #[tokio::test]
    async fn test_check_update_scenario() {
        let engine = engine();
        register(&engine, "build-1001", 1).await;
        register(&engine, "build-1002", 2).await;
        register(&engine, "build-1003", 3).await;

        match engine.check_update("build-1001").await.unwrap() {
            UpdateCheck::Available(update) => {
                assert_eq!(update.build.build_id.as_str(), "build-1002");
                assert_eq!(update.package_url, "/packages/ota-build-1002.zip");
                assert!(verify(
                    &update.package.checksum.to_hex(),
                    &update.package.signature.to_hex(),
                    &engine.public_key()
                ));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(engine.check_update("build-1003").await.unwrap(), UpdateCheck::UpToDate);
        assert_eq!(engine.check_update("build-9999").await.unwrap(), UpdateCheck::UnknownBuild);
    }

    #[tokio::test]
    async fn test_register_golden_payload() {
        let engine = engine();
        let release = engine
            .register_bytes(new_release("build-1", 1), Bytes::from_static(vectors::TEST_PAYLOAD))
            .await
            .unwrap();

        let package = release.package.unwrap();
        assert_eq!(package.checksum.to_hex(), vectors::TEST_PAYLOAD_CHECKSUM);
        assert_eq!(package.signature.to_hex(), vectors::test_payload_signature());
    }

    #[tokio::test]
    async fn test_register_missing_artifact_leaves_state() {
        let engine = engine();
        let err = engine.register(new_release("b", 1)).await.unwrap_err();
        assert!(matches!(err, EngineError::ArtifactNotFound(_)));
        assert!(!engine.is_known("b").await.unwrap());
    }

    #[tokio::test]
    async fn test_reregister_recomputes_pair() {
        let engine = engine();
        let first = register(&engine, "b", 1).await;

        engine
            .artifacts()
            .insert("ota-b.zip", b"replacement bytes".to_vec())
            .unwrap();
        let second = engine.register(new_release("b", 1)).await.unwrap();

        assert_eq!(first.seq, second.seq);
        let (p1, p2) = (first.package.unwrap(), second.package.unwrap());
        assert_ne!(p1.checksum, p2.checksum);
        assert_ne!(p1.signature, p2.signature);
        assert_eq!(p2.checksum, Checksum::compute(b"replacement bytes"));
    }

    #[tokio::test]
    async fn test_reregister_after_rotation_uses_new_key() {
        let engine = engine();
        let first = register(&engine, "b", 1).await.package.unwrap();

        engine.rotate_key(keys::unrelated());
        let second = engine
            .register(new_release("b", 1))
            .await
            .unwrap()
            .package
            .unwrap();

        // Same bytes: same checksum, fresh signature.
        assert_eq!(first.checksum, second.checksum);
        assert_ne!(first.signature, second.signature);
        let checksum = second.checksum.to_hex();
        assert!(verify(&checksum, &second.signature.to_hex(), keys::unrelated().public_key()));
        assert!(!verify(&checksum, &second.signature.to_hex(), keys::primary().public_key()));
    }

    #[tokio::test]
    async fn test_validate_checksum() {
        let engine = engine();
        let release = register(&engine, "b", 1).await;
        let checksum = release.package.unwrap().checksum.to_hex();

        assert_eq!(
            engine.validate_checksum("b", &checksum).await.unwrap(),
            ChecksumValidation::Valid
        );
        assert_eq!(
            engine.validate_checksum("b", &checksum.to_uppercase()).await.unwrap(),
            ChecksumValidation::Valid
        );
        assert_eq!(
            engine.validate_checksum("b", "incorrect_checksum_123").await.unwrap(),
            ChecksumValidation::Invalid
        );
        assert_eq!(
            engine.validate_checksum("nope", &checksum).await.unwrap(),
            ChecksumValidation::NotFound
        );
    }

    #[tokio::test]
    async fn test_bare_build_blocks_update_and_validation() {
        let engine = engine();
        register(&engine, "a", 1).await;
        engine
            .put_bare_build(Build::new(BuildId::new("b").unwrap(), "2", 2))
            .await
            .unwrap();

        assert!(matches!(
            engine.check_update("a").await,
            Err(EngineError::PackageMissing(id)) if id.as_str() == "b"
        ));
        assert_eq!(
            engine.validate_checksum("b", "00").await.unwrap(),
            ChecksumValidation::NotFound
        );
    }

    #[tokio::test]
    async fn test_delete_build() {
        let engine = engine();
        register(&engine, "a", 1).await;
        register(&engine, "b", 2).await;

        assert!(engine.delete_build("b").await.unwrap());
        assert_eq!(engine.check_update("a").await.unwrap(), UpdateCheck::UpToDate);
        assert!(!engine.delete_build("b").await.unwrap());
    }

    #[tokio::test]
    async fn test_attest_artifact() {
        let engine = engine();
        engine
            .artifacts()
            .insert("ota-nfc.zip", vectors::TEST_PAYLOAD.to_vec())
            .unwrap();

        let a = engine.attest_artifact("ota-nfc.zip").await.unwrap();
        assert_eq!(a.checksum.to_hex(), vectors::TEST_PAYLOAD_CHECKSUM);
        assert!(matches!(
            engine.attest_artifact("missing.zip").await,
            Err(EngineError::ArtifactNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_builds_in_ledger_order() {
        let engine = engine();
        register(&engine, "c", 30).await;
        register(&engine, "a", 10).await;
        register(&engine, "b", 10).await;

        let ids: Vec<String> = engine
            .list_builds()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.build.build_id.into_string())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}

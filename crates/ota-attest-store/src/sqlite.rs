//! SQLite implementation of the Store trait.
//!
//! This is the primary storage backend for OTA Attest. It uses rusqlite with
//! bundled SQLite, wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use ota_attest_core::{Build, BuildId, Checksum, OtaPackage, PackageSignature, Release};

use crate::error::{Result, StoreError};
use crate::migration::{self, now_millis};
use crate::traits::{PutResult, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    /// The SQLite connection, protected by a mutex.
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory SQLite database.
    ///
    /// Useful for testing.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a closure against the connection on the blocking pool.
    async fn run_blocking<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(format!("spawn_blocking failed: {}", e)))?
    }
}

/// Raw column values of a joined build/package row.
struct ReleaseRow {
    seq: i64,
    build_id: String,
    version: String,
    created_at: i64,
    artifact_ref: Option<String>,
    checksum: Option<String>,
    signature: Option<String>,
    patch_notes: Option<String>,
}

const SELECT_RELEASE: &str = "
    SELECT b.seq, b.build_id, b.version, b.created_at,
           p.artifact_ref, p.checksum, p.signature, p.patch_notes
    FROM builds b LEFT JOIN packages p ON p.build_id = b.build_id";

// Helper to read a row into raw values
fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ReleaseRow> {
    Ok(ReleaseRow {
        seq: row.get(0)?,
        build_id: row.get(1)?,
        version: row.get(2)?,
        created_at: row.get(3)?,
        artifact_ref: row.get(4)?,
        checksum: row.get(5)?,
        signature: row.get(6)?,
        patch_notes: row.get(7)?,
    })
}

impl TryFrom<ReleaseRow> for Release {
    type Error = StoreError;

    fn try_from(row: ReleaseRow) -> Result<Self> {
        let build_id =
            BuildId::new(row.build_id).map_err(|e| StoreError::InvalidData(e.to_string()))?;

        let package = match (row.artifact_ref, row.checksum, row.signature) {
            (Some(artifact_ref), Some(checksum), Some(signature)) => Some(OtaPackage {
                artifact_ref,
                checksum: Checksum::from_hex(&checksum)
                    .map_err(|e| StoreError::InvalidData(e.to_string()))?,
                signature: PackageSignature::from_hex(&signature)
                    .map_err(|e| StoreError::InvalidData(e.to_string()))?,
                patch_notes: row.patch_notes.unwrap_or_default(),
            }),
            (None, None, None) => None,
            _ => {
                return Err(StoreError::InvalidData(format!(
                    "partial package row for build {}",
                    build_id
                )))
            }
        };

        Ok(Release {
            seq: row.seq as u64,
            build: Build {
                build_id,
                version: row.version,
                created_at: row.created_at,
            },
            package,
        })
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn put_release(&self, build: &Build, package: Option<&OtaPackage>) -> Result<PutResult> {
        let build = build.clone();
        let package = package.cloned();

        self.run_blocking(move |conn| {
            let now = now_millis();
            let tx = conn.transaction()?;

            let existing: Option<i64> = tx
                .query_row(
                    "SELECT seq FROM builds WHERE build_id = ?1",
                    params![build.build_id.as_str()],
                    |row| row.get(0),
                )
                .optional()?;

            let result = match existing {
                Some(seq) => {
                    tx.execute(
                        "UPDATE builds SET version = ?2, created_at = ?3, updated_at = ?4
                         WHERE build_id = ?1",
                        params![build.build_id.as_str(), build.version, build.created_at, now],
                    )?;
                    PutResult::Replaced { seq: seq as u64 }
                }
                None => {
                    tx.execute(
                        "INSERT INTO builds (build_id, version, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![build.build_id.as_str(), build.version, build.created_at, now],
                    )?;
                    PutResult::Inserted {
                        seq: tx.last_insert_rowid() as u64,
                    }
                }
            };

            match &package {
                Some(pkg) => {
                    // Checksum and signature are written in the same statement.
                    tx.execute(
                        "INSERT OR REPLACE INTO packages
                            (build_id, artifact_ref, checksum, signature, patch_notes, attested_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                        params![
                            build.build_id.as_str(),
                            pkg.artifact_ref,
                            pkg.checksum.to_hex(),
                            pkg.signature.to_hex(),
                            pkg.patch_notes,
                            now,
                        ],
                    )?;
                }
                None => {
                    tx.execute(
                        "DELETE FROM packages WHERE build_id = ?1",
                        params![build.build_id.as_str()],
                    )?;
                }
            }

            tx.commit()?;
            Ok(result)
        })
        .await
    }

    async fn get_release(&self, build_id: &str) -> Result<Option<Release>> {
        let build_id = build_id.to_string();

        self.run_blocking(move |conn| {
            let row = conn
                .query_row(
                    &format!("{} WHERE b.build_id = ?1", SELECT_RELEASE),
                    params![build_id],
                    read_row,
                )
                .optional()?;
            row.map(Release::try_from).transpose()
        })
        .await
    }

    async fn has_build(&self, build_id: &str) -> Result<bool> {
        let build_id = build_id.to_string();

        self.run_blocking(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM builds WHERE build_id = ?1)",
                params![build_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
        .await
    }

    async fn list_releases(&self) -> Result<Vec<Release>> {
        self.run_blocking(|conn| {
            let mut stmt = conn.prepare(&format!("{} ORDER BY b.seq", SELECT_RELEASE))?;
            let rows = stmt
                .query_map([], read_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter().map(Release::try_from).collect()
        })
        .await
    }

    async fn delete_release(&self, build_id: &str) -> Result<bool> {
        let build_id = build_id.to_string();

        self.run_blocking(move |conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM packages WHERE build_id = ?1", params![build_id])?;
            let removed = tx.execute("DELETE FROM builds WHERE build_id = ?1", params![build_id])?;
            tx.commit()?;
            Ok(removed > 0)
        })
        .await
    }
}

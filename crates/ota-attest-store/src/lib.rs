//! # OTA Attest Store
//!
//! Storage abstraction for OTA Attest. Provides trait-based interfaces for
//! release persistence and artifact access, with SQLite, filesystem and
//! in-memory implementations.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for release persistence
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`ArtifactStore`] - Read access to package bytes
//! - [`FsArtifactStore`] - Artifacts as files under a package directory
//! - [`MemoryArtifactStore`] - Artifacts in a map, for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ota_attest_store::{SqliteStore, Store, StoreExt};
//!
//! async fn example() {
//!     let store = SqliteStore::open("ota.db").unwrap();
//!     let ledger = store.load_ledger().await.unwrap();
//!     println!("{} builds", ledger.len());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic publish**: a build and its package are one write
//! - **Stable insertion order**: `seq` survives overwrites and is never reused
//! - **Composition**: deleting a build deletes its package

pub mod artifact;
pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use artifact::FsArtifactStore;
pub use error::{Result, StoreError};
pub use memory::{MemoryArtifactStore, MemoryStore};
pub use sqlite::SqliteStore;
pub use traits::{ArtifactStore, PutResult, Store, StoreExt};

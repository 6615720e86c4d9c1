//! Content-addressed block storage backends.
//!
//! This crate defines the [`Datastore`] capability the engine binds to: a
//! two-method interface over an append-only, content-addressed block store.
//! Blocks are keyed by CID, never mutated in place, and a logical delete is
//! just a dropped reference; backends are free to keep the bytes around.
//!
//! Two reference backends ship here:
//!
//! - [`MemoryDatastore`]: in-memory map, for tests and embedding
//! - [`FsDatastore`]: one file per block under a local directory
//!
//! Implementations must be reentrant-safe: the engine may call `put`/`get`
//! repeatedly within a single logical operation and never assumes caching.
//! No retry policy lives at this layer; transient-failure handling belongs to
//! the backend or the caller.

mod fs;
mod memory;

use bytes::Bytes;
use cid::Cid;

pub use fs::FsDatastore;
pub use memory::MemoryDatastore;

/// Errors surfaced by a [`Datastore`] backend.
#[derive(Debug, thiserror::Error)]
pub enum DatastoreError {
    /// The requested block is not in the store.
    #[error("could not find block: {0}")]
    NotFound(Cid),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Opaque backend failure, propagated as-is.
    #[error("datastore backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

/// Result type alias for datastore operations.
pub type Result<T> = std::result::Result<T, DatastoreError>;

/// An append-only, content-addressed block store.
///
/// `put` takes the CID the engine computed for the block as a hint; the
/// backend returns the authoritative CID (usually the hint, but a backend
/// that assigns its own hash/codec may differ). `get` returns the block
/// bytes or [`DatastoreError::NotFound`].
#[async_trait::async_trait]
pub trait Datastore: Send + Sync + 'static {
    /// Store a block, returning its authoritative CID.
    async fn put(&self, cid: Cid, data: Bytes) -> Result<Cid>;

    /// Retrieve a previously stored block.
    async fn get(&self, cid: &Cid) -> Result<Bytes>;
}

//! Shared test utilities for drive integration tests
#![allow(dead_code)]

use std::sync::Arc;

use thicket::prelude::*;

/// Set up a drive over a fresh in-memory datastore.
///
/// The returned [`MemoryDatastore`] is a handle onto the same block map the
/// drive uses, so tests can reload from it.
pub async fn setup_drive() -> (Drive, Snapshot, MasterKey, MemoryDatastore) {
    init_tracing();
    let store = MemoryDatastore::new();
    let master = MasterKey::generate();
    let (drive, snapshot) = Drive::init(Arc::new(store.clone()), &master, DriveConfig::default())
        .await
        .unwrap();
    (drive, snapshot, master, store)
}

/// A config with a tiny chunk size so chunk boundaries are cheap to hit.
pub fn small_chunk_config() -> DriveConfig {
    DriveConfig {
        chunk_size: 64,
        inline_threshold: 64,
    }
}

/// Set up a drive with the tiny-chunk config.
pub async fn setup_small_chunk_drive() -> (Drive, Snapshot, MasterKey, MemoryDatastore) {
    init_tracing();
    let store = MemoryDatastore::new();
    let master = MasterKey::generate();
    let (drive, snapshot) =
        Drive::init(Arc::new(store.clone()), &master, small_chunk_config())
            .await
            .unwrap();
    (drive, snapshot, master, store)
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init()
        .ok();
}

/// Names from an `ls` result, in listing order.
pub fn names(listings: &[Listing]) -> Vec<&str> {
    listings.iter().map(|l| l.name.as_str()).collect()
}

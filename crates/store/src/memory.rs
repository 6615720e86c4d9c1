use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use cid::Cid;
use parking_lot::RwLock;

use crate::{Datastore, DatastoreError, Result};

/// In-memory block store.
///
/// Cheap to clone; clones share the same underlying map. Useful for tests
/// and for hosts that persist the root CID elsewhere and only need scratch
/// block storage for the lifetime of a process.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatastore {
    blocks: Arc<RwLock<HashMap<Cid, Bytes>>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blocks currently held.
    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}

#[async_trait::async_trait]
impl Datastore for MemoryDatastore {
    async fn put(&self, cid: Cid, data: Bytes) -> Result<Cid> {
        self.blocks.write().entry(cid).or_insert(data);
        Ok(cid)
    }

    async fn get(&self, cid: &Cid) -> Result<Bytes> {
        self.blocks
            .read()
            .get(cid)
            .cloned()
            .ok_or(DatastoreError::NotFound(*cid))
    }
}

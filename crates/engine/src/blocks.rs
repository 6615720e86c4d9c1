use std::sync::Arc;

use bytes::Bytes;
use cid::Cid;

use store::{Datastore, DatastoreError};

use crate::linked_data::{
    compute_cid, verify_cid, BlockEncoded, CodecError, DagCborCodec,
};

/// Verified block I/O over a [`Datastore`].
///
/// This is the engine's only route to the backing store. Writes compute the
/// block's CID before handing it to the datastore (the datastore may still
/// return a different authoritative CID); reads re-hash the returned bytes
/// against the requested CID and fail on mismatch, so a corrupt or lying
/// store is caught before any decryption is attempted.
#[derive(Clone)]
pub struct BlockStore {
    inner: Arc<dyn Datastore>,
}

impl std::fmt::Debug for BlockStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockStore").finish_non_exhaustive()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BlockStoreError {
    #[error("datastore error: {0}")]
    Datastore(#[from] DatastoreError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl BlockStore {
    pub fn new(store: Arc<dyn Datastore>) -> Self {
        Self { inner: store }
    }

    /// Wrap a concrete datastore.
    pub fn wrap(store: impl Datastore) -> Self {
        Self::new(Arc::new(store))
    }

    /// Store a block under the given codec tag, returning its CID.
    pub async fn put_block(&self, codec: u64, data: Bytes) -> Result<Cid, BlockStoreError> {
        let cid = compute_cid(codec, &data);
        let stored = self.inner.put(cid, data).await?;
        tracing::trace!(%stored, "put block");
        Ok(stored)
    }

    /// Fetch a block and verify its bytes hash to `cid`.
    pub async fn get_block(&self, cid: &Cid) -> Result<Bytes, BlockStoreError> {
        let data = self.inner.get(cid).await?;
        tracing::trace!(%cid, len = data.len(), "got block");
        verify_cid(cid, &data)?;
        Ok(data)
    }

    /// Encode a value as DAG-CBOR and store it as a block.
    pub async fn put_cbor<T: BlockEncoded<DagCborCodec>>(
        &self,
        value: &T,
    ) -> Result<Cid, BlockStoreError> {
        let data = value.encode()?;
        self.put_block(T::codec(), data.into()).await
    }

    /// Fetch a verified block and decode it as DAG-CBOR.
    pub async fn get_cbor<T: BlockEncoded<DagCborCodec>>(
        &self,
        cid: &Cid,
    ) -> Result<T, BlockStoreError> {
        let data = self.get_block(cid).await?;
        Ok(T::decode(&data)?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::linked_data::LD_RAW_CODEC;
    use store::MemoryDatastore;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let blocks = BlockStore::wrap(MemoryDatastore::new());

        let data = Bytes::from_static(b"raw block bytes");
        let cid = blocks.put_block(LD_RAW_CODEC, data.clone()).await.unwrap();
        assert_eq!(blocks.get_block(&cid).await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_corrupt_store_fails_integrity() {
        // A store that returns the wrong bytes for every get.
        struct LyingStore(MemoryDatastore);

        #[async_trait::async_trait]
        impl Datastore for LyingStore {
            async fn put(&self, cid: Cid, data: Bytes) -> store::Result<Cid> {
                self.0.put(cid, data).await
            }
            async fn get(&self, _cid: &Cid) -> store::Result<Bytes> {
                Ok(Bytes::from_static(b"not what you stored"))
            }
        }

        let blocks = BlockStore::wrap(LyingStore(MemoryDatastore::new()));
        let cid = blocks
            .put_block(LD_RAW_CODEC, Bytes::from_static(b"real bytes"))
            .await
            .unwrap();

        let err = blocks.get_block(&cid).await.unwrap_err();
        assert!(matches!(
            err,
            BlockStoreError::Codec(CodecError::Integrity(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_block_propagates_not_found() {
        let blocks = BlockStore::wrap(MemoryDatastore::new());
        let cid = compute_cid(LD_RAW_CODEC, b"never stored");

        let err = blocks.get_block(&cid).await.unwrap_err();
        assert!(matches!(
            err,
            BlockStoreError::Datastore(DatastoreError::NotFound(_))
        ));
    }
}

use std::collections::BTreeMap;

use cid::Cid;
use serde::{Deserialize, Serialize};

use crate::blocks::{BlockStore, BlockStoreError};
use crate::crypto::{NameHash, RevisionKey, SecretError};
use crate::linked_data::{BlockEncoded, CodecError, DagCborCodec, LD_RAW_CODEC};

use super::merge::MergeStrategy;
use super::private_ref::PrivateRef;

#[derive(Debug, thiserror::Error)]
pub enum ForestError {
    #[error("could not find forest entry for name {0}")]
    NotFound(String),
    #[error("block store error: {0}")]
    Blocks(#[from] BlockStoreError),
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
    #[error("secret error: {0}")]
    Secret(#[from] SecretError),
}

/// The encrypted multi-map from saturated name hashes to node block CIDs.
///
/// Keys are hex-encoded saturated names (string keys keep the map DAG-CBOR
/// clean); values are sorted CID lists. More than one CID under a name means
/// concurrent revisions, e.g. two writers that raced; reads resolve the
/// byte-wise lowest so every reader picks the same winner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PrivateForest {
    entries: BTreeMap<String, Vec<Cid>>,
}

impl BlockEncoded<DagCborCodec> for PrivateForest {}

impl PrivateForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of saturated names with at least one entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &NameHash) -> bool {
        self.entries.contains_key(&name.to_hex())
    }

    /// Record a node block under a saturated name. Sorted insert, no
    /// duplicates; existing entries are never displaced.
    pub fn add(&mut self, name: NameHash, cid: Cid) {
        let cids = self.entries.entry(name.to_hex()).or_default();
        if let Err(pos) = cids.binary_search(&cid) {
            cids.insert(pos, cid);
        }
    }

    /// The deterministic winner among the entries under a name: the
    /// byte-wise smallest CID.
    pub fn resolve_lowest(&self, name: &NameHash) -> Option<&Cid> {
        self.entries.get(&name.to_hex()).and_then(|cids| cids.first())
    }

    /// Seal a node's plaintext under its ref and record it in the forest.
    /// Returns the CID of the stored block.
    pub async fn put(
        &mut self,
        private_ref: &PrivateRef,
        plaintext: &[u8],
        blocks: &BlockStore,
    ) -> Result<Cid, ForestError> {
        let sealed = private_ref.content_key.encrypt(plaintext)?;
        let cid = blocks.put_block(LD_RAW_CODEC, sealed.into()).await?;
        self.add(private_ref.saturated_name(), cid);
        Ok(cid)
    }

    /// Fetch and open the node a ref points at.
    pub async fn get(
        &self,
        private_ref: &PrivateRef,
        blocks: &BlockStore,
    ) -> Result<Vec<u8>, ForestError> {
        let name = private_ref.saturated_name();
        let cid = self
            .resolve_lowest(&name)
            .ok_or_else(|| ForestError::NotFound(name.to_hex()))?;
        let sealed = blocks.get_block(cid).await?;
        Ok(private_ref.content_key.decrypt(&sealed)?)
    }

    /// Follow a node's ratchet forward from `revision` and return the ref of
    /// the newest revision present in this forest, or `None` if even the
    /// starting revision is absent.
    ///
    /// This is the reload path: the caller derives the root's revision zero
    /// from the master key and this walk lands on the current root.
    pub fn seek_latest(&self, name: &NameHash, revision: RevisionKey) -> Option<PrivateRef> {
        if !self.contains(&revision.saturate(name)) {
            return None;
        }
        let mut current = revision;
        loop {
            let next = current.ratchet();
            if !self.contains(&next.saturate(name)) {
                break;
            }
            current = next;
        }
        Some(PrivateRef::with_revision(*name, current))
    }

    /// Combine two forests entry-by-entry using the given strategy.
    ///
    /// With [`UnionMerge`](super::UnionMerge) this keeps every revision from
    /// both sides, which is how two divergent roots are made to coexist
    /// until something reads them back.
    pub fn merge(&self, other: &Self, strategy: &impl MergeStrategy) -> Self {
        let mut entries = BTreeMap::new();
        let empty: &[Cid] = &[];
        for name in self.entries.keys().chain(other.entries.keys()) {
            if entries.contains_key(name) {
                continue;
            }
            let ours = self.entries.get(name).map_or(empty, Vec::as_slice);
            let theirs = other.entries.get(name).map_or(empty, Vec::as_slice);
            let merged = strategy.resolve(name, ours, theirs);
            if !merged.is_empty() {
                entries.insert(name.clone(), merged);
            }
        }
        Self { entries }
    }

    /// Serialize this forest as a DAG-CBOR block; the returned CID is the
    /// root CID for the filesystem state it captures.
    pub async fn store(&self, blocks: &BlockStore) -> Result<Cid, ForestError> {
        let cid = blocks.put_cbor(self).await?;
        tracing::debug!(%cid, entries = self.len(), "stored forest");
        Ok(cid)
    }

    /// Load a forest from its root CID.
    pub async fn load(cid: &Cid, blocks: &BlockStore) -> Result<Self, ForestError> {
        Ok(blocks.get_cbor(cid).await?)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::MasterKey;
    use crate::forest::UnionMerge;
    use crate::linked_data::compute_cid;
    use store::MemoryDatastore;

    fn cid_of(data: &[u8]) -> Cid {
        compute_cid(LD_RAW_CODEC, data)
    }

    #[test]
    fn test_add_is_sorted_and_deduped() {
        let mut forest = PrivateForest::new();
        let name = NameHash::generate();
        let (a, b) = (cid_of(b"a"), cid_of(b"b"));

        forest.add(name, b);
        forest.add(name, a);
        forest.add(name, b);

        let lowest = *forest.resolve_lowest(&name).unwrap();
        assert_eq!(lowest, a.min(b));
        assert_eq!(forest.len(), 1);
    }

    #[test]
    fn test_merge_unions_entries() {
        let name = NameHash::generate();
        let other_name = NameHash::generate();

        let mut a = PrivateForest::new();
        a.add(name, cid_of(b"one"));
        let mut b = PrivateForest::new();
        b.add(name, cid_of(b"two"));
        b.add(other_name, cid_of(b"three"));

        let merged = a.merge(&b, &UnionMerge);
        assert_eq!(merged.len(), 2);
        // Merge order does not matter.
        assert_eq!(merged, b.merge(&a, &UnionMerge));
    }

    #[test]
    fn test_seek_latest_follows_ratchet() {
        let master = MasterKey::generate();
        let name = NameHash::root(&master);
        let r0 = RevisionKey::root(&master);
        let r1 = r0.ratchet();
        let r2 = r1.ratchet();

        let mut forest = PrivateForest::new();
        for rev in [&r0, &r1, &r2] {
            forest.add(rev.saturate(&name), cid_of(rev.bytes()));
        }

        let latest = forest.seek_latest(&name, r0).unwrap();
        assert_eq!(latest.revision_key, r2);

        let missing = NameHash::generate();
        assert!(forest.seek_latest(&missing, r0).is_none());
    }

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let blocks = BlockStore::wrap(MemoryDatastore::new());
        let mut forest = PrivateForest::new();
        let private_ref = PrivateRef::generate();

        forest
            .put(&private_ref, b"node plaintext", &blocks)
            .await
            .unwrap();
        let plaintext = forest.get(&private_ref, &blocks).await.unwrap();
        assert_eq!(plaintext, b"node plaintext");
    }

    #[tokio::test]
    async fn test_get_missing_ref_is_not_found() {
        let blocks = BlockStore::wrap(MemoryDatastore::new());
        let forest = PrivateForest::new();

        let err = forest
            .get(&PrivateRef::generate(), &blocks)
            .await
            .unwrap_err();
        assert!(matches!(err, ForestError::NotFound(_)));
        assert!(err.to_string().contains("find"));
    }

    #[tokio::test]
    async fn test_store_load_roundtrip() {
        let blocks = BlockStore::wrap(MemoryDatastore::new());
        let mut forest = PrivateForest::new();
        let private_ref = PrivateRef::generate();
        forest.put(&private_ref, b"persisted", &blocks).await.unwrap();

        let cid = forest.store(&blocks).await.unwrap();
        let loaded = PrivateForest::load(&cid, &blocks).await.unwrap();
        assert_eq!(loaded, forest);
        assert_eq!(loaded.get(&private_ref, &blocks).await.unwrap(), b"persisted");
    }
}

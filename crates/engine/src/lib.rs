/**
 * Verified block I/O over a pluggable Datastore.
 * Computes CIDs on write, re-checks digests on read.
 */
pub mod blocks;
/**
 * Cryptographic primitives.
 *  - Per-item content encryption (ChaCha20-Poly1305)
 *  - The BLAKE3 key schedule: master key, revision ratchet,
 *    name saturation
 */
pub mod crypto;
/**
 * The private forest: the encrypted multi-map from saturated
 * name hashes to node blocks, and the PrivateRef capability.
 * Its serialized block's CID is the root CID callers hold.
 */
pub mod forest;
/**
 * The logical tree and operation surface: directories, files,
 * path resolution, streaming content, the Drive.
 */
pub mod fs;
/**
 * Content addressing: CID computation and verification, block
 * codec tags, DAG-CBOR encode/decode.
 */
pub mod linked_data;

pub mod prelude {
    pub use crate::blocks::BlockStore;
    pub use crate::crypto::{MasterKey, Secret};
    pub use crate::forest::{MergeStrategy, PrivateForest, PrivateRef, UnionMerge};
    pub use crate::fs::{Drive, DriveConfig, DriveError, Listing, Snapshot};
    pub use cid::Cid;
    pub use store::{Datastore, DatastoreError, FsDatastore, MemoryDatastore};
}

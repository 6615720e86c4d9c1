/**
 * Content addressing and block codecs.
 *
 * Every block the engine writes is addressed by a CIDv1: a BLAKE3-256
 * multihash over the block bytes plus a codec tag recording how to
 * interpret them. Encrypted blocks (nodes, file chunks) are tagged raw;
 * the forest block is tagged DAG-CBOR.
 *
 * Reads back through this layer re-hash the bytes and compare against the
 * requested CID. This is the engine's only defense against a corrupted or
 * tampered store, since blocks are content- rather than location-addressed.
 */
mod block;
mod link;

use cid::Cid;

pub use block::{BlockCodec, BlockEncoded, DagCborCodec};
pub use link::{compute_cid, verify_cid};

/// Codec tag for opaque byte blocks (encrypted nodes, file chunks).
pub const LD_RAW_CODEC: u64 = 0x55;
/// Codec tag for DAG-CBOR blocks (the serialized forest).
pub const LD_DAG_CBOR_CODEC: u64 = 0x71;
/// Multihash code for BLAKE3-256.
pub const LD_BLAKE3_CODE: u64 = 0x1e;

/// Errors from encoding, decoding, or verifying blocks.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("encode error: {0}")]
    Encode(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("integrity check failed for {0}: block digest mismatch")]
    Integrity(Cid),
    #[error("unsupported multihash code {0:#x}")]
    UnsupportedHash(u64),
    #[error("invalid cid: {0}")]
    Cid(#[from] cid::Error),
}

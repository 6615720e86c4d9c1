use cid::Cid;
use multihash::Multihash;

use super::{CodecError, LD_BLAKE3_CODE};

/// Compute the CIDv1 for a block: BLAKE3-256 over the bytes, tagged with the
/// given codec.
pub fn compute_cid(codec: u64, data: &[u8]) -> Cid {
    let digest = blake3::hash(data);
    let hash = Multihash::<64>::wrap(LD_BLAKE3_CODE, digest.as_bytes())
        .expect("32-byte digest fits multihash");
    Cid::new_v1(codec, hash)
}

/// Verify that `data` hashes to `cid`.
///
/// Blocks are content-addressed, so this is the read-side integrity check:
/// a store returning the wrong bytes for a CID fails here, not deeper in
/// decryption.
pub fn verify_cid(cid: &Cid, data: &[u8]) -> Result<(), CodecError> {
    let hash = cid.hash();
    if hash.code() != LD_BLAKE3_CODE {
        return Err(CodecError::UnsupportedHash(hash.code()));
    }
    let digest = blake3::hash(data);
    if hash.digest() != digest.as_bytes() {
        return Err(CodecError::Integrity(*cid));
    }
    Ok(())
}

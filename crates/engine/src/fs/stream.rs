use std::io::{ErrorKind, Read, Write};

use cid::Cid;

use crate::blocks::BlockStore;
use crate::crypto::Secret;
use crate::linked_data::LD_RAW_CODEC;

use super::drive::DriveError;

/// Consume a reader chunk by chunk, sealing each chunk under `key` and
/// storing it as its own raw block. Returns the total plaintext size and
/// the ordered chunk CIDs.
///
/// At most one chunk of plaintext is held in memory at a time, which is
/// the whole point of this path: peak memory is O(chunk_size) no matter
/// how large the source is.
pub(crate) async fn store_chunks<R: Read>(
    reader: &mut R,
    key: &Secret,
    chunk_size: usize,
    blocks: &BlockStore,
) -> Result<(u64, Vec<Cid>), DriveError> {
    let mut chunks = Vec::new();
    let mut total = 0u64;
    let mut buf = vec![0u8; chunk_size];

    loop {
        let filled = fill_chunk(reader, &mut buf)?;
        if filled == 0 {
            break;
        }
        let sealed = key.encrypt(&buf[..filled])?;
        let cid = blocks.put_block(LD_RAW_CODEC, sealed.into()).await?;
        chunks.push(cid);
        total += filled as u64;
        if filled < chunk_size {
            // Short read past a full fill means the source is drained.
            break;
        }
    }

    tracing::debug!(chunks = chunks.len(), total, "stored chunked content");
    Ok((total, chunks))
}

/// Fetch, verify and open each chunk in order, writing plaintext through.
/// Returns the number of plaintext bytes written.
pub(crate) async fn load_chunks<W: Write>(
    writer: &mut W,
    key: &Secret,
    chunks: &[Cid],
    blocks: &BlockStore,
) -> Result<u64, DriveError> {
    let mut total = 0u64;
    for cid in chunks {
        let sealed = blocks.get_block(cid).await?;
        let plaintext = key.decrypt(&sealed)?;
        writer.write_all(&plaintext)?;
        total += plaintext.len() as u64;
    }
    Ok(total)
}

/// Read until `buf` is full or the reader is drained.
fn fill_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}

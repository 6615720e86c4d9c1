use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{CodecError, LD_DAG_CBOR_CODEC};

/// A block serialization codec.
pub trait BlockCodec {
    /// The multicodec tag recorded in CIDs for blocks in this codec.
    const CODE: u64;

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError>;
    fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, CodecError>;
}

/// DAG-CBOR, the codec for all structured blocks.
pub struct DagCborCodec;

impl BlockCodec for DagCborCodec {
    const CODE: u64 = LD_DAG_CBOR_CODEC;

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
        serde_ipld_dagcbor::to_vec(value).map_err(|err| CodecError::Encode(err.to_string()))
    }

    fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, CodecError> {
        serde_ipld_dagcbor::from_slice(data).map_err(|err| CodecError::Decode(err.to_string()))
    }
}

/// Marker trait giving a serde type block encode/decode through a codec.
///
/// Implemented as `impl BlockEncoded<DagCborCodec> for MyType {}`.
pub trait BlockEncoded<C: BlockCodec>: Serialize + DeserializeOwned {
    fn encode(&self) -> Result<Vec<u8>, CodecError> {
        C::encode(self)
    }

    fn decode(data: &[u8]) -> Result<Self, CodecError> {
        C::decode(data)
    }

    /// The codec tag blocks of this type carry in their CID.
    fn codec() -> u64 {
        C::CODE
    }
}

/**
 * The private forest: the encrypted multi-map anchoring a filesystem.
 *
 * The forest maps saturated name hashes to encrypted node blocks. It is
 * itself serialized as a DAG-CBOR block whose CID is the "root CID" handed
 * back to callers after every mutation. Holding the root CID alone reveals
 * only how many entries exist; reading anything requires a [`PrivateRef`].
 *
 * Forests are persistent values: operations never rewrite stored blocks,
 * they compose new entries into a fresh forest serialization.
 */
mod merge;
mod private_ref;
#[allow(clippy::module_inception)]
mod forest;

pub use forest::{ForestError, PrivateForest};
pub use merge::{MergeStrategy, UnionMerge};
pub use private_ref::PrivateRef;

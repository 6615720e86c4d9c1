/**
 * The logical filesystem: nodes, path resolution, and the drive.
 *
 * A [`Drive`] binds a forest, a root ref, and a block store into the
 * path-based operation surface (mkdir/ls/write/read/mv/cp/rm). Directory
 * nodes carry their children's refs inside their own encrypted block, so
 * walking a path is a chain of decrypt-then-descend hops starting at the
 * root, and committing a mutation re-seals the walked chain bottom-up.
 */
mod drive;
mod node;
mod path;
mod stream;

pub use drive::{
    Drive, DriveConfig, DriveError, Listing, Snapshot, CHUNK_SIZE,
};
pub use node::{FileContent, Metadata, NodeLink, PrivateDirectory, PrivateFile, PrivateNode};
pub use path::parse_path;

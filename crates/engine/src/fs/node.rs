use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cid::Cid;
use serde::{Deserialize, Serialize};

use crate::crypto::Secret;
use crate::forest::PrivateRef;
use crate::linked_data::{BlockEncoded, DagCborCodec};

/**
 * Nodes
 * =====
 * Nodes are the building blocks of the logical tree. A directory is a map
 * of child names to links; a link carries the child's PrivateRef, so the
 * capability to reach a subtree travels inside its parent's encrypted
 * block and nowhere else. A file holds its content inline or as an ordered
 * list of encrypted chunk blocks.
 *
 * Nodes are DAG-CBOR encoded, then sealed with the node's content key
 * before they ever touch the store.
 */

/// Creation/modification timestamps carried by every node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Metadata {
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created: now,
            modified: now,
        }
    }

    /// Fresh modification time over a preserved creation time.
    pub fn with_created(created: DateTime<Utc>) -> Self {
        Self {
            created,
            modified: Utc::now(),
        }
    }

    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }
}

/// A directory entry: the child's kind plus the ref that locates and
/// decrypts it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeLink {
    Dir(PrivateRef),
    File(PrivateRef),
}

impl NodeLink {
    pub fn private_ref(&self) -> &PrivateRef {
        match self {
            NodeLink::Dir(private_ref) => private_ref,
            NodeLink::File(private_ref) => private_ref,
        }
    }

    /// The same kind of link pointed at a different ref.
    pub fn with_ref(&self, private_ref: PrivateRef) -> Self {
        match self {
            NodeLink::Dir(_) => NodeLink::Dir(private_ref),
            NodeLink::File(_) => NodeLink::File(private_ref),
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, NodeLink::Dir(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, NodeLink::File(_))
    }
}

/// A directory: named links to children. A node has exactly one logical
/// parent; there are no hard links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateDirectory {
    pub metadata: Metadata,
    children: BTreeMap<String, NodeLink>,
}

impl Default for PrivateDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl PrivateDirectory {
    pub fn new() -> Self {
        Self {
            metadata: Metadata::now(),
            children: BTreeMap::new(),
        }
    }

    pub fn get_link(&self, name: &str) -> Option<&NodeLink> {
        self.children.get(name)
    }

    pub fn insert(&mut self, name: String, link: NodeLink) -> Option<NodeLink> {
        self.children.insert(name, link)
    }

    pub fn remove(&mut self, name: &str) -> Option<NodeLink> {
        self.children.remove(name)
    }

    pub fn links(&self) -> &BTreeMap<String, NodeLink> {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// File content, inline for small files or chunked for streamed content.
///
/// Chunks are sealed with the `key` carried here, one block per chunk, so
/// re-keying a file node (e.g. for a copy) does not require re-encrypting
/// its content: the chunk key rides inside the node and the chunk blocks
/// are immutable and shareable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FileContent {
    Inline(Vec<u8>),
    Chunked {
        size: u64,
        chunk_size: u32,
        key: Secret,
        chunks: Vec<Cid>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateFile {
    pub metadata: Metadata,
    pub content: FileContent,
}

impl PrivateFile {
    pub fn size(&self) -> u64 {
        match &self.content {
            FileContent::Inline(bytes) => bytes.len() as u64,
            FileContent::Chunked { size, .. } => *size,
        }
    }
}

/// Any node in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrivateNode {
    Dir(PrivateDirectory),
    File(PrivateFile),
}

impl BlockEncoded<DagCborCodec> for PrivateNode {}

impl PrivateNode {
    pub fn metadata(&self) -> &Metadata {
        match self {
            PrivateNode::Dir(dir) => &dir.metadata,
            PrivateNode::File(file) => &file.metadata,
        }
    }

    pub fn as_dir(&self) -> Option<&PrivateDirectory> {
        match self {
            PrivateNode::Dir(dir) => Some(dir),
            PrivateNode::File(_) => None,
        }
    }

    pub fn into_dir(self) -> Option<PrivateDirectory> {
        match self {
            PrivateNode::Dir(dir) => Some(dir),
            PrivateNode::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<PrivateFile> {
        match self {
            PrivateNode::Dir(_) => None,
            PrivateNode::File(file) => Some(file),
        }
    }
}

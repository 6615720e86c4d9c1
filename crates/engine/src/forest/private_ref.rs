use serde::{Deserialize, Serialize};

use crate::crypto::{KeyError, MasterKey, NameHash, RevisionKey, Secret};

/// The capability to locate and decrypt one node.
///
/// Three fixed-length byte arrays: the node's stable name hash, the content
/// key sealing the current revision's block, and the revision key the
/// content key was derived from. Owning a ref is necessary and sufficient
/// to read the node and, through it, every descendant (directories carry
/// their children's refs inside their own encrypted block).
///
/// Serializable to JSON for transport across a host boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateRef {
    pub name_hash: NameHash,
    pub content_key: Secret,
    pub revision_key: RevisionKey,
}

impl PrivateRef {
    fn from_parts(name_hash: NameHash, revision_key: RevisionKey) -> Self {
        Self {
            name_hash,
            content_key: revision_key.content_key(),
            revision_key,
        }
    }

    /// The root directory's revision-zero ref, a pure function of the
    /// master key. Reloading a filesystem starts here.
    pub fn root(master: &MasterKey) -> Self {
        Self::from_parts(NameHash::root(master), RevisionKey::root(master))
    }

    /// A fresh ref for a newly created node. Name hash and revision key are
    /// both random, so sibling refs are unlinkable even if one leaks.
    pub fn generate() -> Self {
        Self::from_parts(NameHash::generate(), RevisionKey::generate())
    }

    /// Rebuild a ref at a specific revision of a known name.
    pub fn with_revision(name_hash: NameHash, revision_key: RevisionKey) -> Self {
        Self::from_parts(name_hash, revision_key)
    }

    /// The ref for this node's next revision: same name, ratcheted keys.
    pub fn advance(&self) -> Self {
        Self::from_parts(self.name_hash, self.revision_key.ratchet())
    }

    /// The blinded name this revision is filed under in the forest.
    pub fn saturated_name(&self) -> NameHash {
        self.revision_key.saturate(&self.name_hash)
    }

    pub fn to_json(&self) -> Result<String, KeyError> {
        serde_json::to_string(self).map_err(|err| KeyError::MalformedRef(err.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, KeyError> {
        serde_json::from_str(json).map_err(|err| KeyError::MalformedRef(err.to_string()))
    }
}

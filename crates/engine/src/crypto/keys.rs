use std::ops::Deref;

use serde::{Deserialize, Serialize};

use super::secret::Secret;

/// Size of every key and hash in the schedule (256 bits)
pub const KEY_SIZE: usize = 32;

// BLAKE3 derive_key contexts. Fixed for the lifetime of the on-disk format;
// changing any of these orphans every existing forest.
const MASTER_CONTEXT: &str = "thicket 2024-11-04 master key";
const ROOT_NAME_CONTEXT: &str = "thicket 2024-11-04 root name hash";
const ROOT_REVISION_CONTEXT: &str = "thicket 2024-11-04 root revision zero";
const RATCHET_CONTEXT: &str = "thicket 2024-11-04 revision ratchet";
const CONTENT_KEY_CONTEXT: &str = "thicket 2024-11-04 content key";

/// Errors from key material handling
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("invalid master key size, expected {expected}, got {got}")]
    InvalidMasterKey { expected: usize, got: usize },
    #[error("malformed private ref: {0}")]
    MalformedRef(String),
}

/// The caller-supplied root secret (e.g. a passphrase hash).
///
/// Everything about the root directory is derived deterministically from
/// this key, so a caller holding it plus the latest root CID can reload the
/// whole filesystem without having persisted anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterKey([u8; KEY_SIZE]);

impl From<[u8; KEY_SIZE]> for MasterKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        MasterKey(bytes)
    }
}

impl MasterKey {
    /// Accept caller-provided key material of exactly [`KEY_SIZE`] bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, KeyError> {
        if data.len() != KEY_SIZE {
            return Err(KeyError::InvalidMasterKey {
                expected: KEY_SIZE,
                got: data.len(),
            });
        }
        let mut buff = [0; KEY_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Derive a master key from a passphrase.
    ///
    /// Callers with an existing key-stretching step should feed its output to
    /// [`MasterKey::from_slice`] instead.
    pub fn from_passphrase(passphrase: &str) -> Self {
        MasterKey(blake3::derive_key(MASTER_CONTEXT, passphrase.as_bytes()))
    }

    /// Generate a random master key.
    pub fn generate() -> Self {
        let mut buff = [0; KEY_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        MasterKey(buff)
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

/// The stable, secret identifier of a node ("inumber").
///
/// Never stored in the forest directly; it is blinded through
/// [`RevisionKey::saturate`] first, so entries for different revisions of
/// the same node are unlinkable to anyone not holding a revision key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameHash([u8; KEY_SIZE]);

impl Deref for NameHash {
    type Target = [u8; KEY_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; KEY_SIZE]> for NameHash {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        NameHash(bytes)
    }
}

impl NameHash {
    /// The root directory's name hash, a pure function of the master key.
    pub fn root(master: &MasterKey) -> Self {
        NameHash(blake3::derive_key(ROOT_NAME_CONTEXT, master.bytes()))
    }

    /// Fresh random name hash for a newly created child node.
    pub fn generate() -> Self {
        let mut buff = [0; KEY_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        NameHash(buff)
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

/// A node's revision key.
///
/// Ratcheting is one-way: revision N+1 is derived from revision N with a
/// keyed BLAKE3 step, so a reader holding revision N can follow the node
/// forward but a leaked future key never exposes the past, and an attacker
/// cannot walk backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionKey([u8; KEY_SIZE]);

impl From<[u8; KEY_SIZE]> for RevisionKey {
    fn from(bytes: [u8; KEY_SIZE]) -> Self {
        RevisionKey(bytes)
    }
}

impl RevisionKey {
    /// The root directory's revision-zero key, a pure function of the
    /// master key.
    pub fn root(master: &MasterKey) -> Self {
        RevisionKey(blake3::derive_key(ROOT_REVISION_CONTEXT, master.bytes()))
    }

    /// Fresh random revision key for a newly created child node.
    pub fn generate() -> Self {
        let mut buff = [0; KEY_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        RevisionKey(buff)
    }

    /// One ratchet step forward.
    pub fn ratchet(&self) -> Self {
        RevisionKey(blake3::derive_key(RATCHET_CONTEXT, &self.0))
    }

    /// The content key that seals this revision's node block.
    pub fn content_key(&self) -> Secret {
        blake3::derive_key(CONTENT_KEY_CONTEXT, &self.0).into()
    }

    /// Blind a name hash for this revision: the saturated name the forest
    /// files the node under. Different revisions of the same node land
    /// under different saturated names.
    pub fn saturate(&self, name: &NameHash) -> NameHash {
        NameHash(*blake3::keyed_hash(&self.0, &**name).as_bytes())
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }
}

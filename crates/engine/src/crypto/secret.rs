use std::ops::Deref;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use serde::{Deserialize, Serialize};

/// Size of a ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of a content key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;
/// Size of the BLAKE3 plaintext hash carried inside the envelope
const PLAINTEXT_HASH_SIZE: usize = 32;

/// Errors that can occur during encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("invalid secret size, expected {expected}, got {got}")]
    InvalidSize { expected: usize, got: usize },
    #[error("ciphertext too short")]
    TooShort,
    #[error("authentication failed")]
    Aead,
    #[error("plaintext hash mismatch, block corrupted")]
    Corrupted,
}

/// A 256-bit symmetric key used to encrypt a single item.
///
/// Every node and every content version gets its own `Secret`. The sealed
/// format is `nonce (12) || aead(blake3(plaintext) || plaintext)`: the
/// plaintext hash rides inside the AEAD envelope and is re-checked on open,
/// on top of the Poly1305 tag.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct Secret([u8; SECRET_SIZE]);

impl Deref for Secret {
    type Target = [u8; SECRET_SIZE];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Secret {
    /// Generate a new random secret from the system RNG.
    pub fn generate() -> Self {
        let mut buff = [0; SECRET_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Create a secret from a byte slice of exactly [`SECRET_SIZE`] bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SECRET_SIZE {
            return Err(SecretError::InvalidSize {
                expected: SECRET_SIZE,
                got: data.len(),
            });
        }
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Seal plaintext under this key.
    ///
    /// A fresh random nonce is drawn per call, so sealing the same plaintext
    /// twice yields different blocks (and different CIDs).
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>, SecretError> {
        let plaintext_hash = blake3::hash(data);

        let mut envelope = Vec::with_capacity(PLAINTEXT_HASH_SIZE + data.len());
        envelope.extend_from_slice(plaintext_hash.as_bytes());
        envelope.extend_from_slice(data);

        let cipher = ChaCha20Poly1305::new(Key::from_slice(self.bytes()));

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes).expect("failed to generate nonce");
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, envelope.as_ref())
            .map_err(|_| SecretError::Aead)?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(nonce.as_ref());
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Open a sealed block, returning the plaintext.
    ///
    /// Fails if the block is truncated, the Poly1305 tag does not verify
    /// (wrong key or tampering), or the inner plaintext hash does not match.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, SecretError> {
        if data.len() < NONCE_SIZE {
            return Err(SecretError::TooShort);
        }

        let cipher = ChaCha20Poly1305::new(Key::from_slice(self.bytes()));
        let nonce = Nonce::from_slice(&data[..NONCE_SIZE]);
        let envelope = cipher
            .decrypt(nonce, &data[NONCE_SIZE..])
            .map_err(|_| SecretError::Aead)?;

        if envelope.len() < PLAINTEXT_HASH_SIZE {
            return Err(SecretError::TooShort);
        }
        let (stored_hash, plaintext) = envelope.split_at(PLAINTEXT_HASH_SIZE);

        if stored_hash != blake3::hash(plaintext).as_bytes() {
            return Err(SecretError::Corrupted);
        }

        Ok(plaintext.to_vec())
    }
}

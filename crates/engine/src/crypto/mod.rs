/**
 * Cryptographic primitives for the engine.
 *
 * - Content encryption: ChaCha20-Poly1305 with a per-node/per-content
 *   `Secret`, so compromising one key never exposes sibling items
 * - Key schedule: all derivation is BLAKE3 (`derive_key` with fixed
 *   context strings, `keyed_hash` for name saturation)
 * - Revision ratchet: each node revision's key is derived from the
 *   previous one, never the reverse, so holding an old revision key does
 *   not reveal future revisions
 *
 * The root of the schedule is a caller-supplied [`MasterKey`]; everything
 * about the root directory (its name hash, its revision-zero key) is a pure
 * function of it, which is what makes reloading a filesystem from just the
 * master key and a root CID possible.
 */
mod keys;
mod secret;

pub use keys::{KeyError, MasterKey, NameHash, RevisionKey, KEY_SIZE};
pub use secret::{Secret, SecretError, NONCE_SIZE, SECRET_SIZE};

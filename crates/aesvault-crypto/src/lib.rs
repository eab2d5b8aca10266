//! aesvault-crypto: AES-256-CBC buffer encryption and integrity-checked files
//!
//! Layering, leaves first:
//! ```text
//! secret  64-byte Secret → (CipherKey = bytes 0..32, Iv = bytes 32..48)
//! cipher  streaming AES-256-CBC Encoder/Decoder with PKCS#7 padding
//! codec   one-shot encrypt/decrypt of whole buffers
//! store   seal/unseal (SHA-512 checksum ‖ plaintext, encrypted) and save/load to files
//! ```
//!
//! The IV is derived from the secret, not generated per message, so the same
//! plaintext under the same secret always yields the same ciphertext.

pub mod cipher;
pub mod codec;
pub mod secret;
pub mod store;

pub use cipher::{Decoder, Encoder};
pub use codec::{decrypt, decrypt_with, encrypt, encrypt_with};
pub use secret::{derive_key_iv, CipherKey, Iv, Secret};
pub use store::{checksum, load, save, seal, unseal, FileStore};

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of a CBC initialization vector
pub const IV_SIZE: usize = 16;

/// Size of a caller-supplied secret (one SHA-512 digest)
pub const SECRET_SIZE: usize = 64;

/// Size of the embedded plaintext checksum (SHA-512)
pub const CHECKSUM_SIZE: usize = 64;

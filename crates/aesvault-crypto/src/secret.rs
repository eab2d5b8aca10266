//! Key material: 64-byte secret → AES-256 key + CBC IV

use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha512};
use zeroize::Zeroize;

use crate::{IV_SIZE, KEY_SIZE, SECRET_SIZE};

/// A 512-bit secret, typically a SHA-512 digest of a passphrase.
///
/// The bytes are never interpreted, only split into a cipher key and IV.
/// Zeroized on drop to prevent secrets lingering in memory.
#[derive(Clone)]
pub struct Secret {
    bytes: [u8; SECRET_SIZE],
}

impl Secret {
    pub fn from_bytes(bytes: [u8; SECRET_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; SECRET_SIZE] {
        &self.bytes
    }

    /// Generate a random secret from the thread-local CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::from_bytes(bytes)
    }

    /// SHA-512 of the passphrase bytes.
    ///
    /// No salt and no work factor: this is a plain digest, suitable only
    /// where the passphrase already carries enough entropy.
    pub fn from_passphrase(passphrase: &SecretString) -> Self {
        let mut digest = Sha512::digest(passphrase.expose_secret().as_bytes());
        let mut bytes = [0u8; SECRET_SIZE];
        bytes.copy_from_slice(&digest);
        digest.as_mut_slice().zeroize();
        Self::from_bytes(bytes)
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// A 256-bit AES key. Zeroized on drop.
#[derive(Clone)]
pub struct CipherKey {
    bytes: [u8; KEY_SIZE],
}

impl CipherKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for CipherKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// A 128-bit CBC initialization vector. Zeroized on drop.
#[derive(Clone)]
pub struct Iv {
    bytes: [u8; IV_SIZE],
}

impl Iv {
    pub fn from_bytes(bytes: [u8; IV_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; IV_SIZE] {
        &self.bytes
    }
}

impl Drop for Iv {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for Iv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Iv").field("bytes", &"[REDACTED]").finish()
    }
}

/// Split a secret into the cipher key (bytes 0..32) and IV (bytes 32..48).
///
/// The trailing 16 bytes of the secret are unused. The IV is a pure function
/// of the secret, so equal plaintexts under one secret encrypt identically.
pub fn derive_key_iv(secret: &Secret) -> (CipherKey, Iv) {
    let bytes = secret.as_bytes();

    let mut key = [0u8; KEY_SIZE];
    key.copy_from_slice(&bytes[..KEY_SIZE]);

    let mut iv = [0u8; IV_SIZE];
    iv.copy_from_slice(&bytes[KEY_SIZE..KEY_SIZE + IV_SIZE]);

    (CipherKey::from_bytes(key), Iv::from_bytes(iv))
}

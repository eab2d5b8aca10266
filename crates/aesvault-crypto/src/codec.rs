//! One-shot buffer encryption on top of the streaming cipher

use aesvault_core::VaultResult;
use zeroize::Zeroize;

use crate::cipher::{Decoder, Encoder};
use crate::secret::{derive_key_iv, CipherKey, Iv, Secret};
use crate::BLOCK_SIZE;

/// Encrypt a whole buffer under `secret`.
///
/// Output length is always `(plaintext.len() / 16 + 1) * 16`.
pub fn encrypt(secret: &Secret, plaintext: &[u8]) -> Vec<u8> {
    let (key, iv) = derive_key_iv(secret);
    encrypt_with(&key, &iv, plaintext)
}

/// Decrypt a buffer produced by [`encrypt`].
///
/// Fails with `VaultError::Malformed` on empty or unaligned input, or when
/// the final block's padding is invalid (usually a wrong secret).
pub fn decrypt(secret: &Secret, ciphertext: &[u8]) -> VaultResult<Vec<u8>> {
    let (key, iv) = derive_key_iv(secret);
    decrypt_with(&key, &iv, ciphertext)
}

/// Encrypt with explicit key material.
pub fn encrypt_with(key: &CipherKey, iv: &Iv, plaintext: &[u8]) -> Vec<u8> {
    let mut encoder = Encoder::new(key, iv);
    let mut out = Vec::with_capacity((plaintext.len() / BLOCK_SIZE + 1) * BLOCK_SIZE);
    encoder.encode_into(plaintext, &mut out);
    out.extend_from_slice(&encoder.final_encode());
    out
}

/// Decrypt with explicit key material.
///
/// On failure the blocks already decrypted are wiped before returning.
pub fn decrypt_with(key: &CipherKey, iv: &Iv, ciphertext: &[u8]) -> VaultResult<Vec<u8>> {
    let mut decoder = Decoder::new(key, iv);
    let mut out = Vec::with_capacity(ciphertext.len());
    decoder.decode_into(ciphertext, &mut out);
    match decoder.final_decode() {
        Ok(mut last) => {
            out.extend_from_slice(&last);
            last.zeroize();
            Ok(out)
        }
        Err(e) => {
            out.zeroize();
            Err(e)
        }
    }
}

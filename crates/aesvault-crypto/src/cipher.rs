//! Streaming AES-256-CBC with PKCS#7 padding
//!
//! ```text
//! Encoder::new(key, iv) → encode(..)* → final_encode()   (consumes the encoder)
//! Decoder::new(key, iv) → decode(..)* → final_decode()   (consumes the decoder)
//! ```
//!
//! Both sides carry a single-block tail between calls. The encoder holds back
//! any partial block; the decoder additionally holds back the last full block
//! until finalization because that is where the padding lives.

use aes::{Aes256, Block};
use aesvault_core::{VaultError, VaultResult};
use cbc::cipher::{
    block_padding::{Padding, Pkcs7},
    consts::U16,
    BlockDecryptMut, BlockEncryptMut, KeyIvInit,
};
use zeroize::Zeroize;

use crate::secret::{CipherKey, Iv};
use crate::BLOCK_SIZE;

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Streaming CBC encryptor for one plaintext.
pub struct Encoder {
    cipher: Aes256CbcEnc,
    tail: [u8; BLOCK_SIZE],
    tail_len: usize,
}

impl Encoder {
    pub fn new(key: &CipherKey, iv: &Iv) -> Self {
        Self {
            cipher: Aes256CbcEnc::new(key.as_bytes().into(), iv.as_bytes().into()),
            tail: [0u8; BLOCK_SIZE],
            tail_len: 0,
        }
    }

    /// Encrypt every complete block available and return the ciphertext.
    ///
    /// Trailing bytes that do not fill a block are kept for the next call,
    /// so the output may be shorter than the input (or empty).
    pub fn encode(&mut self, plaintext: &[u8]) -> Vec<u8> {
        let mut out =
            Vec::with_capacity((self.tail_len + plaintext.len()) / BLOCK_SIZE * BLOCK_SIZE);
        self.encode_into(plaintext, &mut out);
        out
    }

    /// Like [`Encoder::encode`], appending to `out`. Returns the number of
    /// bytes appended.
    pub fn encode_into(&mut self, mut plaintext: &[u8], out: &mut Vec<u8>) -> usize {
        let start = out.len();

        while !plaintext.is_empty() {
            if self.tail_len == 0 && plaintext.len() >= BLOCK_SIZE {
                let aligned = plaintext.len() - plaintext.len() % BLOCK_SIZE;
                let (bulk, rest) = plaintext.split_at(aligned);
                for chunk in bulk.chunks_exact(BLOCK_SIZE) {
                    let mut block = Block::clone_from_slice(chunk);
                    self.cipher.encrypt_block_mut(&mut block);
                    out.extend_from_slice(&block);
                }
                plaintext = rest;
                continue;
            }

            let take = (BLOCK_SIZE - self.tail_len).min(plaintext.len());
            self.tail[self.tail_len..self.tail_len + take].copy_from_slice(&plaintext[..take]);
            self.tail_len += take;
            plaintext = &plaintext[take..];

            if self.tail_len == BLOCK_SIZE {
                let mut block = Block::from(self.tail);
                self.cipher.encrypt_block_mut(&mut block);
                out.extend_from_slice(&block);
                self.tail_len = 0;
            }
        }

        out.len() - start
    }

    /// Pad the held-back tail and return the final ciphertext block.
    ///
    /// Block-aligned input (including empty input) gets a full block of
    /// padding, so the output is always exactly one block.
    pub fn final_encode(mut self) -> Vec<u8> {
        let mut block = Block::from(self.tail);
        <Pkcs7 as Padding<U16>>::pad(&mut block, self.tail_len);
        self.cipher.encrypt_block_mut(&mut block);
        block.to_vec()
    }
}

impl Drop for Encoder {
    fn drop(&mut self) {
        self.tail.zeroize();
    }
}

/// Streaming CBC decryptor for one ciphertext.
pub struct Decoder {
    cipher: Aes256CbcDec,
    tail: [u8; BLOCK_SIZE],
    tail_len: usize,
    consumed: u64,
}

impl Decoder {
    pub fn new(key: &CipherKey, iv: &Iv) -> Self {
        Self {
            cipher: Aes256CbcDec::new(key.as_bytes().into(), iv.as_bytes().into()),
            tail: [0u8; BLOCK_SIZE],
            tail_len: 0,
            consumed: 0,
        }
    }

    /// Decrypt every block that is known not to be the last one.
    pub fn decode(&mut self, ciphertext: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.tail_len + ciphertext.len());
        self.decode_into(ciphertext, &mut out);
        out
    }

    /// Like [`Decoder::decode`], appending to `out`. Returns the number of
    /// bytes appended.
    pub fn decode_into(&mut self, mut ciphertext: &[u8], out: &mut Vec<u8>) -> usize {
        let start = out.len();
        self.consumed += ciphertext.len() as u64;

        while !ciphertext.is_empty() {
            if self.tail_len == BLOCK_SIZE {
                let mut block = Block::from(self.tail);
                self.cipher.decrypt_block_mut(&mut block);
                out.extend_from_slice(&block);
                self.tail_len = 0;
            }

            if self.tail_len == 0 && ciphertext.len() > BLOCK_SIZE {
                // Keep between 1 and BLOCK_SIZE bytes back for the tail.
                let keep = match ciphertext.len() % BLOCK_SIZE {
                    0 => BLOCK_SIZE,
                    r => r,
                };
                let (bulk, rest) = ciphertext.split_at(ciphertext.len() - keep);
                for chunk in bulk.chunks_exact(BLOCK_SIZE) {
                    let mut block = Block::clone_from_slice(chunk);
                    self.cipher.decrypt_block_mut(&mut block);
                    out.extend_from_slice(&block);
                }
                ciphertext = rest;
            }

            let take = (BLOCK_SIZE - self.tail_len).min(ciphertext.len());
            self.tail[self.tail_len..self.tail_len + take].copy_from_slice(&ciphertext[..take]);
            self.tail_len += take;
            ciphertext = &ciphertext[take..];
        }

        out.len() - start
    }

    /// Decrypt the held-back block, validate and strip its padding.
    pub fn final_decode(mut self) -> VaultResult<Vec<u8>> {
        if self.tail_len != BLOCK_SIZE {
            return Err(VaultError::Malformed(format!(
                "ciphertext length {} is not a non-zero multiple of {BLOCK_SIZE}",
                self.consumed
            )));
        }

        let mut block = Block::from(self.tail);
        self.cipher.decrypt_block_mut(&mut block);
        let result = <Pkcs7 as Padding<U16>>::unpad(&block)
            .map(|unpadded| unpadded.to_vec())
            .map_err(|_| VaultError::Malformed("invalid padding in final block".into()));
        block.as_mut_slice().zeroize();
        result
    }
}

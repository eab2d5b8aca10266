//! Integrity-checked encrypted files
//!
//! On-disk format is the bare ciphertext, with no header, magic or version:
//! ```text
//! file = AES-256-CBC(key, iv, [64 bytes: SHA-512(plaintext)][N bytes: plaintext] + PKCS#7)
//! ```
//!
//! The checksum travels inside the ciphertext, so it cannot be used to test
//! plaintext guesses without the secret. After decryption it is the only
//! thing that tells "wrong secret / corrupted file" apart from real data.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use aesvault_core::{StoreConfig, VaultError, VaultResult};
use sha2::{Digest, Sha512};
use zeroize::Zeroize;

use crate::cipher::Encoder;
use crate::codec;
use crate::secret::{derive_key_iv, Secret};
use crate::{BLOCK_SIZE, CHECKSUM_SIZE};

/// SHA-512 digest used as the embedded plaintext checksum.
pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let digest = Sha512::digest(data);
    let mut out = [0u8; CHECKSUM_SIZE];
    out.copy_from_slice(&digest);
    out
}

/// Encrypt `checksum(plaintext) ‖ plaintext` under `secret`.
pub fn seal(secret: &Secret, plaintext: &[u8]) -> Vec<u8> {
    let (key, iv) = derive_key_iv(secret);
    let mut encoder = Encoder::new(&key, &iv);

    let payload_len = CHECKSUM_SIZE + plaintext.len();
    let mut out = Vec::with_capacity((payload_len / BLOCK_SIZE + 1) * BLOCK_SIZE);
    encoder.encode_into(&checksum(plaintext), &mut out);
    encoder.encode_into(plaintext, &mut out);
    out.extend_from_slice(&encoder.final_encode());
    out
}

/// Decrypt a blob produced by [`seal`] and verify its checksum.
///
/// Errors:
/// - `VaultError::Malformed`: blob is empty, unaligned, or has bad padding
/// - `VaultError::Integrity`: payload is shorter than the checksum, or the
///   checksum does not match the decrypted plaintext
pub fn unseal(secret: &Secret, blob: &[u8]) -> VaultResult<Vec<u8>> {
    let mut payload = codec::decrypt(secret, blob)?;

    if payload.len() < CHECKSUM_SIZE {
        let len = payload.len();
        payload.zeroize();
        return Err(VaultError::Integrity(format!(
            "decrypted payload is {len} bytes, shorter than the {CHECKSUM_SIZE}-byte checksum"
        )));
    }

    let mut plaintext = payload.split_off(CHECKSUM_SIZE);
    if checksum(&plaintext)[..] != payload[..] {
        plaintext.zeroize();
        return Err(VaultError::Integrity(
            "checksum mismatch: wrong secret or corrupted data".into(),
        ));
    }

    Ok(plaintext)
}

/// Reads and writes sealed files according to a [`StoreConfig`].
///
/// Each call is a single open-write-close or open-read-close. There is no
/// locking and no atomic rename; callers sharing a path must serialize.
#[derive(Debug, Clone, Default)]
pub struct FileStore {
    config: StoreConfig,
}

impl FileStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Seal `plaintext` and write it to `path`, replacing any existing content.
    pub fn save(&self, path: &Path, secret: &Secret, plaintext: &[u8]) -> VaultResult<()> {
        let blob = seal(secret, plaintext);

        let mut file = open_for_write(path, self.config.file_mode)?;
        file.write_all(&blob)?;
        if self.config.sync_on_save {
            file.sync_all()?;
        }

        tracing::debug!(
            path = %path.display(),
            plaintext_bytes = plaintext.len(),
            file_bytes = blob.len(),
            "saved encrypted file"
        );
        Ok(())
    }

    /// Read `path`, decrypt it, and return the plaintext once the embedded
    /// checksum has been verified.
    pub fn load(&self, path: &Path, secret: &Secret) -> VaultResult<Vec<u8>> {
        let mut file = File::open(path)?;
        let size = file.metadata()?.len();

        // Metadata is only a fast path; pipes and growing files report less
        // than they yield, so the read itself is bounded too.
        let limit = self.config.max_file_size;
        let blob = if limit > 0 && size > limit {
            Err(VaultError::TooLarge { size, limit })
        } else {
            read_bounded(&mut file, size, limit)
        };
        let blob = match blob {
            Err(VaultError::TooLarge { size, limit }) => {
                tracing::warn!(
                    path = %path.display(),
                    size,
                    limit,
                    "refusing oversized encrypted file"
                );
                return Err(VaultError::TooLarge { size, limit });
            }
            other => other?,
        };

        match unseal(secret, &blob) {
            Ok(plaintext) => {
                tracing::debug!(
                    path = %path.display(),
                    file_bytes = blob.len(),
                    plaintext_bytes = plaintext.len(),
                    "loaded encrypted file"
                );
                Ok(plaintext)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "rejected encrypted file");
                Err(e)
            }
        }
    }
}

/// [`FileStore::save`] with the default store options.
pub fn save(path: &Path, secret: &Secret, plaintext: &[u8]) -> VaultResult<()> {
    FileStore::default().save(path, secret, plaintext)
}

/// [`FileStore::load`] with the default store options.
pub fn load(path: &Path, secret: &Secret) -> VaultResult<Vec<u8>> {
    FileStore::default().load(path, secret)
}

/// Read everything `reader` yields, failing with `VaultError::TooLarge` once
/// more than `limit` bytes arrive (0 = unlimited). `size_hint` only sizes the
/// initial buffer.
fn read_bounded<R: Read>(mut reader: R, size_hint: u64, limit: u64) -> VaultResult<Vec<u8>> {
    let hint = if limit > 0 { size_hint.min(limit) } else { size_hint };
    let mut blob = Vec::new();
    if let Ok(hint) = usize::try_from(hint) {
        // read_to_end grows the buffer itself if this reservation fails.
        let _ = blob.try_reserve_exact(hint);
    }

    if limit == 0 {
        reader.read_to_end(&mut blob)?;
        return Ok(blob);
    }

    reader.take(limit.saturating_add(1)).read_to_end(&mut blob)?;
    let read = blob.len() as u64;
    if read > limit {
        return Err(VaultError::TooLarge { size: read, limit });
    }
    Ok(blob)
}

#[cfg(unix)]
fn open_for_write(path: &Path, mode: Option<u32>) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    if let Some(mode) = mode {
        options.mode(mode);
    }
    options.open(path)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path, _mode: Option<u32>) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

use thiserror::Error;

pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    /// Ciphertext is empty, not block-aligned, or carries invalid padding.
    #[error("malformed ciphertext: {0}")]
    Malformed(String),

    /// Decryption produced well-padded bytes but the embedded checksum does
    /// not match. Wrong secret or corrupted data; do not trust the payload.
    #[error("integrity check failed: {0}")]
    Integrity(String),

    /// `size` is the metadata length, or the bytes read before giving up
    /// when the metadata understated it.
    #[error("file too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VaultError {
    pub fn is_integrity(&self) -> bool {
        matches!(self, VaultError::Integrity(_))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, VaultError::Malformed(_))
    }
}

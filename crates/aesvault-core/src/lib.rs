pub mod config;
pub mod error;

pub use config::{StoreConfig, VaultConfig};
pub use error::{VaultError, VaultResult};

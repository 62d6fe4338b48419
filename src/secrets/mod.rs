//! secrets
//!
//! Secret storage abstraction for the Backlog configuration bundle.
//!
//! # Architecture
//!
//! Secrets are read through the `SecretStore` trait, which has
//! multiple implementations:
//!
//! - [`AwsSecretStore`]: AWS Secrets Manager (production default)
//! - [`FileSecretStore`]: TOML file mapping names to secret strings (local runs)
//! - [`MemorySecretStore`]: In-memory map (tests)
//!
//! # Security
//!
//! Secrets are **never** logged or included in error messages.
//!
//! # Provider Selection
//!
//! Use [`create_store`] to create a secret store by name:
//!
//! ```ignore
//! use nr2backlog::secrets::create_store;
//!
//! let store = create_store("aws", None).await?;
//! let value = store.get("nr2backlog").await?;
//! ```

mod aws_store;
mod file_store;
mod memory_store;
mod traits;

use std::path::PathBuf;

pub use aws_store::{retry_config, AwsSecretStore, MAX_ATTEMPTS};
pub use file_store::{FileSecretStore, DEFAULT_SECRETS_FILE};
pub use memory_store::MemorySecretStore;
pub use traits::{SecretError, SecretStore};

/// Create a secret store based on the provider name.
///
/// # Providers
///
/// - `"aws"` (default): [`AwsSecretStore`] from the ambient AWS environment
/// - `"file"`: [`FileSecretStore`] at `path`, or `secrets.toml` when `None`
///
/// # Errors
///
/// Returns `ProviderNotAvailable` for an unknown provider name.
pub async fn create_store(
    provider: &str,
    path: Option<PathBuf>,
) -> Result<Box<dyn SecretStore>, SecretError> {
    match provider {
        "aws" => Ok(Box::new(AwsSecretStore::from_env().await)),
        "file" => Ok(Box::new(
            path.map(FileSecretStore::with_path).unwrap_or_default(),
        )),
        other => Err(SecretError::ProviderNotAvailable(format!(
            "unknown secret provider: '{}' (valid: aws, file)",
            other
        ))),
    }
}

/// Provider used when none is chosen explicitly.
pub const DEFAULT_PROVIDER: &str = "aws";

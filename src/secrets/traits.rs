//! secrets::traits
//!
//! Secret storage trait definition.
//!
//! # Design
//!
//! The `SecretStore` trait is a read-only lookup from a secret name to its
//! stored string. The handler only ever reads one secret per invocation, so
//! there is no write path.
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include secret values in error messages
//! - Be thread-safe (Send + Sync)

use async_trait::async_trait;
use thiserror::Error;

/// Errors from secret storage operations.
///
/// Note: Error messages intentionally do not include secret values.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Failed to read from secret storage.
    #[error("failed to read secret: {0}")]
    ReadError(String),

    /// Permission denied accessing secret storage.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Provider not available or not configured.
    #[error("secret provider not available: {0}")]
    ProviderNotAvailable(String),
}

/// Trait for secret storage providers.
///
/// # Example
///
/// ```ignore
/// use nr2backlog::secrets::{SecretStore, MemorySecretStore};
///
/// let store = MemorySecretStore::new().with_secret("nr2backlog", "{}");
/// match store.get("nr2backlog").await? {
///     Some(_) => println!("Secret found (not printing value!)"),
///     None => println!("No such secret"),
/// }
/// ```
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Get a secret by name.
    ///
    /// Returns `Ok(Some(value))` if the secret exists.
    /// Returns `Ok(None)` if the secret does not exist.
    /// Returns `Err` if the store could not be reached or read.
    ///
    /// # Security
    ///
    /// The returned value is the raw secret. Do not log or print it.
    async fn get(&self, name: &str) -> Result<Option<String>, SecretError>;

    /// Short provider name, used in log lines.
    fn name(&self) -> &'static str;
}

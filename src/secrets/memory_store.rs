//! secrets::memory_store
//!
//! In-memory secret storage for tests.

use std::collections::HashMap;

use async_trait::async_trait;

use super::traits::{SecretError, SecretStore};

/// Secret store backed by a plain map.
///
/// `unreachable()` builds a store whose reads always fail, standing in for
/// a secret service that cannot be contacted.
#[derive(Debug, Default, Clone)]
pub struct MemorySecretStore {
    secrets: HashMap<String, String>,
    unreachable: bool,
}

impl MemorySecretStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store whose every read fails.
    pub fn unreachable() -> Self {
        Self {
            secrets: HashMap::new(),
            unreachable: true,
        }
    }

    /// Add a secret, builder style.
    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get(&self, name: &str) -> Result<Option<String>, SecretError> {
        if self.unreachable {
            return Err(SecretError::ReadError("secret store unreachable".into()));
        }
        Ok(self.secrets.get(name).cloned())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

//! secrets::file_store
//!
//! File-based secret storage for local runs.
//!
//! The file is TOML, mapping each secret name to the string that the
//! production store would return for it:
//!
//! ```toml
//! nr2backlog = '''
//! {"BACKLOG_DOMAIN": "example.backlog.com", "BACKLOG_API_KEY": "..."}
//! '''
//! ```
//!
//! # Security
//!
//! Secrets are NEVER logged, printed, or included in error messages.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use async_trait::async_trait;

use super::traits::{SecretError, SecretStore};

/// Default file name, resolved against the working directory.
pub const DEFAULT_SECRETS_FILE: &str = "secrets.toml";

/// File-based secret storage.
#[derive(Debug)]
pub struct FileSecretStore {
    /// Path to the secrets file
    path: PathBuf,
}

impl FileSecretStore {
    /// Create a file secret store at the default location.
    pub fn new() -> Self {
        Self::with_path(PathBuf::from(DEFAULT_SECRETS_FILE))
    }

    /// Create a file secret store at a custom path.
    pub fn with_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read all secrets from the file.
    ///
    /// A missing file is an empty store.
    fn read_secrets(&self) -> Result<HashMap<String, String>, SecretError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(&self.path)
            .map_err(|e| SecretError::ReadError(format!("cannot read secrets file: {}", e)))?;

        // toml's error text can quote the offending line, which may hold a secret.
        toml::from_str(&content).map_err(|_| {
            SecretError::ReadError(format!(
                "cannot parse secrets file '{}'",
                self.path.display()
            ))
        })
    }
}

impl Default for FileSecretStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn get(&self, name: &str) -> Result<Option<String>, SecretError> {
        let mut secrets = self.read_secrets()?;
        Ok(secrets.remove(name))
    }

    fn name(&self) -> &'static str {
        "file"
    }
}

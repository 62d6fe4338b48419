//! secrets::aws_store
//!
//! AWS Secrets Manager backed secret storage.
//!
//! Credentials and region come from the standard AWS environment (the
//! Lambda execution role in production). Requests use the SDK's standard
//! retry mode with a bounded number of attempts; nothing beyond that is
//! retried here.

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::BehaviorVersion;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_secretsmanager::Client;

use super::traits::{SecretError, SecretStore};

/// Maximum attempts (first try included) for a secret read.
pub const MAX_ATTEMPTS: u32 = 5;

/// Secret store reading from AWS Secrets Manager.
#[derive(Debug, Clone)]
pub struct AwsSecretStore {
    client: Client,
}

impl AwsSecretStore {
    /// Build a store from the ambient AWS configuration.
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(retry_config())
            .load()
            .await;
        Self {
            client: Client::new(&sdk_config),
        }
    }
}

/// Standard retry mode capped at [`MAX_ATTEMPTS`].
pub fn retry_config() -> RetryConfig {
    RetryConfig::standard().with_max_attempts(MAX_ATTEMPTS)
}

#[async_trait]
impl SecretStore for AwsSecretStore {
    async fn get(&self, name: &str) -> Result<Option<String>, SecretError> {
        let output = match self.client.get_secret_value().secret_id(name).send().await {
            Ok(output) => output,
            Err(err) => {
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception())
                {
                    return Ok(None);
                }
                if err.code() == Some("AccessDeniedException") {
                    return Err(SecretError::PermissionDenied(format!(
                        "secretsmanager:GetSecretValue on '{}'",
                        name
                    )));
                }
                return Err(SecretError::ReadError(
                    DisplayErrorContext(&err).to_string(),
                ));
            }
        };

        match output.secret_string() {
            Some(value) => Ok(Some(value.to_string())),
            None => Err(SecretError::ReadError(format!(
                "secret '{}' has no string value",
                name
            ))),
        }
    }

    fn name(&self) -> &'static str {
        "aws"
    }
}

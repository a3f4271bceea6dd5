use crate::client::{ApiError, ApiResult};
use std::collections::HashMap;

/// Name the DataGolf key is stored under.
pub const API_KEY_SECRET: &str = "DATAGOLF_API_KEY";

/// Lookup-by-name source of secrets.
pub trait SecretStore: Send + Sync {
    /// Resolve a secret. Missing or blank values are `ApiError::MissingSecret`.
    fn secret(&self, name: &str) -> ApiResult<String>;
}

/// Reads secrets from process environment variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSecretStore;

impl SecretStore for EnvSecretStore {
    fn secret(&self, name: &str) -> ApiResult<String> {
        match std::env::var(name) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(ApiError::MissingSecret(name.to_owned())),
        }
    }
}

/// Fixed in-memory secrets, for callers that already hold the key.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    values: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Store holding only the DataGolf API key.
    pub fn api_key(value: impl Into<String>) -> Self {
        Self::new().with(API_KEY_SECRET, value)
    }
}

impl SecretStore for StaticSecretStore {
    fn secret(&self, name: &str) -> ApiResult<String> {
        self.values
            .get(name)
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .ok_or_else(|| ApiError::MissingSecret(name.to_owned()))
    }
}

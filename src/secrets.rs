//! Secret lookup.
//!
//! Credentials are fetched by name through `SecretsProvider` and kept in
//! `SecretString` until the moment they go on the wire.

use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;

use crate::types::NotifierError;

/// Source of named secrets.
pub trait SecretsProvider: Send + Sync {
    /// The secret value, or `None` if it is not defined.
    fn get_secret(&self, name: &str) -> Option<SecretString>;

    /// Like `get_secret`, but a missing or blank value is a configuration error.
    fn require(&self, name: &str) -> Result<SecretString, NotifierError> {
        match self.get_secret(name) {
            Some(value) if !value.expose_secret().trim().is_empty() => Ok(value),
            _ => Err(NotifierError::Configuration(format!(
                "The secret variable `{name}` is not defined."
            ))),
        }
    }
}

/// Reads secrets from process environment variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvSecrets;

impl SecretsProvider for EnvSecrets {
    fn get_secret(&self, name: &str) -> Option<SecretString> {
        std::env::var(name).ok().map(SecretString::new)
    }
}

/// Fixed in-memory secrets, for wiring components without touching the
/// environment.
#[derive(Default)]
pub struct StaticSecrets {
    values: HashMap<String, String>,
}

impl StaticSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }
}

impl SecretsProvider for StaticSecrets {
    fn get_secret(&self, name: &str) -> Option<SecretString> {
        self.values.get(name).cloned().map(SecretString::new)
    }
}

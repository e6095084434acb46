//! Named secret resolution.
//!
//! Every component asks the store for what it needs at the moment it needs
//! it. Stores never cache values between calls.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::app::{DigestError, Result};

pub const APP_ID: &str = "REDDIT_DAILY_APP_ID";
pub const APP_SECRET: &str = "REDDIT_DAILY_APP_SECRET";
pub const REFRESH_TOKEN: &str = "REDDIT_DAILY_REFRESH_TOKEN";
pub const EMAIL: &str = "REDDIT_DAILY_EMAIL";
pub const EMAIL_PASSWORD: &str = "REDDIT_DAILY_EMAIL_PASSWORD";
pub const SLACK_MESSAGE: &str = "SLACK_MESSAGE";
pub const SLACK_WEBHOOK_URL: &str = "SLACK_WEBHOOK_URL";

pub trait SecretStore: Send + Sync {
    fn get_secret(&self, name: &str) -> Result<String>;
}

fn non_empty(name: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(DigestError::SecretNotFound(name.to_string())),
    }
}

/// Reads secrets from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore {
    prefix: Option<String>,
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn var_name(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, name),
            None => name.to_string(),
        }
    }
}

impl SecretStore for EnvSecretStore {
    fn get_secret(&self, name: &str) -> Result<String> {
        non_empty(name, std::env::var(self.var_name(name)).ok())
    }
}

/// Reads secrets from a TOML file of `NAME = "value"` pairs.
///
/// The file is re-read on every lookup so rotated values are picked up
/// between attempts.
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SecretStore for FileSecretStore {
    fn get_secret(&self, name: &str) -> Result<String> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            DigestError::Config(format!(
                "Failed to read secrets file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        let table: HashMap<String, String> = toml::from_str(&content).map_err(|e| {
            DigestError::Config(format!(
                "Failed to parse secrets file {}: {}",
                self.path.display(),
                e
            ))
        })?;
        non_empty(name, table.get(name).cloned())
    }
}

/// Fixed in-memory secrets.
#[derive(Debug, Clone, Default)]
pub struct MemorySecretStore {
    values: HashMap<String, String>,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &str, value: &str) -> Self {
        self.values.insert(name.to_string(), value.to_string());
        self
    }
}

impl SecretStore for MemorySecretStore {
    fn get_secret(&self, name: &str) -> Result<String> {
        non_empty(name, self.values.get(name).cloned())
    }
}

//! Credential lookup collaborator.

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Maps a username to its shared secret.
///
/// Unknown users resolve to `Ok(String::new())`, never to an error. Errors are
/// reserved for the store itself failing; the gate treats them as unknown users.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn get_secret(&self, username: &str) -> Result<String, CredentialError>;
}

/// Credential store backed by a fixed map
#[derive(Debug, Default, Clone)]
pub struct InMemoryCredentialStore {
    secrets: HashMap<String, String>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(mut self, username: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets.insert(username.into(), secret.into());
        self
    }

    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

impl FromIterator<(String, String)> for InMemoryCredentialStore {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            secrets: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl CredentialProvider for InMemoryCredentialStore {
    async fn get_secret(&self, username: &str) -> Result<String, CredentialError> {
        Ok(self.secrets.get(username).cloned().unwrap_or_default())
    }
}

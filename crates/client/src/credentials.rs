//! Credential providers.
//!
//! [`TokenStore`] keeps named tokens in a JSON file. The session token lives
//! under [`AUTH_TOKEN_KEY`] and is attached as a bearer token.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use snaptrack_tracker::CredentialProvider;
use tracing::debug;

/// Key of the session token in the store.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// Errors from credential persistence.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persistent token store.
///
/// Tokens are cached in memory and persisted to a JSON file.
pub struct TokenStore {
    path: PathBuf,
    tokens: RwLock<HashMap<String, String>>,
}

impl TokenStore {
    /// Opens the store at `path`, loading existing tokens from disk.
    pub fn open(path: PathBuf) -> Result<Self, CredentialError> {
        let tokens = load_tokens(&path)?;
        Ok(Self {
            path,
            tokens: RwLock::new(tokens),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the stored session token, if any.
    pub fn auth_token(&self) -> Option<String> {
        self.get(AUTH_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Stores the session token.
    pub fn set_auth_token(&self, token: &str) -> Result<(), CredentialError> {
        self.set(AUTH_TOKEN_KEY, token)
    }

    /// Forgets the session token.
    pub fn clear_auth_token(&self) -> Result<(), CredentialError> {
        self.remove(AUTH_TOKEN_KEY)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn set(&self, key: &str, token: &str) -> Result<(), CredentialError> {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), token.to_string());
        self.persist()
    }

    pub fn remove(&self, key: &str) -> Result<(), CredentialError> {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        self.persist()
    }

    fn persist(&self) -> Result<(), CredentialError> {
        let map = self.tokens.read().unwrap_or_else(PoisonError::into_inner);
        let json = serde_json::to_string_pretty(&*map)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        debug!(count = map.len(), path = ?self.path, "persisted tokens");
        Ok(())
    }
}

impl CredentialProvider for TokenStore {
    fn authorization(&self) -> Option<String> {
        self.auth_token().map(|t| format!("Bearer {t}"))
    }
}

fn load_tokens(path: &Path) -> Result<HashMap<String, String>, CredentialError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let data = std::fs::read_to_string(path)?;
    if data.trim().is_empty() {
        return Ok(HashMap::new());
    }
    let tokens: HashMap<String, String> = serde_json::from_str(&data)?;
    debug!(count = tokens.len(), path = ?path, "loaded tokens");
    Ok(tokens)
}

/// Fixed bearer token, e.g. from the command line.
#[derive(Debug, Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl CredentialProvider for StaticToken {
    fn authorization(&self) -> Option<String> {
        let token = self.0.trim();
        (!token.is_empty()).then(|| format!("Bearer {token}"))
    }
}

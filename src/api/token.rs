//! Cached OAuth token storage.

use crate::error::{LabelError, LabelResult};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Token response of the OAuth endpoint, stored as-is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OauthToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default = "default_ok")]
    pub ok: bool,
}

fn default_ok() -> bool {
    true
}

/// Place where the current token lives between requests and runs.
pub trait TokenStore {
    /// Returns the cached token, if any.
    fn read(&self) -> LabelResult<Option<OauthToken>>;

    /// Replaces the cached token.
    fn store(&self, token: &OauthToken) -> LabelResult<()>;
}

/// Token cache kept as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn read(&self) -> LabelResult<Option<OauthToken>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|e| LabelError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        let token = serde_json::from_str(&raw)
            .map_err(|e| LabelError::json(format!("reading {}", self.path.display()), e))?;
        Ok(Some(token))
    }

    fn store(&self, token: &OauthToken) -> LabelResult<()> {
        let raw = serde_json::to_string_pretty(token)
            .map_err(|e| LabelError::json("encoding OAuth token", e))?;
        std::fs::write(&self.path, raw).map_err(|e| LabelError::Io {
            path: self.path.clone(),
            source: e,
        })
    }
}

/// In-process token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RefCell<Option<OauthToken>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: OauthToken) -> Self {
        Self {
            token: RefCell::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn read(&self) -> LabelResult<Option<OauthToken>> {
        Ok(self.token.borrow().clone())
    }

    fn store(&self, token: &OauthToken) -> LabelResult<()> {
        *self.token.borrow_mut() = Some(token.clone());
        Ok(())
    }
}

impl<S: TokenStore + ?Sized> TokenStore for &S {
    fn read(&self) -> LabelResult<Option<OauthToken>> {
        (**self).read()
    }

    fn store(&self, token: &OauthToken) -> LabelResult<()> {
        (**self).store(token)
    }
}

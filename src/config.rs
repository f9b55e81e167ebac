//! Defaults, file locations and the credentials file.

use crate::error::{LabelError, LabelResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Base URL of the commerce API.
pub const DEFAULT_API_URL: &str = "https://bandcamp.com";

/// Credentials file name, looked up next to the executable.
pub const CREDENTIALS_FILE: &str = "bandcamp-credentials.json";

/// Cached OAuth token file name, kept next to the executable.
pub const TOKEN_FILE: &str = ".bandcamp-oauth-token.json";

/// Output file written by every layout mode.
pub const OUTPUT_FILE: &str = "result.pdf";

/// Substring removed from item names before they are printed on a label.
pub const DEFAULT_STRIP: &str = " by ORM";

/// Sheet margin used by the A4 mode, in points.
pub const SHEET_MARGIN: f32 = 72.0 / 3.0;

/// Narrower sheet margin variant, in points.
pub const SHEET_MARGIN_NARROW: f32 = 72.0 / 4.0;

/// Start of time for merch detail lookups.
pub const EPOCH_START: &str = "1970-01-01";

/// OAuth client credentials plus the band whose orders are fetched.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    /// OAuth client id
    pub id: String,
    /// OAuth client secret
    pub secret: String,
    /// Band whose merch orders are listed
    pub band_id: u64,
}

impl Credentials {
    /// Reads credentials from a JSON file with `id`, `secret` and `band_id`.
    pub fn load(path: &Path) -> LabelResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| LabelError::Config {
            path: path.to_path_buf(),
            reason: format!("cannot read credentials: {}", e),
        })?;
        Self::parse(path, &raw)
    }

    fn parse(path: &Path, raw: &str) -> LabelResult<Self> {
        serde_json::from_str(raw).map_err(|e| LabelError::Config {
            path: path.to_path_buf(),
            reason: format!("invalid credentials: {}", e),
        })
    }
}

/// Directory holding the running executable.
///
/// Falls back to the working directory when the executable path is unknown.
pub fn program_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Resolves an optional override against a file colocated with the program.
pub fn colocated(override_path: Option<&Path>, file_name: &str) -> PathBuf {
    match override_path {
        Some(path) => path.to_path_buf(),
        None => program_dir().join(file_name),
    }
}

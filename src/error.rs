//! Error types for the label layout library.
//!
//! Errors are grouped by where they come from: the file system, the PDF
//! model, the remote API and its OAuth exchange, or invalid input.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for label operations.
pub type LabelResult<T> = Result<T, LabelError>;

/// Error type for every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum LabelError {
    /// Error occurred while reading or writing files
    #[error("IO error for path '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The PDF model library rejected an operation
    #[error("PDF processing error: {context}: {source}")]
    Pdf {
        context: String,
        #[source]
        source: lopdf::Error,
    },

    /// A page could not be laid out
    #[error("Layout error{}: {message}", .page.map(|p| format!(" on page {}", p)).unwrap_or_default())]
    Layout { message: String, page: Option<usize> },

    /// Text extraction failed
    #[error("Text extraction failed for '{}': {reason}", .path.display())]
    TextExtraction { path: PathBuf, reason: String },

    /// Invalid configuration or parameters
    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// Credentials or other configuration files are missing or malformed
    #[error("Configuration error in '{}': {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    /// The request never produced a response
    #[error("Network error for {url}: {reason}")]
    Network { url: String, reason: String },

    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    /// The request was still rejected after refreshing the token
    #[error("Unauthorized after token refresh: {url}")]
    Unauthorized { url: String },

    /// Neither OAuth grant produced a token
    #[error("OAuth token exchange failed: {reason}")]
    Auth { reason: String },

    /// A payload could not be encoded or decoded
    #[error("JSON error while {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl LabelError {
    pub(crate) fn pdf(context: impl Into<String>, source: lopdf::Error) -> Self {
        Self::Pdf {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }
}

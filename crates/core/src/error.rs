//! Error types for Telegraph operations.
//!
//! This module defines the main error type [`TelegraphError`] which covers
//! policy configuration, HTML and content-tree conversion, and calls to the
//! Telegraph API.
//!
//! # Example
//!
//! ```rust
//! use telegraph_core::{Converter, TelegraphError};
//!
//! let converter = Converter::new();
//! match converter.decode_content_tree("{}") {
//!     Err(TelegraphError::InvalidContent(reason)) => println!("Rejected: {}", reason),
//!     other => println!("Unexpected: {:?}", other),
//! }
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for conversion and API operations.
///
/// Conversion errors are raised synchronously at the point of detection and a
/// failing call never yields partial output.
#[derive(Error, Debug)]
pub enum TelegraphError {
    /// A tag replacement rule could not be accepted.
    ///
    /// Returned for an empty source tag, or for a rules file entry whose
    /// replacement is neither a tag name nor `false`.
    #[error("Invalid tag rule: {0}")]
    InvalidRule(String),

    /// The HTML fragment could not be parsed at all.
    ///
    /// Recoverable markup problems are repaired silently by the parser and
    /// never produce this error.
    #[error("Invalid HTML: {0}")]
    InvalidHtml(String),

    /// A content tree is structurally invalid.
    ///
    /// Covers JSON that is not an array of nodes, values that are neither a
    /// string nor an element object, tags that cannot be written as markup,
    /// and raw-text content that contains its element's closing tag.
    #[error("Invalid content: {0}")]
    InvalidContent(String),

    /// The API method requires an access token and none was configured.
    #[error("Access token not provided")]
    TokenNotProvided,

    /// The Telegraph API answered with `ok: false`.
    #[error("Telegraph API error (HTTP {status}): {message}")]
    Api { message: String, status: u16 },

    /// The Telegraph API answered with a payload that does not match the
    /// expected result type.
    #[error("Unexpected API response: {0}")]
    InvalidResponse(String),

    /// HTTP request errors from reqwest.
    ///
    /// This variant wraps network errors, DNS failures, connection issues,
    /// and other HTTP-related problems.
    #[cfg(feature = "client")]
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid API base URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// File not found.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Standard I/O errors while reading rules files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors.
    ///
    /// Returned for malformed rules files and out-of-range view query
    /// parameters.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for TelegraphError.
pub type Result<T> = std::result::Result<T, TelegraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelegraphError::InvalidContent("not an array".to_string());
        assert_eq!(err.to_string(), "Invalid content: not an array");
    }

    #[test]
    fn test_api_error_display() {
        let err = TelegraphError::Api { message: "PAGE_NOT_FOUND".to_string(), status: 400 };
        assert!(err.to_string().contains("PAGE_NOT_FOUND"));
        assert!(err.to_string().contains("400"));
    }

    #[test]
    fn test_timeout_error() {
        let err = TelegraphError::Timeout { timeout: 30 };
        assert!(err.to_string().contains("30"));
    }
}

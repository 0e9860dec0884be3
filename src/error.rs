//! Error types for mishap.

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for mishap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mishap
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed HTTP code pattern
    #[error("invalid code pattern [{pattern}]: {reason}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Why it was rejected
        reason: String,
    },

    /// Template not found
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    /// Template compilation error
    #[error("template compilation failed for {template}: {error}")]
    TemplateCompilation {
        /// Template name
        template: String,
        /// Compilation error
        error: String,
    },

    /// The template set became empty
    #[error("no templates specified")]
    NoTemplates,

    /// Template execution error, recovered per request or per exported file
    #[error("rendering failed: {0}")]
    Render(String),

    /// A path that must be a directory is occupied by something else
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timeout error
    #[error("operation timed out after {duration:?}")]
    Timeout {
        /// Timeout duration
        duration: Duration,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config(message.into())
    }

    /// Create a rendering error
    pub fn render<S: Into<String>>(message: S) -> Self {
        Error::Render(message.into())
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern<P: Into<String>, R: Into<String>>(pattern: P, reason: R) -> Self {
        Error::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error is fatal for startup (as opposed to recoverable per request)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Render(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_pattern_display() {
        let err = Error::invalid_pattern("40", "must be exactly 3 characters");
        assert_eq!(
            err.to_string(),
            "invalid code pattern [40]: must be exactly 3 characters"
        );
    }

    #[test]
    fn test_render_errors_are_not_fatal() {
        assert!(!Error::render("boom").is_fatal());
        assert!(Error::NoTemplates.is_fatal());
        assert!(Error::config("bad flag").is_fatal());
    }

    #[test]
    fn test_not_a_directory_display() {
        let err = Error::NotADirectory(PathBuf::from("/tmp/taken"));
        assert_eq!(err.to_string(), "/tmp/taken is not a directory");
    }
}

//! Centralized error handling for Typim
//!
//! Nothing in the core engine is fatal: rendering, configuration and
//! source-map problems all degrade to a defined fallback. This module gives
//! those fallbacks a single error type to log before degrading.

use log::warn;
use std::fmt;
use std::io;

// ─────────────────────────────────────────────────────────────────────────────
// Custom Result Type Alias
// ─────────────────────────────────────────────────────────────────────────────

/// A specialized `Result` type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The centralized error type for the crate.
#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Generic I/O error wrapper (also produced by comrak's HTML writer)
    Io(io::Error),

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// The instrumented markdown renderer could not produce output
    Render { message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to parse configuration (invalid JSON/format)
    ConfigParse {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    /// Build a render error from any displayable cause.
    pub fn render(message: impl fmt::Display) -> Self {
        Error::Render {
            message: message.to_string(),
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigParse {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<fmt::Error> for Error {
    fn from(_: fmt::Error) -> Self {
        Error::render("formatter error while writing HTML")
    }
}

impl From<std::string::FromUtf8Error> for Error {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Error::render(format!("renderer produced invalid UTF-8: {}", err))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Display trait implementation
// ─────────────────────────────────────────────────────────────────────────────
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),

            Error::Render { message } => write!(f, "Markdown render failed: {}", message),

            Error::ConfigParse { message, .. } => {
                write!(f, "Invalid configuration format: {}", message)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// std::error::Error trait implementation for error chaining
// ─────────────────────────────────────────────────────────────────────────────
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::ConfigParse { source, .. } => source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn std::error::Error + 'static)),
            Error::Render { .. } => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graceful Degradation Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for Result to support graceful degradation.
pub trait ResultExt<T> {
    /// If the result is an error, log it at warning level and return the provided default.
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T;

    /// Like `unwrap_or_warn_default`, but the fallback is computed lazily.
    fn unwrap_or_warn_else(self, context: &str, fallback: impl FnOnce() -> T) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T {
        self.unwrap_or_warn_else(context, || default)
    }

    fn unwrap_or_warn_else(self, context: &str, fallback: impl FnOnce() -> T) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                warn!("{}: {}. Using fallback.", context, err);
                fallback()
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_creation() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "test error");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_render_error_message() {
        let err = Error::render("unbalanced writer state");
        assert_eq!(
            err.to_string(),
            "Markdown render failed: unbalanced writer state"
        );
    }

    #[test]
    fn test_invalid_utf8_becomes_render_error() {
        let bytes = vec![0xff, 0xfe];
        let err = Error::from(String::from_utf8(bytes).unwrap_err());
        assert!(matches!(err, Error::Render { .. }));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_result: std::result::Result<String, _> = serde_json::from_str("invalid json");
        let err = Error::from(json_result.unwrap_err());
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_display_config_parse() {
        let err = Error::from(serde_json::from_str::<u32>("{").unwrap_err());
        assert!(err.to_string().starts_with("Invalid configuration format: "));
    }

    #[test]
    fn test_error_source_chain() {
        use std::error::Error as StdError;
        let err = Error::Io(io::Error::new(io::ErrorKind::Other, "disk full"));
        assert!(err.source().is_some());

        let err = Error::render("x");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_unwrap_or_warn_default() {
        let ok: Result<i32> = Ok(42);
        assert_eq!(ok.unwrap_or_warn_default(0, "test context"), 42);

        let err: Result<i32> = Err(Error::render("boom"));
        assert_eq!(err.unwrap_or_warn_default(0, "test context"), 0);
    }

    #[test]
    fn test_unwrap_or_warn_else_is_lazy() {
        let ok: Result<String> = Ok("value".to_string());
        let value = ok.unwrap_or_warn_else("ctx", || panic!("fallback must not run"));
        assert_eq!(value, "value");

        let err: Result<String> = Err(Error::render("no output"));
        assert_eq!(err.unwrap_or_warn_else("ctx", || "plain".to_string()), "plain");
    }
}

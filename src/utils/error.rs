//! Error handling for mathtext
//!
//! Rendering itself never fails past the crate boundary: [`EngineError`] is
//! produced by engines and consumed by the render ladder. [`MathTextError`]
//! covers the fallible outer surfaces (config files, CLI I/O).

use std::path::Path;

use thiserror::Error;

/// Typesetting failure reported by an engine in strict mode
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine rejected the LaTeX source
    #[error("parse error: {message}")]
    Parse { message: String },
    /// The engine itself could not run (initialisation, options, runtime)
    #[error("backend error: {message}")]
    Backend { message: String },
}

impl EngineError {
    pub fn parse(message: impl Into<String>) -> Self {
        EngineError::Parse {
            message: message.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        EngineError::Backend {
            message: message.into(),
        }
    }

    /// Whether the failure is about the input rather than the engine
    pub fn is_parse(&self) -> bool {
        matches!(self, EngineError::Parse { .. })
    }
}

/// Errors from configuration loading and the command line front end
#[derive(Debug, Error)]
pub enum MathTextError {
    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A config file could not be read or parsed
    #[error("invalid config {path}: {message}")]
    Config { path: String, message: String },
    /// An option value was not recognised
    #[error("invalid option: {message}")]
    InvalidOption { message: String },
}

impl MathTextError {
    pub fn config(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        MathTextError::Config {
            path: path.as_ref().display().to_string(),
            message: message.into(),
        }
    }

    pub fn invalid_option(message: impl Into<String>) -> Self {
        MathTextError::InvalidOption {
            message: message.into(),
        }
    }
}

/// Result type for config and I/O operations
pub type MathTextResult<T> = Result<T, MathTextError>;

//! Error types and result aliases for flint.
//!
//! This module defines the error handling infrastructure:
//! - [`Result<T>`]: Type alias for `anyhow::Result<T>` used by the outer API
//! - [`AnalysisError`]: Typed failures raised by the analysis core
//!
//! Most malformed input never becomes an error. The core records it as a
//! diagnostic and keeps going; [`AnalysisError::Lex`] and
//! [`AnalysisError::Structural`] only escape when strict mode is enabled.

use std::path::PathBuf;

use anyhow::Result as AnyhowResult;
use thiserror::Error;

pub type Result<T> = AnyhowResult<T>;

/// Result alias for the parsing layer.
pub type ParseResult<T> = std::result::Result<T, AnalysisError>;

/// Failures raised while analyzing one source file
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// A physical line holds a character that no token class accepts
    #[error("line {line}, column {column}: cannot tokenize {found:?}")]
    Lex {
        line: usize,
        column: usize,
        found: char,
    },

    /// A statement violates the structure the parser relies on
    #[error("line {line}: {message}")]
    Structural { line: usize, message: String },

    /// Units and constructs are nested deeper than the configured limit
    #[error("line {line}: nesting depth exceeds the limit of {limit}")]
    DepthLimit { line: usize, limit: usize },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AnalysisError {
    /// Line number the error points at, if it has one
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            AnalysisError::Lex { line, .. }
            | AnalysisError::Structural { line, .. }
            | AnalysisError::DepthLimit { line, .. } => Some(*line),
            AnalysisError::Io { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_error_message() {
        let err = AnalysisError::Lex {
            line: 3,
            column: 7,
            found: '`',
        };
        assert_eq!(err.to_string(), "line 3, column 7: cannot tokenize '`'");
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn test_depth_limit_message() {
        let err = AnalysisError::DepthLimit { line: 12, limit: 4 };
        assert!(err.to_string().contains("limit of 4"));
    }

    #[test]
    fn test_io_error_has_no_line() {
        let err = AnalysisError::Io {
            path: PathBuf::from("missing.f90"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert_eq!(err.line(), None);
        assert!(err.to_string().contains("missing.f90"));
    }
}

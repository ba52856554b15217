//! Error types for listing decoding.

use thiserror::Error;

/// Malformed `.dirindex` content.
///
/// Any of these fails the whole listing; callers treat the directory as absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListingError {
    #[error("line {line}: listing is not valid UTF-8")]
    InvalidUtf8 { line: usize },

    #[error("line {line}: invalid version '{value}'")]
    InvalidVersion { line: usize, value: String },

    #[error("line {line}: invalid size '{value}' for file '{name}'")]
    InvalidSize {
        line: usize,
        name: String,
        value: String,
    },

    #[error("line {line}: '{record}' record is missing its {field} field")]
    MissingField {
        line: usize,
        record: &'static str,
        field: &'static str,
    },
}

impl ListingError {
    /// Get the 1-based line number the error was found on.
    pub fn line(&self) -> usize {
        match self {
            ListingError::InvalidUtf8 { line }
            | ListingError::InvalidVersion { line, .. }
            | ListingError::InvalidSize { line, .. }
            | ListingError::MissingField { line, .. } => *line,
        }
    }
}

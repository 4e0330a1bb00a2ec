//! # Error Types Module
//!
//! This module defines the error types used throughout the receipt flow.
//! Validation and lookup failures are recovered locally by re-prompting the
//! user; persistence failures end the current receipt attempt.

/// Errors produced while building, saving, or rendering a receipt
#[derive(Debug, Clone)]
pub enum NotaError {
    /// Malformed user input (non-numeric amounts, empty required text)
    Validation(String),
    /// Catalog lookup failures for unknown item names
    NotFound(String),
    /// Storage write failures, including receipt number collisions
    Persistence(String),
    /// Receipt rendering failures
    Render(String),
}

impl std::fmt::Display for NotaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotaError::Validation(msg) => write!(f, "Validation error: {msg}"),
            NotaError::NotFound(msg) => write!(f, "Not found: {msg}"),
            NotaError::Persistence(msg) => write!(f, "Persistence error: {msg}"),
            NotaError::Render(msg) => write!(f, "Render error: {msg}"),
        }
    }
}

impl std::error::Error for NotaError {}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that all error variants can be created and formatted
    #[test]
    fn test_error_variants_creation() {
        let validation_err = NotaError::Validation("test".to_string());
        let not_found_err = NotaError::NotFound("test".to_string());
        let persistence_err = NotaError::Persistence("test".to_string());
        let render_err = NotaError::Render("test".to_string());

        assert!(format!("{}", validation_err).contains("Validation error"));
        assert!(format!("{}", not_found_err).contains("Not found"));
        assert!(format!("{}", persistence_err).contains("Persistence error"));
        assert!(format!("{}", render_err).contains("Render error"));
    }
}

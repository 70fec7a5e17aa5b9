//! Error types for Trellis operations.
//!
//! This module provides the main error type [`TrellisError`] which wraps
//! the error conditions that can occur while loading and resolving layouts.

use std::io;

use thiserror::Error;

use trellis_parser::error::ParseError;

use crate::expr::ExprError;

/// The main error type for Trellis operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant contains structured error information with source code
/// spans. This provides detailed error information that can be used for rich
/// error reporting.
#[derive(Debug, Error)]
pub enum TrellisError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error("Expression error: {0}")]
    Expression(#[from] ExprError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TrellisError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}

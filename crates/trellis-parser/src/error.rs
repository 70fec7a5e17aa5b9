//! Diagnostics for layout documents.
//!
//! Loading a document reports problems as [`Diagnostic`]s. Each carries an
//! [`ErrorCode`] that fixes its [`Severity`], the id of the component it is
//! about, and labels pointing into the document text. Any error rejects the
//! document with a [`ParseError`] holding everything found; warnings alone
//! are returned with the loaded document.

mod collector;
mod diagnostic;
mod error_code;
mod parse_error;

pub(crate) use collector::DiagnosticCollector;

pub use diagnostic::{Diagnostic, Label};
pub use error_code::{ErrorCode, Severity};
pub use parse_error::ParseError;

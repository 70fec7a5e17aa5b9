//! The error returned when a layout document is rejected.

use std::fmt;

use crate::error::Diagnostic;

/// Every diagnostic found in a rejected layout document.
///
/// Holds at least one error; warnings found in the same pass are kept so
/// they can be reported together.
#[derive(Debug)]
pub struct ParseError {
    diagnostics: Vec<Diagnostic>,
}

impl ParseError {
    pub fn new(diagnostics: Vec<Diagnostic>) -> Self {
        Self { diagnostics }
    }

    /// All diagnostics in document order, warnings included.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// The diagnostics that rejected the document.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|diag| diag.severity().is_error())
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.errors().next() else {
            return f.write_str("layout rejected");
        };
        write!(f, "{first}")?;

        let more = self.errors().count() - 1;
        if more > 0 {
            write!(f, " (+{more} more)")?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

impl From<Diagnostic> for ParseError {
    fn from(diagnostic: Diagnostic) -> Self {
        Self::new(vec![diagnostic])
    }
}

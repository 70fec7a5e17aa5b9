//! Diagnostic codes and their severity.
//!
//! `E1xx` codes reject the document text, `E2xx` reject the layout it
//! describes, and `W2xx` flag references the resolver silently ignores.

use std::fmt;

/// Whether a diagnostic rejects the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// The layout is not loaded.
    Error,
    /// The layout loads and resolves, but not as its author probably meant.
    Warning,
}

impl Severity {
    pub fn is_error(self) -> bool {
        self == Self::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
        })
    }
}

/// Code of a layout diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Document (E1xx)
    // =========================================================================
    /// The document is not valid JSON.
    E100,

    /// The document is valid JSON but neither a bare component array nor an
    /// object of the form `{"data": {"layout": [...]}}`, or one of its
    /// components is missing `id` or `type`.
    E101,

    // =========================================================================
    // Layout (E2xx / W2xx)
    // =========================================================================
    /// Two components of the layout share an id.
    E200,

    /// A child is listed by several groups. The first group owns it.
    W201,

    /// A group lists a child id that no component declares.
    W202,

    /// A repeating group has no `group` binding, so child bindings are not
    /// rewritten per row.
    W203,
}

impl ErrorCode {
    /// Errors reject the layout; warnings are reported alongside it.
    pub fn severity(self) -> Severity {
        match self {
            Self::E100 | Self::E101 | Self::E200 => Severity::Error,
            Self::W201 | Self::W202 | Self::W203 => Severity::Warning,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::E100 => "E100",
            Self::E101 => "E101",
            Self::E200 => "E200",
            Self::W201 => "W201",
            Self::W202 => "W202",
            Self::W203 => "W203",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

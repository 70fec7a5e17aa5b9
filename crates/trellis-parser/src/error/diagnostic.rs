//! A single finding about a layout document.

use std::fmt;

use crate::{
    error::{ErrorCode, Severity},
    span::Span,
};

/// A finding about one component of a layout, or about the document as a
/// whole when [`component`](Self::component) is `None`.
///
/// Severity comes from the code. Labels point into the document text: the
/// primary label at the offending entry, related labels at the entries it
/// conflicts with.
///
/// ```
/// # use trellis_parser::{Span, error::{Diagnostic, ErrorCode}};
/// let diag = Diagnostic::for_component(ErrorCode::W202, "people", "child `age` not found")
///     .with_label(Span::new(2..16), "listed by this group");
///
/// assert!(!diag.severity().is_error());
/// assert_eq!(diag.component(), Some("people"));
/// assert_eq!(diag.to_string(), "warning[W202]: child `age` not found");
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    code: ErrorCode,
    message: String,
    component: Option<String>,
    labels: Vec<Label>,
    help: Option<String>,
}

/// A message attached to a span of the document.
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    primary: bool,
}

impl Label {
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// `false` for labels that only give context.
    pub fn is_primary(&self) -> bool {
        self.primary
    }
}

impl Diagnostic {
    /// A finding about the document itself.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            component: None,
            labels: Vec::new(),
            help: None,
        }
    }

    /// A finding about the component declared with `id`.
    pub fn for_component(code: ErrorCode, id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: Some(id.into()),
            ..Self::new(code, message)
        }
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Id of the component the finding is about.
    pub fn component(&self) -> Option<&str> {
        self.component.as_deref()
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Marks the offending entry.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            message: message.into(),
            primary: true,
        });
        self
    }

    /// Marks an entry the offending one conflicts with.
    pub fn with_related(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label {
            span,
            message: message.into(),
            primary: false,
        });
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity(), self.code, self.message)
    }
}

impl std::error::Error for Diagnostic {}

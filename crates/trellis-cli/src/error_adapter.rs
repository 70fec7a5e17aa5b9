//! miette rendering for [`TrellisError`].
//!
//! A rejected layout produces one report per diagnostic, each with snippets
//! of the layout source. Every other error is a single report without
//! source.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceCode, SourceSpan};

use trellis::TrellisError;
use trellis_parser::error::{Diagnostic, Severity};

const EXPRESSION_HELP: &str =
    "set `on_error = \"default\"` in the [resolve] configuration to fall back to defaults";

/// One renderable report.
#[derive(Debug)]
pub enum ErrorReport<'a> {
    /// A diagnostic of a rejected layout, with the layout source.
    Finding { diag: &'a Diagnostic, src: &'a str },
    /// An error without a source location.
    Failure(&'a TrellisError),
}

/// Splits an error into the reports to render, in order.
pub fn to_reports(err: &TrellisError) -> Vec<ErrorReport<'_>> {
    match err {
        TrellisError::Parse { err, src } => err
            .diagnostics()
            .iter()
            .map(|diag| ErrorReport::Finding { diag, src })
            .collect(),
        other => vec![ErrorReport::Failure(other)],
    }
}

impl fmt::Display for ErrorReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finding { diag, .. } => match diag.component() {
                Some(id) => write!(f, "{} (in `{id}`)", diag.message()),
                None => f.write_str(diag.message()),
            },
            Self::Failure(err) => fmt::Display::fmt(err, f),
        }
    }
}

impl std::error::Error for ErrorReport<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Finding { .. } => None,
            Self::Failure(err) => err.source(),
        }
    }
}

impl MietteDiagnostic for ErrorReport<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Self::Finding { diag, .. } => Some(Box::new(diag.code())),
            Self::Failure(TrellisError::Io(_)) => Some(Box::new("trellis::io")),
            Self::Failure(TrellisError::Expression(_)) => Some(Box::new("trellis::expression")),
            Self::Failure(TrellisError::Serialization(_)) => {
                Some(Box::new("trellis::serialization"))
            }
            Self::Failure(TrellisError::Parse { .. }) => None,
        }
    }

    fn severity(&self) -> Option<miette::Severity> {
        match self {
            Self::Finding { diag, .. } if diag.severity() == Severity::Warning => {
                Some(miette::Severity::Warning)
            }
            _ => Some(miette::Severity::Error),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Self::Finding { diag, .. } => diag.help().map(|help| Box::new(help) as Box<dyn fmt::Display>),
            Self::Failure(TrellisError::Expression(_)) => Some(Box::new(EXPRESSION_HELP)),
            Self::Failure(_) => None,
        }
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        match self {
            Self::Finding { src, .. } => Some(src as &dyn SourceCode),
            Self::Failure(_) => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let Self::Finding { diag, .. } = self else {
            return None;
        };
        if diag.labels().is_empty() {
            return None;
        }

        Some(Box::new(diag.labels().iter().map(|label| {
            let span = SourceSpan::new(label.span().start().into(), label.span().len());
            let text = Some(label.message().to_string());
            if label.is_primary() {
                LabeledSpan::new_primary_with_span(text, span)
            } else {
                LabeledSpan::new_with_span(text, span)
            }
        })))
    }
}

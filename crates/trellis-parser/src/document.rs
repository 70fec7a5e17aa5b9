//! Layout document loading.
//!
//! A layout document is either a bare JSON array of component descriptors or
//! an object of the form `{"data": {"layout": [...]}}`. Loading happens in
//! three steps:
//!
//! 1. **Syntax** - the text is parsed as JSON ([`ErrorCode::E100`] on failure)
//! 2. **Shape** - the components are deserialized into
//!    [`ComponentDescriptor`]s ([`ErrorCode::E101`] on failure)
//! 3. **Validate** - the layout is checked by [`validate_layout`]; errors
//!    fail the load, warnings are kept on the [`LayoutDocument`]

use std::sync::LazyLock;

use log::{debug, info, trace};
use regex::Regex;
use serde_json::Value;

use trellis_core::ComponentDescriptor;

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    validate::validate_layout,
};

/// A loaded layout with the source location of every component.
#[derive(Debug, Clone, Default)]
pub struct LayoutDocument {
    components: Vec<ComponentDescriptor>,
    spans: Vec<Span>,
    warnings: Vec<Diagnostic>,
}

impl LayoutDocument {
    /// Wraps components that did not come from a source text.
    ///
    /// Every component gets an empty span.
    pub fn from_components(components: Vec<ComponentDescriptor>) -> Self {
        let spans = vec![Span::default(); components.len()];
        Self {
            components,
            spans,
            warnings: Vec::new(),
        }
    }

    /// The components in document order.
    pub fn components(&self) -> &[ComponentDescriptor] {
        &self.components
    }

    /// Span of the `"id"` entry of the component at `index`.
    pub fn span_of(&self, index: usize) -> Span {
        self.spans.get(index).copied().unwrap_or_default()
    }

    /// Spans of all components, parallel to [`LayoutDocument::components`].
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Validation warnings found while loading.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Consume the document and return its components.
    pub fn into_components(self) -> Vec<ComponentDescriptor> {
        self.components
    }
}

/// Parse and validate a layout document.
///
/// # Arguments
///
/// * `source` - JSON text of the layout document
///
/// # Errors
///
/// Returns a [`ParseError`] when the text is not valid JSON, when it does not
/// have the shape of a layout document, or when validation reports an error
/// such as a duplicate component id.
///
/// # Examples
///
/// ```
/// # use trellis_parser::parse_layout;
/// let document = parse_layout(r#"{"data": {"layout": [
///     {"id": "name", "type": "Input"}
/// ]}}"#).unwrap();
///
/// assert_eq!(document.components()[0].id, "name");
/// assert!(document.warnings().is_empty());
/// ```
pub fn parse_layout(source: &str) -> Result<LayoutDocument, ParseError> {
    debug!(source_len = source.len(); "Parsing layout document");

    let value: Value = serde_json::from_str(source).map_err(|err| {
        let span = error_span(source, &err);
        Diagnostic::new(ErrorCode::E100, format!("invalid JSON: {err}")).with_label(span, "syntax error")
    })?;

    let (components, component_depth) = match &value {
        Value::Array(_) => (serde_json::from_str::<Vec<ComponentDescriptor>>(source), 2),
        Value::Object(object) if object.contains_key("data") => (
            serde_json::from_str::<WrappedLayout>(source).map(|wrapped| wrapped.data.layout),
            4,
        ),
        other => {
            return Err(Diagnostic::new(
                ErrorCode::E101,
                format!("expected a layout array, found {}", value_kind(other)),
            )
            .with_label(Span::new(0..source.len()), "not a layout")
            .with_help("use a component array or `{\"data\": {\"layout\": [...]}}`")
            .into());
        }
    };
    let components = components.map_err(|err| {
        let span = error_span(source, &err);
        Diagnostic::new(ErrorCode::E101, format!("unexpected layout shape: {err}")).with_label(span, "here")
    })?;

    let spans = locate_ids(source, &components, component_depth);

    let mut collector = DiagnosticCollector::new();
    collector.extend(validate_layout(&components, &spans));
    let warnings = collector.finish()?;

    info!(
        components = components.len(),
        warnings = warnings.len();
        "Layout document parsed"
    );
    trace!(components:?; "Parsed components");

    Ok(LayoutDocument {
        components,
        spans,
        warnings,
    })
}

#[derive(serde::Deserialize)]
struct WrappedLayout {
    data: WrappedLayoutData,
}

#[derive(serde::Deserialize)]
struct WrappedLayoutData {
    layout: Vec<ComponentDescriptor>,
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Span of the character a serde_json error points at.
fn error_span(source: &str, err: &serde_json::Error) -> Span {
    let offset = Span::offset_of(source, err.line(), err.column());
    let end = source
        .get(offset..)
        .and_then(|rest| rest.chars().next())
        .map_or(offset, |c| offset + c.len_utf8());
    Span::new(offset..end)
}

/// An `"id": "..."` entry, with the quoted value captured.
static ID_ENTRY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""id"\s*:\s*("(?:[^"\\]|\\.)*")"#).expect("valid id entry pattern")
});

/// Locates the `"id": "..."` entry of every component.
///
/// Only entries at `depth`, the nesting level of component objects, count;
/// ids of nested objects such as options are skipped. Entries are matched to
/// components in document order. A component whose entry cannot be found
/// gets an empty span.
fn locate_ids(source: &str, components: &[ComponentDescriptor], depth: usize) -> Vec<Span> {
    let captures: Vec<_> = ID_ENTRY.captures_iter(source).collect();
    let depths = nesting_at(source, captures.iter().filter_map(|caps| caps.get(0)).map(|m| m.start()));

    let mut entries = captures
        .iter()
        .zip(depths)
        .filter(|(_, at)| *at == Some(depth))
        .filter_map(|(caps, _)| {
            let entry = caps.get(0)?;
            let id: String = serde_json::from_str(caps.get(1)?.as_str()).ok()?;
            Some((id, Span::new(entry.range())))
        })
        .peekable();

    components
        .iter()
        .map(|component| {
            entries
                .next_if(|(id, _)| *id == component.id)
                .map_or_else(Span::default, |(_, span)| span)
        })
        .collect()
}

/// Bracket nesting depth at each of the ascending `offsets`, or `None` when
/// the offset falls inside a string literal.
fn nesting_at(source: &str, offsets: impl IntoIterator<Item = usize>) -> Vec<Option<usize>> {
    let mut offsets = offsets.into_iter().peekable();
    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (pos, byte) in source.bytes().enumerate() {
        while offsets.next_if(|&offset| offset == pos).is_some() {
            out.push((!in_string).then_some(depth));
        }
        if offsets.peek().is_none() {
            break;
        }

        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    out
}

//! Structural validation of a flat layout.
//!
//! The resolver itself is permissive: unknown child references are dropped
//! and a child listed by several groups is owned by the first one. This pass
//! reports those situations so authors can fix them.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::debug;

use trellis_core::ComponentDescriptor;

use crate::{
    error::{Diagnostic, ErrorCode},
    span::Span,
};

/// Validate a flat layout.
///
/// Returns every diagnostic found, in document order of the component that
/// triggered it. Only [`ErrorCode::E200`] rejects the layout; the rest are
/// warnings.
///
/// # Arguments
///
/// * `components` - The flat layout
/// * `spans` - Source span of each component, parallel to `components`.
///   Missing entries default to an empty span.
pub fn validate_layout(components: &[ComponentDescriptor], spans: &[Span]) -> Vec<Diagnostic> {
    let span_of = |index: usize| spans.get(index).copied().unwrap_or_default();
    let mut diagnostics = Vec::new();

    // id -> index of its first declaration
    let mut declared: IndexMap<&str, usize> = IndexMap::new();
    for (index, component) in components.iter().enumerate() {
        if let Some(&first) = declared.get(component.id.as_str()) {
            diagnostics.push(
                Diagnostic::for_component(
                    ErrorCode::E200,
                    &component.id,
                    format!("component id `{}` is declared more than once", component.id),
                )
                .with_label(span_of(index), "duplicate declaration")
                .with_related(span_of(first), "first declared here")
                .with_help("component ids must be unique within a layout"),
            );
        } else {
            declared.insert(component.id.as_str(), index);
        }
    }

    // child id -> index of the owning group
    let mut owners: HashMap<&str, usize> = HashMap::new();
    for (index, group) in components.iter().enumerate().filter(|(_, c)| c.is_group()) {
        for child in group.child_refs() {
            if !declared.contains_key(child.id) {
                diagnostics.push(
                    Diagnostic::for_component(
                        ErrorCode::W202,
                        &group.id,
                        format!("child `{}` of group `{}` not found", child.id, group.id),
                    )
                    .with_label(span_of(index), "referenced by this group")
                    .with_help("the reference is ignored"),
                );
                continue;
            }

            match owners.get(child.id) {
                Some(&owner) if owner != index => {
                    diagnostics.push(
                        Diagnostic::for_component(
                            ErrorCode::W201,
                            child.id,
                            format!("component `{}` is a child of several groups", child.id),
                        )
                        .with_label(span_of(index), "also referenced here")
                        .with_related(span_of(owner), "owned by this group")
                        .with_help("a component belongs to the first group that lists it"),
                    );
                }
                Some(_) => {}
                None => {
                    owners.insert(child.id, index);
                }
            }
        }

        if group.is_repeating() && group.group_binding().is_none() {
            diagnostics.push(
                Diagnostic::for_component(
                    ErrorCode::W203,
                    &group.id,
                    format!("repeating group `{}` has no `group` data model binding", group.id),
                )
                .with_label(span_of(index), "repeating group")
                .with_help("child bindings are not rewritten per row"),
            );
        }
    }

    debug!(
        components = components.len(),
        diagnostics = diagnostics.len();
        "Layout validated"
    );

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(diagnostics: &[Diagnostic]) -> Vec<ErrorCode> {
        diagnostics.iter().map(Diagnostic::code).collect()
    }

    #[test]
    fn test_valid_layout_has_no_diagnostics() {
        let layout = vec![
            ComponentDescriptor::group("g", ["a"])
                .with_max_count(3)
                .with_binding("group", "M.L"),
            ComponentDescriptor::new("a", "Input").with_binding("simpleBinding", "M.L.V"),
        ];

        assert!(validate_layout(&layout, &[]).is_empty());
    }

    #[test]
    fn test_duplicate_id() {
        let layout = vec![
            ComponentDescriptor::new("a", "Input"),
            ComponentDescriptor::new("b", "Input"),
            ComponentDescriptor::new("a", "Header"),
        ];
        let spans = [Span::new(0..5), Span::new(6..10), Span::new(11..20)];

        let diagnostics = validate_layout(&layout, &spans);
        assert_eq!(codes(&diagnostics), vec![ErrorCode::E200]);
        assert!(diagnostics[0].severity().is_error());
        assert_eq!(diagnostics[0].labels()[0].span(), Span::new(11..20));
        assert_eq!(diagnostics[0].labels()[1].span(), Span::new(0..5));
    }

    #[test]
    fn test_child_of_several_groups() {
        let layout = vec![
            ComponentDescriptor::group("g1", ["a"]),
            ComponentDescriptor::group("g2", ["a", "a"]),
            ComponentDescriptor::new("a", "Input"),
        ];

        let diagnostics = validate_layout(&layout, &[]);
        assert_eq!(codes(&diagnostics), vec![ErrorCode::W201, ErrorCode::W201]);
        assert!(diagnostics.iter().all(|d| !d.severity().is_error()));
        assert!(diagnostics.iter().all(|d| d.component() == Some("a")));
    }

    #[test]
    fn test_missing_child() {
        let layout = vec![
            ComponentDescriptor::group("g", ["a", "nope"]),
            ComponentDescriptor::new("a", "Input"),
        ];

        let diagnostics = validate_layout(&layout, &[]);
        assert_eq!(codes(&diagnostics), vec![ErrorCode::W202]);
        assert!(diagnostics[0].message().contains("`nope`"));
        assert_eq!(diagnostics[0].component(), Some("g"));
    }

    #[test]
    fn test_repeating_group_without_binding() {
        let layout = vec![
            ComponentDescriptor::group("g", ["a"]).with_max_count(2),
            ComponentDescriptor::new("a", "Input"),
        ];

        assert_eq!(codes(&validate_layout(&layout, &[])), vec![ErrorCode::W203]);
    }

    #[test]
    fn test_multi_page_children_are_resolved() {
        let mut group = ComponentDescriptor::group("g", ["0:a", "1:b"]);
        group.edit = Some(trellis_core::GroupEdit {
            multi_page: true,
            ..Default::default()
        });
        let layout = vec![
            group,
            ComponentDescriptor::new("a", "Input"),
            ComponentDescriptor::new("b", "Input"),
        ];

        assert!(validate_layout(&layout, &[]).is_empty());
    }
}

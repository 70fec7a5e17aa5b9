//! Repeating-group row expansion.
//!
//! A repeating group is a template: its children are declared once and
//! instantiated for every active row of the backing data array. This module
//! takes the tree built by [`layout_as_hierarchy`] and replaces each repeating
//! group's `child_components` with concrete [`GroupRow`]s whose items carry
//! row-specific ids, data model bindings and mapping keys.

use std::sync::LazyLock;

use log::{debug, trace};
use regex::{NoExpand, Regex};
use serde::Serialize;

use trellis_core::{ComponentDescriptor, RepeatingGroups, row_range};

use crate::hierarchy::{HierarchyItem, layout_as_hierarchy};

/// Row placeholder in mapping keys, such as `[{0}]`.
static INDEX_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\{\d+\}\]").expect("valid placeholder pattern"));

/// A component in the row-expanded tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExpandedItem {
    /// A leaf component.
    Component(ComponentDescriptor),
    /// A non-repeating group. Its children are left as authored.
    Group {
        #[serde(flatten)]
        group: ComponentDescriptor,
        #[serde(rename = "childComponents")]
        child_components: Vec<HierarchyItem>,
    },
    /// A repeating group with one entry per realized row.
    RepeatingGroup {
        #[serde(flatten)]
        group: ComponentDescriptor,
        rows: Vec<GroupRow>,
    },
}

impl ExpandedItem {
    /// The descriptor of this item.
    pub fn item(&self) -> &ComponentDescriptor {
        match self {
            Self::Component(component) => component,
            Self::Group { group, .. } | Self::RepeatingGroup { group, .. } => group,
        }
    }

    pub fn id(&self) -> &str {
        &self.item().id
    }

    /// Rows of a repeating group, empty for everything else.
    pub fn rows(&self) -> &[GroupRow] {
        match self {
            Self::RepeatingGroup { rows, .. } => rows,
            _ => &[],
        }
    }
}

/// One realized row of a repeating group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    /// Position of the row in the backing data array.
    pub index: usize,
    /// The group's children, instantiated for this row.
    pub items: Vec<ExpandedItem>,
}

/// Row context handed to the children of a repeating group.
#[derive(Debug, Clone, Copy)]
struct RowParent<'a> {
    index: usize,
    binding: Option<&'a str>,
}

/// Builds the hierarchy and expands every top-level repeating group into rows.
///
/// The rows of a group are taken from `repeating_groups[group.id].index`,
/// narrowed by the group's `edit.filter` (see [`row_range`]). Groups with no
/// entry in `repeating_groups` get no rows.
///
/// For row `r` of a top-level group, each child is deep-cloned and:
///
/// - gets the id `<id>-<r>` (`<id>-<parentRow>-<r>` inside a nested group)
///   and `baseComponentId = <id>`;
/// - keeps its original bindings in `baseDataModelBindings`, while every
///   binding has the group's binding prefix replaced by `<group binding>[r]`;
/// - has each `[{n}]` placeholder in its mapping keys replaced by the
///   enclosing row indices, outermost first.
///
/// Repeating groups nested in a row are expanded the same way. Non-repeating
/// groups and leaves pass through unchanged.
///
/// # Examples
///
/// ```
/// # use trellis::layout_as_hierarchy_with_rows;
/// # use trellis_core::{ComponentDescriptor, RepeatingGroupState, RepeatingGroups};
/// let layout = vec![
///     ComponentDescriptor::group("g", ["f"])
///         .with_max_count(5)
///         .with_binding("group", "M.L"),
///     ComponentDescriptor::new("f", "Input").with_binding("simpleBinding", "M.L.V"),
/// ];
/// let repeating = RepeatingGroups::from([("g".to_string(), RepeatingGroupState::new(1))]);
///
/// let tree = layout_as_hierarchy_with_rows(&layout, &repeating);
/// let rows = tree[0].rows();
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[1].items[0].id(), "f-1");
/// assert_eq!(rows[1].items[0].item().binding("simpleBinding"), Some("M.L[1].V"));
/// ```
pub fn layout_as_hierarchy_with_rows(
    layout: &[ComponentDescriptor],
    repeating_groups: &RepeatingGroups,
) -> Vec<ExpandedItem> {
    let expanded: Vec<_> = layout_as_hierarchy(layout)
        .into_iter()
        .map(|item| expand(item, None, repeating_groups))
        .collect();

    debug!(top_level = expanded.len(); "Expanded repeating groups");

    expanded
}

fn expand(
    item: HierarchyItem,
    parent: Option<RowParent<'_>>,
    repeating_groups: &RepeatingGroups,
) -> ExpandedItem {
    let (group, child_components) = match item {
        HierarchyItem::Component(component) => return ExpandedItem::Component(component),
        HierarchyItem::Group {
            group,
            child_components,
        } if !group.is_repeating() => {
            return ExpandedItem::Group {
                group,
                child_components,
            };
        }
        HierarchyItem::Group {
            group,
            child_components,
        } => (group, child_components),
    };

    let range = row_range(
        repeating_groups.get(&group.id).map(|state| state.index),
        group.edit.as_ref(),
    );
    trace!(group = group.id.as_str(), start = range.start(), stop = range.stop(); "Expanding rows");

    let rows = range
        .indices()
        .map(|index| {
            let items = child_components
                .iter()
                .map(|child| {
                    let row_child = instantiate(&group, child, parent, index);
                    let context = RowParent {
                        index,
                        binding: group.group_binding(),
                    };
                    expand(row_child, Some(context), repeating_groups)
                })
                .collect();
            GroupRow { index, items }
        })
        .collect();

    ExpandedItem::RepeatingGroup { group, rows }
}

/// Clones a template child for one row of `group`.
fn instantiate(
    group: &ComponentDescriptor,
    child: &HierarchyItem,
    parent: Option<RowParent<'_>>,
    index: usize,
) -> HierarchyItem {
    let mut row_child = child.clone();
    let template = child.item();
    let item = row_child.item_mut();

    item.id = match parent {
        Some(parent) => format!("{}-{}-{}", template.id, parent.index, index),
        None => format!("{}-{}", template.id, index),
    };
    item.base_component_id = Some(template.id.clone());

    if let Some(bindings) = &template.data_model_bindings {
        item.base_data_model_bindings = Some(bindings.clone());
        if let Some(base) = base_group_binding(group) {
            let binding = row_group_binding(group, base, parent);
            let indexed = format!("{binding}[{index}]");
            if let Some(rewritten) = item.data_model_bindings.as_mut() {
                for value in rewritten.values_mut() {
                    *value = value.replacen(base, &indexed, 1);
                }
            }
        }
    }

    if let Some(mapping) = item.mapping.take() {
        let indices: Vec<usize> = parent.map(|p| p.index).into_iter().chain([index]).collect();
        item.mapping = Some(
            mapping
                .into_iter()
                .map(|(key, value)| (rewrite_mapping_key(&key, &indices), value))
                .collect(),
        );
    }

    row_child
}

/// The template binding of a group, before any row rewriting.
fn base_group_binding(group: &ComponentDescriptor) -> Option<&str> {
    group
        .base_data_model_bindings
        .as_ref()
        .and_then(|bindings| bindings.get(trellis_core::component::GROUP_BINDING_KEY))
        .map(String::as_str)
        .filter(|binding| !binding.is_empty())
        .or_else(|| group.group_binding().filter(|binding| !binding.is_empty()))
}

/// The group binding to index child bindings with.
///
/// Inside a row, the first occurrence of the template binding is replaced by
/// the binding of the enclosing group.
fn row_group_binding(
    group: &ComponentDescriptor,
    base: &str,
    parent: Option<RowParent<'_>>,
) -> String {
    let binding = group.group_binding().unwrap_or(base);
    match parent.and_then(|parent| parent.binding) {
        Some(parent_binding) => binding.replacen(base, parent_binding, 1),
        None => binding.to_string(),
    }
}

fn rewrite_mapping_key(key: &str, indices: &[usize]) -> String {
    indices.iter().fold(key.to_string(), |key, index| {
        INDEX_PLACEHOLDER
            .replace(&key, NoExpand(&format!("[{index}]")))
            .into_owned()
    })
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use trellis_core::{FilterEntry, GroupEdit, RepeatingGroupState};

    use super::*;

    fn repeating(entries: &[(&str, i64)]) -> RepeatingGroups {
        entries
            .iter()
            .map(|(id, index)| (id.to_string(), RepeatingGroupState::new(*index)))
            .collect()
    }

    fn simple_layout() -> Vec<ComponentDescriptor> {
        vec![
            ComponentDescriptor::group("g", ["f"])
                .with_max_count(5)
                .with_binding("group", "Model.Items"),
            ComponentDescriptor::new("f", "Input").with_binding("simpleBinding", "Model.Items.Name"),
        ]
    }

    fn row_ids(item: &ExpandedItem) -> Vec<Vec<&str>> {
        item.rows()
            .iter()
            .map(|row| row.items.iter().map(ExpandedItem::id).collect())
            .collect()
    }

    #[test]
    fn test_rows_for_range() {
        let tree = layout_as_hierarchy_with_rows(&simple_layout(), &repeating(&[("g", 2)]));

        assert_eq!(tree.len(), 1);
        assert_eq!(row_ids(&tree[0]), vec![vec!["f-0"], vec!["f-1"], vec!["f-2"]]);
        let indices: Vec<_> = tree[0].rows().iter().map(|row| row.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_binding_rewrite() {
        let tree = layout_as_hierarchy_with_rows(&simple_layout(), &repeating(&[("g", 2)]));
        let item = tree[0].rows()[1].items[0].item();

        assert_eq!(item.binding("simpleBinding"), Some("Model.Items[1].Name"));
        assert_eq!(item.base_component_id.as_deref(), Some("f"));
        assert_eq!(
            item.base_data_model_bindings.as_ref().and_then(|b| b.get("simpleBinding")),
            Some(&"Model.Items.Name".to_string())
        );
    }

    #[test]
    fn test_group_without_state_has_no_rows() {
        let tree = layout_as_hierarchy_with_rows(&simple_layout(), &RepeatingGroups::new());

        assert!(matches!(tree[0], ExpandedItem::RepeatingGroup { .. }));
        assert!(tree[0].rows().is_empty());
    }

    #[test]
    fn test_filters_narrow_rows() {
        let mut layout = simple_layout();
        layout[0].edit = Some(GroupEdit {
            filter: vec![FilterEntry::new("start", "1"), FilterEntry::new("stop", "3")],
            ..Default::default()
        });

        let tree = layout_as_hierarchy_with_rows(&layout, &repeating(&[("g", 4)]));

        assert_eq!(row_ids(&tree[0]), vec![vec!["f-1"], vec!["f-2"]]);
    }

    #[test]
    fn test_nested_repeating_groups() {
        let layout = vec![
            ComponentDescriptor::group("outer", ["inner"])
                .with_max_count(3)
                .with_binding("group", "Model.Items"),
            ComponentDescriptor::group("inner", ["field"])
                .with_max_count(3)
                .with_binding("group", "Model.Items.Sub"),
            ComponentDescriptor::new("field", "Input")
                .with_binding("simpleBinding", "Model.Items.Sub.Field"),
        ];

        let tree =
            layout_as_hierarchy_with_rows(&layout, &repeating(&[("outer", 1), ("inner", 0)]));

        let inner = &tree[0].rows()[1].items[0];
        assert_eq!(inner.id(), "inner-1");
        assert_eq!(inner.item().group_binding(), Some("Model.Items[1].Sub"));

        let field = inner.rows()[0].items[0].item();
        assert_eq!(field.id, "field-1-0");
        assert_eq!(field.base_component_id.as_deref(), Some("field"));
        assert_eq!(field.binding("simpleBinding"), Some("Model.Items[1].Sub[0].Field"));
    }

    #[test]
    fn test_mapping_placeholders() {
        let mut mapping = IndexMap::new();
        mapping.insert("Model.Items[{0}].Sub[{1}].Id".to_string(), "id".to_string());
        mapping.insert("Plain.Key".to_string(), "plain".to_string());

        let mut inner_field = ComponentDescriptor::new("field", "Dropdown");
        inner_field.mapping = Some(mapping);

        let layout = vec![
            ComponentDescriptor::group("outer", ["inner"])
                .with_max_count(3)
                .with_binding("group", "Model.Items"),
            ComponentDescriptor::group("inner", ["field"])
                .with_max_count(3)
                .with_binding("group", "Model.Items.Sub"),
            inner_field,
        ];

        let tree =
            layout_as_hierarchy_with_rows(&layout, &repeating(&[("outer", 2), ("inner", 1)]));
        let field = tree[0].rows()[2].items[0].rows()[1].items[0].item();
        let keys: Vec<_> = field.mapping.as_ref().unwrap().keys().cloned().collect();

        assert_eq!(keys, vec!["Model.Items[2].Sub[1].Id", "Plain.Key"]);
    }

    #[test]
    fn test_non_repeating_group_passes_through() {
        let layout = vec![
            ComponentDescriptor::group("panel", ["rep"]),
            ComponentDescriptor::group("rep", ["f"])
                .with_max_count(3)
                .with_binding("group", "M.L"),
            ComponentDescriptor::new("f", "Input").with_binding("simpleBinding", "M.L.V"),
        ];

        let tree = layout_as_hierarchy_with_rows(&layout, &repeating(&[("rep", 1)]));

        match &tree[0] {
            ExpandedItem::Group {
                child_components, ..
            } => {
                assert_eq!(child_components.len(), 1);
                assert_eq!(child_components[0].id(), "rep");
                assert_eq!(child_components[0].child_components()[0].id(), "f");
            }
            other => panic!("expected a plain group, got {other:?}"),
        }
    }

    #[test]
    fn test_children_without_bindings_are_only_renamed() {
        let layout = vec![
            ComponentDescriptor::group("g", ["h"])
                .with_max_count(2)
                .with_binding("group", "M.L"),
            ComponentDescriptor::new("h", "Header"),
        ];

        let tree = layout_as_hierarchy_with_rows(&layout, &repeating(&[("g", 0)]));
        let header = tree[0].rows()[0].items[0].item();

        assert_eq!(header.id, "h-0");
        assert_eq!(header.data_model_bindings, None);
        assert_eq!(header.base_data_model_bindings, None);
    }

    #[test]
    fn test_serialize_rows() {
        let tree = layout_as_hierarchy_with_rows(&simple_layout(), &repeating(&[("g", 0)]));
        let json = serde_json::to_value(&tree).unwrap();

        assert_eq!(json[0]["id"], "g");
        assert_eq!(json[0]["rows"][0]["index"], 0);
        assert_eq!(json[0]["rows"][0]["items"][0]["id"], "f-0");
        assert_eq!(json[0]["rows"][0]["items"][0]["baseComponentId"], "f");
    }
}

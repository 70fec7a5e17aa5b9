//! Flat layout to component tree.
//!
//! Groups reference their children by id, so a flat layout is an id graph
//! rather than a tree. [`layout_as_hierarchy`] resolves it in two passes:
//! first every child reference is indexed to its owning group, then the tree
//! is materialized top-down from the components nobody owns.
//!
//! Ownership is exclusive. When several groups list the same child, the first
//! group in document order owns it. Because every component has at most one
//! owner and top-level components have none, materialization cannot loop even
//! when references form a cycle (components on a cycle are simply unreachable).

use std::collections::HashMap;

use log::{debug, trace};
use serde::Serialize;

use trellis_core::ComponentDescriptor;

/// A component in the un-expanded tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HierarchyItem {
    /// A leaf component.
    Component(ComponentDescriptor),
    /// A group with its children nested in place of `children`.
    Group {
        #[serde(flatten)]
        group: ComponentDescriptor,
        #[serde(rename = "childComponents")]
        child_components: Vec<HierarchyItem>,
    },
}

impl HierarchyItem {
    /// The descriptor of this item.
    pub fn item(&self) -> &ComponentDescriptor {
        match self {
            Self::Component(component) => component,
            Self::Group { group, .. } => group,
        }
    }

    pub(crate) fn item_mut(&mut self) -> &mut ComponentDescriptor {
        match self {
            Self::Component(component) => component,
            Self::Group { group, .. } => group,
        }
    }

    pub fn id(&self) -> &str {
        &self.item().id
    }

    /// Nested children, empty for leaves.
    pub fn child_components(&self) -> &[HierarchyItem] {
        match self {
            Self::Component(_) => &[],
            Self::Group {
                child_components, ..
            } => child_components,
        }
    }
}

/// Owner of a referenced child.
#[derive(Debug, Clone, Copy)]
struct Owner {
    group: usize,
    multi_page_index: Option<u32>,
}

/// Turns a flat layout into a tree of components and groups.
///
/// Components not referenced by any group form the top level. Each group
/// gets the components it owns as `child_components`, in document order, and
/// loses its `children` list. Children of multi-page groups carry their page
/// number in `multi_page_index`. References to ids missing from the layout
/// are dropped. The input is left untouched.
///
/// # Examples
///
/// ```
/// # use trellis::layout_as_hierarchy;
/// # use trellis_core::ComponentDescriptor;
/// let layout = vec![
///     ComponentDescriptor::new("name", "Input"),
///     ComponentDescriptor::group("g", ["name", "missing"]),
///     ComponentDescriptor::new("submit", "Button"),
/// ];
///
/// let tree = layout_as_hierarchy(&layout);
/// let ids: Vec<_> = tree.iter().map(|item| item.id()).collect();
/// assert_eq!(ids, ["g", "submit"]);
/// assert_eq!(tree[0].child_components()[0].id(), "name");
/// ```
pub fn layout_as_hierarchy(layout: &[ComponentDescriptor]) -> Vec<HierarchyItem> {
    let mut owners: HashMap<&str, Owner> = HashMap::new();
    for (index, group) in layout.iter().enumerate().filter(|(_, c)| c.is_group()) {
        for child in group.child_refs() {
            owners.entry(child.id).or_insert(Owner {
                group: index,
                multi_page_index: child.multi_page_index,
            });
        }
    }

    // group index -> owned components, in document order
    let mut owned: HashMap<usize, Vec<(usize, Option<u32>)>> = HashMap::new();
    let mut top_level = Vec::new();
    for (index, component) in layout.iter().enumerate() {
        match owners.get(component.id.as_str()) {
            Some(owner) => owned
                .entry(owner.group)
                .or_default()
                .push((index, owner.multi_page_index)),
            None => top_level.push(index),
        }
    }

    debug!(
        components = layout.len(),
        top_level = top_level.len(),
        nested = layout.len() - top_level.len();
        "Building layout hierarchy"
    );

    top_level
        .into_iter()
        .map(|index| materialize(layout, &owned, index, None))
        .collect()
}

fn materialize(
    layout: &[ComponentDescriptor],
    owned: &HashMap<usize, Vec<(usize, Option<u32>)>>,
    index: usize,
    multi_page_index: Option<u32>,
) -> HierarchyItem {
    let mut item = layout[index].clone();
    if multi_page_index.is_some() {
        item.multi_page_index = multi_page_index;
    }

    if !item.is_group() {
        return HierarchyItem::Component(item);
    }

    item.children = None;
    let child_components = owned
        .get(&index)
        .map(|children| {
            children
                .iter()
                .map(|&(child, page)| materialize(layout, owned, child, page))
                .collect()
        })
        .unwrap_or_default();

    trace!(group = item.id.as_str(); "Materialized group");

    HierarchyItem::Group {
        group: item,
        child_components,
    }
}


#[cfg(test)]
mod proptest_tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    // =========================================================================
    // Strategies
    // =========================================================================

    /// Per component: `None` for a leaf, or the child positions of a group.
    fn shape_strategy() -> impl Strategy<Value = Vec<Option<Vec<usize>>>> {
        proptest::collection::vec(
            proptest::option::weighted(0.3, proptest::collection::vec(0usize..12, 0..4)),
            1..12,
        )
    }

    fn build_layout(shape: &[Option<Vec<usize>>]) -> Vec<ComponentDescriptor> {
        shape
            .iter()
            .enumerate()
            .map(|(i, children)| match children {
                Some(children) => {
                    ComponentDescriptor::group(format!("c{i}"), children.iter().map(|c| format!("c{c}")))
                }
                None => ComponentDescriptor::new(format!("c{i}"), "Input"),
            })
            .collect()
    }

    fn collect_ids<'a>(items: &'a [HierarchyItem], out: &mut Vec<&'a str>) {
        for item in items {
            out.push(item.id());
            collect_ids(item.child_components(), out);
        }
    }

    // =========================================================================
    // Property Test Functions
    // =========================================================================

    fn check_components_placed_at_most_once(shape: Vec<Option<Vec<usize>>>) {
        let layout = build_layout(&shape);
        let tree = layout_as_hierarchy(&layout);

        let mut ids = Vec::new();
        collect_ids(&tree, &mut ids);
        let unique: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len(), "duplicated placement in {ids:?}");
    }

    fn check_group_free_layout_is_unchanged(count: usize) {
        let layout: Vec<_> = (0..count)
            .map(|i| ComponentDescriptor::new(format!("c{i}"), "Input"))
            .collect();

        let tree = layout_as_hierarchy(&layout);

        assert_eq!(tree.len(), layout.len());
        for (item, original) in tree.iter().zip(&layout) {
            assert_eq!(item.item(), original);
        }
    }

    // =========================================================================
    // Proptest Wrappers
    // =========================================================================

    proptest! {
        #[test]
        fn components_placed_at_most_once(shape in shape_strategy()) {
            check_components_placed_at_most_once(shape);
        }

        #[test]
        fn group_free_layout_is_unchanged(count in 0usize..20) {
            check_group_free_layout_is_unchanged(count);
        }
    }
}

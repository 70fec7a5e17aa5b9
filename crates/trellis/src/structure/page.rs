//! Arena-backed storage for the nodes of one layout page.
//!
//! A [`LayoutPage`] owns every [`LayoutNode`] of a page in a single `Vec`.
//! Nodes refer to their parent and children by [`NodeIndex`], and an id map
//! indexes each node under both its own id and its `baseComponentId`, so all
//! row instances of a repeating-group template can be found from the
//! template id.

use std::collections::HashMap;

use log::{debug, trace};
use serde_json::Value;

use trellis_core::{ComponentDescriptor, RepeatingGroups};

use crate::{
    hierarchy::HierarchyItem,
    rows::{ExpandedItem, layout_as_hierarchy_with_rows},
    structure::node::NodeRef,
};

// =============================================================================
// Arena primitives
// =============================================================================

/// Position of a node in its page arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// Returns the raw arena position.
    pub fn index(self) -> usize {
        self.0
    }
}

/// The children of a node.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NodeChildren {
    /// A leaf.
    #[default]
    None,
    /// Children of a non-repeating group.
    Components(Vec<NodeIndex>),
    /// Children of a repeating group, one entry per row.
    Rows(Vec<RowChildren>),
}

/// The nodes of one repeating-group row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowChildren {
    index: usize,
    items: Vec<NodeIndex>,
    group_expressions: Option<Value>,
}

impl RowChildren {
    fn new(index: usize, items: Vec<NodeIndex>) -> Self {
        Self {
            index,
            items,
            group_expressions: None,
        }
    }

    /// Position of the row in the backing data array.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn items(&self) -> &[NodeIndex] {
        &self.items
    }

    /// Group `edit` expressions resolved for this row.
    ///
    /// Only set on pages produced by expression resolution.
    pub fn group_expressions(&self) -> Option<&Value> {
        self.group_expressions.as_ref()
    }

    pub(crate) fn set_group_expressions(&mut self, value: Value) {
        self.group_expressions = Some(value);
    }
}

/// One component instance on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    item: ComponentDescriptor,
    children: NodeChildren,
    parent: Option<NodeIndex>,
    row_index: Option<usize>,
}

impl LayoutNode {
    pub fn item(&self) -> &ComponentDescriptor {
        &self.item
    }

    pub fn children(&self) -> &NodeChildren {
        &self.children
    }

    /// The parent node, `None` when the page itself is the parent.
    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    /// Row of the enclosing repeating group this node was instantiated for.
    pub fn row_index(&self) -> Option<usize> {
        self.row_index
    }

    pub(crate) fn set_item(&mut self, item: ComponentDescriptor) {
        self.item = item;
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [RowChildren] {
        match &mut self.children {
            NodeChildren::Rows(rows) => rows,
            _ => &mut [],
        }
    }
}

// =============================================================================
// Layout page
// =============================================================================

/// All nodes of one layout page.
///
/// The page acts as the root of the node tree: top-level components have the
/// page as their parent. Nodes are registered depth first, each group after
/// all of its descendants, and that registration order is the order of
/// [`flat`](Self::flat) and of id lookups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutPage {
    nodes: Vec<LayoutNode>,
    direct_children: Vec<NodeIndex>,
    id_map: HashMap<String, Vec<NodeIndex>>,
}

impl LayoutPage {
    /// Builds a page from a row-expanded hierarchy.
    pub fn from_expanded(items: Vec<ExpandedItem>) -> Self {
        let mut page = Self::default();
        for item in items {
            let index = page.register_expanded(item, None);
            page.direct_children.push(index);
        }

        debug!(
            nodes = page.nodes.len(),
            top_level = page.direct_children.len();
            "Layout page built"
        );

        page
    }

    /// Number of nodes on the page.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node at `index`, if it belongs to this page.
    pub fn node(&self, index: NodeIndex) -> Option<NodeRef<'_>> {
        (index.0 < self.nodes.len()).then(|| NodeRef::new(self, index))
    }

    /// Top-level nodes in authored order.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.direct_children
            .iter()
            .map(|&index| NodeRef::new(self, index))
    }

    /// First top-level node whose item matches.
    pub fn find_child<F>(&self, matching: F) -> Option<NodeRef<'_>>
    where
        F: Fn(&ComponentDescriptor) -> bool,
    {
        self.children().find(|node| matching(node.item()))
    }

    /// Upward search starting at the page, which only sees its own children.
    ///
    /// Use [`LayoutPages::closest`](crate::LayoutPages::closest) to continue
    /// on other pages.
    pub fn closest<F>(&self, matching: F) -> Option<NodeRef<'_>>
    where
        F: Fn(&ComponentDescriptor) -> bool,
    {
        self.find_child(matching)
    }

    /// Every node on the page in registration order, optionally skipping groups.
    pub fn flat(&self, include_groups: bool) -> impl Iterator<Item = NodeRef<'_>> {
        (0..self.nodes.len())
            .map(|index| NodeRef::new(self, NodeIndex(index)))
            .filter(move |node| include_groups || !node.is_group())
    }

    /// The first registered node with this id or base component id.
    pub fn find_by_id(&self, id: &str) -> Option<NodeRef<'_>> {
        self.id_map
            .get(id)
            .and_then(|indices| indices.first())
            .map(|&index| NodeRef::new(self, index))
    }

    /// Every node with this id or base component id, in registration order.
    pub fn find_all_by_id(&self, id: &str) -> Vec<NodeRef<'_>> {
        self.id_map
            .get(id)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&index| NodeRef::new(self, index))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn get(&self, index: NodeIndex) -> &LayoutNode {
        &self.nodes[index.0]
    }

    pub(crate) fn get_mut(&mut self, index: NodeIndex) -> &mut LayoutNode {
        &mut self.nodes[index.0]
    }

    /// Appends a node and indexes it under its id and base component id.
    ///
    /// The parent link is set by [`adopt`](Self::adopt) once the parent itself
    /// has been registered.
    fn push(&mut self, item: ComponentDescriptor, row_index: Option<usize>) -> NodeIndex {
        let index = NodeIndex(self.nodes.len());

        self.id_map.entry(item.id.clone()).or_default().push(index);
        if let Some(base) = &item.base_component_id {
            self.id_map.entry(base.clone()).or_default().push(index);
        }

        trace!(id = item.id.as_str(), index = index.0, row:? = row_index; "Registered node");

        self.nodes.push(LayoutNode {
            item,
            children: NodeChildren::None,
            parent: None,
            row_index,
        });
        index
    }

    fn adopt(&mut self, parent: NodeIndex, children: &[NodeIndex]) {
        for child in children {
            self.nodes[child.0].parent = Some(parent);
        }
    }

    fn register_expanded(&mut self, item: ExpandedItem, row_index: Option<usize>) -> NodeIndex {
        match item {
            ExpandedItem::Component(component) => self.push(component, row_index),
            ExpandedItem::Group {
                group,
                child_components,
            } => {
                let children: Vec<_> = child_components
                    .into_iter()
                    .map(|child| self.register_hierarchy(child))
                    .collect();
                let index = self.push(group, row_index);
                self.adopt(index, &children);
                self.nodes[index.0].children = NodeChildren::Components(children);
                index
            }
            ExpandedItem::RepeatingGroup { group, rows } => {
                let mut row_children = Vec::with_capacity(rows.len());
                for row in rows {
                    let items = row
                        .items
                        .into_iter()
                        .map(|child| self.register_expanded(child, Some(row.index)))
                        .collect();
                    row_children.push(RowChildren::new(row.index, items));
                }
                let index = self.push(group, row_index);
                for row in &row_children {
                    self.adopt(index, &row.items);
                }
                self.nodes[index.0].children = NodeChildren::Rows(row_children);
                index
            }
        }
    }

    /// Registers the un-expanded subtree of a non-repeating group.
    fn register_hierarchy(&mut self, item: HierarchyItem) -> NodeIndex {
        match item {
            HierarchyItem::Component(component) => self.push(component, None),
            HierarchyItem::Group {
                group,
                child_components,
            } => {
                let children: Vec<_> = child_components
                    .into_iter()
                    .map(|child| self.register_hierarchy(child))
                    .collect();
                let index = self.push(group, None);
                self.adopt(index, &children);
                self.nodes[index.0].children = NodeChildren::Components(children);
                index
            }
        }
    }
}

/// Builds the node graph of one flat layout.
///
/// This runs [`layout_as_hierarchy_with_rows`] and registers the result in a
/// new [`LayoutPage`]. The layout is not modified.
///
/// # Examples
///
/// ```
/// # use trellis::nodes_in_layout;
/// # use trellis_core::{ComponentDescriptor, RepeatingGroupState, RepeatingGroups};
/// let layout = vec![
///     ComponentDescriptor::group("g", ["f"])
///         .with_max_count(5)
///         .with_binding("group", "M.L"),
///     ComponentDescriptor::new("f", "Input").with_binding("simpleBinding", "M.L.V"),
/// ];
/// let repeating = RepeatingGroups::from([("g".to_string(), RepeatingGroupState::new(1))]);
///
/// let page = nodes_in_layout(&layout, &repeating);
/// assert_eq!(page.find_all_by_id("f").len(), 2);
///
/// let group = page.find_by_id("g").unwrap();
/// assert_eq!(group.flat(false, None).len(), 2);
/// ```
pub fn nodes_in_layout(
    layout: &[ComponentDescriptor],
    repeating_groups: &RepeatingGroups,
) -> LayoutPage {
    LayoutPage::from_expanded(layout_as_hierarchy_with_rows(layout, repeating_groups))
}

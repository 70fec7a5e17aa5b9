//! Read-only views over page nodes.

use std::collections::HashSet;

use trellis_core::ComponentDescriptor;
use trellis_parser::DataBinding;

use crate::structure::page::{LayoutNode, LayoutPage, NodeChildren, NodeIndex, RowChildren};

/// The parent of a node: another node, or the page for top-level nodes.
#[derive(Debug, Clone, Copy)]
pub enum Parent<'a> {
    Page(&'a LayoutPage),
    Node(NodeRef<'a>),
}

impl<'a> Parent<'a> {
    /// Returns the parent node, or `None` for the page.
    pub fn as_node(&self) -> Option<NodeRef<'a>> {
        match self {
            Self::Page(_) => None,
            Self::Node(node) => Some(*node),
        }
    }

    /// Returns the page for [`Parent::Page`].
    pub fn as_page(&self) -> Option<&'a LayoutPage> {
        match self {
            Self::Page(page) => Some(page),
            Self::Node(_) => None,
        }
    }
}

/// A node together with the page it lives on.
///
/// `NodeRef` is a cheap `(page, index)` pair. All tree navigation goes
/// through it, so a node can reach its parent, siblings and children without
/// holding references to them.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    page: &'a LayoutPage,
    index: NodeIndex,
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.page, other.page) && self.index == other.index
    }
}

impl Eq for NodeRef<'_> {}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(page: &'a LayoutPage, index: NodeIndex) -> Self {
        Self { page, index }
    }

    fn node(&self) -> &'a LayoutNode {
        self.page.get(self.index)
    }

    /// The component this node wraps.
    pub fn item(&self) -> &'a ComponentDescriptor {
        self.node().item()
    }

    pub fn id(&self) -> &'a str {
        &self.item().id
    }

    /// Row of the enclosing repeating group, if this node was created for one.
    pub fn row_index(&self) -> Option<usize> {
        self.node().row_index()
    }

    /// Arena position of this node on its page.
    pub fn index(&self) -> NodeIndex {
        self.index
    }

    pub fn page(&self) -> &'a LayoutPage {
        self.page
    }

    pub fn is_group(&self) -> bool {
        self.item().is_group()
    }

    /// Returns `true` if this node has been expanded into rows.
    pub fn is_repeating_group(&self) -> bool {
        matches!(self.node().children(), NodeChildren::Rows(_))
    }

    /// Rows of a repeating group. Empty for every other node.
    pub fn rows(&self) -> &'a [RowChildren] {
        match self.node().children() {
            NodeChildren::Rows(rows) => rows,
            _ => &[],
        }
    }

    pub fn parent(&self) -> Parent<'a> {
        match self.node().parent() {
            Some(parent) => Parent::Node(NodeRef::new(self.page, parent)),
            None => Parent::Page(self.page),
        }
    }

    /// Looks for a matching node upwards in the tree.
    ///
    /// Checks this node, then its siblings in the same row, then repeats the
    /// search from the parent. At the top this ends with the page's direct
    /// children.
    pub fn closest<F>(&self, matching: F) -> Option<NodeRef<'a>>
    where
        F: Fn(&ComponentDescriptor) -> bool,
    {
        self.closest_dyn(&matching)
    }

    fn closest_dyn(&self, matching: &dyn Fn(&ComponentDescriptor) -> bool) -> Option<NodeRef<'a>> {
        if matching(self.item()) {
            return Some(*self);
        }

        match self.parent() {
            Parent::Page(page) => page.closest(matching),
            Parent::Node(parent) => parent
                .find_child(matching, self.row_index())
                .or_else(|| parent.closest_dyn(matching)),
        }
    }

    fn child_indices(&self, only_in_row: Option<usize>) -> Vec<NodeIndex> {
        match (self.node().children(), only_in_row) {
            (NodeChildren::None, _) => Vec::new(),
            (NodeChildren::Components(children), _) => children.clone(),
            (NodeChildren::Rows(rows), Some(row)) => rows
                .iter()
                .find(|candidate| candidate.index() == row)
                .map(|row| row.items().to_vec())
                .unwrap_or_default(),
            (NodeChildren::Rows(rows), None) => rows
                .iter()
                .flat_map(|row| row.items().iter().copied())
                .collect(),
        }
    }

    /// Direct children.
    ///
    /// For a repeating group this yields the items of every row, in ascending
    /// row order. Use [`children_in_row`](Self::children_in_row) to scope the
    /// result to one row.
    pub fn children(&self) -> Vec<NodeRef<'a>> {
        self.resolve_children(None)
    }

    /// Direct children that belong to `row`.
    ///
    /// Only repeating groups are scoped; other groups return all children.
    pub fn children_in_row(&self, row: usize) -> Vec<NodeRef<'a>> {
        self.resolve_children(Some(row))
    }

    /// First direct child matching the predicate, optionally within one row.
    pub fn find_child<F>(&self, matching: F, only_in_row: Option<usize>) -> Option<NodeRef<'a>>
    where
        F: Fn(&ComponentDescriptor) -> bool,
    {
        self.resolve_children(only_in_row)
            .into_iter()
            .find(|child| matching(child.item()))
    }

    fn resolve_children(&self, only_in_row: Option<usize>) -> Vec<NodeRef<'a>> {
        self.child_indices(only_in_row)
            .into_iter()
            .map(|index| NodeRef::new(self.page, index))
            .collect()
    }

    /// This node and all its descendants in depth-first pre-order.
    ///
    /// `only_in_row` restricts this node's own children to one row; deeper
    /// levels are not filtered.
    pub fn flat(&self, include_groups: bool, only_in_row: Option<usize>) -> Vec<NodeRef<'a>> {
        fn walk<'a>(
            node: NodeRef<'a>,
            include_groups: bool,
            only_in_row: Option<usize>,
            out: &mut Vec<NodeRef<'a>>,
        ) {
            if include_groups || !node.is_group() {
                out.push(node);
            }
            for child in node.resolve_children(only_in_row) {
                walk(child, include_groups, None, out);
            }
        }

        let mut out = Vec::new();
        walk(*self, include_groups, only_in_row, &mut out);
        out
    }

    /// Ancestor nodes from the immediate parent upwards, excluding the page.
    pub fn parents(&self) -> Vec<NodeRef<'a>> {
        let mut parents = Vec::new();
        let mut current = self.parent().as_node();
        while let Some(node) = current {
            parents.push(node);
            current = node.parent().as_node();
        }
        parents
    }

    /// Ancestors matching the predicate, nearest first.
    pub fn parents_matching<F>(&self, matching: F) -> Vec<NodeRef<'a>>
    where
        F: Fn(&NodeRef<'a>) -> bool,
    {
        self.parents().into_iter().filter(|node| matching(node)).collect()
    }

    /// Returns `true` if this node or an enclosing group is hidden.
    ///
    /// A node is hidden by a literal `hidden: true`, or when its id or
    /// base component id is listed in `hidden_ids`.
    pub fn is_hidden(&self, hidden_ids: &HashSet<String>) -> bool {
        let hides = |item: &ComponentDescriptor| {
            item.is_hidden_literal()
                || hidden_ids.contains(&item.id)
                || item
                    .base_component_id
                    .as_ref()
                    .is_some_and(|base| hidden_ids.contains(base))
        };

        hides(self.item())
            || self
                .parents_matching(|parent| parent.is_group())
                .iter()
                .any(|parent| hides(parent.item()))
    }

    /// Rewrites an un-indexed data model path into this node's row context.
    ///
    /// The row indices found in this node's first data model binding are
    /// copied onto the matching leading segments of `path`. Nodes without a
    /// binding delegate to their parent group, which injects the row this node
    /// belongs to. Copying stops at the first segment that differs, or that
    /// already carries an index in `path`. When nothing can be matched the
    /// path is returned unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// # use trellis::nodes_in_layout;
    /// # use trellis_core::{ComponentDescriptor, RepeatingGroupState, RepeatingGroups};
    /// let layout = vec![
    ///     ComponentDescriptor::group("g", ["f"])
    ///         .with_max_count(5)
    ///         .with_binding("group", "Model.Group"),
    ///     ComponentDescriptor::new("f", "Input").with_binding("simpleBinding", "Model.Group.Name"),
    /// ];
    /// let repeating = RepeatingGroups::from([("g".to_string(), RepeatingGroupState::new(2))]);
    /// let page = nodes_in_layout(&layout, &repeating);
    ///
    /// let field = page.find_by_id("f-2").unwrap();
    /// assert_eq!(field.transpose_data_model("Model.Group.Age"), "Model.Group[2].Age");
    /// assert_eq!(field.transpose_data_model("Model.Group[5].Age"), "Model.Group[5].Age");
    /// ```
    pub fn transpose_data_model(&self, path: &str) -> String {
        self.transpose_with_row(path, None)
    }

    fn transpose_with_row(&self, path: &str, row_index: Option<usize>) -> String {
        let Some(own) = self.item().first_binding() else {
            return match self.parent() {
                Parent::Node(parent) => parent.transpose_with_row(path, self.row_index()),
                Parent::Page(_) => path.to_string(),
            };
        };

        let ours = DataBinding::parse(own);
        let mut theirs = DataBinding::parse(path);
        let last = ours.len().saturating_sub(1);

        for segment in ours.segments() {
            let Some(target) = theirs.at_mut(segment.parent_index()) else {
                break;
            };
            if target.base() != segment.base() {
                break;
            }

            let array_index = if segment.parent_index() == last && self.is_group() {
                row_index
            } else {
                segment.array_index()
            };
            let Some(array_index) = array_index else {
                continue;
            };

            if target.has_array_index() {
                break;
            }
            target.set_array_index(Some(array_index));
        }

        theirs.to_string()
    }
}

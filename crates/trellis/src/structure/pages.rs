//! Layout sets spanning several pages.

use indexmap::IndexMap;
use log::{debug, info};

use trellis_core::{ComponentDescriptor, RepeatingGroups};

use crate::structure::{
    node::NodeRef,
    page::{LayoutPage, nodes_in_layout},
};

/// The pages of a layout set, keyed by page name.
///
/// Pages keep their insertion order. Component ids may collide across pages;
/// lookups then prefer the current page and fall back to the others in
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct LayoutPages {
    current: String,
    pages: IndexMap<String, LayoutPage>,
}

impl LayoutPages {
    /// Creates a collection with `current` as the current page name.
    ///
    /// The name does not have to exist in `pages`.
    pub fn new(current: impl Into<String>, pages: IndexMap<String, LayoutPage>) -> Self {
        Self {
            current: current.into(),
            pages,
        }
    }

    /// Name the collection considers current.
    pub fn current_name(&self) -> &str {
        &self.current
    }

    /// The current page, or the first page if the current name is unknown.
    pub fn current(&self) -> Option<&LayoutPage> {
        self.pages
            .get(&self.current)
            .or_else(|| self.pages.values().next())
    }

    /// Looks up a page by name.
    pub fn find_layout(&self, name: &str) -> Option<&LayoutPage> {
        self.pages.get(name)
    }

    /// All pages in insertion order.
    pub fn all(&self) -> &IndexMap<String, LayoutPage> {
        &self.pages
    }

    /// Every page except `name`, in insertion order.
    pub fn pages_except<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a LayoutPage> + 'a {
        self.pages
            .iter()
            .filter(move |(key, _)| key.as_str() != name)
            .map(|(_, page)| page)
    }

    /// First node with this id, preferring the current page.
    pub fn find_component_by_id(&self, id: &str) -> Option<NodeRef<'_>> {
        if let Some(node) = self.pages.get(&self.current).and_then(|page| page.find_by_id(id)) {
            return Some(node);
        }

        self.pages_except(&self.current)
            .find_map(|page| page.find_by_id(id))
    }

    /// Every node with this id on every page, in page order.
    pub fn find_all_components_by_id(&self, id: &str) -> Vec<NodeRef<'_>> {
        self.pages
            .values()
            .flat_map(|page| page.find_all_by_id(id))
            .collect()
    }

    /// [`NodeRef::closest`] that continues on other pages.
    ///
    /// When the upward search from `node` reaches its page without a match,
    /// the top-level nodes of the remaining pages are searched in insertion
    /// order.
    pub fn closest<'a, F>(&'a self, node: NodeRef<'a>, matching: F) -> Option<NodeRef<'a>>
    where
        F: Fn(&ComponentDescriptor) -> bool,
    {
        if let Some(found) = node.closest(&matching) {
            return Some(found);
        }

        self.pages
            .values()
            .filter(|page| !std::ptr::eq(*page, node.page()))
            .find_map(|page| page.closest(&matching))
    }

    /// Name of the page `node` belongs to, if it is part of this collection.
    pub fn page_name_of(&self, node: NodeRef<'_>) -> Option<&str> {
        self.pages
            .iter()
            .find(|(_, page)| std::ptr::eq(*page, node.page()))
            .map(|(name, _)| name.as_str())
    }
}

/// Builds one [`LayoutPage`] per layout and collects them.
///
/// Every page is expanded with the same repeating-group index.
///
/// # Examples
///
/// ```
/// # use indexmap::IndexMap;
/// # use trellis::nodes_in_layouts;
/// # use trellis_core::{ComponentDescriptor, RepeatingGroups};
/// let mut layouts = IndexMap::new();
/// layouts.insert("first".to_string(), vec![ComponentDescriptor::new("name", "Input")]);
/// layouts.insert("second".to_string(), vec![ComponentDescriptor::new("name", "Input")]);
///
/// let pages = nodes_in_layouts(&layouts, "second", &RepeatingGroups::new());
/// let found = pages.find_component_by_id("name").unwrap();
/// assert_eq!(pages.page_name_of(found), Some("second"));
/// assert_eq!(pages.find_all_components_by_id("name").len(), 2);
/// ```
pub fn nodes_in_layouts(
    layouts: &IndexMap<String, Vec<ComponentDescriptor>>,
    current: &str,
    repeating_groups: &RepeatingGroups,
) -> LayoutPages {
    info!(pages = layouts.len(), current = current; "Building layout pages");

    let pages = layouts
        .iter()
        .map(|(name, layout)| {
            debug!(page = name.as_str(); "Building page");
            (name.clone(), nodes_in_layout(layout, repeating_groups))
        })
        .collect();

    LayoutPages::new(current, pages)
}

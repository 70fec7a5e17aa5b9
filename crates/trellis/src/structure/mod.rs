//! Traversable node structure built from row-expanded layouts.
//!
//! - [`LayoutPage`]: arena of all nodes of one page, with an id index.
//! - [`NodeRef`]: a node viewed through its page, for upward and downward navigation.
//! - [`LayoutPages`]: an ordered set of pages with cross-page lookups.

mod node;
mod page;
mod pages;

pub use node::{NodeRef, Parent};
pub use page::{LayoutNode, LayoutPage, NodeChildren, NodeIndex, RowChildren, nodes_in_layout};
pub use pages::{LayoutPages, nodes_in_layouts};

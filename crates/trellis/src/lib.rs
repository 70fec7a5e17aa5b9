//! Trellis - resolve flat form layouts into traversable component hierarchies.
//!
//! A form layout is authored as a flat list of components where groups
//! reference their children by id. Trellis turns such a list into a tree,
//! expands repeating groups into one set of child instances per data row, and
//! indexes the result in a [`LayoutPage`] that supports upward and downward
//! navigation, id lookups and data model path transposition. Expressions in
//! component attributes can then be resolved against form data.
//!
//! The pipeline stages are available individually:
//!
//! 1. [`layout_as_hierarchy`] - flat list to nested tree
//! 2. [`layout_as_hierarchy_with_rows`] - tree with repeating groups expanded
//! 3. [`nodes_in_layout`] / [`nodes_in_layouts`] - indexed node graph
//! 4. [`resolved_nodes_in_layout`] / [`resolved_nodes_in_layouts`] - node
//!    graph with expressions evaluated
//!
//! [`LayoutBuilder`] drives the whole pipeline from layout source text.

pub mod config;
pub mod expr;

mod error;
mod export;
mod hierarchy;
mod resolve;
mod rows;
mod structure;

pub use trellis_core::{
    ComponentDescriptor, DataSources, GroupEdit, InstanceContext, RepeatingGroupState,
    RepeatingGroups, component, data_sources, repeating,
};
pub use trellis_parser::{DataBinding, LayoutDocument};

pub use error::TrellisError;
pub use export::{Exporter, FlatExporter, JsonExporter, TreeExporter, exporter_for};
pub use hierarchy::{HierarchyItem, layout_as_hierarchy};
pub use resolve::{resolve_page, resolve_pages, resolved_nodes_in_layout, resolved_nodes_in_layouts};
pub use rows::{ExpandedItem, GroupRow, layout_as_hierarchy_with_rows};
pub use structure::{
    LayoutNode, LayoutPage, LayoutPages, NodeChildren, NodeIndex, NodeRef, Parent, RowChildren,
    nodes_in_layout, nodes_in_layouts,
};

use indexmap::IndexMap;
use log::{debug, info, trace, warn};

use config::AppConfig;

/// Builder for loading, resolving and rendering form layouts.
///
/// # Examples
///
/// ```
/// use indexmap::IndexMap;
/// use trellis::{LayoutBuilder, RepeatingGroupState, RepeatingGroups};
///
/// let source = r#"[
///     {"id": "g", "type": "Group", "maxCount": 5, "children": ["f"],
///      "dataModelBindings": {"group": "M.L"}},
///     {"id": "f", "type": "Input", "dataModelBindings": {"simpleBinding": "M.L.V"}}
/// ]"#;
///
/// let builder = LayoutBuilder::default();
/// let document = builder.parse(source).expect("Failed to parse");
///
/// let mut layouts = IndexMap::new();
/// layouts.insert("main".to_string(), document.into_components());
/// let repeating = RepeatingGroups::from([("g".to_string(), RepeatingGroupState::new(1))]);
///
/// let pages = builder.build_pages(&layouts, "main", &repeating);
/// let output = builder.render(&pages).expect("Failed to render");
/// assert!(output.contains("f-1"));
/// ```
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    config: AppConfig,
}

impl LayoutBuilder {
    /// Create a new layout builder with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Expression failure policy and output settings
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration of this builder.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Parse and validate one layout document.
    ///
    /// Validation warnings are logged and kept on the returned document.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Parse`] with the source attached when the
    /// document is malformed or fails validation.
    pub fn parse(&self, source: &str) -> Result<LayoutDocument, TrellisError> {
        info!("Parsing layout");

        let document = trellis_parser::parse_layout(source)
            .map_err(|err| TrellisError::new_parse_error(err, source))?;

        for warning in document.warnings() {
            warn!(
                code:% = warning.code(),
                component = warning.component().unwrap_or_default();
                "{}", warning.message()
            );
        }

        debug!(components = document.components().len(); "Layout parsed successfully");
        trace!(document:? = document; "Parsed layout");

        Ok(document)
    }

    /// Build the node graph of every page without resolving expressions.
    pub fn build_pages(
        &self,
        layouts: &IndexMap<String, Vec<ComponentDescriptor>>,
        current: &str,
        repeating_groups: &RepeatingGroups,
    ) -> LayoutPages {
        nodes_in_layouts(layouts, current, repeating_groups)
    }

    /// Build the node graph of every page and resolve its expressions.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Expression`] for the first failing expression
    /// unless the configuration substitutes defaults.
    pub fn resolve_pages(
        &self,
        layouts: &IndexMap<String, Vec<ComponentDescriptor>>,
        current: &str,
        repeating_groups: &RepeatingGroups,
        data_sources: &DataSources,
    ) -> Result<LayoutPages, TrellisError> {
        let pages = resolved_nodes_in_layouts(
            layouts,
            current,
            repeating_groups,
            data_sources,
            self.config.resolve(),
        )?;

        info!(pages = pages.all().len(); "Layout pages resolved");
        Ok(pages)
    }

    /// Render pages in the configured output format.
    ///
    /// # Errors
    ///
    /// Returns [`TrellisError::Serialization`] if JSON output fails.
    pub fn render(&self, pages: &LayoutPages) -> Result<String, TrellisError> {
        let output = self.config.output();
        info!(format:% = output.format(); "Rendering layout pages");

        exporter_for(output).export(pages)
    }
}

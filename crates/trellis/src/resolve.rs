//! Expression resolution over built node graphs.
//!
//! Resolution walks a page in registration order and replaces every
//! expression found in a node's attributes by its value. Each node is
//! evaluated against the page resolved so far, so an expression observes the
//! resolved attributes of nodes registered before it and the authored
//! attributes of the rest. Groups are registered after their descendants:
//! while a child is resolved, an enclosing group's `hidden` expression has
//! not been evaluated yet and does not hide the child.
//!
//! The `edit` settings of a repeating group are resolved once per row
//! instead, in the context of that row's first item, and stored on the row.

use indexmap::IndexMap;
use log::{debug, info, warn};
use serde_json::{Map, Value};

use trellis_core::{ComponentDescriptor, DataSources, RepeatingGroups};

use crate::{
    TrellisError,
    config::{OnError, ResolveConfig},
    expr::{BuiltinEvaluator, ExprContext, ExpressionEvaluator},
    structure::{LayoutPage, LayoutPages, NodeIndex, nodes_in_layout, nodes_in_layouts},
};

/// Attribute resolved per row on repeating groups.
const PER_ROW_KEY: &str = "edit";

/// Structural attribute never evaluated.
const CHILDREN_KEY: &str = "children";

/// Attributes with a documented fallback when their expression fails.
const DEFAULTS: &[(&str, bool)] = &[("hidden", false), ("required", false), ("readOnly", false)];

/// Builds the node graph of one layout and resolves its expressions.
///
/// Uses the [`BuiltinEvaluator`]. The returned page holds the resolved
/// attributes; the input layout is not modified.
///
/// # Errors
///
/// Returns [`TrellisError::Expression`] for the first failing expression when
/// `config` uses [`OnError::Fail`].
pub fn resolved_nodes_in_layout(
    layout: &[ComponentDescriptor],
    repeating_groups: &RepeatingGroups,
    data_sources: &DataSources,
    config: &ResolveConfig,
) -> Result<LayoutPage, TrellisError> {
    let page = nodes_in_layout(layout, repeating_groups);
    resolve_page(&page, &[], data_sources, config, &BuiltinEvaluator)
}

/// Builds and resolves every page of a layout set.
///
/// While a page is resolved, `component` lookups that find nothing on the
/// page continue on the other pages, in their unresolved form.
///
/// # Errors
///
/// Resolution is all or nothing: the first failure aborts the whole set when
/// `config` uses [`OnError::Fail`].
pub fn resolved_nodes_in_layouts(
    layouts: &IndexMap<String, Vec<ComponentDescriptor>>,
    current: &str,
    repeating_groups: &RepeatingGroups,
    data_sources: &DataSources,
    config: &ResolveConfig,
) -> Result<LayoutPages, TrellisError> {
    let unresolved = nodes_in_layouts(layouts, current, repeating_groups);
    resolve_pages(&unresolved, data_sources, config, &BuiltinEvaluator)
}

/// Resolves every page of an already built collection.
pub fn resolve_pages(
    pages: &LayoutPages,
    data_sources: &DataSources,
    config: &ResolveConfig,
    evaluator: &dyn ExpressionEvaluator,
) -> Result<LayoutPages, TrellisError> {
    info!(pages = pages.all().len(); "Resolving expressions");

    let mut resolved = IndexMap::with_capacity(pages.all().len());
    for (name, page) in pages.all() {
        debug!(page = name.as_str(); "Resolving page");
        let others: Vec<&LayoutPage> = pages.pages_except(name).collect();
        resolved.insert(
            name.clone(),
            resolve_page(page, &others, data_sources, config, evaluator)?,
        );
    }

    Ok(LayoutPages::new(pages.current_name(), resolved))
}

/// Resolves the expressions of one page into a new page.
///
/// `other_pages` are consulted by `component` lookups that fail on `page`.
pub fn resolve_page(
    page: &LayoutPage,
    other_pages: &[&LayoutPage],
    data_sources: &DataSources,
    config: &ResolveConfig,
    evaluator: &dyn ExpressionEvaluator,
) -> Result<LayoutPage, TrellisError> {
    let order: Vec<NodeIndex> = page.flat(true).map(|node| node.index()).collect();
    let resolver = Resolver {
        evaluator,
        on_error: config.on_error(),
    };

    let mut resolved = page.clone();
    for index in order {
        let (item, row_expressions) = {
            let Some(node) = resolved.node(index) else {
                continue;
            };
            let ctx = ExprContext::for_node(data_sources, node).with_other_pages(other_pages.to_vec());

            let mut input = serde_json::to_value(node.item())?;
            let mut per_row = None;
            if let Some(object) = input.as_object_mut() {
                object.remove(CHILDREN_KEY);
                if node.is_repeating_group() {
                    per_row = object.remove(PER_ROW_KEY);
                }
            }

            let output = resolver.resolve(&input, &ctx, node.id(), "")?;
            let mut item: ComponentDescriptor = serde_json::from_value(output)?;
            item.children = node.item().children.clone();

            let mut row_expressions = Vec::new();
            if let Some(per_row) = per_row {
                item.edit = node.item().edit.clone();
                for (position, row) in node.rows().iter().enumerate() {
                    let Some(first) = row.items().first().and_then(|&first| resolved.node(first))
                    else {
                        continue;
                    };
                    let row_ctx = ExprContext::for_node(data_sources, first)
                        .with_other_pages(other_pages.to_vec());
                    if let Some(value) =
                        resolver.resolve_only_expressions(&per_row, &row_ctx, node.id(), PER_ROW_KEY)?
                    {
                        let mut wrapped = Map::new();
                        wrapped.insert(PER_ROW_KEY.to_string(), value);
                        row_expressions.push((position, Value::Object(wrapped)));
                    }
                }
            }

            (item, row_expressions)
        };

        let target = resolved.get_mut(index);
        target.set_item(item);
        let rows = target.rows_mut();
        for (position, value) in row_expressions {
            if let Some(row) = rows.get_mut(position) {
                row.set_group_expressions(value);
            }
        }
    }

    debug!(nodes = resolved.len(); "Page resolved");

    Ok(resolved)
}

struct Resolver<'e> {
    evaluator: &'e dyn ExpressionEvaluator,
    on_error: OnError,
}

impl Resolver<'_> {
    /// Returns `value` with every expression replaced by its result.
    fn resolve(
        &self,
        value: &Value,
        ctx: &ExprContext<'_>,
        component: &str,
        path: &str,
    ) -> Result<Value, TrellisError> {
        if self.evaluator.is_expression(value) {
            return self.evaluate(value, ctx, component, path);
        }

        match value {
            Value::Object(object) => {
                let mut out = Map::with_capacity(object.len());
                for (key, child) in object {
                    let child_path = join(path, key);
                    out.insert(key.clone(), self.resolve(child, ctx, component, &child_path)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| self.resolve(item, ctx, component, &format!("{path}[{i}]")))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            other => Ok(other.clone()),
        }
    }

    /// Like [`resolve`](Self::resolve), but drops everything that was not an
    /// expression. Returns `None` when nothing is left.
    fn resolve_only_expressions(
        &self,
        value: &Value,
        ctx: &ExprContext<'_>,
        component: &str,
        path: &str,
    ) -> Result<Option<Value>, TrellisError> {
        if self.evaluator.is_expression(value) {
            return self.evaluate(value, ctx, component, path).map(Some);
        }

        let Value::Object(object) = value else {
            return Ok(None);
        };

        let mut out = Map::new();
        for (key, child) in object {
            let child_path = join(path, key);
            if let Some(resolved) = self.resolve_only_expressions(child, ctx, component, &child_path)? {
                out.insert(key.clone(), resolved);
            }
        }
        Ok((!out.is_empty()).then_some(Value::Object(out)))
    }

    fn evaluate(
        &self,
        expr: &Value,
        ctx: &ExprContext<'_>,
        component: &str,
        path: &str,
    ) -> Result<Value, TrellisError> {
        match self.evaluator.evaluate(expr, ctx) {
            Ok(value) => Ok(value),
            Err(err) => match self.on_error {
                OnError::Fail => Err(err.in_component(component, path).into()),
                OnError::Default => {
                    let fallback = default_for(path);
                    warn!(
                        component = component,
                        path = path,
                        fallback:% = fallback,
                        err:% = err;
                        "Expression failed, using default"
                    );
                    Ok(fallback)
                }
            },
        }
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn default_for(path: &str) -> Value {
    DEFAULTS
        .iter()
        .find(|(key, _)| *key == path)
        .map_or(Value::Null, |(_, value)| Value::Bool(*value))
}

//! Dynamic expressions embedded in component attributes.
//!
//! An expression is a JSON array whose first element names a function, such
//! as `["equals", ["dataModel", "Person.Age"], 18]`. Arguments are literals or
//! nested expressions. Expressions are evaluated against an [`ExprContext`]:
//! the [`DataSources`] of the form plus, optionally, the node the expression
//! belongs to, which scopes data model paths and component lookups to the
//! node's repeating-group row.
//!
//! [`BuiltinEvaluator`] implements the standard function library. Alternative
//! engines plug into expression resolution through [`ExpressionEvaluator`].
//!
//! # Example
//!
//! ```
//! # use serde_json::json;
//! # use trellis::expr::{BuiltinEvaluator, ExprContext, ExpressionEvaluator};
//! # use trellis_core::DataSources;
//! let sources = DataSources::with_form_data(json!({"Person": {"Age": "20"}}));
//! let ctx = ExprContext::new(&sources);
//!
//! let expr = json!(["greaterThanEq", ["dataModel", "Person.Age"], 18]);
//! assert_eq!(BuiltinEvaluator.evaluate(&expr, &ctx).unwrap(), json!(true));
//! ```

mod functions;
mod value;

use serde_json::Value;
use thiserror::Error;

use trellis_core::DataSources;

use crate::structure::{LayoutPage, NodeRef};

/// Errors raised while evaluating an expression.
#[derive(Debug, Error, PartialEq)]
pub enum ExprError {
    #[error("Unknown function `{0}`")]
    UnknownFunction(String),

    #[error("Invalid expression `{0}`: expected a function name as first element")]
    InvalidExpression(String),

    #[error("Function `{function}` expects {expected} argument(s), got {found}")]
    ArgumentCount {
        function: String,
        expected: &'static str,
        found: usize,
    },

    #[error("Function `{function}`: {message}")]
    InvalidArgument { function: String, message: String },

    #[error("Expected {target}, got value {value}")]
    Cast { value: String, target: &'static str },

    #[error("Unknown instance context property `{0}`")]
    UnknownInstanceContext(String),

    #[error("Unable to find component with identifier `{0}` or it does not have a simpleBinding")]
    ComponentNotFound(String),

    #[error("{component} at `{path}`: {source}")]
    InComponent {
        component: String,
        path: String,
        #[source]
        source: Box<ExprError>,
    },
}

impl ExprError {
    pub(crate) fn argument(function: &str, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            function: function.to_string(),
            message: message.into(),
        }
    }

    /// Attaches the component id and attribute path the error came from.
    pub(crate) fn in_component(self, component: &str, path: &str) -> Self {
        Self::InComponent {
            component: component.to_string(),
            path: path.to_string(),
            source: Box::new(self),
        }
    }
}

/// Everything an expression can observe while it is evaluated.
#[derive(Debug, Clone)]
pub struct ExprContext<'a> {
    data_sources: &'a DataSources,
    node: Option<NodeRef<'a>>,
    other_pages: Vec<&'a LayoutPage>,
}

impl<'a> ExprContext<'a> {
    /// A context without a node. Data model paths are used as given.
    pub fn new(data_sources: &'a DataSources) -> Self {
        Self {
            data_sources,
            node: None,
            other_pages: Vec::new(),
        }
    }

    /// A context scoped to `node`.
    pub fn for_node(data_sources: &'a DataSources, node: NodeRef<'a>) -> Self {
        Self {
            data_sources,
            node: Some(node),
            other_pages: Vec::new(),
        }
    }

    /// Pages searched by `component` when the node's own page has no match.
    pub fn with_other_pages(mut self, pages: Vec<&'a LayoutPage>) -> Self {
        self.other_pages = pages;
        self
    }

    pub fn data_sources(&self) -> &'a DataSources {
        self.data_sources
    }

    pub fn node(&self) -> Option<NodeRef<'a>> {
        self.node
    }

    pub fn other_pages(&self) -> &[&'a LayoutPage] {
        &self.other_pages
    }
}

/// An expression engine.
pub trait ExpressionEvaluator {
    /// Returns `true` if `value` should be evaluated rather than kept as data.
    fn is_expression(&self, value: &Value) -> bool;

    /// Evaluates an expression. Non-expression values evaluate to themselves.
    fn evaluate(&self, expr: &Value, ctx: &ExprContext<'_>) -> Result<Value, ExprError>;
}

/// The standard expression function library.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEvaluator;

impl ExpressionEvaluator for BuiltinEvaluator {
    fn is_expression(&self, value: &Value) -> bool {
        match value.as_array().and_then(|items| items.first()) {
            Some(Value::String(name)) => functions::is_known(name),
            _ => false,
        }
    }

    fn evaluate(&self, expr: &Value, ctx: &ExprContext<'_>) -> Result<Value, ExprError> {
        let Value::Array(items) = expr else {
            return Ok(expr.clone());
        };

        let Some(Value::String(name)) = items.first() else {
            return Err(ExprError::InvalidExpression(expr.to_string()));
        };

        let args = items[1..]
            .iter()
            .map(|arg| self.evaluate(arg, ctx))
            .collect::<Result<Vec<_>, _>>()?;

        functions::call(name, &args, ctx)
    }
}

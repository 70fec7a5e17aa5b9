//! # Trellis Parser
//!
//! Parsing for Trellis form layouts. This crate turns layout documents and
//! data model binding paths into typed values.
//!
//! ## Usage
//!
//! ```
//! # use trellis_parser::{parse_layout, DataBinding, error::ParseError};
//!
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"[
//!         {"id": "people", "type": "Group", "maxCount": 9, "children": ["name"],
//!          "dataModelBindings": {"group": "Model.People"}},
//!         {"id": "name", "type": "Input",
//!          "dataModelBindings": {"simpleBinding": "Model.People.Name"}}
//!     ]"#;
//!
//!     let document = parse_layout(source)?;
//!     assert_eq!(document.components().len(), 2);
//!
//!     let binding = DataBinding::parse("Model.People[2].Name");
//!     assert_eq!(binding.at(1).and_then(|s| s.array_index()), Some(2));
//!     Ok(())
//! }
//! ```

pub mod error;

mod binding;
mod document;
mod span;
mod validate;

pub use binding::{DataBinding, PathSegment};
pub use document::{LayoutDocument, parse_layout};
pub use span::Span;
pub use validate::validate_layout;

//! Component descriptors, the flat input unit of a form layout.
//!
//! A layout is an ordered list of [`ComponentDescriptor`]s. Containers are
//! descriptors whose `type` is [`GROUP_TYPE`]; they reference their children by
//! id instead of nesting them. Every attribute the resolver does not need to
//! understand is kept verbatim in [`ComponentDescriptor::extra`], so a
//! descriptor survives a deserialize/serialize cycle unchanged.
//!
//! # Example
//!
//! ```
//! # use trellis_core::component::ComponentDescriptor;
//! let group: ComponentDescriptor = serde_json::from_str(
//!     r#"{"id": "g", "type": "Group", "maxCount": 3, "children": ["name"],
//!         "dataModelBindings": {"group": "Person.Children"}}"#,
//! ).unwrap();
//!
//! assert!(group.is_group());
//! assert!(group.is_repeating());
//! assert_eq!(group.group_binding(), Some("Person.Children"));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The `type` discriminator marking a container component.
pub const GROUP_TYPE: &str = "Group";

/// Binding key holding the array path of a repeating group.
pub const GROUP_BINDING_KEY: &str = "group";

/// Binding key holding the value path of a plain input component.
pub const SIMPLE_BINDING_KEY: &str = "simpleBinding";

/// Ordered mapping from logical binding name to data model path.
pub type DataModelBindings = IndexMap<String, String>;

/// A single, flat component declaration as authored in a layout file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDescriptor {
    /// Component id. Unique within a layout before repeating-group expansion.
    pub id: String,

    /// Type discriminator; [`GROUP_TYPE`] marks a container.
    #[serde(rename = "type")]
    pub kind: String,

    /// Data model bindings, in authored order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_model_bindings: Option<DataModelBindings>,

    /// Either a literal boolean or an unresolved expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<Value>,

    /// Child ids of a group, optionally prefixed with `"<page>:"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,

    /// A group repeats when this is greater than one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_count: Option<u32>,

    /// Group edit configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit: Option<GroupEdit>,

    /// Mapping whose keys may contain `[{0}]` style row placeholders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mapping: Option<IndexMap<String, String>>,

    /// Id of the template this row instance was cloned from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_component_id: Option<String>,

    /// Bindings of the template before they were rewritten for a row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_data_model_bindings: Option<DataModelBindings>,

    /// Page index taken from a multi-page child reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multi_page_index: Option<u32>,

    /// Every other attribute, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ComponentDescriptor {
    /// Creates a bare descriptor with the given id and type.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            data_model_bindings: None,
            hidden: None,
            children: None,
            max_count: None,
            edit: None,
            mapping: None,
            base_component_id: None,
            base_data_model_bindings: None,
            multi_page_index: None,
            extra: Map::new(),
        }
    }

    /// Creates a group descriptor referencing the given child ids.
    pub fn group<I, S>(id: impl Into<String>, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut group = Self::new(id, GROUP_TYPE);
        group.children = Some(children.into_iter().map(Into::into).collect());
        group
    }

    /// Adds a data model binding (builder style).
    pub fn with_binding(mut self, key: impl Into<String>, path: impl Into<String>) -> Self {
        self.data_model_bindings
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), path.into());
        self
    }

    /// Sets `maxCount` (builder style).
    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = Some(max_count);
        self
    }

    /// Sets the `hidden` attribute (builder style).
    pub fn with_hidden(mut self, hidden: impl Into<Value>) -> Self {
        self.hidden = Some(hidden.into());
        self
    }

    /// Sets the group edit configuration (builder style).
    pub fn with_edit(mut self, edit: GroupEdit) -> Self {
        self.edit = Some(edit);
        self
    }

    /// Returns `true` if this descriptor is a container.
    pub fn is_group(&self) -> bool {
        self.kind == GROUP_TYPE
    }

    /// Returns `true` if this descriptor is a group repeated per data row.
    pub fn is_repeating(&self) -> bool {
        self.is_group() && self.max_count.is_some_and(|max| max > 1)
    }

    /// Returns `true` if the group spreads its children over several pages.
    pub fn is_multi_page(&self) -> bool {
        self.edit.as_ref().is_some_and(|edit| edit.multi_page)
    }

    /// Returns `true` only for a literal `hidden: true`.
    ///
    /// Unresolved expressions count as visible.
    pub fn is_hidden_literal(&self) -> bool {
        matches!(self.hidden, Some(Value::Bool(true)))
    }

    /// The `group` binding of a repeating group, if any.
    pub fn group_binding(&self) -> Option<&str> {
        self.binding(GROUP_BINDING_KEY)
    }

    /// The binding stored under `key`, if any.
    pub fn binding(&self, key: &str) -> Option<&str> {
        self.data_model_bindings
            .as_ref()
            .and_then(|bindings| bindings.get(key))
            .map(String::as_str)
    }

    /// The first binding in authored order.
    pub fn first_binding(&self) -> Option<&str> {
        self.data_model_bindings
            .as_ref()
            .and_then(|bindings| bindings.values().next())
            .map(String::as_str)
    }

    /// Returns `true` if `id` names this descriptor or the template it came from.
    pub fn matches_id(&self, id: &str) -> bool {
        self.id == id || self.base_component_id.as_deref() == Some(id)
    }
}

/// Edit configuration of a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupEdit {
    /// Children are prefixed with a page index (`"0:child"`).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub multi_page: bool,

    /// Row range overrides (`start` and `stop`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filter: Vec<FilterEntry>,

    /// Every other edit attribute, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GroupEdit {
    /// Looks up a filter value by key.
    pub fn filter_value(&self, key: &str) -> Option<&str> {
        self.filter
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| entry.value.as_str())
    }
}

/// A `{ key, value }` pair of a group edit filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub key: String,
    pub value: String,
}

impl FilterEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A child reference of a group, with the multi-page prefix split off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildRef<'a> {
    pub id: &'a str,
    pub multi_page_index: Option<u32>,
}

impl ComponentDescriptor {
    /// Child references of a group, multi-page prefixes stripped.
    ///
    /// Prefixes are only honored when the group is multi-page. A prefix that
    /// is not a number leaves the reference untouched.
    pub fn child_refs(&self) -> Vec<ChildRef<'_>> {
        let Some(children) = &self.children else {
            return Vec::new();
        };
        let multi_page = self.is_multi_page();

        children
            .iter()
            .map(|child| {
                if multi_page {
                    split_multi_page_ref(child)
                } else {
                    ChildRef {
                        id: child,
                        multi_page_index: None,
                    }
                }
            })
            .collect()
    }
}

fn split_multi_page_ref(child: &str) -> ChildRef<'_> {
    match child.split_once(':') {
        Some((page, id)) if !page.is_empty() && page.bytes().all(|b| b.is_ascii_digit()) => {
            ChildRef {
                id,
                multi_page_index: page.parse().ok(),
            }
        }
        _ => ChildRef {
            id: child,
            multi_page_index: None,
        },
    }
}

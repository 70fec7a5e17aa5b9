//! Data sources consulted while resolving expressions.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Everything an expression may read besides the layout itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSources {
    /// Form data, either a nested document or an object of flat dotted keys.
    #[serde(default)]
    pub form_data: Value,

    /// Frontend application settings.
    #[serde(default)]
    pub application_settings: Map<String, Value>,

    /// Metadata about the running instance.
    #[serde(default)]
    pub instance_context: Option<InstanceContext>,

    /// Component ids hidden by rules outside the layout.
    #[serde(default)]
    pub hidden_fields: HashSet<String>,
}

impl DataSources {
    /// Data sources with only form data set.
    pub fn with_form_data(form_data: Value) -> Self {
        Self {
            form_data,
            ..Default::default()
        }
    }
}

/// Instance metadata readable through `instanceContext`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceContext {
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub instance_owner_party_id: Option<String>,
    #[serde(default)]
    pub instance_owner_party_type: Option<String>,
}

impl InstanceContext {
    /// Looks up a field by its camelCase key.
    ///
    /// Returns `None` for unknown keys and `Some(None)` for known keys
    /// without a value.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        let value = match key {
            "instanceId" => &self.instance_id,
            "appId" => &self.app_id,
            "instanceOwnerPartyId" => &self.instance_owner_party_id,
            "instanceOwnerPartyType" => &self.instance_owner_party_type,
            _ => return None,
        };
        Some(value.as_deref())
    }
}

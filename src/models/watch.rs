use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::common::{Attribute, Tuple};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub snap_token: String,
}

impl WatchRequest {
    /// Starts from the head when no snap token is given.
    pub fn new(tenant_id: impl Into<String>, snap_token: Option<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            snap_token: snap_token.unwrap_or_default(),
        }
    }
}

/// Restricts a change stream to tuples for one entity type and relation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPermissionsRequest {
    pub tenant_id: String,
    pub entity_type: String,
    pub permission: String,
    pub snap_token: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataChangeOperation {
    #[serde(rename = "OPERATION_CREATE")]
    Create,
    #[serde(rename = "OPERATION_DELETE")]
    Delete,
    #[default]
    #[serde(rename = "OPERATION_UNSPECIFIED")]
    #[serde(other)]
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataChange {
    #[serde(default)]
    pub operation: DataChangeOperation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuple: Option<Tuple>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<Attribute>,
}

impl DataChange {
    pub fn touches(&self, entity_type: &str, relation: &str) -> bool {
        self.tuple
            .as_ref()
            .is_some_and(|tuple| tuple.entity.entity_type == entity_type && tuple.relation == relation)
    }
}

/// One batch of committed changes, delivered per stream frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataChanges {
    #[serde(default)]
    pub snap_token: String,
    #[serde(default)]
    pub data_changes: Vec<DataChange>,
}

impl DataChanges {
    pub fn retain_touching(mut self, entity_type: &str, relation: &str) -> Self {
        self.data_changes
            .retain(|change| change.touches(entity_type, relation));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WatchResult {
    #[serde(default)]
    pub changes: DataChanges,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub details: Vec<Value>,
}

/// A single newline-delimited frame of the watch stream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct WatchFrame {
    #[serde(default)]
    pub result: Option<WatchResult>,
    #[serde(default)]
    pub error: Option<StreamError>,
}

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSchemaRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub schema: String,
}

impl WriteSchemaRequest {
    pub fn new(tenant_id: impl Into<String>, schema: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            schema: schema.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSchemaResponse {
    #[serde(default)]
    pub schema_version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaMetadata {
    #[serde(default)]
    pub schema_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadSchemaRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub metadata: SchemaMetadata,
}

impl ReadSchemaRequest {
    /// Reads the head schema when `schema_version` is `None`.
    pub fn new(tenant_id: impl Into<String>, schema_version: Option<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            metadata: SchemaMetadata {
                schema_version: schema_version.unwrap_or_default(),
            },
        }
    }
}

/// Compiled schema definitions, left as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadSchemaResponse {
    #[serde(default)]
    pub schema: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSchemasRequest {
    #[serde(skip)]
    pub tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuous_token: Option<String>,
}

impl ListSchemasRequest {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            page_size: None,
            continuous_token: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaVersion {
    pub version: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSchemasResponse {
    #[serde(default)]
    pub head: String,
    #[serde(default)]
    pub schemas: Vec<SchemaVersion>,
    #[serde(default)]
    pub continuous_token: String,
}

/// Statements to add, remove or replace inside one entity definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialSchemaUpdate {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub write: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delete: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub update: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartialWriteSchemaRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub metadata: SchemaMetadata,
    pub partials: BTreeMap<String, PartialSchemaUpdate>,
}

impl PartialWriteSchemaRequest {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            metadata: SchemaMetadata::default(),
            partials: BTreeMap::new(),
        }
    }

    pub fn entity(mut self, name: impl Into<String>, update: PartialSchemaUpdate) -> Self {
        self.partials.insert(name.into(), update);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialWriteSchemaResponse {
    #[serde(default)]
    pub schema_version: String,
}

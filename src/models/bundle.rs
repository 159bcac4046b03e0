use serde::{Deserialize, Serialize};

/// One step of a data bundle. Each entry is a templated tuple or attribute
/// such as `organization:{{.organizationID}}#admin@user:{{.creatorID}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleOperation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships_write: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationships_delete: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes_write: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes_delete: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataBundle {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<String>,
    #[serde(default)]
    pub operations: Vec<BundleOperation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteBundleRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub bundles: Vec<DataBundle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteBundleResponse {
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleNameRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub name: String,
}

impl BundleNameRequest {
    pub fn new(tenant_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadBundleResponse {
    #[serde(default)]
    pub bundle: DataBundle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteBundleResponse {
    #[serde(default)]
    pub name: String,
}

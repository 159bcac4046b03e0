use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::common::{Attribute, AttributeFilter, Tuple, TupleFilter};
use super::schema::SchemaMetadata;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapTokenResponse {
    #[serde(default)]
    pub snap_token: String,
}

pub type WriteDataResponse = SnapTokenResponse;
pub type DeleteDataResponse = SnapTokenResponse;
pub type RunBundleResponse = SnapTokenResponse;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WriteDataRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub metadata: SchemaMetadata,
    pub tuples: Vec<Tuple>,
    pub attributes: Vec<Attribute>,
}

impl WriteDataRequest {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            metadata: SchemaMetadata::default(),
            tuples: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn tuple(mut self, tuple: Tuple) -> Self {
        self.tuples.push(tuple);
        self
    }

    pub fn attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty() && self.attributes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteRelationshipsRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub metadata: SchemaMetadata,
    pub tuples: Vec<Tuple>,
}

impl WriteRelationshipsRequest {
    pub fn new(tenant_id: impl Into<String>, tuples: Vec<Tuple>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            metadata: SchemaMetadata::default(),
            tuples,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteDataRequest {
    #[serde(skip)]
    pub tenant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuple_filter: Option<TupleFilter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_filter: Option<AttributeFilter>,
}

impl DeleteDataRequest {
    pub fn tuples(tenant_id: impl Into<String>, filter: TupleFilter) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            tuple_filter: Some(filter),
            attribute_filter: None,
        }
    }

    pub fn attributes(tenant_id: impl Into<String>, filter: AttributeFilter) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            tuple_filter: None,
            attribute_filter: Some(filter),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteRelationshipsRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub filter: TupleFilter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReadMetadata {
    pub snap_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadRelationshipsRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub metadata: ReadMetadata,
    pub filter: TupleFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuous_token: Option<String>,
}

impl ReadRelationshipsRequest {
    pub fn new(tenant_id: impl Into<String>, filter: TupleFilter) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            metadata: ReadMetadata::default(),
            filter,
            page_size: None,
            continuous_token: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadRelationshipsResponse {
    #[serde(default)]
    pub tuples: Vec<Tuple>,
    #[serde(default)]
    pub continuous_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadAttributesRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub metadata: ReadMetadata,
    pub filter: AttributeFilter,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuous_token: Option<String>,
}

impl ReadAttributesRequest {
    pub fn new(tenant_id: impl Into<String>, filter: AttributeFilter) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            metadata: ReadMetadata::default(),
            filter,
            page_size: None,
            continuous_token: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadAttributesResponse {
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub continuous_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunBundleRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub name: String,
    pub arguments: BTreeMap<String, String>,
}

impl RunBundleRequest {
    pub fn new(tenant_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            name: name.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn argument(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }
}

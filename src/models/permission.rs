use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::common::{Entity, PermissionContext, Subject, SubjectReference};

pub const DEFAULT_CHECK_DEPTH: i32 = 20;

/// Outcome enum as reported by the permission endpoints. Values outside
/// these three fail to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckResult {
    #[serde(rename = "CHECK_RESULT_ALLOWED")]
    Allowed,
    #[serde(rename = "CHECK_RESULT_DENIED")]
    Denied,
    #[default]
    #[serde(rename = "CHECK_RESULT_UNSPECIFIED")]
    Unspecified,
}

impl CheckResult {
    pub fn is_allowed(self) -> bool {
        matches!(self, CheckResult::Allowed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionMetadata {
    #[serde(default)]
    pub snap_token: String,
    #[serde(default)]
    pub schema_version: String,
    #[serde(default = "default_depth")]
    pub depth: i32,
}

impl Default for PermissionMetadata {
    fn default() -> Self {
        Self {
            snap_token: String::new(),
            schema_version: String::new(),
            depth: DEFAULT_CHECK_DEPTH,
        }
    }
}

impl PermissionMetadata {
    pub fn with_snap_token(snap_token: Option<&str>) -> Self {
        Self {
            snap_token: snap_token.unwrap_or_default().to_string(),
            ..Self::default()
        }
    }
}

fn default_depth() -> i32 {
    DEFAULT_CHECK_DEPTH
}

/// A single "can subject S do P on entity E" question.
///
/// `context` is the flat-to-nested mapping produced by the gate's context
/// builder; it travels as the `data` part of the check context.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckRequest {
    pub tenant_id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub permission: String,
    pub subject_type: String,
    pub subject_id: String,
    pub context: Map<String, Value>,
    /// Consistency token forwarded to the service. Never set by the gate.
    pub snap_token: Option<String>,
}

impl CheckRequest {
    pub fn entity(&self) -> Entity {
        Entity::new(&self.entity_type, &self.entity_id)
    }

    pub fn subject(&self) -> Subject {
        Subject::new(&self.subject_type, &self.subject_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub can: CheckResult,
    #[serde(default)]
    pub metadata: Value,
}

/// The allow/deny decision for one check, with the service's metadata left opaque.
#[derive(Debug, Clone, PartialEq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub metadata: Value,
}

impl AccessDecision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            metadata: Value::Null,
        }
    }

    pub fn deny() -> Self {
        Self {
            allowed: false,
            metadata: Value::Null,
        }
    }
}

impl From<CheckResponse> for AccessDecision {
    fn from(value: CheckResponse) -> Self {
        Self {
            allowed: value.can.is_allowed(),
            metadata: value.metadata,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpandRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub metadata: ExpandMetadata,
    pub entity: Entity,
    pub permission: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<PermissionContext>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandMetadata {
    #[serde(default)]
    pub snap_token: String,
    #[serde(default)]
    pub schema_version: String,
}

impl ExpandRequest {
    pub fn new(tenant_id: impl Into<String>, entity: Entity, permission: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            metadata: ExpandMetadata::default(),
            entity,
            permission: permission.into(),
            context: None,
        }
    }
}

/// Expansion trees are deeply recursive; callers walk them as JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpandResponse {
    #[serde(default)]
    pub tree: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupEntityRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub metadata: PermissionMetadata,
    pub entity_type: String,
    pub permission: String,
    pub subject: Subject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<PermissionContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuous_token: Option<String>,
}

impl LookupEntityRequest {
    pub fn new(
        tenant_id: impl Into<String>,
        entity_type: impl Into<String>,
        permission: impl Into<String>,
        subject: Subject,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            metadata: PermissionMetadata::default(),
            entity_type: entity_type.into(),
            permission: permission.into(),
            subject,
            context: None,
            page_size: None,
            continuous_token: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupEntityResponse {
    #[serde(default)]
    pub entity_ids: Vec<String>,
    #[serde(default)]
    pub continuous_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LookupSubjectRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub metadata: PermissionMetadata,
    pub entity: Entity,
    pub permission: String,
    pub subject_reference: SubjectReference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<PermissionContext>,
}

impl LookupSubjectRequest {
    pub fn new(
        tenant_id: impl Into<String>,
        entity: Entity,
        permission: impl Into<String>,
        subject_type: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            metadata: PermissionMetadata::default(),
            entity,
            permission: permission.into(),
            subject_reference: SubjectReference {
                subject_type: subject_type.into(),
                relation: String::new(),
            },
            context: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupSubjectResponse {
    #[serde(default)]
    pub subject_ids: Vec<String>,
    #[serde(default)]
    pub continuous_token: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectPermissionRequest {
    #[serde(skip)]
    pub tenant_id: String,
    pub metadata: SubjectPermissionMetadata,
    pub entity: Entity,
    pub subject: Subject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<PermissionContext>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectPermissionMetadata {
    pub snap_token: String,
    pub schema_version: String,
    pub only_permission: bool,
    pub depth: i32,
}

impl SubjectPermissionRequest {
    pub fn new(tenant_id: impl Into<String>, entity: Entity, subject: Subject) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            metadata: SubjectPermissionMetadata {
                snap_token: String::new(),
                schema_version: String::new(),
                only_permission: false,
                depth: DEFAULT_CHECK_DEPTH,
            },
            entity,
            subject,
            context: None,
        }
    }

    pub fn only_permissions(mut self) -> Self {
        self.metadata.only_permission = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectPermissionResponse {
    #[serde(default)]
    pub results: BTreeMap<String, CheckResult>,
}

impl SubjectPermissionResponse {
    /// Permission names the subject holds, in sorted order.
    pub fn allowed(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|(_, result)| result.is_allowed())
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

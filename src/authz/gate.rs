use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Method;
use serde_json::Value;

use super::context::build_context;
use super::extract::{extract_segments, value_as_id};
use super::policy::{PolicyMetadata, PolicyRegistry};
use super::tenant::resolve_tenant;
use crate::client::{PermifyClient, PermifyError};
use crate::models::permission::{AccessDecision, CheckRequest};

/// The remote decision point the gate asks. One call per check, no retries.
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    async fn check(&self, request: &CheckRequest) -> Result<AccessDecision, PermifyError>;
}

#[async_trait]
impl PermissionChecker for PermifyClient {
    async fn check(&self, request: &CheckRequest) -> Result<AccessDecision, PermifyError> {
        self.permissions().check(request).await
    }
}

/// Why the gate refused a request. Every variant is an access-denied outcome;
/// only the message differs, and none of them carry upstream detail.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("missing entity id parameter")]
    MissingEntityId { param: String },
    #[error("subject not authenticated")]
    MissingSubject,
    #[error("tenant id not provided")]
    MissingTenant,
    #[error("permission denied: {permission} on {entity}:{entity_id}")]
    Denied {
        permission: String,
        entity: String,
        entity_id: String,
    },
    #[error("error checking permissions")]
    CheckFailed,
}

/// Result of running the gate for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome {
    /// No policy covers the route; nothing was checked.
    Pass,
    Allowed(AccessDecision),
}

pub struct PermissionGate {
    checker: Arc<dyn PermissionChecker>,
    registry: PolicyRegistry,
}

impl PermissionGate {
    pub fn new(checker: Arc<dyn PermissionChecker>, registry: PolicyRegistry) -> Self {
        Self { checker, registry }
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    pub fn policy_for(&self, method: &Method, route: &str) -> Option<&PolicyMetadata> {
        self.registry.lookup(method, route)
    }

    /// Full gate run for a route: look up its policy, then authorize.
    pub async fn evaluate(&self, method: &Method, route: &str, request: &Value) -> Result<GateOutcome, AccessDenied> {
        match self.policy_for(method, route) {
            Some(policy) => self.authorize(policy, request).await.map(GateOutcome::Allowed),
            None => Ok(GateOutcome::Pass),
        }
    }

    /// Reads entity id, subject and tenant off the request view and builds the
    /// check. Touches nothing remote.
    pub fn prepare(policy: &PolicyMetadata, request: &Value) -> Result<CheckRequest, AccessDenied> {
        let id_param = policy.id_param_or_default();
        let entity_id = extract_segments(request, ["params", id_param])
            .and_then(value_as_id)
            .ok_or_else(|| AccessDenied::MissingEntityId {
                param: id_param.to_string(),
            })?;

        let subject_id = subject_id(request).ok_or(AccessDenied::MissingSubject)?;

        let tenant_id = resolve_tenant(policy.tenant.as_deref(), request).ok_or(AccessDenied::MissingTenant)?;

        let context = build_context(request, &subject_id, &policy.context_fields);

        Ok(CheckRequest {
            tenant_id,
            entity_type: policy.entity.clone(),
            entity_id,
            permission: policy.permission.clone(),
            subject_type: policy.subject_type_or_default().to_string(),
            subject_id,
            context,
            snap_token: None,
        })
    }

    pub async fn authorize(&self, policy: &PolicyMetadata, request: &Value) -> Result<AccessDecision, AccessDenied> {
        let check = match Self::prepare(policy, request) {
            Ok(check) => check,
            Err(denied) => {
                tracing::warn!(
                    entity = %policy.entity,
                    permission = %policy.permission,
                    reason = %denied,
                    "permission check skipped"
                );
                return Err(denied);
            }
        };

        match self.checker.check(&check).await {
            Ok(decision) if decision.allowed => {
                tracing::debug!(
                    tenant_id = %check.tenant_id,
                    entity = %check.entity(),
                    permission = %check.permission,
                    subject = %check.subject(),
                    "permission granted"
                );
                Ok(decision)
            }
            Ok(_) => {
                tracing::info!(
                    tenant_id = %check.tenant_id,
                    entity = %check.entity(),
                    permission = %check.permission,
                    subject = %check.subject(),
                    "permission denied"
                );
                Err(AccessDenied::Denied {
                    permission: check.permission,
                    entity: check.entity_type,
                    entity_id: check.entity_id,
                })
            }
            Err(err) => {
                tracing::error!(
                    tenant_id = %check.tenant_id,
                    entity = %check.entity(),
                    permission = %check.permission,
                    error = %err,
                    "permission check failed"
                );
                Err(AccessDenied::CheckFailed)
            }
        }
    }
}

/// `user.id`, else `user.sub`. Null or empty values count as absent.
fn subject_id(request: &Value) -> Option<String> {
    let user = request.get("user")?;
    user.get("id")
        .and_then(value_as_id)
        .or_else(|| user.get("sub").and_then(value_as_id))
}

use serde::Serialize;

use super::{tenant_path, PermifyClient, PermifyError};
use crate::models::permission::{
    AccessDecision, CheckRequest, CheckResponse, ExpandRequest, ExpandResponse,
    LookupEntityRequest, LookupEntityResponse, LookupSubjectRequest, LookupSubjectResponse,
    PermissionMetadata, SubjectPermissionRequest, SubjectPermissionResponse,
};
use crate::models::{Entity, PermissionContext, Subject};

#[derive(Debug, Serialize)]
struct CheckBody {
    metadata: PermissionMetadata,
    entity: Entity,
    permission: String,
    subject: Subject,
    context: PermissionContext,
}

impl From<&CheckRequest> for CheckBody {
    fn from(request: &CheckRequest) -> Self {
        Self {
            metadata: PermissionMetadata::with_snap_token(request.snap_token.as_deref()),
            entity: request.entity(),
            permission: request.permission.clone(),
            subject: request.subject(),
            context: PermissionContext::from_data(request.context.clone()),
        }
    }
}

pub struct PermissionService<'a> {
    client: &'a PermifyClient,
}

impl<'a> PermissionService<'a> {
    pub(crate) fn new(client: &'a PermifyClient) -> Self {
        Self { client }
    }

    pub async fn check(&self, request: &CheckRequest) -> Result<AccessDecision, PermifyError> {
        let path = tenant_path(&request.tenant_id, "permissions/check")?;
        let response: CheckResponse = self.client.post(&path, &CheckBody::from(request)).await?;

        Ok(response.into())
    }

    pub async fn expand(&self, request: &ExpandRequest) -> Result<ExpandResponse, PermifyError> {
        let path = tenant_path(&request.tenant_id, "permissions/expand")?;
        self.client.post(&path, request).await
    }

    /// Entity ids of `entity_type` on which the subject holds the permission.
    pub async fn lookup_entity(
        &self,
        request: &LookupEntityRequest,
    ) -> Result<LookupEntityResponse, PermifyError> {
        let path = tenant_path(&request.tenant_id, "permissions/lookup-entity")?;
        self.client.post(&path, request).await
    }

    /// Subject ids that hold the permission on one entity.
    pub async fn lookup_subject(
        &self,
        request: &LookupSubjectRequest,
    ) -> Result<LookupSubjectResponse, PermifyError> {
        let path = tenant_path(&request.tenant_id, "permissions/lookup-subject")?;
        self.client.post(&path, request).await
    }

    pub async fn subject_permission(
        &self,
        request: &SubjectPermissionRequest,
    ) -> Result<SubjectPermissionResponse, PermifyError> {
        let path = tenant_path(&request.tenant_id, "permissions/subject-permission")?;
        self.client.post(&path, request).await
    }
}

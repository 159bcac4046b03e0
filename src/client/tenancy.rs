use super::{validate_tenant_id, PermifyClient, PermifyError};
use crate::models::tenancy::{
    CreateTenantRequest, ListTenantsRequest, ListTenantsResponse, TenantResponse,
};

pub struct TenancyService<'a> {
    client: &'a PermifyClient,
}

impl<'a> TenancyService<'a> {
    pub(crate) fn new(client: &'a PermifyClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, request: &CreateTenantRequest) -> Result<TenantResponse, PermifyError> {
        if request.id.trim().is_empty() {
            return Err(PermifyError::invalid_argument("tenant id must not be empty"));
        }

        self.client.post("/v1/tenants/create", request).await
    }

    pub async fn delete(&self, tenant_id: &str) -> Result<TenantResponse, PermifyError> {
        validate_tenant_id(tenant_id)?;

        self.client.delete(&format!("/v1/tenants/{tenant_id}")).await
    }

    pub async fn list(&self, request: &ListTenantsRequest) -> Result<ListTenantsResponse, PermifyError> {
        self.client.post("/v1/tenants/list", request).await
    }
}

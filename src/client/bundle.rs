use super::{tenant_path, PermifyClient, PermifyError};
use crate::models::bundle::{
    BundleNameRequest, DeleteBundleResponse, ReadBundleResponse, WriteBundleRequest,
    WriteBundleResponse,
};

pub struct BundleService<'a> {
    client: &'a PermifyClient,
}

impl<'a> BundleService<'a> {
    pub(crate) fn new(client: &'a PermifyClient) -> Self {
        Self { client }
    }

    pub async fn write(&self, request: &WriteBundleRequest) -> Result<WriteBundleResponse, PermifyError> {
        if request.bundles.is_empty() {
            return Err(PermifyError::invalid_argument("at least one bundle is required"));
        }
        if request.bundles.iter().any(|bundle| bundle.name.is_empty()) {
            return Err(PermifyError::invalid_argument("bundle name must not be empty"));
        }

        let path = tenant_path(&request.tenant_id, "bundle/write")?;
        self.client.post(&path, request).await
    }

    pub async fn read(&self, request: &BundleNameRequest) -> Result<ReadBundleResponse, PermifyError> {
        let path = tenant_path(&request.tenant_id, "bundle/read")?;
        self.client.post(&path, request).await
    }

    pub async fn delete(&self, request: &BundleNameRequest) -> Result<DeleteBundleResponse, PermifyError> {
        let path = tenant_path(&request.tenant_id, "bundle/delete")?;
        self.client.post(&path, request).await
    }
}

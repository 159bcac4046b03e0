use super::{tenant_path, PermifyClient, PermifyError};
use crate::models::data::{
    DeleteDataRequest, DeleteDataResponse, DeleteRelationshipsRequest, ReadAttributesRequest,
    ReadAttributesResponse, ReadRelationshipsRequest, ReadRelationshipsResponse,
    RunBundleRequest, RunBundleResponse, WriteDataRequest, WriteDataResponse,
    WriteRelationshipsRequest,
};

/// Relationship tuples and attributes.
pub struct DataService<'a> {
    client: &'a PermifyClient,
}

impl<'a> DataService<'a> {
    pub(crate) fn new(client: &'a PermifyClient) -> Self {
        Self { client }
    }

    pub async fn write(&self, request: &WriteDataRequest) -> Result<WriteDataResponse, PermifyError> {
        if request.is_empty() {
            return Err(PermifyError::invalid_argument("nothing to write"));
        }

        let path = tenant_path(&request.tenant_id, "data/write")?;
        self.client.post(&path, request).await
    }

    pub async fn write_relationships(
        &self,
        request: &WriteRelationshipsRequest,
    ) -> Result<WriteDataResponse, PermifyError> {
        if request.tuples.is_empty() {
            return Err(PermifyError::invalid_argument("nothing to write"));
        }

        let path = tenant_path(&request.tenant_id, "relationships/write")?;
        self.client.post(&path, request).await
    }

    pub async fn delete(&self, request: &DeleteDataRequest) -> Result<DeleteDataResponse, PermifyError> {
        if request.tuple_filter.is_none() && request.attribute_filter.is_none() {
            return Err(PermifyError::invalid_argument("delete needs a tuple or attribute filter"));
        }

        let path = tenant_path(&request.tenant_id, "data/delete")?;
        self.client.post(&path, request).await
    }

    pub async fn delete_relationships(
        &self,
        request: &DeleteRelationshipsRequest,
    ) -> Result<DeleteDataResponse, PermifyError> {
        if request.filter.entity.entity_type.is_empty() {
            return Err(PermifyError::invalid_argument("filter entity type must not be empty"));
        }

        let path = tenant_path(&request.tenant_id, "relationships/delete")?;
        self.client.post(&path, request).await
    }

    pub async fn read_relationships(
        &self,
        request: &ReadRelationshipsRequest,
    ) -> Result<ReadRelationshipsResponse, PermifyError> {
        let path = tenant_path(&request.tenant_id, "data/relationships/read")?;
        self.client.post(&path, request).await
    }

    pub async fn read_attributes(
        &self,
        request: &ReadAttributesRequest,
    ) -> Result<ReadAttributesResponse, PermifyError> {
        let path = tenant_path(&request.tenant_id, "data/attributes/read")?;
        self.client.post(&path, request).await
    }

    /// Executes a stored bundle with the given template arguments.
    pub async fn run_bundle(&self, request: &RunBundleRequest) -> Result<RunBundleResponse, PermifyError> {
        if request.name.is_empty() {
            return Err(PermifyError::invalid_argument("bundle name must not be empty"));
        }

        let path = tenant_path(&request.tenant_id, "data/run-bundle")?;
        self.client.post(&path, request).await
    }
}

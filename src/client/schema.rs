use super::{tenant_path, PermifyClient, PermifyError};
use crate::models::schema::{
    ListSchemasRequest, ListSchemasResponse, PartialWriteSchemaRequest,
    PartialWriteSchemaResponse, ReadSchemaRequest, ReadSchemaResponse, WriteSchemaRequest,
    WriteSchemaResponse,
};

pub struct SchemaService<'a> {
    client: &'a PermifyClient,
}

impl<'a> SchemaService<'a> {
    pub(crate) fn new(client: &'a PermifyClient) -> Self {
        Self { client }
    }

    pub async fn write(&self, request: &WriteSchemaRequest) -> Result<WriteSchemaResponse, PermifyError> {
        if request.schema.trim().is_empty() {
            return Err(PermifyError::invalid_argument("schema must not be empty"));
        }

        let path = tenant_path(&request.tenant_id, "schemas/write")?;
        self.client.post(&path, request).await
    }

    pub async fn read(&self, request: &ReadSchemaRequest) -> Result<ReadSchemaResponse, PermifyError> {
        let path = tenant_path(&request.tenant_id, "schemas/read")?;
        self.client.post(&path, request).await
    }

    pub async fn list(&self, request: &ListSchemasRequest) -> Result<ListSchemasResponse, PermifyError> {
        let path = tenant_path(&request.tenant_id, "schemas/list")?;
        self.client.post(&path, request).await
    }

    pub async fn partial_write(
        &self,
        request: &PartialWriteSchemaRequest,
    ) -> Result<PartialWriteSchemaResponse, PermifyError> {
        if request.partials.is_empty() {
            return Err(PermifyError::invalid_argument("partial write needs at least one entity"));
        }

        let path = tenant_path(&request.tenant_id, "schemas/partial-write")?;
        self.client.post(&path, request).await
    }
}

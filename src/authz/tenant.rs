use serde_json::Value;

use super::extract::{extract_field, value_as_id};

pub const TENANT_REQUEST_PREFIX: &str = "req.";
pub const TENANT_REQUEST_FIELD: &str = "tenant";

/// Where a policy says the tenant id comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantSource<'a> {
    /// `req.`-prefixed reference; holds the path with the prefix removed.
    RequestPath(&'a str),
    Literal(&'a str),
    /// Policy is silent: read `tenant` off the request root.
    RequestDefault,
}

impl<'a> TenantSource<'a> {
    pub fn from_policy(tenant: Option<&'a str>) -> Self {
        match tenant {
            Some(tenant) if !tenant.is_empty() => match tenant.strip_prefix(TENANT_REQUEST_PREFIX) {
                Some(path) => TenantSource::RequestPath(path),
                None => TenantSource::Literal(tenant),
            },
            _ => TenantSource::RequestDefault,
        }
    }
}

pub fn resolve_tenant(policy_tenant: Option<&str>, request: &Value) -> Option<String> {
    match TenantSource::from_policy(policy_tenant) {
        TenantSource::RequestPath(path) => extract_field(request, path).and_then(value_as_id),
        TenantSource::Literal(tenant) => Some(tenant.to_string()),
        TenantSource::RequestDefault => request.get(TENANT_REQUEST_FIELD).and_then(value_as_id),
    }
}

use std::collections::HashMap;

use axum::http::Method;
use serde::Deserialize;

use super::context::{is_subject_rooted, SUBJECT_CONTEXT_KEY};
use super::defaults;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("policy entity must not be empty")]
    EmptyEntity,
    #[error("policy permission must not be empty")]
    EmptyPermission,
    #[error("context field paths must not be empty")]
    EmptyContextField,
    #[error("context field `{0}` would overwrite the `{key}` subject entry", key = SUBJECT_CONTEXT_KEY)]
    ReservedContextField(String),
    #[error("policy already registered for {0}")]
    Duplicate(String),
}

/// Declarative permission requirement attached to a handler or a group of handlers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyMetadata {
    pub entity: String,
    #[serde(default)]
    pub id_param: Option<String>,
    pub permission: String,
    #[serde(default)]
    pub subject_type: Option<String>,
    #[serde(default)]
    pub context_fields: Vec<String>,
    /// Literal tenant id, or a `req.`-prefixed path into the request.
    #[serde(default)]
    pub tenant: Option<String>,
}

impl PolicyMetadata {
    pub fn new(entity: impl Into<String>, permission: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            id_param: None,
            permission: permission.into(),
            subject_type: None,
            context_fields: Vec::new(),
            tenant: None,
        }
    }

    pub fn id_param(mut self, id_param: impl Into<String>) -> Self {
        self.id_param = Some(id_param.into());
        self
    }

    pub fn subject_type(mut self, subject_type: impl Into<String>) -> Self {
        self.subject_type = Some(subject_type.into());
        self
    }

    pub fn context_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.context_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn id_param_or_default(&self) -> &str {
        match self.id_param.as_deref() {
            Some(param) if !param.is_empty() => param,
            _ => defaults::ID_PARAM,
        }
    }

    pub fn subject_type_or_default(&self) -> &str {
        match self.subject_type.as_deref() {
            Some(subject_type) if !subject_type.is_empty() => subject_type,
            _ => defaults::SUBJECT_TYPE,
        }
    }

    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.entity.trim().is_empty() {
            return Err(PolicyError::EmptyEntity);
        }
        if self.permission.trim().is_empty() {
            return Err(PolicyError::EmptyPermission);
        }
        if self.context_fields.iter().any(|field| field.trim().is_empty()) {
            return Err(PolicyError::EmptyContextField);
        }
        if let Some(field) = self.context_fields.iter().find(|field| is_subject_rooted(field)) {
            return Err(PolicyError::ReservedContextField(field.clone()));
        }
        Ok(())
    }
}

/// Handler identity: HTTP method plus the route pattern the router matched,
/// e.g. `GET /documents/:documentId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: Method,
    pub path: String,
}

impl RouteKey {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
        }
    }
}

impl std::fmt::Display for RouteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Startup-time map from handlers to their policies.
///
/// Lookup is two-level: an exact handler registration always wins; otherwise
/// the longest group prefix covering the route applies. Groups match on
/// whole path segments, so `/doc` does not cover `/documents`.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    handlers: HashMap<RouteKey, PolicyMetadata>,
    groups: Vec<(String, PolicyMetadata)>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(
        mut self,
        method: Method,
        path: impl Into<String>,
        policy: PolicyMetadata,
    ) -> Result<Self, PolicyError> {
        policy.validate()?;

        let key = RouteKey::new(method, path);
        if self.handlers.contains_key(&key) {
            return Err(PolicyError::Duplicate(key.to_string()));
        }
        self.handlers.insert(key, policy);
        Ok(self)
    }

    pub fn group(mut self, prefix: impl Into<String>, policy: PolicyMetadata) -> Result<Self, PolicyError> {
        policy.validate()?;

        let prefix = normalize_prefix(prefix.into());
        if self.groups.iter().any(|(existing, _)| *existing == prefix) {
            return Err(PolicyError::Duplicate(prefix));
        }
        self.groups.push((prefix, policy));
        Ok(self)
    }

    pub fn lookup(&self, method: &Method, path: &str) -> Option<&PolicyMetadata> {
        let key = RouteKey::new(method.clone(), path);
        if let Some(policy) = self.handlers.get(&key) {
            return Some(policy);
        }

        self.groups
            .iter()
            .filter(|(prefix, _)| covers(prefix, path))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, policy)| policy)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty() && self.groups.is_empty()
    }
}

fn normalize_prefix(prefix: String) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

fn covers(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

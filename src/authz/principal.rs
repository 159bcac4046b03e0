use axum::http::HeaderMap;
use serde_json::{Map, Value};

/// Authenticated caller, as placed into request extensions by the host's
/// authentication layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Principal {
    pub id: Option<String>,
    pub sub: Option<String>,
    /// Extra claims, reachable from policies as `user.<name>`.
    pub attributes: Map<String, Value>,
}

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn from_sub(sub: impl Into<String>) -> Self {
        Self {
            sub: Some(sub.into()),
            ..Self::default()
        }
    }

    pub fn with_sub(mut self, sub: impl Into<String>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn to_value(&self) -> Value {
        let mut user = self.attributes.clone();
        if let Some(ref id) = self.id {
            user.insert("id".to_string(), Value::String(id.clone()));
        }
        if let Some(ref sub) = self.sub {
            user.insert("sub".to_string(), Value::String(sub.clone()));
        }
        Value::Object(user)
    }
}

/// Ambient tenant for the request, read by policies that do not name one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTenant(pub String);

/// Additional top-level request fields for `contextFields` and `req.` tenant paths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestAttributes(pub Map<String, Value>);

impl RequestAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }
}

pub const PARAMS_KEY: &str = "params";
pub const QUERY_KEY: &str = "query";
pub const HEADERS_KEY: &str = "headers";
pub const USER_KEY: &str = "user";
pub const TENANT_KEY: &str = "tenant";

/// Read-only JSON picture of an incoming request that the gate walks.
///
/// Shape: `{params, query, headers, user, tenant, ..attributes}`. Attribute
/// names that clash with the fixed keys are ignored.
#[derive(Debug, Clone, Default)]
pub struct RequestView {
    params: Map<String, Value>,
    query: Map<String, Value>,
    headers: Map<String, Value>,
    user: Option<Value>,
    tenant: Option<String>,
    attributes: Map<String, Value>,
}

impl RequestView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn params<'a>(mut self, params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        self.params = string_map(params);
        self
    }

    pub fn query<K, V>(mut self, query: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query = query
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        self
    }

    /// Header names are lower-cased by `http`; non-UTF-8 values are dropped.
    pub fn headers(mut self, headers: &HeaderMap) -> Self {
        self.headers = headers
            .keys()
            .filter_map(|name| {
                let value = headers.get(name)?.to_str().ok()?;
                Some((name.as_str().to_string(), Value::String(value.to_string())))
            })
            .collect();
        self
    }

    pub fn user(mut self, principal: Option<&Principal>) -> Self {
        self.user = principal.map(Principal::to_value);
        self
    }

    pub fn tenant(mut self, tenant: Option<&RequestTenant>) -> Self {
        self.tenant = tenant.map(|RequestTenant(id)| id.clone());
        self
    }

    pub fn attributes(mut self, attributes: Option<&RequestAttributes>) -> Self {
        self.attributes = attributes.map(|attrs| attrs.0.clone()).unwrap_or_default();
        self
    }

    pub fn into_value(self) -> Value {
        let mut root = self.attributes;
        root.insert(PARAMS_KEY.to_string(), Value::Object(self.params));
        root.insert(QUERY_KEY.to_string(), Value::Object(self.query));
        root.insert(HEADERS_KEY.to_string(), Value::Object(self.headers));
        match self.user {
            Some(user) => root.insert(USER_KEY.to_string(), user),
            None => root.remove(USER_KEY),
        };
        match self.tenant {
            Some(tenant) => root.insert(TENANT_KEY.to_string(), Value::String(tenant)),
            None => root.remove(TENANT_KEY),
        };
        Value::Object(root)
    }
}

fn string_map<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

//! Permission gate - Policy registry and Middleware
//!
//! Routes are mapped to [`PolicyMetadata`] at startup. For every request the
//! gate reads the entity id, subject and tenant off a JSON view of the request,
//! asks a [`PermissionChecker`] once, and either forwards or denies:
//! - no policy: pass through, no remote call
//! - missing entity id / subject / tenant: deny locally
//! - remote says no: deny naming the permission and entity
//! - remote call fails: generic deny, detail only in the logs

mod context;
mod extract;
mod gate;
mod middleware;
mod policy;
mod principal;
mod tenant;

pub use context::{build_context, SUBJECT_CONTEXT_KEY};
pub use extract::{extract_field, value_as_id};
pub use gate::{AccessDenied, GateOutcome, PermissionChecker, PermissionGate};
pub use middleware::enforce_permissions;
pub use policy::{PolicyError, PolicyMetadata, PolicyRegistry, RouteKey};
pub use principal::{Principal, RequestAttributes, RequestTenant, RequestView};
pub use tenant::{resolve_tenant, TenantSource};

/// Values used when a policy leaves a field unset
pub mod defaults {
    pub const ID_PARAM: &str = "id";
    pub const SUBJECT_TYPE: &str = "user";
}

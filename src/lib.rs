pub mod authz;
pub mod client;
pub mod config;
pub mod errors;
pub mod models;

// Re-export commonly used items for tests
pub use authz::{enforce_permissions, AccessDenied, PermissionChecker, PermissionGate, PolicyMetadata, PolicyRegistry};
pub use client::{PermifyClient, PermifyError};
pub use config::PermifyConfig;

pub mod bundle;
pub mod common;
pub mod data;
pub mod permission;
pub mod schema;
pub mod tenancy;
pub mod watch;

pub use common::{
    Attribute, AttributeFilter, Entity, EntityFilter, PermissionContext, SubjectFilter,
    Subject, SubjectReference, Tuple, TupleFilter,
};

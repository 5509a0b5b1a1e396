//! `yachtops-auth`: tenant-scoped authorization core.
//!
//! Decides which tenant a request may touch, what the acting user may do
//! there, and turns caller filters into tenant-safe ones. Decoupled from HTTP
//! and storage; synchronous and stateless across requests.

pub mod catalog;
pub mod config;
pub mod custom_role;
pub mod error;
pub mod explain;
pub mod gate;
pub mod principal;
pub mod resolver;
pub mod scope;
pub mod tenant;

pub use catalog::{
    BuiltInRole, CATALOG_VERSION, Capability, CapabilitySet, CatalogError, default_capabilities,
    describe, is_valid_capability, parse_capability,
};
pub use config::AuthzConfig;
pub use custom_role::{
    CustomRole, CustomRoleSource, InMemoryCustomRoleStore, Retirement, RoleLookupError,
};
pub use error::{AuthzError, BadRequestKind, DenialKind};
pub use explain::AuthorizationExplanation;
pub use gate::{AuthorizationGate, Authorized, RequiresCapability};
pub use principal::{Principal, SessionClaims, parse_permission_override};
pub use resolver::{EffectivePermissionSet, PermissionResolver, PermissionSource};
pub use scope::{
    Filter, InMemoryRecordStore, ScopePredicateBuilder, ScopedFilter, TenantOwnedStore,
};
pub use tenant::{TenantContext, TenantHint, TenantScope, resolve_tenant};

//! HTTP request layer for the authorization core.
//!
//! Extracts the tenant hint from requests, calls the gate once per request
//! and maps authorization failures to generic responses.

pub mod authz;
pub mod context;
pub mod errors;
pub mod routes;

pub use authz::guard;
pub use context::{SharedGate, tenant_hint};

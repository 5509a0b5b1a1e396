use axum::{Extension, Router, routing::get};

use crate::context::SharedGate;

pub mod rbac;
pub mod system;

/// Router for the authorization endpoints.
///
/// The identity layer in front of it must insert the request's
/// `yachtops_auth::Principal` as a request extension.
pub fn router(gate: SharedGate) -> Router {
    Router::new()
        .route("/health", get(system::health))
        .nest("/rbac", rbac::router())
        .layer(Extension(gate))
}

//! RBAC catalog endpoints for admin tooling.

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
};

use yachtops_auth::{Capability, Principal, describe};

use crate::authz::guard;
use crate::context::SharedGate;
use crate::errors;

pub fn router() -> Router {
    Router::new()
        .route("/catalog", get(get_catalog))
        .route("/capabilities/:name", get(get_capability))
}

/// GET /rbac/catalog - roles, capabilities and implicit grants
pub async fn get_catalog(
    Extension(gate): Extension<SharedGate>,
    Extension(principal): Extension<Principal>,
    headers: HeaderMap,
    uri: Uri,
) -> axum::response::Response {
    if let Err(response) = guard(&*gate, &principal, &headers, &uri, &Capability::UsersView) {
        return response;
    }

    (StatusCode::OK, Json(serde_json::json!({ "catalog": describe() }))).into_response()
}

/// GET /rbac/capabilities/:name - one capability, 404 when not in the catalog
pub async fn get_capability(
    Extension(gate): Extension<SharedGate>,
    Extension(principal): Extension<Principal>,
    headers: HeaderMap,
    uri: Uri,
    Path(name): Path<String>,
) -> axum::response::Response {
    if let Err(response) = guard(&*gate, &principal, &headers, &uri, &Capability::UsersView) {
        return response;
    }

    match name.parse::<Capability>() {
        Ok(capability) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "capability": {
                    "name": capability.as_str(),
                    "area": capability.area(),
                    "description": capability.description(),
                }
            })),
        )
            .into_response(),
        Err(_) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "capability not found"),
    }
}

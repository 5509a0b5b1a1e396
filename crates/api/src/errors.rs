use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use yachtops_auth::AuthzError;

/// Map an authorization failure to a response.
///
/// Only the stable public code and message are sent; the internal reason was
/// already logged by the gate.
pub fn authz_error_to_response(err: AuthzError) -> axum::response::Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_error(status, err.public_code(), err.public_message())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use yachtops_auth::{BadRequestKind, DenialKind};

    use super::*;

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn forbidden_bodies_do_not_reveal_the_reason() {
        let missing = authz_error_to_response(AuthzError::Forbidden(DenialKind::MissingCapability));
        let cross = authz_error_to_response(AuthzError::Forbidden(DenialKind::CrossTenant));
        assert_eq!(missing.status(), StatusCode::FORBIDDEN);
        assert_eq!(cross.status(), StatusCode::FORBIDDEN);
        assert_eq!(body_json(missing).await, body_json(cross).await);
    }

    #[tokio::test]
    async fn bad_request_has_actionable_message() {
        let response =
            authz_error_to_response(AuthzError::BadRequest(BadRequestKind::TenantSelectionRequired));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["message"], "select a yacht for this request");
    }

    #[tokio::test]
    async fn configuration_errors_are_generic_500s() {
        let response =
            authz_error_to_response(AuthzError::configuration("user u-9 has no tenant"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(!body.to_string().contains("u-9"));
    }
}

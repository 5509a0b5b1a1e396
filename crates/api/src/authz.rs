//! Handler-side authorization guard.

use axum::http::{HeaderMap, Uri};
use axum::response::Response;

use yachtops_auth::{AuthorizationGate, Authorized, CustomRoleSource, Principal, RequiresCapability};

use crate::context::tenant_hint;
use crate::errors::authz_error_to_response;

/// Authorize the current request. Handlers call this once and either proceed
/// with the returned [`Authorized`] or return the error response as is.
///
/// `required` is a single [`yachtops_auth::Capability`] or any operation
/// declaring its capabilities.
pub fn guard<S, O>(
    gate: &AuthorizationGate<S>,
    principal: &Principal,
    headers: &HeaderMap,
    uri: &Uri,
    required: &O,
) -> Result<Authorized, Response>
where
    S: CustomRoleSource,
    O: RequiresCapability + ?Sized,
{
    let hint = tenant_hint(headers, uri, gate.config()).map_err(|err| {
        tracing::warn!(user_id = %principal.user_id, error = %err, "unreadable tenant hint");
        authz_error_to_response(err)
    })?;

    gate.authorize_operation(principal, hint.as_deref(), required)
        .map_err(authz_error_to_response)
}

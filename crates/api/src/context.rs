use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Query;
use axum::http::{HeaderMap, Uri};

use yachtops_auth::{AuthorizationGate, AuthzConfig, AuthzError, BadRequestKind, CustomRoleSource};

/// Gate shared by all handlers (request extension).
pub type SharedGate = Arc<AuthorizationGate<Arc<dyn CustomRoleSource>>>;

/// Raw tenant hint of a request: the configured header first, then the query
/// parameter. Blank values count as absent.
pub fn tenant_hint(
    headers: &HeaderMap,
    uri: &Uri,
    config: &AuthzConfig,
) -> Result<Option<String>, AuthzError> {
    if let Some(value) = headers.get(config.tenant_hint_header.as_str()) {
        let value = value
            .to_str()
            .map_err(|_| AuthzError::BadRequest(BadRequestKind::MalformedTenantHint))?;
        if let Some(hint) = non_blank(value) {
            return Ok(Some(hint));
        }
    }

    if uri.query().is_none() {
        return Ok(None);
    }

    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri)
        .map_err(|_| AuthzError::BadRequest(BadRequestKind::MalformedTenantHint))?;

    Ok(params
        .get(&config.tenant_hint_param)
        .and_then(|v| non_blank(v)))
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

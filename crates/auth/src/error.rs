//! Authorization outcome taxonomy.
//!
//! `Display` carries the internal reason and is meant for server-side logs.
//! Clients only ever see [`AuthzError::public_message`].

use serde::Serialize;
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::custom_role::RoleLookupError;

/// Why a request was forbidden. Never echoed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// The effective capability set lacks the required capability.
    MissingCapability,
    /// A tenant-bound principal asked for another tenant's data.
    CrossTenant,
    /// A tenant-bound principal asked for the platform-wide view.
    PlatformWideNotPermitted,
}

/// Why a request was malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BadRequestKind {
    /// A platform principal without a home tenant sent no tenant hint.
    TenantSelectionRequired,
    /// The tenant hint was present but unusable (blank).
    MalformedTenantHint,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: {0:?}")]
    Forbidden(DenialKind),

    #[error("bad request: {0:?}")]
    BadRequest(BadRequestKind),

    #[error("authorization configuration error: {0}")]
    Configuration(String),
}

impl AuthzError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// HTTP-equivalent status code for this outcome.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthzError::Forbidden(_) => 403,
            AuthzError::BadRequest(_) => 400,
            AuthzError::Configuration(_) => 500,
        }
    }

    /// Stable machine-readable code for response bodies.
    pub fn public_code(&self) -> &'static str {
        match self {
            AuthzError::Forbidden(_) => "forbidden",
            AuthzError::BadRequest(_) => "bad_request",
            AuthzError::Configuration(_) => "internal_error",
        }
    }

    /// Client-facing message. Does not reveal which check failed.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthzError::Forbidden(_) => "you do not have access to this resource",
            AuthzError::BadRequest(BadRequestKind::TenantSelectionRequired) => {
                "select a yacht for this request"
            }
            AuthzError::BadRequest(BadRequestKind::MalformedTenantHint) => {
                "the yacht identifier is invalid"
            }
            AuthzError::Configuration(_) => "internal server error",
        }
    }
}

impl From<CatalogError> for AuthzError {
    fn from(value: CatalogError) -> Self {
        AuthzError::Configuration(value.to_string())
    }
}

impl From<RoleLookupError> for AuthzError {
    fn from(value: RoleLookupError) -> Self {
        AuthzError::Configuration(value.to_string())
    }
}

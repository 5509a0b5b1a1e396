//! The acting principal and the raw session claims it is built from.

use core::fmt::Display;
use core::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use yachtops_core::{CustomRoleId, TenantId, UserId};

use crate::catalog::{BuiltInRole, CapabilitySet, CatalogError};

/// The authenticated actor of one request.
///
/// Supplied by the identity collaborator and read-only to the authorization
/// core. A non-platform principal always has a tenant; platform principals may
/// have none and must name a tenant on every tenant-scoped request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: BuiltInRole,
    pub tenant_id: Option<TenantId>,
    pub custom_role_id: Option<CustomRoleId>,
    /// `Some` replaces every role-derived grant, `Some(empty)` included.
    pub permission_override: Option<CapabilitySet>,
}

impl Principal {
    pub fn new(user_id: UserId, role: BuiltInRole, tenant_id: Option<TenantId>) -> Self {
        Self {
            user_id,
            role,
            tenant_id,
            custom_role_id: None,
            permission_override: None,
        }
    }

    pub fn with_custom_role(mut self, custom_role_id: CustomRoleId) -> Self {
        self.custom_role_id = Some(custom_role_id);
        self
    }

    pub fn with_permission_override(mut self, capabilities: CapabilitySet) -> Self {
        self.permission_override = Some(capabilities);
        self
    }

    pub fn is_platform(&self) -> bool {
        self.role.is_platform()
    }

    /// Validate raw session claims into a principal.
    ///
    /// Unknown roles and unknown capability tokens are rejected here, at the
    /// edge, rather than deep inside a permission check.
    pub fn from_claims(claims: &SessionClaims) -> Result<Self, CatalogError> {
        Ok(Self {
            user_id: claims.user_id.clone(),
            role: claims.role.parse()?,
            tenant_id: claims.tenant_id.clone(),
            custom_role_id: claims.custom_role_id.clone(),
            permission_override: parse_permission_override(claims.permissions.as_deref())?,
        })
    }
}

/// Raw principal as handed over by the session provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user_id: UserId,
    pub role: String,
    /// Blank means "no tenant"; surrounding whitespace is dropped.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub tenant_id: Option<TenantId>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub custom_role_id: Option<CustomRoleId>,
    /// JSON array of capability tokens, stored as a string.
    #[serde(default)]
    pub permissions: Option<String>,
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(D::Error::custom),
    }
}

/// Parse the stored permission string.
///
/// Absent, blank or JSON `null` means "no override"; `[]` is an override that
/// revokes everything.
pub fn parse_permission_override(raw: Option<&str>) -> Result<Option<CapabilitySet>, CatalogError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let tokens: Option<Vec<String>> = serde_json::from_str(raw)
        .map_err(|e| CatalogError::MalformedPermissionList(e.to_string()))?;

    tokens.map(CapabilitySet::parse_tokens).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Capability;

    fn claims(role: &str, permissions: Option<&str>) -> SessionClaims {
        SessionClaims {
            user_id: "u-1".parse().unwrap(),
            role: role.to_string(),
            tenant_id: Some("Y1".parse().unwrap()),
            custom_role_id: None,
            permissions: permissions.map(str::to_string),
        }
    }

    #[test]
    fn absent_and_null_mean_no_override() {
        assert_eq!(parse_permission_override(None).unwrap(), None);
        assert_eq!(parse_permission_override(Some("  ")).unwrap(), None);
        assert_eq!(parse_permission_override(Some("null")).unwrap(), None);
    }

    #[test]
    fn empty_list_is_an_all_revoking_override() {
        let parsed = parse_permission_override(Some("[]")).unwrap();
        assert_eq!(parsed, Some(CapabilitySet::empty()));
    }

    #[test]
    fn override_tokens_are_validated() {
        let parsed = parse_permission_override(Some(r#"["trips.view","expenses.view"]"#)).unwrap();
        assert_eq!(
            parsed,
            Some(CapabilitySet::from([Capability::TripsView, Capability::ExpensesView]))
        );

        let err = parse_permission_override(Some(r#"["trips.view","trips.fly"]"#)).unwrap_err();
        assert_eq!(err, CatalogError::UnknownCapability("trips.fly".to_string()));

        let err = parse_permission_override(Some("trips.view")).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedPermissionList(_)));
    }

    #[test]
    fn claims_with_unknown_role_are_rejected() {
        let err = Principal::from_claims(&claims("DECKHAND", None)).unwrap_err();
        assert_eq!(err, CatalogError::UnknownRole("DECKHAND".to_string()));
    }

    #[test]
    fn claims_become_principal() {
        let p = Principal::from_claims(&claims("CAPTAIN", Some("[]"))).unwrap();
        assert_eq!(p.role, BuiltInRole::Captain);
        assert_eq!(p.tenant_id.as_ref().map(|t| t.as_str()), Some("Y1"));
        assert_eq!(p.permission_override, Some(CapabilitySet::empty()));
        assert!(!p.is_platform());
    }

    #[test]
    fn blank_claim_ids_mean_absent() {
        let claims: SessionClaims = serde_json::from_value(serde_json::json!({
            "user_id": "u-1",
            "role": "CREW",
            "tenant_id": "",
            "custom_role_id": "   ",
        }))
        .unwrap();

        assert_eq!(claims.tenant_id, None);
        assert_eq!(claims.custom_role_id, None);
    }

    #[test]
    fn padded_claim_ids_are_trimmed() {
        let claims: SessionClaims = serde_json::from_value(serde_json::json!({
            "user_id": "u-1",
            "role": "CREW",
            "tenant_id": " Y1 ",
        }))
        .unwrap();

        assert_eq!(claims.tenant_id, Some("Y1".parse().unwrap()));
    }

    #[test]
    fn blank_user_id_is_rejected() {
        let result = serde_json::from_value::<SessionClaims>(serde_json::json!({
            "user_id": "",
            "role": "CREW",
        }));
        assert!(result.is_err());
    }
}

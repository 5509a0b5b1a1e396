//! Authorization explanation (audit trail).
//!
//! Answers "why was this request allowed or denied?" for server-side logs and
//! admin tooling. Never send an explanation of a denial to the requesting
//! client.

use serde::Serialize;

use yachtops_core::{CustomRoleId, TenantId, UserId};

use crate::catalog::{BuiltInRole, Capability};
use crate::custom_role::CustomRoleSource;
use crate::error::{AuthzError, BadRequestKind, DenialKind};
use crate::gate::AuthorizationGate;
use crate::principal::Principal;
use crate::resolver::PermissionSource;
use crate::tenant::{TenantContext, TenantHint, resolve_tenant};

/// Detailed explanation of an authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    /// The capability that was being checked.
    pub required_capability: &'static str,

    /// Whether the authorization was granted.
    pub granted: bool,

    /// Human-readable reason for the decision.
    pub reason: String,

    /// Details about the principal's state.
    pub principal: PrincipalState,

    /// The resolved tenant, when resolution succeeded.
    pub tenant: Option<TenantState>,

    /// If denied, what failed.
    pub denial_reason: Option<DenialReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PrincipalState {
    pub user_id: UserId,
    pub role: BuiltInRole,
    pub home_tenant_id: Option<TenantId>,
    pub custom_role_id: Option<CustomRoleId>,
    pub has_override: bool,
    pub permission_source: Option<PermissionSource>,
    pub effective_capabilities: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TenantState {
    pub tenant_id: Option<TenantId>,
    pub platform_wide: bool,
    pub platform_override: bool,
}

impl From<&TenantContext> for TenantState {
    fn from(context: &TenantContext) -> Self {
        Self {
            tenant_id: context.tenant_id().cloned(),
            platform_wide: context.is_platform_wide(),
            platform_override: context.is_platform_override(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialCode,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialCode {
    MissingCapability,
    CrossTenant,
    PlatformWideNotPermitted,
    TenantSelectionRequired,
    MalformedTenantHint,
    Configuration,
}

impl<S> AuthorizationGate<S>
where
    S: CustomRoleSource,
{
    /// Explain the decision [`AuthorizationGate::authorize`] makes for the
    /// same inputs.
    pub fn explain(
        &self,
        principal: &Principal,
        hint: Option<&str>,
        required: Capability,
    ) -> AuthorizationExplanation {
        let tenant = TenantHint::parse(hint, &self.config)
            .and_then(|h| resolve_tenant(principal, h.as_ref()));
        let permissions = self.resolver.resolve(principal);

        let mut state = PrincipalState {
            user_id: principal.user_id.clone(),
            role: principal.role,
            home_tenant_id: principal.tenant_id.clone(),
            custom_role_id: principal.custom_role_id.clone(),
            has_override: principal.permission_override.is_some(),
            permission_source: None,
            effective_capabilities: Vec::new(),
        };
        if let Ok(set) = &permissions {
            state.permission_source = Some(set.source());
            state.effective_capabilities = set.capabilities().tokens();
        }

        let outcome = match (&tenant, &permissions) {
            (Err(err), _) => Err(err.clone()),
            (_, Err(err)) => Err(AuthzError::from(err.clone())),
            (Ok(_), Ok(set)) => {
                if set.capabilities().contains(required) {
                    Ok(format!(
                        "capability '{required}' granted by {}",
                        source_label(set.source())
                    ))
                } else if let Some(grant) = set.implicit_grant(required) {
                    Ok(format!(
                        "capability '{required}' granted by implicit rule '{}'",
                        grant.name
                    ))
                } else {
                    Err(AuthzError::Forbidden(DenialKind::MissingCapability))
                }
            }
        };

        let tenant = tenant.as_ref().ok().map(TenantState::from);
        match outcome {
            Ok(reason) => AuthorizationExplanation {
                required_capability: required.as_str(),
                granted: true,
                reason,
                principal: state,
                tenant,
                denial_reason: None,
            },
            Err(err) => {
                let denial = denial_reason(&err, principal, required);
                AuthorizationExplanation {
                    required_capability: required.as_str(),
                    granted: false,
                    reason: denial.message.clone(),
                    principal: state,
                    tenant,
                    denial_reason: Some(denial),
                }
            }
        }
    }
}

fn source_label(source: PermissionSource) -> &'static str {
    match source {
        PermissionSource::Override => "the user's permission override",
        PermissionSource::CustomRole => "the user's custom role",
        PermissionSource::RoleDefaults => "the built-in role defaults",
    }
}

fn denial_reason(err: &AuthzError, principal: &Principal, required: Capability) -> DenialReason {
    match err {
        AuthzError::Forbidden(DenialKind::MissingCapability) => {
            let mut suggestions = vec![format!(
                "Grant '{required}' through a custom role or the user's permission override"
            )];
            if principal.permission_override.is_some() {
                suggestions.insert(
                    0,
                    "The user's permission override replaces all role grants; review it first"
                        .to_string(),
                );
            }
            DenialReason {
                kind: DenialCode::MissingCapability,
                message: format!("Missing required capability '{required}'"),
                suggestions,
            }
        }
        AuthzError::Forbidden(DenialKind::CrossTenant) => DenialReason {
            kind: DenialCode::CrossTenant,
            message: "Tenant-bound principal requested another tenant".to_string(),
            suggestions: vec!["Drop the tenant hint or use the user's own yacht".to_string()],
        },
        AuthzError::Forbidden(DenialKind::PlatformWideNotPermitted) => DenialReason {
            kind: DenialCode::PlatformWideNotPermitted,
            message: "Only platform roles may request the platform-wide view".to_string(),
            suggestions: vec![],
        },
        AuthzError::BadRequest(BadRequestKind::TenantSelectionRequired) => DenialReason {
            kind: DenialCode::TenantSelectionRequired,
            message: "Platform principal without a home tenant sent no tenant hint".to_string(),
            suggestions: vec!["Pass the yacht to act on as the tenant hint".to_string()],
        },
        AuthzError::BadRequest(BadRequestKind::MalformedTenantHint) => DenialReason {
            kind: DenialCode::MalformedTenantHint,
            message: "Tenant hint was present but blank".to_string(),
            suggestions: vec![],
        },
        AuthzError::Configuration(detail) => DenialReason {
            kind: DenialCode::Configuration,
            message: detail.clone(),
            suggestions: vec!["Assign this user to a tenant or fix the stored grants".to_string()],
        },
    }
}

#[cfg(test)]
mod tests {
    use yachtops_core::UserId;

    use super::*;
    use crate::catalog::CapabilitySet;
    use crate::config::AuthzConfig;
    use crate::custom_role::InMemoryCustomRoleStore;

    fn gate() -> AuthorizationGate<InMemoryCustomRoleStore> {
        AuthorizationGate::new(InMemoryCustomRoleStore::new(), AuthzConfig::default())
    }

    fn principal(role: BuiltInRole, tenant_id: Option<&str>) -> Principal {
        Principal::new(UserId::new(), role, tenant_id.map(|t| t.parse().unwrap()))
    }

    #[test]
    fn explanation_agrees_with_authorize() {
        let g = gate();
        let cases = [
            (principal(BuiltInRole::Crew, Some("Y1")), None, Capability::TripsEdit),
            (principal(BuiltInRole::Captain, Some("Y1")), None, Capability::TripsEdit),
            (principal(BuiltInRole::Crew, Some("Y1")), Some("Y2"), Capability::TripsView),
            (principal(BuiltInRole::SuperAdmin, None), Some("Y3"), Capability::TripsView),
            (principal(BuiltInRole::Admin, None), None, Capability::TripsView),
            (principal(BuiltInRole::Crew, None), None, Capability::TripsView),
        ];

        for (p, hint, cap) in cases {
            let explanation = g.explain(&p, hint, cap);
            assert_eq!(explanation.granted, g.authorize(&p, hint, cap).is_ok(), "{p:?}");
        }
    }

    #[test]
    fn names_implicit_grant() {
        let p = principal(BuiltInRole::Admin, None).with_permission_override(CapabilitySet::empty());
        let explanation = gate().explain(&p, Some("Y1"), Capability::UsersManage);
        assert!(explanation.granted);
        assert!(explanation.reason.contains("platform_user_administration"));
        assert_eq!(explanation.principal.permission_source, Some(PermissionSource::Override));
    }

    #[test]
    fn denial_carries_kind_and_resolved_tenant() {
        let explanation = gate().explain(
            &principal(BuiltInRole::Crew, Some("Y1")),
            None,
            Capability::TripsEdit,
        );
        assert!(!explanation.granted);
        let denial = explanation.denial_reason.unwrap();
        assert_eq!(denial.kind, DenialCode::MissingCapability);
        let tenant = explanation.tenant.unwrap();
        assert_eq!(tenant.tenant_id.as_ref().map(|t| t.as_str()), Some("Y1"));
        assert!(!tenant.platform_override);
    }

    #[test]
    fn serializes_for_audit_logs() {
        let explanation = gate().explain(
            &principal(BuiltInRole::Crew, Some("Y1")),
            Some("Y2"),
            Capability::TripsView,
        );
        let value = serde_json::to_value(&explanation).unwrap();
        assert_eq!(value["denial_reason"]["kind"], "cross_tenant");
        assert_eq!(value["principal"]["role"], "CREW");
        assert_eq!(value["tenant"], serde_json::Value::Null);
    }
}

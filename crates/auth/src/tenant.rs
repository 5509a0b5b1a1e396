//! Tenant context resolution.
//!
//! Decides the single tenant a request may touch. A platform principal is
//! never silently widened to every tenant: the platform-wide view is reachable
//! only through the reserved hint token.

use yachtops_core::TenantId;

use crate::config::AuthzConfig;
use crate::error::{AuthzError, BadRequestKind, DenialKind};
use crate::principal::Principal;

/// Tenant selection supplied by the request (query parameter or header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantHint {
    Tenant(TenantId),
    /// The reserved token asking for an unscoped, platform-wide view.
    PlatformWide,
}

impl TenantHint {
    /// Parse a raw hint. `None` means no hint was sent.
    pub fn parse(raw: Option<&str>, config: &AuthzConfig) -> Result<Option<Self>, AuthzError> {
        let Some(raw) = raw else {
            return Ok(None);
        };

        let raw = raw.trim();
        if raw.is_empty() {
            return Err(AuthzError::BadRequest(BadRequestKind::MalformedTenantHint));
        }
        if raw == config.platform_wide_hint {
            return Ok(Some(TenantHint::PlatformWide));
        }

        raw.parse::<TenantId>()
            .map(|t| Some(TenantHint::Tenant(t)))
            .map_err(|_| AuthzError::BadRequest(BadRequestKind::MalformedTenantHint))
    }
}

/// What a request is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantScope {
    Tenant(TenantId),
    PlatformWide,
}

/// Resolved tenant context of one request. Immutable; built only by
/// [`resolve_tenant`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    scope: TenantScope,
    is_platform_override: bool,
}

impl TenantContext {
    fn own(tenant_id: TenantId) -> Self {
        Self {
            scope: TenantScope::Tenant(tenant_id),
            is_platform_override: false,
        }
    }

    fn platform_override(scope: TenantScope) -> Self {
        Self {
            scope,
            is_platform_override: true,
        }
    }

    pub fn scope(&self) -> &TenantScope {
        &self.scope
    }

    /// The concrete tenant, `None` for the platform-wide view.
    pub fn tenant_id(&self) -> Option<&TenantId> {
        match &self.scope {
            TenantScope::Tenant(t) => Some(t),
            TenantScope::PlatformWide => None,
        }
    }

    /// True when a platform principal explicitly acted outside its own tenant.
    pub fn is_platform_override(&self) -> bool {
        self.is_platform_override
    }

    pub fn is_platform_wide(&self) -> bool {
        matches!(self.scope, TenantScope::PlatformWide)
    }
}

/// Resolve the tenant a request may operate against.
///
/// 1. Own tenant, when no hint or the hint names it.
/// 2. Platform principal with a hint: that tenant (or the platform-wide view).
/// 3. Non-platform principal without tenant: configuration error.
/// 4. Anything else is a cross-tenant attempt: forbidden.
pub fn resolve_tenant(
    principal: &Principal,
    hint: Option<&TenantHint>,
) -> Result<TenantContext, AuthzError> {
    if let Some(own) = &principal.tenant_id {
        match hint {
            None => return Ok(TenantContext::own(own.clone())),
            Some(TenantHint::Tenant(requested)) if requested == own => {
                return Ok(TenantContext::own(own.clone()));
            }
            Some(_) => {}
        }
    }

    if principal.is_platform() {
        return match hint {
            Some(TenantHint::Tenant(requested)) => {
                tracing::info!(
                    user_id = %principal.user_id,
                    role = %principal.role,
                    tenant_id = %requested,
                    "platform principal acting on behalf of tenant"
                );
                Ok(TenantContext::platform_override(TenantScope::Tenant(
                    requested.clone(),
                )))
            }
            Some(TenantHint::PlatformWide) => {
                tracing::info!(
                    user_id = %principal.user_id,
                    role = %principal.role,
                    "platform principal requested platform-wide view"
                );
                Ok(TenantContext::platform_override(TenantScope::PlatformWide))
            }
            None => Err(AuthzError::BadRequest(BadRequestKind::TenantSelectionRequired)),
        };
    }

    if principal.tenant_id.is_none() {
        return Err(AuthzError::configuration(format!(
            "non-platform principal {} ({}) has no tenant",
            principal.user_id, principal.role
        )));
    }

    match hint {
        Some(TenantHint::PlatformWide) => {
            Err(AuthzError::Forbidden(DenialKind::PlatformWideNotPermitted))
        }
        _ => Err(AuthzError::Forbidden(DenialKind::CrossTenant)),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use yachtops_core::UserId;

    use super::*;
    use crate::catalog::BuiltInRole;

    fn tenant(id: &str) -> TenantId {
        id.parse().unwrap()
    }

    fn principal(role: BuiltInRole, tenant_id: Option<&str>) -> Principal {
        Principal::new(UserId::new(), role, tenant_id.map(tenant))
    }

    fn hint(id: &str) -> TenantHint {
        TenantHint::Tenant(tenant(id))
    }

    #[test]
    fn own_tenant_without_hint() {
        let ctx = resolve_tenant(&principal(BuiltInRole::Crew, Some("Y1")), None).unwrap();
        assert_eq!(ctx.tenant_id(), Some(&tenant("Y1")));
        assert!(!ctx.is_platform_override());
    }

    #[test]
    fn hint_matching_own_tenant_is_not_an_override() {
        let p = principal(BuiltInRole::Admin, Some("Y1"));
        let ctx = resolve_tenant(&p, Some(&hint("Y1"))).unwrap();
        assert_eq!(ctx.tenant_id(), Some(&tenant("Y1")));
        assert!(!ctx.is_platform_override());
    }

    #[test]
    fn platform_principal_with_hint_overrides() {
        let p = principal(BuiltInRole::SuperAdmin, None);
        let ctx = resolve_tenant(&p, Some(&hint("Y3"))).unwrap();
        assert_eq!(ctx.tenant_id(), Some(&tenant("Y3")));
        assert!(ctx.is_platform_override());
    }

    #[test]
    fn platform_principal_without_hint_must_select() {
        let p = principal(BuiltInRole::Admin, None);
        assert_eq!(
            resolve_tenant(&p, None),
            Err(AuthzError::BadRequest(BadRequestKind::TenantSelectionRequired))
        );
    }

    #[test]
    fn platform_wide_only_via_reserved_hint() {
        let p = principal(BuiltInRole::SuperAdmin, Some("Y1"));
        let ctx = resolve_tenant(&p, Some(&TenantHint::PlatformWide)).unwrap();
        assert!(ctx.is_platform_wide());
        assert!(ctx.is_platform_override());
        assert_eq!(ctx.tenant_id(), None);

        // No hint keeps the platform principal in its own tenant.
        let ctx = resolve_tenant(&p, None).unwrap();
        assert!(!ctx.is_platform_wide());
    }

    #[test]
    fn tenantless_non_platform_principal_is_a_configuration_error() {
        let p = principal(BuiltInRole::Captain, None);
        assert!(matches!(resolve_tenant(&p, None), Err(AuthzError::Configuration(_))));
        assert!(matches!(
            resolve_tenant(&p, Some(&hint("Y1"))),
            Err(AuthzError::Configuration(_))
        ));
    }

    #[test]
    fn tenant_bound_principal_cannot_go_platform_wide() {
        let p = principal(BuiltInRole::Owner, Some("Y1"));
        assert_eq!(
            resolve_tenant(&p, Some(&TenantHint::PlatformWide)),
            Err(AuthzError::Forbidden(DenialKind::PlatformWideNotPermitted))
        );
    }

    #[test]
    fn hint_parsing() {
        let cfg = AuthzConfig::default();
        assert_eq!(TenantHint::parse(None, &cfg).unwrap(), None);
        assert_eq!(TenantHint::parse(Some(" Y2 "), &cfg).unwrap(), Some(hint("Y2")));
        assert_eq!(TenantHint::parse(Some("*"), &cfg).unwrap(), Some(TenantHint::PlatformWide));
        assert_eq!(
            TenantHint::parse(Some("  "), &cfg),
            Err(AuthzError::BadRequest(BadRequestKind::MalformedTenantHint))
        );
    }

    fn non_platform_role() -> impl Strategy<Value = BuiltInRole> {
        prop::sample::select(
            BuiltInRole::ALL
                .iter()
                .copied()
                .filter(|r| !r.is_platform())
                .collect::<Vec<_>>(),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a tenant-bound principal is rejected for any foreign hint.
        #[test]
        fn foreign_hints_are_always_forbidden(
            role in non_platform_role(),
            own in "[A-Za-z0-9-]{1,12}",
            other in "[A-Za-z0-9-]{1,12}",
        ) {
            prop_assume!(own != other);
            let p = principal(role, Some(own.as_str()));
            prop_assert_eq!(
                resolve_tenant(&p, Some(&hint(&other))),
                Err(AuthzError::Forbidden(DenialKind::CrossTenant))
            );
        }

        /// Property: platform principals never land on the platform-wide view
        /// unless they sent the reserved hint.
        #[test]
        fn platform_principals_never_default_to_unscoped(
            own in proptest::option::of("[A-Za-z0-9-]{1,12}"),
            requested in proptest::option::of("[A-Za-z0-9-]{1,12}"),
        ) {
            let p = principal(BuiltInRole::SuperAdmin, own.as_deref());
            let h = requested.as_deref().map(hint);
            if let Ok(ctx) = resolve_tenant(&p, h.as_ref()) {
                prop_assert!(!ctx.is_platform_wide());
            }
        }
    }
}

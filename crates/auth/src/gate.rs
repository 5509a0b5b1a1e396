//! Authorization gate: the single entry point for request handlers.
//!
//! - No IO beyond the custom role lookup
//! - No panics
//! - No per-request state retained between calls

use yachtops_core::TenantId;

use crate::catalog::Capability;
use crate::config::AuthzConfig;
use crate::custom_role::CustomRoleSource;
use crate::error::{AuthzError, DenialKind};
use crate::principal::Principal;
use crate::resolver::{EffectivePermissionSet, PermissionResolver};
use crate::scope::{Filter, ScopePredicateBuilder, ScopedFilter};
use crate::tenant::{TenantContext, TenantHint, resolve_tenant};

/// Capability contract of an operation, checked before it runs.
///
/// Implement this on operations that handlers dispatch through
/// [`AuthorizationGate::authorize_operation`].
pub trait RequiresCapability {
    fn required_capabilities(&self) -> &[Capability];
}

/// A bare capability is an operation requiring just itself.
impl RequiresCapability for Capability {
    fn required_capabilities(&self) -> &[Capability] {
        std::slice::from_ref(self)
    }
}

/// Successful authorization: the resolved tenant plus a scope function bound
/// to it.
#[derive(Debug, Clone)]
pub struct Authorized {
    context: TenantContext,
    permissions: EffectivePermissionSet,
    scope: ScopePredicateBuilder,
}

impl Authorized {
    /// The tenant this request operates against; `None` only for the explicit
    /// platform-wide view.
    pub fn tenant_id(&self) -> Option<&TenantId> {
        self.context.tenant_id()
    }

    pub fn context(&self) -> &TenantContext {
        &self.context
    }

    pub fn is_platform_override(&self) -> bool {
        self.context.is_platform_override()
    }

    pub fn permissions(&self) -> &EffectivePermissionSet {
        &self.permissions
    }

    /// Secondary capability check within an already authorized request.
    pub fn allows(&self, capability: Capability) -> bool {
        self.permissions.allows(capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), AuthzError> {
        if self.allows(capability) {
            Ok(())
        } else {
            tracing::warn!(
                capability = %capability,
                tenant_id = ?self.tenant_id(),
                "authorization denied on secondary capability check"
            );
            Err(AuthzError::Forbidden(DenialKind::MissingCapability))
        }
    }

    /// Scope a filter to this request's tenant.
    pub fn scope(&self, base: Filter) -> ScopedFilter {
        self.scope.apply_scope(&self.context, base)
    }

    /// [`Authorized::scope`] as a standalone function.
    pub fn scope_fn(&self) -> impl Fn(Filter) -> ScopedFilter + '_ {
        move |base| self.scope(base)
    }
}

/// Combines tenant resolution, permission resolution and scoping.
#[derive(Debug, Clone)]
pub struct AuthorizationGate<S> {
    pub(crate) resolver: PermissionResolver<S>,
    pub(crate) scope: ScopePredicateBuilder,
    pub(crate) config: AuthzConfig,
}

impl<S> AuthorizationGate<S>
where
    S: CustomRoleSource,
{
    pub fn new(roles: S, config: AuthzConfig) -> Self {
        let scope = ScopePredicateBuilder::new(config.owner_tenant_key.clone());
        Self {
            resolver: PermissionResolver::new(roles),
            scope,
            config,
        }
    }

    pub fn config(&self) -> &AuthzConfig {
        &self.config
    }

    /// Authorize `principal` for `required` within the tenant selected by
    /// `hint` (raw request value, `None` when absent).
    pub fn authorize(
        &self,
        principal: &Principal,
        hint: Option<&str>,
        required: Capability,
    ) -> Result<Authorized, AuthzError> {
        let result = self.evaluate(principal, hint, required);
        match &result {
            Ok(authorized) => tracing::debug!(
                user_id = %principal.user_id,
                capability = %required,
                tenant_id = ?authorized.tenant_id(),
                platform_override = authorized.is_platform_override(),
                "authorization granted"
            ),
            Err(err) => log_failure(principal, hint, required, err),
        }
        result
    }

    /// Authorize every capability an operation declares.
    pub fn authorize_operation<O>(
        &self,
        principal: &Principal,
        hint: Option<&str>,
        operation: &O,
    ) -> Result<Authorized, AuthzError>
    where
        O: RequiresCapability + ?Sized,
    {
        let Some((first, rest)) = operation.required_capabilities().split_first() else {
            let err = AuthzError::configuration("operation declares no required capability");
            tracing::error!(user_id = %principal.user_id, "{err}");
            return Err(err);
        };

        let authorized = self.authorize(principal, hint, *first)?;
        for capability in rest {
            authorized.require(*capability)?;
        }
        Ok(authorized)
    }

    fn evaluate(
        &self,
        principal: &Principal,
        hint: Option<&str>,
        required: Capability,
    ) -> Result<Authorized, AuthzError> {
        let hint = TenantHint::parse(hint, &self.config)?;
        let context = resolve_tenant(principal, hint.as_ref())?;
        let permissions = self.resolver.resolve(principal)?;

        if !permissions.allows(required) {
            return Err(AuthzError::Forbidden(DenialKind::MissingCapability));
        }

        Ok(Authorized {
            context,
            permissions,
            scope: self.scope.clone(),
        })
    }
}

fn log_failure(principal: &Principal, hint: Option<&str>, required: Capability, err: &AuthzError) {
    match err {
        AuthzError::Forbidden(kind) => tracing::warn!(
            user_id = %principal.user_id,
            role = %principal.role,
            tenant_id = ?principal.tenant_id,
            requested_tenant = ?hint,
            capability = %required,
            reason = ?kind,
            "authorization denied"
        ),
        AuthzError::BadRequest(kind) => tracing::warn!(
            user_id = %principal.user_id,
            role = %principal.role,
            requested_tenant = ?hint,
            capability = %required,
            reason = ?kind,
            "authorization request rejected"
        ),
        AuthzError::Configuration(detail) => tracing::error!(
            user_id = %principal.user_id,
            role = %principal.role,
            tenant_id = ?principal.tenant_id,
            capability = %required,
            detail = %detail,
            "authorization configuration error"
        ),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use yachtops_core::UserId;

    use super::*;
    use crate::catalog::{BuiltInRole, CapabilitySet};
    use crate::custom_role::InMemoryCustomRoleStore;
    use crate::error::BadRequestKind;

    fn gate() -> AuthorizationGate<InMemoryCustomRoleStore> {
        AuthorizationGate::new(InMemoryCustomRoleStore::new(), AuthzConfig::default())
    }

    fn principal(role: BuiltInRole, tenant_id: Option<&str>) -> Principal {
        Principal::new(UserId::new(), role, tenant_id.map(|t| t.parse().unwrap()))
    }

    struct ApproveExpense;

    impl RequiresCapability for ApproveExpense {
        fn required_capabilities(&self) -> &[Capability] {
            &[Capability::ExpensesView, Capability::ExpensesApprove]
        }
    }

    struct Unguarded;

    impl RequiresCapability for Unguarded {
        fn required_capabilities(&self) -> &[Capability] {
            &[]
        }
    }

    #[test]
    fn tenant_errors_win_over_capability_errors() {
        // Crew lacks trips.delete and also asks for another tenant: the tenant
        // check runs first.
        let err = gate()
            .authorize(&principal(BuiltInRole::Crew, Some("Y1")), Some("Y2"), Capability::TripsDelete)
            .unwrap_err();
        assert_eq!(err, AuthzError::Forbidden(DenialKind::CrossTenant));
    }

    #[test]
    fn scope_fn_is_bound_to_resolved_tenant() {
        let authorized = gate()
            .authorize(&principal(BuiltInRole::Admin, None), Some("Y5"), Capability::ExpensesView)
            .unwrap();
        let scope = authorized.scope_fn();
        let scoped = scope(Filter::new());
        assert_eq!(Value::Object(scoped.into_inner()), json!({ "ownerTenantId": "Y5" }));
    }

    #[test]
    fn operations_require_every_declared_capability() {
        let g = gate();
        assert!(g
            .authorize_operation(&principal(BuiltInRole::Owner, Some("Y1")), None, &ApproveExpense)
            .is_ok());
        assert_eq!(
            g.authorize_operation(&principal(BuiltInRole::Captain, Some("Y1")), None, &ApproveExpense)
                .unwrap_err(),
            AuthzError::Forbidden(DenialKind::MissingCapability)
        );
    }

    #[test]
    fn operations_without_capabilities_are_refused() {
        let err = gate()
            .authorize_operation(&principal(BuiltInRole::Owner, Some("Y1")), None, &Unguarded)
            .unwrap_err();
        assert!(matches!(err, AuthzError::Configuration(_)));
    }

    #[test]
    fn require_checks_within_authorized_request() {
        let p = principal(BuiltInRole::Crew, Some("Y1"))
            .with_permission_override(CapabilitySet::from([Capability::TripsView]));
        let authorized = gate().authorize(&p, None, Capability::TripsView).unwrap();
        assert!(authorized.require(Capability::TripsView).is_ok());
        assert!(authorized.require(Capability::ExpensesView).is_err());
    }

    #[test]
    fn custom_owner_key_flows_from_config() {
        let config = AuthzConfig {
            owner_tenant_key: "yachtId".to_string(),
            ..AuthzConfig::default()
        };
        let g = AuthorizationGate::new(InMemoryCustomRoleStore::new(), config);
        let authorized = g
            .authorize(&principal(BuiltInRole::Crew, Some("Y1")), None, Capability::TripsView)
            .unwrap();
        assert_eq!(authorized.scope(Filter::new()).filter().get("yachtId"), Some(&json!("Y1")));
    }

    #[test]
    fn blank_hint_is_a_bad_request() {
        let err = gate()
            .authorize(&principal(BuiltInRole::Crew, Some("Y1")), Some(" "), Capability::TripsView)
            .unwrap_err();
        assert_eq!(err, AuthzError::BadRequest(BadRequestKind::MalformedTenantHint));
    }

    #[test]
    fn blank_hint_never_selects_platform_wide_view() {
        let config = AuthzConfig {
            platform_wide_hint: String::new(),
            ..AuthzConfig::default()
        };
        let g = AuthorizationGate::new(InMemoryCustomRoleStore::new(), config);
        let err = g
            .authorize(&principal(BuiltInRole::Admin, None), Some("  "), Capability::TripsView)
            .unwrap_err();
        assert_eq!(err, AuthzError::BadRequest(BadRequestKind::MalformedTenantHint));
    }

    #[test]
    fn single_capability_is_an_operation() {
        let g = gate();
        let crew = principal(BuiltInRole::Crew, Some("Y1"));
        assert!(g.authorize_operation(&crew, None, &Capability::TripsView).is_ok());
        assert_eq!(
            g.authorize_operation(&crew, None, &Capability::TripsEdit).unwrap_err(),
            AuthzError::Forbidden(DenialKind::MissingCapability)
        );
    }
}

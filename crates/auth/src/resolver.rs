//! Effective permission resolution.
//!
//! Precedence, highest first: explicit per-user override, active custom role
//! of the principal's own tenant, built-in role defaults.

use serde::Serialize;

use crate::catalog::{
    BuiltInRole, Capability, CapabilitySet, ImplicitGrant, default_capabilities, implicit_grant,
};
use crate::custom_role::{CustomRoleSource, RoleLookupError};
use crate::principal::Principal;

/// Where an effective capability set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionSource {
    Override,
    CustomRole,
    RoleDefaults,
}

/// Capabilities of one principal for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePermissionSet {
    role: BuiltInRole,
    capabilities: CapabilitySet,
    source: PermissionSource,
}

impl EffectivePermissionSet {
    pub fn role(&self) -> BuiltInRole {
        self.role
    }

    /// The resolved set, exactly as precedence produced it.
    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    pub fn source(&self) -> PermissionSource {
        self.source
    }

    /// Whether the capability is granted, by the resolved set or by a named
    /// implicit grant of the catalog.
    pub fn allows(&self, capability: Capability) -> bool {
        self.capabilities.contains(capability) || self.implicit_grant(capability).is_some()
    }

    /// The named catalog rule granting `capability` outside the resolved set.
    pub fn implicit_grant(&self, capability: Capability) -> Option<&'static ImplicitGrant> {
        if self.capabilities.contains(capability) {
            return None;
        }
        implicit_grant(self.role, capability)
    }
}

/// Computes [`EffectivePermissionSet`]s. Holds no per-request state.
#[derive(Debug, Clone)]
pub struct PermissionResolver<S> {
    roles: S,
}

impl<S> PermissionResolver<S>
where
    S: CustomRoleSource,
{
    pub fn new(roles: S) -> Self {
        Self { roles }
    }

    pub fn resolve(&self, principal: &Principal) -> Result<EffectivePermissionSet, RoleLookupError> {
        if let Some(overridden) = &principal.permission_override {
            return Ok(EffectivePermissionSet {
                role: principal.role,
                capabilities: overridden.clone(),
                source: PermissionSource::Override,
            });
        }

        if let Some(capabilities) = self.custom_role_capabilities(principal)? {
            return Ok(EffectivePermissionSet {
                role: principal.role,
                capabilities,
                source: PermissionSource::CustomRole,
            });
        }

        Ok(EffectivePermissionSet {
            role: principal.role,
            capabilities: default_capabilities(principal.role),
            source: PermissionSource::RoleDefaults,
        })
    }

    pub fn has_capability(
        &self,
        principal: &Principal,
        capability: Capability,
    ) -> Result<bool, RoleLookupError> {
        Ok(self.resolve(principal)?.allows(capability))
    }

    /// Capabilities of the principal's custom role, if it resolves to an
    /// active role of the principal's own tenant. Dangling, foreign and
    /// inactive references yield `None` so the caller degrades to defaults.
    fn custom_role_capabilities(
        &self,
        principal: &Principal,
    ) -> Result<Option<CapabilitySet>, RoleLookupError> {
        let Some(role_id) = &principal.custom_role_id else {
            return Ok(None);
        };
        let Some(tenant_id) = &principal.tenant_id else {
            tracing::debug!(
                user_id = %principal.user_id,
                custom_role_id = %role_id,
                "custom role ignored for principal without tenant"
            );
            return Ok(None);
        };

        match self.roles.find(tenant_id, role_id)? {
            Some(role) if role.is_usable_by(tenant_id) => Ok(Some(role.capabilities)),
            Some(role) => {
                tracing::debug!(
                    user_id = %principal.user_id,
                    custom_role_id = %role_id,
                    active = role.active,
                    "custom role not usable; falling back to role defaults"
                );
                Ok(None)
            }
            None => {
                tracing::warn!(
                    user_id = %principal.user_id,
                    tenant_id = %tenant_id,
                    custom_role_id = %role_id,
                    "dangling custom role reference; falling back to role defaults"
                );
                Ok(None)
            }
        }
    }
}

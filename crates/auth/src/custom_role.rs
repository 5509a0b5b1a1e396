//! Tenant-owned custom roles and the lookup seam used by the resolver.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use yachtops_core::{CustomRoleId, DomainError, DomainResult, TenantId};

use crate::catalog::CapabilitySet;

/// A named bundle of capabilities defined by one tenant.
///
/// # Invariants
/// - Owned by exactly one tenant, never shared.
/// - `name` is unique within the tenant (case-insensitive).
/// - Deactivated rather than deleted while any principal references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomRole {
    pub id: CustomRoleId,
    pub tenant_id: TenantId,
    pub name: String,
    pub capabilities: CapabilitySet,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of retiring a custom role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Retirement {
    /// Still referenced: kept, but no longer grants anything.
    Deactivated(CustomRole),
    /// Unreferenced: safe to hard-delete.
    Delete(CustomRoleId),
}

impl CustomRole {
    /// Define a new role for `tenant_id`.
    ///
    /// `existing` may contain roles of other tenants; only same-tenant names
    /// conflict.
    pub fn create(
        tenant_id: TenantId,
        name: &str,
        capabilities: CapabilitySet,
        existing: &[CustomRole],
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("custom role name cannot be empty"));
        }

        let taken = existing
            .iter()
            .filter(|r| r.tenant_id == tenant_id)
            .any(|r| r.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(DomainError::conflict(format!(
                "custom role '{name}' already exists"
            )));
        }

        Ok(Self {
            id: CustomRoleId::new(),
            tenant_id,
            name: name.to_string(),
            capabilities,
            active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Retire the role: deactivate if referenced, otherwise mark for deletion.
    pub fn retire(mut self, referenced: bool, now: DateTime<Utc>) -> Retirement {
        if referenced {
            self.active = false;
            self.updated_at = now;
            Retirement::Deactivated(self)
        } else {
            Retirement::Delete(self.id)
        }
    }

    /// Whether this role may grant capabilities to a principal of `tenant_id`.
    pub fn is_usable_by(&self, tenant_id: &TenantId) -> bool {
        self.active && &self.tenant_id == tenant_id
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoleLookupError {
    #[error("custom role lookup failed: {0}")]
    Unavailable(String),
}

/// Read-only lookup of custom roles (backed by the persistence collaborator).
///
/// Timeouts and retries belong to the implementation; the resolver performs a
/// single call per request.
pub trait CustomRoleSource: Send + Sync {
    fn find(
        &self,
        tenant_id: &TenantId,
        id: &CustomRoleId,
    ) -> Result<Option<CustomRole>, RoleLookupError>;
}

impl<S> CustomRoleSource for Arc<S>
where
    S: CustomRoleSource + ?Sized,
{
    fn find(
        &self,
        tenant_id: &TenantId,
        id: &CustomRoleId,
    ) -> Result<Option<CustomRole>, RoleLookupError> {
        (**self).find(tenant_id, id)
    }
}

/// In-memory custom role store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCustomRoleStore {
    inner: RwLock<HashMap<(TenantId, CustomRoleId), CustomRole>>,
}

impl InMemoryCustomRoleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, role: CustomRole) {
        if let Ok(mut map) = self.inner.write() {
            map.insert((role.tenant_id.clone(), role.id.clone()), role);
        }
    }

    pub fn list(&self, tenant_id: &TenantId) -> Vec<CustomRole> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };

        let mut roles: Vec<CustomRole> = map
            .iter()
            .filter_map(|((t, _), r)| if t == tenant_id { Some(r.clone()) } else { None })
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        roles
    }

    /// Define a role, enforcing per-tenant name uniqueness.
    pub fn create(
        &self,
        tenant_id: TenantId,
        name: &str,
        capabilities: CapabilitySet,
        now: DateTime<Utc>,
    ) -> DomainResult<CustomRole> {
        let existing = self.list(&tenant_id);
        let role = CustomRole::create(tenant_id, name, capabilities, &existing, now)?;
        self.insert(role.clone());
        Ok(role)
    }

    /// Retire a role, applying the deactivate-or-delete rule.
    pub fn retire(
        &self,
        tenant_id: &TenantId,
        id: &CustomRoleId,
        referenced: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<Retirement> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("custom role store poisoned"))?;

        let key = (tenant_id.clone(), id.clone());
        let role = map.remove(&key).ok_or_else(DomainError::not_found)?;

        let outcome = role.retire(referenced, now);
        if let Retirement::Deactivated(role) = &outcome {
            map.insert(key, role.clone());
        }
        Ok(outcome)
    }
}

impl CustomRoleSource for InMemoryCustomRoleStore {
    fn find(
        &self,
        tenant_id: &TenantId,
        id: &CustomRoleId,
    ) -> Result<Option<CustomRole>, RoleLookupError> {
        let map = self
            .inner
            .read()
            .map_err(|_| RoleLookupError::Unavailable("custom role store poisoned".to_string()))?;
        Ok(map.get(&(tenant_id.clone(), id.clone())).cloned())
    }
}

//! Tenant scope predicates.
//!
//! A [`ScopedFilter`] can only be produced by [`ScopePredicateBuilder::apply_scope`],
//! and tenant-owned stores only accept a `ScopedFilter`. Issuing a tenant-owned
//! query therefore requires a resolved [`TenantContext`].

use std::sync::RwLock;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::tenant::{TenantContext, TenantScope};

/// Default filter key holding a record's owning tenant.
pub const DEFAULT_OWNER_TENANT_KEY: &str = "ownerTenantId";

/// Caller-supplied equality filter: field name → expected value.
pub type Filter = Map<String, Value>;

/// A filter that has been through tenant scoping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScopedFilter {
    filter: Filter,
    #[serde(skip)]
    platform_wide: bool,
}

impl ScopedFilter {
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Hand the filter to the persistence collaborator.
    pub fn into_inner(self) -> Filter {
        self.filter
    }

    /// True when no tenant predicate was added (explicit platform-wide view).
    pub fn is_platform_wide(&self) -> bool {
        self.platform_wide
    }

    /// Whether a JSON record satisfies every predicate of the filter.
    pub fn matches(&self, record: &Value) -> bool {
        let Some(fields) = record.as_object() else {
            return false;
        };
        self.filter.iter().all(|(key, expected)| fields.get(key) == Some(expected))
    }
}

/// Adds the tenant predicate to caller filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopePredicateBuilder {
    owner_key: String,
}

impl Default for ScopePredicateBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_OWNER_TENANT_KEY)
    }
}

impl ScopePredicateBuilder {
    pub fn new(owner_key: impl Into<String>) -> Self {
        Self {
            owner_key: owner_key.into(),
        }
    }

    pub fn owner_key(&self) -> &str {
        &self.owner_key
    }

    /// Constrain `base` to the context's tenant, keeping every other key.
    ///
    /// Idempotent: scoping an already scoped filter changes nothing. A caller
    /// value for the owner key is replaced by the resolved tenant. The
    /// platform-wide context returns `base` untouched.
    pub fn apply_scope(&self, context: &TenantContext, mut base: Filter) -> ScopedFilter {
        match context.scope() {
            TenantScope::Tenant(tenant_id) => {
                let predicate = Value::String(tenant_id.as_str().to_string());
                if let Some(previous) = base.insert(self.owner_key.clone(), predicate.clone()) {
                    if previous != predicate {
                        tracing::warn!(
                            owner_key = %self.owner_key,
                            requested = %previous,
                            tenant_id = %tenant_id,
                            "caller filter named another tenant; resolved tenant applied"
                        );
                    }
                }
                ScopedFilter {
                    filter: base,
                    platform_wide: false,
                }
            }
            TenantScope::PlatformWide => {
                tracing::info!(
                    platform_override = context.is_platform_override(),
                    "platform-wide query issued without tenant predicate"
                );
                ScopedFilter {
                    filter: base,
                    platform_wide: true,
                }
            }
        }
    }
}

/// Persistence seam for tenant-owned records.
pub trait TenantOwnedStore: Send + Sync {
    fn find(&self, filter: &ScopedFilter) -> Vec<Value>;
}

/// In-memory record store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: RwLock<Vec<Value>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: Value) {
        if let Ok(mut records) = self.records.write() {
            records.push(record);
        }
    }
}

impl TenantOwnedStore for InMemoryRecordStore {
    fn find(&self, filter: &ScopedFilter) -> Vec<Value> {
        let records = match self.records.read() {
            Ok(r) => r,
            Err(_) => return vec![],
        };

        records.iter().filter(|r| filter.matches(r)).cloned().collect()
    }
}

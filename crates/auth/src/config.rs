//! Authorization configuration.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::scope::DEFAULT_OWNER_TENANT_KEY;

/// Tunables for hint parsing and scope predicates.
///
/// Every value is trimmed and must be non-blank.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthzConfig {
    /// Reserved hint token that selects the platform-wide (unscoped) view.
    #[serde(deserialize_with = "non_blank")]
    pub platform_wide_hint: String,
    /// Request header carrying the tenant hint.
    #[serde(deserialize_with = "non_blank")]
    pub tenant_hint_header: String,
    /// Query parameter carrying the tenant hint.
    #[serde(deserialize_with = "non_blank")]
    pub tenant_hint_param: String,
    /// Filter key holding the owning tenant of a record.
    #[serde(deserialize_with = "non_blank")]
    pub owner_tenant_key: String,
}

fn non_blank<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    match value.trim() {
        "" => Err(D::Error::custom("configuration value must not be blank")),
        trimmed => Ok(trimmed.to_string()),
    }
}

impl Default for AuthzConfig {
    fn default() -> Self {
        Self {
            platform_wide_hint: "*".to_string(),
            tenant_hint_header: "x-yacht-id".to_string(),
            tenant_hint_param: "yachtId".to_string(),
            owner_tenant_key: DEFAULT_OWNER_TENANT_KEY.to_string(),
        }
    }
}

impl AuthzConfig {
    /// Load from `YACHTOPS_*` environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let read = |key: &str, fallback: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(fallback)
        };

        Self {
            platform_wide_hint: read("YACHTOPS_PLATFORM_WIDE_HINT", defaults.platform_wide_hint),
            tenant_hint_header: read("YACHTOPS_TENANT_HINT_HEADER", defaults.tenant_hint_header),
            tenant_hint_param: read("YACHTOPS_TENANT_HINT_PARAM", defaults.tenant_hint_param),
            owner_tenant_key: read("YACHTOPS_OWNER_TENANT_KEY", defaults.owner_tenant_key),
        }
    }
}

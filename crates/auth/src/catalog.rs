//! Permission catalog: the closed set of capabilities and built-in role defaults.
//!
//! Adding a capability or changing a default grant is a catalog change and
//! bumps [`CATALOG_VERSION`]. Nothing here is decided at runtime.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Version of the capability table and role defaults below.
pub const CATALOG_VERSION: u32 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown capability '{0}'")]
    UnknownCapability(String),

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("malformed permission list: {0}")]
    MalformedPermissionList(String),
}

macro_rules! capability_catalog {
    ($($variant:ident => $token:literal : $desc:literal,)+) => {
        /// A capability identifier from the closed catalog (e.g. `trips.edit`).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Capability {
            $($variant,)+
        }

        impl Capability {
            /// Every capability, in catalog order.
            pub const ALL: &'static [Capability] = &[$(Capability::$variant,)+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Capability::$variant => $token,)+
                }
            }

            pub fn description(&self) -> &'static str {
                match self {
                    $(Capability::$variant => $desc,)+
                }
            }
        }

        impl FromStr for Capability {
            type Err = CatalogError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($token => Ok(Capability::$variant),)+
                    other => Err(CatalogError::UnknownCapability(other.to_string())),
                }
            }
        }
    };
}

capability_catalog! {
    ExpensesView => "expenses.view": "View expenses and receipts",
    ExpensesCreate => "expenses.create": "Record new expenses",
    ExpensesEdit => "expenses.edit": "Edit recorded expenses",
    ExpensesDelete => "expenses.delete": "Delete expenses",
    ExpensesApprove => "expenses.approve": "Approve or reject submitted expenses",
    TripsView => "trips.view": "View trips and itineraries",
    TripsCreate => "trips.create": "Plan new trips",
    TripsEdit => "trips.edit": "Edit trips and itineraries",
    TripsDelete => "trips.delete": "Delete trips",
    CrewView => "crew.view": "View the crew roster",
    CrewManage => "crew.manage": "Manage crew members and schedules",
    MessagesView => "messages.view": "Read yacht messages",
    MessagesSend => "messages.send": "Send yacht messages",
    DocumentsView => "documents.view": "View yacht documents",
    DocumentsUpload => "documents.upload": "Upload yacht documents",
    DocumentsDelete => "documents.delete": "Delete yacht documents",
    MaintenanceView => "maintenance.view": "View maintenance tasks",
    MaintenanceEdit => "maintenance.edit": "Create and update maintenance tasks",
    ReportsView => "reports.view": "View financial and operational reports",
    UsersView => "users.view": "View user accounts",
    UsersManage => "users.manage": "Invite, edit and deactivate users",
    RolesManage => "roles.manage": "Define custom roles",
    SettingsManage => "settings.manage": "Change yacht settings",
    TenantsManage => "tenants.manage": "Create and remove yachts on the platform",
}

impl Capability {
    /// Functional area, the part before the first dot.
    pub fn area(&self) -> &'static str {
        let token = self.as_str();
        token.split_once('.').map(|(area, _)| area).unwrap_or(token)
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Capability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}

/// Whether `token` names a capability in the catalog.
pub fn is_valid_capability(token: &str) -> bool {
    token.parse::<Capability>().is_ok()
}

/// Parse a single capability token, failing on anything outside the catalog.
pub fn parse_capability(token: &str) -> Result<Capability, CatalogError> {
    token.parse()
}

/// An immutable-by-convention set of capabilities.
///
/// Serializes as a sorted list of tokens; deserializing an unknown token fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Every capability in the catalog.
    pub fn all() -> Self {
        Capability::ALL.iter().copied().collect()
    }

    /// Parse a list of tokens; the first unknown token fails the whole list.
    pub fn parse_tokens<I, S>(tokens: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokens
            .into_iter()
            .map(|t| parse_capability(t.as_ref()))
            .collect()
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tokens in sorted order, for display and audit.
    pub fn tokens(&self) -> Vec<String> {
        self.iter().map(|c| c.as_str().to_string()).collect()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Capability; N]> for CapabilitySet {
    fn from(value: [Capability; N]) -> Self {
        value.into_iter().collect()
    }
}

/// Built-in role carried by every principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuiltInRole {
    SuperAdmin,
    Admin,
    Owner,
    Manager,
    Captain,
    Crew,
}

impl BuiltInRole {
    pub const ALL: &'static [BuiltInRole] = &[
        BuiltInRole::SuperAdmin,
        BuiltInRole::Admin,
        BuiltInRole::Owner,
        BuiltInRole::Manager,
        BuiltInRole::Captain,
        BuiltInRole::Crew,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BuiltInRole::SuperAdmin => "SUPER_ADMIN",
            BuiltInRole::Admin => "ADMIN",
            BuiltInRole::Owner => "OWNER",
            BuiltInRole::Manager => "MANAGER",
            BuiltInRole::Captain => "CAPTAIN",
            BuiltInRole::Crew => "CREW",
        }
    }

    /// Platform roles operate across tenants, but only on explicit request.
    pub fn is_platform(&self) -> bool {
        matches!(self, BuiltInRole::SuperAdmin | BuiltInRole::Admin)
    }

    pub fn description(&self) -> &'static str {
        match self {
            BuiltInRole::SuperAdmin => "Platform operator with every capability",
            BuiltInRole::Admin => "Platform administrator for yacht accounts",
            BuiltInRole::Owner => "Yacht owner with full control of the yacht",
            BuiltInRole::Manager => "Yacht manager running day-to-day operations",
            BuiltInRole::Captain => "Captain responsible for trips, crew and upkeep",
            BuiltInRole::Crew => "Crew member with access to their own work",
        }
    }
}

impl core::fmt::Display for BuiltInRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuiltInRole {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BuiltInRole::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| CatalogError::UnknownRole(s.to_string()))
    }
}

/// Default capability set granted to a built-in role.
pub fn default_capabilities(role: BuiltInRole) -> CapabilitySet {
    use Capability::*;

    match role {
        BuiltInRole::SuperAdmin => CapabilitySet::all(),
        BuiltInRole::Admin => Capability::ALL
            .iter()
            .copied()
            .filter(|c| *c != TenantsManage)
            .collect(),
        BuiltInRole::Owner => Capability::ALL
            .iter()
            .copied()
            .filter(|c| *c != TenantsManage)
            .collect(),
        BuiltInRole::Manager => CapabilitySet::from([
            ExpensesView,
            ExpensesCreate,
            ExpensesEdit,
            ExpensesDelete,
            ExpensesApprove,
            TripsView,
            TripsCreate,
            TripsEdit,
            TripsDelete,
            CrewView,
            CrewManage,
            MessagesView,
            MessagesSend,
            DocumentsView,
            DocumentsUpload,
            DocumentsDelete,
            MaintenanceView,
            MaintenanceEdit,
            ReportsView,
            UsersView,
        ]),
        BuiltInRole::Captain => CapabilitySet::from([
            ExpensesView,
            ExpensesCreate,
            ExpensesEdit,
            TripsView,
            TripsCreate,
            TripsEdit,
            CrewView,
            CrewManage,
            MessagesView,
            MessagesSend,
            DocumentsView,
            DocumentsUpload,
            MaintenanceView,
            MaintenanceEdit,
            ReportsView,
        ]),
        BuiltInRole::Crew => CapabilitySet::from([
            ExpensesView,
            ExpensesCreate,
            TripsView,
            CrewView,
            MessagesView,
            MessagesSend,
            DocumentsView,
            MaintenanceView,
        ]),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Implicit grants
// ─────────────────────────────────────────────────────────────────────────────

/// A named rule granting capabilities to roles on top of their effective set.
///
/// This is the only place a role is allowed to bypass its resolved
/// capabilities. Call sites never compare roles themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImplicitGrant {
    pub name: &'static str,
    pub roles: &'static [BuiltInRole],
    pub capabilities: &'static [Capability],
}

impl ImplicitGrant {
    pub fn grants(&self, role: BuiltInRole, capability: Capability) -> bool {
        self.roles.contains(&role) && self.capabilities.contains(&capability)
    }
}

/// Platform roles may always administer users and roles, even under an override.
pub const PLATFORM_USER_ADMINISTRATION: ImplicitGrant = ImplicitGrant {
    name: "platform_user_administration",
    roles: &[BuiltInRole::SuperAdmin, BuiltInRole::Admin],
    capabilities: &[
        Capability::UsersView,
        Capability::UsersManage,
        Capability::RolesManage,
    ],
};

pub const IMPLICIT_GRANTS: &[ImplicitGrant] = &[PLATFORM_USER_ADMINISTRATION];

/// The named rule, if any, that grants `capability` to `role` implicitly.
pub fn implicit_grant(role: BuiltInRole, capability: Capability) -> Option<&'static ImplicitGrant> {
    IMPLICIT_GRANTS.iter().find(|g| g.grants(role, capability))
}

// ─────────────────────────────────────────────────────────────────────────────
// Catalog description (audit/display)
// ─────────────────────────────────────────────────────────────────────────────

/// Built-in role with its default grants.
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub platform: bool,
    pub capabilities: Vec<String>,
}

/// Capability with its area and description.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityDefinition {
    pub name: &'static str,
    pub area: &'static str,
    pub description: &'static str,
}

/// Complete, serializable view of the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogDescription {
    pub version: u32,
    pub roles: Vec<RoleDefinition>,
    pub capabilities: Vec<CapabilityDefinition>,
    pub implicit_grants: Vec<ImplicitGrant>,
}

pub fn describe() -> CatalogDescription {
    CatalogDescription {
        version: CATALOG_VERSION,
        roles: BuiltInRole::ALL
            .iter()
            .map(|role| RoleDefinition {
                name: role.as_str(),
                description: role.description(),
                platform: role.is_platform(),
                capabilities: default_capabilities(*role).tokens(),
            })
            .collect(),
        capabilities: Capability::ALL
            .iter()
            .map(|c| CapabilityDefinition {
                name: c.as_str(),
                area: c.area(),
                description: c.description(),
            })
            .collect(),
        implicit_grants: IMPLICIT_GRANTS.to_vec(),
    }
}

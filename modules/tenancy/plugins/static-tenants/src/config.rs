//! Configuration for the static tenant directory plugin.

use serde::Deserialize;
use tenancy_sdk::TenantStatus;
use uuid::Uuid;

/// Plugin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticTenantsConfig {
    /// Static tenant definitions.
    pub tenants: Vec<TenantSeed>,
}

/// Configuration for a single tenant.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantSeed {
    /// Tenant ID.
    pub id: Uuid,

    /// Tenant name.
    pub name: String,

    /// Routing key matched against inbound requests. Must be unique.
    pub routing_key: String,

    /// Tenant status (defaults to active).
    #[serde(default)]
    pub status: TenantStatus,
}

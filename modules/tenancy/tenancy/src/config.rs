//! Configuration for the tenant resolver module.

use serde::Deserialize;

/// Module configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TenancyConfig {
    /// Active routing-key extraction strategy. Exactly one per deployment.
    pub strategy: RoutingKeyStrategy,

    /// Where tenant-required requests are steered while no tenant exists.
    pub setup_path: String,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            strategy: RoutingKeyStrategy::default(),
            setup_path: "/setup".to_owned(),
        }
    }
}

/// How the routing key is derived from a request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RoutingKeyStrategy {
    /// Full `Host` header value, port stripped.
    #[default]
    Host,

    /// Label directly under the configured base domain
    /// (`acme.example.com` → `acme`).
    Subdomain { base_domain: String },

    /// First path segment (`/acme/dashboard` → `acme`).
    PathPrefix,

    /// Value of an explicit header.
    Header { name: String },
}

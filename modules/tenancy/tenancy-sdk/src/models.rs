use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique tenant identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub Uuid);

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for TenantId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Provisioning state of a tenant. Only `active` tenants serve traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    #[default]
    Active,
    Provisioning,
    Disabled,
}

/// One tenant record, read-only from the bootstrap core's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// Value matched against the routing key extracted from a request
    /// (host, subdomain label, path segment or header value).
    pub routing_key: String,
    pub status: TenantStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(TenantStatus::Provisioning).unwrap(),
            serde_json::json!("provisioning")
        );
        let parsed: TenantStatus = serde_json::from_value(serde_json::json!("disabled")).unwrap();
        assert_eq!(parsed, TenantStatus::Disabled);
    }

    #[test]
    fn status_defaults_to_active() {
        assert_eq!(TenantStatus::default(), TenantStatus::Active);
    }
}

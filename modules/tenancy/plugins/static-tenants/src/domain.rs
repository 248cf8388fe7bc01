//! In-memory tenant directory built from configuration.

use std::collections::HashMap;

use async_trait::async_trait;
use tenancy_sdk::{Tenant, TenantDirectoryClient, TenantDirectoryError, TenantId};

use crate::config::StaticTenantsConfig;

#[derive(Debug)]
pub struct StaticTenantDirectory {
    all: Vec<Tenant>,
    by_key: HashMap<String, Tenant>,
}

impl StaticTenantDirectory {
    /// Build the directory from config.
    ///
    /// # Errors
    /// Fails on duplicate routing keys; two tenants must never match the
    /// same request.
    pub fn from_config(config: &StaticTenantsConfig) -> anyhow::Result<Self> {
        let mut all = Vec::with_capacity(config.tenants.len());
        let mut by_key = HashMap::with_capacity(config.tenants.len());

        for seed in &config.tenants {
            let tenant = Tenant {
                id: TenantId(seed.id),
                name: seed.name.clone(),
                routing_key: seed.routing_key.clone(),
                status: seed.status,
            };
            if by_key
                .insert(seed.routing_key.clone(), tenant.clone())
                .is_some()
            {
                anyhow::bail!("duplicate routing key '{}'", seed.routing_key);
            }
            all.push(tenant);
        }

        Ok(Self { all, by_key })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.all.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.all.is_empty()
    }
}

#[async_trait]
impl TenantDirectoryClient for StaticTenantDirectory {
    async fn list_all(&self) -> Result<Vec<Tenant>, TenantDirectoryError> {
        Ok(self.all.clone())
    }

    async fn find_by_routing_key(&self, key: &str) -> Result<Option<Tenant>, TenantDirectoryError> {
        Ok(self.by_key.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenancy_sdk::TenantStatus;

    fn config(keys: &[&str]) -> StaticTenantsConfig {
        serde_json::from_value(serde_json::json!({
            "tenants": keys
                .iter()
                .map(|key| serde_json::json!({
                    "id": uuid::Uuid::new_v4(),
                    "name": format!("Tenant {key}"),
                    "routing_key": key,
                }))
                .collect::<Vec<_>>()
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn lookup_by_routing_key() {
        let directory = StaticTenantDirectory::from_config(&config(&["acme", "beta"])).unwrap();
        assert_eq!(directory.len(), 2);

        let found = directory.find_by_routing_key("acme").await.unwrap().unwrap();
        assert_eq!(found.routing_key, "acme");
        assert_eq!(found.status, TenantStatus::Active);

        assert!(directory.find_by_routing_key("ghost").await.unwrap().is_none());
    }

    #[test]
    fn duplicate_routing_key_is_rejected() {
        let err = StaticTenantDirectory::from_config(&config(&["acme", "acme"])).unwrap_err();
        assert!(err.to_string().contains("duplicate routing key"));
    }

    #[tokio::test]
    async fn empty_config_means_zero_tenants() {
        let directory = StaticTenantDirectory::from_config(&StaticTenantsConfig::default()).unwrap();
        assert!(directory.is_empty());
        assert!(directory.list_all().await.unwrap().is_empty());
    }
}

//! Static tenant directory module wiring.

use std::sync::Arc;

use async_trait::async_trait;

use menara_kit::{Module, ModuleCtx, ModuleRegistration, RegistryBuilder};
use tenancy_sdk::TenantDirectoryClient;

use crate::config::StaticTenantsConfig;
use crate::domain::StaticTenantDirectory;

/// Registers a configuration-backed [`TenantDirectoryClient`] in the hub.
#[derive(Default)]
pub struct StaticTenantsModule;

#[async_trait]
impl Module for StaticTenantsModule {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        let cfg: StaticTenantsConfig = ctx.config()?;
        let directory = StaticTenantDirectory::from_config(&cfg)?;

        if directory.is_empty() {
            tracing::warn!("No tenants configured; requests will be steered to the setup flow");
        } else {
            tracing::info!(tenants = directory.len(), "Loaded static tenant directory");
        }

        ctx.client_hub()
            .register::<dyn TenantDirectoryClient>(Arc::new(directory));
        Ok(())
    }
}

fn register_module(builder: &mut RegistryBuilder) {
    builder.register_core_with_meta(
        "static_tenants",
        &["tenancy"],
        Arc::new(StaticTenantsModule),
    );
}

inventory::submit! {
    ModuleRegistration {
        name: "static_tenants",
        register: register_module,
    }
}

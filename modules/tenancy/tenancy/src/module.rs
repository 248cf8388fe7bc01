//! Tenant resolver module wiring.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use axum::middleware::from_fn_with_state;

use menara_kit::{
    HttpServer, MiddlewareModule, MiddlewarePriority, Module, ModuleCtx, ModuleRegistration,
    RegistryBuilder,
};

use crate::config::TenancyConfig;
use crate::resolver::{TenantResolverState, resolve_tenant};

/// Tenant resolver module.
///
/// `init` loads the extraction strategy; the middleware capability then
/// pins the resolver layer to priority 0 so it runs ahead of every
/// module-contributed layer and route.
#[derive(Default)]
pub struct TenancyModule {
    config: OnceLock<Arc<TenancyConfig>>,
}

#[async_trait]
impl Module for TenancyModule {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()> {
        let cfg: TenancyConfig = ctx.config()?;
        tracing::info!(strategy = ?cfg.strategy, "Initializing tenant resolver");
        self.config
            .set(Arc::new(cfg))
            .map_err(|_| anyhow::anyhow!("tenant resolver initialized twice"))?;
        Ok(())
    }
}

impl MiddlewareModule for TenancyModule {
    fn register_middleware(&self, ctx: &ModuleCtx, server: &mut HttpServer) -> anyhow::Result<()> {
        let config = self
            .config
            .get()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("tenant resolver config not initialized"))?;
        let hub = ctx.client_hub();

        server.register_middleware(
            MiddlewarePriority::TENANT_RESOLUTION,
            Box::new(move |router, routes| {
                let state = TenantResolverState::new(hub, config, routes);
                router.layer(from_fn_with_state(state, resolve_tenant))
            }),
        );
        Ok(())
    }
}

fn register_module(builder: &mut RegistryBuilder) {
    let module = Arc::new(TenancyModule::default());
    builder.register_core_with_meta("tenancy", &[], module.clone());
    builder.register_middleware_with_meta("tenancy", module);
}

inventory::submit! {
    ModuleRegistration {
        name: "tenancy",
        register: register_module,
    }
}

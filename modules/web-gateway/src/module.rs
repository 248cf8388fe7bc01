//! Web gateway module definition.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use axum::Router;
use axum::routing::get;
use http::{HeaderValue, Method};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use menara_kit::{
    HttpServer, Module, ModuleCtx, ModuleRegistration, RegistryBuilder, RestHostModule,
    RoutePolicy, StatefulModule,
};

use crate::config::GatewayConfig;
use crate::web::{self, WebState};

const X_REQUEST_ID: &str = "x-request-id";

#[derive(Clone, Copy, Default)]
struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _req: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The single REST host: owns the listener and the frozen router.
pub struct GatewayModule {
    config: ArcSwap<GatewayConfig>,
    final_router: Mutex<Option<Router>>,
}

impl Default for GatewayModule {
    fn default() -> Self {
        Self {
            config: ArcSwap::from_pointee(GatewayConfig::default()),
            final_router: Mutex::new(None),
        }
    }
}

impl GatewayModule {
    /// The frozen router, once `rest_finalize` ran. Used by `start` and by
    /// tests that drive the router without a listener.
    #[must_use]
    pub fn built_router(&self) -> Option<Router> {
        self.final_router.lock().clone()
    }

    fn parse_bind_address(bind_addr: &str) -> Result<SocketAddr> {
        bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address '{bind_addr}': {e}"))
    }

    /// Outermost infrastructure layers, wrapped around the frozen table:
    /// request-id set/propagate and request tracing. Module middleware
    /// (tenant resolution included) stays inside these.
    fn apply_infra_layers(router: Router) -> Router {
        let header = http::HeaderName::from_static(X_REQUEST_ID);
        router
            .layer(TraceLayer::new_for_http().make_span_with(
                |req: &http::Request<axum::body::Body>| {
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri().path(),
                    )
                },
            ))
            .layer(PropagateRequestIdLayer::new(header.clone()))
            .layer(SetRequestIdLayer::new(header, MakeReqId))
    }
}

#[async_trait]
impl Module for GatewayModule {
    async fn init(&self, ctx: &ModuleCtx) -> Result<()> {
        let cfg: GatewayConfig = ctx.config()?;
        tracing::info!(bind_addr = %cfg.bind_addr, "Initializing web gateway");
        self.config.store(Arc::new(cfg));
        Ok(())
    }
}

impl RestHostModule for GatewayModule {
    fn rest_prepare(&self, ctx: &ModuleCtx, server: &mut HttpServer) -> Result<()> {
        // Prepare runs before any module's init; read config directly so
        // the bootstrap routes see the right redirect targets.
        let cfg: GatewayConfig = ctx.config()?;
        let state = WebState {
            hub: ctx.client_hub(),
            config: Arc::new(cfg),
        };

        server.register_route(
            Method::GET,
            "/",
            get(web::root_redirect).with_state(state.clone()),
            RoutePolicy::tenant_exempt(),
        )?;
        server.register_route(
            Method::GET,
            "/api/health",
            get(web::health).with_state(state),
            RoutePolicy::tenant_exempt(),
        )?;
        Ok(())
    }

    fn rest_finalize(&self, _ctx: &ModuleCtx, server: HttpServer) -> Result<()> {
        let (router, table) = server.freeze();
        tracing::info!(routes = table.len(), "Route table frozen");
        *self.final_router.lock() = Some(Self::apply_infra_layers(router));
        Ok(())
    }
}

#[async_trait]
impl StatefulModule for GatewayModule {
    async fn start(&self, cancel: CancellationToken) -> Result<()> {
        let cfg = self.config.load();
        let addr = Self::parse_bind_address(&cfg.bind_addr)?;
        let router = self
            .final_router
            .lock()
            .take()
            .ok_or_else(|| anyhow::anyhow!("no frozen router; module loading did not finish"))?;

        // Bind before reporting started: no request can arrive while
        // modules are still loading.
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("HTTP server bound on {addr}");

        let shutdown = async move {
            cancel.cancelled().await;
            tracing::info!("HTTP server shutting down gracefully (cancellation)");
        };
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::error!(error = %e, "HTTP server terminated with error");
            }
        });

        Ok(())
    }

    async fn stop(&self, _cancel: CancellationToken) -> Result<()> {
        // The serve task exits on the shared cancellation token.
        Ok(())
    }
}

fn register_module(builder: &mut RegistryBuilder) {
    let module = Arc::new(GatewayModule::default());
    builder.register_core_with_meta("web_gateway", &[], module.clone());
    builder.register_rest_host_with_meta("web_gateway", module.clone());
    builder.register_stateful_with_meta("web_gateway", module);
}

inventory::submit! {
    ModuleRegistration {
        name: "web_gateway",
        register: register_module,
    }
}

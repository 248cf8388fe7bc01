use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::context::ModuleCtx;
use crate::server::HttpServer;

/// Core module: DI/wiring only; no routes are reachable yet when this runs.
#[async_trait]
pub trait Module: Send + Sync + 'static {
    async fn init(&self, ctx: &ModuleCtx) -> anyhow::Result<()>;
}

/// Route contribution; must be sync. Runs after the module's `init`, in load
/// order, against the shared (still mutable) server table.
pub trait RestfulModule: Send + Sync {
    fn register_rest(&self, ctx: &ModuleCtx, server: &mut HttpServer) -> anyhow::Result<()>;
}

/// Middleware contribution; registered before the module's routes.
///
/// Layers are not applied here — they are recorded with a priority and
/// applied when the server table is frozen, so registration order between
/// modules cannot silently change the chain.
pub trait MiddlewareModule: Send + Sync {
    fn register_middleware(&self, ctx: &ModuleCtx, server: &mut HttpServer) -> anyhow::Result<()>;
}

/// REST host module: owns the HTTP listener.
///
/// Exactly one module per process may have this capability. `rest_prepare`
/// runs before any module loads (bootstrap routes), `rest_finalize` consumes
/// the table after every module loaded and freezes it. Neither starts the
/// server.
pub trait RestHostModule: Send + Sync + 'static {
    fn rest_prepare(&self, ctx: &ModuleCtx, server: &mut HttpServer) -> anyhow::Result<()>;

    fn rest_finalize(&self, ctx: &ModuleCtx, server: HttpServer) -> anyhow::Result<()>;
}

#[async_trait]
pub trait StatefulModule: Send + Sync {
    async fn start(&self, cancel: CancellationToken) -> anyhow::Result<()>;
    async fn stop(&self, cancel: CancellationToken) -> anyhow::Result<()>;
}

//! Menara runtime runner.
//!
//! Full cycle: discover+order → load (init/middleware/routes, manifest) →
//! start → wait → stop. Loading happens entirely before the start phase, so
//! no request is dispatched until every module is wired or the process has
//! aborted. Shutdown can be driven by OS signals, an external
//! `CancellationToken`, or an arbitrary future.

use std::{future::Future, pin::Pin, sync::Arc};
use tokio_util::sync::CancellationToken;

use crate::client_hub::ClientHub;
use crate::config::ConfigProvider;
use crate::context::ModuleContextBuilder;
use crate::loader::{ModuleLoader, ModuleManifest};
use crate::registry::ModuleRegistry;
use crate::runtime::shutdown;
use crate::server::HttpServer;

/// How the runtime should decide when to stop.
pub enum ShutdownOptions {
    /// Listen for OS signals (Ctrl+C / SIGTERM).
    Signals,
    /// An external `CancellationToken` controls the lifecycle.
    Token(CancellationToken),
    /// An arbitrary future; when it completes, we initiate shutdown.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

/// Options for running the Menara runtime.
pub struct RunOptions {
    /// Provider of module config sections (raw JSON by module name).
    pub modules_cfg: Arc<dyn ConfigProvider>,
    /// Shutdown strategy.
    pub shutdown: ShutdownOptions,
}

/// Full cycle: load → start → wait → stop.
///
/// # Errors
/// Any registry or load error aborts before a single stateful module
/// starts; start-phase errors abort as well. Stop-phase errors are logged
/// and do not fail shutdown.
pub async fn run(opts: RunOptions) -> anyhow::Result<()> {
    let hub = Arc::new(ClientHub::default());
    let cancel = match &opts.shutdown {
        ShutdownOptions::Token(t) => t.clone(),
        _ => CancellationToken::new(),
    };

    // Spawn the shutdown waiter according to the chosen strategy.
    match opts.shutdown {
        ShutdownOptions::Signals => {
            let c = cancel.clone();
            tokio::spawn(async move {
                match shutdown::wait_for_shutdown().await {
                    Ok(()) => {
                        tracing::info!("shutdown: signal received");
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "shutdown: primary waiter failed; falling back to ctrl_c()"
                        );
                        let _ = tokio::signal::ctrl_c().await;
                    }
                }
                c.cancel();
            });
        }
        ShutdownOptions::Future(waiter) => {
            let c = cancel.clone();
            tokio::spawn(async move {
                waiter.await;
                tracing::info!("shutdown: external future completed");
                c.cancel();
            });
        }
        ShutdownOptions::Token(_) => {
            tracing::info!("shutdown: external token will control lifecycle");
        }
    }

    // Discover and order modules upfront; any validation error is fatal
    // before a single route exists.
    let registry = ModuleRegistry::discover_and_build()?;

    let ctx_builder = ModuleContextBuilder::new(opts.modules_cfg, Arc::clone(&hub), cancel.clone());

    // LOAD phase: init + wiring for every module, in dependency order.
    tracing::info!("Phase: load");
    let loader = ModuleLoader::new();
    loader
        .load(HttpServer::new(), &registry, &ctx_builder)
        .await?;

    // Publish the manifest for health reporting.
    hub.register::<ModuleManifest>(Arc::new(loader.manifest()));

    // START phase
    tracing::info!("Phase: start");
    for entry in registry.modules() {
        if let Some(stateful) = &entry.stateful {
            stateful
                .start(cancel.clone())
                .await
                .map_err(|e| anyhow::anyhow!("module '{}' failed to start: {e:#}", entry.name))?;
            tracing::info!(module = entry.name, "Started module");
        }
    }

    // WAIT
    cancel.cancelled().await;

    // STOP phase: reverse order; errors are logged, shutdown continues.
    tracing::info!("Phase: stop");
    for entry in registry.modules().iter().rev() {
        if let Some(stateful) = &entry.stateful {
            if let Err(err) = stateful.stop(cancel.clone()).await {
                tracing::warn!(module = entry.name, error = %err, "Failed to stop module");
            } else {
                tracing::info!(module = entry.name, "Stopped module");
            }
        }
    }

    Ok(())
}

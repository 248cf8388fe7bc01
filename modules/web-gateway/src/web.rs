//! Bootstrap route handlers.
//!
//! Both routes are tenant-exempt: they must answer before any tenant is
//! provisioned, since they are what steers a fresh deployment into the
//! setup wizard.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;

use menara_kit::client_hub::ClientHub;
use menara_kit::loader::ModuleManifest;
use menara_kit::problem;
use tenancy_sdk::TenantDirectoryClient;

use crate::config::GatewayConfig;

#[derive(Clone)]
pub(crate) struct WebState {
    pub(crate) hub: Arc<ClientHub>,
    pub(crate) config: Arc<GatewayConfig>,
}

fn directory_unavailable(detail: String) -> Response {
    problem::service_unavailable(detail)
        .with_type("urn:menara:tenant-directory-unavailable")
        .into_response()
}

/// `GET /` — first-contact routing: setup wizard while no tenant exists,
/// login otherwise. Always a 303 so browsers re-issue as GET.
pub(crate) async fn root_redirect(State(state): State<WebState>) -> Response {
    let directory = match state.hub.get::<dyn TenantDirectoryClient>() {
        Ok(directory) => directory,
        Err(e) => {
            tracing::error!(error = %e, "No tenant directory client registered");
            return directory_unavailable("tenant directory is not available".to_owned());
        }
    };

    match directory.list_all().await {
        Ok(tenants) if tenants.is_empty() => {
            Redirect::to(&state.config.setup_path).into_response()
        }
        Ok(_) => Redirect::to(&state.config.login_path).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Tenant directory lookup failed on root route");
            directory_unavailable(e.to_string())
        }
    }
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    version: &'static str,
    modules: ModuleManifest,
}

/// `GET /api/health` — process status plus the startup module manifest.
pub(crate) async fn health(State(state): State<WebState>) -> Response {
    let (status, modules) = match state.hub.get::<ModuleManifest>() {
        Ok(manifest) => {
            let status = if manifest.is_degraded() { "degraded" } else { "ok" };
            (status, (*manifest).clone())
        }
        Err(_) => ("degraded", ModuleManifest::default()),
    };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        modules,
    })
    .into_response()
}

//! Per-request tenant resolution.
//!
//! The resolver runs as the outermost module middleware (priority 0). Per
//! request it walks a small state machine and attaches the terminal state
//! to the request before dispatch:
//!
//! - `Active` — a matching, active tenant; handlers read it through
//!   [`ResolvedTenant`].
//! - `Unresolved` — no tenant matched (or the route is tenant-exempt);
//!   disposition is left to the routing layer.
//! - `Unavailable` — a tenant matched but is not active; the request fails
//!   here with a distinguishable 403, never a generic error.
//! - `ZeroTenantBootstrap` — no tenant exists system-wide; tenant-required
//!   requests are redirected to the setup flow regardless of routing key.
//!
//! A directory outage is its own failure (503), never treated as zero
//! tenants. The attached context never changes for the rest of the request.

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};
use http::request::Parts;
use http::{HeaderMap, header};

use menara_kit::client_hub::ClientHub;
use menara_kit::problem::{self, Problem};
use menara_kit::server::{RouteTable, TenantPolicy};
use tenancy_sdk::{Tenant, TenantDirectoryClient, TenantDirectoryError, TenantStatus};

use crate::config::{RoutingKeyStrategy, TenancyConfig};

/// Terminal resolution state for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TenantResolution {
    Unresolved,
    Active(Tenant),
    Unavailable(Tenant),
    ZeroTenantBootstrap,
}

/// Request-scoped tenant context.
///
/// Exactly one exists per request, inserted by the resolver before any
/// handler runs; it is never replaced afterwards. Cloning shares the same
/// immutable resolution.
#[derive(Debug, Clone)]
pub struct RequestTenantContext(Arc<TenantResolution>);

impl RequestTenantContext {
    fn new(resolution: TenantResolution) -> Self {
        Self(Arc::new(resolution))
    }

    #[must_use]
    pub fn resolution(&self) -> &TenantResolution {
        &self.0
    }

    /// The resolved tenant, if the request belongs to an active one.
    #[must_use]
    pub fn tenant(&self) -> Option<&Tenant> {
        match &*self.0 {
            TenantResolution::Active(tenant) => Some(tenant),
            _ => None,
        }
    }
}

impl<S> FromRequestParts<S> for RequestTenantContext
where
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| problem::internal_error("tenant resolution did not run for this request"))
    }
}

/// Extractor for handlers that require an active tenant.
///
/// Rejects with 404 when the request carries no resolved tenant; whether a
/// deployment prefers a login redirect instead is routing-layer policy.
pub struct ResolvedTenant(pub Tenant);

impl<S> FromRequestParts<S> for ResolvedTenant
where
    S: Send + Sync,
{
    type Rejection = Problem;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = RequestTenantContext::from_request_parts(parts, state).await?;
        match ctx.tenant() {
            Some(tenant) => Ok(Self(tenant.clone())),
            None => Err(problem::not_found("no tenant resolved for this request")),
        }
    }
}

/// Shared state of the resolver layer.
#[derive(Clone)]
pub struct TenantResolverState {
    pub(crate) hub: Arc<ClientHub>,
    pub(crate) config: Arc<TenancyConfig>,
    pub(crate) routes: Arc<RouteTable>,
}

impl TenantResolverState {
    #[must_use]
    pub fn new(hub: Arc<ClientHub>, config: Arc<TenancyConfig>, routes: Arc<RouteTable>) -> Self {
        Self { hub, config, routes }
    }
}

fn strip_port(host: &str) -> &str {
    if let Some(rest) = host.strip_prefix('[') {
        // Bracketed IPv6 literal.
        rest.split(']').next().unwrap_or(rest)
    } else {
        host.split(':').next().unwrap_or(host)
    }
}

fn host_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(header::HOST).and_then(|v| v.to_str().ok())
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

/// Derive the routing key from a request per the active strategy.
#[must_use]
pub fn extract_routing_key(strategy: &RoutingKeyStrategy, req: &Request) -> Option<String> {
    match strategy {
        RoutingKeyStrategy::Host => {
            host_header(req.headers()).and_then(|h| non_empty(strip_port(h)))
        }
        RoutingKeyStrategy::Subdomain { base_domain } => {
            let host = strip_port(host_header(req.headers())?);
            let prefix = host.strip_suffix(base_domain.as_str())?.strip_suffix('.')?;
            prefix.rsplit('.').next().and_then(non_empty)
        }
        RoutingKeyStrategy::PathPrefix => req
            .uri()
            .path()
            .trim_start_matches('/')
            .split('/')
            .next()
            .and_then(non_empty),
        RoutingKeyStrategy::Header { name } => req
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .and_then(non_empty),
    }
}

// The routing key is derived by the caller (see `resolve_tenant`) and passed
// in as an owned value: a `&Request` argument would be captured by this async
// fn's future, and axum's request body is `Send` but not `Sync`, so `&Request`
// is not `Send` — which would make this future (and its callers) non-`Send`.
async fn resolve(
    directory: &Arc<dyn TenantDirectoryClient>,
    key: Option<String>,
) -> Result<TenantResolution, TenantDirectoryError> {
    // Fixed rule: zero tenants system-wide short-circuits before any
    // routing-key matching.
    if directory.list_all().await?.is_empty() {
        return Ok(TenantResolution::ZeroTenantBootstrap);
    }

    let Some(key) = key else {
        return Ok(TenantResolution::Unresolved);
    };

    match directory.find_by_routing_key(&key).await? {
        Some(tenant) if tenant.status == TenantStatus::Active => {
            Ok(TenantResolution::Active(tenant))
        }
        Some(tenant) => Ok(TenantResolution::Unavailable(tenant)),
        None => {
            tracing::debug!(routing_key = %key, "No tenant matched routing key");
            Ok(TenantResolution::Unresolved)
        }
    }
}

fn directory_unavailable(detail: String) -> Response {
    problem::service_unavailable(detail)
        .with_type("urn:menara:tenant-directory-unavailable")
        .into_response()
}

/// The resolver middleware. Installed at `MiddlewarePriority::TENANT_RESOLUTION`.
pub async fn resolve_tenant(
    State(state): State<TenantResolverState>,
    mut req: Request,
    next: Next,
) -> Response {
    // Tenant-exempt routes (bootstrap root, health) never consult the
    // directory; they still get a context so extractors behave uniformly.
    if state.routes.tenant_policy(req.method(), req.uri().path()) == TenantPolicy::Exempt {
        req.extensions_mut()
            .insert(RequestTenantContext::new(TenantResolution::Unresolved));
        return next.run(req).await;
    }

    let directory = match state.hub.get::<dyn TenantDirectoryClient>() {
        Ok(directory) => directory,
        Err(e) => {
            tracing::error!(error = %e, "No tenant directory client registered");
            return directory_unavailable("tenant directory is not available".to_owned());
        }
    };

    // Derived before awaiting so the non-`Send` `&Request` borrow never spans
    // an `.await`; extraction is pure, so behavior is unchanged.
    let key = extract_routing_key(&state.config.strategy, &req);
    let resolution = match resolve(&directory, key).await {
        Ok(resolution) => resolution,
        Err(e) => {
            tracing::warn!(error = %e, "Tenant directory lookup failed");
            return directory_unavailable(e.to_string());
        }
    };

    match resolution {
        TenantResolution::ZeroTenantBootstrap => {
            tracing::debug!(path = %req.uri().path(), "Zero tenants: steering to setup flow");
            Redirect::to(&state.config.setup_path).into_response()
        }
        TenantResolution::Unavailable(tenant) => {
            tracing::warn!(tenant = %tenant.id, status = ?tenant.status, "Tenant is not active");
            problem::forbidden(format!("tenant '{}' is not available", tenant.routing_key))
                .with_type("urn:menara:tenant-unavailable")
                .into_response()
        }
        resolution => {
            req.extensions_mut()
                .insert(RequestTenantContext::new(resolution));
            next.run(req).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(uri: &str, headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn host_strategy_strips_port() {
        let req = request("/", &[("host", "acme.test:8087")]);
        assert_eq!(
            extract_routing_key(&RoutingKeyStrategy::Host, &req),
            Some("acme.test".to_owned())
        );
    }

    #[test]
    fn host_strategy_without_host_header() {
        let req = request("/", &[]);
        assert_eq!(extract_routing_key(&RoutingKeyStrategy::Host, &req), None);
    }

    #[test]
    fn subdomain_strategy_takes_label_under_base() {
        let strategy = RoutingKeyStrategy::Subdomain {
            base_domain: "example.com".to_owned(),
        };
        let cases = [
            ("acme.example.com", Some("acme")),
            ("staging.acme.example.com", Some("acme")),
            ("example.com", None),
            ("acme.other.org", None),
        ];
        for (host, expected) in cases {
            let req = request("/", &[("host", host)]);
            assert_eq!(
                extract_routing_key(&strategy, &req),
                expected.map(str::to_owned),
                "host {host}"
            );
        }
    }

    #[test]
    fn path_prefix_strategy_takes_first_segment() {
        let req = request("/acme/dashboard", &[]);
        assert_eq!(
            extract_routing_key(&RoutingKeyStrategy::PathPrefix, &req),
            Some("acme".to_owned())
        );

        let root = request("/", &[]);
        assert_eq!(extract_routing_key(&RoutingKeyStrategy::PathPrefix, &root), None);
    }

    #[test]
    fn header_strategy_reads_configured_header() {
        let strategy = RoutingKeyStrategy::Header {
            name: "x-tenant".to_owned(),
        };
        let req = request("/", &[("x-tenant", "acme")]);
        assert_eq!(extract_routing_key(&strategy, &req), Some("acme".to_owned()));

        let missing = request("/", &[]);
        assert_eq!(extract_routing_key(&strategy, &missing), None);

        let empty = request("/", &[("x-tenant", "  ")]);
        assert_eq!(extract_routing_key(&strategy, &empty), None);
    }

    #[test]
    fn bracketed_ipv6_host_keeps_literal() {
        assert_eq!(strip_port("[::1]:8087"), "::1");
        assert_eq!(strip_port("10.0.0.1:80"), "10.0.0.1");
        assert_eq!(strip_port("acme.test"), "acme.test");
    }
}

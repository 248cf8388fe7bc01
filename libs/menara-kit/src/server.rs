//! The shared route/middleware table.
//!
//! [`HttpServer`] is the single-writer-then-frozen structure the module
//! loader mutates at startup: modules register routes and middleware while
//! loading, then the REST host calls [`HttpServer::freeze`] exactly once to
//! convert the table into an immutable axum [`Router`]. Nothing writes to
//! the table after the freeze, so request dispatch needs no locking.
//!
//! Middleware is an explicit ordered sequence: every layer is recorded with
//! a numeric [`MiddlewarePriority`] and applied at freeze time, lowest
//! priority outermost. Tenant resolution is pinned to priority 0 so it runs
//! before any module-contributed layer or handler.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::routing::MethodRouter;
use http::Method;

/// Whether a route requires a resolved tenant.
///
/// This is the declarative per-route answer to "which routes bypass tenant
/// resolution": bootstrap routes (root redirect, health) are `Exempt`,
/// everything else defaults to `Required`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TenantPolicy {
    #[default]
    Required,
    Exempt,
}

/// Per-route registration policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutePolicy {
    pub tenant: TenantPolicy,
}

impl RoutePolicy {
    #[must_use]
    pub fn tenant_exempt() -> Self {
        Self {
            tenant: TenantPolicy::Exempt,
        }
    }
}

/// Position of a middleware layer in the chain. Lower runs earlier
/// (outermost). Equal priorities keep registration order, earlier outermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MiddlewarePriority(pub u16);

impl MiddlewarePriority {
    /// Tenant resolution always runs first.
    pub const TENANT_RESOLUTION: Self = Self(0);
    /// Default band for module-contributed middleware.
    pub const MODULE: Self = Self(100);
}

/// Frozen lookup table of route policies, shared with the tenant resolver.
#[derive(Debug, Default)]
pub struct RouteTable {
    policies: HashMap<(Method, String), TenantPolicy>,
}

impl RouteTable {
    /// Policy for a registered route; unknown paths default to `Required`.
    #[must_use]
    pub fn tenant_policy(&self, method: &Method, path: &str) -> TenantPolicy {
        self.policies
            .get(&(method.clone(), path.to_owned()))
            .copied()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("duplicate route registration: {method} {path}")]
    DuplicateRoute { method: Method, path: String },
}

/// A middleware layer, deferred until freeze so it can see the final route
/// table.
pub type MiddlewareFn = Box<dyn FnOnce(Router, Arc<RouteTable>) -> Router + Send>;

struct RouteSpec {
    method: Method,
    path: String,
    handler: MethodRouter,
    policy: RoutePolicy,
}

/// Mutable route/middleware table, owned by the module loader during
/// startup.
#[derive(Default)]
pub struct HttpServer {
    routes: Vec<RouteSpec>,
    middleware: Vec<(MiddlewarePriority, usize, MiddlewareFn)>,
}

impl HttpServer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one route.
    ///
    /// # Errors
    /// Returns [`ServerError::DuplicateRoute`] when the same (method, path)
    /// pair was already registered, by any module.
    pub fn register_route(
        &mut self,
        method: Method,
        path: &str,
        handler: MethodRouter,
        policy: RoutePolicy,
    ) -> Result<(), ServerError> {
        let duplicate = self
            .routes
            .iter()
            .any(|r| r.method == method && r.path == path);
        if duplicate {
            tracing::error!(method = %method, path = %path, "Duplicate route registration");
            return Err(ServerError::DuplicateRoute {
                method,
                path: path.to_owned(),
            });
        }

        tracing::debug!(method = %method, path = %path, tenant = ?policy.tenant, "Registered route");
        self.routes.push(RouteSpec {
            method,
            path: path.to_owned(),
            handler,
            policy,
        });
        Ok(())
    }

    /// Record a middleware layer at the given priority. Layers are applied
    /// at freeze time only.
    pub fn register_middleware(&mut self, priority: MiddlewarePriority, layer: MiddlewareFn) {
        let seq = self.middleware.len();
        tracing::debug!(priority = priority.0, seq, "Registered middleware");
        self.middleware.push((priority, seq, layer));
    }

    #[must_use]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// Convert the table into an immutable dispatch structure.
    ///
    /// Routes are installed first, then middleware in priority order: the
    /// layers are applied innermost-first, so the lowest priority ends up
    /// outermost and observes the request before everything else.
    #[must_use]
    pub fn freeze(self) -> (Router, Arc<RouteTable>) {
        let mut policies = HashMap::with_capacity(self.routes.len());
        let mut router = Router::new();
        for route in self.routes {
            policies.insert((route.method, route.path.clone()), route.policy.tenant);
            router = router.route(&route.path, route.handler);
        }
        let table = Arc::new(RouteTable { policies });

        let mut layers = self.middleware;
        layers.sort_by_key(|(priority, seq, _)| (*priority, *seq));
        for (_, _, layer) in layers.into_iter().rev() {
            router = layer(router, Arc::clone(&table));
        }

        (router, table)
    }
}

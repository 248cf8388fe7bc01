//! Tenant Resolver Module
//!
//! Runs ahead of every business handler: derives a routing key from the
//! request, asks the `TenantDirectoryClient` registered in the hub which
//! tenant it belongs to, and attaches the outcome to the request's
//! lifetime. Deployments with zero tenants are steered to the setup flow
//! regardless of routing key.
//!
//! The directory client is looked up lazily per request, so the module
//! providing it may load after this one.

pub mod config;
pub mod module;
pub mod resolver;

pub use config::{RoutingKeyStrategy, TenancyConfig};
pub use module::TenancyModule;
pub use resolver::{RequestTenantContext, ResolvedTenant, TenantResolution, TenantResolverState};

//! Static Tenant Directory Plugin
//!
//! Serves the tenant set from configuration. Useful for development and
//! simple single-box deployments; production installs swap in a module
//! backed by a real tenant store.
//!
//! ## Configuration
//!
//! ```yaml
//! modules:
//!   static_tenants:
//!     config:
//!       tenants:
//!         - id: "550e8400-e29b-41d4-a716-446655440001"
//!           name: "Acme Inc"
//!           routing_key: "acme"
//!           status: active
//!         - id: "550e8400-e29b-41d4-a716-446655440002"
//!           name: "Beta LLC"
//!           routing_key: "beta"
//!           status: disabled
//! ```
//!
//! An empty (or absent) tenant list is valid: the resolver then steers
//! every request into the setup flow.

pub mod config;
pub mod domain;
pub mod module;

pub use module::StaticTenantsModule;

//! Tenant directory capability.
//!
//! The directory itself is external to the bootstrap core: some module
//! (static config, a database-backed directory, a remote service) registers
//! a [`TenantDirectoryClient`] in the `ClientHub`, and the tenant resolver
//! consumes it. This crate only defines the shared contract and models.

pub mod api;
pub mod error;
pub mod models;

pub use api::TenantDirectoryClient;
pub use error::TenantDirectoryError;
pub use models::{Tenant, TenantId, TenantStatus};

//! Public directory trait consumed by the tenant resolver.

use async_trait::async_trait;

use crate::error::TenantDirectoryError;
use crate::models::Tenant;

/// Point-lookup view over the set of known tenants.
///
/// Registered in the `ClientHub` by whichever module owns tenant data. The
/// bootstrap core never mutates tenant records; it only asks "does any
/// tenant exist" and "which tenant matches this request".
#[async_trait]
pub trait TenantDirectoryClient: Send + Sync {
    /// All known tenants, regardless of status.
    ///
    /// # Errors
    /// Returns [`TenantDirectoryError::Unavailable`] when the backing store
    /// cannot be reached. Callers must never treat that as an empty set.
    async fn list_all(&self) -> Result<Vec<Tenant>, TenantDirectoryError>;

    /// The tenant whose `routing_key` equals `key`, if any.
    ///
    /// # Errors
    /// Returns [`TenantDirectoryError::Unavailable`] when the backing store
    /// cannot be reached.
    async fn find_by_routing_key(&self, key: &str)
    -> Result<Option<Tenant>, TenantDirectoryError>;
}

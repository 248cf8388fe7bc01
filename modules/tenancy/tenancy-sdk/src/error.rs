//! Error types for the tenant directory capability.

use thiserror::Error;

/// Errors surfaced by a [`crate::TenantDirectoryClient`] implementation.
#[derive(Debug, Error)]
pub enum TenantDirectoryError {
    /// The backing store is unreachable or timed out.
    ///
    /// Distinguishable on purpose: an outage must never be mistaken for
    /// "zero tenants exist".
    #[error("tenant directory unavailable: {0}")]
    Unavailable(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::client_hub::ClientHub;
use crate::config::{ConfigError, ConfigProvider, module_config_or_default, module_config_required};

/// Module execution context, passed to every lifecycle method.
///
/// Gives a module typed access to its own config section, the shared
/// [`ClientHub`] for registering/consuming capabilities, and a child
/// cancellation token for graceful shutdown.
#[derive(Clone)]
pub struct ModuleCtx {
    module_name: Arc<str>,
    config_provider: Arc<dyn ConfigProvider>,
    client_hub: Arc<ClientHub>,
    cancellation_token: CancellationToken,
}

impl ModuleCtx {
    pub fn new(
        module_name: impl Into<Arc<str>>,
        config_provider: Arc<dyn ConfigProvider>,
        client_hub: Arc<ClientHub>,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            module_name: module_name.into(),
            config_provider,
            client_hub,
            cancellation_token,
        }
    }

    #[inline]
    #[must_use]
    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    #[inline]
    #[must_use]
    pub fn client_hub(&self) -> Arc<ClientHub> {
        Arc::clone(&self.client_hub)
    }

    #[inline]
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation_token.clone()
    }

    /// Load this module's config section, falling back to `T::default()`
    /// when the section is absent.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidConfig`] when a present section does
    /// not deserialize.
    pub fn config<T: DeserializeOwned + Default>(&self) -> Result<T, ConfigError> {
        module_config_or_default(&*self.config_provider, &self.module_name)
    }

    /// Load this module's config section, requiring it to be present.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] when the section is missing or invalid.
    pub fn config_required<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        module_config_required(&*self.config_provider, &self.module_name)
    }
}

/// Factory for per-module contexts, created once by the runtime.
pub struct ModuleContextBuilder {
    config_provider: Arc<dyn ConfigProvider>,
    client_hub: Arc<ClientHub>,
    root_token: CancellationToken,
}

impl ModuleContextBuilder {
    pub fn new(
        config_provider: Arc<dyn ConfigProvider>,
        client_hub: Arc<ClientHub>,
        root_token: CancellationToken,
    ) -> Self {
        Self {
            config_provider,
            client_hub,
            root_token,
        }
    }

    /// Resolve a module-scoped context. The cancellation token is a child of
    /// the root token, so the runtime can stop everything at once.
    #[must_use]
    pub fn for_module(&self, module_name: &str) -> ModuleCtx {
        ModuleCtx::new(
            Arc::<str>::from(module_name),
            Arc::clone(&self.config_provider),
            Arc::clone(&self.client_hub),
            self.root_token.child_token(),
        )
    }
}

//! Module loader: materializes the ordered registry against the shared
//! server table and records what happened.
//!
//! Loading is strictly sequential in topological order. Each module is one
//! step — `init`, then middleware, then routes — so a failure leaves no
//! later module half-wired: the failed module is recorded, every module
//! after it is recorded as skipped without being touched, and the whole
//! startup aborts. Modules that already loaded are not rolled back; the
//! process owner sees the abort, not a degraded server.

use parking_lot::Mutex;
use serde::Serialize;

use crate::context::{ModuleContextBuilder, ModuleCtx};
use crate::registry::{ModuleEntry, ModuleRegistry};
use crate::server::HttpServer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Loaded,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleManifestEntry {
    pub name: &'static str,
    pub status: ModuleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModuleManifestEntry {
    fn loaded(name: &'static str) -> Self {
        Self {
            name,
            status: ModuleStatus::Loaded,
            error: None,
        }
    }

    fn failed(name: &'static str, error: &anyhow::Error) -> Self {
        Self {
            name,
            status: ModuleStatus::Failed,
            error: Some(format!("{error:#}")),
        }
    }

    fn skipped(name: &'static str) -> Self {
        Self {
            name,
            status: ModuleStatus::Skipped,
            error: None,
        }
    }
}

/// Startup record: one entry per discovered module, in load order,
/// populated exactly once.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ModuleManifest {
    entries: Vec<ModuleManifestEntry>,
}

impl ModuleManifest {
    #[must_use]
    pub fn entries(&self) -> &[ModuleManifestEntry] {
        &self.entries
    }

    /// True when any module did not end up `loaded`.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.status != ModuleStatus::Loaded)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("modules contribute routes but no rest host module is registered")]
    RestRequiresHost,

    #[error("multiple rest host modules registered")]
    MultipleRestHosts,

    #[error("rest host '{module}' failed to prepare: {source}")]
    RestPrepare {
        module: &'static str,
        source: anyhow::Error,
    },

    #[error("module '{module}' failed to load: {source}")]
    Module {
        module: &'static str,
        source: anyhow::Error,
    },

    #[error("rest host '{module}' failed to finalize: {source}")]
    RestFinalize {
        module: &'static str,
        source: anyhow::Error,
    },
}

/// Drives module loading and keeps the manifest for observability.
#[derive(Default)]
pub struct ModuleLoader {
    manifest: Mutex<Option<ModuleManifest>>,
}

impl ModuleLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded startup outcome (empty if `load` has not run).
    #[must_use]
    pub fn manifest(&self) -> ModuleManifest {
        self.manifest.lock().clone().unwrap_or_default()
    }

    fn record(&self, manifest: ModuleManifest) {
        *self.manifest.lock() = Some(manifest);
    }

    /// Materialize all modules against the server table.
    ///
    /// Phases: host `rest_prepare` (bootstrap routes) → per module in
    /// topological order: `init` + middleware + routes → host
    /// `rest_finalize` (freeze). Fail-fast throughout; the manifest is
    /// recorded whether loading succeeded or not.
    ///
    /// # Errors
    /// Returns a [`LoadError`] on the first failure; the caller must treat
    /// this as a startup abort.
    pub async fn load(
        &self,
        mut server: HttpServer,
        registry: &ModuleRegistry,
        ctx_builder: &ModuleContextBuilder,
    ) -> Result<(), LoadError> {
        let modules = registry.modules();
        let host_count = modules.iter().filter(|e| e.rest_host.is_some()).count();
        let host = match host_count {
            0 => {
                if modules.iter().any(|e| e.rest.is_some()) {
                    return Err(LoadError::RestRequiresHost);
                }
                None
            }
            1 => modules.iter().find(|e| e.rest_host.is_some()),
            _ => return Err(LoadError::MultipleRestHosts),
        };

        if let Some(host_entry) = host {
            if let Some(host_mod) = &host_entry.rest_host {
                let host_ctx = ctx_builder.for_module(host_entry.name);
                if let Err(source) = host_mod.rest_prepare(&host_ctx, &mut server) {
                    self.record(ModuleManifest {
                        entries: modules
                            .iter()
                            .map(|e| {
                                if e.name == host_entry.name {
                                    ModuleManifestEntry::failed(e.name, &source)
                                } else {
                                    ModuleManifestEntry::skipped(e.name)
                                }
                            })
                            .collect(),
                    });
                    return Err(LoadError::RestPrepare {
                        module: host_entry.name,
                        source,
                    });
                }
            }
        }

        let mut entries = Vec::with_capacity(modules.len());
        let mut failure: Option<LoadError> = None;

        for entry in modules {
            if failure.is_some() {
                tracing::warn!(module = entry.name, "Skipping module after earlier failure");
                entries.push(ModuleManifestEntry::skipped(entry.name));
                continue;
            }

            let ctx = ctx_builder.for_module(entry.name);
            match Self::load_one(entry, &ctx, &mut server).await {
                Ok(()) => {
                    tracing::info!(module = entry.name, "Loaded module");
                    entries.push(ModuleManifestEntry::loaded(entry.name));
                }
                Err(source) => {
                    tracing::error!(module = entry.name, error = %source, "Module failed to load");
                    entries.push(ModuleManifestEntry::failed(entry.name, &source));
                    failure = Some(LoadError::Module {
                        module: entry.name,
                        source,
                    });
                }
            }
        }

        if let Some(err) = failure {
            self.record(ModuleManifest { entries });
            return Err(err);
        }

        if let Some(host_entry) = host {
            if let Some(host_mod) = &host_entry.rest_host {
                let host_ctx = ctx_builder.for_module(host_entry.name);
                if let Err(source) = host_mod.rest_finalize(&host_ctx, server) {
                    for e in &mut entries {
                        if e.name == host_entry.name {
                            *e = ModuleManifestEntry::failed(e.name, &source);
                        }
                    }
                    self.record(ModuleManifest { entries });
                    return Err(LoadError::RestFinalize {
                        module: host_entry.name,
                        source,
                    });
                }
            }
        }

        self.record(ModuleManifest { entries });
        Ok(())
    }

    async fn load_one(
        entry: &ModuleEntry,
        ctx: &ModuleCtx,
        server: &mut HttpServer,
    ) -> anyhow::Result<()> {
        entry.core.init(ctx).await?;
        if let Some(mw) = &entry.middleware {
            mw.register_middleware(ctx, server)?;
        }
        if let Some(rest) = &entry.rest {
            rest.register_rest(ctx, server)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_serializes_as_plain_list() {
        let manifest = ModuleManifest {
            entries: vec![
                ModuleManifestEntry::loaded("a"),
                ModuleManifestEntry::failed("b", &anyhow::anyhow!("boom")),
                ModuleManifestEntry::skipped("c"),
            ],
        };
        let json = serde_json::to_value(&manifest).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "name": "a", "status": "loaded" },
                { "name": "b", "status": "failed", "error": "boom" },
                { "name": "c", "status": "skipped" },
            ])
        );
    }

    #[test]
    fn degraded_when_any_module_is_not_loaded() {
        let ok = ModuleManifest {
            entries: vec![ModuleManifestEntry::loaded("a")],
        };
        assert!(!ok.is_degraded());

        let bad = ModuleManifest {
            entries: vec![
                ModuleManifestEntry::loaded("a"),
                ModuleManifestEntry::skipped("b"),
            ],
        };
        assert!(bad.is_degraded());
    }

    #[test]
    fn empty_manifest_before_load() {
        let loader = ModuleLoader::new();
        assert!(loader.manifest().entries().is_empty());
    }
}

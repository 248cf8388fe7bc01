//! Module registry: discovery, validation and deterministic ordering.
//!
//! Modules are declared statically: each module crate submits a
//! [`ModuleRegistration`] via `inventory::submit!` and the app binary links
//! the crate (see the server's `registered_modules.rs`). There is no runtime
//! scanning — discovery is a walk over the link-time collection, made
//! deterministic by sorting registrations by name before indices are
//! assigned.
//!
//! Ordering is a topological sort over declared dependencies. Ties between
//! modules with no remaining mutual dependency break on discovery index, so
//! the load order is reproducible run to run. Any validation failure here is
//! startup-fatal: nothing gets registered into a server from a registry that
//! did not build.

use std::collections::HashMap;
use std::sync::Arc;

use crate::contracts::{MiddlewareModule, Module, RestHostModule, RestfulModule, StatefulModule};

/// Static metadata for one module, fixed at discovery time.
#[derive(Debug, Clone, Copy)]
pub struct ModuleDescriptor {
    pub name: &'static str,
    pub deps: &'static [&'static str],
}

/// Link-time registration record.
///
/// The `register` callback receives the builder and makes explicit
/// `register_*_with_meta` calls for the module's capabilities.
pub struct ModuleRegistration {
    pub name: &'static str,
    pub register: fn(&mut RegistryBuilder),
}

inventory::collect!(ModuleRegistration);

/// One discovered module with its capability slots.
pub struct ModuleEntry {
    pub name: &'static str,
    pub deps: &'static [&'static str],
    pub discovery_index: usize,
    pub core: Arc<dyn Module>,
    pub rest: Option<Arc<dyn RestfulModule>>,
    pub middleware: Option<Arc<dyn MiddlewareModule>>,
    pub rest_host: Option<Arc<dyn RestHostModule>>,
    pub stateful: Option<Arc<dyn StatefulModule>>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("module at discovery position {index} has an empty name")]
    EmptyModuleName { index: usize },

    #[error("duplicate module name '{module}'")]
    DuplicateModuleName { module: &'static str },

    #[error("module '{module}' declares unknown dependency '{dependency}'")]
    UnknownDependency {
        module: &'static str,
        dependency: &'static str,
    },

    #[error("dependency cycle among modules: {cycle}")]
    DependencyCycle { cycle: String },

    #[error("capability registered for unknown module '{module}'")]
    UnknownModule { module: &'static str },
}

/// Collects explicit module registrations before validation.
///
/// All errors are deferred to [`RegistryBuilder::build_topo_sorted`] so a
/// registration callback stays infallible.
#[derive(Default)]
pub struct RegistryBuilder {
    cores: Vec<(ModuleDescriptor, Arc<dyn Module>)>,
    rests: Vec<(&'static str, Arc<dyn RestfulModule>)>,
    middlewares: Vec<(&'static str, Arc<dyn MiddlewareModule>)>,
    rest_hosts: Vec<(&'static str, Arc<dyn RestHostModule>)>,
    statefuls: Vec<(&'static str, Arc<dyn StatefulModule>)>,
}

impl RegistryBuilder {
    pub fn register_core_with_meta(
        &mut self,
        name: &'static str,
        deps: &'static [&'static str],
        core: Arc<dyn Module>,
    ) {
        self.cores.push((ModuleDescriptor { name, deps }, core));
    }

    pub fn register_rest_with_meta(&mut self, name: &'static str, rest: Arc<dyn RestfulModule>) {
        self.rests.push((name, rest));
    }

    pub fn register_middleware_with_meta(
        &mut self,
        name: &'static str,
        middleware: Arc<dyn MiddlewareModule>,
    ) {
        self.middlewares.push((name, middleware));
    }

    pub fn register_rest_host_with_meta(
        &mut self,
        name: &'static str,
        host: Arc<dyn RestHostModule>,
    ) {
        self.rest_hosts.push((name, host));
    }

    pub fn register_stateful_with_meta(
        &mut self,
        name: &'static str,
        stateful: Arc<dyn StatefulModule>,
    ) {
        self.statefuls.push((name, stateful));
    }

    /// Validate everything registered so far and produce the ordered
    /// registry.
    ///
    /// # Errors
    /// Returns a [`RegistryError`] for empty or duplicate names, capability
    /// registrations without a core, unknown dependencies, or a dependency
    /// cycle. All of these abort startup.
    pub fn build_topo_sorted(self) -> Result<ModuleRegistry, RegistryError> {
        let mut entries: Vec<ModuleEntry> = Vec::with_capacity(self.cores.len());
        let mut index: HashMap<&'static str, usize> = HashMap::with_capacity(self.cores.len());

        for (i, (desc, core)) in self.cores.into_iter().enumerate() {
            if desc.name.is_empty() {
                return Err(RegistryError::EmptyModuleName { index: i });
            }
            if index.insert(desc.name, i).is_some() {
                return Err(RegistryError::DuplicateModuleName { module: desc.name });
            }
            entries.push(ModuleEntry {
                name: desc.name,
                deps: desc.deps,
                discovery_index: i,
                core,
                rest: None,
                middleware: None,
                rest_host: None,
                stateful: None,
            });
        }

        for (name, rest) in self.rests {
            let i = *index
                .get(name)
                .ok_or(RegistryError::UnknownModule { module: name })?;
            entries[i].rest = Some(rest);
        }
        for (name, mw) in self.middlewares {
            let i = *index
                .get(name)
                .ok_or(RegistryError::UnknownModule { module: name })?;
            entries[i].middleware = Some(mw);
        }
        for (name, host) in self.rest_hosts {
            let i = *index
                .get(name)
                .ok_or(RegistryError::UnknownModule { module: name })?;
            entries[i].rest_host = Some(host);
        }
        for (name, stateful) in self.statefuls {
            let i = *index
                .get(name)
                .ok_or(RegistryError::UnknownModule { module: name })?;
            entries[i].stateful = Some(stateful);
        }

        let order = topo_order(&entries, &index)?;
        let mut slots: Vec<Option<ModuleEntry>> = entries.into_iter().map(Some).collect();
        let modules = order
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect::<Vec<_>>();

        tracing::debug!(
            order = ?modules.iter().map(|m| m.name).collect::<Vec<_>>(),
            "Module load order resolved"
        );

        Ok(ModuleRegistry { modules })
    }
}

/// Kahn's algorithm with a stable tie-break on discovery index.
fn topo_order(
    entries: &[ModuleEntry],
    index: &HashMap<&'static str, usize>,
) -> Result<Vec<usize>, RegistryError> {
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;

    let n = entries.len();
    let mut indegree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

    for (i, entry) in entries.iter().enumerate() {
        for &dep in entry.deps {
            let Some(&d) = index.get(dep) else {
                return Err(RegistryError::UnknownDependency {
                    module: entry.name,
                    dependency: dep,
                });
            };
            indegree[i] += 1;
            dependents[d].push(i);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = indegree
        .iter()
        .enumerate()
        .filter(|&(_, &deg)| deg == 0)
        .map(|(i, _)| Reverse(i))
        .collect();

    let mut order = Vec::with_capacity(n);
    while let Some(Reverse(i)) = ready.pop() {
        order.push(i);
        for &dependent in &dependents[i] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    if order.len() != n {
        let stuck = entries
            .iter()
            .enumerate()
            .filter(|&(i, _)| indegree[i] > 0)
            .map(|(_, e)| e.name)
            .collect::<Vec<_>>()
            .join(" -> ");
        return Err(RegistryError::DependencyCycle { cycle: stuck });
    }

    Ok(order)
}

/// Validated, dependency-ordered module set.
pub struct ModuleRegistry {
    modules: Vec<ModuleEntry>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.modules.iter().map(|m| m.name))
            .finish()
    }
}

impl ModuleRegistry {
    /// Modules in load order (every module after all of its dependencies).
    #[must_use]
    pub fn modules(&self) -> &[ModuleEntry] {
        &self.modules
    }

    /// Collect all link-time [`ModuleRegistration`]s and build the registry.
    ///
    /// Registrations are sorted by name before discovery indices are
    /// assigned, so load order does not depend on link order.
    ///
    /// # Errors
    /// Propagates any [`RegistryError`] from validation or ordering.
    pub fn discover_and_build() -> Result<Self, RegistryError> {
        let mut regs: Vec<&ModuleRegistration> =
            inventory::iter::<ModuleRegistration>.into_iter().collect();
        regs.sort_by_key(|r| r.name);

        tracing::info!(
            discovered = regs.len(),
            modules = ?regs.iter().map(|r| r.name).collect::<Vec<_>>(),
            "Discovered modules"
        );

        let mut builder = RegistryBuilder::default();
        for reg in regs {
            (reg.register)(&mut builder);
        }
        builder.build_topo_sorted()
    }
}

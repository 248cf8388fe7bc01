//! Menara module kit.
//!
//! The kit is the bootstrap core of a Menara server: modules declare
//! themselves with explicit [`registry::ModuleRegistration`] submissions,
//! the [`registry::ModuleRegistry`] validates and topologically orders them,
//! and the [`loader::ModuleLoader`] wires their middleware and routes into a
//! single [`server::HttpServer`] before the process starts accepting
//! traffic. Cross-module capabilities travel through the [`ClientHub`].

pub mod bootstrap;
pub mod client_hub;
pub mod config;
pub mod context;
pub mod contracts;
pub mod loader;
pub mod problem;
pub mod registry;
pub mod runtime;
pub mod server;

pub use client_hub::ClientHub;
pub use config::ConfigProvider;
pub use context::{ModuleContextBuilder, ModuleCtx};
pub use contracts::{MiddlewareModule, Module, RestHostModule, RestfulModule, StatefulModule};
pub use loader::{LoadError, ModuleLoader, ModuleManifest, ModuleManifestEntry, ModuleStatus};
pub use registry::{ModuleRegistration, ModuleRegistry, RegistryBuilder, RegistryError};
pub use server::{HttpServer, MiddlewarePriority, RoutePolicy, RouteTable, TenantPolicy};

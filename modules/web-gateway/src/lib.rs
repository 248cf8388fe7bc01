//! Web Gateway Module
//!
//! The single REST host of a Menara process: contributes the bootstrap
//! routes (root redirect and health check, both tenant-exempt), freezes the
//! shared route table after every module loaded, wraps it with request-id
//! and trace layers, and serves it until cancellation.

pub mod config;
pub mod module;
pub mod web;

pub use config::GatewayConfig;
pub use module::GatewayModule;

//! Host bootstrap: layered app configuration and logging.

pub mod config;
pub mod logging;

pub use config::{AppConfig, AppConfigProvider, CliArgs, LoggingConfig};
pub use logging::init_logging;

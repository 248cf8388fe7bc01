//! Layered application configuration.
//!
//! Precedence, lowest to highest: built-in defaults → YAML file (if given)
//! → `MENARA__`-prefixed environment variables → CLI overrides. Module
//! sections live under `modules.<name>` and reach modules through
//! [`AppConfigProvider`].

use std::collections::HashMap;
use std::path::Path;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};

use crate::config::ConfigProvider;

pub const ENV_PREFIX: &str = "MENARA__";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default tracing filter, overridable with `RUST_LOG`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    /// Raw per-module sections: `modules.<name> = { config: {...} }`.
    pub modules: HashMap<String, serde_json::Value>,
}

/// CLI arguments that flow into the config merge.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub config: Option<String>,
    pub print_config: bool,
    pub verbose: u8,
    pub port: Option<u16>,
}

impl AppConfig {
    /// Load layered configuration.
    ///
    /// # Errors
    /// Returns an error when the file or environment layers fail to parse
    /// or the merged result does not deserialize.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Fold CLI flags into the loaded configuration.
    ///
    /// Verbosity wins over the configured log level (`-v` info, `-vv`
    /// debug, `-vvv` trace). A port override rewrites the gateway bind
    /// address, keeping its host part.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        match args.verbose {
            0 => {}
            1 => self.logging.level = "info".to_owned(),
            2 => self.logging.level = "debug".to_owned(),
            _ => self.logging.level = "trace".to_owned(),
        }

        if let Some(port) = args.port {
            self.override_gateway_port(port);
        }
    }

    fn override_gateway_port(&mut self, port: u16) {
        let module = self
            .modules
            .entry("web_gateway".to_owned())
            .or_insert_with(|| serde_json::json!({}));
        let Some(obj) = module.as_object_mut() else {
            return;
        };
        let section = obj
            .entry("config".to_owned())
            .or_insert_with(|| serde_json::json!({}));
        let Some(section) = section.as_object_mut() else {
            return;
        };

        let host = section
            .get("bind_addr")
            .and_then(|v| v.as_str())
            .and_then(|s| s.rsplit_once(':'))
            .map_or_else(|| "127.0.0.1".to_owned(), |(host, _)| host.to_owned());
        section.insert(
            "bind_addr".to_owned(),
            serde_json::Value::String(format!("{host}:{port}")),
        );
    }

    /// Effective configuration as pretty JSON (for `--print-config`).
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// [`ConfigProvider`] over a loaded [`AppConfig`].
pub struct AppConfigProvider {
    config: AppConfig,
}

impl AppConfigProvider {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }
}

impl ConfigProvider for AppConfigProvider {
    fn get_module_config(&self, module_name: &str) -> Option<&serde_json::Value> {
        self.config.modules.get(module_name)
    }
}

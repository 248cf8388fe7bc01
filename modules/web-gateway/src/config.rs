//! Web gateway configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Listen address of the HTTP server.
    pub bind_addr: String,

    /// Redirect target of `GET /` while no tenant exists.
    pub setup_path: String,

    /// Redirect target of `GET /` once tenants exist.
    pub login_path: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8087".to_owned(),
            setup_path: "/setup".to_owned(),
            login_path: "/login".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_local() {
        let cfg = GatewayConfig::default();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8087");
        assert_eq!(cfg.setup_path, "/setup");
        assert_eq!(cfg.login_path, "/login");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let result: Result<GatewayConfig, _> =
            serde_json::from_value(serde_json::json!({ "bind_adr": "1.2.3.4:1" }));
        assert!(result.is_err());
    }
}

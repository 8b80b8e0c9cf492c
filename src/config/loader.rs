use crate::config::{CategoryCodes, LockingConfig, ServerConfig, StoreIdentity};
use crate::error::{Error, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub locking: LockingConfig,
    #[serde(default)]
    pub store_identity: StoreIdentity,
    #[serde(default)]
    pub category_codes: CategoryCodes,
}

impl AppConfig {
    /// Layered load: packaged defaults, then the per-environment file,
    /// then `DEALERINFRA_*` variables. Every section falls back to its
    /// `Default` so a bare checkout still boots.
    pub fn load(env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("DEALERINFRA").separator("__"))
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        config.try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let config = AppConfig::default();
        assert_eq!(config.locking.wait_ms, 250);
        assert_eq!(config.category_codes.sale_revenue, "1.01");
        assert_eq!(config.category_codes.vehicle_acquisition, "2.01");
        assert_eq!(config.category_codes.maintenance, "3.01");
        assert!(!config.store_identity.document.is_empty());
    }
}

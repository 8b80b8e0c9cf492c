use std::time::Duration;
use serde::{Deserialize, Serialize};

pub mod loader;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LockingConfig {
    /// Upper bound on any single row-lock wait, in milliseconds.
    /// Operations past this report contention instead of queueing.
    pub wait_ms: u64,
}

impl LockingConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }
}

impl Default for LockingConfig {
    fn default() -> Self {
        LockingConfig {
            wait_ms: crate::DEFAULT_LOCK_WAIT_MS,
        }
    }
}

/// Which party in the directory is the store itself. Resolved by tax
/// document at operation time, so ownership transfers never depend on
/// a magic row id.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StoreIdentity {
    pub document: String,
}

impl Default for StoreIdentity {
    fn default() -> Self {
        StoreIdentity {
            document: "00000000000191".to_string(),
        }
    }
}

/// Chart-of-accounts codes the engines post against. Deployments remap
/// these without touching code.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CategoryCodes {
    pub sale_revenue: String,
    pub vehicle_acquisition: String,
    pub maintenance: String,
}

impl Default for CategoryCodes {
    fn default() -> Self {
        CategoryCodes {
            sale_revenue: "1.01".to_string(),
            vehicle_acquisition: "2.01".to_string(),
            maintenance: "3.01".to_string(),
        }
    }
}

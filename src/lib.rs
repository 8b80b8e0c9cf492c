use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod financial;
pub mod inventory;
pub mod maintenance;
pub mod negotiation;
pub mod observability;
pub mod store;
pub mod types;

use crate::config::loader::AppConfig;
use crate::financial::settlement::SettlementEngine;
use crate::inventory::acquisition::AcquisitionEngine;
use crate::maintenance::completion::CompletionEngine;
use crate::negotiation::approval::ApprovalEngine;
use crate::negotiation::cancellation::CancellationEngine;
use crate::store::Store;

// Default bound on any single row-lock wait
pub const DEFAULT_LOCK_WAIT_MS: u64 = 250;

/// The five back-office engines wired over one shared store. Engines
/// are stateless besides their configuration, so one set serves every
/// request handler.
pub struct Engines {
    pub approval: ApprovalEngine,
    pub cancellation: CancellationEngine,
    pub settlement: SettlementEngine,
    pub completion: CompletionEngine,
    pub acquisition: AcquisitionEngine,
}

impl Engines {
    pub fn new(store: Arc<Store>, config: &AppConfig) -> Self {
        Engines {
            approval: ApprovalEngine::new(
                Arc::clone(&store),
                config.store_identity.clone(),
                config.category_codes.clone(),
            ),
            cancellation: CancellationEngine::new(
                Arc::clone(&store),
                config.store_identity.clone(),
            ),
            settlement: SettlementEngine::new(Arc::clone(&store)),
            completion: CompletionEngine::new(
                Arc::clone(&store),
                config.category_codes.clone(),
            ),
            acquisition: AcquisitionEngine::new(
                store,
                config.store_identity.clone(),
                config.category_codes.clone(),
            ),
        }
    }
}

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::chart::ChartCategory;

/// Looks up chart-of-accounts categories by their dotted code. Engines
/// resolve the code before touching any row, so a misconfigured chart
/// fails an operation without side effects.
#[derive(Clone)]
pub struct ChartResolver {
    store: Arc<Store>,
}

impl ChartResolver {
    pub fn new(store: Arc<Store>) -> Self {
        ChartResolver { store }
    }

    pub fn resolve(&self, code: &str) -> Result<ChartCategory> {
        self.store
            .category(code)
            .ok_or_else(|| Error::CategoryNotConfigured(code.to_string()))
    }
}

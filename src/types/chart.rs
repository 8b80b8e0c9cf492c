use serde::{Deserialize, Serialize};

use crate::types::ids::CategoryId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    Revenue,
    Expense,
}

/// One node of the chart of accounts. Codes are dotted and unique;
/// engines look categories up by code, never by hard-coded id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChartCategory {
    pub category_id: CategoryId,
    pub code: String,
    pub name: String,
    pub operation_type: OperationType,
    pub parent: Option<CategoryId>,
}

impl ChartCategory {
    pub fn new(
        code: &str,
        name: &str,
        operation_type: OperationType,
        parent: Option<CategoryId>,
    ) -> Self {
        ChartCategory {
            category_id: CategoryId::new(),
            code: code.to_string(),
            name: name.to_string(),
            operation_type,
            parent,
        }
    }
}

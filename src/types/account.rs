use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ids::{AccountId, ActorId, BranchId};
use crate::types::money::Money;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    Cash,
    Bank,
}

/// A financial account holding real funds. Settlement is the only
/// operation that moves its balance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FinancialAccount {
    pub account_id: AccountId,
    pub name: String,
    pub account_type: AccountType,
    pub balance: Money,
    pub branch: BranchId,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
}

impl FinancialAccount {
    pub fn new(
        name: &str,
        account_type: AccountType,
        opening_balance: Money,
        branch: BranchId,
        created_by: ActorId,
    ) -> Self {
        FinancialAccount {
            account_id: AccountId::new(),
            name: name.to_string(),
            account_type,
            balance: opening_balance,
            branch,
            created_by,
            created_at: Utc::now(),
        }
    }
}

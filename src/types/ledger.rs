use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ids::{
    AccountId, ActorId, BranchId, CategoryId, EntityId, LedgerId, NegotiationId, VehicleId,
};
use crate::types::money::Money;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Money the store owes an entity.
    Payable,
    /// Money an entity owes the store.
    Receivable,
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TransactionType::Payable => "payable",
            TransactionType::Receivable => "receivable",
        };
        write!(f, "{}", label)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerStatus {
    Open,
    Partial,
    Paid,
    Canceled,
}

impl fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LedgerStatus::Open => "open",
            LedgerStatus::Partial => "partial",
            LedgerStatus::Paid => "paid",
            LedgerStatus::Canceled => "canceled",
        };
        write!(f, "{}", label)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Boleto,
    CreditCard,
    Financing,
}

/// One recorded payment against a ledger entry. Numbered sequentially
/// within the entry, starting at 1.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Installment {
    pub number: u32,
    pub due_date: NaiveDate,
    pub pay_date: NaiveDate,
    pub value: Money,
    pub paid_value: Money,
    pub account: AccountId,
    pub method: PaymentMethod,
    pub created_by: ActorId,
}

/// An open obligation in the books: a payable or receivable, optionally
/// anchored to the vehicle and negotiation that produced it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ledger {
    pub ledger_id: LedgerId,
    pub entity: EntityId,
    pub category: CategoryId,
    pub vehicle: Option<VehicleId>,
    pub negotiation: Option<NegotiationId>,
    pub transaction_type: TransactionType,
    pub status: LedgerStatus,
    pub total_value: Money,
    pub due_date: NaiveDate,
    pub description: String,
    pub installments: Vec<Installment>,
    pub branch: BranchId,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
}

impl Ledger {
    pub fn total_paid(&self) -> Money {
        self.installments.iter().map(|i| i.paid_value).sum()
    }

    pub fn next_installment_number(&self) -> u32 {
        self.installments.len() as u32 + 1
    }
}

use chrono::Utc;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::observability::metrics::{
    LEDGERS_SETTLED, OPERATIONS_REJECTED, SETTLED_VOLUME_CENTS, SETTLEMENT_LATENCY,
};
use crate::observability::tracing::trace_settlement;
use crate::store::Store;
use crate::types::ids::{AccountId, ActorId, LedgerId};
use crate::types::ledger::{Installment, Ledger, LedgerStatus, PaymentMethod, TransactionType};
use crate::types::money::Money;

/// Applies payments to open ledger entries and moves the counterpart
/// funds on a financial account. Ledger and account change together
/// under their row locks or not at all.
pub struct SettlementEngine {
    store: Arc<Store>,
}

impl SettlementEngine {
    pub fn new(store: Arc<Store>) -> Self {
        SettlementEngine { store }
    }

    pub fn settle(
        &self,
        ledger_id: LedgerId,
        amount: Money,
        account_id: AccountId,
        method: PaymentMethod,
        actor: ActorId,
    ) -> Result<Ledger> {
        let _span = trace_settlement(&ledger_id).entered();
        let timer = SETTLEMENT_LATENCY.start_timer();
        let outcome = self.execute(ledger_id, amount, account_id, method, actor);
        timer.observe_duration();
        match outcome {
            Ok(ledger) => {
                LEDGERS_SETTLED.inc();
                SETTLED_VOLUME_CENTS.inc_by(amount.to_cents() as u64);
                tracing::info!(
                    ledger_id = %ledger_id,
                    amount = %amount,
                    status = %ledger.status,
                    "settlement recorded"
                );
                Ok(ledger)
            }
            Err(err) => {
                OPERATIONS_REJECTED
                    .with_label_values(&["settle", err.kind().as_str()])
                    .inc();
                Err(err)
            }
        }
    }

    fn execute(
        &self,
        ledger_id: LedgerId,
        amount: Money,
        account_id: AccountId,
        method: PaymentMethod,
        actor: ActorId,
    ) -> Result<Ledger> {
        if !amount.is_positive() {
            return Err(Error::NonPositiveAmount(amount));
        }

        // Ledger before account, matching the global lock order.
        let mut ledger_guard = self.store.lock_ledger(&ledger_id)?;
        let mut account_guard = self.store.lock_account(&account_id)?;

        let mut ledger = (*ledger_guard).clone();
        let mut account = (*account_guard).clone();

        if matches!(ledger.status, LedgerStatus::Paid | LedgerStatus::Canceled) {
            return Err(Error::LedgerClosed {
                id: ledger_id,
                status: ledger.status,
            });
        }
        if ledger.transaction_type == TransactionType::Payable && account.balance < amount {
            return Err(Error::InsufficientFunds {
                account: account.name.clone(),
                available: account.balance,
                required: amount,
            });
        }

        let today = Utc::now().date_naive();
        ledger.installments.push(Installment {
            number: ledger.next_installment_number(),
            due_date: today,
            pay_date: today,
            value: amount,
            paid_value: amount,
            account: account_id,
            method,
            created_by: actor,
        });
        match ledger.transaction_type {
            TransactionType::Receivable => account.balance += amount,
            TransactionType::Payable => account.balance -= amount,
        }
        ledger.status = if ledger.total_paid() >= ledger.total_value {
            LedgerStatus::Paid
        } else {
            LedgerStatus::Partial
        };

        *ledger_guard = ledger.clone();
        *account_guard = account;
        Ok(ledger)
    }
}

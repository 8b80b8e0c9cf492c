use chrono::Utc;
use std::sync::Arc;

use crate::config::CategoryCodes;
use crate::error::{Error, Result};
use crate::financial::resolver::ChartResolver;
use crate::observability::metrics::{OPERATIONS_REJECTED, SERVICE_ORDERS_COMPLETED};
use crate::observability::tracing::trace_completion;
use crate::store::Store;
use crate::types::ids::{ActorId, LedgerId, ServiceOrderId};
use crate::types::ledger::{Ledger, LedgerStatus, TransactionType};
use crate::types::money::Money;
use crate::types::service_order::{ServiceOrder, ServiceOrderStatus};

/// Closes a service order: fixes the total from its items and opens
/// the matching payable toward the supplier, anchored to the vehicle
/// that received the work.
pub struct CompletionEngine {
    store: Arc<Store>,
    chart: ChartResolver,
    codes: CategoryCodes,
}

impl CompletionEngine {
    pub fn new(store: Arc<Store>, codes: CategoryCodes) -> Self {
        let chart = ChartResolver::new(Arc::clone(&store));
        CompletionEngine {
            store,
            chart,
            codes,
        }
    }

    pub fn complete(
        &self,
        service_order_id: ServiceOrderId,
        actor: ActorId,
    ) -> Result<ServiceOrder> {
        let _span = trace_completion(&service_order_id).entered();
        match self.execute(service_order_id, actor) {
            Ok(order) => {
                SERVICE_ORDERS_COMPLETED.inc();
                tracing::info!(
                    service_order_id = %service_order_id,
                    total_cost = %order.total_cost,
                    "service order completed"
                );
                Ok(order)
            }
            Err(err) => {
                OPERATIONS_REJECTED
                    .with_label_values(&["complete", err.kind().as_str()])
                    .inc();
                Err(err)
            }
        }
    }

    fn execute(&self, service_order_id: ServiceOrderId, actor: ActorId) -> Result<ServiceOrder> {
        let mut order_guard = self.store.lock_service_order(&service_order_id)?;
        let mut order = (*order_guard).clone();

        if order.status == ServiceOrderStatus::Completed {
            return Err(Error::ServiceOrderAlreadyCompleted(service_order_id));
        }
        if order.items.is_empty() {
            return Err(Error::EmptyServiceOrder(service_order_id));
        }
        let category = self.chart.resolve(&self.codes.maintenance)?;

        let now = Utc::now();
        let today = now.date_naive();
        let total: Money = order.items.iter().map(|item| item.cost).sum();
        order.total_cost = total;
        order.completion_date = Some(today);
        order.status = ServiceOrderStatus::Completed;

        let entry = Ledger {
            ledger_id: LedgerId::new(),
            entity: order.supplier,
            category: category.category_id,
            vehicle: Some(order.vehicle),
            negotiation: None,
            transaction_type: TransactionType::Payable,
            status: LedgerStatus::Open,
            total_value: total,
            due_date: today,
            description: format!(
                "Service order {} on vehicle {}",
                service_order_id, order.vehicle
            ),
            installments: Vec::new(),
            branch: order.branch,
            created_by: actor,
            created_at: now,
        };
        // The payable lands before the order row flips; its referential
        // checks are all satisfied by rows this call holds or proved.
        self.store.insert_ledger(entry)?;
        *order_guard = order.clone();
        Ok(order)
    }
}

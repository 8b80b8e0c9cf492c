use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::{CategoryCodes, StoreIdentity};
use crate::error::{Error, Result};
use crate::financial::resolver::ChartResolver;
use crate::observability::metrics::{APPROVAL_LATENCY, NEGOTIATIONS_APPROVED, OPERATIONS_REJECTED};
use crate::observability::tracing::trace_approval;
use crate::store::Store;
use crate::store::table::RowGuard;
use crate::types::ids::{ActorId, LedgerId, NegotiationId, VehicleId};
use crate::types::ledger::{Ledger, LedgerStatus, TransactionType};
use crate::types::money::Money;
use crate::types::negotiation::{ItemFlow, Negotiation, NegotiationStatus};
use crate::types::vehicle::{Vehicle, VehicleStatus};

/// Turns a draft deal into a committed one: vehicles change hands, the
/// net balance is fixed, and at most one ledger entry is opened for
/// whichever side still owes money.
pub struct ApprovalEngine {
    store: Arc<Store>,
    chart: ChartResolver,
    identity: StoreIdentity,
    codes: CategoryCodes,
}

impl ApprovalEngine {
    pub fn new(store: Arc<Store>, identity: StoreIdentity, codes: CategoryCodes) -> Self {
        let chart = ChartResolver::new(Arc::clone(&store));
        ApprovalEngine {
            store,
            chart,
            identity,
            codes,
        }
    }

    pub fn approve(&self, negotiation_id: NegotiationId, actor: ActorId) -> Result<Negotiation> {
        let _span = trace_approval(&negotiation_id).entered();
        let timer = APPROVAL_LATENCY.start_timer();
        let outcome = self.execute(negotiation_id, actor);
        timer.observe_duration();
        match outcome {
            Ok(negotiation) => {
                NEGOTIATIONS_APPROVED.inc();
                tracing::info!(
                    negotiation_id = %negotiation_id,
                    total_value = %negotiation.total_value,
                    items = negotiation.items.len(),
                    "negotiation approved"
                );
                Ok(negotiation)
            }
            Err(err) => {
                OPERATIONS_REJECTED
                    .with_label_values(&["approve", err.kind().as_str()])
                    .inc();
                Err(err)
            }
        }
    }

    fn execute(&self, negotiation_id: NegotiationId, actor: ActorId) -> Result<Negotiation> {
        let mut negotiation_guard = self.store.lock_negotiation(&negotiation_id)?;
        let mut negotiation = (*negotiation_guard).clone();

        if negotiation.status != NegotiationStatus::Draft {
            return Err(Error::NegotiationNotDraft {
                id: negotiation_id,
                status: negotiation.status,
            });
        }
        if negotiation.items.is_empty() {
            return Err(Error::EmptyNegotiation(negotiation_id));
        }
        let store_owner = self
            .store
            .entity_by_document(&self.identity.document)
            .ok_or_else(|| Error::StoreIdentityMissing(self.identity.document.clone()))?;

        // Vehicles lock in ascending id order so two deals sharing
        // stock can never hold one row each and wait on the other.
        let mut vehicle_ids: Vec<VehicleId> =
            negotiation.items.iter().map(|item| item.vehicle).collect();
        vehicle_ids.sort();
        vehicle_ids.dedup();
        let mut vehicle_guards: BTreeMap<VehicleId, RowGuard<Vehicle>> = BTreeMap::new();
        for vehicle_id in &vehicle_ids {
            vehicle_guards.insert(*vehicle_id, self.store.lock_vehicle(vehicle_id)?);
        }

        // All effects are staged on copies; rows are only written once
        // every item has validated.
        let mut staged: BTreeMap<VehicleId, Vehicle> = vehicle_guards
            .iter()
            .map(|(id, guard)| (*id, (**guard).clone()))
            .collect();
        let mut total_out = Money::zero();
        let mut total_in = Money::zero();
        for item in &negotiation.items {
            let vehicle = staged
                .get_mut(&item.vehicle)
                .ok_or(Error::VehicleNotFound(item.vehicle))?;
            match item.flow {
                ItemFlow::Out => {
                    if vehicle.status != VehicleStatus::Available {
                        return Err(Error::VehicleNotAvailable {
                            id: item.vehicle,
                            status: vehicle.status,
                        });
                    }
                    vehicle.status = VehicleStatus::Sold;
                    vehicle.current_owner = negotiation.customer;
                    total_out += item.agreed_value;
                }
                ItemFlow::In => {
                    // Trade-ins are accepted regardless of prior state
                    // and head straight to the preparation queue.
                    vehicle.status = VehicleStatus::Maintenance;
                    vehicle.current_owner = store_owner;
                    total_in += item.agreed_value;
                }
            }
        }

        let now = Utc::now();
        let balance = total_out - total_in;
        negotiation.total_value = balance;
        negotiation.negotiation_date = Some(now);
        negotiation.status = NegotiationStatus::Approved;

        let entry = if balance.is_positive() {
            let category = self.chart.resolve(&self.codes.sale_revenue)?;
            Some(Ledger {
                ledger_id: LedgerId::new(),
                entity: negotiation.customer,
                category: category.category_id,
                vehicle: None,
                negotiation: Some(negotiation_id),
                transaction_type: TransactionType::Receivable,
                status: LedgerStatus::Open,
                total_value: balance,
                due_date: now.date_naive(),
                description: format!("Sale proceeds from negotiation {}", negotiation_id),
                installments: Vec::new(),
                branch: negotiation.branch,
                created_by: actor,
                created_at: now,
            })
        } else if balance.is_negative() {
            let category = self.chart.resolve(&self.codes.vehicle_acquisition)?;
            Some(Ledger {
                ledger_id: LedgerId::new(),
                entity: negotiation.customer,
                category: category.category_id,
                vehicle: None,
                negotiation: Some(negotiation_id),
                transaction_type: TransactionType::Payable,
                status: LedgerStatus::Open,
                total_value: balance.abs(),
                due_date: now.date_naive(),
                description: format!("Trade-in difference owed on negotiation {}", negotiation_id),
                installments: Vec::new(),
                branch: negotiation.branch,
                created_by: actor,
                created_at: now,
            })
        } else {
            // Even exchange: ownership moves, the books stay silent.
            None
        };

        // Commit. The ledger insert validates against rows this call
        // already proved present, so nothing below can fail after the
        // first vehicle write.
        if let Some(entry) = entry {
            self.store.insert_ledger(entry)?;
        }
        for (vehicle_id, guard) in vehicle_guards.iter_mut() {
            if let Some(vehicle) = staged.remove(vehicle_id) {
                **guard = vehicle;
            }
        }
        *negotiation_guard = negotiation.clone();
        Ok(negotiation)
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::StoreIdentity;
use crate::error::{Error, Result};
use crate::observability::metrics::{NEGOTIATIONS_CANCELED, OPERATIONS_REJECTED};
use crate::observability::tracing::trace_cancellation;
use crate::store::Store;
use crate::store::table::RowGuard;
use crate::types::ids::{ActorId, LedgerId, NegotiationId, VehicleId};
use crate::types::ledger::{Ledger, LedgerStatus};
use crate::types::negotiation::{ItemFlow, Negotiation, NegotiationStatus};
use crate::types::vehicle::{Vehicle, VehicleStatus};

/// Reverses a deal. Linked ledger entries are voided, sold vehicles
/// come back to stock under the store's ownership, and trade-ins leave
/// the system entirely. Money that already moved is never unwound; a
/// settled entry blocks the whole reversal instead.
pub struct CancellationEngine {
    store: Arc<Store>,
    identity: StoreIdentity,
}

impl CancellationEngine {
    pub fn new(store: Arc<Store>, identity: StoreIdentity) -> Self {
        CancellationEngine { store, identity }
    }

    pub fn cancel(&self, negotiation_id: NegotiationId, actor: ActorId) -> Result<Negotiation> {
        let _span = trace_cancellation(&negotiation_id).entered();
        match self.execute(negotiation_id) {
            Ok(negotiation) => {
                NEGOTIATIONS_CANCELED.inc();
                tracing::info!(
                    negotiation_id = %negotiation_id,
                    actor = %actor,
                    "negotiation canceled"
                );
                Ok(negotiation)
            }
            Err(err) => {
                OPERATIONS_REJECTED
                    .with_label_values(&["cancel", err.kind().as_str()])
                    .inc();
                Err(err)
            }
        }
    }

    fn execute(&self, negotiation_id: NegotiationId) -> Result<Negotiation> {
        let mut negotiation_guard = self.store.lock_negotiation(&negotiation_id)?;
        let mut negotiation = (*negotiation_guard).clone();

        if negotiation.status == NegotiationStatus::Canceled {
            return Err(Error::NegotiationAlreadyCanceled(negotiation_id));
        }
        let store_owner = self
            .store
            .entity_by_document(&self.identity.document)
            .ok_or_else(|| Error::StoreIdentityMissing(self.identity.document.clone()))?;

        // Linked ledger entries, then vehicles, in the same global
        // order every engine uses.
        let mut ledger_ids = self.store.ledgers_for(&negotiation_id);
        ledger_ids.sort();
        let mut ledger_guards: Vec<(LedgerId, RowGuard<Ledger>)> =
            Vec::with_capacity(ledger_ids.len());
        for ledger_id in &ledger_ids {
            ledger_guards.push((*ledger_id, self.store.lock_ledger(ledger_id)?));
        }

        let mut vehicle_ids: Vec<VehicleId> =
            negotiation.items.iter().map(|item| item.vehicle).collect();
        vehicle_ids.sort();
        vehicle_ids.dedup();
        let mut vehicle_guards: BTreeMap<VehicleId, RowGuard<Vehicle>> = BTreeMap::new();
        for vehicle_id in &vehicle_ids {
            vehicle_guards.insert(*vehicle_id, self.store.lock_vehicle(vehicle_id)?);
        }

        // Settled money stays settled: one PAID entry vetoes the whole
        // reversal before anything is written.
        for (ledger_id, guard) in &ledger_guards {
            if guard.status == LedgerStatus::Paid {
                return Err(Error::NegotiationAlreadySettled {
                    negotiation: negotiation_id,
                    ledger: *ledger_id,
                });
            }
        }

        // A trade-in that accrued its own references since approval
        // (a service order, a cost anchor) must not be silently
        // destroyed. Checked while every vehicle row is held, so the
        // counts cannot move before the deletes below.
        let in_vehicles: Vec<VehicleId> = negotiation
            .items
            .iter()
            .filter(|item| item.flow == ItemFlow::In)
            .map(|item| item.vehicle)
            .collect();
        for vehicle_id in &in_vehicles {
            let external = self
                .store
                .vehicle_reference_count(vehicle_id)
                .saturating_sub(1);
            if external > 0 {
                return Err(Error::VehicleInUse {
                    id: *vehicle_id,
                    count: external,
                });
            }
        }

        // Commit: void, restore, discard, close.
        for (_, guard) in ledger_guards.iter_mut() {
            if guard.status != LedgerStatus::Canceled {
                let mut ledger = (**guard).clone();
                ledger.status = LedgerStatus::Canceled;
                **guard = ledger;
            }
        }

        for item in &negotiation.items {
            if item.flow != ItemFlow::Out {
                continue;
            }
            let guard = vehicle_guards
                .get_mut(&item.vehicle)
                .ok_or(Error::VehicleNotFound(item.vehicle))?;
            let mut vehicle = (**guard).clone();
            vehicle.status = VehicleStatus::Available;
            vehicle.current_owner = store_owner;
            **guard = vehicle;
        }

        for vehicle_id in &in_vehicles {
            // Item first, then vehicle: the item's own protection ref
            // must be gone before the row can legally disappear.
            negotiation.items.retain(|item| item.vehicle != *vehicle_id);
            self.store.release_vehicle_ref(vehicle_id);
            let guard = vehicle_guards
                .remove(vehicle_id)
                .ok_or(Error::VehicleNotFound(*vehicle_id))?;
            self.store.delete_vehicle(guard)?;
        }

        negotiation.status = NegotiationStatus::Canceled;
        *negotiation_guard = negotiation.clone();
        Ok(negotiation)
    }
}

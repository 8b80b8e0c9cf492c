use chrono::Utc;
use std::sync::Arc;

use crate::config::{CategoryCodes, StoreIdentity};
use crate::error::{Error, Result};
use crate::financial::resolver::ChartResolver;
use crate::observability::metrics::{OPERATIONS_REJECTED, VEHICLES_REGISTERED};
use crate::observability::tracing::trace_acquisition;
use crate::store::Store;
use crate::types::ids::{ActorId, BranchId, LedgerId};
use crate::types::ledger::{Ledger, LedgerStatus, TransactionType};
use crate::types::party::SellerRef;
use crate::types::vehicle::{Vehicle, VehicleIntake};

/// Brings a purchased vehicle into stock under the store's ownership
/// and, when the purchase was not free, opens the payable toward the
/// seller.
pub struct AcquisitionEngine {
    store: Arc<Store>,
    chart: ChartResolver,
    identity: StoreIdentity,
    codes: CategoryCodes,
}

impl AcquisitionEngine {
    pub fn new(store: Arc<Store>, identity: StoreIdentity, codes: CategoryCodes) -> Self {
        let chart = ChartResolver::new(Arc::clone(&store));
        AcquisitionEngine {
            store,
            chart,
            identity,
            codes,
        }
    }

    pub fn register(
        &self,
        intake: VehicleIntake,
        seller: SellerRef,
        actor: ActorId,
    ) -> Result<Vehicle> {
        let _span = trace_acquisition(&intake.chassis).entered();
        match self.execute(intake, seller, actor) {
            Ok(vehicle) => {
                VEHICLES_REGISTERED.inc();
                tracing::info!(
                    vehicle_id = %vehicle.vehicle_id,
                    chassis = %vehicle.chassis,
                    cost = %vehicle.acquisition_cost,
                    "vehicle registered into stock"
                );
                Ok(vehicle)
            }
            Err(err) => {
                OPERATIONS_REJECTED
                    .with_label_values(&["acquire", err.kind().as_str()])
                    .inc();
                Err(err)
            }
        }
    }

    fn execute(&self, intake: VehicleIntake, seller: SellerRef, actor: ActorId) -> Result<Vehicle> {
        if intake.acquisition_cost.is_negative() {
            return Err(Error::NegativeAmount(intake.acquisition_cost));
        }
        if intake.sale_price.is_negative() {
            return Err(Error::NegativeAmount(intake.sale_price));
        }
        let store_owner = self
            .store
            .entity_by_document(&self.identity.document)
            .ok_or_else(|| Error::StoreIdentityMissing(self.identity.document.clone()))?;
        // Resolve the expense category before creating anything; a
        // misconfigured chart leaves no half-registered vehicle behind.
        let category = if intake.acquisition_cost.is_positive() {
            Some(self.chart.resolve(&self.codes.vehicle_acquisition)?)
        } else {
            None
        };

        let branch = BranchId::default();
        let seller_id =
            self.store
                .get_or_create_entity(&seller.name, &seller.document, branch, actor);
        let vehicle = Vehicle::register(intake, store_owner, branch, actor);
        self.store.insert_vehicle(vehicle.clone())?;

        if let Some(category) = category {
            let now = Utc::now();
            let label = match &vehicle.plate {
                Some(plate) => plate.clone(),
                None => vehicle.chassis.clone(),
            };
            self.store.insert_ledger(Ledger {
                ledger_id: LedgerId::new(),
                entity: seller_id,
                category: category.category_id,
                vehicle: Some(vehicle.vehicle_id),
                negotiation: None,
                transaction_type: TransactionType::Payable,
                status: LedgerStatus::Open,
                total_value: vehicle.acquisition_cost,
                due_date: now.date_naive(),
                description: format!("Acquisition of {} ({})", vehicle.description, label),
                installments: Vec::new(),
                branch,
                created_by: actor,
                created_at: now,
            })?;
        }
        Ok(vehicle)
    }
}

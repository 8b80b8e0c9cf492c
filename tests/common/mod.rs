#![allow(dead_code)]

use chrono::Utc;
use std::sync::Arc;

use DealerInfra::Engines;
use DealerInfra::config::loader::AppConfig;
use DealerInfra::store::Store;
use DealerInfra::types::account::{AccountType, FinancialAccount};
use DealerInfra::types::chart::{ChartCategory, OperationType};
use DealerInfra::types::ids::{
    AccountId, ActorId, BranchId, EmployeeId, EntityId, LedgerId, NegotiationId, ServiceOrderId,
    VehicleId,
};
use DealerInfra::types::ledger::{Ledger, LedgerStatus, TransactionType};
use DealerInfra::types::money::Money;
use DealerInfra::types::negotiation::{ItemFlow, Negotiation, NegotiationItem};
use DealerInfra::types::party::Entity;
use DealerInfra::types::service_order::{ServiceCategory, ServiceOrder, ServiceOrderItem};
use DealerInfra::types::vehicle::{Vehicle, VehicleIntake};

pub struct HarnessOptions {
    pub seed_chart: bool,
    pub seed_store_entity: bool,
    pub lock_wait_ms: u64,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        HarnessOptions {
            seed_chart: true,
            seed_store_entity: true,
            lock_wait_ms: DealerInfra::DEFAULT_LOCK_WAIT_MS,
        }
    }
}

pub struct Harness {
    pub store: Arc<Store>,
    pub engines: Engines,
    pub config: AppConfig,
    pub actor: ActorId,
    pub store_entity: Option<EntityId>,
    pub customer: EntityId,
    pub supplier: EntityId,
    pub account: AccountId,
}

/// Fully seeded back office: chart codes, store identity, a customer,
/// a supplier, and one bank account holding 20,000.00.
pub fn harness() -> Harness {
    harness_with(HarnessOptions::default())
}

pub fn harness_with(options: HarnessOptions) -> Harness {
    let mut config = AppConfig::default();
    config.locking.wait_ms = options.lock_wait_ms;
    let store = Arc::new(Store::new(&config.locking));
    let engines = Engines::new(Arc::clone(&store), &config);
    let actor = ActorId::new();
    let branch = BranchId::default();

    if options.seed_chart {
        let codes = &config.category_codes;
        for (code, name, operation) in [
            (codes.sale_revenue.as_str(), "Vehicle sales", OperationType::Revenue),
            (codes.vehicle_acquisition.as_str(), "Vehicle acquisitions", OperationType::Expense),
            (codes.maintenance.as_str(), "Vehicle maintenance", OperationType::Expense),
        ] {
            store
                .insert_category(ChartCategory::new(code, name, operation, None))
                .unwrap();
        }
    }

    let store_entity = if options.seed_store_entity {
        Some(
            store
                .insert_entity(Entity::new(
                    "Macedo Motors LTDA",
                    &config.store_identity.document,
                    branch,
                    actor,
                ))
                .unwrap(),
        )
    } else {
        None
    };
    let customer = store
        .insert_entity(Entity::new("Alda Pereira", "111.222.333-44", branch, actor))
        .unwrap();
    let supplier = store
        .insert_entity(Entity::new(
            "Oficina Bairro Alto",
            "12.345.678/0001-90",
            branch,
            actor,
        ))
        .unwrap();
    let account = store
        .insert_account(FinancialAccount::new(
            "Operating account",
            AccountType::Bank,
            Money::from_units(20_000),
            branch,
            actor,
        ))
        .unwrap();

    Harness {
        store,
        engines,
        config,
        actor,
        store_entity,
        customer,
        supplier,
        account,
    }
}

impl Harness {
    pub fn store_entity_id(&self) -> EntityId {
        self.store_entity.unwrap()
    }

    /// A stock vehicle owned by the store, AVAILABLE, priced for sale.
    pub fn seed_vehicle(&self, chassis: &str, sale_price: Money) -> VehicleId {
        let intake = VehicleIntake {
            chassis: chassis.to_string(),
            plate: None,
            description: format!("Stock unit {chassis}"),
            model_year: 2020,
            acquisition_cost: Money::from_units(10_000),
            sale_price,
        };
        let owner = self.store_entity_id();
        self.store
            .insert_vehicle(Vehicle::register(intake, owner, BranchId::default(), self.actor))
            .unwrap()
    }

    /// A trade-in candidate owned by the customer.
    pub fn seed_customer_vehicle(&self, chassis: &str) -> VehicleId {
        let intake = VehicleIntake {
            chassis: chassis.to_string(),
            plate: None,
            description: format!("Trade-in {chassis}"),
            model_year: 2015,
            acquisition_cost: Money::zero(),
            sale_price: Money::zero(),
        };
        self.store
            .insert_vehicle(Vehicle::register(
                intake,
                self.customer,
                BranchId::default(),
                self.actor,
            ))
            .unwrap()
    }

    pub fn out_item(&self, vehicle: VehicleId, units: i64) -> NegotiationItem {
        NegotiationItem {
            vehicle,
            flow: ItemFlow::Out,
            agreed_value: Money::from_units(units),
        }
    }

    pub fn in_item(&self, vehicle: VehicleId, units: i64) -> NegotiationItem {
        NegotiationItem {
            vehicle,
            flow: ItemFlow::In,
            agreed_value: Money::from_units(units),
        }
    }

    pub fn draft(&self, items: Vec<NegotiationItem>) -> NegotiationId {
        self.store
            .insert_negotiation(Negotiation::draft(
                self.customer,
                EmployeeId::new(),
                items,
                BranchId::default(),
                self.actor,
            ))
            .unwrap()
    }

    pub fn seed_ledger(&self, transaction_type: TransactionType, units: i64) -> LedgerId {
        let category = self
            .store
            .category(&self.config.category_codes.sale_revenue)
            .unwrap();
        let now = Utc::now();
        self.store
            .insert_ledger(Ledger {
                ledger_id: LedgerId::new(),
                entity: self.customer,
                category: category.category_id,
                vehicle: None,
                negotiation: None,
                transaction_type,
                status: LedgerStatus::Open,
                total_value: Money::from_units(units),
                due_date: now.date_naive(),
                description: format!("Seeded {transaction_type} of {units}"),
                installments: Vec::new(),
                branch: BranchId::default(),
                created_by: self.actor,
                created_at: now,
            })
            .unwrap()
    }

    pub fn seed_service_order(&self, vehicle: VehicleId, costs: &[i64]) -> ServiceOrderId {
        let items = costs
            .iter()
            .map(|units| ServiceOrderItem {
                description: format!("Work item of {units}"),
                category: ServiceCategory::Mechanic,
                cost: Money::from_units(*units),
            })
            .collect();
        self.store
            .insert_service_order(ServiceOrder::requested(
                vehicle,
                self.supplier,
                items,
                BranchId::default(),
                self.actor,
            ))
            .unwrap()
    }

    /// The single ledger entry a negotiation produced, if any.
    pub fn negotiation_ledger(&self, negotiation: NegotiationId) -> Option<Ledger> {
        let ids = self.store.ledgers_for(&negotiation);
        ids.first().map(|id| self.store.get_ledger(id).unwrap())
    }
}

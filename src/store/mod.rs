pub mod table;

use dashmap::DashMap;
use std::collections::HashSet;
use std::time::Duration;

use crate::config::LockingConfig;
use crate::error::{Error, Result};
use crate::store::table::{LockFailure, RowGuard, Table};
use crate::types::account::FinancialAccount;
use crate::types::chart::ChartCategory;
use crate::types::ids::{
    AccountId, ActorId, BranchId, CategoryId, EntityId, LedgerId, NegotiationId, ServiceOrderId,
    VehicleId,
};
use crate::types::ledger::Ledger;
use crate::types::negotiation::Negotiation;
use crate::types::party::Entity;
use crate::types::service_order::ServiceOrder;
use crate::types::vehicle::Vehicle;

/// In-memory system of record. Row tables carry per-row locks; the
/// side indexes (uniqueness, back-references, protection counts) are
/// plain concurrent maps maintained by the insert/delete paths.
pub struct Store {
    lock_wait: Duration,

    vehicles: Table<VehicleId, Vehicle>,
    negotiations: Table<NegotiationId, Negotiation>,
    ledgers: Table<LedgerId, Ledger>,
    accounts: Table<AccountId, FinancialAccount>,
    service_orders: Table<ServiceOrderId, ServiceOrder>,
    entities: Table<EntityId, Entity>,

    /// Chart of accounts keyed by dotted code. Reference data: written
    /// at seed time, read-only afterwards, so no row locks.
    chart: DashMap<String, ChartCategory>,

    chassis_index: DashMap<String, VehicleId>,
    plate_index: DashMap<String, VehicleId>,
    document_index: DashMap<String, EntityId>,
    negotiation_ledgers: DashMap<NegotiationId, Vec<LedgerId>>,
    vehicle_ledgers: DashMap<VehicleId, Vec<LedgerId>>,

    /// How many protected records (negotiation items, service orders,
    /// ledger anchors) point at each vehicle. A vehicle with a nonzero
    /// count cannot be deleted.
    vehicle_refs: DashMap<VehicleId, u32>,
}

impl Store {
    pub fn new(locking: &LockingConfig) -> Self {
        Store {
            lock_wait: locking.wait(),
            vehicles: Table::new(),
            negotiations: Table::new(),
            ledgers: Table::new(),
            accounts: Table::new(),
            service_orders: Table::new(),
            entities: Table::new(),
            chart: DashMap::new(),
            chassis_index: DashMap::new(),
            plate_index: DashMap::new(),
            document_index: DashMap::new(),
            negotiation_ledgers: DashMap::new(),
            vehicle_ledgers: DashMap::new(),
            vehicle_refs: DashMap::new(),
        }
    }

    // Chart of accounts

    pub fn insert_category(&self, category: ChartCategory) -> Result<CategoryId> {
        use dashmap::mapref::entry::Entry;
        let id = category.category_id;
        match self.chart.entry(category.code.clone()) {
            Entry::Occupied(_) => Err(Error::DuplicateChartCode(category.code)),
            Entry::Vacant(vacant) => {
                vacant.insert(category);
                Ok(id)
            }
        }
    }

    pub fn category(&self, code: &str) -> Option<ChartCategory> {
        self.chart.get(code).map(|entry| entry.value().clone())
    }

    // Party directory

    pub fn insert_entity(&self, entity: Entity) -> Result<EntityId> {
        use dashmap::mapref::entry::Entry;
        let id = entity.entity_id;
        let document = entity.document.clone();
        match self.document_index.entry(document.clone()) {
            Entry::Occupied(_) => Err(Error::DuplicateDocument(document)),
            Entry::Vacant(vacant) => {
                if !self.entities.insert(id, entity) {
                    return Err(Error::AlreadyExists {
                        table: "entities",
                        id: id.to_string(),
                    });
                }
                vacant.insert(id);
                Ok(id)
            }
        }
    }

    /// Upsert by tax document. Repeat sellers and payers resolve to
    /// their existing entity; the provided name only matters on first
    /// contact.
    pub fn get_or_create_entity(
        &self,
        name: &str,
        document: &str,
        branch: BranchId,
        created_by: ActorId,
    ) -> EntityId {
        use dashmap::mapref::entry::Entry;
        match self.document_index.entry(document.to_string()) {
            Entry::Occupied(occupied) => *occupied.get(),
            Entry::Vacant(vacant) => {
                let entity = Entity::new(name, document, branch, created_by);
                let id = entity.entity_id;
                self.entities.insert(id, entity);
                vacant.insert(id);
                id
            }
        }
    }

    pub fn entity_by_document(&self, document: &str) -> Option<EntityId> {
        self.document_index.get(document).map(|entry| *entry.value())
    }

    pub fn get_entity(&self, id: &EntityId) -> Result<Entity> {
        self.entities.snapshot(id, self.lock_wait).map_err(|failure| match failure {
            LockFailure::Missing => Error::EntityNotFound(*id),
            LockFailure::Busy => Error::Busy {
                resource: "entity",
                id: id.to_string(),
            },
        })
    }

    // Financial accounts

    pub fn insert_account(&self, account: FinancialAccount) -> Result<AccountId> {
        let id = account.account_id;
        if !self.accounts.insert(id, account) {
            return Err(Error::AlreadyExists {
                table: "financial_accounts",
                id: id.to_string(),
            });
        }
        Ok(id)
    }

    // Vehicles

    pub fn insert_vehicle(&self, vehicle: Vehicle) -> Result<VehicleId> {
        use dashmap::mapref::entry::Entry;
        let id = vehicle.vehicle_id;
        let chassis = vehicle.chassis.clone();
        let plate = vehicle.plate.clone();

        match self.chassis_index.entry(chassis.clone()) {
            Entry::Occupied(_) => return Err(Error::DuplicateChassis(chassis)),
            Entry::Vacant(vacant) => {
                vacant.insert(id);
            }
        }
        if let Some(plate) = plate.clone() {
            match self.plate_index.entry(plate.clone()) {
                Entry::Occupied(_) => {
                    self.chassis_index.remove(&chassis);
                    return Err(Error::DuplicatePlate(plate));
                }
                Entry::Vacant(vacant) => {
                    vacant.insert(id);
                }
            }
        }
        if !self.vehicles.insert(id, vehicle) {
            self.chassis_index.remove(&chassis);
            if let Some(plate) = plate {
                self.plate_index.remove(&plate);
            }
            return Err(Error::AlreadyExists {
                table: "vehicles",
                id: id.to_string(),
            });
        }
        Ok(id)
    }

    pub fn vehicle_by_chassis(&self, chassis: &str) -> Option<VehicleId> {
        self.chassis_index.get(chassis).map(|entry| *entry.value())
    }

    /// Unlinks a stock vehicle. The caller must hold the row guard;
    /// passing it in consumes it so the row is removed while still
    /// exclusively held.
    pub fn delete_vehicle(&self, guard: RowGuard<Vehicle>) -> Result<()> {
        let id = guard.vehicle_id;
        let count = self.vehicle_reference_count(&id);
        if count > 0 {
            return Err(Error::VehicleInUse { id, count });
        }
        self.chassis_index.remove(&guard.chassis);
        if let Some(plate) = &guard.plate {
            self.plate_index.remove(plate);
        }
        // Zero references implies no anchored ledgers, so the cost
        // index entry is empty at worst.
        self.vehicle_ledgers.remove(&id);
        self.vehicle_refs.remove(&id);
        self.vehicles.remove(&id);
        Ok(())
    }

    // Negotiations

    pub fn insert_negotiation(&self, negotiation: Negotiation) -> Result<NegotiationId> {
        let id = negotiation.negotiation_id;
        if !self.entities.contains(&negotiation.customer) {
            return Err(Error::EntityNotFound(negotiation.customer));
        }
        let mut seen = HashSet::new();
        for item in &negotiation.items {
            if !seen.insert(item.vehicle) {
                return Err(Error::DuplicateNegotiationVehicle {
                    negotiation: id,
                    vehicle: item.vehicle,
                });
            }
            if !item.agreed_value.is_positive() {
                return Err(Error::NonPositiveAmount(item.agreed_value));
            }
        }

        let mut held: Vec<VehicleId> = Vec::with_capacity(negotiation.items.len());
        for item in &negotiation.items {
            match self.hold_vehicle_ref(&item.vehicle) {
                Ok(()) => held.push(item.vehicle),
                Err(err) => {
                    for vehicle in &held {
                        self.release_vehicle_ref(vehicle);
                    }
                    return Err(err);
                }
            }
        }
        if !self.negotiations.insert(id, negotiation) {
            for vehicle in &held {
                self.release_vehicle_ref(vehicle);
            }
            return Err(Error::AlreadyExists {
                table: "negotiations",
                id: id.to_string(),
            });
        }
        Ok(id)
    }

    // Service orders

    pub fn insert_service_order(&self, order: ServiceOrder) -> Result<ServiceOrderId> {
        let id = order.service_order_id;
        if !self.entities.contains(&order.supplier) {
            return Err(Error::EntityNotFound(order.supplier));
        }
        for item in &order.items {
            if !item.cost.is_positive() {
                return Err(Error::NonPositiveAmount(item.cost));
            }
        }
        self.hold_vehicle_ref(&order.vehicle)?;
        let vehicle = order.vehicle;
        if !self.service_orders.insert(id, order) {
            self.release_vehicle_ref(&vehicle);
            return Err(Error::AlreadyExists {
                table: "service_orders",
                id: id.to_string(),
            });
        }
        Ok(id)
    }

    // Ledger entries

    pub fn insert_ledger(&self, ledger: Ledger) -> Result<LedgerId> {
        let id = ledger.ledger_id;
        if !ledger.total_value.is_positive() {
            return Err(Error::NonPositiveAmount(ledger.total_value));
        }
        if !self.entities.contains(&ledger.entity) {
            return Err(Error::EntityNotFound(ledger.entity));
        }
        if let Some(negotiation) = ledger.negotiation {
            if !self.negotiations.contains(&negotiation) {
                return Err(Error::NegotiationNotFound(negotiation));
            }
        }
        if let Some(vehicle) = ledger.vehicle {
            self.hold_vehicle_ref(&vehicle)?;
        }
        let negotiation = ledger.negotiation;
        let vehicle = ledger.vehicle;
        if !self.ledgers.insert(id, ledger) {
            if let Some(vehicle) = vehicle {
                self.release_vehicle_ref(&vehicle);
            }
            return Err(Error::AlreadyExists {
                table: "ledger_entries",
                id: id.to_string(),
            });
        }
        if let Some(negotiation) = negotiation {
            self.negotiation_ledgers.entry(negotiation).or_default().push(id);
        }
        if let Some(vehicle) = vehicle {
            self.vehicle_ledgers.entry(vehicle).or_default().push(id);
        }
        Ok(id)
    }

    /// Ledger entries produced by one negotiation, in creation order.
    pub fn ledgers_for(&self, negotiation: &NegotiationId) -> Vec<LedgerId> {
        self.negotiation_ledgers
            .get(negotiation)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Ledger entries anchored to a vehicle as their cost center, in
    /// creation order. Feeds per-vehicle cost reporting.
    pub fn ledgers_anchored_to(&self, vehicle: &VehicleId) -> Vec<LedgerId> {
        self.vehicle_ledgers
            .get(vehicle)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    // Row locks. Lock acquisition order across operations is:
    // negotiation / service order, then vehicles ascending by id, then
    // ledger entries, then accounts.

    pub fn lock_vehicle(&self, id: &VehicleId) -> Result<RowGuard<Vehicle>> {
        self.vehicles.lock(id, self.lock_wait).map_err(|failure| match failure {
            LockFailure::Missing => Error::VehicleNotFound(*id),
            LockFailure::Busy => Error::Busy {
                resource: "vehicle",
                id: id.to_string(),
            },
        })
    }

    pub fn lock_negotiation(&self, id: &NegotiationId) -> Result<RowGuard<Negotiation>> {
        self.negotiations.lock(id, self.lock_wait).map_err(|failure| match failure {
            LockFailure::Missing => Error::NegotiationNotFound(*id),
            LockFailure::Busy => Error::Busy {
                resource: "negotiation",
                id: id.to_string(),
            },
        })
    }

    pub fn lock_ledger(&self, id: &LedgerId) -> Result<RowGuard<Ledger>> {
        self.ledgers.lock(id, self.lock_wait).map_err(|failure| match failure {
            LockFailure::Missing => Error::LedgerNotFound(*id),
            LockFailure::Busy => Error::Busy {
                resource: "ledger",
                id: id.to_string(),
            },
        })
    }

    pub fn lock_account(&self, id: &AccountId) -> Result<RowGuard<FinancialAccount>> {
        self.accounts.lock(id, self.lock_wait).map_err(|failure| match failure {
            LockFailure::Missing => Error::AccountNotFound(*id),
            LockFailure::Busy => Error::Busy {
                resource: "account",
                id: id.to_string(),
            },
        })
    }

    pub fn lock_service_order(&self, id: &ServiceOrderId) -> Result<RowGuard<ServiceOrder>> {
        self.service_orders.lock(id, self.lock_wait).map_err(|failure| match failure {
            LockFailure::Missing => Error::ServiceOrderNotFound(*id),
            LockFailure::Busy => Error::Busy {
                resource: "service_order",
                id: id.to_string(),
            },
        })
    }

    // Snapshots

    pub fn get_vehicle(&self, id: &VehicleId) -> Result<Vehicle> {
        Ok((*self.lock_vehicle(id)?).clone())
    }

    pub fn get_negotiation(&self, id: &NegotiationId) -> Result<Negotiation> {
        Ok((*self.lock_negotiation(id)?).clone())
    }

    pub fn get_ledger(&self, id: &LedgerId) -> Result<Ledger> {
        Ok((*self.lock_ledger(id)?).clone())
    }

    pub fn get_account(&self, id: &AccountId) -> Result<FinancialAccount> {
        Ok((*self.lock_account(id)?).clone())
    }

    pub fn get_service_order(&self, id: &ServiceOrderId) -> Result<ServiceOrder> {
        Ok((*self.lock_service_order(id)?).clone())
    }

    // Vehicle protection counts

    pub fn vehicle_reference_count(&self, id: &VehicleId) -> u32 {
        self.vehicle_refs.get(id).map(|entry| *entry.value()).unwrap_or(0)
    }

    /// Records one more protected reference. Locking the row first
    /// keeps reference creation serialized against a cancellation that
    /// is holding the vehicle for deletion: the count cannot move while
    /// someone else holds the guard.
    fn hold_vehicle_ref(&self, id: &VehicleId) -> Result<()> {
        let _guard = self.lock_vehicle(id)?;
        *self.vehicle_refs.entry(*id).or_insert(0) += 1;
        Ok(())
    }

    pub(crate) fn release_vehicle_ref(&self, id: &VehicleId) {
        if let Some(mut entry) = self.vehicle_refs.get_mut(id) {
            if *entry > 0 {
                *entry -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ids::EmployeeId;
    use crate::types::money::Money;
    use crate::types::negotiation::{ItemFlow, NegotiationItem};
    use crate::types::vehicle::VehicleIntake;

    fn test_store() -> Store {
        Store::new(&LockingConfig { wait_ms: 50 })
    }

    fn seed_vehicle(store: &Store, chassis: &str, owner: EntityId) -> VehicleId {
        let intake = VehicleIntake {
            chassis: chassis.to_string(),
            plate: None,
            description: "test unit".to_string(),
            model_year: 2020,
            acquisition_cost: Money::from_units(10_000),
            sale_price: Money::from_units(12_000),
        };
        let vehicle = Vehicle::register(intake, owner, BranchId::default(), ActorId::new());
        match store.insert_vehicle(vehicle) {
            Ok(id) => id,
            Err(err) => panic!("vehicle seed failed: {err}"),
        }
    }

    #[test]
    fn duplicate_chassis_is_rejected() {
        let store = test_store();
        let owner = store.get_or_create_entity("Store", "99", BranchId::default(), ActorId::new());
        seed_vehicle(&store, "chassis-1", owner);
        let intake = VehicleIntake {
            chassis: " chassis-1 ".to_string(),
            plate: None,
            description: "same chassis".to_string(),
            model_year: 2021,
            acquisition_cost: Money::from_units(1),
            sale_price: Money::from_units(2),
        };
        let dup = Vehicle::register(intake, owner, BranchId::default(), ActorId::new());
        assert!(matches!(
            store.insert_vehicle(dup),
            Err(Error::DuplicateChassis(_))
        ));
    }

    #[test]
    fn entity_upsert_is_keyed_by_document() {
        let store = test_store();
        let actor = ActorId::new();
        let first = store.get_or_create_entity("Ana", "123.456.789-01", BranchId::default(), actor);
        let second = store.get_or_create_entity("Ana B.", "123.456.789-01", BranchId::default(), actor);
        assert_eq!(first, second);
        assert_eq!(store.entity_by_document("123.456.789-01"), Some(first));
    }

    #[test]
    fn negotiation_items_hold_protection_refs() {
        let store = test_store();
        let actor = ActorId::new();
        let owner = store.get_or_create_entity("Store", "99", BranchId::default(), actor);
        let customer = store.get_or_create_entity("Buyer", "11", BranchId::default(), actor);
        let vehicle = seed_vehicle(&store, "chassis-a", owner);

        let negotiation = Negotiation::draft(
            customer,
            EmployeeId::new(),
            vec![NegotiationItem {
                vehicle,
                flow: ItemFlow::Out,
                agreed_value: Money::from_units(15_000),
            }],
            BranchId::default(),
            actor,
        );
        assert!(store.insert_negotiation(negotiation).is_ok());
        assert_eq!(store.vehicle_reference_count(&vehicle), 1);
    }

    #[test]
    fn referenced_vehicle_cannot_be_deleted() {
        let store = test_store();
        let actor = ActorId::new();
        let owner = store.get_or_create_entity("Store", "99", BranchId::default(), actor);
        let customer = store.get_or_create_entity("Buyer", "11", BranchId::default(), actor);
        let vehicle = seed_vehicle(&store, "chassis-b", owner);

        let negotiation = Negotiation::draft(
            customer,
            EmployeeId::new(),
            vec![NegotiationItem {
                vehicle,
                flow: ItemFlow::In,
                agreed_value: Money::from_units(8_000),
            }],
            BranchId::default(),
            actor,
        );
        assert!(store.insert_negotiation(negotiation).is_ok());

        let guard = match store.lock_vehicle(&vehicle) {
            Ok(guard) => guard,
            Err(err) => panic!("lock failed: {err}"),
        };
        assert!(matches!(
            store.delete_vehicle(guard),
            Err(Error::VehicleInUse { count: 1, .. })
        ));

        store.release_vehicle_ref(&vehicle);
        let guard = match store.lock_vehicle(&vehicle) {
            Ok(guard) => guard,
            Err(err) => panic!("lock failed: {err}"),
        };
        assert!(store.delete_vehicle(guard).is_ok());
        assert!(store.get_vehicle(&vehicle).is_err());
        assert_eq!(store.vehicle_by_chassis("CHASSIS-B"), None);
    }

    #[test]
    fn duplicate_item_vehicle_is_rejected() {
        let store = test_store();
        let actor = ActorId::new();
        let owner = store.get_or_create_entity("Store", "99", BranchId::default(), actor);
        let customer = store.get_or_create_entity("Buyer", "11", BranchId::default(), actor);
        let vehicle = seed_vehicle(&store, "chassis-c", owner);

        let item = NegotiationItem {
            vehicle,
            flow: ItemFlow::Out,
            agreed_value: Money::from_units(1_000),
        };
        let negotiation = Negotiation::draft(
            customer,
            EmployeeId::new(),
            vec![item.clone(), item],
            BranchId::default(),
            actor,
        );
        assert!(matches!(
            store.insert_negotiation(negotiation),
            Err(Error::DuplicateNegotiationVehicle { .. })
        ));
        // Nothing was held for the rejected draft.
        assert_eq!(store.vehicle_reference_count(&vehicle), 0);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ids::{ActorId, BranchId, EntityId, VehicleId};
use crate::types::money::Money;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Available,
    Maintenance,
    Reserved,
    Sold,
    WriteOff,
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Maintenance => "maintenance",
            VehicleStatus::Reserved => "reserved",
            VehicleStatus::Sold => "sold",
            VehicleStatus::WriteOff => "write_off",
        };
        write!(f, "{}", label)
    }
}

/// Intake data for a vehicle entering stock. Identifiers are normalized
/// on registration so uniqueness checks do not depend on caller casing.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VehicleIntake {
    pub chassis: String,
    pub plate: Option<String>,
    pub description: String,
    pub model_year: u16,
    pub acquisition_cost: Money,
    pub sale_price: Money,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vehicle {
    pub vehicle_id: VehicleId,
    pub chassis: String,
    pub plate: Option<String>,
    pub description: String,
    pub model_year: u16,
    pub status: VehicleStatus,
    pub current_owner: EntityId,
    pub acquisition_cost: Money,
    pub sale_price: Money,
    pub branch: BranchId,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn register(
        intake: VehicleIntake,
        owner: EntityId,
        branch: BranchId,
        created_by: ActorId,
    ) -> Self {
        Vehicle {
            vehicle_id: VehicleId::new(),
            chassis: normalize_identifier(&intake.chassis),
            plate: intake.plate.as_deref().map(normalize_identifier),
            description: intake.description,
            model_year: intake.model_year,
            status: VehicleStatus::Available,
            current_owner: owner,
            acquisition_cost: intake.acquisition_cost,
            sale_price: intake.sale_price,
            branch,
            created_by,
            created_at: Utc::now(),
        }
    }
}

fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_uppercase()
}

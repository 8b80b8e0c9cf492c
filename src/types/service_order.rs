use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ids::{ActorId, BranchId, EntityId, ServiceOrderId, VehicleId};
use crate::types::money::Money;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceOrderStatus {
    Requested,
    Approved,
    Completed,
    Canceled,
}

impl fmt::Display for ServiceOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceOrderStatus::Requested => "requested",
            ServiceOrderStatus::Approved => "approved",
            ServiceOrderStatus::Completed => "completed",
            ServiceOrderStatus::Canceled => "canceled",
        };
        write!(f, "{}", label)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    Mechanic,
    Bodywork,
    Aesthetics,
    Parts,
    Documentation,
    Other,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceOrderItem {
    pub description: String,
    pub category: ServiceCategory,
    pub cost: Money,
}

/// Work commissioned from a supplier on one stock vehicle. Items are
/// edited freely until completion fixes the total cost.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceOrder {
    pub service_order_id: ServiceOrderId,
    pub vehicle: VehicleId,
    pub supplier: EntityId,
    pub status: ServiceOrderStatus,
    pub issue_date: NaiveDate,
    pub completion_date: Option<NaiveDate>,
    pub total_cost: Money,
    pub items: Vec<ServiceOrderItem>,
    pub branch: BranchId,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
}

impl ServiceOrder {
    pub fn requested(
        vehicle: VehicleId,
        supplier: EntityId,
        items: Vec<ServiceOrderItem>,
        branch: BranchId,
        created_by: ActorId,
    ) -> Self {
        let now = Utc::now();
        ServiceOrder {
            service_order_id: ServiceOrderId::new(),
            vehicle,
            supplier,
            status: ServiceOrderStatus::Requested,
            issue_date: now.date_naive(),
            completion_date: None,
            total_cost: Money::zero(),
            items,
            branch,
            created_by,
            created_at: now,
        }
    }
}

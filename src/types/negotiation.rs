use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ids::{ActorId, BranchId, EmployeeId, EntityId, NegotiationId, VehicleId};
use crate::types::money::Money;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegotiationStatus {
    Draft,
    Approved,
    Canceled,
}

impl fmt::Display for NegotiationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NegotiationStatus::Draft => "draft",
            NegotiationStatus::Approved => "approved",
            NegotiationStatus::Canceled => "canceled",
        };
        write!(f, "{}", label)
    }
}

/// Direction of a vehicle within a deal: OUT leaves stock toward the
/// customer, IN arrives as a trade-in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemFlow {
    Out,
    In,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NegotiationItem {
    pub vehicle: VehicleId,
    pub flow: ItemFlow,
    pub agreed_value: Money,
}

/// A deal between the store and one customer, carrying any mix of
/// outgoing sales and incoming trade-ins. Items live inside the
/// negotiation; a vehicle appears at most once per deal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Negotiation {
    pub negotiation_id: NegotiationId,
    pub customer: EntityId,
    pub seller: EmployeeId,
    pub status: NegotiationStatus,
    pub negotiation_date: Option<DateTime<Utc>>,
    /// Net balance fixed at approval: sum of OUT values minus sum of IN
    /// values. Zero until the deal is approved.
    pub total_value: Money,
    pub items: Vec<NegotiationItem>,
    pub branch: BranchId,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
}

impl Negotiation {
    pub fn draft(
        customer: EntityId,
        seller: EmployeeId,
        items: Vec<NegotiationItem>,
        branch: BranchId,
        created_by: ActorId,
    ) -> Self {
        Negotiation {
            negotiation_id: NegotiationId::new(),
            customer,
            seller,
            status: NegotiationStatus::Draft,
            negotiation_date: None,
            total_value: Money::zero(),
            items,
            branch,
            created_by,
            created_at: Utc::now(),
        }
    }
}

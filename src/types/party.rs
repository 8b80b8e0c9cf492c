use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ids::{ActorId, BranchId, EntityId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Individual,
    Company,
}

impl EntityKind {
    /// Tax documents with up to eleven digits belong to individuals,
    /// longer ones to companies.
    pub fn from_document(document: &str) -> Self {
        let digits = document.chars().filter(char::is_ascii_digit).count();
        if digits <= 11 {
            EntityKind::Individual
        } else {
            EntityKind::Company
        }
    }
}

/// A party the store does business with: customer, supplier, or the
/// store itself. Uniquely keyed by tax document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: EntityId,
    pub name: String,
    pub document: String,
    pub kind: EntityKind,
    pub branch: BranchId,
    pub created_by: ActorId,
    pub created_at: DateTime<Utc>,
}

impl Entity {
    pub fn new(name: &str, document: &str, branch: BranchId, created_by: ActorId) -> Self {
        Entity {
            entity_id: EntityId::new(),
            name: name.to_string(),
            document: document.to_string(),
            kind: EntityKind::from_document(document),
            branch,
            created_by,
            created_at: Utc::now(),
        }
    }
}

/// Seller details supplied with a vehicle acquisition. The party
/// directory is upserted by document, so repeat sellers resolve to
/// their existing entity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SellerRef {
    pub name: String,
    pub document: String,
}

use uuid::Uuid;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }

            pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
                Ok($name(Uuid::parse_str(s)?))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id_type!(VehicleId);
define_id_type!(NegotiationId);
define_id_type!(LedgerId);
define_id_type!(AccountId);
define_id_type!(EntityId);
define_id_type!(ServiceOrderId);
define_id_type!(CategoryId);
define_id_type!(EmployeeId);
define_id_type!(ActorId);

/// Physical store branch. Most deployments run a single branch, so
/// records created without an explicit branch land on branch 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchId(pub u32);

impl BranchId {
    pub fn new(value: u32) -> Self {
        BranchId(value)
    }
}

impl Default for BranchId {
    fn default() -> Self {
        BranchId(1)
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

use thiserror::Error;
use crate::types::ids::{AccountId, EntityId, LedgerId, NegotiationId, ServiceOrderId, VehicleId};
use crate::types::ledger::LedgerStatus;
use crate::types::money::Money;
use crate::types::negotiation::NegotiationStatus;
use crate::types::vehicle::VehicleStatus;

#[derive(Error, Debug)]
pub enum Error {
    // Lookup Errors
    #[error("Vehicle not found: {0}")]
    VehicleNotFound(VehicleId),

    #[error("Negotiation not found: {0}")]
    NegotiationNotFound(NegotiationId),

    #[error("Ledger entry not found: {0}")]
    LedgerNotFound(LedgerId),

    #[error("Financial account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Service order not found: {0}")]
    ServiceOrderNotFound(ServiceOrderId),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Chart of accounts has no category with code {0}")]
    CategoryNotConfigured(String),

    #[error("Store identity document {0} is not registered in the party directory")]
    StoreIdentityMissing(String),

    // State Errors
    #[error("Negotiation {id} is {status}, only drafts can be approved")]
    NegotiationNotDraft {
        id: NegotiationId,
        status: NegotiationStatus,
    },

    #[error("Negotiation {0} is already canceled")]
    NegotiationAlreadyCanceled(NegotiationId),

    #[error("Negotiation {negotiation} has settled money on ledger entry {ledger}")]
    NegotiationAlreadySettled {
        negotiation: NegotiationId,
        ledger: LedgerId,
    },

    #[error("Vehicle {id} is {status}, only available vehicles can be sold")]
    VehicleNotAvailable {
        id: VehicleId,
        status: VehicleStatus,
    },

    #[error("Ledger entry {id} is {status} and accepts no further settlement")]
    LedgerClosed {
        id: LedgerId,
        status: LedgerStatus,
    },

    #[error("Service order {0} is already completed")]
    ServiceOrderAlreadyCompleted(ServiceOrderId),

    // Collection Errors
    #[error("Negotiation {0} has no items")]
    EmptyNegotiation(NegotiationId),

    #[error("Service order {0} has no items")]
    EmptyServiceOrder(ServiceOrderId),

    // Funds Errors
    #[error("Insufficient funds in account {account}: available={available}, required={required}")]
    InsufficientFunds {
        account: String,
        available: Money,
        required: Money,
    },

    // Referential Errors
    #[error("Vehicle {id} is still referenced by {count} protected record(s)")]
    VehicleInUse {
        id: VehicleId,
        count: u32,
    },

    // Argument Errors
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(Money),

    #[error("Amount must not be negative, got {0}")]
    NegativeAmount(Money),

    #[error("Vehicle {vehicle} appears more than once in negotiation {negotiation}")]
    DuplicateNegotiationVehicle {
        negotiation: NegotiationId,
        vehicle: VehicleId,
    },

    #[error("Chassis {0} is already registered")]
    DuplicateChassis(String),

    #[error("Plate {0} is already registered")]
    DuplicatePlate(String),

    #[error("Document {0} is already registered")]
    DuplicateDocument(String),

    #[error("Chart code {0} is already registered")]
    DuplicateChartCode(String),

    #[error("Record {id} already exists in {table}")]
    AlreadyExists {
        table: &'static str,
        id: String,
    },

    #[error("Malformed id: {0}")]
    MalformedId(String),

    // Contention Errors
    #[error("Timed out waiting for lock on {resource} {id}")]
    Busy {
        resource: &'static str,
        id: String,
    },

    // System Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification used by the HTTP layer and by retry policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    EmptyCollection,
    InsufficientFunds,
    ReferentialConflict,
    InvalidArgument,
    Busy,
    Config,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::EmptyCollection => "empty_collection",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::ReferentialConflict => "referential_conflict",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::Busy => "busy",
            ErrorKind::Config => "config",
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::VehicleNotFound(_)
            | Error::NegotiationNotFound(_)
            | Error::LedgerNotFound(_)
            | Error::AccountNotFound(_)
            | Error::ServiceOrderNotFound(_)
            | Error::EntityNotFound(_)
            | Error::CategoryNotConfigured(_)
            | Error::StoreIdentityMissing(_) => ErrorKind::NotFound,

            Error::NegotiationNotDraft { .. }
            | Error::NegotiationAlreadyCanceled(_)
            | Error::NegotiationAlreadySettled { .. }
            | Error::VehicleNotAvailable { .. }
            | Error::LedgerClosed { .. }
            | Error::ServiceOrderAlreadyCompleted(_) => ErrorKind::InvalidState,

            Error::EmptyNegotiation(_) | Error::EmptyServiceOrder(_) => ErrorKind::EmptyCollection,

            Error::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,

            Error::VehicleInUse { .. } => ErrorKind::ReferentialConflict,

            Error::NonPositiveAmount(_)
            | Error::NegativeAmount(_)
            | Error::DuplicateNegotiationVehicle { .. }
            | Error::DuplicateChassis(_)
            | Error::DuplicatePlate(_)
            | Error::DuplicateDocument(_)
            | Error::DuplicateChartCode(_)
            | Error::AlreadyExists { .. }
            | Error::MalformedId(_) => ErrorKind::InvalidArgument,

            Error::Busy { .. } => ErrorKind::Busy,

            Error::ConfigError(_) => ErrorKind::Config,
        }
    }

    /// Only lock contention is worth retrying; every other failure is
    /// deterministic until the data changes.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Busy
    }
}

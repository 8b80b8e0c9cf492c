pub mod account;
pub mod chart;
pub mod ids;
pub mod ledger;
pub mod money;
pub mod negotiation;
pub mod party;
pub mod service_order;
pub mod vehicle;

use tracing::Span;
use tracing_subscriber::EnvFilter;

use crate::types::ids::{LedgerId, NegotiationId, ServiceOrderId};

/// Installs the process-wide subscriber: JSON lines, level from
/// `RUST_LOG`, `info` otherwise.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .init();
}

pub fn trace_approval(negotiation_id: &NegotiationId) -> Span {
    tracing::info_span!(
        "negotiation_approval",
        negotiation_id = %negotiation_id,
    )
}

pub fn trace_cancellation(negotiation_id: &NegotiationId) -> Span {
    tracing::info_span!(
        "negotiation_cancellation",
        negotiation_id = %negotiation_id,
    )
}

pub fn trace_settlement(ledger_id: &LedgerId) -> Span {
    tracing::info_span!(
        "ledger_settlement",
        ledger_id = %ledger_id,
    )
}

pub fn trace_completion(service_order_id: &ServiceOrderId) -> Span {
    tracing::info_span!(
        "service_order_completion",
        service_order_id = %service_order_id,
    )
}

pub fn trace_acquisition(chassis: &str) -> Span {
    tracing::info_span!(
        "vehicle_acquisition",
        chassis = %chassis,
    )
}

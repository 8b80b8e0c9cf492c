use lazy_static::lazy_static;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Negotiation metrics
    pub static ref NEGOTIATIONS_APPROVED: IntCounter = IntCounter::new(
        "negotiations_approved_total",
        "Total number of negotiations approved"
    ).unwrap();

    pub static ref NEGOTIATIONS_CANCELED: IntCounter = IntCounter::new(
        "negotiations_canceled_total",
        "Total number of negotiations canceled"
    ).unwrap();

    // Financial metrics
    pub static ref LEDGERS_SETTLED: IntCounter = IntCounter::new(
        "ledgers_settled_total",
        "Total number of settlement payments recorded"
    ).unwrap();

    pub static ref SETTLED_VOLUME_CENTS: IntCounter = IntCounter::new(
        "settled_volume_cents_total",
        "Total settled volume in cents"
    ).unwrap();

    // Maintenance metrics
    pub static ref SERVICE_ORDERS_COMPLETED: IntCounter = IntCounter::new(
        "service_orders_completed_total",
        "Total number of service orders completed"
    ).unwrap();

    // Inventory metrics
    pub static ref VEHICLES_REGISTERED: IntCounter = IntCounter::new(
        "vehicles_registered_total",
        "Total number of vehicles registered into stock"
    ).unwrap();

    // Rejections across all engines, labeled by operation and error kind
    pub static ref OPERATIONS_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "operations_rejected_total",
            "Total number of rejected operations"
        ),
        &["operation", "kind"]
    ).unwrap();

    // Latency metrics
    pub static ref SETTLEMENT_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "settlement_latency_seconds",
            "Ledger settlement latency"
        ).buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1])
    ).unwrap();

    pub static ref APPROVAL_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "approval_latency_seconds",
            "Negotiation approval latency"
        ).buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1])
    ).unwrap();
}

pub fn register_metrics() {
    REGISTRY.register(Box::new(NEGOTIATIONS_APPROVED.clone())).unwrap();
    REGISTRY.register(Box::new(NEGOTIATIONS_CANCELED.clone())).unwrap();
    REGISTRY.register(Box::new(LEDGERS_SETTLED.clone())).unwrap();
    REGISTRY.register(Box::new(SETTLED_VOLUME_CENTS.clone())).unwrap();
    REGISTRY.register(Box::new(SERVICE_ORDERS_COMPLETED.clone())).unwrap();
    REGISTRY.register(Box::new(VEHICLES_REGISTERED.clone())).unwrap();
    REGISTRY.register(Box::new(OPERATIONS_REJECTED.clone())).unwrap();
    REGISTRY.register(Box::new(SETTLEMENT_LATENCY.clone())).unwrap();
    REGISTRY.register(Box::new(APPROVAL_LATENCY.clone())).unwrap();
}

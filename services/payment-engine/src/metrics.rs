use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

lazy_static! {
    // Ledger metrics
    pub static ref PAYMENTS_CREATED: IntCounter = IntCounter::new(
        "payments_created_total",
        "Total payments recorded in the ledger"
    ).expect("metric can be created");

    pub static ref PAYMENTS_COMPLETED: IntCounter = IntCounter::new(
        "payments_completed_total",
        "Total payments that transitioned into completed"
    ).expect("metric can be created");

    pub static ref PAYMENTS_FAILED: IntCounter = IntCounter::new(
        "payments_failed_total",
        "Total payments that transitioned into failed"
    ).expect("metric can be created");
}

/// Register all metrics with the given registry
pub fn register_metrics(registry: &Registry) -> Result<(), Box<dyn std::error::Error>> {
    registry.register(Box::new(PAYMENTS_CREATED.clone()))?;
    registry.register(Box::new(PAYMENTS_COMPLETED.clone()))?;
    registry.register(Box::new(PAYMENTS_FAILED.clone()))?;
    Ok(())
}

/// Generate metrics output in Prometheus text format
pub fn metrics_handler() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

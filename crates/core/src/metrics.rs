//! Prometheus metrics for the pipeline.

use once_cell::sync::Lazy;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
};

/// Batch items by terminal state.
pub static ITEMS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("imagehaul_items_total", "Batch items by terminal state"),
        &["result"], // "recorded", "skipped", "failed"
    )
    .unwrap()
});

/// Upload duration in seconds, per backend.
pub static UPLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("imagehaul_upload_duration_seconds", "Upload duration")
            .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["backend"],
    )
    .unwrap()
});

/// Raw bytes fetched for locally optimized items.
pub static BYTES_IN_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("imagehaul_bytes_in_total", "Raw source bytes processed").unwrap()
});

/// Optimized bytes uploaded for locally optimized items.
pub static BYTES_OUT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("imagehaul_bytes_out_total", "Optimized bytes uploaded").unwrap()
});

/// Description generations by status.
pub static DESCRIPTIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "imagehaul_descriptions_total",
            "Description generations by status",
        ),
        &["status"], // "complete", "pending", "failed"
    )
    .unwrap()
});

/// Register all pipeline metrics on the given registry.
pub fn register_all(registry: &Registry) -> Result<(), prometheus::Error> {
    registry.register(Box::new(ITEMS_TOTAL.clone()))?;
    registry.register(Box::new(UPLOAD_DURATION.clone()))?;
    registry.register(Box::new(BYTES_IN_TOTAL.clone()))?;
    registry.register(Box::new(BYTES_OUT_TOTAL.clone()))?;
    registry.register(Box::new(DESCRIPTIONS_TOTAL.clone()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all() {
        let registry = Registry::new();
        register_all(&registry).unwrap();

        ITEMS_TOTAL.with_label_values(&["recorded"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "imagehaul_items_total"));
    }
}

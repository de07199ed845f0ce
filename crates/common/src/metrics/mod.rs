//! Metrics and observability utilities
//!
//! Thin helpers over the `metrics` facade. Nothing is exported unless the
//! binary installs a recorder (Prometheus, see `refgraph` main).

use crate::store::LoadReport;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use std::time::Instant;

/// Metrics prefix for all RefGraph metrics
pub const METRICS_PREFIX: &str = "refgraph";

/// Buckets for traversal and assembly latency (in seconds)
pub const STAGE_BUCKETS: &[f64] = &[
    0.001, // 1ms
    0.005, // 5ms
    0.010, // 10ms
    0.050, // 50ms
    0.100, // 100ms
    0.500, // 500ms
    1.000, // 1s
    5.000, // 5s
    30.00, // 30s
];

/// Register all metric descriptions
pub fn register_metrics() {
    describe_counter!(
        format!("{}_traversals_total", METRICS_PREFIX),
        Unit::Count,
        "Total reference tree traversals"
    );

    describe_histogram!(
        format!("{}_traversal_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Reference tree traversal latency in seconds"
    );

    describe_gauge!(
        format!("{}_traversal_visited", METRICS_PREFIX),
        Unit::Count,
        "Papers visited by the last traversal"
    );

    describe_gauge!(
        format!("{}_traversal_missing", METRICS_PREFIX),
        Unit::Count,
        "Referenced papers absent from the local store in the last traversal"
    );

    describe_counter!(
        format!("{}_rejected_references_total", METRICS_PREFIX),
        Unit::Count,
        "References dropped at load because their identifier could not be normalized"
    );

    describe_histogram!(
        format!("{}_assembly_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Graph assembly latency in seconds"
    );

    describe_counter!(
        format!("{}_assembly_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Graph assemblies rejected by integrity checks"
    );

    describe_gauge!(
        format!("{}_store_records", METRICS_PREFIX),
        Unit::Count,
        "Records held by the metadata store"
    );

    describe_histogram!(
        format!("{}_store_load_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Metadata store load latency in seconds"
    );

    describe_counter!(
        format!("{}_store_files_skipped_total", METRICS_PREFIX),
        Unit::Count,
        "Journal data files skipped during load"
    );

    tracing::info!("Metrics registered");
}

/// Times one pipeline stage
pub struct StageTimer {
    start: Instant,
}

impl StageTimer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds since the timer started
    pub fn elapsed_secs(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }
}

/// Helper to record traversal metrics
pub fn record_traversal(duration_secs: f64, visited: usize, missing: usize) {
    counter!(format!("{}_traversals_total", METRICS_PREFIX)).increment(1);

    histogram!(format!("{}_traversal_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    gauge!(format!("{}_traversal_visited", METRICS_PREFIX)).set(visited as f64);
    gauge!(format!("{}_traversal_missing", METRICS_PREFIX)).set(missing as f64);
}

/// Helper to record assembly metrics
pub fn record_assembly(duration_secs: f64, success: bool) {
    let status = if success { "success" } else { "error" };

    histogram!(
        format!("{}_assembly_duration_seconds", METRICS_PREFIX),
        "status" => status.to_string()
    )
    .record(duration_secs);

    if !success {
        counter!(format!("{}_assembly_errors_total", METRICS_PREFIX)).increment(1);
    }
}

/// Helper to record metadata store load metrics
pub fn record_store_load(duration_secs: f64, report: &LoadReport) {
    gauge!(format!("{}_store_records", METRICS_PREFIX)).set(report.records_loaded as f64);

    histogram!(format!("{}_store_load_duration_seconds", METRICS_PREFIX)).record(duration_secs);

    counter!(format!("{}_store_files_skipped_total", METRICS_PREFIX))
        .increment(report.files_skipped as u64);

    counter!(format!("{}_rejected_references_total", METRICS_PREFIX))
        .increment(report.rejected_references as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_buckets_sorted() {
        let mut prev = 0.0;
        for &bucket in STAGE_BUCKETS {
            assert!(bucket > prev);
            prev = bucket;
        }
    }

    #[test]
    fn test_helpers_without_recorder() {
        let timer = StageTimer::start();
        record_traversal(timer.elapsed_secs(), 3, 1);
        record_assembly(timer.elapsed_secs(), false);
        record_store_load(timer.elapsed_secs(), &LoadReport::default());
        // No recorder installed, just verify it runs without panic
    }
}

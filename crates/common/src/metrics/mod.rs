//! Metrics and observability utilities
//!
//! Prometheus-style metrics for each pipeline stage with standardized naming
//! conventions. Recording is a no-op until a recorder is installed.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

/// Metrics prefix for all Citewise metrics
pub const METRICS_PREFIX: &str = "citewise";

/// Histogram buckets for model and embedding latency (in seconds)
pub const MODEL_LATENCY_BUCKETS: &[f64] = &[
    0.050,  // 50ms
    0.100,  // 100ms
    0.250,  // 250ms
    0.500,  // 500ms
    1.000,  // 1s
    2.500,  // 2.5s
    5.000,  // 5s
    10.00,  // 10s
    30.00,  // 30s
    60.00,  // 60s
    120.0,  // 2min
];

/// Register all metric descriptions
pub fn register_metrics() {
    // Curation metrics
    describe_counter!(
        format!("{}_chunks_accepted_total", METRICS_PREFIX),
        Unit::Count,
        "Chunks that passed curation"
    );

    describe_counter!(
        format!("{}_chunks_rejected_total", METRICS_PREFIX),
        Unit::Count,
        "Chunks rejected by curation, by reason"
    );

    // Index metrics
    describe_histogram!(
        format!("{}_index_build_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Corpus index build latency in seconds"
    );

    describe_gauge!(
        format!("{}_index_entries", METRICS_PREFIX),
        Unit::Count,
        "Number of entries in the active index"
    );

    // Retrieval metrics
    describe_counter!(
        format!("{}_retrieval_queries_total", METRICS_PREFIX),
        Unit::Count,
        "Total number of retrieval queries"
    );

    describe_histogram!(
        format!("{}_retrieval_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Retrieval latency in seconds"
    );

    describe_gauge!(
        format!("{}_retrieval_results_count", METRICS_PREFIX),
        Unit::Count,
        "Number of chunks returned from retrieval"
    );

    // Embedding metrics
    describe_counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        Unit::Count,
        "Total embedding API requests"
    );

    describe_histogram!(
        format!("{}_embedding_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Embedding generation latency in seconds"
    );

    describe_counter!(
        format!("{}_embedding_errors_total", METRICS_PREFIX),
        Unit::Count,
        "Total embedding API errors"
    );

    // Synthesis metrics
    describe_counter!(
        format!("{}_synthesis_attempts_total", METRICS_PREFIX),
        Unit::Count,
        "Language model calls made by the synthesizer"
    );

    describe_histogram!(
        format!("{}_synthesis_duration_seconds", METRICS_PREFIX),
        Unit::Seconds,
        "Language model call latency in seconds"
    );

    describe_counter!(
        format!("{}_schema_parse_failures_total", METRICS_PREFIX),
        Unit::Count,
        "Responses that did not match the answer schema"
    );

    describe_counter!(
        format!("{}_insufficient_evidence_total", METRICS_PREFIX),
        Unit::Count,
        "Answers reporting insufficient evidence"
    );

    tracing::info!("Metrics registered");
}

/// Helper to record curation results
pub fn record_curation(accepted: usize, rejected_by_reason: &[(&'static str, usize)]) {
    counter!(format!("{}_chunks_accepted_total", METRICS_PREFIX)).increment(accepted as u64);

    for (reason, count) in rejected_by_reason {
        counter!(
            format!("{}_chunks_rejected_total", METRICS_PREFIX),
            "reason" => *reason
        )
        .increment(*count as u64);
    }
}

/// Helper to record an index build
pub fn record_index_build(duration_secs: f64, entries: usize) {
    histogram!(format!("{}_index_build_duration_seconds", METRICS_PREFIX)).record(duration_secs);
    gauge!(format!("{}_index_entries", METRICS_PREFIX)).set(entries as f64);
}

/// Helper to record retrieval metrics
pub fn record_retrieval(duration_secs: f64, result_count: usize) {
    counter!(format!("{}_retrieval_queries_total", METRICS_PREFIX)).increment(1);
    histogram!(format!("{}_retrieval_duration_seconds", METRICS_PREFIX)).record(duration_secs);
    gauge!(format!("{}_retrieval_results_count", METRICS_PREFIX)).set(result_count as f64);
}

/// Helper to record embedding metrics
pub fn record_embedding(duration_secs: f64, model: &str, batch_size: usize, success: bool) {
    let status = if success { "success" } else { "error" };

    counter!(
        format!("{}_embedding_requests_total", METRICS_PREFIX),
        "model" => model.to_string(),
        "status" => status
    )
    .increment(1);

    if success {
        histogram!(
            format!("{}_embedding_duration_seconds", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .record(duration_secs);
        tracing::trace!(model, batch_size, duration_secs, "Embedding batch complete");
    } else {
        counter!(
            format!("{}_embedding_errors_total", METRICS_PREFIX),
            "model" => model.to_string()
        )
        .increment(1);
    }
}

/// Helper to record one synthesis attempt
pub fn record_synthesis_attempt(duration_secs: f64, model: &str, parsed: bool) {
    counter!(
        format!("{}_synthesis_attempts_total", METRICS_PREFIX),
        "model" => model.to_string()
    )
    .increment(1);

    histogram!(
        format!("{}_synthesis_duration_seconds", METRICS_PREFIX),
        "model" => model.to_string()
    )
    .record(duration_secs);

    if !parsed {
        counter!(format!("{}_schema_parse_failures_total", METRICS_PREFIX)).increment(1);
    }
}

/// Helper to record an insufficient-evidence answer
pub fn record_insufficient_evidence() {
    counter!(format!("{}_insufficient_evidence_total", METRICS_PREFIX)).increment(1);
}

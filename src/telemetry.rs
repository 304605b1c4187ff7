//! Telemetry metric name constants.
//!
//! Centralised metric names for agrogate operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `agrogate_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `kind` — prediction kind ("crop", "fertilizer", "yield")
//! - `status` — outcome: "ok" or "error"

/// Total prediction requests dispatched through the pipeline.
///
/// Labels: `kind`, `status` ("ok" | "error").
pub const PREDICTIONS_TOTAL: &str = "agrogate_predictions_total";

/// Prediction duration in seconds, codec through model inference.
///
/// Labels: `kind`.
pub const PREDICTION_DURATION_SECONDS: &str = "agrogate_prediction_duration_seconds";

/// Total prediction records that failed to persist.
///
/// Persistence is best-effort; failures never surface to the caller,
/// so this counter is where they stay visible.
///
/// Labels: `collection`.
pub const RECORD_FAILURES_TOTAL: &str = "agrogate_record_failures_total";

/// Total advisor requests sent to the generative API.
///
/// Labels: `status` ("ok" | "error").
pub const ADVISOR_REQUESTS_TOTAL: &str = "agrogate_advisor_requests_total";

/// Total advisor reply cache hits.
pub const CACHE_HITS_TOTAL: &str = "agrogate_cache_hits_total";

/// Total advisor reply cache misses.
pub const CACHE_MISSES_TOTAL: &str = "agrogate_cache_misses_total";

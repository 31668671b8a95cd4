//! Lightweight metrics helpers for Atrium.
//!
//! This module exposes a small set of convenience functions and an RAII timer
//! wrapping the `metrics` crate macros. It intentionally avoids embedding a
//! concrete exporter (the application can initialize any compatible recorder
//! externally) while still documenting and describing Atrium-specific metric
//! names.
//!
//! Provided metrics (labels vary by family):
//! * `atrium_requests_total` (counter)
//! * `atrium_request_duration_seconds` (histogram)
//! * `atrium_route_not_found_total` (counter)
//! * `atrium_unauthorized_total` (counter)
//! * `atrium_legacy_public_path_total` (counter) - the deprecation signal for
//!   the legacy public-path allow-list
//!
//! The timer struct leverages `Drop` to record durations safely even when
//! early returns or errors occur.
use std::time::Instant;

use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::Lazy;

pub const ATRIUM_REQUESTS_TOTAL: &str = "atrium_requests_total";
pub const ATRIUM_REQUEST_DURATION_SECONDS: &str = "atrium_request_duration_seconds";
pub const ATRIUM_ROUTE_NOT_FOUND_TOTAL: &str = "atrium_route_not_found_total";
pub const ATRIUM_UNAUTHORIZED_TOTAL: &str = "atrium_unauthorized_total";
pub const ATRIUM_LEGACY_PUBLIC_PATH_TOTAL: &str = "atrium_legacy_public_path_total";

static DESCRIBE: Lazy<()> = Lazy::new(|| {
    describe_counter!(
        ATRIUM_REQUESTS_TOTAL,
        Unit::Count,
        "Total number of HTTP requests processed by the pipeline."
    );
    describe_histogram!(
        ATRIUM_REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Latency of HTTP requests processed by the pipeline."
    );
    describe_counter!(
        ATRIUM_ROUTE_NOT_FOUND_TOTAL,
        Unit::Count,
        "Requests aborted because no route matched the path."
    );
    describe_counter!(
        ATRIUM_UNAUTHORIZED_TOTAL,
        Unit::Count,
        "Requests aborted by the authentication gate."
    );
    describe_counter!(
        ATRIUM_LEGACY_PUBLIC_PATH_TOTAL,
        Unit::Count,
        "Routes allowed via the deprecated public-path allow-list."
    );
});

/// Increment the total request counter for a completed request.
pub fn increment_request_total(path: &str, method: &str, status: u16) {
    counter!(
        ATRIUM_REQUESTS_TOTAL,
        "path" => path.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record a completed request's duration.
pub fn record_request_duration(path: &str, method: &str, duration: std::time::Duration) {
    histogram!(
        ATRIUM_REQUEST_DURATION_SECONDS,
        "path" => path.to_string(),
        "method" => method.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Count a request aborted because no route matched.
pub fn increment_route_not_found(path: &str) {
    counter!(ATRIUM_ROUTE_NOT_FOUND_TOTAL, "path" => path.to_string()).increment(1);
}

/// Count a request aborted by the authentication gate.
pub fn increment_unauthorized(path: &str) {
    counter!(ATRIUM_UNAUTHORIZED_TOTAL, "path" => path.to_string()).increment(1);
}

/// Deprecation signal: a route was allowed via the legacy public-path
/// allow-list instead of a declared `access` option.
pub fn increment_legacy_public_path(path: &str) {
    counter!(ATRIUM_LEGACY_PUBLIC_PATH_TOTAL, "path" => path.to_string()).increment(1);
}

/// RAII helper measuring request duration.
pub struct RequestTimer {
    start: Instant,
    path: String,
    method: String,
}

impl RequestTimer {
    pub fn new(path: &str, method: &str) -> Self {
        Self {
            start: Instant::now(),
            path: path.to_string(),
            method: method.to_string(),
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        record_request_duration(&self.path, &self.method, self.start.elapsed());
    }
}

/// Initialize metric descriptions (idempotent).
pub fn init_metrics() {
    Lazy::force(&DESCRIBE);
    tracing::info!("Atrium metrics descriptions registered");
}

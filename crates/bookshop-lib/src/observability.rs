//! Prometheus metrics for the synchronization layer

use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};
use std::sync::OnceLock;

/// Histogram buckets for request latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<Option<SyncMetricsInner>> = OnceLock::new();

struct SyncMetricsInner {
    requests_total: IntCounterVec,
    request_latency_seconds: HistogramVec,
    cache_hits: IntCounter,
    dropped_responses: IntCounter,
}

impl SyncMetricsInner {
    fn register() -> prometheus::Result<Self> {
        Ok(Self {
            requests_total: register_int_counter_vec!(
                "bookshop_requests_total",
                "REST requests issued by the synchronization service",
                &["operation", "outcome"]
            )?,
            request_latency_seconds: register_histogram_vec!(
                "bookshop_request_latency_seconds",
                "Time from issuing a request until its outcome is known",
                &["operation"],
                LATENCY_BUCKETS.to_vec()
            )?,
            cache_hits: register_int_counter!(
                "bookshop_cache_hits_total",
                "Fetch-by-id calls served from the identity cache"
            )?,
            dropped_responses: register_int_counter!(
                "bookshop_dropped_responses_total",
                "Fetch-by-id responses dropped for a missing body or ETag"
            )?,
        })
    }
}

/// Lightweight handle to the global metrics.
///
/// If registration fails (e.g. a name clash in the default registry) the
/// handle records nothing.
#[derive(Clone)]
pub struct SyncMetrics {
    _private: (),
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(|| match SyncMetricsInner::register() {
            Ok(inner) => Some(inner),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to register metrics");
                None
            }
        });
        Self { _private: () }
    }

    fn inner(&self) -> Option<&SyncMetricsInner> {
        GLOBAL_METRICS.get().and_then(|m| m.as_ref())
    }

    /// Record the outcome of one request
    pub fn record_request(&self, operation: &str, outcome: &str, duration_secs: f64) {
        if let Some(inner) = self.inner() {
            inner
                .requests_total
                .with_label_values(&[operation, outcome])
                .inc();
            inner
                .request_latency_seconds
                .with_label_values(&[operation])
                .observe(duration_secs);
        }
    }

    pub fn inc_cache_hits(&self) {
        if let Some(inner) = self.inner() {
            inner.cache_hits.inc();
        }
    }

    pub fn inc_dropped_responses(&self) {
        if let Some(inner) = self.inner() {
            inner.dropped_responses.inc();
        }
    }

    pub fn cache_hits(&self) -> u64 {
        self.inner().map(|m| m.cache_hits.get()).unwrap_or(0)
    }

    pub fn dropped_responses(&self) -> u64 {
        self.inner().map(|m| m.dropped_responses.get()).unwrap_or(0)
    }

    pub fn requests(&self, operation: &str, outcome: &str) -> u64 {
        self.inner()
            .map(|m| m.requests_total.with_label_values(&[operation, outcome]).get())
            .unwrap_or(0)
    }

    /// Prometheus text exposition of the default registry
    pub fn encode_text() -> String {
        use prometheus::{Encoder, TextEncoder};

        let mut buffer = Vec::new();
        if TextEncoder::new()
            .encode(&prometheus::gather(), &mut buffer)
            .is_err()
        {
            return String::new();
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increase() {
        let metrics = SyncMetrics::new();
        let before = metrics.requests("find", "delivered");
        metrics.record_request("find", "delivered", 0.01);
        assert!(metrics.requests("find", "delivered") > before);

        let hits = metrics.cache_hits();
        metrics.inc_cache_hits();
        assert!(metrics.cache_hits() > hits);
    }

    #[test]
    fn test_exposition_contains_metric_names() {
        let metrics = SyncMetrics::new();
        metrics.inc_dropped_responses();
        assert!(SyncMetrics::encode_text().contains("bookshop_dropped_responses_total"));
    }
}

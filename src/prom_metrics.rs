//! # Prometheus Metrics
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `bulkvm_http_request_duration_seconds` | Histogram | `method`, `path` | Request latency |
//! | `bulkvm_setting_writes_total` | Counter | `outcome` | Applied (product, setting) writes |
//!
//! Paths are normalized before labelling (`/api/groups/:id/preview`) to keep
//! cardinality bounded. `/metrics` renders the registry on each scrape.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct HttpLabel {
    pub method: String,
    pub path: String,
}

/// `success` or `error`, one increment per attempted write during apply.
#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct OutcomeLabel {
    pub outcome: String,
}

type HistogramFamily = Family<HttpLabel, Histogram, fn() -> Histogram>;

fn request_histogram() -> Histogram {
    Histogram::new(exponential_buckets(0.005, 2.0, 12))
}

pub struct Metrics {
    pub registry: Registry,
    pub http_request_duration: HistogramFamily,
    pub setting_writes: Family<OutcomeLabel, Counter>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let http_request_duration =
            HistogramFamily::new_with_constructor(request_histogram as fn() -> Histogram);
        registry.register(
            "bulkvm_http_request_duration_seconds",
            "HTTP request latency by method and normalized path",
            http_request_duration.clone(),
        );

        let setting_writes = Family::<OutcomeLabel, Counter>::default();
        registry.register(
            "bulkvm_setting_writes",
            "Product setting writes attempted during apply, by outcome",
            setting_writes.clone(),
        );

        Self {
            registry,
            http_request_duration,
            setting_writes,
        }
    }

    /// Count the outcome of one apply run.
    pub fn record_apply(&self, success: usize, errors: usize) {
        self.setting_writes
            .get_or_create(&OutcomeLabel {
                outcome: "success".to_string(),
            })
            .inc_by(success as u64);
        self.setting_writes
            .get_or_create(&OutcomeLabel {
                outcome: "error".to_string(),
            })
            .inc_by(errors as u64);
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = String::new();
        if encode(&mut buf, &self.registry).is_err() {
            buf.clear();
        }
        buf
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_outcomes_are_counted_separately() {
        let m = Metrics::new();
        m.record_apply(5, 1);
        m.record_apply(2, 0);

        let output = m.encode();
        assert!(output.contains("bulkvm_setting_writes_total{outcome=\"success\"} 7"));
        assert!(output.contains("bulkvm_setting_writes_total{outcome=\"error\"} 1"));
    }

    #[test]
    fn request_histogram_is_registered() {
        let m = Metrics::new();
        m.http_request_duration
            .get_or_create(&HttpLabel {
                method: "GET".into(),
                path: "/api/groups".into(),
            })
            .observe(0.02);
        let output = m.encode();
        assert!(output.contains("bulkvm_http_request_duration_seconds"));
        assert!(output.contains("/api/groups"));
    }
}

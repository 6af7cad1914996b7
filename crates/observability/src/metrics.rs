//! Prometheus metrics for the gateway.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `http_requests_total` | Counter | `method`, `status` |
//! | `http_requests_in_flight` | Gauge | |
//! | `auth_rejections_total` | Counter | `reason` |

use prometheus::{CounterVec, Encoder, IntGauge, Opts, Registry, TextEncoder};
use thiserror::Error;

/// Longest label value kept; longer values are truncated so a client cannot
/// blow up series cardinality with long strings.
pub const MAX_LABEL_VALUE_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    RegistrationFailed(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    EncodingFailed(String),
}

pub type MetricsResult<T> = Result<T, MetricsError>;

/// Request and edge-authorization counters.
#[derive(Clone)]
pub struct HttpMetrics {
    requests_total: CounterVec,
    requests_in_flight: IntGauge,
    auth_rejections_total: CounterVec,
}

impl HttpMetrics {
    pub fn new(registry: &Registry) -> MetricsResult<Self> {
        let requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests served"),
            &["method", "status"],
        )?;
        registry.register(Box::new(requests_total.clone()))?;

        let requests_in_flight = IntGauge::new(
            "http_requests_in_flight",
            "HTTP requests currently being served",
        )?;
        registry.register(Box::new(requests_in_flight.clone()))?;

        let auth_rejections_total = CounterVec::new(
            Opts::new(
                "auth_rejections_total",
                "Requests rejected by the edge authorization guard",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(auth_rejections_total.clone()))?;

        Ok(Self {
            requests_total,
            requests_in_flight,
            auth_rejections_total,
        })
    }

    /// Counts the request as in flight until the returned guard is dropped,
    /// whether the request completed or its future was abandoned.
    pub fn request_started(&self) -> InFlightRequest {
        self.requests_in_flight.inc();
        InFlightRequest {
            gauge: self.requests_in_flight.clone(),
        }
    }

    pub fn request_finished(&self, method: &str, status: u16) {
        let status = status.to_string();
        self.requests_total
            .with_label_values(&[truncate_label(method), status.as_str()])
            .inc();
    }

    pub fn auth_rejected(&self, reason: &str) {
        self.auth_rejections_total
            .with_label_values(&[truncate_label(reason)])
            .inc();
    }

    #[must_use]
    pub fn request_count(&self, method: &str, status: u16) -> f64 {
        let status = status.to_string();
        self.requests_total
            .with_label_values(&[truncate_label(method), status.as_str()])
            .get()
    }

    #[must_use]
    pub fn in_flight(&self) -> i64 {
        self.requests_in_flight.get()
    }

    #[must_use]
    pub fn rejection_count(&self, reason: &str) -> f64 {
        self.auth_rejections_total
            .with_label_values(&[truncate_label(reason)])
            .get()
    }
}

/// Holds one slot of `http_requests_in_flight`.
#[must_use = "dropping the guard ends the request immediately"]
pub struct InFlightRequest {
    gauge: IntGauge,
}

impl Drop for InFlightRequest {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// Owns the Prometheus registry and the metric families registered in it.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,
    http: HttpMetrics,
}

impl MetricsRegistry {
    pub fn new() -> MetricsResult<Self> {
        let registry = Registry::new();
        let http = HttpMetrics::new(&registry)?;
        Ok(Self { registry, http })
    }

    #[must_use]
    pub const fn http(&self) -> &HttpMetrics {
        &self.http
    }

    /// Render every registered family in the Prometheus text format.
    pub fn encode_text(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&families, &mut buffer)
            .map_err(|e| MetricsError::EncodingFailed(e.to_string()))?;
        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingFailed(e.to_string()))
    }
}

fn truncate_label(value: &str) -> &str {
    if value.len() <= MAX_LABEL_VALUE_LEN {
        return value;
    }
    let mut end = MAX_LABEL_VALUE_LEN;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

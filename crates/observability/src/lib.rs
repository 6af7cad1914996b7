//! Logging and metrics setup shared by both services.

pub mod logging;
pub mod metrics;

pub use logging::LogFormat;
pub use metrics::{HttpMetrics, InFlightRequest, MetricsError, MetricsRegistry, MetricsResult};

/// Initialize process-wide logging.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init(format: LogFormat) {
    logging::init(format);
}

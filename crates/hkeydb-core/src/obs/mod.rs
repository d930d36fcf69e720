//! Observability: runtime telemetry (metrics) and sink abstractions.
//!
//! Cursors report lifecycle and storage activity here instead of logging.
//! This module does not access storage internals directly.

pub(crate) mod metrics;
pub(crate) mod sink;


// re-exports
pub use metrics::{EventOps, EventReport, OperatorCounters};
pub use sink::{
    MetricsEvent, MetricsSink, OperatorKind, metrics_report, metrics_reset_all, with_metrics_sink,
};

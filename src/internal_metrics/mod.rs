//! # Internal Metrics Module
//!
//! Metric names and the handle the rest of the application records through.
//!
//! ## Components:
//!
//! - **`Metrics`**: A lightweight, cloneable handle with one method per
//!   metric the application emits. Everything goes through the `metrics`
//!   facade, so whichever recorder is installed (globally or locally in
//!   tests) receives the values.
//!
//! - **`LoggingRecorder`**: (Defined in `logging_recorder.rs`) A recorder
//!   that periodically logs every counter and gauge it has seen.

pub mod logging_recorder;

use crate::core::ExternalProvider;
use metrics::Unit;

/// Counter incremented once per bootstrap that ran the full sequence.
pub const BOOTSTRAPS_TOTAL: &str = "bootstraps_total";

/// Name of the completion counter for a notification routing key.
pub fn notifications_sent_metric(metrics_key: &str) -> String {
    format!("{}.notifications.sent", metrics_key)
}

/// The public API for the metrics system.
#[derive(Clone, Default)]
pub struct Metrics {
    _private: (),
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

impl Metrics {
    /// Creates a new `Metrics` handle and registers descriptions for the
    /// fixed metric names with the current recorder.
    pub fn new() -> Self {
        metrics::describe_counter!(
            BOOTSTRAPS_TOTAL,
            Unit::Count,
            "Number of times the bootstrap sequence ran to completion."
        );
        Self { _private: () }
    }

    /// Records that a notification finished dispatching through `provider`.
    ///
    /// `skip_internal` is always false: these counters are also forwarded
    /// to the internal metrics backend.
    pub fn increment_notifications_sent(&self, provider: ExternalProvider, metrics_key: &str) {
        metrics::counter!(
            notifications_sent_metric(metrics_key),
            "instance" => format!("{}.{}.notification", provider, metrics_key),
            "skip_internal" => "false"
        )
        .increment(1);
    }

    /// Records a completed bootstrap.
    pub fn increment_bootstraps(&self) {
        metrics::counter!(BOOTSTRAPS_TOTAL).increment(1);
    }
}

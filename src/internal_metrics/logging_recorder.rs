//! A metrics recorder that periodically logs all captured metrics.

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use metrics_util::registry::{AtomicStorage, Registry};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A metrics recorder that logs a snapshot of its counters and gauges on
/// a fixed interval.
///
/// Clones share the same registry, so one clone can be installed as the
/// recorder while another spawns the logging task later.
#[derive(Clone)]
pub struct LoggingRecorder {
    registry: Arc<Registry<Key, AtomicStorage>>,
}

/// Renders a key as `name{label=value,...}`.
fn render_key(key: &Key) -> String {
    let labels: Vec<String> = key
        .labels()
        .map(|label| format!("{}={}", label.key(), label.value()))
        .collect();
    if labels.is_empty() {
        key.name().to_string()
    } else {
        format!("{}{{{}}}", key.name(), labels.join(","))
    }
}

impl LoggingRecorder {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Registry::new(AtomicStorage)),
        }
    }

    /// Spawns the task that logs a snapshot every `interval`.
    ///
    /// The task stops when `shutdown_rx` changes or its sender is dropped.
    /// Must be called from within a tokio runtime.
    pub fn spawn_logger(
        &self,
        interval: Duration,
        mut shutdown_rx: watch::Receiver<()>,
    ) -> JoinHandle<()> {
        let registry = self.registry.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => Self::log_snapshot(&registry),
                    _ = shutdown_rx.changed() => {
                        Self::log_snapshot(&registry);
                        debug!("Metrics logging task received shutdown signal.");
                        break;
                    }
                }
            }
        })
    }

    fn log_snapshot(registry: &Registry<Key, AtomicStorage>) {
        for (key, counter) in registry.get_counter_handles() {
            info!("[Counter] {}: {}", render_key(&key), counter.load(Ordering::Relaxed));
        }
        for (key, gauge) in registry.get_gauge_handles() {
            let value = f64::from_bits(gauge.load(Ordering::Relaxed));
            info!("[Gauge] {}: {}", render_key(&key), value);
        }
    }

    /// Current value of a counter, if it has been registered.
    pub fn counter_value(&self, key: &Key) -> Option<u64> {
        self.registry
            .get_counter_handles()
            .get(key)
            .map(|counter| counter.load(Ordering::Relaxed))
    }
}

impl Default for LoggingRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder for LoggingRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
        self.registry.get_or_create_counter(key, |c| c.clone()).into()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        self.registry.get_or_create_gauge(key, |g| g.clone()).into()
    }

    // Histograms are not logged.
    fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}

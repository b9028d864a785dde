//! Metrics collection and export for object pools

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Consistent view of the coordinator-owned counts, taken inside the
/// coordinator loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Objects constructed and not yet destroyed
    pub live: usize,

    /// Objects waiting in the idle queue
    pub idle: usize,

    /// Callers parked until an object frees up
    pub waiting: usize,
}

impl PoolStatus {
    /// Objects currently checked out by callers
    pub fn outstanding(&self) -> usize {
        self.live - self.idle
    }
}

/// Metrics data for a pool
///
/// Gauges are published by the coordinator after every event it handles, so
/// they may trail the pool by one event. Use
/// [`CommonPool::status`](crate::CommonPool::status) for an exact snapshot.
///
/// # Examples
///
/// ```
/// use gompool::{CommonPool, DefaultPooledObjectFactory, PoolConfiguration};
///
/// let pool = CommonPool::new(
///     DefaultPooledObjectFactory::new(|| vec![0u8; 16]),
///     PoolConfiguration::default(),
/// )
/// .unwrap();
///
/// let buf = pool.get().unwrap();
/// pool.put(buf).unwrap();
///
/// let metrics = pool.metrics();
/// assert_eq!(metrics.total_retrieved, 1);
/// assert_eq!(metrics.total_returned, 1);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PoolMetrics {
    /// Objects constructed and not yet destroyed
    pub live_objects: usize,

    /// Objects sitting in the idle queue
    pub idle_objects: usize,

    /// Objects checked out by callers
    pub active_objects: usize,

    /// Callers parked waiting for an object
    pub waiting_requests: usize,

    /// Objects ever constructed
    pub total_created: usize,

    /// Objects ever destroyed, for any reason
    pub total_destroyed: usize,

    /// Objects destroyed by eviction sweeps
    pub total_evicted: usize,

    /// Objects handed to callers
    pub total_retrieved: usize,

    /// Objects put back by callers
    pub total_returned: usize,

    /// Objects rejected by a validation gate
    pub validation_failures: usize,

    /// Bounded waits that expired
    pub timeouts: usize,

    /// Non-blocking gets that found the pool exhausted
    pub exhausted_events: usize,

    /// Active objects over maximum size (0.0 to 1.0)
    pub utilization: f64,

    /// Hard cap on live objects
    pub max_size: usize,
}

impl PoolMetrics {
    /// Export metrics as a HashMap
    pub fn export(&self) -> HashMap<String, String> {
        let mut metrics = HashMap::new();
        metrics.insert("live_objects".to_string(), self.live_objects.to_string());
        metrics.insert("idle_objects".to_string(), self.idle_objects.to_string());
        metrics.insert("active_objects".to_string(), self.active_objects.to_string());
        metrics.insert("waiting_requests".to_string(), self.waiting_requests.to_string());
        metrics.insert("total_created".to_string(), self.total_created.to_string());
        metrics.insert("total_destroyed".to_string(), self.total_destroyed.to_string());
        metrics.insert("total_evicted".to_string(), self.total_evicted.to_string());
        metrics.insert("total_retrieved".to_string(), self.total_retrieved.to_string());
        metrics.insert("total_returned".to_string(), self.total_returned.to_string());
        metrics.insert("validation_failures".to_string(), self.validation_failures.to_string());
        metrics.insert("timeouts".to_string(), self.timeouts.to_string());
        metrics.insert("exhausted_events".to_string(), self.exhausted_events.to_string());
        metrics.insert("utilization".to_string(), format!("{:.2}", self.utilization));
        metrics.insert("max_size".to_string(), self.max_size.to_string());
        metrics
    }
}

/// Metrics exporter for Prometheus format
#[cfg(feature = "metrics")]
pub struct MetricsExporter;

#[cfg(feature = "metrics")]
impl MetricsExporter {
    /// Export metrics in Prometheus exposition format
    ///
    /// # Examples
    ///
    /// ```
    /// use gompool::{CommonPool, DefaultPooledObjectFactory, PoolConfiguration};
    /// use std::collections::HashMap;
    ///
    /// let pool = CommonPool::new(
    ///     DefaultPooledObjectFactory::new(|| 0u64),
    ///     PoolConfiguration::default(),
    /// )
    /// .unwrap();
    ///
    /// let mut tags = HashMap::new();
    /// tags.insert("service".to_string(), "api".to_string());
    ///
    /// let output = pool.export_metrics_prometheus("buffers", Some(&tags));
    /// assert!(output.contains("objectpool_objects_live"));
    /// assert!(output.contains("service=\"api\""));
    /// ```
    pub fn export_prometheus(
        metrics: &PoolMetrics,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        let labels = Self::format_labels(pool_name, tags);
        let mut output = String::new();

        let gauges = [
            ("objectpool_objects_live", "Objects constructed and not yet destroyed", metrics.live_objects),
            ("objectpool_objects_idle", "Objects waiting in the idle queue", metrics.idle_objects),
            ("objectpool_objects_active", "Objects checked out by callers", metrics.active_objects),
            ("objectpool_requests_waiting", "Callers parked waiting for an object", metrics.waiting_requests),
        ];
        for (name, help, value) in gauges {
            Self::push_sample(&mut output, name, help, "gauge", &labels, value.to_string());
        }
        Self::push_sample(
            &mut output,
            "objectpool_utilization",
            "Pool utilization ratio",
            "gauge",
            &labels,
            format!("{:.2}", metrics.utilization),
        );

        let counters = [
            ("objectpool_objects_created_total", "Objects constructed", metrics.total_created),
            ("objectpool_objects_destroyed_total", "Objects destroyed", metrics.total_destroyed),
            ("objectpool_objects_evicted_total", "Objects removed by eviction", metrics.total_evicted),
            ("objectpool_objects_retrieved_total", "Objects handed to callers", metrics.total_retrieved),
            ("objectpool_objects_returned_total", "Objects put back", metrics.total_returned),
            ("objectpool_validation_failures_total", "Validation failures", metrics.validation_failures),
            ("objectpool_timeouts_total", "Bounded waits that expired", metrics.timeouts),
            ("objectpool_events_exhausted_total", "Gets that found the pool exhausted", metrics.exhausted_events),
        ];
        for (name, help, value) in counters {
            Self::push_sample(&mut output, name, help, "counter", &labels, value.to_string());
        }

        output
    }

    fn push_sample(output: &mut String, name: &str, help: &str, kind: &str, labels: &str, value: String) {
        output.push_str(&format!("# HELP {} {}\n", name, help));
        output.push_str(&format!("# TYPE {} {}\n", name, kind));
        output.push_str(&format!("{}{{{}}} {}\n", name, labels, value));
    }

    fn format_labels(pool_name: &str, tags: Option<&HashMap<String, String>>) -> String {
        let mut labels = vec![format!("pool=\"{}\"", pool_name)];

        if let Some(tags) = tags {
            let mut tags: Vec<_> = tags.iter().collect();
            tags.sort();
            for (key, value) in tags {
                labels.push(format!("{}=\"{}\"", key, value));
            }
        }

        labels.join(",")
    }
}

/// Internal metrics tracker shared between a pool handle and its coordinator
#[derive(Debug, Default)]
pub(crate) struct MetricsTracker {
    live: AtomicUsize,
    idle: AtomicUsize,
    waiting: AtomicUsize,
    pub created: AtomicUsize,
    pub destroyed: AtomicUsize,
    pub evicted: AtomicUsize,
    pub retrieved: AtomicUsize,
    pub returned: AtomicUsize,
    pub validation_failures: AtomicUsize,
    pub timeouts: AtomicUsize,
    pub exhausted: AtomicUsize,
}

impl MetricsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Mirror the coordinator's counts for lock-free readers.
    pub fn publish(&self, status: PoolStatus) {
        self.live.store(status.live, Ordering::Relaxed);
        self.idle.store(status.idle, Ordering::Relaxed);
        self.waiting.store(status.waiting, Ordering::Relaxed);
    }

    pub fn get_metrics(&self, max_size: usize) -> PoolMetrics {
        let live = self.live.load(Ordering::Relaxed);
        let idle = self.idle.load(Ordering::Relaxed);
        let active = live.saturating_sub(idle);
        let utilization = if max_size > 0 {
            active as f64 / max_size as f64
        } else {
            0.0
        };

        PoolMetrics {
            live_objects: live,
            idle_objects: idle,
            active_objects: active,
            waiting_requests: self.waiting.load(Ordering::Relaxed),
            total_created: self.created.load(Ordering::Relaxed),
            total_destroyed: self.destroyed.load(Ordering::Relaxed),
            total_evicted: self.evicted.load(Ordering::Relaxed),
            total_retrieved: self.retrieved.load(Ordering::Relaxed),
            total_returned: self.returned.load(Ordering::Relaxed),
            validation_failures: self.validation_failures.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            exhausted_events: self.exhausted.load(Ordering::Relaxed),
            utilization,
            max_size,
        }
    }
}

//! Health reporting for object pools

use crate::metrics::PoolMetrics;

/// Health status of an object pool
///
/// # Examples
///
/// ```
/// use gompool::{CommonPool, DefaultPooledObjectFactory, PoolConfiguration};
///
/// let pool = CommonPool::new(
///     DefaultPooledObjectFactory::new(|| [0u8; 32]),
///     PoolConfiguration::new().with_max_size(4),
/// )
/// .unwrap();
///
/// let health = pool.health();
/// assert!(health.is_healthy());
/// assert_eq!(health.max_size, 4);
/// ```
#[derive(Debug, Clone)]
pub struct HealthStatus {
    /// Whether the pool is healthy
    pub is_healthy: bool,

    /// Number of warnings detected
    pub warning_count: usize,

    /// Checked-out objects over maximum size (0.0 to 1.0)
    pub utilization: f64,

    pub idle_objects: usize,

    pub active_objects: usize,

    pub waiting_requests: usize,

    pub max_size: usize,

    /// Warning messages
    pub warnings: Vec<String>,
}

impl HealthStatus {
    pub fn from_metrics(metrics: &PoolMetrics) -> Self {
        let mut warnings = Vec::new();
        let mut is_healthy = true;

        if metrics.utilization > 0.9 {
            warnings.push(format!("High utilization: {:.1}%", metrics.utilization * 100.0));
            is_healthy = false;
        }

        if metrics.waiting_requests > 0 {
            warnings.push(format!("{} callers waiting for an object", metrics.waiting_requests));
            is_healthy = false;
        }

        if metrics.idle_objects == 0 && metrics.live_objects >= metrics.max_size {
            warnings.push("Pool is exhausted".to_string());
        }

        Self {
            is_healthy,
            warning_count: warnings.len(),
            utilization: metrics.utilization,
            idle_objects: metrics.idle_objects,
            active_objects: metrics.active_objects,
            waiting_requests: metrics.waiting_requests,
            max_size: metrics.max_size,
            warnings,
        }
    }

    /// Check if the pool is healthy
    pub fn is_healthy(&self) -> bool {
        self.is_healthy
    }
}

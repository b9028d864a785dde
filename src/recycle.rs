//! Recycling pool: the coordinator stripped down to make/destroy hooks

use std::sync::Arc;
use std::time::Duration;

use crate::config::{MaxWait, PoolConfiguration};
use crate::errors::PoolResult;
use crate::factory::DefaultPooledObjectFactory;
use crate::metrics::{PoolMetrics, PoolStatus};
use crate::pool::{CommonPool, Pool};

/// Unbounded pool that always keeps one fresh object ready.
///
/// There is no idle floor and no validation: every object idle past the
/// threshold is destroyed at the next sweep, and `get` always waits until the
/// coordinator hands an object over.
///
/// # Examples
///
/// ```
/// use gompool::RecyclePool;
/// use std::time::Duration;
///
/// let pool = RecyclePool::builder(|| vec![0u8; 1024])
///     .min_evictable_idle_time(Duration::from_secs(60))
///     .eviction_interval(Duration::from_secs(10))
///     .build()
///     .unwrap();
///
/// let buf = pool.get().unwrap();
/// assert_eq!(buf.len(), 1024);
/// pool.put(buf).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct RecyclePool<T: Send + 'static> {
    pool: CommonPool<T>,
}

impl<T: Send + 'static> RecyclePool<T> {
    pub fn builder<F>(make: F) -> RecyclePoolBuilder<T>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        RecyclePoolBuilder {
            factory: DefaultPooledObjectFactory::new(make),
            min_evictable_idle_time: Some(Duration::from_secs(30 * 60)),
            eviction_interval: None,
        }
    }

    /// Pool where one duration is both the sweep period and the staleness
    /// threshold.
    pub fn with_gc_interval<F, D>(make: F, destroy: D, interval: Duration) -> PoolResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
        D: Fn(T) + Send + Sync + 'static,
    {
        Self::builder(make)
            .destroy(destroy)
            .min_evictable_idle_time(interval)
            .eviction_interval(interval)
            .build()
    }

    pub fn get(&self) -> PoolResult<T> {
        self.pool.get()
    }

    pub fn put(&self, object: T) -> PoolResult<()> {
        self.pool.put(object)
    }

    pub fn close(&self) {
        self.pool.close();
    }

    pub fn status(&self) -> PoolResult<PoolStatus> {
        self.pool.status()
    }

    pub fn metrics(&self) -> PoolMetrics {
        self.pool.metrics()
    }

    pub async fn get_async(&self) -> PoolResult<T> {
        self.pool.get_async().await
    }

    pub async fn put_async(&self, object: T) -> PoolResult<()> {
        self.pool.put_async(object).await
    }
}

impl<T: Send + 'static> Pool<T> for RecyclePool<T> {
    fn get(&self) -> PoolResult<T> {
        RecyclePool::get(self)
    }

    fn put(&self, object: T) -> PoolResult<()> {
        RecyclePool::put(self, object)
    }

    fn close(&self) {
        RecyclePool::close(self)
    }
}

pub struct RecyclePoolBuilder<T> {
    factory: DefaultPooledObjectFactory<T>,
    min_evictable_idle_time: Option<Duration>,
    eviction_interval: Option<Duration>,
}

impl<T: Send + 'static> RecyclePoolBuilder<T> {
    pub fn destroy<D>(mut self, destroy: D) -> Self
    where
        D: Fn(T) + Send + Sync + 'static,
    {
        self.factory = self.factory.on_destroy(destroy);
        self
    }

    /// `Duration::ZERO` disables eviction.
    pub fn min_evictable_idle_time(mut self, idle: Duration) -> Self {
        self.min_evictable_idle_time = Some(idle);
        self
    }

    /// `Duration::ZERO` disables the sweep timer.
    pub fn eviction_interval(mut self, interval: Duration) -> Self {
        self.eviction_interval = Some(interval);
        self
    }

    pub fn build(self) -> PoolResult<RecyclePool<T>> {
        let config = PoolConfiguration {
            min_idle: 0,
            max_size: usize::MAX,
            max_wait: MaxWait::Indefinite,
            min_evictable_idle_time: self.min_evictable_idle_time,
            eviction_interval: self.eviction_interval,
            test_on_create: false,
            test_on_borrow: false,
            test_on_return: false,
            test_while_idle: false,
            block_when_exhausted: true,
        };
        let pool = CommonPool::start(Arc::new(self.factory), config, true)?;
        Ok(RecyclePool { pool })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn keeps_one_object_staged() {
        let made = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&made);
        let pool = RecyclePool::builder(move || counter.fetch_add(1, Ordering::SeqCst))
            .build()
            .unwrap();

        let status = pool.status().unwrap();
        assert_eq!(status.idle, 1);
        assert_eq!(made.load(Ordering::SeqCst), 1);

        let first = pool.get().unwrap();
        assert_eq!(first, 0);
        assert_eq!(pool.status().unwrap().idle, 1);
        assert_eq!(made.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn returned_objects_are_reused_first() {
        let pool = RecyclePool::builder(|| String::from("fresh")).build().unwrap();

        let mut obj = pool.get().unwrap();
        obj.push_str("-used");
        pool.put(obj).unwrap();

        // The staged object made at start is ahead in the queue.
        assert_eq!(pool.get().unwrap(), "fresh");
        assert_eq!(pool.get().unwrap(), "fresh-used");
    }
}

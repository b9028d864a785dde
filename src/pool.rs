//! Public pool surface: `CommonPool`, its builder and the RAII guard

use crate::config::PoolConfiguration;
use crate::coordinator::{self, Command};
use crate::errors::{PoolError, PoolResult};
use crate::factory::{PooledObjectFactory, SharedFactory};
use crate::handoff;
use crate::health::HealthStatus;
#[cfg(feature = "metrics")]
use crate::metrics::MetricsExporter;
use crate::metrics::{MetricsTracker, PoolMetrics, PoolStatus};

use crossbeam::channel::{self, Sender};
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

/// Operations every pool variant supports
pub trait Pool<T> {
    /// Borrow an object. Whether this waits depends on the pool's configuration.
    fn get(&self) -> PoolResult<T>;

    /// Give a borrowed object back
    fn put(&self, object: T) -> PoolResult<()>;

    /// Stop the pool. Later `get`/`put` calls fail with [`PoolError::Closed`].
    fn close(&self);
}

/// A pooled object that automatically returns to the pool when dropped
pub struct PooledObject<T: Send + 'static> {
    value: Option<T>,
    pool: CommonPool<T>,
}

impl<T: Send + 'static> PooledObject<T> {
    fn new(value: T, pool: CommonPool<T>) -> Self {
        Self {
            value: Some(value),
            pool,
        }
    }

    /// Take the inner value without returning it to the pool.
    ///
    /// The pool keeps counting the object as checked out until it is handed
    /// back with [`CommonPool::put`].
    pub fn detach(mut self) -> T {
        self.value.take().expect("Value already taken")
    }

    /// Destroy the object instead of returning it, freeing its slot.
    pub fn invalidate(mut self) {
        if let Some(value) = self.value.take() {
            let _ = self.pool.submit(Command::Invalidate(value));
        }
    }
}

impl<T: Send + 'static> Deref for PooledObject<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.value.as_ref().expect("Value already taken")
    }
}

impl<T: Send + 'static> DerefMut for PooledObject<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.value.as_mut().expect("Value already taken")
    }
}

impl<T: Send + 'static> Drop for PooledObject<T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take()
            && let Err(err) = self.pool.put(value)
        {
            debug!("Pooled object was not returned: {}", err);
        }
    }
}

impl<T: Send + fmt::Debug + 'static> fmt::Debug for PooledObject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PooledObject").field(&self.value).finish()
    }
}

struct PoolInner<T> {
    commands: Sender<Command<T>>,
    factory: SharedFactory<T>,
    config: Arc<PoolConfiguration>,
    metrics: Arc<MetricsTracker>,
    closed: AtomicBool,
    /// Held shared while sending, exclusively while closing, so no command
    /// can be queued behind `Stop`.
    gate: RwLock<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<T> PoolInner<T> {
    fn close(&self) {
        {
            let _gate = self.gate.write();
            if self.closed.swap(true, Ordering::AcqRel) {
                return;
            }
            let _ = self.commands.send(Command::Stop);
        }
        if let Some(worker) = self.worker.lock().take()
            && worker.join().is_err()
        {
            warn!("Pool coordinator panicked before shutdown");
        }
    }
}

impl<T> Drop for PoolInner<T> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Bounded pool whose state lives in a dedicated coordinator thread.
///
/// Handles are cheap to clone and all refer to the same pool. The pool closes
/// when [`close`](CommonPool::close) is called or the last handle (including
/// outstanding [`PooledObject`] guards) is dropped.
///
/// # Examples
///
/// ```
/// use gompool::{CommonPool, DefaultPooledObjectFactory, PoolConfiguration, PoolError};
///
/// let config = PoolConfiguration::new().with_max_size(1);
/// let pool = CommonPool::new(DefaultPooledObjectFactory::new(|| String::from("conn")), config)
///     .unwrap();
///
/// let conn = pool.get().unwrap();
/// assert_eq!(pool.get(), Err(PoolError::Exhausted));
///
/// pool.put(conn).unwrap();
/// assert!(pool.get().is_ok());
/// ```
pub struct CommonPool<T: Send + 'static> {
    inner: Arc<PoolInner<T>>,
}

impl<T: Send + 'static> Clone for CommonPool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> CommonPool<T> {
    /// Start a pool with the given factory and configuration
    pub fn new<F>(factory: F, config: PoolConfiguration) -> PoolResult<Self>
    where
        F: PooledObjectFactory<T> + 'static,
    {
        Self::start(Arc::new(factory), config, false)
    }

    pub fn builder() -> CommonPoolBuilder<T> {
        CommonPoolBuilder::default()
    }

    pub(crate) fn start(
        factory: SharedFactory<T>,
        config: PoolConfiguration,
        staging: bool,
    ) -> PoolResult<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let metrics = Arc::new(MetricsTracker::new());
        let (commands, worker) = coordinator::spawn(
            Arc::clone(&factory),
            Arc::clone(&config),
            Arc::clone(&metrics),
            staging,
        )?;

        Ok(Self {
            inner: Arc::new(PoolInner {
                commands,
                factory,
                config,
                metrics,
                closed: AtomicBool::new(false),
                gate: RwLock::new(()),
                worker: Mutex::new(Some(worker)),
            }),
        })
    }

    /// Borrow an object.
    ///
    /// Without `block_when_exhausted` an exhausted pool answers
    /// [`PoolError::Exhausted`] straight away. Otherwise the call waits as
    /// `max_wait` allows and reports [`PoolError::Timeout`] when the bound
    /// runs out. With `test_on_borrow` an object failing validation is
    /// destroyed and [`PoolError::ValidationFailed`] is returned. The same
    /// error reports a factory whose new objects keep failing
    /// `test_on_create` while the pool has free capacity.
    pub fn get(&self) -> PoolResult<T> {
        self.ensure_open()?;
        let config = &self.inner.config;
        let blocking = config.is_blocking();

        let (waiter, ticket) = handoff::pair(blocking);
        self.submit(Command::Acquire(waiter))?;

        let limit = if blocking { config.max_wait.timeout() } else { None };
        let object = ticket.wait(limit).inspect_err(|err| {
            if matches!(err, PoolError::Timeout(_)) {
                MetricsTracker::increment(&self.inner.metrics.timeouts);
            }
        })?;

        if config.test_on_borrow && !self.inner.factory.validate(&object) {
            warn!("Borrowed object failed validation and was destroyed");
            MetricsTracker::increment(&self.inner.metrics.validation_failures);
            self.submit(Command::Invalidate(object))?;
            return Err(PoolError::ValidationFailed);
        }

        Ok(object)
    }

    /// Try to get an object, discarding the reason if none is available
    pub fn try_get(&self) -> Option<T> {
        self.get().ok()
    }

    /// Return a borrowed object.
    ///
    /// With `test_on_return` an object failing validation is destroyed, its
    /// slot freed, and [`PoolError::ValidationFailed`] is returned. After
    /// [`close`](CommonPool::close) the object is destroyed and
    /// [`PoolError::Closed`] is returned.
    pub fn put(&self, object: T) -> PoolResult<()> {
        if self.is_closed() {
            self.inner.factory.destroy(object);
            return Err(PoolError::Closed);
        }

        if self.inner.config.test_on_return && !self.inner.factory.validate(&object) {
            warn!("Returned object failed validation and was destroyed");
            MetricsTracker::increment(&self.inner.metrics.validation_failures);
            self.submit(Command::Invalidate(object))?;
            return Err(PoolError::ValidationFailed);
        }

        self.submit(Command::Release(object))
    }

    /// Borrow an object wrapped in a guard that puts it back on drop
    pub fn checkout(&self) -> PoolResult<PooledObject<T>> {
        self.get().map(|value| PooledObject::new(value, self.clone()))
    }

    /// Pre-construct up to `count` objects. Returns how many were made.
    pub fn warmup(&self, count: usize) -> PoolResult<usize> {
        self.ensure_open()?;
        let (reply, created) = channel::bounded(1);
        self.submit(Command::Warmup { count, reply })?;
        created.recv().map_err(|_| PoolError::Closed)
    }

    /// Exact counts, read inside the coordinator
    pub fn status(&self) -> PoolResult<PoolStatus> {
        self.ensure_open()?;
        let (reply, status) = channel::bounded(1);
        self.submit(Command::Status(reply))?;
        status.recv().map_err(|_| PoolError::Closed)
    }

    /// Get pool metrics
    pub fn metrics(&self) -> PoolMetrics {
        self.inner.metrics.get_metrics(self.inner.config.max_size)
    }

    /// Export metrics
    pub fn export_metrics(&self) -> HashMap<String, String> {
        self.metrics().export()
    }

    /// Export metrics in Prometheus format
    #[cfg(feature = "metrics")]
    pub fn export_metrics_prometheus(
        &self,
        pool_name: &str,
        tags: Option<&HashMap<String, String>>,
    ) -> String {
        MetricsExporter::export_prometheus(&self.metrics(), pool_name, tags)
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus::from_metrics(&self.metrics())
    }

    pub fn config(&self) -> &PoolConfiguration {
        &self.inner.config
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Stop the coordinator and wait for it to exit.
    ///
    /// Idle objects are destroyed and parked callers are woken with
    /// [`PoolError::Closed`]. Calling it again does nothing.
    pub fn close(&self) {
        self.inner.close();
    }

    /// Get an object on tokio's blocking pool
    pub async fn get_async(&self) -> PoolResult<T> {
        let pool = self.clone();
        tokio::task::spawn_blocking(move || pool.get())
            .await
            .map_err(|_| PoolError::Cancelled)?
    }

    /// Return an object from async code
    pub async fn put_async(&self, object: T) -> PoolResult<()> {
        let pool = self.clone();
        tokio::task::spawn_blocking(move || pool.put(object))
            .await
            .map_err(|_| PoolError::Cancelled)?
    }

    fn ensure_open(&self) -> PoolResult<()> {
        if self.is_closed() {
            return Err(PoolError::Closed);
        }
        Ok(())
    }

    /// Send a command, destroying any object it carries if the pool is
    /// closed or the coordinator is gone.
    fn submit(&self, command: Command<T>) -> PoolResult<()> {
        let _gate = self.inner.gate.read();
        let result = if self.is_closed() {
            Err(command)
        } else {
            self.inner.commands.send(command).map_err(|err| err.into_inner())
        };

        result.map_err(|command| {
            if let Command::Release(object) | Command::Invalidate(object) = command {
                self.inner.factory.destroy(object);
            }
            PoolError::Closed
        })
    }
}

impl<T: Send + 'static> Pool<T> for CommonPool<T> {
    fn get(&self) -> PoolResult<T> {
        CommonPool::get(self)
    }

    fn put(&self, object: T) -> PoolResult<()> {
        CommonPool::put(self, object)
    }

    fn close(&self) {
        CommonPool::close(self)
    }
}

impl<T: Send + 'static> fmt::Debug for CommonPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommonPool")
            .field("config", &self.inner.config)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Builder for [`CommonPool`]. A factory is mandatory.
///
/// # Examples
///
/// ```
/// use gompool::{CommonPool, PoolError};
///
/// let result = CommonPool::<u8>::builder().build();
/// assert!(matches!(result, Err(PoolError::MissingFactory)));
/// ```
pub struct CommonPoolBuilder<T> {
    factory: Option<SharedFactory<T>>,
    config: PoolConfiguration,
}

impl<T> Default for CommonPoolBuilder<T> {
    fn default() -> Self {
        Self {
            factory: None,
            config: PoolConfiguration::default(),
        }
    }
}

impl<T: Send + 'static> CommonPoolBuilder<T> {
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: PooledObjectFactory<T> + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    pub fn config(mut self, config: PoolConfiguration) -> Self {
        self.config = config;
        self
    }

    /// Start the pool
    pub fn build(self) -> PoolResult<CommonPool<T>> {
        let factory = self.factory.ok_or(PoolError::MissingFactory)?;
        CommonPool::start(factory, self.config, false)
    }
}

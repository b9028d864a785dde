//! Baseline pool: a bounded idle channel plus a mutex-guarded constructor
//!
//! There is no coordinator thread here. Construction can be reached from
//! both the fast path and the timeout path of `get`, so the live counter is
//! protected by a real lock.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, Select, Sender};
use log::debug;
use parking_lot::Mutex;

use crate::errors::{PoolError, PoolResult};
use crate::pool::Pool;

/// Sizing for [`BaselinePool`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaselineConfiguration {
    /// Capacity of the idle store; `put` blocks while it is full
    pub max_idle: usize,

    /// Hard cap on constructed objects
    pub max_size: usize,

    /// How long `get` waits for a returned object; `None` waits forever
    pub wait_timeout: Option<Duration>,
}

impl Default for BaselineConfiguration {
    fn default() -> Self {
        Self {
            max_idle: 32,
            max_size: 32,
            wait_timeout: None,
        }
    }
}

impl BaselineConfiguration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_idle(mut self, max_idle: usize) -> Self {
        self.max_idle = max_idle;
        self
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> PoolResult<()> {
        if self.max_size == 0 || self.max_idle == 0 {
            return Err(PoolError::InvalidConfiguration(
                "max_size and max_idle must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Minimal pool without lifecycle hooks or eviction.
///
/// # Examples
///
/// ```
/// use gompool::{BaselineConfiguration, BaselinePool, PoolError};
/// use std::time::Duration;
///
/// let config = BaselineConfiguration::new()
///     .with_max_size(1)
///     .with_wait_timeout(Duration::from_millis(10));
/// let pool = BaselinePool::new(|| 0u32, config).unwrap();
///
/// let held = pool.get().unwrap();
/// assert_eq!(pool.get(), Err(PoolError::Timeout(Duration::from_millis(10))));
/// pool.put(held).unwrap();
/// assert_eq!(pool.get(), Ok(0));
/// ```
pub struct BaselinePool<T> {
    make: Arc<dyn Fn() -> T + Send + Sync>,
    idle_tx: Sender<T>,
    idle_rx: Receiver<T>,
    live: Mutex<usize>,
    config: BaselineConfiguration,
    closed: AtomicBool,
    close_tx: Mutex<Option<Sender<()>>>,
    close_rx: Receiver<()>,
}

impl<T> BaselinePool<T> {
    pub fn new<F>(make: F, config: BaselineConfiguration) -> PoolResult<Self>
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        config.validate()?;
        let (idle_tx, idle_rx) = channel::bounded(config.max_idle);
        let (close_tx, close_rx) = channel::bounded(0);

        Ok(Self {
            make: Arc::new(make),
            idle_tx,
            idle_rx,
            live: Mutex::new(0),
            config,
            closed: AtomicBool::new(false),
            close_tx: Mutex::new(Some(close_tx)),
            close_rx,
        })
    }

    /// Borrow an object, constructing one while under `max_size`
    pub fn get(&self) -> PoolResult<T> {
        self.ensure_open()?;

        if self.idle_rx.is_empty()
            && let Some(object) = self.make()
        {
            return Ok(object);
        }

        let mut select = Select::new();
        let idle = select.recv(&self.idle_rx);
        let closed = select.recv(&self.close_rx);

        let operation = match self.config.wait_timeout {
            Some(limit) => match select.select_timeout(limit) {
                Ok(operation) => operation,
                Err(_) => return self.make().ok_or(PoolError::Timeout(limit)),
            },
            None => select.select(),
        };

        match operation.index() {
            index if index == idle => operation.recv(&self.idle_rx).map_err(|_| PoolError::Closed),
            index => {
                debug_assert_eq!(index, closed);
                let _ = operation.recv(&self.close_rx);
                Err(PoolError::Closed)
            }
        }
    }

    /// Return an object, waiting while the idle store is full
    pub fn put(&self, object: T) -> PoolResult<()> {
        self.ensure_open()?;

        let mut select = Select::new();
        let idle = select.send(&self.idle_tx);
        let closed = select.recv(&self.close_rx);
        let operation = select.select();

        match operation.index() {
            index if index == idle => operation
                .send(&self.idle_tx, object)
                .map_err(|_| PoolError::Closed),
            index => {
                debug_assert_eq!(index, closed);
                let _ = operation.recv(&self.close_rx);
                Err(PoolError::Closed)
            }
        }
    }

    /// Wake every blocked caller and refuse further calls
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.close_tx.lock().take();
        debug!("Baseline pool closed with {} idle objects", self.idle_rx.len());
    }

    pub fn live_count(&self) -> usize {
        *self.live.lock()
    }

    pub fn idle_count(&self) -> usize {
        self.idle_rx.len()
    }

    fn ensure_open(&self) -> PoolResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed);
        }
        Ok(())
    }

    fn make(&self) -> Option<T> {
        let mut live = self.live.lock();
        if *live < self.config.max_size {
            *live += 1;
            return Some((self.make)());
        }
        None
    }
}

impl<T> Pool<T> for BaselinePool<T> {
    fn get(&self) -> PoolResult<T> {
        BaselinePool::get(self)
    }

    fn put(&self, object: T) -> PoolResult<()> {
        BaselinePool::put(self, object)
    }

    fn close(&self) {
        BaselinePool::close(self)
    }
}

impl<T> fmt::Debug for BaselinePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaselinePool")
            .field("config", &self.config)
            .field("live", &self.live_count())
            .field("idle", &self.idle_count())
            .finish_non_exhaustive()
    }
}

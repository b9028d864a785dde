//! The coordinator: one thread per pool that owns every piece of mutable
//! pool state.
//!
//! Callers never touch the idle queue or the live count. They send
//! [`Command`]s over a channel and the coordinator applies them one at a
//! time, so the state needs no lock. Commands are handled in arrival order.
//! When a command and an eviction tick are ready together, `select!` picks
//! one of them at random; neither source can starve the other.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam::channel::{self, Receiver, RecvError, Sender};
use crossbeam::select;
use log::{debug, info, warn};

use crate::config::PoolConfiguration;
use crate::entry::{IdleQueue, PooledEntry};
use crate::errors::{PoolError, PoolResult};
use crate::eviction::{EvictionPolicy, EvictionScheduler};
use crate::factory::SharedFactory;
use crate::handoff::Waiter;
use crate::metrics::{MetricsTracker, PoolStatus};

/// Objects made per construction request before giving up on a factory whose
/// objects keep failing `test_on_create`.
const CREATE_ATTEMPTS: usize = 3;

/// Why the coordinator could not produce an idle object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shortfall {
    /// `max_size` objects are live
    AtCapacity,

    /// Every attempt was rejected by `test_on_create`
    Rejected,
}

pub(crate) enum Command<T> {
    /// A caller wants an object
    Acquire(Waiter<T>),

    /// A caller returns an object it borrowed
    Release(T),

    /// A caller hands back an object that failed validation
    Invalidate(T),

    /// Pre-construct up to `count` objects, replying with how many were made
    Warmup { count: usize, reply: Sender<usize> },

    Status(Sender<PoolStatus>),

    Stop,
}

pub(crate) struct Coordinator<T> {
    factory: SharedFactory<T>,
    config: Arc<PoolConfiguration>,
    policy: EvictionPolicy,
    staging: bool,
    idle: IdleQueue<T>,
    live: usize,
    waiters: VecDeque<Waiter<T>>,
    metrics: Arc<MetricsTracker>,
}

/// Start a coordinator thread and return the channel that drives it.
///
/// With `staging` set the coordinator keeps one freshly made object ready
/// whenever the idle queue runs dry; otherwise it constructs only on demand.
pub(crate) fn spawn<T: Send + 'static>(
    factory: SharedFactory<T>,
    config: Arc<PoolConfiguration>,
    metrics: Arc<MetricsTracker>,
    staging: bool,
) -> PoolResult<(Sender<Command<T>>, JoinHandle<()>)> {
    let (commands_tx, commands_rx) = channel::unbounded();
    let scheduler = EvictionScheduler::new(config.eviction_interval);
    let coordinator = Coordinator::new(factory, config, metrics, staging);

    let handle = thread::Builder::new()
        .name("gompool-coordinator".to_string())
        .spawn(move || coordinator.run(commands_rx, scheduler))
        .map_err(|err| PoolError::Spawn(err.to_string()))?;

    Ok((commands_tx, handle))
}

impl<T> Coordinator<T> {
    fn new(
        factory: SharedFactory<T>,
        config: Arc<PoolConfiguration>,
        metrics: Arc<MetricsTracker>,
        staging: bool,
    ) -> Self {
        Self {
            factory,
            policy: EvictionPolicy::from_threshold(config.min_evictable_idle_time),
            config,
            staging,
            idle: IdleQueue::new(),
            live: 0,
            waiters: VecDeque::new(),
            metrics,
        }
    }

    fn run(mut self, commands: Receiver<Command<T>>, scheduler: EvictionScheduler) {
        info!(
            "Pool coordinator started (max_size={}, min_idle={}, eviction every {:?})",
            self.config.max_size,
            self.config.min_idle,
            scheduler.interval()
        );
        let ticks = scheduler.ticks().clone();

        loop {
            self.dispatch();
            if self.staging && self.idle.is_empty() {
                let _ = self.create();
            }
            self.metrics.publish(self.status());

            let running = select! {
                recv(commands) -> command => self.handle(command),
                recv(ticks) -> _ => {
                    self.evict();
                    true
                }
            };
            if !running {
                break;
            }
        }

        self.shutdown(&commands);
    }

    /// Apply one command. Returns false once the loop should stop.
    fn handle(&mut self, command: Result<Command<T>, RecvError>) -> bool {
        match command {
            Ok(Command::Acquire(waiter)) => self.acquire(waiter),
            Ok(Command::Release(object)) => self.release(object),
            Ok(Command::Invalidate(object)) => self.invalidate(object),
            Ok(Command::Warmup { count, reply }) => {
                let created = self.warmup(count);
                let _ = reply.send(created);
            }
            Ok(Command::Status(reply)) => {
                let _ = reply.send(self.status());
            }
            Ok(Command::Stop) | Err(_) => return false,
        }
        true
    }

    fn status(&self) -> PoolStatus {
        PoolStatus {
            live: self.live,
            idle: self.idle.len(),
            waiting: self.waiters.iter().filter(|w| !w.is_abandoned()).count(),
        }
    }

    /// True while at least one counted object is checked out, i.e. a release
    /// can legitimately come back.
    fn has_outstanding(&self) -> bool {
        self.idle.len() < self.live
    }

    fn acquire(&mut self, waiter: Waiter<T>) {
        if waiter.is_blocking() {
            self.waiters.push_back(waiter);
            return;
        }

        // Parked callers were here first.
        if !self.waiters.is_empty() {
            MetricsTracker::increment(&self.metrics.exhausted);
            waiter.reject(PoolError::Exhausted);
            return;
        }
        match self.next_idle() {
            Ok(entry) => self.hand_off(waiter, entry),
            Err(Shortfall::AtCapacity) => {
                MetricsTracker::increment(&self.metrics.exhausted);
                waiter.reject(PoolError::Exhausted);
            }
            Err(Shortfall::Rejected) => waiter.reject(PoolError::ValidationFailed),
        }
    }

    /// Serve parked callers in arrival order until objects run out.
    fn dispatch(&mut self) {
        while let Some(waiter) = self.waiters.pop_front() {
            if waiter.is_abandoned() {
                continue;
            }
            match self.next_idle() {
                Ok(entry) => self.hand_off(waiter, entry),
                Err(Shortfall::AtCapacity) => {
                    self.waiters.push_front(waiter);
                    break;
                }
                Err(Shortfall::Rejected) => {
                    if waiter.claim() {
                        waiter.reject(PoolError::ValidationFailed);
                    }
                }
            }
        }
    }

    /// Front of the idle queue, constructing one object if the queue is empty
    /// and capacity allows.
    fn next_idle(&mut self) -> Result<PooledEntry<T>, Shortfall> {
        if self.idle.is_empty() {
            self.create()?;
        }
        self.idle.pop_front().ok_or(Shortfall::AtCapacity)
    }

    fn hand_off(&mut self, waiter: Waiter<T>, mut entry: PooledEntry<T>) {
        if !waiter.claim() {
            // Caller timed out; the object stays first in line.
            self.idle.push_front(entry);
            return;
        }

        entry.allocate();
        self.factory.activate(entry.object_mut());
        match waiter.fulfil(entry.into_object()) {
            None => MetricsTracker::increment(&self.metrics.retrieved),
            Some(object) => {
                debug!("Borrower went away during handoff; object goes back to idle");
                self.release(object);
            }
        }
    }

    /// Make one idle object. A rejected object frees its slot straight away,
    /// so the next attempt can reuse it.
    fn create(&mut self) -> Result<(), Shortfall> {
        for _ in 0..CREATE_ATTEMPTS {
            if self.live >= self.config.max_size {
                return Err(Shortfall::AtCapacity);
            }

            let entry = PooledEntry::new(self.factory.make());
            self.live += 1;
            MetricsTracker::increment(&self.metrics.created);

            if self.config.test_on_create && !self.factory.validate(entry.object()) {
                warn!("Newly made object failed validation and was destroyed");
                self.discard(entry);
                continue;
            }

            debug!("Made object, {} live", self.live);
            self.idle.push_back(entry);
            return Ok(());
        }

        warn!("Giving up after {} rejected objects in a row", CREATE_ATTEMPTS);
        Err(Shortfall::Rejected)
    }

    fn warmup(&mut self, count: usize) -> usize {
        let mut created = 0;
        while created < count && self.create().is_ok() {
            created += 1;
        }
        debug!("Warmup made {} of {} requested objects", created, count);
        created
    }

    fn release(&mut self, object: T) {
        if !self.has_outstanding() {
            warn!("Destroying a released object the pool never handed out");
            self.factory.destroy(object);
            return;
        }

        let mut entry = PooledEntry::new(object);
        if self.config.test_while_idle && !self.factory.validate(entry.object()) {
            warn!("Returned object failed idle validation and was destroyed");
            self.discard(entry);
            return;
        }

        self.factory.passivate(entry.object_mut());
        self.idle.push_back(entry);
        MetricsTracker::increment(&self.metrics.returned);
    }

    fn invalidate(&mut self, object: T) {
        if self.has_outstanding() {
            self.destroy(object);
        } else {
            self.factory.destroy(object);
        }
    }

    fn discard(&mut self, mut entry: PooledEntry<T>) {
        entry.invalidate();
        MetricsTracker::increment(&self.metrics.validation_failures);
        self.destroy(entry.into_object());
    }

    fn destroy(&mut self, object: T) {
        self.factory.destroy(object);
        self.live = self.live.saturating_sub(1);
        MetricsTracker::increment(&self.metrics.destroyed);
    }

    fn evict(&mut self) {
        self.waiters.retain(|waiter| !waiter.is_abandoned());
        if !self.policy.is_enabled() {
            return;
        }

        let evicted = self.idle.sweep(self.config.min_idle, &self.policy, Instant::now());
        if evicted.is_empty() {
            return;
        }

        debug!("Eviction sweep removed {} idle objects", evicted.len());
        for object in evicted {
            MetricsTracker::increment(&self.metrics.evicted);
            self.destroy(object);
        }
    }

    fn shutdown(mut self, commands: &Receiver<Command<T>>) {
        // Dropping parked waiters wakes their callers with `Closed`.
        self.waiters.clear();

        while let Ok(command) = commands.try_recv() {
            match command {
                Command::Release(object) | Command::Invalidate(object) => self.invalidate(object),
                Command::Acquire(_) | Command::Warmup { .. } | Command::Status(_) | Command::Stop => {}
            }
        }

        let idle: Vec<T> = self.idle.drain().collect();
        for object in idle {
            self.destroy(object);
        }
        self.metrics.publish(self.status());

        info!("Pool coordinator stopped, {} objects still checked out", self.live);
    }
}

//! Idle eviction: the staleness policy and the timer that drives sweeps

use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver};

use crate::config::enabled;

/// Eviction policy for idle pool objects
///
/// # Examples
///
/// ```
/// use gompool::EvictionPolicy;
/// use std::time::Duration;
///
/// let policy = EvictionPolicy::from_threshold(Some(Duration::from_secs(60)));
/// assert!(policy.is_expired(Duration::from_secs(61)));
/// assert!(!policy.is_expired(Duration::from_secs(59)));
///
/// // A zero threshold disables eviction altogether
/// let disabled = EvictionPolicy::from_threshold(Some(Duration::ZERO));
/// assert!(!disabled.is_expired(Duration::from_secs(3600)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// No eviction
    #[default]
    None,

    /// Objects idle for longer than the duration may be evicted
    IdleTimeout(Duration),
}

impl EvictionPolicy {
    /// Build a policy from an optional threshold; `None` and zero both disable it.
    pub fn from_threshold(threshold: Option<Duration>) -> Self {
        match enabled(threshold) {
            Some(threshold) => EvictionPolicy::IdleTimeout(threshold),
            None => EvictionPolicy::None,
        }
    }

    pub fn is_expired(&self, idle_for: Duration) -> bool {
        match self {
            EvictionPolicy::None => false,
            EvictionPolicy::IdleTimeout(threshold) => idle_for > *threshold,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, EvictionPolicy::None)
    }
}

/// Repeating timer feeding sweep ticks into a coordinator loop.
///
/// A disabled scheduler hands out a channel that never fires, so the loop can
/// select on it unconditionally.
pub(crate) struct EvictionScheduler {
    interval: Option<Duration>,
    ticks: Receiver<Instant>,
}

impl EvictionScheduler {
    pub fn new(interval: Option<Duration>) -> Self {
        let interval = enabled(interval);
        let ticks = match interval {
            Some(period) => channel::tick(period),
            None => channel::never(),
        };
        Self { interval, ticks }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn ticks(&self) -> &Receiver<Instant> {
        &self.ticks
    }
}

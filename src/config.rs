//! Pool configuration options

use std::time::Duration;

use crate::errors::{PoolError, PoolResult};

/// How long a blocking `get` waits when the pool is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MaxWait {
    /// Wait until an object is handed over or the pool closes
    #[default]
    Indefinite,

    /// Never wait; an exhausted pool answers immediately
    NoWait,

    /// Wait at most the given duration
    Bounded(Duration),
}

impl MaxWait {
    /// The wait bound, or `None` for an unbounded wait.
    ///
    /// Only meaningful for blocking waits; see [`PoolConfiguration::is_blocking`].
    pub fn timeout(&self) -> Option<Duration> {
        match self {
            MaxWait::Bounded(limit) => Some(*limit),
            MaxWait::Indefinite | MaxWait::NoWait => None,
        }
    }
}

/// Treats an absent or zero duration as "disabled".
///
/// Every pool variant normalises its eviction settings through this helper so
/// the disable sentinel means the same thing everywhere.
pub(crate) fn enabled(duration: Option<Duration>) -> Option<Duration> {
    duration.filter(|d| !d.is_zero())
}

/// Configuration for pool behavior
///
/// # Examples
///
/// ```
/// use gompool::{MaxWait, PoolConfiguration};
/// use std::time::Duration;
///
/// let config = PoolConfiguration::new()
///     .with_max_size(16)
///     .with_min_idle(4)
///     .with_max_wait(MaxWait::Bounded(Duration::from_secs(5)))
///     .with_block_when_exhausted(true);
///
/// assert_eq!(config.max_size, 16);
/// assert!(config.is_blocking());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolConfiguration {
    /// Idle objects the eviction sweep always leaves in place
    pub min_idle: usize,

    /// Hard cap on objects constructed and not yet destroyed
    pub max_size: usize,

    /// Wait policy for `get` when `block_when_exhausted` is set
    pub max_wait: MaxWait,

    /// Idle time after which an object may be evicted; `None` or zero disables removal
    pub min_evictable_idle_time: Option<Duration>,

    /// Period of the eviction sweep; `None` or zero disables the timer
    pub eviction_interval: Option<Duration>,

    /// Validate freshly made objects
    pub test_on_create: bool,

    /// Validate objects before handing them to a caller
    pub test_on_borrow: bool,

    /// Validate objects when a caller puts them back
    pub test_on_return: bool,

    /// Validate returned objects again before they go idle
    pub test_while_idle: bool,

    /// Wait for an object instead of failing when the pool is exhausted
    pub block_when_exhausted: bool,
}

impl Default for PoolConfiguration {
    fn default() -> Self {
        Self {
            min_idle: 8,
            max_size: 32,
            max_wait: MaxWait::Indefinite,
            min_evictable_idle_time: Some(Duration::from_secs(30 * 60)),
            eviction_interval: None,
            test_on_create: false,
            test_on_borrow: false,
            test_on_return: false,
            test_while_idle: false,
            block_when_exhausted: false,
        }
    }
}

impl PoolConfiguration {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_idle(mut self, min_idle: usize) -> Self {
        self.min_idle = min_idle;
        self
    }

    /// Set the maximum pool size
    pub fn with_max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    pub fn with_max_wait(mut self, max_wait: MaxWait) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Set the idle age at which objects become evictable.
    ///
    /// `Duration::ZERO` disables eviction.
    pub fn with_min_evictable_idle_time(mut self, idle: Duration) -> Self {
        self.min_evictable_idle_time = Some(idle);
        self
    }

    /// Set the eviction sweep period.
    ///
    /// `Duration::ZERO` disables the sweep timer.
    pub fn with_eviction_interval(mut self, interval: Duration) -> Self {
        self.eviction_interval = Some(interval);
        self
    }

    pub fn with_test_on_create(mut self, enabled: bool) -> Self {
        self.test_on_create = enabled;
        self
    }

    pub fn with_test_on_borrow(mut self, enabled: bool) -> Self {
        self.test_on_borrow = enabled;
        self
    }

    pub fn with_test_on_return(mut self, enabled: bool) -> Self {
        self.test_on_return = enabled;
        self
    }

    pub fn with_test_while_idle(mut self, enabled: bool) -> Self {
        self.test_while_idle = enabled;
        self
    }

    pub fn with_block_when_exhausted(mut self, enabled: bool) -> Self {
        self.block_when_exhausted = enabled;
        self
    }

    /// Whether an exhausted `get` parks the caller rather than failing at once.
    pub fn is_blocking(&self) -> bool {
        self.block_when_exhausted
            && match self.max_wait {
                MaxWait::NoWait => false,
                MaxWait::Bounded(limit) => !limit.is_zero(),
                MaxWait::Indefinite => true,
            }
    }

    /// Check the configuration before a pool starts with it
    ///
    /// # Examples
    ///
    /// ```
    /// use gompool::{PoolConfiguration, PoolError};
    ///
    /// let config = PoolConfiguration::new().with_max_size(0);
    /// assert!(matches!(config.validate(), Err(PoolError::InvalidConfiguration(_))));
    /// ```
    pub fn validate(&self) -> PoolResult<()> {
        if self.max_size == 0 {
            return Err(PoolError::InvalidConfiguration(
                "max_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PoolConfiguration::default();

        assert_eq!(config.min_idle, 8);
        assert_eq!(config.max_size, 32);
        assert_eq!(config.max_wait, MaxWait::Indefinite);
        assert_eq!(config.min_evictable_idle_time, Some(Duration::from_secs(1800)));
        assert_eq!(config.eviction_interval, None);
        assert!(!config.block_when_exhausted);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn blocking_mode_depends_on_wait_policy() {
        let base = PoolConfiguration::new().with_block_when_exhausted(true);

        assert!(base.is_blocking());
        assert!(!base.clone().with_max_wait(MaxWait::NoWait).is_blocking());
        assert!(!base.clone().with_max_wait(MaxWait::Bounded(Duration::ZERO)).is_blocking());
        assert!(base.with_max_wait(MaxWait::Bounded(Duration::from_millis(5))).is_blocking());
        assert!(!PoolConfiguration::new().is_blocking());
    }

    #[test]
    fn zero_durations_disable() {
        assert_eq!(enabled(None), None);
        assert_eq!(enabled(Some(Duration::ZERO)), None);
        assert_eq!(enabled(Some(Duration::from_secs(1))), Some(Duration::from_secs(1)));
    }
}

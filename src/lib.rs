//! # gompool
//!
//! Bounded object pool for expensive resources (buffers, handles, sessions)
//! whose state is owned by a single coordinator thread per pool.
//!
//! ## Features
//!
//! - Hard cap on live objects with non-blocking, bounded and unbounded waits
//! - Lifecycle hooks: make, activate, passivate, validate, destroy
//! - Validation gates on create, borrow, return and while idle
//! - FIFO idle queue with periodic eviction of stale objects above a floor
//! - Timed-out waits never lose an object
//! - RAII guards, async wrappers, metrics and health reporting
//! - Two lighter variants: [`RecyclePool`] and [`BaselinePool`]
//!
//! ## Quick Start
//!
//! ```rust
//! use gompool::{CommonPool, DefaultPooledObjectFactory, PoolConfiguration};
//!
//! let factory = DefaultPooledObjectFactory::new(|| Vec::<u8>::with_capacity(4096))
//!     .on_passivate(|buf| buf.clear());
//! let pool = CommonPool::new(factory, PoolConfiguration::default()).unwrap();
//!
//! {
//!     let mut buf = pool.checkout().unwrap();
//!     buf.extend_from_slice(b"hello");
//!     // Buffer goes back to the pool when `buf` goes out of scope
//! }
//!
//! assert!(pool.get().unwrap().is_empty());
//! ```

mod baseline;
mod config;
mod coordinator;
mod entry;
mod errors;
mod eviction;
mod factory;
mod handoff;
mod health;
mod metrics;
mod pool;
mod recycle;

pub use baseline::{BaselineConfiguration, BaselinePool};
pub use config::{MaxWait, PoolConfiguration};
pub use errors::{PoolError, PoolResult};
pub use eviction::EvictionPolicy;
pub use factory::{DefaultPooledObjectFactory, PooledObjectFactory};
pub use health::HealthStatus;
#[cfg(feature = "metrics")]
pub use metrics::MetricsExporter;
pub use metrics::{PoolMetrics, PoolStatus};
pub use pool::{CommonPool, CommonPoolBuilder, Pool, PooledObject};
pub use recycle::{RecyclePool, RecyclePoolBuilder};

//! Error types for the object pool

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Pool cannot start without an object factory")]
    MissingFactory,

    #[error("Invalid pool configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Pool is exhausted - no idle object and no capacity left")]
    Exhausted,

    #[error("No object became available within {0:?}")]
    Timeout(std::time::Duration),

    #[error("Object validation failed")]
    ValidationFailed,

    #[error("Pool is closed")]
    Closed,

    #[error("Failed to start the pool coordinator: {0}")]
    Spawn(String),

    #[error("Operation was cancelled")]
    Cancelled,
}

pub type PoolResult<T> = Result<T, PoolError>;

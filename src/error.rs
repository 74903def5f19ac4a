use std::{
    fmt,
    sync::{MutexGuard, PoisonError},
};

/// A result type defaulting to [`SnowflakeError`].
pub type Result<T, E = SnowflakeError> = std::result::Result<T, E>;

/// The address field rejected by [`SnowflakeError::InvalidAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Worker,
    Datacenter,
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Worker => f.write_str("worker id"),
            Self::Datacenter => f.write_str("datacenter id"),
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SnowflakeError {
    #[error("invalid {field}(={value}), expected {field} ∈ [0,{max}]")]
    InvalidAddress { field: AddressField, value: u64, max: u64 },
    #[error("clock moved backwards: now(={now}) is before the last timestamp(={last_timestamp})")]
    ClockRegression { now: i64, last_timestamp: i64 },
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
    #[error("epoch(={epoch}) must not be later than the current time(={now})")]
    InvalidEpoch { epoch: i64, now: i64 },
    #[error("timestamp delta(={delta}) exceeds the layout maximum(={max})")]
    TimestampOverflow { delta: i64, max: u64 },
    #[error("generator state lock poisoned")]
    LockPoisoned,
}

impl<T> From<PoisonError<MutexGuard<'_, T>>> for SnowflakeError {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}

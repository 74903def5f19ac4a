use std::{
    cmp::Ordering,
    hint::spin_loop,
    sync::{Mutex, PoisonError},
};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    clock::{SystemClock, TimeSource},
    error::{AddressField, Result, SnowflakeError},
    layout::{Layout, LayoutOptions},
    parser::ParsedId,
};

const NEVER_ISSUED: i64 = -1;

#[derive(Debug, Clone, Copy)]
struct State {
    last_timestamp: i64, // Absolute time of the most recent ID, or NEVER_ISSUED
    sequence: u64,       // The sequence within last_timestamp
}

/// A Snowflake generator bound to one `(worker id, datacenter id)` address.
///
/// All mutable state sits behind a mutex, so a single generator can be shared
/// across threads (e.g. in an `Arc`) without losing uniqueness or ordering.
#[derive(Debug)]
pub struct Snowflake<C = SystemClock> {
    worker_id: u64,
    datacenter_id: u64,
    layout: Layout,
    state: Mutex<State>,
    clock: C,
}

impl Snowflake {
    /// Creates a generator using the default layout and the system clock.
    pub fn new(worker_id: u64, datacenter_id: u64) -> Result<Self> {
        Self::with_options(worker_id, datacenter_id, LayoutOptions::default())
    }

    pub fn with_options(worker_id: u64, datacenter_id: u64, options: LayoutOptions) -> Result<Self> {
        Self::with_clock(worker_id, datacenter_id, options, SystemClock)
    }

    pub fn builder() -> SnowflakeBuilder {
        SnowflakeBuilder::default()
    }
}

impl<C: TimeSource> Snowflake<C> {
    /// Creates a generator reading time from `clock`.
    ///
    /// # Errors
    ///
    /// - [`InvalidLayout`](SnowflakeError::InvalidLayout) if `options` does not
    ///   fit in 64 bits.
    /// - [`InvalidAddress`](SnowflakeError::InvalidAddress) if either id is out
    ///   of range for its field width.
    /// - [`InvalidEpoch`](SnowflakeError::InvalidEpoch) if the epoch is later
    ///   than the clock's current time.
    pub fn with_clock(worker_id: u64, datacenter_id: u64, options: LayoutOptions, clock: C) -> Result<Self> {
        let layout = options.build()?;

        if worker_id > layout.max_worker_id() {
            return Err(SnowflakeError::InvalidAddress {
                field: AddressField::Worker,
                value: worker_id,
                max: layout.max_worker_id(),
            });
        }

        if datacenter_id > layout.max_datacenter_id() {
            return Err(SnowflakeError::InvalidAddress {
                field: AddressField::Datacenter,
                value: datacenter_id,
                max: layout.max_datacenter_id(),
            });
        }

        let now = clock.current_millis();
        if layout.epoch() > now {
            return Err(SnowflakeError::InvalidEpoch {
                epoch: layout.epoch(),
                now,
            });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(worker_id, datacenter_id, ?layout, "created snowflake generator");

        Ok(Self {
            worker_id,
            datacenter_id,
            layout,
            state: Mutex::new(State {
                last_timestamp: NEVER_ISSUED,
                sequence: 0,
            }),
            clock,
        })
    }

    /// Issues the next ID.
    ///
    /// IDs from one generator strictly increase as long as the clock does not
    /// move backwards. When the sequence for the current millisecond is used
    /// up, the call spins until the clock ticks over, holding the lock.
    ///
    /// # Errors
    ///
    /// - [`ClockRegression`](SnowflakeError::ClockRegression) if the clock
    ///   reads earlier than the last issued timestamp.
    /// - [`InvalidEpoch`](SnowflakeError::InvalidEpoch) or
    ///   [`TimestampOverflow`](SnowflakeError::TimestampOverflow) if the time
    ///   cannot be represented in the layout.
    /// - [`LockPoisoned`](SnowflakeError::LockPoisoned) if another caller
    ///   panicked inside the generator.
    ///
    /// No state changes on any error path.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self), fields(worker_id = self.worker_id, datacenter_id = self.datacenter_id)))]
    pub fn next_id(&self) -> Result<u64> {
        let mut state = self.state.lock()?;
        let mut now = self.clock.current_millis();

        let sequence = match now.cmp(&state.last_timestamp) {
            Ordering::Less => return Err(Self::cold_clock_behind(now, state.last_timestamp)),
            // Multiple calls within the same millisecond advance the sequence
            Ordering::Equal => {
                let sequence = (state.sequence + 1) & self.layout.sequence_mask();
                if sequence == 0 {
                    now = self.til_next_millis(state.last_timestamp);
                }
                sequence
            }
            // First call in a new millisecond
            Ordering::Greater => 0,
        };

        let delta = self.layout.timestamp_delta(now)?;

        state.last_timestamp = now;
        state.sequence = sequence;

        Ok(self.layout.compose(delta, self.datacenter_id, self.worker_id, sequence))
    }

    fn til_next_millis(&self, last_timestamp: i64) -> i64 {
        let mut now = self.clock.current_millis();
        while now <= last_timestamp {
            spin_loop();
            now = self.clock.current_millis();
        }
        now
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: i64, last_timestamp: i64) -> SnowflakeError {
        #[cfg(feature = "tracing")]
        tracing::warn!(now, last_timestamp, "clock moved backwards, refusing to generate id");
        SnowflakeError::ClockRegression { now, last_timestamp }
    }

    /// Sequence value of the most recently issued ID.
    pub fn current_sequence(&self) -> u64 {
        self.snapshot().sequence
    }

    /// Absolute timestamp of the most recently issued ID, `-1` before the
    /// first one.
    pub fn last_timestamp(&self) -> i64 {
        self.snapshot().last_timestamp
    }

    // State is only written after every fallible step, so a poisoned lock
    // still guards a consistent value.
    fn snapshot(&self) -> State {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn worker_id(&self) -> u64 {
        self.worker_id
    }

    pub fn datacenter_id(&self) -> u64 {
        self.datacenter_id
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Parses `id` under this generator's layout.
    pub fn parse(&self, id: u64) -> ParsedId {
        self.layout.parse(id)
    }
}

/// Step-by-step construction of a [`Snowflake`].
///
/// ```
/// use dc_snowflake::Snowflake;
///
/// let snowflake = Snowflake::builder()
///     .with_worker_id_bits(4)
///     .with_worker_id(9)
///     .with_datacenter_id(3)
///     .with_epoch(1609459200000)
///     .build()
///     .unwrap();
/// assert_eq!(snowflake.worker_id(), 9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SnowflakeBuilder<C = SystemClock> {
    worker_id: u64,
    datacenter_id: u64,
    options: LayoutOptions,
    clock: C,
}

impl<C: TimeSource> SnowflakeBuilder<C> {
    pub fn with_worker_id(mut self, worker_id: u64) -> Self {
        self.worker_id = worker_id;
        self
    }

    pub fn with_datacenter_id(mut self, datacenter_id: u64) -> Self {
        self.datacenter_id = datacenter_id;
        self
    }

    pub fn with_options(mut self, options: LayoutOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_epoch(mut self, epoch: i64) -> Self {
        self.options = self.options.with_epoch(epoch);
        self
    }

    pub fn with_worker_id_bits(mut self, worker_id_bits: u32) -> Self {
        self.options = self.options.with_worker_id_bits(worker_id_bits);
        self
    }

    pub fn with_datacenter_id_bits(mut self, datacenter_id_bits: u32) -> Self {
        self.options = self.options.with_datacenter_id_bits(datacenter_id_bits);
        self
    }

    pub fn with_sequence_bits(mut self, sequence_bits: u32) -> Self {
        self.options = self.options.with_sequence_bits(sequence_bits);
        self
    }

    pub fn with_clock<T: TimeSource>(self, clock: T) -> SnowflakeBuilder<T> {
        SnowflakeBuilder {
            worker_id: self.worker_id,
            datacenter_id: self.datacenter_id,
            options: self.options,
            clock,
        }
    }

    /// See [`Snowflake::with_clock`] for the error cases.
    pub fn build(self) -> Result<Snowflake<C>> {
        Snowflake::with_clock(self.worker_id, self.datacenter_id, self.options, self.clock)
    }
}

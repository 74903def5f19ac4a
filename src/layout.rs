//! Bit layout of a Snowflake ID.
//!
//! ```text
//!  63 | 62 ........... timestamp_shift | ... datacenter_id_shift | ... worker_id_shift | ... 0
//! ----+--------------------------------+-------------------------+---------------------+------
//! 0   | timestamp - epoch              | datacenter id           | worker id           | seq
//! ```

use crate::{
    error::{Result, SnowflakeError},
    parser::{parse_id, ParsedId},
};

/// 2021-01-01 00:00:00.000 UTC
pub const DEFAULT_EPOCH: i64 = 1609459200000;
pub const DEFAULT_WORKER_ID_BITS: u32 = 5;
pub const DEFAULT_DATACENTER_ID_BITS: u32 = 5;
pub const DEFAULT_SEQUENCE_BITS: u32 = 12;

const SIGN_BITS: u32 = 1;
const MIN_TIMESTAMP_BITS: u32 = 1;
const MAX_ADJUSTABLE_BITS: u32 = u64::BITS - SIGN_BITS - MIN_TIMESTAMP_BITS;

/// `2^bits - 1`, saturating at `u64::MAX` for `bits >= 64`.
const fn low_bits(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        !(u64::MAX << bits)
    }
}

/// Largest worker id representable in `bits` bits.
pub const fn max_worker_id(bits: u32) -> u64 {
    low_bits(bits)
}

/// Largest datacenter id representable in `bits` bits.
pub const fn max_datacenter_id(bits: u32) -> u64 {
    low_bits(bits)
}

/// Mask applied to the sequence counter for a `bits`-wide sequence field.
pub const fn sequence_mask(bits: u32) -> u64 {
    low_bits(bits)
}

/// User-facing layout configuration. Every field can be overridden on its own;
/// anything left alone keeps the classic 41/5/5/12 layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LayoutOptions {
    /// Time origin in milliseconds since the Unix epoch.
    pub epoch: i64,
    pub worker_id_bits: u32,
    pub datacenter_id_bits: u32,
    pub sequence_bits: u32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            epoch: DEFAULT_EPOCH,
            worker_id_bits: DEFAULT_WORKER_ID_BITS,
            datacenter_id_bits: DEFAULT_DATACENTER_ID_BITS,
            sequence_bits: DEFAULT_SEQUENCE_BITS,
        }
    }
}

impl LayoutOptions {
    pub fn with_epoch(mut self, epoch: i64) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn with_worker_id_bits(mut self, worker_id_bits: u32) -> Self {
        self.worker_id_bits = worker_id_bits;
        self
    }

    pub fn with_datacenter_id_bits(mut self, datacenter_id_bits: u32) -> Self {
        self.datacenter_id_bits = datacenter_id_bits;
        self
    }

    pub fn with_sequence_bits(mut self, sequence_bits: u32) -> Self {
        self.sequence_bits = sequence_bits;
        self
    }

    /// Validates the field widths and derives shifts and masks.
    ///
    /// # Errors
    ///
    /// [`SnowflakeError::InvalidLayout`] if the worker, datacenter and sequence
    /// fields together leave no room for the sign bit and at least one
    /// timestamp bit.
    pub fn build(self) -> Result<Layout> {
        let adjustable = u64::from(self.worker_id_bits)
            + u64::from(self.datacenter_id_bits)
            + u64::from(self.sequence_bits);
        if adjustable > u64::from(MAX_ADJUSTABLE_BITS) {
            return Err(SnowflakeError::InvalidLayout(format!(
                "worker id bits(={}) + datacenter id bits(={}) + sequence bits(={}) = {adjustable}, expected at most {MAX_ADJUSTABLE_BITS}",
                self.worker_id_bits, self.datacenter_id_bits, self.sequence_bits,
            )));
        }
        Ok(Layout::derive(self))
    }
}

/// Shifts and masks derived from a validated [`LayoutOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    options: LayoutOptions,

    worker_id_shift: u32,
    datacenter_id_shift: u32,
    timestamp_shift: u32,

    max_worker_id: u64,
    max_datacenter_id: u64,
    sequence_mask: u64,
    max_timestamp: u64,
}

impl Default for Layout {
    fn default() -> Self {
        Self::derive(LayoutOptions::default())
    }
}

impl Layout {
    // Callers guarantee the widths sum to at most MAX_ADJUSTABLE_BITS.
    fn derive(options: LayoutOptions) -> Self {
        let worker_id_shift = options.sequence_bits;
        let datacenter_id_shift = worker_id_shift + options.worker_id_bits;
        let timestamp_shift = datacenter_id_shift + options.datacenter_id_bits;

        Self {
            options,
            worker_id_shift,
            datacenter_id_shift,
            timestamp_shift,
            max_worker_id: max_worker_id(options.worker_id_bits),
            max_datacenter_id: max_datacenter_id(options.datacenter_id_bits),
            sequence_mask: sequence_mask(options.sequence_bits),
            max_timestamp: low_bits(u64::BITS - SIGN_BITS - timestamp_shift),
        }
    }

    pub fn options(&self) -> LayoutOptions {
        self.options
    }

    pub fn epoch(&self) -> i64 {
        self.options.epoch
    }

    pub fn worker_id_shift(&self) -> u32 {
        self.worker_id_shift
    }

    pub fn datacenter_id_shift(&self) -> u32 {
        self.datacenter_id_shift
    }

    pub fn timestamp_shift(&self) -> u32 {
        self.timestamp_shift
    }

    pub fn max_worker_id(&self) -> u64 {
        self.max_worker_id
    }

    pub fn max_datacenter_id(&self) -> u64 {
        self.max_datacenter_id
    }

    pub fn sequence_mask(&self) -> u64 {
        self.sequence_mask
    }

    /// Largest `timestamp - epoch` delta the timestamp field can hold.
    pub fn max_timestamp(&self) -> u64 {
        self.max_timestamp
    }

    /// Converts an absolute timestamp into the delta stored in an ID.
    ///
    /// # Errors
    ///
    /// [`SnowflakeError::InvalidEpoch`] if `timestamp` precedes the epoch and
    /// [`SnowflakeError::TimestampOverflow`] if the delta does not fit.
    pub fn timestamp_delta(&self, timestamp: i64) -> Result<u64> {
        let delta = timestamp.saturating_sub(self.epoch());
        let Ok(unsigned) = u64::try_from(delta) else {
            return Err(SnowflakeError::InvalidEpoch {
                epoch: self.epoch(),
                now: timestamp,
            });
        };
        if unsigned > self.max_timestamp {
            return Err(SnowflakeError::TimestampOverflow {
                delta,
                max: self.max_timestamp,
            });
        }
        Ok(unsigned)
    }

    /// Packs already range-checked fields into an ID.
    pub fn compose(&self, delta: u64, datacenter_id: u64, worker_id: u64, sequence: u64) -> u64 {
        (delta << self.timestamp_shift)
            | (datacenter_id << self.datacenter_id_shift)
            | (worker_id << self.worker_id_shift)
            | sequence
    }

    pub fn parse(&self, id: u64) -> ParsedId {
        parse_id(id, self)
    }
}

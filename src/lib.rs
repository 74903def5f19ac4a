//! Snowflake is a unique ID generator that builds IDs from the current time, a
//! datacenter ID, a worker ID and a per-millisecond sequence value.
//!
//! IDs from one generator are strictly increasing:
//! - **Temporal Ordering**: the timestamp occupies the high bits, so IDs issued
//!   in a later millisecond are numerically larger.
//! - **Same Timestamp**: within one millisecond the sequence counter advances.
//!   Once it is used up the generator waits for the next millisecond.
//! - **Clock Skew**: if the clock moves backwards the generator refuses to
//!   issue IDs instead of risking a duplicate.
//!
//! Uniqueness across generators relies on every process using a distinct
//! `(worker id, datacenter id)` pair. Assigning those is up to the deployment.
//!
//! Default Snowflake ID structure:
//! - **Sign bit**: Always 0.
//! - **Timestamp**: 41 bits, milliseconds since the epoch (2021-01-01 UTC).
//! - **Datacenter ID**: 5 bits.
//! - **Worker ID**: 5 bits.
//! - **Sequence**: 12 bits.
//! - **Total**: 64 bits.
//!
//! Every width can be changed through [`LayoutOptions`]. The worker, datacenter
//! and sequence fields may take any width, including zero, as long as at least
//! one timestamp bit remains.
//!
//! # Examples
//!
//! ```
//! use dc_snowflake::Snowflake;
//!
//! // Create a generator for worker 1 in datacenter 1
//! let snowflake = Snowflake::new(1, 1).unwrap();
//!
//! let id = snowflake.next_id().unwrap();
//! let parsed = snowflake.parse(id);
//! assert_eq!(parsed.worker_id, 1);
//! assert_eq!(parsed.datacenter_id, 1);
//! assert_eq!(parsed.timestamp, snowflake.last_timestamp());
//! ```
//!
//! IDs can be decoded without a generator, as long as the layout matches:
//!
//! ```
//! use dc_snowflake::{parse_id, Layout};
//!
//! let id = (1 << 17) | (1 << 12) | 1;
//! let parsed = parse_id(id, &Layout::default());
//! assert_eq!(parsed.timestamp, 1609459200000);
//! assert_eq!(parsed.to_strings().sequence, "1");
//! ```
//!
//! # Errors
//!
//! - [`InvalidAddress`](SnowflakeError::InvalidAddress): the worker or
//!   datacenter ID does not fit its field.
//! - [`InvalidLayout`](SnowflakeError::InvalidLayout): the field widths do not
//!   fit in 64 bits.
//! - [`InvalidEpoch`](SnowflakeError::InvalidEpoch): the epoch is later than
//!   the current time.
//! - [`ClockRegression`](SnowflakeError::ClockRegression): the clock moved
//!   backwards since the last ID.
//! - [`TimestampOverflow`](SnowflakeError::TimestampOverflow): the time since
//!   the epoch no longer fits the timestamp field.
//! - [`LockPoisoned`](SnowflakeError::LockPoisoned): a thread panicked while
//!   holding the generator.
//!
//! # Features
//!
//! - `serde`: `Serialize`/`Deserialize` for [`LayoutOptions`], [`ParsedId`]
//!   and [`ParsedIdStrings`].
//! - `tracing`: spans around ID generation and events on construction and
//!   clock regression.

mod clock;
mod error;
mod generator;
mod layout;
mod parser;

pub use crate::{
    clock::{SystemClock, TimeSource},
    error::{AddressField, Result, SnowflakeError},
    generator::{Snowflake, SnowflakeBuilder},
    layout::{
        max_datacenter_id, max_worker_id, sequence_mask, Layout, LayoutOptions, DEFAULT_DATACENTER_ID_BITS,
        DEFAULT_EPOCH, DEFAULT_SEQUENCE_BITS, DEFAULT_WORKER_ID_BITS,
    },
    parser::{parse_id, ParsedId, ParsedIdStrings},
};

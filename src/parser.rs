use std::fmt;

use crate::layout::Layout;

/// The four fields recovered from a Snowflake ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedId {
    /// Absolute milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub datacenter_id: u64,
    pub worker_id: u64,
    pub sequence: u64,
}

/// [`ParsedId`] with every field rendered in decimal, for consumers that
/// cannot hold a full 64-bit integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedIdStrings {
    pub timestamp: String,
    pub datacenter_id: String,
    pub worker_id: String,
    pub sequence: String,
}

impl ParsedId {
    pub fn to_strings(&self) -> ParsedIdStrings {
        ParsedIdStrings {
            timestamp: self.timestamp.to_string(),
            datacenter_id: self.datacenter_id.to_string(),
            worker_id: self.worker_id.to_string(),
            sequence: self.sequence.to_string(),
        }
    }
}

impl fmt::Display for ParsedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "timestamp={} datacenter_id={} worker_id={} sequence={}",
            self.timestamp, self.datacenter_id, self.worker_id, self.sequence
        )
    }
}

/// Splits `id` into its fields under `layout`.
///
/// Any integer parses. An ID produced under a different layout decodes to
/// meaningless values; keeping the layouts in sync is up to the caller.
pub fn parse_id(id: u64, layout: &Layout) -> ParsedId {
    let delta = i64::try_from(id >> layout.timestamp_shift()).unwrap_or(i64::MAX);

    ParsedId {
        timestamp: delta.saturating_add(layout.epoch()),
        datacenter_id: (id >> layout.datacenter_id_shift()) & layout.max_datacenter_id(),
        worker_id: (id >> layout.worker_id_shift()) & layout.max_worker_id(),
        sequence: id & layout.sequence_mask(),
    }
}

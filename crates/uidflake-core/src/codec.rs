use crate::{layout::BitLayout, Uid};
use jiff::Timestamp;
use serde::Serialize;
use std::fmt;

/// Fields recovered from a UID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedUid {
    pub uid: Uid,
    /// `epoch + delta` time units.
    pub timestamp: Timestamp,
    /// Time units elapsed since the layout's epoch.
    pub delta: u64,
    pub worker_id: u64,
    pub sequence: u64,
}

impl fmt::Display for DecodedUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uid={} timestamp={} worker_id={} sequence={}",
            self.uid, self.timestamp, self.worker_id, self.sequence
        )
    }
}

/// Splits UIDs back into their fields.
///
/// Decoding only gives meaningful results with the same [`BitLayout`] the
/// allocator used. Any 64-bit value decodes; whether it was ever issued is not
/// checked.
#[derive(Debug, Clone, Copy)]
pub struct UidCodec {
    layout: BitLayout,
}

impl UidCodec {
    pub fn new(layout: BitLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &BitLayout {
        &self.layout
    }

    pub fn decode(&self, uid: Uid) -> DecodedUid {
        let raw = uid.as_u64();
        let layout = &self.layout;

        let sequence = raw & layout.max_sequence();
        let worker_id = (raw >> layout.worker_id_shift()) & layout.max_worker_id();
        let delta = (raw >> layout.timestamp_shift()) & layout.max_delta();

        DecodedUid {
            uid,
            timestamp: self.timestamp_of(delta),
            delta,
            worker_id,
            sequence,
        }
    }

    /// Saturates at the edge of the representable range for layouts whose
    /// timestamp field outlives it.
    fn timestamp_of(&self, delta: u64) -> Timestamp {
        self.layout.timestamp_at(delta).unwrap_or(Timestamp::MAX)
    }
}

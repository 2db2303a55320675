use crate::{error::Error, Uid};
use jiff::{SignedDuration, Timestamp};
use std::fmt;
use typed_builder::TypedBuilder;

/// Number of bits available to the three payload fields. The most significant
/// bit of every UID is a sign bit that is always zero.
pub const PAYLOAD_BITS: u16 = 63;

/// Granularity at which the timestamp field advances and the sequence resets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    #[default]
    Seconds,
    Milliseconds,
}

impl TimeUnit {
    fn nanos(self) -> i128 {
        match self {
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Milliseconds => 1_000_000,
        }
    }

    /// Whole units from `from` to `to`, rounded towards negative infinity.
    pub fn units_between(self, from: Timestamp, to: Timestamp) -> i64 {
        let units = to.duration_since(from).as_nanos().div_euclid(self.nanos());
        // every pair of jiff timestamps is well inside i64 units
        i64::try_from(units).unwrap_or(if units < 0 { i64::MIN } else { i64::MAX })
    }

    /// The length of `units` units.
    pub fn duration(self, units: i64) -> SignedDuration {
        match self {
            TimeUnit::Seconds => SignedDuration::from_secs(units),
            TimeUnit::Milliseconds => SignedDuration::from_millis(units),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Seconds => f.write_str("s"),
            TimeUnit::Milliseconds => f.write_str("ms"),
        }
    }
}

/// Raw parameters of a [`BitLayout`]; validated by [`BitLayout::new`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct LayoutSettings {
    /// Width of the time-delta field.
    pub timestamp_bits: u8,
    /// Width of the worker id field.
    pub worker_id_bits: u8,
    /// Width of the per-time-unit sequence field.
    pub sequence_bits: u8,
    /// Zero point of the time-delta field.
    ///
    /// Must stay fixed for the lifetime of a deployment, moving it breaks
    /// uniqueness against UIDs issued earlier.
    pub epoch: Timestamp,
    #[builder(default)]
    pub time_unit: TimeUnit,
}

/// The validated partition of a 64-bit UID.
///
/// ```text
/// | sign (1) | delta (timestamp_bits) | worker id (worker_id_bits) | sequence (sequence_bits) |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitLayout {
    timestamp_bits: u8,
    worker_id_bits: u8,
    sequence_bits: u8,
    epoch: Timestamp,
    time_unit: TimeUnit,
    max_delta: u64,
    max_worker_id: u64,
    max_sequence: u64,
}

impl BitLayout {
    pub fn new(settings: LayoutSettings) -> Result<Self, Error> {
        for (field, bits) in [
            ("timestamp", settings.timestamp_bits),
            ("worker id", settings.worker_id_bits),
            ("sequence", settings.sequence_bits),
        ] {
            if bits == 0 {
                return Err(Error::ZeroWidth { field });
            }
        }

        let total = u16::from(settings.timestamp_bits)
            + u16::from(settings.worker_id_bits)
            + u16::from(settings.sequence_bits);
        if total != PAYLOAD_BITS {
            return Err(Error::InvalidBitWidths { total });
        }

        Ok(Self {
            timestamp_bits: settings.timestamp_bits,
            worker_id_bits: settings.worker_id_bits,
            sequence_bits: settings.sequence_bits,
            epoch: settings.epoch,
            time_unit: settings.time_unit,
            max_delta: max_for(settings.timestamp_bits),
            max_worker_id: max_for(settings.worker_id_bits),
            max_sequence: max_for(settings.sequence_bits),
        })
    }

    pub fn timestamp_bits(&self) -> u8 {
        self.timestamp_bits
    }

    pub fn worker_id_bits(&self) -> u8 {
        self.worker_id_bits
    }

    pub fn sequence_bits(&self) -> u8 {
        self.sequence_bits
    }

    pub fn epoch(&self) -> Timestamp {
        self.epoch
    }

    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    /// Whole time units elapsed from the epoch to `now`, negative before it.
    pub fn units_since_epoch(&self, now: Timestamp) -> i64 {
        self.time_unit.units_between(self.epoch, now)
    }

    /// The instant `delta` time units after the epoch, `None` when it falls
    /// outside the range of [`Timestamp`].
    pub fn timestamp_at(&self, delta: u64) -> Option<Timestamp> {
        let units = i64::try_from(delta).ok()?;
        self.epoch.checked_add(self.time_unit.duration(units)).ok()
    }

    pub fn max_delta(&self) -> u64 {
        self.max_delta
    }

    pub fn max_worker_id(&self) -> u64 {
        self.max_worker_id
    }

    pub fn max_sequence(&self) -> u64 {
        self.max_sequence
    }

    pub(crate) fn worker_id_shift(&self) -> u32 {
        u32::from(self.sequence_bits)
    }

    pub(crate) fn timestamp_shift(&self) -> u32 {
        u32::from(self.sequence_bits) + u32::from(self.worker_id_bits)
    }

    /// Packs the three fields into a UID, most significant field first.
    ///
    /// Callers must have checked each value against its maximum; bits outside
    /// a field's width are dropped.
    pub(crate) fn compose(&self, delta: u64, worker_id: u64, sequence: u64) -> Uid {
        debug_assert!(delta <= self.max_delta);
        debug_assert!(worker_id <= self.max_worker_id);
        debug_assert!(sequence <= self.max_sequence);

        Uid::new(
            ((delta & self.max_delta) << self.timestamp_shift())
                | ((worker_id & self.max_worker_id) << self.worker_id_shift())
                | (sequence & self.max_sequence),
        )
    }
}

fn max_for(bits: u8) -> u64 {
    (1_u64 << bits) - 1
}

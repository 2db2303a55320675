use crate::{
    clock::{Clock, SystemClock},
    codec::{DecodedUid, UidCodec},
    error::{Error, Result},
    layout::BitLayout,
    worker::WorkerIdAssigner,
    Uid,
};
use std::sync::Mutex;
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

/// Per-process parameters of a [`UidAllocator`].
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct AllocatorSettings {
    /// This process's worker id, in `0..=layout.max_worker_id()`.
    pub worker_id: u64,
    /// First sequence value used in every time unit.
    #[builder(default)]
    pub start_sequence: u64,
}

#[derive(Debug, Default)]
struct AllocatorState {
    /// Delta of the most recently issued UID, `None` before the first one.
    last_delta: Option<u64>,
    sequence: u64,
}

/// Issues unique, time-ordered UIDs for one worker id.
///
/// Construct one allocator per process and share it, every call serializes on
/// one internal lock. UIDs returned by calls that complete one after the other
/// are strictly increasing.
pub struct UidAllocator<C: Clock = SystemClock> {
    codec: UidCodec,
    worker_id: u64,
    start_sequence: u64,
    clock: C,
    state: Mutex<AllocatorState>,
}

impl UidAllocator<SystemClock> {
    /// Creates an allocator backed by the real system clock.
    pub fn new(layout: BitLayout, settings: AllocatorSettings) -> Result<Self> {
        Self::with_clock(layout, settings, SystemClock)
    }

    /// Creates an allocator whose worker id comes from `assigner`.
    pub fn from_assigner(layout: BitLayout, assigner: &impl WorkerIdAssigner) -> Result<Self> {
        let worker_id = assigner.assign_worker_id()?;
        Self::new(
            layout,
            AllocatorSettings::builder().worker_id(worker_id).build(),
        )
    }
}

impl<C: Clock> UidAllocator<C> {
    pub fn with_clock(layout: BitLayout, settings: AllocatorSettings, clock: C) -> Result<Self> {
        if settings.worker_id > layout.max_worker_id() {
            return Err(Error::InvalidWorkerId {
                worker_id: settings.worker_id,
                max_worker_id: layout.max_worker_id(),
            });
        }

        if settings.start_sequence > layout.max_sequence() {
            return Err(Error::InvalidStartSequence {
                start_sequence: settings.start_sequence,
                max_sequence: layout.max_sequence(),
            });
        }

        let now = clock.now();
        if layout.epoch() > now {
            return Err(Error::EpochAhead {
                epoch: layout.epoch(),
                now,
            });
        }

        info!(
            worker_id = settings.worker_id,
            timestamp_bits = layout.timestamp_bits(),
            worker_id_bits = layout.worker_id_bits(),
            sequence_bits = layout.sequence_bits(),
            epoch = %layout.epoch(),
            time_unit = %layout.time_unit(),
            "uid allocator initialized"
        );

        Ok(Self {
            codec: UidCodec::new(layout),
            worker_id: settings.worker_id,
            start_sequence: settings.start_sequence,
            clock,
            state: Mutex::new(AllocatorState::default()),
        })
    }

    pub fn worker_id(&self) -> u64 {
        self.worker_id
    }

    pub fn layout(&self) -> &BitLayout {
        self.codec.layout()
    }

    pub fn codec(&self) -> &UidCodec {
        &self.codec
    }

    /// Decodes a UID with this allocator's layout.
    pub fn decode(&self, uid: Uid) -> DecodedUid {
        self.codec.decode(uid)
    }

    /// Allocates the next UID.
    ///
    /// Blocks for at most one time unit when the current unit's sequence is
    /// exhausted. Fails without touching the allocator state when the clock is
    /// behind the last issued UID or the timestamp field is saturated; retrying
    /// is left to the caller.
    pub fn allocate(&self) -> Result<Uid> {
        let mut state = self.state.lock().map_err(|_| Error::StatePoisoned)?;
        let layout = self.codec.layout();

        let current = self.current_units();
        let (delta, sequence) = match state.last_delta {
            Some(last) if current < last as i64 => {
                return Err(self.rolled_back(last, current));
            }
            Some(last) if current == last as i64 => {
                if state.sequence < layout.max_sequence() {
                    (last, state.sequence + 1)
                } else {
                    debug!(
                        delta = last,
                        max_sequence = layout.max_sequence(),
                        "sequence exhausted, waiting for next time unit"
                    );
                    (self.wait_next_unit(last)?, self.start_sequence)
                }
            }
            Some(_) => (current as u64, self.start_sequence),
            None => (self.delta_from_epoch(current)?, self.start_sequence),
        };

        if delta > layout.max_delta() {
            error!(
                delta,
                max_delta = layout.max_delta(),
                epoch = %layout.epoch(),
                "timestamp field exhausted for this epoch"
            );
            return Err(Error::TimestampOverflow {
                delta,
                max_delta: layout.max_delta(),
            });
        }

        state.last_delta = Some(delta);
        state.sequence = sequence;

        Ok(layout.compose(delta, self.worker_id, sequence))
    }

    /// Whole time units between the epoch and the clock, negative when the
    /// clock reads earlier than the epoch.
    fn current_units(&self) -> i64 {
        self.codec.layout().units_since_epoch(self.clock.now())
    }

    fn delta_from_epoch(&self, current: i64) -> Result<u64> {
        u64::try_from(current).map_err(|_| Error::EpochAhead {
            epoch: self.codec.layout().epoch(),
            now: self.clock.now(),
        })
    }

    /// Waits until the clock passes `last` and returns the new delta.
    fn wait_next_unit(&self, last: u64) -> Result<u64> {
        let layout = self.codec.layout();
        let next = last + 1;
        let target = layout
            .timestamp_at(next)
            .ok_or_else(|| Error::TimestampOverflow {
                delta: next,
                max_delta: layout.max_delta(),
            })?;

        loop {
            self.clock.wait_until(target);
            let current = self.current_units();
            if current > last as i64 {
                return Ok(current as u64);
            }
            if current < last as i64 {
                return Err(self.rolled_back(last, current));
            }
        }
    }

    fn rolled_back(&self, last: u64, current: i64) -> Error {
        let by = (last as i64).abs_diff(current);
        let unit = self.codec.layout().time_unit();
        warn!(
            worker_id = self.worker_id,
            last_delta = last,
            current_delta = current,
            "clock moved backwards by {by}{unit}"
        );
        Error::ClockRolledBack { by, unit }
    }
}

use crate::layout::TimeUnit;
use jiff::Timestamp;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by layout validation, allocator construction and UID allocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("{field} width must be at least one bit")]
    ZeroWidth { field: &'static str },
    #[error("bit widths sum to {total}; timestamp + worker id + sequence must be 63")]
    InvalidBitWidths { total: u16 },
    #[error("invalid worker id {worker_id}; expected 0..={max_worker_id}")]
    InvalidWorkerId { worker_id: u64, max_worker_id: u64 },
    #[error("invalid start sequence {start_sequence}; expected 0..={max_sequence}")]
    InvalidStartSequence {
        start_sequence: u64,
        max_sequence: u64,
    },
    #[error("epoch is ahead of current clock time: epoch={epoch}, now={now}")]
    EpochAhead { epoch: Timestamp, now: Timestamp },
    #[error("worker id could not be assigned: {0}")]
    WorkerIdUnavailable(String),
    #[error("clock moved backwards by {by}{unit}; refusing to allocate")]
    ClockRolledBack { by: u64, unit: TimeUnit },
    #[error("timestamp delta {delta} exceeds the layout limit {max_delta}")]
    TimestampOverflow { delta: u64, max_delta: u64 },
    #[error("allocator state lock is poisoned")]
    StatePoisoned,
    #[error("invalid uid: {0}")]
    InvalidUid(String),
}

impl Error {
    /// Returns `true` for errors that can only be fixed by changing the
    /// layout, the worker id or the epoch.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::ZeroWidth { .. }
                | Error::InvalidBitWidths { .. }
                | Error::InvalidWorkerId { .. }
                | Error::InvalidStartSequence { .. }
                | Error::EpochAhead { .. }
                | Error::WorkerIdUnavailable(_)
        )
    }
}

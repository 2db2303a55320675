//! Time-ordered 64-bit unique identifiers.
//!
//! A [`BitLayout`] partitions every [`Uid`] into a zero sign bit, the time
//! units elapsed since an epoch, a worker id and a per-unit sequence. A
//! [`UidAllocator`] issues UIDs for one worker id and a [`UidCodec`] splits
//! them back into their fields.

mod allocator;
mod clock;
mod codec;
pub mod error;
mod generator;
mod layout;
mod uid;
mod worker;

pub use allocator::{AllocatorSettings, UidAllocator};
pub use clock::{Clock, SystemClock};
pub use codec::{DecodedUid, UidCodec};
pub use error::{Error, Result};
pub use generator::UidGenerator;
pub use layout::{BitLayout, LayoutSettings, TimeUnit, PAYLOAD_BITS};
pub use uid::Uid;
pub use worker::{StaticWorkerIdAssigner, WorkerIdAssigner};

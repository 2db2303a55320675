use crate::{allocator::UidAllocator, clock::Clock, error::Result, Uid};

/// Generates UIDs and renders them back for humans.
///
/// Implementations are pure allocators that never persist or transmit UIDs.
pub trait UidGenerator: Send + Sync {
    /// Returns a fresh UID.
    fn get_uid(&self) -> Result<Uid>;
    /// Renders the fields of `uid` as a single line.
    fn parse_uid(&self, uid: Uid) -> String;
}

impl<C: Clock> UidGenerator for UidAllocator<C> {
    fn get_uid(&self) -> Result<Uid> {
        self.allocate()
    }

    fn parse_uid(&self, uid: Uid) -> String {
        self.decode(uid).to_string()
    }
}

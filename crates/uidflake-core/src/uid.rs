use crate::error::Error;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A 64-bit unique identifier.
///
/// The value is opaque; use [`UidCodec`](crate::UidCodec) with the layout that
/// produced it to recover its fields. UIDs issued by one allocator order the
/// same way they were allocated.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Uid(u64);

impl Uid {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Encodes the big-endian bytes of the UID as base58.
    pub fn to_base58(self) -> String {
        bs58::encode(self.0.to_be_bytes()).into_string()
    }

    /// Parses the output of [`Uid::to_base58`].
    pub fn from_base58(encoded: &str) -> Result<Self, Error> {
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|err| Error::InvalidUid(format!("{encoded}: {err}")))?;
        let raw: [u8; 8] = bytes
            .try_into()
            .map_err(|_| Error::InvalidUid(format!("{encoded}: expected 8 bytes")))?;
        Ok(Self(u64::from_be_bytes(raw)))
    }
}

impl From<u64> for Uid {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl From<Uid> for u64 {
    fn from(uid: Uid) -> Self {
        uid.0
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Uid").field(&self.0).finish()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Parses a decimal UID. Values with the sign bit set are rejected.
impl FromStr for Uid {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u64 = s
            .trim()
            .parse()
            .map_err(|err| Error::InvalidUid(format!("{s}: {err}")))?;
        if raw > i64::MAX as u64 {
            return Err(Error::InvalidUid(format!("{s}: sign bit is set")));
        }
        Ok(Self(raw))
    }
}

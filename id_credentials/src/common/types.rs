//! Small types shared between the transaction layer and the identity layer.

use super::{Buffer, Deserial, Get, ParseResult, SerdeDeserialize, SerdeSerialize, Serial};
use byteorder::ReadBytesExt;
use derive_more::{Display, From, Into};
use std::{num::ParseIntError, str::FromStr};

/// Index of an account key that is to be used.
#[derive(
    Debug,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Clone,
    Copy,
    Hash,
    Display,
    From,
    Into,
    SerdeSerialize,
    SerdeDeserialize,
)]
#[repr(transparent)]
#[serde(transparent)]
pub struct KeyIndex(pub u8);

impl Serial for KeyIndex {
    fn serial<B: Buffer>(&self, out: &mut B) { self.0.serial(out) }
}

impl Deserial for KeyIndex {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> { Ok(KeyIndex(source.get()?)) }
}

/// Datatype used to indicate transaction expiry, and the current time as seen
/// by the verifier.
#[derive(SerdeDeserialize, SerdeSerialize, PartialEq, Eq, Debug, Clone, Copy, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TransactionTime {
    /// Seconds since the unix epoch.
    pub seconds: u64,
}

impl TransactionTime {
    /// Construct a timestamp from seconds since the unix epoch.
    pub fn from_seconds(seconds: u64) -> Self { Self { seconds } }
}

impl From<u64> for TransactionTime {
    fn from(seconds: u64) -> Self { Self { seconds } }
}

impl FromStr for TransactionTime {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let seconds = u64::from_str(s)?;
        Ok(Self { seconds })
    }
}

impl Serial for TransactionTime {
    fn serial<B: Buffer>(&self, out: &mut B) { self.seconds.serial(out) }
}

impl Deserial for TransactionTime {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        Ok(Self::from_seconds(source.get()?))
    }
}

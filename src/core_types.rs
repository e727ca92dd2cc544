//! Core types used throughout the system
//!
//! Identifiers shared by the ledger, the reward generator and the cache.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Player ID - the account key in the ledger.
///
/// # Constraints:
/// - **Immutable**: assigned by the front end (chat platform user id)
/// - **Stored as BIGINT**: values must fit in `i64`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl PlayerId {
    /// Reserved identity of the system/bot.
    ///
    /// Appears as `from` on entries for minted items and granted crates,
    /// and may never be the receiver of a crate trade.
    pub const SYSTEM: PlayerId = PlayerId(1);

    #[inline]
    pub fn is_system(&self) -> bool {
        *self == Self::SYSTEM
    }

    /// Value bound into BIGINT columns
    #[inline]
    pub fn as_db(&self) -> i64 {
        self.0 as i64
    }

    #[inline]
    pub fn from_db(v: i64) -> Self {
        Self(v as u64)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PlayerId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

impl FromStr for PlayerId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Item ID - ULID based, generated at mint time.
///
/// Monotonic and sortable, no coordination with the database needed
/// before the insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(ulid::Ulid);

impl ItemId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ItemId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

impl Serialize for ItemId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

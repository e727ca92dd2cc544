//! Rarity Table
//!
//! Five closed rarity tiers, each mapped to three weighted stat buckets.
//! Buckets are ordered rarest (highest stats) first.
//!
//! ```text
//! rarity     | 20%     | 30%     | 50%
//! -----------+---------+---------+--------
//! common     | 20-30   | 10-19   | 1-9
//! uncommon   | 30-35   | 20-29   | 10-19
//! rare       | 35-40   | 30-34   | 20-29
//! magic      | 41-45   | 35-40   | 30-34
//! legendary  | 49-50   | 46-48   | 41-45
//! ```
//!
//! Bucket selection uses a single draw in `[0, 10)`: `< 2` picks the first
//! bucket, `< 5` the second, anything else the third.

use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CrateError;

/// Crate / reward rarity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Rarity {
    Common = 0,
    Uncommon = 1,
    Rare = 2,
    Magic = 3,
    Legendary = 4,
}

impl Rarity {
    /// All tiers, lowest first
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Magic,
        Rarity::Legendary,
    ];

    /// Slot in a [`CrateCounts`] record
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Magic => "magic",
            Rarity::Legendary => "legendary",
        }
    }

    /// Ledger column holding this tier's crate counter.
    ///
    /// Only ever produced from the closed enum, so it is safe to splice
    /// into SQL text.
    pub const fn column(&self) -> &'static str {
        match self {
            Rarity::Common => "crates_common",
            Rarity::Uncommon => "crates_uncommon",
            Rarity::Rare => "crates_rare",
            Rarity::Magic => "crates_magic",
            Rarity::Legendary => "crates_legendary",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = CrateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "common" => Ok(Rarity::Common),
            "uncommon" => Ok(Rarity::Uncommon),
            "rare" => Ok(Rarity::Rare),
            "magic" => Ok(Rarity::Magic),
            "legendary" => Ok(Rarity::Legendary),
            _ => Err(CrateError::InvalidRarity(s.to_string())),
        }
    }
}

/// One weighted stat range of a rarity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatBucket {
    /// Percent weight; the three buckets of a tier sum to 100
    pub weight: u32,
    pub min_stat: u32,
    pub max_stat: u32,
}

impl StatBucket {
    const fn new(weight: u32, min_stat: u32, max_stat: u32) -> Self {
        Self {
            weight,
            min_stat,
            max_stat,
        }
    }

    #[inline]
    pub fn contains(&self, stat: u32) -> bool {
        (self.min_stat..=self.max_stat).contains(&stat)
    }
}

/// Exclusive upper bound of the bucket draw
pub const DRAW_BOUND: u32 = 10;

/// Draw thresholds: `< 2` first bucket, `< 5` second, else third
const FIRST_BUCKET_BELOW: u32 = 2;
const SECOND_BUCKET_BELOW: u32 = 5;

static TABLE: [[StatBucket; 3]; 5] = [
    // common
    [
        StatBucket::new(20, 20, 30),
        StatBucket::new(30, 10, 19),
        StatBucket::new(50, 1, 9),
    ],
    // uncommon
    [
        StatBucket::new(20, 30, 35),
        StatBucket::new(30, 20, 29),
        StatBucket::new(50, 10, 19),
    ],
    // rare
    [
        StatBucket::new(20, 35, 40),
        StatBucket::new(30, 30, 34),
        StatBucket::new(50, 20, 29),
    ],
    // magic
    [
        StatBucket::new(20, 41, 45),
        StatBucket::new(30, 35, 40),
        StatBucket::new(50, 30, 34),
    ],
    // legendary
    [
        StatBucket::new(20, 49, 50),
        StatBucket::new(30, 46, 48),
        StatBucket::new(50, 41, 45),
    ],
];

/// Buckets of a tier, rarest first
#[inline]
pub fn buckets_for(rarity: Rarity) -> &'static [StatBucket; 3] {
    &TABLE[rarity.index()]
}

/// Same as [`buckets_for`] for an unparsed tier name
pub fn buckets_for_name(rarity: &str) -> Result<&'static [StatBucket; 3], CrateError> {
    Ok(buckets_for(rarity.parse()?))
}

/// Map a draw in `[0, DRAW_BOUND)` to a bucket index
#[inline]
pub fn bucket_index_for_draw(draw: u32) -> usize {
    if draw < FIRST_BUCKET_BELOW {
        0
    } else if draw < SECOND_BUCKET_BELOW {
        1
    } else {
        2
    }
}

#[inline]
pub fn bucket_for_draw(rarity: Rarity, draw: u32) -> StatBucket {
    buckets_for(rarity)[bucket_index_for_draw(draw)]
}

/// Per-player crate counters, one slot per [`Rarity`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrateCounts([u64; 5]);

impl CrateCounts {
    pub const fn new(counts: [u64; 5]) -> Self {
        Self(counts)
    }

    pub fn with(mut self, rarity: Rarity, count: u64) -> Self {
        self[rarity] = count;
        self
    }

    #[inline]
    pub fn get(&self, rarity: Rarity) -> u64 {
        self[rarity]
    }

    /// Apply a relative change; `None` if the counter would leave `u64`
    pub fn apply_delta(&mut self, rarity: Rarity, delta: i64) -> Option<u64> {
        let slot = &mut self[rarity];
        let next = slot.checked_add_signed(delta)?;
        *slot = next;
        Some(next)
    }

    pub fn total(&self) -> u64 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Rarity, u64)> + '_ {
        Rarity::ALL.iter().map(move |r| (*r, self[*r]))
    }
}

impl Index<Rarity> for CrateCounts {
    type Output = u64;

    fn index(&self, rarity: Rarity) -> &u64 {
        &self.0[rarity.index()]
    }
}

impl IndexMut<Rarity> for CrateCounts {
    fn index_mut(&mut self, rarity: Rarity) -> &mut u64 {
        &mut self.0[rarity.index()]
    }
}

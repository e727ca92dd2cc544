//! Item minting collaborator
//!
//! Turns a stat range and a value range into a concrete [`Item`].
//! Persisting the item is the ledger's job, not the minter's.

use std::sync::Arc;

use super::item::{Item, ItemType};
use super::random::RandomSource;
use crate::core_types::{ItemId, PlayerId};

/// Value range used for crate rewards
pub const MIN_ITEM_VALUE: u32 = 1;
pub const MAX_ITEM_VALUE: u32 = 250;

const ADJECTIVES: [&str; 10] = [
    "Ancient",
    "Blessed",
    "Cursed",
    "Gleaming",
    "Rusty",
    "Shadow",
    "Storm",
    "Tempered",
    "Vicious",
    "Whispering",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintRequest {
    pub min_stat: u32,
    pub max_stat: u32,
    pub min_value: u32,
    pub max_value: u32,
    pub owner: PlayerId,
}

impl MintRequest {
    /// Request with the crate reward value range
    pub fn for_crate(min_stat: u32, max_stat: u32, owner: PlayerId) -> Self {
        Self {
            min_stat,
            max_stat,
            min_value: MIN_ITEM_VALUE,
            max_value: MAX_ITEM_VALUE,
            owner,
        }
    }
}

pub trait ItemMinter: Send + Sync {
    fn mint(&self, req: &MintRequest) -> Item;
}

/// Uniform type, stat, value and name
pub struct RandomItemMinter {
    rng: Arc<dyn RandomSource>,
}

impl RandomItemMinter {
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self { rng }
    }
}

impl ItemMinter for RandomItemMinter {
    fn mint(&self, req: &MintRequest) -> Item {
        let item_type = ItemType::ALL[self.rng.next_int(ItemType::ALL.len() as u32) as usize];
        let stat = self.rng.range_inclusive(req.min_stat, req.max_stat);
        let value = self.rng.range_inclusive(req.min_value, req.max_value);
        let adjective = ADJECTIVES[self.rng.next_int(ADJECTIVES.len() as u32) as usize];

        let (damage, armor) = if item_type.is_armor() {
            (0, stat)
        } else {
            (stat, 0)
        };

        Item {
            id: ItemId::new(),
            name: format!("{adjective} {item_type}"),
            item_type,
            damage,
            armor,
            value,
            owner: req.owner,
        }
    }
}

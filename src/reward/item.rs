//! Reward items

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core_types::{ItemId, PlayerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    Sword,
    Shield,
    Axe,
    Wand,
    Dagger,
    Knife,
    Spear,
    Bow,
    Hammer,
    Scythe,
    Howitzer,
}

impl ItemType {
    pub const ALL: [ItemType; 11] = [
        ItemType::Sword,
        ItemType::Shield,
        ItemType::Axe,
        ItemType::Wand,
        ItemType::Dagger,
        ItemType::Knife,
        ItemType::Spear,
        ItemType::Bow,
        ItemType::Hammer,
        ItemType::Scythe,
        ItemType::Howitzer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Sword => "Sword",
            ItemType::Shield => "Shield",
            ItemType::Axe => "Axe",
            ItemType::Wand => "Wand",
            ItemType::Dagger => "Dagger",
            ItemType::Knife => "Knife",
            ItemType::Spear => "Spear",
            ItemType::Bow => "Bow",
            ItemType::Hammer => "Hammer",
            ItemType::Scythe => "Scythe",
            ItemType::Howitzer => "Howitzer",
        }
    }

    /// Armor types carry `armor`, everything else carries `damage`
    #[inline]
    pub fn is_armor(&self) -> bool {
        matches!(self, ItemType::Shield)
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown item type: {s}"))
    }
}

/// Which stat field of an item is populated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Damage,
    Armor,
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatKind::Damage => f.write_str("damage"),
            StatKind::Armor => f.write_str("armor"),
        }
    }
}

/// A minted item. Exactly one of `damage` / `armor` is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub item_type: ItemType,
    pub damage: u32,
    pub armor: u32,
    pub value: u32,
    pub owner: PlayerId,
}

impl Item {
    pub fn stat_kind(&self) -> StatKind {
        if self.item_type.is_armor() {
            StatKind::Armor
        } else {
            StatKind::Damage
        }
    }

    /// The populated stat
    pub fn stat(&self) -> u32 {
        match self.stat_kind() {
            StatKind::Damage => self.damage,
            StatKind::Armor => self.armor,
        }
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Item[{}] {} ({}) {} {} value=${} owner={}",
            self.id,
            self.name,
            self.item_type,
            self.stat(),
            self.stat_kind(),
            self.value,
            self.owner
        )
    }
}

//! Public announcements for notable rewards
//!
//! Legendary rewards are always announced. Magic rewards are announced only
//! when the stat reaches [`MAGIC_ANNOUNCE_THRESHOLD`], damage checked first.

use std::fmt;

use serde::Serialize;

use crate::core_types::PlayerId;
use crate::rarity::Rarity;
use crate::reward::{Item, StatKind};

pub const MAGIC_ANNOUNCE_THRESHOLD: u32 = 41;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    pub player: PlayerId,
    pub rarity: Rarity,
    pub item_name: String,
    pub stat: u32,
    pub kind: StatKind,
}

pub fn announcement_for(player: PlayerId, rarity: Rarity, item: &Item) -> Option<Announcement> {
    let (stat, kind) = match rarity {
        Rarity::Legendary if item.damage != 0 => (item.damage, StatKind::Damage),
        Rarity::Legendary => (item.armor, StatKind::Armor),
        Rarity::Magic if item.damage >= MAGIC_ANNOUNCE_THRESHOLD => (item.damage, StatKind::Damage),
        Rarity::Magic if item.armor >= MAGIC_ANNOUNCE_THRESHOLD => (item.armor, StatKind::Armor),
        _ => return None,
    };

    Some(Announcement {
        player,
        rarity,
        item_name: item.name.clone(),
        stat,
        kind,
    })
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} opened a {} crate and received {} with {} {}",
            self.player, self.rarity, self.item_name, self.stat, self.kind
        )
    }
}

//! Reward generation
//!
//! Rarity-weighted stat selection and item minting for opened crates.

pub mod generator;
pub mod item;
pub mod minter;
pub mod random;

pub use generator::{Reward, RewardGenerator};
pub use item::{Item, ItemType, StatKind};
pub use minter::{ItemMinter, MAX_ITEM_VALUE, MIN_ITEM_VALUE, MintRequest, RandomItemMinter};
pub use random::{RandomSource, ScriptedRandom, ThreadRandom};

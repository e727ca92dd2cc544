//! Transaction log types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core_types::PlayerId;
use crate::rarity::Rarity;
use crate::reward::Item;

/// What moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Item,
    Crates,
}

impl Subject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Subject::Item => "item",
            Subject::Crates => "crates",
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured payload, stored as JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransactionData {
    Item { name: String, value: u32 },
    Crates { rarity: Rarity, amount: u64 },
}

impl TransactionData {
    pub fn subject(&self) -> Subject {
        match self {
            TransactionData::Item { .. } => Subject::Item,
            TransactionData::Crates { .. } => Subject::Crates,
        }
    }
}

/// Append-only record of a value movement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub from: PlayerId,
    pub to: PlayerId,
    pub subject: Subject,
    pub data: TransactionData,
    pub timestamp: DateTime<Utc>,
}

impl TransactionEntry {
    pub fn new(from: PlayerId, to: PlayerId, data: TransactionData) -> Self {
        Self {
            from,
            to,
            subject: data.subject(),
            data,
            timestamp: Utc::now(),
        }
    }

    /// Item minted from a crate, credited by the system
    pub fn item_minted(to: PlayerId, item: &Item) -> Self {
        Self::new(
            PlayerId::SYSTEM,
            to,
            TransactionData::Item {
                name: item.name.clone(),
                value: item.value,
            },
        )
    }

    pub fn crates_traded(from: PlayerId, to: PlayerId, rarity: Rarity, amount: u64) -> Self {
        Self::new(from, to, TransactionData::Crates { rarity, amount })
    }

    pub fn crates_granted(to: PlayerId, rarity: Rarity, amount: u64) -> Self {
        Self::crates_traded(PlayerId::SYSTEM, to, rarity, amount)
    }
}

impl fmt::Display for TransactionEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tx {} -> {} [{}]", self.from, self.to, self.subject)
    }
}

/// Post-commit counters of a crate trade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferBalances {
    pub sender: u64,
    pub receiver: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crates_payload_json() {
        let entry = TransactionEntry::crates_traded(PlayerId(10), PlayerId(20), Rarity::Legendary, 2);
        assert_eq!(entry.subject, Subject::Crates);
        let json = serde_json::to_value(&entry.data).unwrap();
        assert_eq!(json, serde_json::json!({"rarity": "legendary", "amount": 2}));
    }

    #[test]
    fn test_item_payload_json() {
        let data = TransactionData::Item {
            name: "Rusty Axe".into(),
            value: 77,
        };
        assert_eq!(data.subject(), Subject::Item);
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json, serde_json::json!({"name": "Rusty Axe", "value": 77}));
        let back: TransactionData = serde_json::from_value(json).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn test_granted_is_from_system() {
        let entry = TransactionEntry::crates_granted(PlayerId(10), Rarity::Common, 1);
        assert_eq!(entry.from, PlayerId::SYSTEM);
        assert_eq!(entry.to, PlayerId(10));
    }
}

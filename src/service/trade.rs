//! Crate trade between two players

use tracing::{debug, info};

use super::{CrateService, positive_amount};
use crate::core_types::PlayerId;
use crate::error::{CrateError, CrateResult};
use crate::ledger::TransactionEntry;
use crate::rarity::Rarity;

/// A validated trade.
///
/// Construction runs the input checks in a fixed order, each a distinct
/// failure: self trade, trade to the system account, unknown rarity,
/// non-positive amount. The balance check happens inside the ledger
/// transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeRequest {
    from: PlayerId,
    to: PlayerId,
    rarity: Rarity,
    amount: u64,
}

impl TradeRequest {
    pub fn new(from: PlayerId, to: PlayerId, rarity: &str, amount: i64) -> CrateResult<Self> {
        Self::check_parties(from, to)?;
        let rarity = rarity.parse()?;
        let amount = positive_amount(amount)?;
        Ok(Self {
            from,
            to,
            rarity,
            amount,
        })
    }

    pub fn typed(from: PlayerId, to: PlayerId, rarity: Rarity, amount: i64) -> CrateResult<Self> {
        Self::check_parties(from, to)?;
        let amount = positive_amount(amount)?;
        Ok(Self {
            from,
            to,
            rarity,
            amount,
        })
    }

    fn check_parties(from: PlayerId, to: PlayerId) -> CrateResult<()> {
        if from == to {
            return Err(CrateError::SelfTransfer);
        }
        if to.is_system() {
            return Err(CrateError::SystemTransfer);
        }
        Ok(())
    }

    pub fn from(&self) -> PlayerId {
        self.from
    }

    pub fn to(&self) -> PlayerId {
        self.to
    }

    pub fn rarity(&self) -> Rarity {
        self.rarity
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeReceipt {
    pub request: TradeRequest,
    pub sender_remaining: u64,
    pub receiver_total: u64,
    pub cache_synced: bool,
    pub logged: bool,
}

impl CrateService {
    /// Parse and run a trade from raw front-end arguments
    pub async fn trade(
        &self,
        from: PlayerId,
        to: PlayerId,
        rarity: &str,
        amount: i64,
    ) -> CrateResult<TradeReceipt> {
        let req = TradeRequest::new(from, to, rarity, amount)?;
        self.transfer_crates(&req).await
    }

    /// Move crates between two players as one ledger transaction
    pub async fn transfer_crates(&self, req: &TradeRequest) -> CrateResult<TradeReceipt> {
        debug!(
            from = %req.from,
            to = %req.to,
            rarity = %req.rarity,
            amount = req.amount,
            "Transfer crates"
        );

        let from_token = self.cache.begin_write(req.from).await;
        let to_token = self.cache.begin_write(req.to).await;
        let balances = self
            .mutate(
                &[req.from, req.to],
                self.store
                    .transfer_crates(req.from, req.to, req.rarity, req.amount),
            )
            .await?;

        let logged = self
            .append_log(&TransactionEntry::crates_traded(
                req.from, req.to, req.rarity, req.amount,
            ))
            .await;

        let delta = req.amount as i64;
        let sender_synced = self.sync_cache(req.from, req.rarity, -delta, from_token).await;
        let receiver_synced = self.sync_cache(req.to, req.rarity, delta, to_token).await;

        info!(
            from = %req.from,
            to = %req.to,
            rarity = %req.rarity,
            amount = req.amount,
            sender_remaining = balances.sender,
            receiver_total = balances.receiver,
            "Crates transferred"
        );

        Ok(TradeReceipt {
            request: *req,
            sender_remaining: balances.sender,
            receiver_total: balances.receiver,
            cache_synced: sender_synced && receiver_synced,
            logged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_order() {
        let (a, b) = (PlayerId(10), PlayerId(20));
        // every input is bad: self trade wins
        assert!(matches!(
            TradeRequest::new(a, a, "epic", 0),
            Err(CrateError::SelfTransfer)
        ));
        assert!(matches!(
            TradeRequest::new(a, PlayerId::SYSTEM, "epic", 0),
            Err(CrateError::SystemTransfer)
        ));
        assert!(matches!(
            TradeRequest::new(a, b, "epic", 0),
            Err(CrateError::InvalidRarity(_))
        ));
        assert!(matches!(
            TradeRequest::new(a, b, "rare", 0),
            Err(CrateError::InvalidAmount(0))
        ));
        assert!(matches!(
            TradeRequest::new(a, b, "rare", -4),
            Err(CrateError::InvalidAmount(-4))
        ));
    }

    #[test]
    fn test_valid_request() {
        let req = TradeRequest::new(PlayerId(10), PlayerId(20), "Legendary", 2).unwrap();
        assert_eq!(req.rarity(), Rarity::Legendary);
        assert_eq!(req.amount(), 2);
        assert_eq!(req.from(), PlayerId(10));
        assert_eq!(req.to(), PlayerId(20));

        let typed = TradeRequest::typed(PlayerId(10), PlayerId(20), Rarity::Legendary, 2).unwrap();
        assert_eq!(typed, req);
    }
}

//! Pays out a lobby's escrow when its game ends.

use serde::Serialize;
use std::sync::{Arc, Mutex};

use crate::{
    game::{GameState, StateChange, StateListener},
    wallet::{BalanceLedger, GuildId, UserId, WalletError},
};

/// How a finished game's pool was distributed.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Settlement {
    /// `bet` times the number of staked players
    pub pool: u64,
    /// What each winner was owed
    pub share: u64,
    /// Users credited, either as winners or refunded
    pub credited: Vec<UserId>,
    /// No winners, so every stake went back
    pub refunded: bool,
    /// Rounding remainder plus the shares of bot winners
    pub unpaid: u64,
    #[serde(skip)]
    pub error: Option<WalletError>,
}

/// Shared slot a lobby reads its settlement from.
pub type SettlementSlot = Arc<Mutex<Option<Settlement>>>;

/// State listener that credits winners the first time the game ends.
pub struct PayoutListener {
    guild: GuildId,
    bet: u64,
    /// Human players whose stake is in the pool
    staked: Vec<UserId>,
    ledger: Arc<dyn BalanceLedger>,
    paid: bool,
    slot: SettlementSlot,
}

impl PayoutListener {
    pub fn new(
        guild: GuildId,
        bet: u64,
        staked: Vec<UserId>,
        ledger: Arc<dyn BalanceLedger>,
        slot: SettlementSlot,
    ) -> Self {
        Self {
            guild,
            bet,
            staked,
            ledger,
            paid: false,
            slot,
        }
    }

    fn settle(&self, change: &StateChange<'_>) -> Option<Settlement> {
        let result = change.result?;
        let pool = self.bet * self.staked.len() as u64;

        let mut settlement = if result.winners().is_empty() {
            Settlement {
                pool,
                share: self.bet,
                credited: self.staked.clone(),
                refunded: true,
                unpaid: 0,
                error: None,
            }
        } else {
            let share = pool / result.winners().len() as u64;
            let humans: Vec<UserId> = result
                .winners()
                .iter()
                .filter(|winner| !winner.is_bot)
                .map(|winner| winner.player_id)
                .collect();
            Settlement {
                pool,
                share,
                unpaid: pool - share * humans.len() as u64,
                credited: humans,
                refunded: false,
                error: None,
            }
        };

        if let Err(e) = self
            .ledger
            .credit_many(self.guild, &settlement.credited, settlement.share)
        {
            log::error!(
                "Game {}: payout of {} to {:?} failed: {}",
                change.game_id,
                settlement.share,
                settlement.credited,
                e
            );
            settlement.error = Some(e);
        }
        Some(settlement)
    }
}

impl StateListener for PayoutListener {
    fn on_state_change(&mut self, change: &StateChange<'_>) {
        if self.paid || change.state != GameState::End {
            return;
        }
        let Some(settlement) = self.settle(change) else {
            return;
        };
        self.paid = true;

        log::info!(
            "Game {} ({}): paid {} to {} player(s) from a pool of {}",
            change.game_id,
            change.kind,
            settlement.share,
            settlement.credited.len(),
            settlement.pool
        );
        if settlement.unpaid > 0 {
            log::info!(
                "Game {}: {} of the pool left unpaid (bot winners and rounding)",
                change.game_id,
                settlement.unpaid
            );
        }
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(settlement);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        game::{GameCore, GameKind, GameResult, Player},
        wallet::InMemoryLedger,
    };

    fn setup(staked: Vec<UserId>) -> (GameCore, Arc<InMemoryLedger>, SettlementSlot) {
        let ledger = Arc::new(InMemoryLedger::new(0));
        let slot = SettlementSlot::default();
        let mut core = GameCore::new(GameKind::Dice);
        core.add_state_listener(Box::new(PayoutListener::new(
            1,
            100,
            staked,
            ledger.clone(),
            Arc::clone(&slot),
        )));
        (core, ledger, slot)
    }

    #[test]
    fn test_pays_once() {
        let (mut core, ledger, slot) = setup(vec![1, 2]);
        core.finish(GameResult::new(vec![Player::human(2)], vec![Player::human(1)]));
        core.set_state(GameState::End);

        assert_eq!(ledger.balance(1, 2).unwrap(), 200);
        assert_eq!(ledger.balance(1, 1).unwrap(), 0);
        assert_eq!(slot.lock().unwrap().as_ref().unwrap().pool, 200);
    }

    #[test]
    fn test_no_winners_refunds() {
        let (mut core, ledger, slot) = setup(vec![1, 2]);
        core.finish(GameResult::new(vec![], vec![Player::human(1), Player::human(2)]));

        assert_eq!(ledger.balance(1, 1).unwrap(), 100);
        assert_eq!(ledger.balance(1, 2).unwrap(), 100);
        assert!(slot.lock().unwrap().as_ref().unwrap().refunded);
    }

    #[test]
    fn test_bot_share_stays_unpaid() {
        let (mut core, ledger, slot) = setup(vec![1, 2, 3]);
        core.finish(GameResult::new(
            vec![Player::human(1), Player::bot(9)],
            vec![Player::human(2), Player::human(3)],
        ));

        assert_eq!(ledger.balance(1, 1).unwrap(), 150);
        assert_eq!(slot.lock().unwrap().as_ref().unwrap().unpaid, 150);
    }

    #[test]
    fn test_rounding_remainder_stays_unpaid() {
        let (mut core, ledger, slot) = setup(vec![1, 2, 3, 4]);
        core.finish(GameResult::new(
            vec![Player::human(1), Player::human(2), Player::human(3)],
            vec![Player::human(4)],
        ));

        let settlement = slot.lock().unwrap().clone().unwrap();
        assert_eq!(settlement.share, 133);
        assert_eq!(settlement.unpaid, 1);
        assert_eq!(ledger.balance(1, 3).unwrap(), 133);
        assert_eq!(ledger.balance(1, 4).unwrap(), 0);
    }

    #[test]
    fn test_ignores_non_end_states() {
        let (mut core, ledger, slot) = setup(vec![1]);
        core.set_state(GameState::WaitForInput);
        assert!(slot.lock().unwrap().is_none());
        assert!(ledger.entries().unwrap().is_empty());
    }
}

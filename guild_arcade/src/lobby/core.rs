//! Escrowed lobby around one game.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{collections::HashSet, fmt, sync::Arc};
use uuid::Uuid;

use super::{
    config::LobbyConfig,
    errors::{LobbyError, LobbyResult},
    payout::{PayoutListener, Settlement, SettlementSlot},
};
use crate::{
    game::{Game, GameError, GameKind, MiniGame, Player},
    wallet::{BalanceLedger, GuildId, UserId},
};

pub type LobbyId = Uuid;

/// Lobby metadata for discovery
#[derive(Debug, Clone, Serialize)]
pub struct LobbyMetadata {
    pub id: LobbyId,
    pub guild: GuildId,
    pub kind: GameKind,
    pub creator: Player,
    pub bet: u64,
    pub player_count: usize,
    pub max_players: usize,
    pub open: bool,
    pub started: bool,
    pub finished: bool,
    pub created_at: DateTime<Utc>,
}

/// Players, stakes and the game they will play.
///
/// Every human player's stake is debited on joining and stays escrowed
/// until they leave, the lobby is cleared, or the game pays out.
pub struct Lobby {
    id: LobbyId,
    config: LobbyConfig,
    creator: Player,
    players: Vec<Player>,
    invited: HashSet<Player>,
    game: MiniGame,
    ledger: Arc<dyn BalanceLedger>,
    started: bool,
    cleared: bool,
    settlement: SettlementSlot,
    created_at: DateTime<Utc>,
}

impl fmt::Debug for Lobby {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lobby")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("creator", &self.creator)
            .field("players", &self.players)
            .field("started", &self.started)
            .field("cleared", &self.cleared)
            .finish_non_exhaustive()
    }
}

impl Lobby {
    /// Create a lobby and take the creator's stake.
    ///
    /// # Arguments
    ///
    /// * `config` - Lobby configuration
    /// * `creator` - First player, the only one allowed to start
    /// * `game` - Game the lobby feeds its roster into
    /// * `ledger` - Balance ledger holding the stakes
    ///
    /// # Errors
    ///
    /// * `LobbyError::InvalidConfig` - Configuration failed validation
    /// * `LobbyError::Wallet` - The creator couldn't pay the stake
    pub fn new(
        config: LobbyConfig,
        creator: Player,
        game: MiniGame,
        ledger: Arc<dyn BalanceLedger>,
    ) -> LobbyResult<Self> {
        config.validate().map_err(LobbyError::InvalidConfig)?;

        if !creator.is_bot {
            ledger.debit(config.guild, creator.player_id, config.bet)?;
        }

        let lobby = Self {
            id: Uuid::new_v4(),
            creator,
            players: vec![creator],
            invited: HashSet::new(),
            game,
            ledger,
            started: false,
            cleared: false,
            settlement: SettlementSlot::default(),
            created_at: Utc::now(),
            config,
        };
        log::info!(
            "Lobby {} created by {} for {} (bet {})",
            lobby.id,
            creator,
            lobby.config.kind,
            lobby.config.bet
        );
        Ok(lobby)
    }

    pub fn id(&self) -> LobbyId {
        self.id
    }

    pub fn config(&self) -> &LobbyConfig {
        &self.config
    }

    pub fn creator(&self) -> Player {
        self.creator
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn contains(&self, player: &Player) -> bool {
        self.players.contains(player)
    }

    pub fn is_invited(&self, player: &Player) -> bool {
        self.invited.contains(player)
    }

    pub fn is_open(&self) -> bool {
        self.config.open
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    /// Cleared, or started and the game has ended
    pub fn is_finished(&self) -> bool {
        self.cleared || (self.started && self.game.is_finished())
    }

    pub fn game(&self) -> &MiniGame {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut MiniGame {
        &mut self.game
    }

    pub fn settlement(&self) -> Option<Settlement> {
        self.settlement.lock().ok().and_then(|slot| slot.clone())
    }

    /// Human players whose stake is held by this lobby
    pub fn staked(&self) -> Vec<UserId> {
        self.players
            .iter()
            .filter(|player| !player.is_bot)
            .map(|player| player.player_id)
            .collect()
    }

    /// Coins currently held in escrow
    pub fn escrowed(&self) -> u64 {
        if self.cleared || self.settlement().is_some() {
            return 0;
        }
        self.config.bet * self.staked().len() as u64
    }

    /// Why `player` can't join right now, if they can't
    pub fn join_refusal(&self, player: &Player) -> Option<LobbyError> {
        if self.started {
            Some(LobbyError::AlreadyStarted)
        } else if self.cleared {
            Some(LobbyError::Cleared)
        } else if self.contains(player) {
            Some(LobbyError::AlreadyJoined)
        } else if self.players.len() >= self.game.max_players() {
            Some(LobbyError::LobbyFull)
        } else if !self.config.open && !self.invited.contains(player) {
            Some(LobbyError::Closed)
        } else {
            None
        }
    }

    pub fn can_join(&self, player: &Player) -> bool {
        self.join_refusal(player).is_none()
    }

    /// Seat a player and escrow their stake.
    ///
    /// If the debit fails the roster is left untouched.
    pub fn add(&mut self, player: Player) -> LobbyResult<()> {
        if let Some(refusal) = self.join_refusal(&player) {
            return Err(refusal);
        }

        if !player.is_bot {
            self.ledger
                .debit(self.config.guild, player.player_id, self.config.bet)?;
        }
        self.players.push(player);

        log::debug!("Lobby {}: {} joined", self.id, player);
        Ok(())
    }

    /// Refund and unseat a player. The refund only happens if the player is
    /// still seated, so it can't happen twice.
    fn refund_and_remove(&mut self, player: Player) -> LobbyResult<()> {
        if self.started {
            return Err(LobbyError::AlreadyStarted);
        }
        if self.cleared {
            return Err(LobbyError::Cleared);
        }
        if player == self.creator {
            return Err(LobbyError::CannotRemoveCreator);
        }
        let Some(idx) = self.players.iter().position(|p| *p == player) else {
            return Err(LobbyError::NotInLobby);
        };

        if !player.is_bot {
            self.ledger
                .credit(self.config.guild, player.player_id, self.config.bet)?;
        }
        self.players.remove(idx);

        log::debug!("Lobby {}: {} left", self.id, player);
        Ok(())
    }

    /// Refund and unseat a player.
    ///
    /// Returns `false` when nothing happened: the player isn't seated, is
    /// the creator, or the lobby already started or was cleared.
    pub fn remove(&mut self, player: Player) -> bool {
        match self.refund_and_remove(player) {
            Ok(()) => true,
            Err(LobbyError::Wallet(e)) => {
                log::error!("Lobby {}: refund for {} failed: {}", self.id, player, e);
                false
            }
            Err(_) => false,
        }
    }

    /// Refund and unseat several players with one batch credit.
    ///
    /// Returns how many players were actually removed.
    pub fn remove_many(&mut self, players: &[Player]) -> usize {
        if self.started || self.cleared {
            return 0;
        }

        let mut leaving: Vec<Player> = Vec::with_capacity(players.len());
        for player in players {
            if *player != self.creator && self.contains(player) && !leaving.contains(player) {
                leaving.push(*player);
            }
        }
        let refunds: Vec<UserId> = leaving
            .iter()
            .filter(|player| !player.is_bot)
            .map(|player| player.player_id)
            .collect();

        if let Err(e) = self
            .ledger
            .credit_many(self.config.guild, &refunds, self.config.bet)
        {
            log::error!("Lobby {}: batch refund failed: {}", self.id, e);
            return 0;
        }
        self.players.retain(|player| !leaving.contains(player));

        log::debug!("Lobby {}: {} player(s) removed", self.id, leaving.len());
        leaving.len()
    }

    /// Remove a player on the creator's behalf.
    pub fn kick(&mut self, by: Player, player: Player) -> LobbyResult<()> {
        if by != self.creator {
            return Err(LobbyError::NotCreator);
        }
        self.refund_and_remove(player)
    }

    /// Leave the lobby. The creator leaving closes it for everyone.
    pub fn leave(&mut self, player: Player) -> LobbyResult<()> {
        if player == self.creator && !self.started {
            return self.clear().map(|_| ());
        }
        self.refund_and_remove(player)
    }

    /// Let `player` join even if the lobby is closed. Bots can't be invited.
    pub fn invite(&mut self, player: Player) {
        if player.is_bot {
            return;
        }
        self.invited.insert(player);
    }

    pub fn set_open(&mut self, open: bool) {
        self.config.open = open;
    }

    /// Refund everyone in one batch and empty the lobby.
    ///
    /// Idempotent, and a no-op once the game started. Returns how many
    /// stakes were refunded.
    pub fn clear(&mut self) -> LobbyResult<usize> {
        if self.cleared || self.started {
            return Ok(0);
        }

        let refunds = self.staked();
        self.ledger
            .credit_many(self.config.guild, &refunds, self.config.bet)?;
        self.players.clear();
        self.invited.clear();
        self.cleared = true;

        log::info!("Lobby {} cleared, {} stake(s) refunded", self.id, refunds.len());
        Ok(refunds.len())
    }

    /// Hand the roster to the game and start it.
    ///
    /// Registers the payout listener first, so a game that is decided
    /// immediately still pays out. If the game refuses to start after the
    /// roster was handed over, the lobby is cleared and everyone refunded.
    pub fn start_game(&mut self, by: Player) -> LobbyResult<()> {
        if by != self.creator {
            return Err(LobbyError::NotCreator);
        }
        if self.started {
            return Err(LobbyError::AlreadyStarted);
        }
        if self.cleared {
            return Err(LobbyError::Cleared);
        }
        let current = self.players.len();
        let needed = self.game.min_players();
        if current < needed {
            return Err(GameError::NotEnoughPlayers { needed, current }.into());
        }

        self.game.on_state_change(Box::new(PayoutListener::new(
            self.config.guild,
            self.config.bet,
            self.staked(),
            Arc::clone(&self.ledger),
            Arc::clone(&self.settlement),
        )));

        let started = self
            .game
            .add_players(self.players.clone())
            .and_then(|()| self.game.start());
        if let Err(e) = started {
            log::warn!("Lobby {}: game failed to start: {}", self.id, e);
            self.clear()?;
            return Err(e.into());
        }

        self.started = true;
        log::info!(
            "Lobby {}: {} started with {} player(s)",
            self.id,
            self.config.kind,
            self.players.len()
        );
        Ok(())
    }

    /// Timeout: clear an unstarted lobby, force-end a running game.
    pub fn expire(&mut self) -> LobbyResult<()> {
        if !self.started {
            self.clear()?;
        } else if !self.game.is_finished() {
            log::info!("Lobby {}: game timed out", self.id);
            self.game.force_end();
        }
        Ok(())
    }

    pub fn metadata(&self) -> LobbyMetadata {
        LobbyMetadata {
            id: self.id,
            guild: self.config.guild,
            kind: self.config.kind,
            creator: self.creator,
            bet: self.config.bet,
            player_count: self.players.len(),
            max_players: self.game.max_players(),
            open: self.config.open,
            started: self.started,
            finished: self.is_finished(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        game::{GameFactory, GameState, pets::InMemoryPetLedger},
        wallet::{InMemoryLedger, WalletError},
    };

    const CREATOR: Player = Player::human(1);

    fn lobby(kind: GameKind, bet: u64) -> (Lobby, Arc<InMemoryLedger>) {
        let ledger = Arc::new(InMemoryLedger::new(1_000));
        let factory = GameFactory::seeded(Arc::new(InMemoryPetLedger::new()), 5);
        let game = factory.create(kind, 1, CREATOR);
        let lobby = Lobby::new(
            LobbyConfig::for_kind(1, kind, bet),
            CREATOR,
            game,
            ledger.clone(),
        )
        .unwrap();
        (lobby, ledger)
    }

    #[test]
    fn test_creator_pays_on_create() {
        let (lobby, ledger) = lobby(GameKind::Dice, 100);
        assert_eq!(ledger.balance(1, 1).unwrap(), 900);
        assert_eq!(lobby.escrowed(), 100);
    }

    #[test]
    fn test_poor_creator_cannot_create() {
        let ledger = Arc::new(InMemoryLedger::new(10));
        let factory = GameFactory::new(Arc::new(InMemoryPetLedger::new()));
        let err = Lobby::new(
            LobbyConfig::for_kind(1, GameKind::Dice, 100),
            CREATOR,
            factory.create(GameKind::Dice, 1, CREATOR),
            ledger,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            LobbyError::Wallet(WalletError::InsufficientBalance { .. })
        ));
    }

    #[test]
    fn test_failed_debit_leaves_roster() {
        let (mut lobby, ledger) = lobby(GameKind::Dice, 100);
        ledger.set_balance(1, 2, 50).unwrap();

        assert!(matches!(
            lobby.add(Player::human(2)),
            Err(LobbyError::Wallet(_))
        ));
        assert_eq!(lobby.players(), &[CREATOR]);
    }

    #[test]
    fn test_remove_refunds_once() {
        let (mut lobby, ledger) = lobby(GameKind::Dice, 100);
        let bob = Player::human(2);
        lobby.add(bob).unwrap();

        assert!(lobby.remove(bob));
        assert!(!lobby.remove(bob));
        assert_eq!(ledger.balance(1, 2).unwrap(), 1_000);
        assert!(!lobby.remove(CREATOR));
    }

    #[test]
    fn test_closed_lobby_needs_invite() {
        let (mut lobby, _) = lobby(GameKind::Dice, 0);
        lobby.set_open(false);
        let bob = Player::human(2);

        assert_eq!(lobby.join_refusal(&bob), Some(LobbyError::Closed));
        lobby.invite(bob);
        lobby.invite(Player::bot(3));
        assert!(lobby.can_join(&bob));
        assert!(!lobby.is_invited(&Player::bot(3)));
    }

    #[test]
    fn test_full_lobby() {
        let (mut lobby, _) = lobby(GameKind::PetsBattle, 0);
        lobby.add(Player::human(2)).unwrap();
        assert_eq!(lobby.add(Player::human(3)), Err(LobbyError::LobbyFull));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (mut lobby, ledger) = lobby(GameKind::Dice, 100);
        lobby.add(Player::human(2)).unwrap();
        lobby.add(Player::bot(3)).unwrap();

        assert_eq!(lobby.clear().unwrap(), 2);
        assert_eq!(lobby.clear().unwrap(), 0);
        assert_eq!(ledger.balance(1, 1).unwrap(), 1_000);
        assert_eq!(ledger.balance(1, 2).unwrap(), 1_000);
        assert_eq!(lobby.escrowed(), 0);
        assert!(lobby.is_finished());
    }

    #[test]
    fn test_creator_leaving_clears() {
        let (mut lobby, ledger) = lobby(GameKind::Dice, 100);
        lobby.add(Player::human(2)).unwrap();
        lobby.leave(CREATOR).unwrap();

        assert!(lobby.is_cleared());
        assert_eq!(ledger.balance(1, 2).unwrap(), 1_000);
    }

    #[test]
    fn test_only_creator_starts() {
        let (mut lobby, _) = lobby(GameKind::Dice, 0);
        lobby.add(Player::human(2)).unwrap();
        assert_eq!(
            lobby.start_game(Player::human(2)),
            Err(LobbyError::NotCreator)
        );
        lobby.start_game(CREATOR).unwrap();
        assert_eq!(lobby.game().state(), GameState::WaitForInput);
        assert_eq!(lobby.add(Player::human(3)), Err(LobbyError::AlreadyStarted));
        assert!(!lobby.remove(Player::human(2)));
    }

    #[test]
    fn test_start_without_pets_refunds() {
        let (mut lobby, ledger) = lobby(GameKind::PetsBattle, 100);
        lobby.add(Player::human(2)).unwrap();

        let err = lobby.start_game(CREATOR).unwrap_err();
        assert_eq!(err, LobbyError::Game(GameError::MissingPet(CREATOR)));
        assert!(lobby.is_cleared());
        assert_eq!(ledger.balance(1, 1).unwrap(), 1_000);
        assert_eq!(ledger.balance(1, 2).unwrap(), 1_000);
    }

    #[test]
    fn test_expire_after_start_force_ends() {
        let (mut lobby, ledger) = lobby(GameKind::Dice, 100);
        lobby.add(Player::human(2)).unwrap();
        lobby.start_game(CREATOR).unwrap();

        lobby.expire().unwrap();
        assert!(lobby.is_finished());
        // Nobody rolled: everyone gets their stake back
        assert_eq!(ledger.balance(1, 1).unwrap(), 1_000);
        assert_eq!(ledger.balance(1, 2).unwrap(), 1_000);

        lobby.expire().unwrap();
        assert_eq!(ledger.balance(1, 1).unwrap(), 1_000);
    }
}

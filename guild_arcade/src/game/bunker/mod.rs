//! Bunker: a social-deduction game run by a master.
//!
//! Every player except the master is dealt a hidden character card. Players
//! reveal attributes, nominate each other, vote, and the master excludes
//! players until only half of the original group is left in the bunker.
//! Everyone still inside wins.
//!
//! Player actions return `bool`: `false` means the action was refused and
//! nothing changed.

pub mod data;

use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

pub use data::{AttributeKind, BunkerData, EventCard, PlayerCard, Sex};

use super::{
    entities::{GameResult, GameState, Player},
    kind::GameKind,
    random::RandomSource,
    state_machine::{Game, GameCore, GameError},
};

/// Master included
pub const BUNKER_MIN_PLAYERS: usize = 3;
pub const BUNKER_MAX_PLAYERS: usize = 16;

/// A running vote over the nominated players.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Vote {
    tallies: BTreeMap<Player, u32>,
    choices: BTreeMap<Player, Player>,
    voted: BTreeSet<Player>,
}

impl Vote {
    fn new(nominees: &[Player]) -> Self {
        Self {
            tallies: nominees.iter().map(|nominee| (*nominee, 0)).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn tallies(&self) -> &BTreeMap<Player, u32> {
        &self.tallies
    }

    #[must_use]
    pub fn choice_of(&self, voter: &Player) -> Option<Player> {
        self.choices.get(voter).copied()
    }

    #[must_use]
    pub fn has_voted(&self, voter: &Player) -> bool {
        self.voted.contains(voter)
    }
}

/// What a closed vote ended with.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VoteOutcome {
    pub tallies: BTreeMap<Player, u32>,
    /// Every survivor counts as having voted once the vote is closed
    pub voted: BTreeSet<Player>,
}

impl VoteOutcome {
    /// Nominee with strictly the most votes
    #[must_use]
    pub fn leader(&self) -> Option<Player> {
        let best = self.tallies.values().max().copied()?;
        let mut leaders = self.tallies.iter().filter(|(_, votes)| **votes == best);
        match (leaders.next(), leaders.next()) {
            (Some((player, _)), None) if best > 0 => Some(*player),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum BunkerPhase {
    #[default]
    WaitingForPlayers,
    AwaitingAction,
    VotingInProgress(Vote),
    Ended,
}

pub struct BunkerGame {
    core: GameCore,
    master: Player,
    rng: Box<dyn RandomSource>,
    phase: BunkerPhase,
    data: Option<BunkerData>,
    nominees: Vec<Player>,
    excluded: Vec<Player>,
    last_vote: Option<VoteOutcome>,
    /// Non-master players at start
    original_count: usize,
}

impl fmt::Debug for BunkerGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BunkerGame")
            .field("core", &self.core)
            .field("master", &self.master)
            .field("phase", &self.phase)
            .field("nominees", &self.nominees)
            .field("excluded", &self.excluded)
            .finish_non_exhaustive()
    }
}

impl BunkerGame {
    /// New game run by `master`, who still has to be added as a player
    pub fn new(master: Player, rng: Box<dyn RandomSource>) -> Self {
        Self {
            core: GameCore::new(GameKind::Bunker),
            master,
            rng,
            phase: BunkerPhase::WaitingForPlayers,
            data: None,
            nominees: Vec::new(),
            excluded: Vec::new(),
            last_vote: None,
            original_count: 0,
        }
    }

    #[must_use]
    pub fn master(&self) -> Player {
        self.master
    }

    #[must_use]
    pub fn phase(&self) -> &BunkerPhase {
        &self.phase
    }

    #[must_use]
    pub fn data(&self) -> Option<&BunkerData> {
        self.data.as_ref()
    }

    #[must_use]
    pub fn card_of(&self, player: &Player) -> Option<&PlayerCard> {
        self.data.as_ref()?.cards.get(player)
    }

    #[must_use]
    pub fn event(&self) -> Option<&EventCard> {
        self.data.as_ref().map(|data| &data.event)
    }

    #[must_use]
    pub fn nominees(&self) -> &[Player] {
        &self.nominees
    }

    #[must_use]
    pub fn excluded(&self) -> &[Player] {
        &self.excluded
    }

    #[must_use]
    pub fn last_vote(&self) -> Option<&VoteOutcome> {
        self.last_vote.as_ref()
    }

    #[must_use]
    pub fn current_vote(&self) -> Option<&Vote> {
        match &self.phase {
            BunkerPhase::VotingInProgress(vote) => Some(vote),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_voting(&self) -> bool {
        self.current_vote().is_some()
    }

    /// Non-master players still in the game
    #[must_use]
    pub fn survivors(&self) -> Vec<Player> {
        self.core
            .players()
            .iter()
            .filter(|player| self.is_survivor(player))
            .copied()
            .collect()
    }

    fn is_survivor(&self, player: &Player) -> bool {
        *player != self.master && self.core.contains(player) && !self.excluded.contains(player)
    }

    /// Nominate a survivor for the next vote.
    pub fn accept_add_to_vote(&mut self, player: Player) -> bool {
        if self.phase != BunkerPhase::AwaitingAction
            || !self.is_survivor(&player)
            || self.nominees.contains(&player)
        {
            return false;
        }

        self.nominees.push(player);
        log::debug!("Game {}: {} nominated", self.core.id(), player);
        self.core.notify_vision_all();
        true
    }

    /// Open voting over the current nominees.
    pub fn accept_start_vote(&mut self) -> bool {
        if self.phase != BunkerPhase::AwaitingAction || self.nominees.is_empty() {
            return false;
        }

        self.last_vote = None;
        self.phase = BunkerPhase::VotingInProgress(Vote::new(&self.nominees));
        log::debug!(
            "Game {}: vote started over {} nominee(s)",
            self.core.id(),
            self.nominees.len()
        );
        self.core.notify_vision_all();
        true
    }

    /// Pick (or change) the nominee `voter` will vote for.
    pub fn accept_anonim_vote(&mut self, voter: Player, target: Player) -> bool {
        let voter_ok = self.is_survivor(&voter);
        let BunkerPhase::VotingInProgress(vote) = &mut self.phase else {
            return false;
        };
        if !voter_ok || vote.voted.contains(&voter) || !vote.tallies.contains_key(&target) {
            return false;
        }

        vote.choices.insert(voter, target);
        true
    }

    /// Cast the vote chosen with [`Self::accept_anonim_vote`].
    pub fn accept_make_vote(&mut self, voter: Player) -> bool {
        let BunkerPhase::VotingInProgress(vote) = &mut self.phase else {
            return false;
        };
        if vote.voted.contains(&voter) {
            return false;
        }
        let Some(target) = vote.choices.get(&voter).copied() else {
            return false;
        };
        let Some(tally) = vote.tallies.get_mut(&target) else {
            return false;
        };

        *tally += 1;
        vote.voted.insert(voter);
        self.core.notify_vision(&[voter]);
        true
    }

    /// Close the vote. Only the master can.
    pub fn accept_end_vote(&mut self, master: Player) -> bool {
        if master != self.master || !self.is_voting() {
            return false;
        }
        let BunkerPhase::VotingInProgress(vote) =
            std::mem::replace(&mut self.phase, BunkerPhase::AwaitingAction)
        else {
            return false;
        };

        let outcome = VoteOutcome {
            tallies: vote.tallies,
            voted: self.survivors().into_iter().collect(),
        };
        log::debug!(
            "Game {}: vote closed, leader {:?}",
            self.core.id(),
            outcome.leader()
        );
        self.last_vote = Some(outcome);
        self.nominees.clear();
        self.core.notify_vision_all();
        true
    }

    /// Send a survivor out of the bunker.
    ///
    /// The game ends once no more than half of the original players are
    /// left inside.
    pub fn accept_exclude(&mut self, player: Player) -> bool {
        if self.phase != BunkerPhase::AwaitingAction || !self.is_survivor(&player) {
            return false;
        }

        self.excluded.push(player);
        self.nominees.retain(|nominee| *nominee != player);
        log::info!("Game {}: {} excluded", self.core.id(), player);
        self.core.notify_vision_all();

        if self.survivors().len() <= self.original_count / 2 {
            self.finish();
        }
        true
    }

    /// Reveal one hidden attribute of `player`'s card.
    pub fn accept_submit_attribute(
        &mut self,
        player: Player,
        attribute: Option<AttributeKind>,
    ) -> bool {
        let Some(kind) = attribute else {
            return false;
        };
        if !matches!(
            self.phase,
            BunkerPhase::AwaitingAction | BunkerPhase::VotingInProgress(_)
        ) || !self.is_survivor(&player)
        {
            return false;
        }
        let Some(card) = self
            .data
            .as_mut()
            .and_then(|data| data.cards.get_mut(&player))
        else {
            return false;
        };
        if !card.reveal(kind) {
            return false;
        }

        log::debug!("Game {}: {} revealed {}", self.core.id(), player, kind);
        self.core.notify_vision_all();
        true
    }

    fn finish(&mut self) {
        self.phase = BunkerPhase::Ended;
        self.nominees.clear();
        let result = GameResult::new(self.survivors(), self.excluded.clone());
        self.core.finish(result);
    }
}

impl Game for BunkerGame {
    fn core(&self) -> &GameCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    fn min_players(&self) -> usize {
        BUNKER_MIN_PLAYERS
    }

    fn max_players(&self) -> usize {
        BUNKER_MAX_PLAYERS
    }

    fn add_players(&mut self, players: Vec<Player>) -> Result<(), GameError> {
        if self.core.state() != GameState::WaitForPlayer {
            return Err(GameError::WrongState {
                expected: GameState::WaitForPlayer,
                actual: self.core.state(),
            });
        }
        self.core.push_players(&players, BUNKER_MAX_PLAYERS)
    }

    fn start(&mut self) -> Result<(), GameError> {
        if self.core.state() != GameState::WaitForPlayer {
            return Err(GameError::AlreadyStarted);
        }
        let current = self.core.players().len();
        if current < BUNKER_MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers {
                needed: BUNKER_MIN_PLAYERS,
                current,
            });
        }
        if !self.core.contains(&self.master) {
            return Err(GameError::MissingMaster(self.master));
        }

        let survivors = self.survivors();
        self.original_count = survivors.len();
        self.data = Some(BunkerData::deal(&survivors, &mut *self.rng));
        self.phase = BunkerPhase::AwaitingAction;

        log::info!(
            "Game {}: bunker started with {} players, master {}",
            self.core.id(),
            self.original_count,
            self.master
        );
        self.core.set_state(GameState::WaitForInput);
        Ok(())
    }

    fn force_end(&mut self) {
        if self.core.state().is_terminal() {
            return;
        }
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::random::ScriptedRandom;

    const MASTER: Player = Player::human(100);

    fn started(players: u64) -> BunkerGame {
        let mut game = BunkerGame::new(MASTER, Box::new(ScriptedRandom::default()));
        let mut roster = vec![MASTER];
        roster.extend((1..=players).map(Player::human));
        game.add_players(roster).unwrap();
        game.start().unwrap();
        game
    }

    #[test]
    fn test_master_gets_no_card() {
        let game = started(3);
        assert!(game.card_of(&MASTER).is_none());
        assert!(game.card_of(&Player::human(1)).is_some());
        assert_eq!(game.survivors().len(), 3);
    }

    #[test]
    fn test_needs_master_seated() {
        let mut game = BunkerGame::new(MASTER, Box::new(ScriptedRandom::default()));
        game.add_players((1..=3).map(Player::human).collect()).unwrap();
        assert_eq!(game.start().unwrap_err(), GameError::MissingMaster(MASTER));
    }

    #[test]
    fn test_nomination_rules() {
        let mut game = started(4);
        let alice = Player::human(1);

        assert!(!game.accept_add_to_vote(MASTER));
        assert!(game.accept_add_to_vote(alice));
        assert!(!game.accept_add_to_vote(alice));
        assert!(!game.accept_add_to_vote(Player::human(77)));
    }

    #[test]
    fn test_vote_flow() {
        let mut game = started(4);
        let (a, b, c) = (Player::human(1), Player::human(2), Player::human(3));

        assert!(!game.accept_start_vote());
        game.accept_add_to_vote(a);
        game.accept_add_to_vote(b);
        assert!(game.accept_start_vote());
        assert!(!game.accept_start_vote());

        assert!(!game.accept_make_vote(c), "no choice yet");
        assert!(!game.accept_anonim_vote(c, Player::human(4)), "not nominated");
        assert!(game.accept_anonim_vote(c, a));
        assert!(game.accept_anonim_vote(c, b));
        assert!(game.accept_make_vote(c));
        assert!(!game.accept_make_vote(c));
        assert!(!game.accept_anonim_vote(c, a));

        assert!(game.accept_anonim_vote(a, b));
        assert!(game.accept_make_vote(a));

        assert!(game.accept_end_vote(MASTER));
        let outcome = game.last_vote().unwrap();
        assert_eq!(outcome.tallies[&b], 2);
        assert_eq!(outcome.leader(), Some(b));
        assert_eq!(outcome.voted.len(), 4);
        assert!(game.nominees().is_empty());
        assert_eq!(game.phase(), &BunkerPhase::AwaitingAction);
    }

    #[test]
    fn test_only_master_ends_vote() {
        let mut game = started(3);
        game.accept_add_to_vote(Player::human(1));
        game.accept_start_vote();

        assert!(!game.accept_end_vote(Player::human(2)));
        assert!(game.is_voting());
        assert!(game.accept_end_vote(MASTER));
        assert!(!game.is_voting());
    }

    #[test]
    fn test_no_exclusion_during_vote() {
        let mut game = started(4);
        game.accept_add_to_vote(Player::human(1));
        game.accept_start_vote();
        assert!(!game.accept_exclude(Player::human(1)));
    }

    #[test]
    fn test_reveal_rules() {
        let mut game = started(3);
        let alice = Player::human(1);

        assert!(!game.accept_submit_attribute(alice, None));
        assert!(game.accept_submit_attribute(alice, Some(AttributeKind::Phobia)));
        assert!(!game.accept_submit_attribute(alice, Some(AttributeKind::Phobia)));
        assert!(!game.accept_submit_attribute(MASTER, Some(AttributeKind::Fact)));
        assert!(game.card_of(&alice).unwrap().is_revealed(AttributeKind::Phobia));
    }

    #[test]
    fn test_force_end_clears_vote() {
        let mut game = started(4);
        game.accept_add_to_vote(Player::human(1));
        game.accept_start_vote();
        game.force_end();

        assert_eq!(game.phase(), &BunkerPhase::Ended);
        assert!(game.nominees().is_empty());
        let result = game.result().unwrap();
        assert_eq!(result.winners().len(), 4);
        assert!(!result.is_winner(&MASTER));
        assert!(!result.losers().contains(&MASTER));
    }

    #[test]
    fn test_no_joins_after_start() {
        let mut game = started(3);
        assert!(matches!(
            game.add_players(vec![Player::human(9)]),
            Err(GameError::WrongState { .. })
        ));
    }
}

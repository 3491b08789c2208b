//! Mini-game state machine contract.
//!
//! Every game owns a [`GameCore`] holding its players, its single
//! [`GameState`] value, its final result and the listeners that are told
//! about state and vision changes. The [`Game`] trait is the contract the
//! lobby drives; [`super::kind::MiniGame`] dispatches it over the concrete
//! games.

use enum_dispatch::enum_dispatch;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::entities::{GameId, GameResult, GameState, Player};
use super::kind::GameKind;
use crate::wallet::WalletError;

/// Errors that can occur while setting up or querying a game
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GameError {
    #[error("game is {actual}, expected {expected}")]
    WrongState {
        expected: GameState,
        actual: GameState,
    },
    #[error("need {needed}+ players, have {current}")]
    NotEnoughPlayers { needed: usize, current: usize },
    #[error("game is full ({max} players)")]
    CapacityReached { max: usize },
    #[error("{0} already joined")]
    PlayerAlreadyJoined(Player),
    #[error("game already started")]
    AlreadyStarted,
    #[error("{0} has no pet")]
    MissingPet(Player),
    #[error("master {0} is not seated")]
    MissingMaster(Player),
    #[error("ledger error: {0}")]
    Ledger(#[from] WalletError),
}

/// Event passed to state listeners on every state assignment.
#[derive(Debug)]
pub struct StateChange<'a> {
    pub game_id: GameId,
    pub kind: GameKind,
    pub state: GameState,
    pub players: &'a [Player],
    /// Set exactly when `state` is [`GameState::End`].
    pub result: Option<&'a GameResult>,
}

/// Event passed to vision listeners when information visible to players
/// changed.
#[derive(Debug)]
pub struct VisionChange<'a> {
    pub game_id: GameId,
    pub kind: GameKind,
    pub players: &'a [Player],
}

pub trait StateListener: Send {
    fn on_state_change(&mut self, change: &StateChange<'_>);
}

pub trait VisionListener: Send {
    fn on_vision_change(&mut self, change: &VisionChange<'_>);
}

impl<F> StateListener for F
where
    F: FnMut(&StateChange<'_>) + Send,
{
    fn on_state_change(&mut self, change: &StateChange<'_>) {
        self(change);
    }
}

impl<F> VisionListener for F
where
    F: FnMut(&VisionChange<'_>) + Send,
{
    fn on_vision_change(&mut self, change: &VisionChange<'_>) {
        self(change);
    }
}

/// Box a closure as a state listener.
pub fn state_listener<F>(f: F) -> Box<dyn StateListener>
where
    F: FnMut(&StateChange<'_>) + Send + 'static,
{
    Box::new(f)
}

/// Box a closure as a vision listener.
pub fn vision_listener<F>(f: F) -> Box<dyn VisionListener>
where
    F: FnMut(&VisionChange<'_>) + Send + 'static,
{
    Box::new(f)
}

/// Data and listeners shared by every concrete game.
pub struct GameCore {
    id: GameId,
    kind: GameKind,
    players: Vec<Player>,
    state: GameState,
    result: Option<GameResult>,
    state_listeners: Vec<Box<dyn StateListener>>,
    vision_listeners: Vec<Box<dyn VisionListener>>,
}

impl fmt::Debug for GameCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameCore")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("players", &self.players)
            .field("state", &self.state)
            .field("result", &self.result)
            .field("state_listeners", &self.state_listeners.len())
            .field("vision_listeners", &self.vision_listeners.len())
            .finish()
    }
}

impl GameCore {
    #[must_use]
    pub fn new(kind: GameKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            players: Vec::new(),
            state: GameState::WaitForPlayer,
            result: None,
            state_listeners: Vec::new(),
            vision_listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> GameId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> GameKind {
        self.kind
    }

    #[must_use]
    pub fn state(&self) -> GameState {
        self.state
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn contains(&self, player: &Player) -> bool {
        self.players.contains(player)
    }

    /// Final result, only available once the game ended.
    pub fn result(&self) -> Result<&GameResult, GameError> {
        match (&self.result, self.state) {
            (Some(result), GameState::End) => Ok(result),
            _ => Err(GameError::WrongState {
                expected: GameState::End,
                actual: self.state,
            }),
        }
    }

    /// Append players after checking the whole batch.
    ///
    /// Duplicates (within the batch or against seated players) and overflow
    /// past `max_players` reject the batch without seating anyone.
    pub fn push_players(&mut self, players: &[Player], max_players: usize) -> Result<(), GameError> {
        let mut seen = Vec::with_capacity(players.len());
        for player in players {
            if self.players.contains(player) || seen.contains(player) {
                return Err(GameError::PlayerAlreadyJoined(*player));
            }
            seen.push(*player);
        }
        if self.players.len() + players.len() > max_players {
            return Err(GameError::CapacityReached { max: max_players });
        }
        self.players.extend_from_slice(players);
        Ok(())
    }

    /// Assign a new state and notify every state listener in registration
    /// order.
    ///
    /// Re-assigning the current state still notifies listeners. Leaving
    /// [`GameState::End`] is refused.
    pub fn set_state(&mut self, state: GameState) {
        if self.state.is_terminal() && !state.is_terminal() {
            log::warn!(
                "Game {} ({}) refused transition out of {} to {}",
                self.id,
                self.kind,
                self.state,
                state
            );
            return;
        }

        log::debug!("Game {} ({}): {} -> {}", self.id, self.kind, self.state, state);
        self.state = state;

        let result = if state.is_terminal() {
            self.result.as_ref()
        } else {
            None
        };
        let change = StateChange {
            game_id: self.id,
            kind: self.kind,
            state,
            players: &self.players,
            result,
        };
        for listener in &mut self.state_listeners {
            listener.on_state_change(&change);
        }
    }

    /// Store the result (first one wins) and move to [`GameState::End`].
    pub fn finish(&mut self, result: GameResult) {
        if self.result.is_none() {
            log::info!(
                "Game {} ({}) finished: {} winner(s), {} loser(s)",
                self.id,
                self.kind,
                result.winners().len(),
                result.losers().len()
            );
            self.result = Some(result);
        }
        self.set_state(GameState::End);
    }

    /// Notify every vision listener that `players` can see something new.
    pub fn notify_vision(&mut self, players: &[Player]) {
        let change = VisionChange {
            game_id: self.id,
            kind: self.kind,
            players,
        };
        for listener in &mut self.vision_listeners {
            listener.on_vision_change(&change);
        }
    }

    /// Notify vision listeners on behalf of every seated player.
    pub fn notify_vision_all(&mut self) {
        let change = VisionChange {
            game_id: self.id,
            kind: self.kind,
            players: &self.players,
        };
        for listener in &mut self.vision_listeners {
            listener.on_vision_change(&change);
        }
    }

    pub fn add_state_listener(&mut self, listener: Box<dyn StateListener>) {
        self.state_listeners.push(listener);
    }

    pub fn add_vision_listener(&mut self, listener: Box<dyn VisionListener>) {
        self.vision_listeners.push(listener);
    }
}

/// Contract every mini-game implements.
#[enum_dispatch]
pub trait Game {
    fn core(&self) -> &GameCore;

    fn core_mut(&mut self) -> &mut GameCore;

    fn min_players(&self) -> usize;

    fn max_players(&self) -> usize;

    /// Seat more players. Which states allow it depends on the game.
    fn add_players(&mut self, players: Vec<Player>) -> Result<(), GameError>;

    /// Leave [`GameState::WaitForPlayer`] and set the game up.
    fn start(&mut self) -> Result<(), GameError>;

    /// Move to [`GameState::End`] from any state, computing a result from
    /// whatever happened so far. No-op once ended.
    fn force_end(&mut self);

    fn id(&self) -> GameId {
        self.core().id()
    }

    fn kind(&self) -> GameKind {
        self.core().kind()
    }

    fn state(&self) -> GameState {
        self.core().state()
    }

    fn players(&self) -> &[Player] {
        self.core().players()
    }

    fn is_finished(&self) -> bool {
        self.core().state().is_terminal()
    }

    fn result(&self) -> Result<&GameResult, GameError> {
        self.core().result()
    }

    fn on_state_change(&mut self, listener: Box<dyn StateListener>) {
        self.core_mut().add_state_listener(listener);
    }

    fn on_vision_change(&mut self, listener: Box<dyn VisionListener>) {
        self.core_mut().add_vision_listener(listener);
    }
}

//! Lobby actor message types.

use serde::Serialize;
use tokio::sync::oneshot;

use super::{core::LobbyMetadata, errors::LobbyError, payout::Settlement};
use crate::game::{
    GameResult, GameState, Player,
    bunker::AttributeKind,
    pets::{PetAction, TurnReport},
};

/// Bunker moves, forwarded to the matching `accept_*` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BunkerAction {
    Nominate(Player),
    StartVote,
    Choose { target: Player },
    Vote,
    EndVote,
    Exclude(Player),
    Reveal(Option<AttributeKind>),
}

/// Messages that can be sent to a LobbyActor
#[derive(Debug)]
pub enum LobbyMessage {
    /// Join and escrow the stake
    Join {
        player: Player,
        response: oneshot::Sender<LobbyResponse>,
    },

    /// Leave and get the stake back
    Leave {
        player: Player,
        response: oneshot::Sender<LobbyResponse>,
    },

    /// Creator removes a player
    Kick {
        by: Player,
        player: Player,
        response: oneshot::Sender<LobbyResponse>,
    },

    /// Creator invites a player into a closed lobby
    Invite {
        by: Player,
        player: Player,
        response: oneshot::Sender<LobbyResponse>,
    },

    /// Creator opens or closes the lobby
    SetOpen {
        by: Player,
        open: bool,
        response: oneshot::Sender<LobbyResponse>,
    },

    /// Creator starts the game
    Start {
        by: Player,
        response: oneshot::Sender<LobbyResponse>,
    },

    /// Dice roll
    Roll {
        player: Player,
        response: oneshot::Sender<LobbyResponse>,
    },

    /// Pet battle turn
    PetTurn {
        player: Player,
        action: PetAction,
        response: oneshot::Sender<LobbyResponse>,
    },

    /// Bunker move
    Bunker {
        player: Player,
        action: BunkerAction,
        response: oneshot::Sender<LobbyResponse>,
    },

    /// Get current lobby state
    GetState {
        response: oneshot::Sender<LobbySnapshot>,
    },

    /// Close the lobby: clear it before start, force-end after
    Close {
        response: oneshot::Sender<LobbyResponse>,
    },
}

/// Response from lobby operations
#[derive(Debug, Clone, PartialEq)]
pub enum LobbyResponse {
    /// Operation succeeded
    Success,

    /// Dice rolled
    Rolled(u32),

    /// Pet battle turn played
    Turn(Box<TurnReport>),

    /// The game refused the move
    Refused(String),

    /// Lobby-level failure
    Error(LobbyError),
}

impl LobbyResponse {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            LobbyResponse::Success | LobbyResponse::Rolled(_) | LobbyResponse::Turn(_)
        )
    }
}

impl From<Result<(), LobbyError>> for LobbyResponse {
    fn from(result: Result<(), LobbyError>) -> Self {
        match result {
            Ok(()) => LobbyResponse::Success,
            Err(e) => LobbyResponse::Error(e),
        }
    }
}

/// Lobby state response
#[derive(Debug, Clone, Serialize)]
pub struct LobbySnapshot {
    pub metadata: LobbyMetadata,
    pub players: Vec<Player>,
    pub state: GameState,
    /// Coins held in escrow
    pub escrowed: u64,
    pub result: Option<GameResult>,
    pub settlement: Option<Settlement>,
}

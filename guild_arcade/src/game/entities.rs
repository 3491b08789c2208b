//! Entities shared by every mini-game: players, states and results.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::wallet::UserId;

/// Unique ID of one game instance.
pub type GameId = Uuid;

/// A game participant.
///
/// Bots auto-resolve some actions (dice are rolled the moment they join)
/// and never hold an escrowed stake.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Player {
    pub player_id: UserId,
    pub is_bot: bool,
}

impl Player {
    #[must_use]
    pub const fn human(player_id: UserId) -> Self {
        Self {
            player_id,
            is_bot: false,
        }
    }

    #[must_use]
    pub const fn bot(player_id: UserId) -> Self {
        Self {
            player_id,
            is_bot: true,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bot {
            write!(f, "bot#{}", self.player_id)
        } else {
            write!(f, "user#{}", self.player_id)
        }
    }
}

/// Lifecycle of every game. `End` is terminal.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    WaitForPlayer,
    WaitForInput,
    End,
}

impl GameState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::End)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::WaitForPlayer => "waiting for players",
            Self::WaitForInput => "waiting for input",
            Self::End => "ended",
        };
        write!(f, "{repr}")
    }
}

/// Final standings of a finished game.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameResult {
    winners: Vec<Player>,
    losers: Vec<Player>,
}

impl GameResult {
    #[must_use]
    pub fn new(winners: Vec<Player>, losers: Vec<Player>) -> Self {
        Self { winners, losers }
    }

    #[must_use]
    pub fn winners(&self) -> &[Player] {
        &self.winners
    }

    #[must_use]
    pub fn losers(&self) -> &[Player] {
        &self.losers
    }

    #[must_use]
    pub fn is_winner(&self, player: &Player) -> bool {
        self.winners.contains(player)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_display() {
        assert_eq!(Player::human(5).to_string(), "user#5");
        assert_eq!(Player::bot(6).to_string(), "bot#6");
    }

    #[test]
    fn test_bot_and_human_with_same_id_differ() {
        assert_ne!(Player::human(1), Player::bot(1));
    }

    #[test]
    fn test_only_end_is_terminal() {
        assert!(GameState::End.is_terminal());
        assert!(!GameState::WaitForInput.is_terminal());
        assert!(!GameState::WaitForPlayer.is_terminal());
    }
}

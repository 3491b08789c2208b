//! Lobby error types.

use thiserror::Error;

use crate::{game::GameError, wallet::WalletError};

/// Lobby errors
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum LobbyError {
    #[error("Player already in the lobby")]
    AlreadyJoined,

    #[error("Lobby is full")]
    LobbyFull,

    #[error("Lobby is invite-only")]
    Closed,

    #[error("Game already started")]
    AlreadyStarted,

    #[error("Lobby was cleared")]
    Cleared,

    #[error("Only the lobby creator can do that")]
    NotCreator,

    #[error("Player is not in the lobby")]
    NotInLobby,

    #[error("The creator cannot be removed")]
    CannotRemoveCreator,

    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),

    #[error("Game error: {0}")]
    Game(#[from] GameError),

    #[error("Invalid lobby config: {0}")]
    InvalidConfig(String),

    /// The creator already hosts a lobby of this kind
    #[error("Already hosting a lobby of this kind")]
    HostBusy,

    #[error("Lobby not found")]
    LobbyNotFound,

    /// The lobby task stopped
    #[error("Lobby is no longer available")]
    Unavailable,
}

impl LobbyError {
    /// Get a client-safe error message
    ///
    /// Wallet errors are forwarded through their own sanitized message.
    pub fn client_message(&self) -> String {
        match self {
            LobbyError::Wallet(e) => e.client_message(),
            LobbyError::Game(GameError::Ledger(e)) => e.client_message(),
            other => other.to_string(),
        }
    }
}

/// Result type for lobby operations
pub type LobbyResult<T> = Result<T, LobbyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_errors_use_wallet_message() {
        let err = LobbyError::from(WalletError::InsufficientBalance {
            user_id: 1,
            available: 10,
            required: 100,
        });
        assert_eq!(err.client_message(), "Not enough coins: 100 required");
    }

    #[test]
    fn test_plain_message() {
        assert_eq!(LobbyError::LobbyFull.client_message(), "Lobby is full");
    }
}

//! Lobby configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::{game::GameKind, wallet::GuildId};

/// How long a lobby waits for its creator to start the game
pub const DEFAULT_LOBBY_TIMEOUT_SECS: u64 = 180;

/// Largest stake a lobby accepts
pub const MAX_BET: u64 = 1_000_000_000;

/// Lobby configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyConfig {
    /// Guild whose wallets fund the stakes
    pub guild: GuildId,

    /// Game played once the lobby starts
    pub kind: GameKind,

    /// Stake every human player escrows on joining
    pub bet: u64,

    /// Whether anyone may join, or only invited players
    pub open: bool,

    /// Seconds before an unstarted lobby is cleared and refunded
    pub lobby_timeout_secs: u64,

    /// Seconds before a running game is force-ended
    pub game_timeout_secs: u64,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            guild: 0,
            kind: GameKind::Dice,
            bet: 0,
            open: true,
            lobby_timeout_secs: DEFAULT_LOBBY_TIMEOUT_SECS,
            game_timeout_secs: GameKind::Dice.default_game_timeout().as_secs(),
        }
    }
}

impl LobbyConfig {
    /// Open lobby for `kind` with the default timeouts of that kind
    pub fn for_kind(guild: GuildId, kind: GameKind, bet: u64) -> Self {
        Self {
            guild,
            kind,
            bet,
            game_timeout_secs: kind.default_game_timeout().as_secs(),
            ..Self::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.bet > MAX_BET {
            return Err(format!("Bet must be at most {MAX_BET}"));
        }

        if self.lobby_timeout_secs == 0 {
            return Err("Lobby timeout must be at least 1 second".to_string());
        }

        if self.game_timeout_secs == 0 {
            return Err("Game timeout must be at least 1 second".to_string());
        }

        Ok(())
    }

    pub fn lobby_timeout(&self) -> Duration {
        Duration::from_secs(self.lobby_timeout_secs)
    }

    pub fn game_timeout(&self) -> Duration {
        Duration::from_secs(self.game_timeout_secs)
    }
}

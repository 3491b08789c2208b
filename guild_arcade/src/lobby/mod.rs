//! Lobby module: escrowed matchmaking around one game.
//!
//! This module implements:
//! - [`Lobby`]: roster, invitations and stakes held in escrow
//! - [`PayoutListener`]: credits winners exactly once when the game ends
//! - [`LobbyRegistry`]: one unstarted lobby per host and game kind
//! - [`LobbyActor`] / [`LobbyManager`]: one tokio task per lobby, with the
//!   lobby and game timeouts
//!
//! ## Example
//!
//! ```
//! use guild_arcade::game::{GameFactory, GameKind, Player, pets::InMemoryPetLedger};
//! use guild_arcade::lobby::{LobbyConfig, LobbyManager};
//! use guild_arcade::wallet::{BalanceLedger, InMemoryLedger};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let ledger = Arc::new(InMemoryLedger::new(1_000));
//! let factory = GameFactory::seeded(Arc::new(InMemoryPetLedger::new()), 1);
//! let manager = LobbyManager::new(ledger.clone(), factory);
//!
//! let host = Player::human(1);
//! let id = manager
//!     .create_lobby(LobbyConfig::for_kind(1, GameKind::Dice, 100), host)
//!     .await
//!     .unwrap();
//! assert_eq!(ledger.balance(1, 1).unwrap(), 900);
//!
//! // Closing an unstarted lobby refunds every stake
//! manager.close_lobby(id).await.unwrap();
//! assert_eq!(ledger.balance(1, 1).unwrap(), 1_000);
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod core;
pub mod errors;
pub mod manager;
pub mod messages;
pub mod payout;
pub mod registry;

pub use actor::{LobbyActor, LobbyHandle};
pub use config::LobbyConfig;
pub use self::core::{Lobby, LobbyId, LobbyMetadata};
pub use errors::{LobbyError, LobbyResult};
pub use manager::LobbyManager;
pub use messages::{BunkerAction, LobbyMessage, LobbyResponse, LobbySnapshot};
pub use payout::{PayoutListener, Settlement, SettlementSlot};
pub use registry::LobbyRegistry;

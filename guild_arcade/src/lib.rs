//! # Guild Arcade
//!
//! Turn-based mini-games for a community chat bot, played for coins held in
//! escrow.
//!
//! Every game is a small state machine (`WaitForPlayer → WaitForInput →
//! End`) behind the [`Game`] trait, dispatched over [`MiniGame`] with
//! `enum_dispatch`. Listeners observe every state change and every change in
//! what players can see.
//!
//! ## Games
//!
//! - **Dice**: everybody rolls 2-12 once, the highest roll wins
//! - **Bunker**: a master runs nomination votes until half of the survivors
//!   are excluded; survivors reveal their character cards along the way
//! - **Pet Battle**: two pets trade attacks and skills until one faints
//!
//! ## Core Modules
//!
//! - [`game`]: State machine, concrete games, combat and randomness
//! - [`lobby`]: Escrowed lobbies, payout, actor host and manager
//! - [`wallet`]: Balance ledger seam and an in-memory ledger
//! - [`bot`]: Decisions for bot participants
//!
//! ## Example
//!
//! ```
//! use guild_arcade::{Game, GameState, Player};
//! use guild_arcade::game::{DiceGame, ScriptedRandom};
//!
//! let mut game = DiceGame::new(Box::new(ScriptedRandom::new([7, 9])));
//! game.add_players(vec![Player::human(1), Player::human(2)]).unwrap();
//! game.start().unwrap();
//!
//! assert_eq!(game.roll(Player::human(1)), Some(7));
//! assert_eq!(game.roll(Player::human(2)), Some(9));
//! assert_eq!(game.state(), GameState::End);
//! assert_eq!(game.result().unwrap().winners(), &[Player::human(2)]);
//! ```

/// Bot players.
pub mod bot;

/// Game state machine and the concrete games.
pub mod game;
pub use game::{
    Game, GameError, GameKind, GameResult, GameState, MiniGame, Player, StateListener,
    VisionListener,
};

/// Escrowed lobbies.
pub mod lobby;
pub use lobby::{Lobby, LobbyConfig, LobbyError, LobbyManager};

/// Coin balances.
pub mod wallet;
pub use wallet::{BalanceLedger, InMemoryLedger, WalletError};

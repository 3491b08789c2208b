//! Bot players for lobbies that need filling.
//!
//! Bots never hold a stake. What they do depends on the game:
//! - Dice: roll the moment they are seated (handled by the game itself)
//! - Pets: pick a skill or attack whenever it is their turn
//! - Bunker: vote against the nominee who revealed the least
//!
//! ## Example
//!
//! ```
//! use guild_arcade::bot::BotDecisionMaker;
//! use guild_arcade::game::{Game, GameFactory, GameKind, Player};
//! use guild_arcade::game::pets::InMemoryPetLedger;
//! use std::sync::Arc;
//!
//! let factory = GameFactory::seeded(Arc::new(InMemoryPetLedger::new()), 7);
//! let mut game = factory.create(GameKind::Dice, 1, Player::human(1));
//! game.add_players(vec![Player::bot(2), Player::bot(3)]).unwrap();
//! game.start().unwrap();
//!
//! // Dice bots have already rolled
//! assert_eq!(BotDecisionMaker::new().drive(&mut game), 0);
//! assert!(game.is_finished());
//! ```

pub mod decision;

pub use decision::{BotDecisionConfig, BotDecisionMaker};

//! Mini-game engine.
//!
//! This module provides the game state machine and the concrete games:
//! - Shared contract: [`Game`], [`GameCore`], listeners and [`GameError`]
//! - Dice, Bunker and pet battles
//! - Random sources games draw from

// Submodules
pub mod entities;
pub mod random;
pub mod state_machine;

pub mod kind;

pub mod bunker;
pub mod dice;
pub mod pets;

pub use bunker::BunkerGame;
pub use dice::DiceGame;
pub use entities::{GameId, GameResult, GameState, Player};
pub use kind::{GameFactory, GameKind, MiniGame};
pub use pets::PetsGame;
pub use random::{RandomSource, ScriptedRandom};
pub use state_machine::{
    Game, GameCore, GameError, StateChange, StateListener, VisionChange, VisionListener,
    state_listener, vision_listener,
};

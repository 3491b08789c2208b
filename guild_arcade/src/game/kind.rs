//! Game kinds and the dispatch enum over the concrete games.

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    str::FromStr,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

// The dispatch impl generated for `MiniGame` repeats the `Game` method
// signatures here, so every type they name must be in scope.
use super::{
    bunker::BunkerGame,
    dice::DiceGame,
    entities::{GameId, GameResult, GameState, Player},
    pets::{PetLedger, PetsGame},
    random::{self, RandomSource},
    state_machine::{Game, GameCore, GameError, StateListener, VisionListener},
};
use crate::wallet::GuildId;

/// Default timeout for a running Bunker match (2.5 hours)
pub const BUNKER_GAME_TIMEOUT: Duration = Duration::from_secs(9000);

/// Default timeout for other running games (10 minutes)
pub const DEFAULT_GAME_TIMEOUT: Duration = Duration::from_secs(600);

/// Which mini-game a lobby hosts
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Dice,
    Bunker,
    PetsBattle,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [GameKind::Dice, GameKind::Bunker, GameKind::PetsBattle];

    /// How long a started game may run before it is force-ended
    #[must_use]
    pub const fn default_game_timeout(self) -> Duration {
        match self {
            GameKind::Bunker => BUNKER_GAME_TIMEOUT,
            GameKind::Dice | GameKind::PetsBattle => DEFAULT_GAME_TIMEOUT,
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameKind::Dice => write!(f, "dice"),
            GameKind::Bunker => write!(f, "bunker"),
            GameKind::PetsBattle => write!(f, "pets_battle"),
        }
    }
}

impl FromStr for GameKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dice" => Ok(GameKind::Dice),
            "bunker" => Ok(GameKind::Bunker),
            "pets" | "pets_battle" | "pet_battle" => Ok(GameKind::PetsBattle),
            other => Err(format!("unknown game kind '{other}'")),
        }
    }
}

/// One game of any kind.
#[enum_dispatch(Game)]
#[derive(Debug)]
pub enum MiniGame {
    DiceGame,
    BunkerGame,
    PetsGame,
}

impl MiniGame {
    pub fn as_dice_mut(&mut self) -> Option<&mut DiceGame> {
        match self {
            MiniGame::DiceGame(game) => Some(game),
            _ => None,
        }
    }

    pub fn as_bunker(&self) -> Option<&BunkerGame> {
        match self {
            MiniGame::BunkerGame(game) => Some(game),
            _ => None,
        }
    }

    pub fn as_bunker_mut(&mut self) -> Option<&mut BunkerGame> {
        match self {
            MiniGame::BunkerGame(game) => Some(game),
            _ => None,
        }
    }

    pub fn as_pets(&self) -> Option<&PetsGame> {
        match self {
            MiniGame::PetsGame(game) => Some(game),
            _ => None,
        }
    }

    pub fn as_pets_mut(&mut self) -> Option<&mut PetsGame> {
        match self {
            MiniGame::PetsGame(game) => Some(game),
            _ => None,
        }
    }
}

/// Builds games for lobbies.
///
/// Holds the collaborators some games need (the pet ledger) and decides
/// where their randomness comes from.
#[derive(Clone)]
pub struct GameFactory {
    pet_ledger: Arc<dyn PetLedger>,
    next_seed: Option<Arc<AtomicU64>>,
}

impl fmt::Debug for GameFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameFactory")
            .field("seeded", &self.next_seed.is_some())
            .finish_non_exhaustive()
    }
}

impl GameFactory {
    /// Factory whose games draw from the OS random source
    pub fn new(pet_ledger: Arc<dyn PetLedger>) -> Self {
        Self {
            pet_ledger,
            next_seed: None,
        }
    }

    /// Factory whose games are reproducible: game `n` is seeded with `seed + n`
    pub fn seeded(pet_ledger: Arc<dyn PetLedger>, seed: u64) -> Self {
        Self {
            pet_ledger,
            next_seed: Some(Arc::new(AtomicU64::new(seed))),
        }
    }

    /// Create a game of `kind`. The creator is the Bunker master.
    pub fn create(&self, kind: GameKind, guild: GuildId, creator: Player) -> MiniGame {
        let rng = match &self.next_seed {
            Some(counter) => random::seeded(counter.fetch_add(1, Ordering::Relaxed)),
            None => random::os_rng(),
        };
        self.create_with_rng(kind, guild, creator, rng)
    }

    pub fn create_with_rng(
        &self,
        kind: GameKind,
        guild: GuildId,
        creator: Player,
        rng: Box<dyn RandomSource>,
    ) -> MiniGame {
        match kind {
            GameKind::Dice => DiceGame::new(rng).into(),
            GameKind::Bunker => BunkerGame::new(creator, rng).into(),
            GameKind::PetsBattle => PetsGame::new(guild, Arc::clone(&self.pet_ledger), rng).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::GameState;
    use crate::game::pets::InMemoryPetLedger;

    fn factory() -> GameFactory {
        GameFactory::seeded(Arc::new(InMemoryPetLedger::new()), 7)
    }

    #[test]
    fn test_factory_builds_each_kind() {
        let factory = factory();
        for kind in GameKind::ALL {
            let game = factory.create(kind, 1, Player::human(1));
            assert_eq!(game.kind(), kind);
            assert_eq!(game.state(), GameState::WaitForPlayer);
        }
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in GameKind::ALL {
            assert_eq!(kind.to_string().parse::<GameKind>().unwrap(), kind);
        }
        assert!("poker".parse::<GameKind>().is_err());
    }

    #[test]
    fn test_bunker_timeout_is_longer() {
        assert_eq!(GameKind::Bunker.default_game_timeout().as_secs(), 9000);
        assert!(GameKind::Dice.default_game_timeout() < BUNKER_GAME_TIMEOUT);
    }

    #[test]
    fn test_dispatch_to_concrete_game() {
        let mut game = factory().create(GameKind::Dice, 1, Player::human(1));
        assert!(game.as_dice_mut().is_some());
        assert!(game.as_pets().is_none());
        assert_eq!(game.min_players(), 2);
    }
}

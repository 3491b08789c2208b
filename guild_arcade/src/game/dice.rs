//! Dice game: everybody rolls once, the highest roll takes the pot.

use std::{collections::BTreeMap, fmt};

use super::{
    entities::{GameResult, GameState, Player},
    kind::GameKind,
    random::RandomSource,
    state_machine::{Game, GameCore, GameError},
};

/// Lowest possible roll
pub const DICE_MIN_ROLL: u32 = 2;

/// Highest possible roll
pub const DICE_MAX_ROLL: u32 = 12;

pub const DICE_MIN_PLAYERS: usize = 2;
pub const DICE_MAX_PLAYERS: usize = 10;

pub struct DiceGame {
    core: GameCore,
    rng: Box<dyn RandomSource>,
    rolls: BTreeMap<Player, u32>,
}

impl fmt::Debug for DiceGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiceGame")
            .field("core", &self.core)
            .field("rolls", &self.rolls)
            .finish_non_exhaustive()
    }
}

impl DiceGame {
    #[must_use]
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self {
            core: GameCore::new(GameKind::Dice),
            rng,
            rolls: BTreeMap::new(),
        }
    }

    /// Roll for a human player.
    ///
    /// Returns the rolled value, or `None` when the game isn't waiting for
    /// rolls, the player isn't seated, or they already rolled.
    pub fn roll(&mut self, player: Player) -> Option<u32> {
        if self.core.state() != GameState::WaitForInput
            || !self.core.contains(&player)
            || self.rolls.contains_key(&player)
        {
            return None;
        }

        let value = self.draw();
        self.rolls.insert(player, value);
        log::debug!("Game {}: {} rolled {}", self.core.id(), player, value);
        self.core.notify_vision(&[player]);
        self.check_complete();
        Some(value)
    }

    #[must_use]
    pub fn roll_of(&self, player: &Player) -> Option<u32> {
        self.rolls.get(player).copied()
    }

    #[must_use]
    pub fn rolls(&self) -> &BTreeMap<Player, u32> {
        &self.rolls
    }

    /// Players still expected to roll
    #[must_use]
    pub fn pending(&self) -> Vec<Player> {
        self.core
            .players()
            .iter()
            .filter(|player| !self.rolls.contains_key(player))
            .copied()
            .collect()
    }

    fn draw(&mut self) -> u32 {
        self.rng
            .range(i64::from(DICE_MIN_ROLL), i64::from(DICE_MAX_ROLL)) as u32
    }

    fn check_complete(&mut self) {
        let players = self.core.players();
        if self.core.state() == GameState::WaitForInput
            && players.len() >= DICE_MIN_PLAYERS
            && players.iter().all(|player| self.rolls.contains_key(player))
        {
            let result = self.standings();
            self.core.finish(result);
        }
    }

    /// Everyone tied at the best roll wins; everyone else, including players
    /// who never rolled, loses.
    fn standings(&self) -> GameResult {
        let best = self.rolls.values().max().copied();
        let (winners, losers) = self
            .core
            .players()
            .iter()
            .copied()
            .partition(|player| best.is_some() && self.rolls.get(player).copied() == best);
        GameResult::new(winners, losers)
    }
}

impl Game for DiceGame {
    fn core(&self) -> &GameCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    fn min_players(&self) -> usize {
        DICE_MIN_PLAYERS
    }

    fn max_players(&self) -> usize {
        DICE_MAX_PLAYERS
    }

    fn add_players(&mut self, players: Vec<Player>) -> Result<(), GameError> {
        if self.core.state().is_terminal() {
            return Err(GameError::WrongState {
                expected: GameState::WaitForPlayer,
                actual: GameState::End,
            });
        }
        self.core.push_players(&players, DICE_MAX_PLAYERS)?;

        // Bots roll the moment they sit down
        let bots: Vec<Player> = players.into_iter().filter(|p| p.is_bot).collect();
        for bot in &bots {
            let value = self.draw();
            self.rolls.insert(*bot, value);
            log::debug!("Game {}: {} rolled {}", self.core.id(), bot, value);
        }
        if !bots.is_empty() {
            self.core.notify_vision(&bots);
        }

        self.check_complete();
        Ok(())
    }

    fn start(&mut self) -> Result<(), GameError> {
        if self.core.state() != GameState::WaitForPlayer {
            return Err(GameError::AlreadyStarted);
        }
        let current = self.core.players().len();
        if current < DICE_MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers {
                needed: DICE_MIN_PLAYERS,
                current,
            });
        }

        self.core.set_state(GameState::WaitForInput);
        self.check_complete();
        Ok(())
    }

    fn force_end(&mut self) {
        if self.core.state().is_terminal() {
            return;
        }
        let result = self.standings();
        self.core.finish(result);
    }
}

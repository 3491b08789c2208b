//! Two-pet battle driven by alternating turns.

use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use thiserror::Error;

use super::{
    combat::{AttackReport, poison_damage, resolve_attack},
    ledger::PetLedger,
    pet::{Pet, StatusEffect},
    skill::{SkillEffect, SkillId},
};
use crate::{
    game::{
        entities::{GameResult, GameState, Player},
        kind::GameKind,
        random::RandomSource,
        state_machine::{Game, GameCore, GameError},
    },
    wallet::{GuildId, WalletError},
};

pub const PETS_PLAYERS: usize = 2;

/// What the acting player does on their turn
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PetAction {
    Attack,
    Skill(SkillId),
}

/// Why a turn was refused. Nothing changes when a turn is refused.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum ActionRejected {
    #[error("the battle is not running")]
    NotRunning,
    #[error("it's not your turn")]
    OutOfTurn,
    #[error("unknown skill {0}")]
    UnknownSkill(SkillId),
    #[error("skill {0} is not ready")]
    SkillNotReady(SkillId),
}

/// Everything that happened during one turn.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TurnReport {
    pub turn: u64,
    pub actor: Player,
    pub action: PetAction,
    /// Poison damage the actor took when the turn began
    pub upkeep_damage: u32,
    pub attack: Option<AttackReport>,
    /// Poison damage per turn inflicted on the opponent
    pub poison_inflicted: Option<u32>,
    pub healed: u32,
    pub extra_turn: bool,
    pub finished: bool,
}

pub struct PetsGame {
    core: GameCore,
    guild: GuildId,
    ledger: Arc<dyn PetLedger>,
    rng: Box<dyn RandomSource>,
    /// Same order as the players
    pets: Vec<Pet>,
    turn: u64,
    upkeep_damage: u32,
    last_report: Option<TurnReport>,
}

impl fmt::Debug for PetsGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PetsGame")
            .field("core", &self.core)
            .field("guild", &self.guild)
            .field("pets", &self.pets)
            .field("turn", &self.turn)
            .finish_non_exhaustive()
    }
}

impl PetsGame {
    pub fn new(guild: GuildId, ledger: Arc<dyn PetLedger>, rng: Box<dyn RandomSource>) -> Self {
        Self {
            core: GameCore::new(GameKind::PetsBattle),
            guild,
            ledger,
            rng,
            pets: Vec::with_capacity(PETS_PLAYERS),
            turn: 0,
            upkeep_damage: 0,
            last_report: None,
        }
    }

    #[must_use]
    pub fn turn(&self) -> u64 {
        self.turn
    }

    #[must_use]
    pub fn pets(&self) -> &[Pet] {
        &self.pets
    }

    #[must_use]
    pub fn pet_of(&self, player: &Player) -> Option<&Pet> {
        let idx = self.core.players().iter().position(|p| p == player)?;
        self.pets.get(idx)
    }

    /// Opponent's pet for `player`
    #[must_use]
    pub fn opponent_of(&self, player: &Player) -> Option<&Pet> {
        let idx = self.core.players().iter().position(|p| p == player)?;
        self.pets.get(1 - idx)
    }

    /// Player expected to act, while the battle is running
    #[must_use]
    pub fn current_actor(&self) -> Option<Player> {
        if self.core.state() != GameState::WaitForInput {
            return None;
        }
        self.core.players().get(self.actor_index()).copied()
    }

    #[must_use]
    pub fn last_report(&self) -> Option<&TurnReport> {
        self.last_report.as_ref()
    }

    fn actor_index(&self) -> usize {
        (self.turn % PETS_PLAYERS as u64) as usize
    }

    /// Play one turn for `player`.
    ///
    /// # Errors
    ///
    /// Refuses actions while the battle isn't running, out of turn, or with
    /// a skill the pet doesn't know or can't use yet.
    pub fn take_turn(
        &mut self,
        player: Player,
        action: PetAction,
    ) -> Result<TurnReport, ActionRejected> {
        if self.core.state() != GameState::WaitForInput || self.pets.len() != PETS_PLAYERS {
            return Err(ActionRejected::NotRunning);
        }
        let actor_idx = self.actor_index();
        if self.core.players().get(actor_idx) != Some(&player) {
            return Err(ActionRejected::OutOfTurn);
        }
        if let PetAction::Skill(id) = action {
            match self.pets[actor_idx].skills.get(&id) {
                None => return Err(ActionRejected::UnknownSkill(id)),
                Some(skill) if !skill.usable() => return Err(ActionRejected::SkillNotReady(id)),
                Some(_) => {}
            }
        }

        let mut report = TurnReport {
            turn: self.turn,
            actor: player,
            action,
            upkeep_damage: self.upkeep_damage,
            attack: None,
            poison_inflicted: None,
            healed: 0,
            extra_turn: false,
            finished: false,
        };

        let (actor, target) = pair_mut(&mut self.pets, actor_idx);
        let rng = &mut *self.rng;
        match action {
            PetAction::Attack => {
                report.attack = Some(resolve_attack(actor, target, rng));
            }
            PetAction::Skill(id) => {
                let Some(skill) = actor.skills.get_mut(&id) else {
                    return Err(ActionRejected::UnknownSkill(id));
                };
                skill.apply();
                let effect = skill.effect.clone();
                log::debug!("Game {}: {} used skill {}", self.core.id(), player, id);

                match effect {
                    SkillEffect::Status(effects) => {
                        for (effect, turns) in effects {
                            if effect.targets_opponent() {
                                let damage = poison_damage(actor, rng);
                                target.add_status(effect, turns);
                                target.poison_damage = damage;
                                report.poison_inflicted = Some(damage);
                            } else {
                                actor.add_status(effect, turns);
                                if effect == StatusEffect::InRage {
                                    report.extra_turn = true;
                                }
                            }
                        }
                    }
                    SkillEffect::ReverseInTime => {
                        report.healed = actor.heal(actor.last_damage_taken);
                    }
                }
            }
        }

        if !target.is_alive() {
            self.finish_battle(Some(actor_idx));
            report.finished = true;
        } else if report.extra_turn {
            // The inserted turn continues this one: no upkeep and no
            // status or cooldown ticks until it is played
            self.turn += PETS_PLAYERS as u64;
            self.upkeep_damage = 0;
        } else {
            actor.tick_status_effects();
            actor.last_damage_taken = 0;
            self.turn += 1;
            self.begin_turn();
            report.finished = self.core.state().is_terminal();
        }

        self.core.notify_vision_all();
        self.last_report = Some(report.clone());
        Ok(report)
    }

    /// Upkeep for the actor of the turn that just began: poison, then
    /// cooldowns.
    fn begin_turn(&mut self) {
        let actor_idx = self.actor_index();
        let Some(pet) = self.pets.get_mut(actor_idx) else {
            return;
        };

        self.upkeep_damage = 0;
        if pet.has(StatusEffect::Poisoned) {
            self.upkeep_damage = pet.suffer_poison();
        }
        pet.tick_cooldowns();

        if !pet.is_alive() {
            log::debug!("Game {}: pet {} died from poison", self.core.id(), pet.id);
            self.finish_battle(Some(1 - actor_idx));
        }
    }

    /// Award experience, heal, persist and end the game.
    fn finish_battle(&mut self, winner_idx: Option<usize>) {
        let players = self.core.players().to_vec();
        let result = match winner_idx {
            Some(idx) => GameResult::new(
                vec![players[idx]],
                players
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != idx)
                    .map(|(_, p)| *p)
                    .collect(),
            ),
            None => GameResult::new(Vec::new(), players),
        };

        for (idx, pet) in self.pets.iter_mut().enumerate() {
            let won = winner_idx == Some(idx);
            let experience = pet.battle_experience(won);
            let levels = pet.gain_experience(experience, &mut *self.rng);
            pet.restore();

            if levels > 0 {
                log::info!("Pet {} ({}) gained {} level(s)", pet.id, pet.name, levels);
            }
            if let Err(e) = self.ledger.save_pet(self.guild, &pet.snapshot(), won) {
                log::error!("Failed to save pet {} after battle: {}", pet.id, e);
            }
        }

        self.core.finish(result);
    }
}

fn pair_mut(pets: &mut [Pet], actor_idx: usize) -> (&mut Pet, &mut Pet) {
    let (left, right) = pets.split_at_mut(1);
    if actor_idx == 0 {
        (&mut left[0], &mut right[0])
    } else {
        (&mut right[0], &mut left[0])
    }
}

impl Game for PetsGame {
    fn core(&self) -> &GameCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut GameCore {
        &mut self.core
    }

    fn min_players(&self) -> usize {
        PETS_PLAYERS
    }

    fn max_players(&self) -> usize {
        PETS_PLAYERS
    }

    fn add_players(&mut self, players: Vec<Player>) -> Result<(), GameError> {
        if self.core.state() != GameState::WaitForPlayer {
            return Err(GameError::WrongState {
                expected: GameState::WaitForPlayer,
                actual: self.core.state(),
            });
        }
        self.core.push_players(&players, PETS_PLAYERS)
    }

    fn start(&mut self) -> Result<(), GameError> {
        if self.core.state() != GameState::WaitForPlayer {
            return Err(GameError::AlreadyStarted);
        }
        let current = self.core.players().len();
        if current < PETS_PLAYERS {
            return Err(GameError::NotEnoughPlayers {
                needed: PETS_PLAYERS,
                current,
            });
        }

        let mut pets = Vec::with_capacity(PETS_PLAYERS);
        for player in self.core.players() {
            let snapshot = self
                .ledger
                .load_pet(self.guild, player.player_id)
                .map_err(|e| match e {
                    WalletError::PetNotFound { .. } => GameError::MissingPet(*player),
                    other => GameError::Ledger(other),
                })?;
            pets.push(Pet::from_snapshot(snapshot));
        }
        self.pets = pets;

        log::info!(
            "Game {}: battle between {} and {}",
            self.core.id(),
            self.pets[0],
            self.pets[1]
        );
        self.core.set_state(GameState::WaitForInput);
        self.begin_turn();
        Ok(())
    }

    fn force_end(&mut self) {
        if self.core.state().is_terminal() {
            return;
        }
        if self.pets.len() == PETS_PLAYERS && self.core.state() == GameState::WaitForInput {
            // The player who was supposed to act forfeits
            let winner = 1 - self.actor_index();
            log::info!("Game {}: turn {} timed out", self.core.id(), self.turn);
            self.finish_battle(Some(winner));
        } else {
            self.core
                .finish(GameResult::new(Vec::new(), self.core.players().to_vec()));
        }
    }
}

//! Bot decision-making for pet battles and Bunker votes.

use crate::game::{
    Game, MiniGame, Player,
    bunker::BunkerGame,
    pets::{Pet, PetAction, PetsGame, SkillEffect, StatusEffect},
};

/// Health ratio under which bots start defending (40%)
const DEFENSIVE_HEALTH_RATIO: f32 = 0.40;

/// Damage taken during the opponent's turn worth rewinding
const REWIND_DAMAGE_THRESHOLD: u32 = 6;

/// Configuration for bot decision-making thresholds.
///
/// # Examples
///
/// ```
/// use guild_arcade::bot::decision::BotDecisionConfig;
///
/// let config = BotDecisionConfig::default();
/// assert_eq!(config.defensive_health_ratio, 0.40);
/// assert!(config.prefer_poison);
/// ```
#[derive(Debug, Clone)]
pub struct BotDecisionConfig {
    /// Health ratio below which a shield or bubble is raised first.
    ///
    /// **Range**: 0.0-1.0 (typical: 0.40)
    /// **Higher** = more cautious bots
    pub defensive_health_ratio: f32,

    /// Damage taken last round before Reverse in Time is used.
    ///
    /// **Range**: 1-20 (typical: 6)
    /// **Lower** = rewinds small hits, wasting the once-per-game skill
    pub rewind_damage_threshold: u32,

    /// Whether poison is applied before raging.
    pub prefer_poison: bool,
}

impl Default for BotDecisionConfig {
    fn default() -> Self {
        Self {
            defensive_health_ratio: DEFENSIVE_HEALTH_RATIO,
            rewind_damage_threshold: REWIND_DAMAGE_THRESHOLD,
            prefer_poison: true,
        }
    }
}

/// Bot decision maker
#[derive(Debug, Clone, Default)]
pub struct BotDecisionMaker {
    /// Configuration for decision-making
    config: BotDecisionConfig,
}

impl BotDecisionMaker {
    /// Create a new decision maker with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new decision maker with custom config
    pub fn with_config(config: BotDecisionConfig) -> Self {
        Self { config }
    }

    /// Pick a pet battle action
    ///
    /// # Arguments
    ///
    /// * `pet` - The bot's pet
    /// * `opponent` - The opposing pet
    ///
    /// # Returns
    ///
    /// * `PetAction` - A usable skill, or a basic attack
    pub fn choose_pet_action(&self, pet: &Pet, opponent: &Pet) -> PetAction {
        let usable_with = |effect: StatusEffect| {
            pet.skills.values().find(|skill| {
                skill.usable()
                    && matches!(&skill.effect, SkillEffect::Status(effects) if effects.contains_key(&effect))
            })
        };

        // Defend when low
        let health_ratio = pet.health as f32 / pet.max_health.max(1) as f32;
        if health_ratio < self.config.defensive_health_ratio {
            for effect in [StatusEffect::InBubble, StatusEffect::UnderShield] {
                if !pet.has(effect)
                    && let Some(skill) = usable_with(effect)
                {
                    return PetAction::Skill(skill.id);
                }
            }
        }

        // Rewind a big hit
        if pet.last_damage_taken >= self.config.rewind_damage_threshold
            && let Some(skill) = pet
                .skills
                .values()
                .find(|skill| skill.usable() && skill.effect == SkillEffect::ReverseInTime)
        {
            return PetAction::Skill(skill.id);
        }

        let poison = (!opponent.has(StatusEffect::Poisoned))
            .then(|| usable_with(StatusEffect::Poisoned))
            .flatten();
        let rage = (!pet.has(StatusEffect::InRage))
            .then(|| usable_with(StatusEffect::InRage))
            .flatten();

        let pick = if self.config.prefer_poison {
            poison.or(rage)
        } else {
            rage.or(poison)
        };
        match pick {
            Some(skill) => PetAction::Skill(skill.id),
            None => PetAction::Attack,
        }
    }

    /// Pick the nominee a bot votes against
    ///
    /// Bots distrust whoever revealed the least about themselves. Ties go
    /// to the lowest player. A bot only votes for itself when it is the
    /// sole nominee.
    pub fn choose_bunker_vote(&self, game: &BunkerGame, voter: Player) -> Option<Player> {
        let vote = game.current_vote()?;
        let revealed = |player: &Player| {
            game.card_of(player)
                .map(|card| card.revealed().len())
                .unwrap_or_default()
        };

        vote.tallies()
            .keys()
            .filter(|nominee| **nominee != voter)
            .min_by_key(|nominee| revealed(nominee))
            .or_else(|| vote.tallies().keys().next())
            .copied()
    }

    /// Play every pending bot turn. Returns the number of turns played.
    pub fn play_pets(&self, game: &mut PetsGame) -> usize {
        let mut played = 0;
        loop {
            let Some(actor) = game.current_actor() else {
                break;
            };
            if !actor.is_bot {
                break;
            }
            let (Some(pet), Some(opponent)) = (game.pet_of(&actor), game.opponent_of(&actor))
            else {
                break;
            };

            let action = self.choose_pet_action(pet, opponent);
            let outcome = game
                .take_turn(actor, action)
                .or_else(|_| game.take_turn(actor, PetAction::Attack));
            if let Err(e) = outcome {
                log::warn!("Bot {} could not act: {}", actor, e);
                break;
            }
            played += 1;
        }
        played
    }

    /// Cast votes for every bot survivor that hasn't voted yet.
    pub fn play_bunker(&self, game: &mut BunkerGame) -> usize {
        let Some(vote) = game.current_vote() else {
            return 0;
        };
        let pending: Vec<Player> = game
            .survivors()
            .into_iter()
            .filter(|player| player.is_bot && !vote.has_voted(player))
            .collect();

        let mut cast = 0;
        for bot in pending {
            let Some(target) = self.choose_bunker_vote(game, bot) else {
                continue;
            };
            if game.accept_anonim_vote(bot, target) && game.accept_make_vote(bot) {
                cast += 1;
            }
        }
        cast
    }

    /// Let bots act in whatever game is running.
    ///
    /// Dice bots need no help: they roll when seated.
    pub fn drive(&self, game: &mut MiniGame) -> usize {
        if game.is_finished() {
            return 0;
        }
        match game {
            MiniGame::PetsGame(pets) => self.play_pets(pets),
            MiniGame::BunkerGame(bunker) => self.play_bunker(bunker),
            MiniGame::DiceGame(_) => 0,
        }
    }
}

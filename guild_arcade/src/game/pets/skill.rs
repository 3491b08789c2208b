//! Pet skills and their cooldowns.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

use super::pet::{Specialization, StatusEffect};

/// Numeric skill identifier, unique across specializations.
pub type SkillId = u8;

pub const RAGE: SkillId = 1;
pub const SHIELD_WALL: SkillId = 2;
pub const POISON_ARROW: SkillId = 3;
pub const CAMOUFLAGE: SkillId = 4;
pub const ARCANE_BUBBLE: SkillId = 5;
pub const REVERSE_IN_TIME: SkillId = 6;
pub const HELLFIRE_RAGE: SkillId = 7;
pub const CORRUPTION: SkillId = 8;

/// What using a skill does.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum SkillEffect {
    /// Apply status effects for the given number of turns. `Poisoned`
    /// lands on the opponent, everything else on the caster.
    Status(BTreeMap<StatusEffect, u32>),
    /// Give back the health lost during the opponent's last turn.
    ReverseInTime,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub effect: SkillEffect,
    /// Turns to wait after use. `None` means once per game.
    pub cooldown: Option<u32>,
    pub current_cooldown: u32,
    pub exhausted: bool,
}

impl Skill {
    pub fn new(id: SkillId, name: &str, effect: SkillEffect, cooldown: Option<u32>) -> Self {
        Self {
            id,
            name: name.to_string(),
            effect,
            cooldown,
            current_cooldown: 0,
            exhausted: false,
        }
    }

    fn status(id: SkillId, name: &str, effect: StatusEffect, turns: u32, cooldown: u32) -> Self {
        Self::new(
            id,
            name,
            SkillEffect::Status(BTreeMap::from([(effect, turns)])),
            Some(cooldown),
        )
    }

    #[must_use]
    pub fn usable(&self) -> bool {
        !self.exhausted && self.current_cooldown == 0
    }

    /// Mark the skill as used and start its cooldown.
    pub fn apply(&mut self) {
        match self.cooldown {
            Some(turns) => self.current_cooldown = turns,
            None => self.exhausted = true,
        }
    }

    /// One turn of cooldown passes.
    pub fn tick(&mut self) {
        self.current_cooldown = self.current_cooldown.saturating_sub(1);
    }

    /// Clear cooldowns between battles. Once-per-game skills come back too.
    pub fn reset(&mut self) {
        self.current_cooldown = 0;
        self.exhausted = false;
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.exhausted {
            write!(f, "{} (used)", self.name)
        } else if self.current_cooldown > 0 {
            write!(f, "{} ({} turns)", self.name, self.current_cooldown)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

/// The two skills every pet of a specialization knows.
#[must_use]
pub fn skills_for(specialization: Specialization) -> BTreeMap<SkillId, Skill> {
    let skills = match specialization {
        Specialization::Warrior => [
            Skill::status(RAGE, "Rage", StatusEffect::InRage, 2, 4),
            Skill::status(SHIELD_WALL, "Shield Wall", StatusEffect::UnderShield, 2, 3),
        ],
        Specialization::Hunter => [
            Skill::status(POISON_ARROW, "Poison Arrow", StatusEffect::Poisoned, 3, 4),
            Skill::status(CAMOUFLAGE, "Camouflage", StatusEffect::InBubble, 2, 4),
        ],
        Specialization::Mage => [
            Skill::status(ARCANE_BUBBLE, "Arcane Bubble", StatusEffect::InBubble, 2, 3),
            Skill::new(
                REVERSE_IN_TIME,
                "Reverse in Time",
                SkillEffect::ReverseInTime,
                None,
            ),
        ],
        Specialization::Demon => [
            Skill::status(HELLFIRE_RAGE, "Hellfire Rage", StatusEffect::InRage, 2, 5),
            Skill::status(CORRUPTION, "Corruption", StatusEffect::Poisoned, 3, 3),
        ],
    };
    skills.into_iter().map(|skill| (skill.id, skill)).collect()
}

//! Pets: stats, status effects and leveling.

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

use super::skill::{Skill, SkillId, skills_for};
use crate::{
    game::random::RandomSource,
    wallet::{GuildId, UserId},
};

pub type PetId = u64;

/// Experience for winning a battle, before the rarity multiplier
pub const WIN_EXPERIENCE: u32 = 10;

/// Experience for losing a battle, before the rarity multiplier
pub const LOSS_EXPERIENCE: u32 = 5;

/// Max health bonus per level-up, inclusive
pub const LEVEL_UP_HEALTH_BONUS: (u32, u32) = (4, 9);

const BASE_HEALTH: u32 = 30;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Strength,
    Dexterity,
    Intellect,
}

/// Combat archetype. Decides the skills and which attribute drives damage.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialization {
    Warrior,
    Hunter,
    Mage,
    Demon,
}

impl Specialization {
    pub const ALL: [Specialization; 4] = [
        Specialization::Warrior,
        Specialization::Hunter,
        Specialization::Mage,
        Specialization::Demon,
    ];

    /// Attribute that feeds the damage modifier
    #[must_use]
    pub const fn main_attribute(self) -> Attribute {
        match self {
            Self::Warrior | Self::Demon => Attribute::Strength,
            Self::Hunter => Attribute::Dexterity,
            Self::Mage => Attribute::Intellect,
        }
    }

    #[must_use]
    pub const fn secondary_attribute(self) -> Attribute {
        match self {
            Self::Warrior | Self::Mage => Attribute::Dexterity,
            Self::Hunter => Attribute::Strength,
            Self::Demon => Attribute::Intellect,
        }
    }

    #[must_use]
    pub const fn weak_attribute(self) -> Attribute {
        match self {
            Self::Warrior | Self::Hunter => Attribute::Intellect,
            Self::Mage => Attribute::Strength,
            Self::Demon => Attribute::Dexterity,
        }
    }
}

impl fmt::Display for Specialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Warrior => "warrior",
            Self::Hunter => "hunter",
            Self::Mage => "mage",
            Self::Demon => "demon",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for Specialization {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|spec| spec.to_string() == s.to_lowercase())
            .ok_or_else(|| format!("unknown specialization '{s}'"))
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    #[default]
    Common,
    Legendary,
}

impl Rarity {
    /// Experience multiplier
    #[must_use]
    pub const fn exp_scale(self) -> f64 {
        match self {
            Self::Common => 1.0,
            Self::Legendary => 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEffect {
    /// Max hit and crit chances, plus an extra turn on activation
    InRage,
    /// Incoming damage reduced by `5 + modifier`
    UnderShield,
    /// Next incoming damage instance is nullified
    InBubble,
    /// Damage at the start of each own turn
    Poisoned,
}

impl StatusEffect {
    /// Whether a skill applying this effect targets the opponent
    #[must_use]
    pub const fn targets_opponent(self) -> bool {
        matches!(self, Self::Poisoned)
    }
}

/// Experience needed to advance from `level` to the next one
#[must_use]
pub fn pet_lvl_to_exp(level: u32) -> u32 {
    let exponent = level.saturating_sub(1) as i32;
    (20.0 * 1.35_f64.powi(exponent)).round() as u32
}

/// Persisted pet record exchanged with the pet ledger.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Serialize)]
pub struct PetSnapshot {
    pub id: PetId,
    pub guild: GuildId,
    pub owner: UserId,
    pub name: String,
    pub specialization: Specialization,
    pub rarity: Rarity,
    pub level: u32,
    pub experience: u32,
    pub max_health: u32,
    pub health: u32,
    pub strength: u32,
    pub dexterity: u32,
    pub intellect: u32,
}

impl PetSnapshot {
    /// Level 1 pet: 12 in the main attribute, 10 in the secondary one and 8
    /// in the weak one
    pub fn starter(
        id: PetId,
        guild: GuildId,
        owner: UserId,
        name: &str,
        specialization: Specialization,
        rarity: Rarity,
    ) -> Self {
        let mut snapshot = Self {
            id,
            guild,
            owner,
            name: name.to_string(),
            specialization,
            rarity,
            level: 1,
            experience: 0,
            max_health: BASE_HEALTH,
            health: BASE_HEALTH,
            strength: 0,
            dexterity: 0,
            intellect: 0,
        };
        for (attribute, value) in [
            (specialization.main_attribute(), 12),
            (specialization.secondary_attribute(), 10),
            (specialization.weak_attribute(), 8),
        ] {
            match attribute {
                Attribute::Strength => snapshot.strength = value,
                Attribute::Dexterity => snapshot.dexterity = value,
                Attribute::Intellect => snapshot.intellect = value,
            }
        }
        snapshot
    }
}

/// A pet taking part in a battle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Pet {
    pub id: PetId,
    pub guild: GuildId,
    pub owner: UserId,
    pub name: String,
    pub rarity: Rarity,
    pub level: u32,
    pub experience: u32,
    pub exp_scale: f64,
    pub max_health: u32,
    pub health: u32,
    pub strength: u32,
    pub dexterity: u32,
    pub intellect: u32,
    pub specialization: Specialization,
    pub skills: BTreeMap<SkillId, Skill>,
    /// Remaining own turns per active effect
    pub status_effects: BTreeMap<StatusEffect, u32>,
    /// Damage dealt by `Poisoned`, fixed when the poison was cast
    pub poison_damage: u32,
    /// Health lost to the opponent's actions since the end of this pet's
    /// previous turn. Poison upkeep is not counted.
    pub last_damage_taken: u32,
}

impl Pet {
    #[must_use]
    pub fn from_snapshot(snapshot: PetSnapshot) -> Self {
        Self {
            id: snapshot.id,
            guild: snapshot.guild,
            owner: snapshot.owner,
            name: snapshot.name,
            rarity: snapshot.rarity,
            level: snapshot.level.max(1),
            experience: snapshot.experience,
            exp_scale: snapshot.rarity.exp_scale(),
            max_health: snapshot.max_health,
            health: snapshot.health.min(snapshot.max_health),
            strength: snapshot.strength,
            dexterity: snapshot.dexterity,
            intellect: snapshot.intellect,
            specialization: snapshot.specialization,
            skills: skills_for(snapshot.specialization),
            status_effects: BTreeMap::new(),
            poison_damage: 0,
            last_damage_taken: 0,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> PetSnapshot {
        PetSnapshot {
            id: self.id,
            guild: self.guild,
            owner: self.owner,
            name: self.name.clone(),
            specialization: self.specialization,
            rarity: self.rarity,
            level: self.level,
            experience: self.experience,
            max_health: self.max_health,
            health: self.health,
            strength: self.strength,
            dexterity: self.dexterity,
            intellect: self.intellect,
        }
    }

    #[must_use]
    pub fn attribute(&self, attribute: Attribute) -> u32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Dexterity => self.dexterity,
            Attribute::Intellect => self.intellect,
        }
    }

    fn attribute_mut(&mut self, attribute: Attribute) -> &mut u32 {
        match attribute {
            Attribute::Strength => &mut self.strength,
            Attribute::Dexterity => &mut self.dexterity,
            Attribute::Intellect => &mut self.intellect,
        }
    }

    /// `floor((main - 10) / 2)`, negative for weak pets
    #[must_use]
    pub fn modifier(&self) -> i32 {
        let main = self.attribute(self.specialization.main_attribute()) as i32;
        (main - 10).div_euclid(2)
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    #[must_use]
    pub fn has(&self, effect: StatusEffect) -> bool {
        self.status_effects.contains_key(&effect)
    }

    /// Start (or refresh) an effect for `turns` own turns
    pub fn add_status(&mut self, effect: StatusEffect, turns: u32) {
        if turns > 0 {
            self.status_effects.insert(effect, turns);
        }
    }

    /// Consume the bubble if there is one
    pub fn pop_bubble(&mut self) -> bool {
        self.status_effects.remove(&StatusEffect::InBubble).is_some()
    }

    /// Lose up to `amount` health. Returns the health actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.health);
        self.health -= lost;
        self.last_damage_taken += lost;
        lost
    }

    /// Lose this upkeep's poison damage. Returns the health actually lost.
    pub fn suffer_poison(&mut self) -> u32 {
        let lost = self.poison_damage.min(self.health);
        self.health -= lost;
        lost
    }

    /// Regain up to `amount` health without passing `max_health`.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let gained = amount.min(self.max_health - self.health.min(self.max_health));
        self.health += gained;
        gained
    }

    pub fn tick_cooldowns(&mut self) {
        for skill in self.skills.values_mut() {
            skill.tick();
        }
    }

    /// One own turn passed: shorten every effect and drop expired ones
    pub fn tick_status_effects(&mut self) {
        self.status_effects.retain(|_, turns| {
            *turns = turns.saturating_sub(1);
            *turns > 0
        });
        if !self.has(StatusEffect::Poisoned) {
            self.poison_damage = 0;
        }
    }

    /// Back to full health with no effects or cooldowns
    pub fn restore(&mut self) {
        self.health = self.max_health;
        self.status_effects.clear();
        self.poison_damage = 0;
        self.last_damage_taken = 0;
        for skill in self.skills.values_mut() {
            skill.reset();
        }
    }

    /// Experience granted for a finished battle
    #[must_use]
    pub fn battle_experience(&self, won: bool) -> u32 {
        let base = if won { WIN_EXPERIENCE } else { LOSS_EXPERIENCE };
        (f64::from(base) * self.exp_scale).floor() as u32
    }

    /// Add experience and apply every level-up it pays for.
    ///
    /// Returns the number of levels gained.
    pub fn gain_experience(&mut self, amount: u32, rng: &mut dyn RandomSource) -> u32 {
        self.experience += amount;
        let mut gained = 0;

        loop {
            let needed = pet_lvl_to_exp(self.level);
            if self.experience < needed {
                break;
            }
            self.experience -= needed;
            self.level += 1;
            gained += 1;

            let (low, high) = LEVEL_UP_HEALTH_BONUS;
            let bonus = rng.range(i64::from(low), i64::from(high)) as u32;
            self.max_health += bonus;
            self.health += bonus;
            self.strength += 1;
            self.dexterity += 1;
            self.intellect += 1;
            if self.level % 4 == 0 {
                *self.attribute_mut(self.specialization.main_attribute()) += 1;
            }

            log::debug!("Pet {} ({}) reached level {}", self.id, self.name, self.level);
        }

        gained
    }
}

impl fmt::Display for Pet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (lvl {} {}, {}/{} hp)",
            self.name, self.level, self.specialization, self.health, self.max_health
        )
    }
}

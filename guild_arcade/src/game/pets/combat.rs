//! Combat resolution for pet battles.
//!
//! All chances are whole percentages. An attack draws a percentile roll
//! (two digits, `(0, 0)` counting as 100) and compares it against the hit
//! and crit-damage thresholds.

use serde::{Deserialize, Serialize};

use super::pet::{Pet, StatusEffect};
use crate::game::random::{RandomSource, percentile_roll};

pub const MIN_HIT_CHANCE: i64 = 30;
pub const MAX_HIT_CHANCE: i64 = 80;
pub const MIN_CRIT_CHANCE: i64 = 10;
pub const MAX_CRIT_CHANCE: i64 = 85;

/// Die size of a damage roll
pub const DAMAGE_DIE: i32 = 8;

/// Flat part of the shield reduction, the defender's modifier is added
pub const SHIELD_BASE: i32 = 5;

/// Chance to land an attack: `clamp(11 * str - 10 * opp_dex, 30, 80)`
#[must_use]
pub fn hit_chance_pct(strength: u32, opponent_dexterity: u32, raging: bool) -> u32 {
    if raging {
        return MAX_HIT_CHANCE as u32;
    }
    let raw = 11 * i64::from(strength) - 10 * i64::from(opponent_dexterity);
    raw.clamp(MIN_HIT_CHANCE, MAX_HIT_CHANCE) as u32
}

/// Chance of a critical: `clamp(10 * (int - opp_int) + 20, 10, 85)`
#[must_use]
pub fn crit_chance_pct(intellect: u32, opponent_intellect: u32, raging: bool) -> u32 {
    if raging {
        return MAX_CRIT_CHANCE as u32;
    }
    let raw = 10 * (i64::from(intellect) - i64::from(opponent_intellect)) + 20;
    raw.clamp(MIN_CRIT_CHANCE, MAX_CRIT_CHANCE) as u32
}

/// Chance that an attack both hits and crits, rounded to a whole percent
#[must_use]
pub const fn crit_damage_chance(hit_pct: u32, crit_pct: u32) -> u32 {
    (hit_pct * crit_pct + 50) / 100
}

/// Inclusive damage range for one roll: `[1 + mod, 8 + mod]`, or
/// `[4 + mod, 8 + mod]` while raging
#[must_use]
pub fn damage_range(modifier: i32, raging: bool) -> (i32, i32) {
    let low = if raging { DAMAGE_DIE / 2 } else { 1 };
    (low + modifier, DAMAGE_DIE + modifier)
}

/// One damage roll for `pet`. Negative results deal nothing.
pub fn roll_damage(pet: &Pet, rng: &mut dyn RandomSource) -> u32 {
    let (low, high) = damage_range(pet.modifier(), pet.has(StatusEffect::InRage));
    rng.range(i64::from(low), i64::from(high)).max(0) as u32
}

/// Damage per upkeep for a poison cast by `caster`: half a damage roll,
/// at least 1
pub fn poison_damage(caster: &Pet, rng: &mut dyn RandomSource) -> u32 {
    (roll_damage(caster, rng) / 2).max(1)
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackOutcome {
    Miss,
    Hit,
    Critical,
}

/// Classify a percentile roll against the hit and crit-damage chances.
#[must_use]
pub const fn classify(roll: u32, hit_pct: u32, crit_damage_pct: u32) -> AttackOutcome {
    if roll < 100u32.saturating_sub(hit_pct) {
        AttackOutcome::Miss
    } else if roll >= 100u32.saturating_sub(crit_damage_pct) {
        AttackOutcome::Critical
    } else {
        AttackOutcome::Hit
    }
}

/// What absorbed part of an attack
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mitigation {
    None,
    Bubble,
    Shield,
}

/// Apply the defender's bubble or shield to an incoming damage instance.
///
/// A bubble nullifies the damage and is consumed. Otherwise a shield takes
/// off `5 + modifier`.
pub fn mitigate(defender: &mut Pet, damage: u32) -> (u32, Mitigation) {
    if damage == 0 {
        return (0, Mitigation::None);
    }
    if defender.pop_bubble() {
        return (0, Mitigation::Bubble);
    }
    if defender.has(StatusEffect::UnderShield) {
        let reduction = (SHIELD_BASE + defender.modifier()).max(0) as u32;
        return (damage.saturating_sub(reduction), Mitigation::Shield);
    }
    (damage, Mitigation::None)
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AttackReport {
    pub roll: u32,
    pub hit_chance: u32,
    pub crit_damage_chance: u32,
    pub outcome: AttackOutcome,
    /// Damage before mitigation
    pub raw_damage: u32,
    pub mitigation: Mitigation,
    /// Health the defender actually lost
    pub dealt: u32,
}

/// Resolve a basic attack and apply its damage to the defender.
pub fn resolve_attack(
    attacker: &Pet,
    defender: &mut Pet,
    rng: &mut dyn RandomSource,
) -> AttackReport {
    let raging = attacker.has(StatusEffect::InRage);
    let hit = hit_chance_pct(attacker.strength, defender.dexterity, raging);
    let crit = crit_chance_pct(attacker.intellect, defender.intellect, raging);
    let crit_damage = crit_damage_chance(hit, crit);

    let roll = percentile_roll(rng);
    let outcome = classify(roll, hit, crit_damage);

    let raw_damage = match outcome {
        AttackOutcome::Miss => 0,
        AttackOutcome::Hit => roll_damage(attacker, rng),
        AttackOutcome::Critical => roll_damage(attacker, rng) + roll_damage(attacker, rng),
    };
    let (damage, mitigation) = mitigate(defender, raw_damage);
    let dealt = defender.take_damage(damage);

    AttackReport {
        roll,
        hit_chance: hit,
        crit_damage_chance: crit_damage,
        outcome,
        raw_damage,
        mitigation,
        dealt,
    }
}

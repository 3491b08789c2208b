//! Pet battles.
//!
//! Two players each bring the pet stored for them in a [`PetLedger`]. Pets
//! take alternating turns attacking or using one of their two
//! specialization skills until one of them drops to zero health. Both pets
//! then gain experience, are healed and are written back to the ledger.

pub mod battle;
pub mod combat;
pub mod ledger;
pub mod pet;
pub mod skill;

pub use battle::{ActionRejected, PetAction, PetsGame, TurnReport};
pub use combat::{AttackOutcome, AttackReport, Mitigation};
pub use ledger::{InMemoryPetLedger, PetLedger, PetRecord};
pub use pet::{
    Attribute, Pet, PetId, PetSnapshot, Rarity, Specialization, StatusEffect, pet_lvl_to_exp,
};
pub use skill::{Skill, SkillEffect, SkillId, skills_for};

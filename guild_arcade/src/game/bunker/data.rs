//! Character and event cards dealt at the start of a Bunker game.

use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use crate::game::{
    entities::Player,
    random::{RandomSource, pick},
};

pub const MIN_AGE: i64 = 18;
pub const MAX_AGE: i64 = 90;

const PROFESSIONS: &[&str] = &[
    "surgeon",
    "electrician",
    "farmer",
    "chemist",
    "teacher",
    "soldier",
    "plumber",
    "programmer",
    "cook",
    "architect",
    "priest",
    "mechanic",
];

const HEALTH: &[&str] = &[
    "perfectly healthy",
    "asthma",
    "diabetes",
    "poor eyesight",
    "chronic insomnia",
    "allergic to dust",
    "recovering from a broken leg",
    "healthy but a heavy smoker",
];

const HOBBIES: &[&str] = &[
    "gardening",
    "chess",
    "hunting",
    "knitting",
    "amateur radio",
    "carpentry",
    "rock climbing",
    "brewing beer",
    "first aid courses",
];

const PHOBIAS: &[&str] = &[
    "claustrophobia",
    "fear of the dark",
    "fear of spiders",
    "fear of blood",
    "agoraphobia",
    "fear of loneliness",
    "no phobias",
];

const BAGGAGE: &[&str] = &[
    "first aid kit",
    "a box of seeds",
    "hunting rifle",
    "guitar",
    "water filter",
    "toolbox",
    "solar charger",
    "a crate of canned food",
    "encyclopedia",
];

const FACTS: &[&str] = &[
    "once survived a plane crash",
    "speaks five languages",
    "used to be a competitive swimmer",
    "has a criminal record",
    "knows how to build a radio",
    "can't swim",
    "was a child actor",
    "sleepwalks",
];

const CATASTROPHES: &[&str] = &[
    "nuclear war",
    "global pandemic",
    "asteroid impact",
    "supervolcano eruption",
    "zombie outbreak",
    "ice age",
];

const SUPPLIES: &[&str] = &[
    "canned food and water",
    "a hydroponic farm",
    "medical supplies only",
    "a well-stocked armory",
    "nothing but water",
];

/// One revealable piece of a character card
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Profession,
    Biology,
    Health,
    Hobby,
    Phobia,
    Baggage,
    Fact,
}

impl AttributeKind {
    pub const ALL: [AttributeKind; 7] = [
        AttributeKind::Profession,
        AttributeKind::Biology,
        AttributeKind::Health,
        AttributeKind::Hobby,
        AttributeKind::Phobia,
        AttributeKind::Baggage,
        AttributeKind::Fact,
    ];
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Profession => "profession",
            Self::Biology => "biology",
            Self::Health => "health",
            Self::Hobby => "hobby",
            Self::Phobia => "phobia",
            Self::Baggage => "baggage",
            Self::Fact => "fact",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
}

/// Hidden character dealt to one player.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerCard {
    pub profession: String,
    pub sex: Sex,
    pub age: u32,
    pub health: String,
    pub hobby: String,
    pub phobia: String,
    pub baggage: String,
    pub fact: String,
    revealed: BTreeSet<AttributeKind>,
}

impl PlayerCard {
    pub fn generate(rng: &mut dyn RandomSource) -> Self {
        let mut draw = |items: &[&str]| pick(rng, items).copied().unwrap_or_default().to_string();
        let profession = draw(PROFESSIONS);
        let health = draw(HEALTH);
        let hobby = draw(HOBBIES);
        let phobia = draw(PHOBIAS);
        let baggage = draw(BAGGAGE);
        let fact = draw(FACTS);

        let sex = if rng.range(0, 1) == 0 {
            Sex::Male
        } else {
            Sex::Female
        };
        let age = rng.range(MIN_AGE, MAX_AGE) as u32;

        Self {
            profession,
            sex,
            age,
            health,
            hobby,
            phobia,
            baggage,
            fact,
            revealed: BTreeSet::new(),
        }
    }

    /// Text of one attribute, revealed or not
    #[must_use]
    pub fn value(&self, kind: AttributeKind) -> String {
        match kind {
            AttributeKind::Profession => self.profession.clone(),
            AttributeKind::Biology => {
                let sex = match self.sex {
                    Sex::Male => "male",
                    Sex::Female => "female",
                };
                format!("{sex}, {} years old", self.age)
            }
            AttributeKind::Health => self.health.clone(),
            AttributeKind::Hobby => self.hobby.clone(),
            AttributeKind::Phobia => self.phobia.clone(),
            AttributeKind::Baggage => self.baggage.clone(),
            AttributeKind::Fact => self.fact.clone(),
        }
    }

    #[must_use]
    pub fn is_revealed(&self, kind: AttributeKind) -> bool {
        self.revealed.contains(&kind)
    }

    /// Mark an attribute as public. Returns `false` if it already was.
    pub fn reveal(&mut self, kind: AttributeKind) -> bool {
        self.revealed.insert(kind)
    }

    /// Publicly known attributes, in card order
    #[must_use]
    pub fn revealed(&self) -> Vec<(AttributeKind, String)> {
        self.revealed
            .iter()
            .map(|kind| (*kind, self.value(*kind)))
            .collect()
    }

    #[must_use]
    pub fn hidden(&self) -> Vec<AttributeKind> {
        AttributeKind::ALL
            .into_iter()
            .filter(|kind| !self.is_revealed(*kind))
            .collect()
    }
}

/// The scenario every player in one game shares.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct EventCard {
    pub catastrophe: String,
    pub bunker_size_m2: u32,
    pub stay_months: u32,
    pub supplies: String,
}

impl EventCard {
    pub fn generate(rng: &mut dyn RandomSource) -> Self {
        let catastrophe = pick(rng, CATASTROPHES).copied().unwrap_or_default();
        let supplies = pick(rng, SUPPLIES).copied().unwrap_or_default();
        Self {
            catastrophe: catastrophe.to_string(),
            bunker_size_m2: rng.range(20, 200) as u32,
            stay_months: rng.range(3, 60) as u32,
            supplies: supplies.to_string(),
        }
    }
}

/// Cards for one game
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BunkerData {
    pub event: EventCard,
    pub cards: BTreeMap<Player, PlayerCard>,
}

impl BunkerData {
    /// Deal the event card, then one character card per player
    pub fn deal(players: &[Player], rng: &mut dyn RandomSource) -> Self {
        let event = EventCard::generate(rng);
        let cards = players
            .iter()
            .map(|player| (*player, PlayerCard::generate(rng)))
            .collect();
        Self { event, cards }
    }
}

//! Wallet data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Guild (community) ID type
pub type GuildId = u64;

/// User ID type
pub type UserId = u64;

/// Wallet model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub guild: GuildId,
    pub user_id: UserId,
    pub balance: u64,
    pub updated_at: DateTime<Utc>,
}

/// Wallet entry model (one row per balance movement)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    pub id: u64,
    pub guild: GuildId,
    pub user_id: UserId,
    pub amount: u64,
    pub balance_after: u64,
    pub direction: EntryDirection,
    pub created_at: DateTime<Utc>,
}

/// Entry direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryDirection {
    Debit,
    Credit,
}

impl std::fmt::Display for EntryDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryDirection::Debit => write!(f, "debit"),
            EntryDirection::Credit => write!(f, "credit"),
        }
    }
}

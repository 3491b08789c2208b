//! Pet storage seam and an in-memory implementation.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use super::pet::PetSnapshot;
use crate::wallet::{GuildId, UserId, WalletError, WalletResult};

/// Where battles read pets from and write them back to.
pub trait PetLedger: Send + Sync {
    /// Load the pet owned by `user_id`.
    ///
    /// # Errors
    ///
    /// * `WalletError::PetNotFound` - The user has no pet in this guild
    fn load_pet(&self, guild: GuildId, user_id: UserId) -> WalletResult<PetSnapshot>;

    /// Persist a pet after a battle. `won` feeds win/loss counters.
    fn save_pet(&self, guild: GuildId, snapshot: &PetSnapshot, won: bool) -> WalletResult<()>;
}

/// Battle record kept next to each stored pet
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PetRecord {
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Default)]
struct PetBook {
    pets: HashMap<(GuildId, UserId), PetSnapshot>,
    records: HashMap<(GuildId, UserId), PetRecord>,
}

#[derive(Debug, Default)]
pub struct InMemoryPetLedger {
    book: Mutex<PetBook>,
}

impl InMemoryPetLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a user's pet
    pub fn insert(&self, snapshot: PetSnapshot) -> WalletResult<()> {
        let mut book = self.lock()?;
        book.pets.insert((snapshot.guild, snapshot.owner), snapshot);
        Ok(())
    }

    pub fn record(&self, guild: GuildId, user_id: UserId) -> WalletResult<PetRecord> {
        Ok(self
            .lock()?
            .records
            .get(&(guild, user_id))
            .copied()
            .unwrap_or_default())
    }

    fn lock(&self) -> WalletResult<MutexGuard<'_, PetBook>> {
        self.book
            .lock()
            .map_err(|_| WalletError::Storage("pet ledger lock poisoned".to_string()))
    }
}

impl PetLedger for InMemoryPetLedger {
    fn load_pet(&self, guild: GuildId, user_id: UserId) -> WalletResult<PetSnapshot> {
        self.lock()?
            .pets
            .get(&(guild, user_id))
            .cloned()
            .ok_or(WalletError::PetNotFound { guild, user_id })
    }

    fn save_pet(&self, guild: GuildId, snapshot: &PetSnapshot, won: bool) -> WalletResult<()> {
        let mut book = self.lock()?;
        let key = (guild, snapshot.owner);
        book.pets.insert(key, snapshot.clone());

        let record = book.records.entry(key).or_default();
        if won {
            record.wins += 1;
        } else {
            record.losses += 1;
        }
        Ok(())
    }
}

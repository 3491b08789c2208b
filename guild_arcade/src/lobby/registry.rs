//! Tracks which users currently host a lobby.

use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use crate::{
    game::GameKind,
    wallet::{GuildId, UserId},
};

type HostKey = (GuildId, GameKind, UserId);

/// One entry per user hosting an unstarted lobby, per guild and game kind.
///
/// Entries are released when the lobby starts, times out or closes.
#[derive(Debug, Default)]
pub struct LobbyRegistry {
    hosts: Mutex<HashSet<HostKey>>,
}

impl LobbyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the host slot. Returns `false` if the user already holds it.
    pub fn try_register(&self, guild: GuildId, kind: GameKind, user_id: UserId) -> bool {
        self.lock().insert((guild, kind, user_id))
    }

    /// Release the host slot. Returns `false` if it wasn't held.
    pub fn release(&self, guild: GuildId, kind: GameKind, user_id: UserId) -> bool {
        self.lock().remove(&(guild, kind, user_id))
    }

    #[must_use]
    pub fn is_hosting(&self, guild: GuildId, kind: GameKind, user_id: UserId) -> bool {
        self.lock().contains(&(guild, kind, user_id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<HostKey>> {
        // The set stays consistent even if a holder panicked
        self.hosts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_lobby_per_kind() {
        let registry = LobbyRegistry::new();
        assert!(registry.try_register(1, GameKind::PetsBattle, 7));
        assert!(!registry.try_register(1, GameKind::PetsBattle, 7));
        assert!(registry.try_register(1, GameKind::Dice, 7));
        assert!(registry.try_register(2, GameKind::PetsBattle, 7));
    }

    #[test]
    fn test_release_frees_slot() {
        let registry = LobbyRegistry::new();
        registry.try_register(1, GameKind::Bunker, 7);
        assert!(registry.release(1, GameKind::Bunker, 7));
        assert!(!registry.release(1, GameKind::Bunker, 7));
        assert!(!registry.is_hosting(1, GameKind::Bunker, 7));
        assert!(registry.is_empty());
    }
}

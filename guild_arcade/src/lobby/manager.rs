//! Lobby manager for spawning and tracking lobby actors.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
};

use super::{
    actor::{LobbyActor, LobbyHandle},
    config::LobbyConfig,
    core::{Lobby, LobbyId, LobbyMetadata},
    errors::{LobbyError, LobbyResult},
    messages::{LobbyResponse, LobbySnapshot},
    registry::LobbyRegistry,
};
use crate::{
    game::{GameFactory, Player},
    wallet::{BalanceLedger, GuildId},
};

/// Final states kept for [`LobbyManager::wait_for`] once their lobby ends
const FINISHED_RETENTION: usize = 256;

/// Spawned actor task, tagged with its creation order
struct LobbyTask {
    seq: u64,
    task: JoinHandle<LobbySnapshot>,
}

/// Lobby manager for managing multiple lobby instances
pub struct LobbyManager {
    /// Balance ledger holding every stake
    ledger: Arc<dyn BalanceLedger>,

    /// Builds the game each lobby hosts
    factory: GameFactory,

    /// Who is hosting what
    registry: Arc<LobbyRegistry>,

    /// Handles of running lobbies. Each actor task drops its own entry.
    lobbies: Arc<RwLock<HashMap<LobbyId, LobbyHandle>>>,

    /// Actor tasks, resolving to each lobby's final state
    tasks: Arc<Mutex<HashMap<LobbyId, LobbyTask>>>,

    next_seq: AtomicU64,
}

impl LobbyManager {
    /// Create a new lobby manager
    ///
    /// # Arguments
    ///
    /// * `ledger` - Balance ledger for stakes and payouts
    /// * `factory` - Game factory
    ///
    /// # Returns
    ///
    /// * `LobbyManager` - New lobby manager instance
    pub fn new(ledger: Arc<dyn BalanceLedger>, factory: GameFactory) -> Self {
        Self::with_registry(ledger, factory, Arc::new(LobbyRegistry::new()))
    }

    /// Create a lobby manager sharing an existing registry
    pub fn with_registry(
        ledger: Arc<dyn BalanceLedger>,
        factory: GameFactory,
        registry: Arc<LobbyRegistry>,
    ) -> Self {
        Self {
            ledger,
            factory,
            registry,
            lobbies: Arc::new(RwLock::new(HashMap::new())),
            tasks: Arc::new(Mutex::new(HashMap::new())),
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<LobbyRegistry> {
        &self.registry
    }

    /// Create and spawn a new lobby
    ///
    /// # Arguments
    ///
    /// * `config` - Lobby configuration
    /// * `creator` - Player creating the lobby, who pays the first stake
    ///
    /// # Returns
    ///
    /// * `LobbyResult<LobbyId>` - Lobby ID or error
    pub async fn create_lobby(&self, config: LobbyConfig, creator: Player) -> LobbyResult<LobbyId> {
        config.validate().map_err(LobbyError::InvalidConfig)?;

        let (guild, kind) = (config.guild, config.kind);
        if !self.registry.try_register(guild, kind, creator.player_id) {
            return Err(LobbyError::HostBusy);
        }

        let game = self.factory.create(kind, guild, creator);
        let lobby = match Lobby::new(config, creator, game, Arc::clone(&self.ledger)) {
            Ok(lobby) => lobby,
            Err(e) => {
                self.registry.release(guild, kind, creator.player_id);
                return Err(e);
            }
        };
        let lobby_id = lobby.id();

        let (actor, handle) = LobbyActor::new(lobby, Arc::clone(&self.registry));
        self.lobbies.write().await.insert(lobby_id, handle);

        let lobbies = Arc::clone(&self.lobbies);
        let task = tokio::spawn(async move {
            let snapshot = actor.run().await;
            lobbies.write().await.remove(&lobby_id);
            snapshot
        });

        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let mut tasks = self.tasks.lock().await;
        trim_finished(&mut tasks);
        tasks.insert(lobby_id, LobbyTask { seq, task });
        drop(tasks);

        log::info!("Created and spawned lobby {} ({})", lobby_id, kind);
        Ok(lobby_id)
    }

    /// Get lobby handle by ID
    pub async fn get_lobby(&self, lobby_id: LobbyId) -> Option<LobbyHandle> {
        self.lobbies.read().await.get(&lobby_id).cloned()
    }

    /// Metadata of every lobby still running
    ///
    /// # Arguments
    ///
    /// * `guild` - Only list this guild's lobbies, if given
    pub async fn list_lobbies(&self, guild: Option<GuildId>) -> Vec<LobbyMetadata> {
        let handles: Vec<LobbyHandle> = self.lobbies.read().await.values().cloned().collect();

        let mut lobbies = Vec::with_capacity(handles.len());
        for handle in handles {
            match handle.state().await {
                Ok(snapshot) if guild.is_none_or(|g| g == snapshot.metadata.guild) => {
                    lobbies.push(snapshot.metadata);
                }
                Ok(_) => {}
                Err(e) => log::debug!("Lobby {} skipped: {}", handle.lobby_id(), e),
            }
        }
        lobbies.sort_by_key(|metadata| metadata.created_at);
        lobbies
    }

    /// Wait for a lobby to close and take its final state
    ///
    /// Works for lobbies that already ended on their own, as long as their
    /// final state hasn't been trimmed. The lobby is forgotten afterwards.
    ///
    /// # Returns
    ///
    /// * `LobbyResult<LobbySnapshot>` - Final state, or `LobbyNotFound`
    pub async fn wait_for(&self, lobby_id: LobbyId) -> LobbyResult<LobbySnapshot> {
        let task = self
            .tasks
            .lock()
            .await
            .remove(&lobby_id)
            .ok_or(LobbyError::LobbyNotFound)?;
        self.lobbies.write().await.remove(&lobby_id);

        task.task.await.map_err(|e| {
            log::error!("Lobby {} task failed: {}", lobby_id, e);
            LobbyError::Unavailable
        })
    }

    /// Close a lobby: clear it before start, force-end its game after
    ///
    /// A lobby that already ended on its own just hands back its final state.
    pub async fn close_lobby(&self, lobby_id: LobbyId) -> LobbyResult<LobbySnapshot> {
        if let Some(handle) = self.get_lobby(lobby_id).await
            && let Ok(LobbyResponse::Error(e)) = handle.close().await
        {
            return Err(e);
        }
        self.wait_for(lobby_id).await
    }

    /// Drop every final state nobody collected. Returns how many were
    /// removed.
    pub async fn prune(&self) -> usize {
        let mut tasks = self.tasks.lock().await;
        let before = tasks.len();
        tasks.retain(|_, entry| !entry.task.is_finished());
        let pruned = before - tasks.len();
        if pruned > 0 {
            log::debug!("Pruned {} finished lobbies", pruned);
        }
        pruned
    }

    /// Number of lobbies still running
    pub async fn lobby_count(&self) -> usize {
        self.lobbies.read().await.len()
    }
}

/// Keep at most [`FINISHED_RETENTION`] uncollected final states, dropping
/// the oldest lobbies first
fn trim_finished(tasks: &mut HashMap<LobbyId, LobbyTask>) {
    let mut finished: Vec<(u64, LobbyId)> = tasks
        .iter()
        .filter(|(_, entry)| entry.task.is_finished())
        .map(|(id, entry)| (entry.seq, *id))
        .collect();
    if finished.len() <= FINISHED_RETENTION {
        return;
    }

    finished.sort_unstable();
    let excess = finished.len() - FINISHED_RETENTION;
    for (_, id) in finished.into_iter().take(excess) {
        tasks.remove(&id);
    }
    log::debug!("Dropped {} uncollected lobby results", excess);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        game::{GameKind, pets::InMemoryPetLedger},
        wallet::InMemoryLedger,
    };
    use std::time::Duration;

    fn manager(balance: u64) -> (LobbyManager, Arc<InMemoryLedger>) {
        let ledger = Arc::new(InMemoryLedger::new(balance));
        let factory = GameFactory::seeded(Arc::new(InMemoryPetLedger::new()), 11);
        (LobbyManager::new(ledger.clone(), factory), ledger)
    }

    #[tokio::test]
    async fn test_one_lobby_per_host_and_kind() {
        let (manager, _) = manager(1_000);
        let host = Player::human(1);

        manager
            .create_lobby(LobbyConfig::for_kind(1, GameKind::Dice, 10), host)
            .await
            .unwrap();
        let err = manager
            .create_lobby(LobbyConfig::for_kind(1, GameKind::Dice, 10), host)
            .await
            .unwrap_err();
        assert_eq!(err, LobbyError::HostBusy);

        manager
            .create_lobby(LobbyConfig::for_kind(1, GameKind::Bunker, 10), host)
            .await
            .unwrap();
        assert_eq!(manager.lobby_count().await, 2);
    }

    #[tokio::test]
    async fn test_failed_creation_releases_host() {
        let (manager, _) = manager(5);
        let host = Player::human(1);

        let err = manager
            .create_lobby(LobbyConfig::for_kind(1, GameKind::Dice, 10), host)
            .await
            .unwrap_err();
        assert!(matches!(err, LobbyError::Wallet(_)));
        assert!(!manager.registry().is_hosting(1, GameKind::Dice, 1));
    }

    #[tokio::test]
    async fn test_expired_lobby_leaves_on_its_own() {
        let (manager, ledger) = manager(1_000);
        let mut config = LobbyConfig::for_kind(1, GameKind::Dice, 100);
        config.lobby_timeout_secs = 1;
        let id = manager.create_lobby(config, Player::human(1)).await.unwrap();
        assert_eq!(manager.lobby_count().await, 1);

        tokio::time::timeout(Duration::from_secs(5), async {
            while manager.lobby_count().await > 0 {
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .unwrap();
        assert!(manager.get_lobby(id).await.is_none());
        assert!(manager.list_lobbies(None).await.is_empty());
        assert_eq!(ledger.balance(1, 1).unwrap(), 1_000);

        // The final state can still be collected once, then it's gone
        let snapshot = manager.close_lobby(id).await.unwrap();
        assert!(snapshot.metadata.finished);
        assert_eq!(manager.prune().await, 0);
        assert_eq!(manager.wait_for(id).await.unwrap_err(), LobbyError::LobbyNotFound);
    }

    #[tokio::test]
    async fn test_uncollected_results_are_trimmed_oldest_first() {
        let (manager, _) = manager(0);
        let mut ids = Vec::new();
        for n in 0..FINISHED_RETENTION as u64 + 2 {
            let id = manager
                .create_lobby(LobbyConfig::for_kind(1, GameKind::Dice, 0), Player::human(n + 1))
                .await
                .unwrap();
            manager.get_lobby(id).await.unwrap().close().await.unwrap();
            ids.push(id);
        }
        // Let the last actor task wind down, then trigger a trim
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager
            .create_lobby(LobbyConfig::for_kind(1, GameKind::Dice, 0), Player::human(10_000))
            .await
            .unwrap();

        assert_eq!(manager.wait_for(ids[0]).await.unwrap_err(), LobbyError::LobbyNotFound);
        assert!(manager.wait_for(ids[ids.len() - 1]).await.is_ok());
        assert_eq!(manager.prune().await, FINISHED_RETENTION - 1);
    }

    #[tokio::test]
    async fn test_close_refunds_and_forgets() {
        let (manager, ledger) = manager(1_000);
        let id = manager
            .create_lobby(LobbyConfig::for_kind(1, GameKind::Dice, 100), Player::human(1))
            .await
            .unwrap();
        assert_eq!(ledger.balance(1, 1).unwrap(), 900);

        let snapshot = manager.close_lobby(id).await.unwrap();
        assert!(snapshot.metadata.finished);
        assert_eq!(ledger.balance(1, 1).unwrap(), 1_000);
        assert_eq!(manager.lobby_count().await, 0);
        assert_eq!(manager.wait_for(id).await.unwrap_err(), LobbyError::LobbyNotFound);
    }
}

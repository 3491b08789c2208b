//! Runs configured lobbies end to end through the lobby manager.
//!
//! Every lobby is played in its own task. Humans are scripted here, bots
//! are driven by the lobby actors themselves.

use std::{sync::Arc, time::Instant};

use anyhow::{Context, Error};
use guild_arcade::{
    game::{
        GameFactory, GameKind, Player,
        pets::{InMemoryPetLedger, PetAction, PetSnapshot, Rarity, Specialization},
    },
    lobby::{
        BunkerAction, LobbyConfig, LobbyHandle, LobbyManager, LobbyResponse, LobbyResult,
        LobbySnapshot,
    },
    wallet::{BalanceLedger, InMemoryLedger},
};
use serde::Serialize;

use crate::{config::SimConfig, logging::log_lobby_outcome};

/// Player ids per lobby block, so no user sits in two lobbies
const IDS_PER_LOBBY: u64 = 100;

/// Offset of bot ids inside a lobby block
const BOT_OFFSET: u64 = 50;

/// Upper bound on the host's pet battle turns
const MAX_PET_TURNS: usize = 1_000;

/// What one lobby will look like once seated
#[derive(Debug, Clone)]
struct LobbyPlan {
    index: usize,
    config: LobbyConfig,
    host: Player,
    guests: Vec<Player>,
}

impl LobbyPlan {
    fn humans(&self) -> impl Iterator<Item = Player> + '_ {
        std::iter::once(self.host).chain(self.guests.iter().copied().filter(|p| !p.is_bot))
    }
}

/// Summary printed once every lobby settled
#[derive(Debug, Serialize)]
pub struct SimReport {
    pub lobbies: Vec<LobbySnapshot>,
    /// Human wallets touched by the run
    pub humans: usize,
    pub starting_total: u64,
    pub final_total: u64,
    /// Bot shares and rounding remainders nobody was credited with
    pub unpaid_total: u64,
    /// Final balances plus unpaid coins equal the starting balances
    pub conserved: bool,
}

/// Headless driver over a [`LobbyManager`] backed by in-memory ledgers
pub struct Simulator {
    config: SimConfig,
    manager: Arc<LobbyManager>,
    ledger: Arc<InMemoryLedger>,
    pets: Arc<InMemoryPetLedger>,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Self {
        let ledger = Arc::new(InMemoryLedger::new(config.starting_balance));
        let pets = Arc::new(InMemoryPetLedger::new());
        let factory = match config.seed {
            Some(seed) => GameFactory::seeded(pets.clone(), seed),
            None => GameFactory::new(pets.clone()),
        };
        let manager = Arc::new(LobbyManager::new(ledger.clone(), factory));

        Self {
            config,
            manager,
            ledger,
            pets,
        }
    }

    fn plan(&self, index: usize) -> LobbyPlan {
        let kind = self.config.kind_for(index);
        let base = (index as u64 + 1) * IDS_PER_LOBBY;
        let host = Player::human(base + 1);

        let guests = match kind {
            GameKind::PetsBattle => vec![Player::bot(base + BOT_OFFSET)],
            GameKind::Dice | GameKind::Bunker => {
                let humans = (2..=self.config.humans as u64).map(|n| Player::human(base + n));
                let bots = (0..self.config.bots as u64).map(|n| Player::bot(base + BOT_OFFSET + n));
                humans.chain(bots).collect()
            }
        };

        let mut config = LobbyConfig::for_kind(self.config.guild, kind, self.config.bet);
        config.game_timeout_secs = self.config.game_timeout_secs;

        LobbyPlan {
            index,
            config,
            host,
            guests,
        }
    }

    /// Play every configured lobby and settle the books
    pub async fn run(&self) -> Result<SimReport, Error> {
        let plans: Vec<LobbyPlan> = (0..self.config.lobbies).map(|i| self.plan(i)).collect();

        let mut tasks = Vec::with_capacity(plans.len());
        for plan in plans.iter().cloned() {
            let manager = self.manager.clone();
            let pets = self.pets.clone();
            tasks.push(tokio::spawn(async move {
                run_lobby(manager, pets, plan).await
            }));
        }

        let mut lobbies = Vec::with_capacity(tasks.len());
        for task in tasks {
            lobbies.push(task.await??);
        }

        let guild = self.config.guild;
        let mut humans = 0;
        let mut final_total = 0;
        for player in plans.iter().flat_map(LobbyPlan::humans) {
            humans += 1;
            final_total += self
                .ledger
                .balance(guild, player.player_id)
                .with_context(|| format!("Failed to read balance of {player}"))?;
        }

        let starting_total = self.config.starting_balance * humans as u64;
        let unpaid_total = lobbies
            .iter()
            .filter_map(|snapshot| snapshot.settlement.as_ref())
            .map(|settlement| settlement.unpaid)
            .sum();

        Ok(SimReport {
            lobbies,
            humans,
            starting_total,
            final_total,
            unpaid_total,
            conserved: final_total + unpaid_total == starting_total,
        })
    }
}

async fn run_lobby(
    manager: Arc<LobbyManager>,
    pets: Arc<InMemoryPetLedger>,
    plan: LobbyPlan,
) -> Result<LobbySnapshot, Error> {
    let started = Instant::now();
    let kind = plan.config.kind;

    if kind == GameKind::PetsBattle {
        register_pets(&pets, &plan)?;
    }

    let lobby_id = manager
        .create_lobby(plan.config.clone(), plan.host)
        .await
        .with_context(|| format!("Failed to create lobby {}", plan.index))?;
    let handle = manager
        .get_lobby(lobby_id)
        .await
        .with_context(|| format!("Lobby {lobby_id} vanished after creation"))?;

    for guest in &plan.guests {
        let response = handle.join(*guest).await?;
        if !response.is_success() {
            tracing::warn!(lobby = %lobby_id, player = %guest, ?response, "Join refused");
        }
    }

    let response = handle.start(plan.host).await?;
    if !response.is_success() {
        tracing::warn!(lobby = %lobby_id, ?response, "Start refused, closing lobby");
        return Ok(manager.close_lobby(lobby_id).await?);
    }
    tracing::debug!(lobby = %lobby_id, %kind, "Game started");

    // The actor goes away as soon as the game ends, which surfaces here as
    // an error on the next request
    let played = match kind {
        GameKind::Dice => play_dice(&handle, &plan).await,
        GameKind::Bunker => play_bunker(&handle, &plan).await,
        GameKind::PetsBattle => play_pets(&handle, plan.host).await,
    };
    if let Err(e) = played {
        tracing::debug!(lobby = %lobby_id, "Scripted play stopped: {}", e);
    }

    let snapshot = manager.wait_for(lobby_id).await?;
    log_lobby_outcome(
        &kind.to_string(),
        snapshot
            .result
            .as_ref()
            .map_or(0, |result| result.winners().len()),
        snapshot
            .settlement
            .as_ref()
            .map_or(0, |settlement| settlement.pool),
        started.elapsed().as_millis() as u64,
    );
    Ok(snapshot)
}

fn register_pets(pets: &InMemoryPetLedger, plan: &LobbyPlan) -> Result<(), Error> {
    let seats = std::iter::once(plan.host).chain(plan.guests.iter().copied());
    for (n, player) in seats.enumerate() {
        let specialization = Specialization::ALL[(plan.index + n) % Specialization::ALL.len()];
        pets.insert(PetSnapshot::starter(
            player.player_id,
            plan.config.guild,
            player.player_id,
            &format!("Pet{}", player.player_id),
            specialization,
            Rarity::Common,
        ))?;
    }
    Ok(())
}

async fn play_dice(handle: &LobbyHandle, plan: &LobbyPlan) -> LobbyResult<()> {
    for player in plan.humans() {
        if let LobbyResponse::Rolled(value) = handle.roll(player).await? {
            tracing::debug!(player = %player, value, "Rolled");
        }
    }
    Ok(())
}

/// The host only attacks, the bot answers on its own
async fn play_pets(handle: &LobbyHandle, host: Player) -> LobbyResult<()> {
    for _ in 0..MAX_PET_TURNS {
        match handle.pet_turn(host, PetAction::Attack).await? {
            LobbyResponse::Turn(report) if report.finished => break,
            LobbyResponse::Turn(_) => {}
            other => {
                tracing::warn!(?other, "Pet turn refused");
                break;
            }
        }
    }
    Ok(())
}

/// The host runs one nominate, vote, exclude round per guest until the
/// bunker is full enough to end
async fn play_bunker(handle: &LobbyHandle, plan: &LobbyPlan) -> LobbyResult<()> {
    let master = plan.host;
    let mut excluded = Vec::new();

    for target in &plan.guests {
        handle.bunker(master, BunkerAction::Nominate(*target)).await?;
        handle.bunker(master, BunkerAction::StartVote).await?;

        let voters = plan
            .guests
            .iter()
            .filter(|p| !p.is_bot && !excluded.contains(*p));
        for voter in voters {
            handle
                .bunker(*voter, BunkerAction::Choose { target: *target })
                .await?;
            handle.bunker(*voter, BunkerAction::Vote).await?;
        }

        handle.bunker(master, BunkerAction::EndVote).await?;
        handle.bunker(master, BunkerAction::Exclude(*target)).await?;
        excluded.push(*target);
    }
    Ok(())
}

//! Lobby actor owning one lobby for its whole lifetime.

use std::sync::Arc;
use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, sleep_until},
};

use super::{
    core::{Lobby, LobbyId},
    errors::{LobbyError, LobbyResult},
    messages::{BunkerAction, LobbyMessage, LobbyResponse, LobbySnapshot},
    registry::LobbyRegistry,
};
use crate::{
    bot::BotDecisionMaker,
    game::{Game, Player, bunker::BunkerGame, pets::PetAction},
};

/// Inbox capacity per lobby
const INBOX_CAPACITY: usize = 64;

/// Handle for sending messages to a lobby actor
#[derive(Clone, Debug)]
pub struct LobbyHandle {
    sender: mpsc::Sender<LobbyMessage>,
    lobby_id: LobbyId,
}

impl LobbyHandle {
    /// Create a new lobby handle
    pub fn new(sender: mpsc::Sender<LobbyMessage>, lobby_id: LobbyId) -> Self {
        Self { sender, lobby_id }
    }

    /// Get lobby ID
    pub fn lobby_id(&self) -> LobbyId {
        self.lobby_id
    }

    /// Whether the actor has stopped
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Send a message to the lobby
    pub async fn send(&self, message: LobbyMessage) -> LobbyResult<()> {
        self.sender
            .send(message)
            .await
            .map_err(|_| LobbyError::Unavailable)
    }

    /// Send a message and wait for the actor's answer
    pub async fn request<F>(&self, build: F) -> LobbyResult<LobbyResponse>
    where
        F: FnOnce(oneshot::Sender<LobbyResponse>) -> LobbyMessage,
    {
        let (tx, rx) = oneshot::channel();
        self.send(build(tx)).await?;
        rx.await.map_err(|_| LobbyError::Unavailable)
    }

    pub async fn join(&self, player: Player) -> LobbyResult<LobbyResponse> {
        self.request(|response| LobbyMessage::Join { player, response })
            .await
    }

    pub async fn leave(&self, player: Player) -> LobbyResult<LobbyResponse> {
        self.request(|response| LobbyMessage::Leave { player, response })
            .await
    }

    pub async fn kick(&self, by: Player, player: Player) -> LobbyResult<LobbyResponse> {
        self.request(|response| LobbyMessage::Kick {
            by,
            player,
            response,
        })
        .await
    }

    pub async fn invite(&self, by: Player, player: Player) -> LobbyResult<LobbyResponse> {
        self.request(|response| LobbyMessage::Invite {
            by,
            player,
            response,
        })
        .await
    }

    pub async fn set_open(&self, by: Player, open: bool) -> LobbyResult<LobbyResponse> {
        self.request(|response| LobbyMessage::SetOpen { by, open, response })
            .await
    }

    pub async fn start(&self, by: Player) -> LobbyResult<LobbyResponse> {
        self.request(|response| LobbyMessage::Start { by, response })
            .await
    }

    pub async fn roll(&self, player: Player) -> LobbyResult<LobbyResponse> {
        self.request(|response| LobbyMessage::Roll { player, response })
            .await
    }

    pub async fn pet_turn(&self, player: Player, action: PetAction) -> LobbyResult<LobbyResponse> {
        self.request(|response| LobbyMessage::PetTurn {
            player,
            action,
            response,
        })
        .await
    }

    pub async fn bunker(&self, player: Player, action: BunkerAction) -> LobbyResult<LobbyResponse> {
        self.request(|response| LobbyMessage::Bunker {
            player,
            action,
            response,
        })
        .await
    }

    pub async fn close(&self) -> LobbyResult<LobbyResponse> {
        self.request(|response| LobbyMessage::Close { response })
            .await
    }

    /// Current lobby state
    pub async fn state(&self) -> LobbyResult<LobbySnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(LobbyMessage::GetState { response: tx }).await?;
        rx.await.map_err(|_| LobbyError::Unavailable)
    }
}

/// Lobby actor serializing every action on one lobby
pub struct LobbyActor {
    /// The lobby and its game
    lobby: Lobby,

    /// Message inbox
    inbox: mpsc::Receiver<LobbyMessage>,

    /// Host slots, released once the lobby starts or goes away
    registry: Arc<LobbyRegistry>,

    /// Whether this lobby still holds its creator's host slot
    hosting: bool,

    /// Plays for bot participants
    bots: BotDecisionMaker,

    /// When the lobby (or, once started, the game) times out
    deadline: Instant,
}

impl LobbyActor {
    /// Create a new lobby actor
    ///
    /// The creator's host slot must already be claimed in `registry`.
    pub fn new(lobby: Lobby, registry: Arc<LobbyRegistry>) -> (Self, LobbyHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let handle = LobbyHandle::new(sender, lobby.id());
        let deadline = Instant::now() + lobby.config().lobby_timeout();

        let actor = Self {
            lobby,
            inbox,
            registry,
            hosting: true,
            bots: BotDecisionMaker::new(),
            deadline,
        };
        (actor, handle)
    }

    /// Run the actor until the lobby finishes, times out or loses every
    /// handle. Returns the final state.
    pub async fn run(mut self) -> LobbySnapshot {
        log::info!(
            "Lobby {} ({}) accepting players",
            self.lobby.id(),
            self.lobby.config().kind
        );

        loop {
            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => {
                        log::info!("Lobby {}: all handles dropped", self.lobby.id());
                        self.expire();
                        break;
                    }
                },

                () = sleep_until(self.deadline) => {
                    log::info!("Lobby {}: deadline reached", self.lobby.id());
                    self.expire();
                    break;
                }
            }

            self.release_host();
            if self.lobby.is_finished() {
                break;
            }
        }

        self.release_host();
        log::info!("Lobby {} closed", self.lobby.id());
        self.snapshot()
    }

    fn handle_message(&mut self, message: LobbyMessage) {
        match message {
            LobbyMessage::Join { player, response } => {
                let _ = response.send(self.lobby.add(player).into());
            }

            LobbyMessage::Leave { player, response } => {
                let _ = response.send(self.lobby.leave(player).into());
            }

            LobbyMessage::Kick {
                by,
                player,
                response,
            } => {
                let _ = response.send(self.lobby.kick(by, player).into());
            }

            LobbyMessage::Invite {
                by,
                player,
                response,
            } => {
                let result = self.creator_only(by).map(|()| self.lobby.invite(player));
                let _ = response.send(result.into());
            }

            LobbyMessage::SetOpen { by, open, response } => {
                let result = self.creator_only(by).map(|()| self.lobby.set_open(open));
                let _ = response.send(result.into());
            }

            LobbyMessage::Start { by, response } => {
                let result = self.handle_start(by);
                let _ = response.send(result.into());
            }

            LobbyMessage::Roll { player, response } => {
                let result = self.handle_roll(player);
                let _ = response.send(result);
            }

            LobbyMessage::PetTurn {
                player,
                action,
                response,
            } => {
                let result = self.handle_pet_turn(player, action);
                let _ = response.send(result);
            }

            LobbyMessage::Bunker {
                player,
                action,
                response,
            } => {
                let result = self.handle_bunker(player, action);
                let _ = response.send(result);
            }

            LobbyMessage::GetState { response } => {
                let _ = response.send(self.snapshot());
            }

            LobbyMessage::Close { response } => {
                let result = self.lobby.expire();
                let _ = response.send(result.into());
            }
        }
    }

    fn creator_only(&self, by: Player) -> LobbyResult<()> {
        if by == self.lobby.creator() {
            Ok(())
        } else {
            Err(LobbyError::NotCreator)
        }
    }

    fn handle_start(&mut self, by: Player) -> LobbyResult<()> {
        self.lobby.start_game(by)?;

        self.deadline = Instant::now() + self.lobby.config().game_timeout();
        self.release_host();
        self.drive_bots();
        Ok(())
    }

    fn handle_roll(&mut self, player: Player) -> LobbyResponse {
        let Some(dice) = self.lobby.game_mut().as_dice_mut() else {
            return LobbyResponse::Refused("This lobby is not a dice game".to_string());
        };
        match dice.roll(player) {
            Some(value) => LobbyResponse::Rolled(value),
            None => LobbyResponse::Refused("You can't roll right now".to_string()),
        }
    }

    fn handle_pet_turn(&mut self, player: Player, action: PetAction) -> LobbyResponse {
        let Some(pets) = self.lobby.game_mut().as_pets_mut() else {
            return LobbyResponse::Refused("This lobby is not a pet battle".to_string());
        };
        let response = match pets.take_turn(player, action) {
            Ok(report) => LobbyResponse::Turn(Box::new(report)),
            Err(rejected) => return LobbyResponse::Refused(rejected.to_string()),
        };
        self.drive_bots();
        response
    }

    fn handle_bunker(&mut self, player: Player, action: BunkerAction) -> LobbyResponse {
        let Some(bunker) = self.lobby.game_mut().as_bunker_mut() else {
            return LobbyResponse::Refused("This lobby is not a Bunker game".to_string());
        };
        if !apply_bunker_action(bunker, player, action) {
            return LobbyResponse::Refused(format!("{action:?} is not allowed right now"));
        }
        self.drive_bots();
        LobbyResponse::Success
    }

    fn drive_bots(&mut self) {
        let played = self.bots.drive(self.lobby.game_mut());
        if played > 0 {
            log::debug!("Lobby {}: bots made {} move(s)", self.lobby.id(), played);
        }
    }

    fn expire(&mut self) {
        if let Err(e) = self.lobby.expire() {
            log::error!("Lobby {}: expiry failed: {}", self.lobby.id(), e);
        }
    }

    fn release_host(&mut self) {
        if !self.hosting || !(self.lobby.is_started() || self.lobby.is_cleared()) {
            return;
        }
        let config = self.lobby.config();
        self.registry.release(
            config.guild,
            config.kind,
            self.lobby.creator().player_id,
        );
        self.hosting = false;
    }

    fn snapshot(&self) -> LobbySnapshot {
        let game = self.lobby.game();
        LobbySnapshot {
            metadata: self.lobby.metadata(),
            players: self.lobby.players().to_vec(),
            state: game.state(),
            escrowed: self.lobby.escrowed(),
            result: game.result().ok().cloned(),
            settlement: self.lobby.settlement(),
        }
    }
}

/// Forward a Bunker move. Vote management and exclusions belong to the
/// master.
fn apply_bunker_action(game: &mut BunkerGame, player: Player, action: BunkerAction) -> bool {
    let is_master = player == game.master();
    match action {
        BunkerAction::Nominate(target) => game.accept_add_to_vote(target),
        BunkerAction::StartVote => is_master && game.accept_start_vote(),
        BunkerAction::Choose { target } => game.accept_anonim_vote(player, target),
        BunkerAction::Vote => game.accept_make_vote(player),
        BunkerAction::EndVote => game.accept_end_vote(player),
        BunkerAction::Exclude(target) => is_master && game.accept_exclude(target),
        BunkerAction::Reveal(attribute) => game.accept_submit_attribute(player, attribute),
    }
}

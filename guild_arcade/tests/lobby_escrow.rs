//! Lobby escrow integration tests.
//!
//! Every coin a lobby takes must come back exactly once: as a refund, or
//! as part of the payout when the game ends.

use guild_arcade::{
    game::{
        Game, GameFactory, GameKind, GameState, MiniGame, Player, ScriptedRandom,
        pets::InMemoryPetLedger,
    },
    lobby::{Lobby, LobbyConfig, LobbyError},
    wallet::{BalanceLedger, InMemoryLedger},
};
use std::sync::Arc;

const GUILD: u64 = 1;
const CREATOR: Player = Player::human(1);
const BOB: Player = Player::human(2);
const CAROL: Player = Player::human(3);

fn dice_with(rolls: Vec<i64>) -> MiniGame {
    GameFactory::new(Arc::new(InMemoryPetLedger::new())).create_with_rng(
        GameKind::Dice,
        GUILD,
        CREATOR,
        Box::new(ScriptedRandom::new(rolls)),
    )
}

fn lobby(bet: u64, rolls: Vec<i64>) -> (Lobby, Arc<InMemoryLedger>) {
    let ledger = Arc::new(InMemoryLedger::new(1_000));
    let lobby = Lobby::new(
        LobbyConfig::for_kind(GUILD, GameKind::Dice, bet),
        CREATOR,
        dice_with(rolls),
        ledger.clone(),
    )
    .unwrap();
    (lobby, ledger)
}

fn balance(ledger: &InMemoryLedger, player: Player) -> u64 {
    ledger.balance(GUILD, player.player_id).unwrap()
}

#[test]
fn test_kick_before_start_refunds_stake() {
    let (mut lobby, ledger) = lobby(100, vec![]);
    lobby.add(BOB).unwrap();
    assert_eq!(balance(&ledger, CREATOR), 900);
    assert_eq!(balance(&ledger, BOB), 900);
    assert_eq!(lobby.escrowed(), 200);

    lobby.kick(CREATOR, BOB).unwrap();
    assert_eq!(balance(&ledger, BOB), 1_000);
    assert_eq!(lobby.escrowed(), 100);
    assert_eq!(lobby.players(), &[CREATOR]);

    // A second kick finds nobody to refund
    assert_eq!(lobby.kick(CREATOR, BOB), Err(LobbyError::NotInLobby));
    assert_eq!(balance(&ledger, BOB), 1_000);
}

#[test]
fn test_only_creator_kicks() {
    let (mut lobby, _) = lobby(100, vec![]);
    lobby.add(BOB).unwrap();
    lobby.add(CAROL).unwrap();
    assert_eq!(lobby.kick(BOB, CAROL), Err(LobbyError::NotCreator));
    assert_eq!(lobby.kick(CREATOR, CREATOR), Err(LobbyError::CannotRemoveCreator));
    assert_eq!(lobby.escrowed(), 300);
}

#[test]
fn test_winner_takes_pool_once() {
    let (mut lobby, ledger) = lobby(100, vec![7, 9]);
    lobby.add(BOB).unwrap();
    lobby.start_game(CREATOR).unwrap();

    let dice = lobby.game_mut().as_dice_mut().unwrap();
    assert_eq!(dice.roll(CREATOR), Some(7));
    assert_eq!(dice.roll(BOB), Some(9));
    assert!(lobby.is_finished());
    assert_eq!(balance(&ledger, CREATOR), 900);
    assert_eq!(balance(&ledger, BOB), 1_100);

    // Re-assigning End, a timeout and a force end all leave balances alone
    lobby.game_mut().core_mut().set_state(GameState::End);
    lobby.expire().unwrap();
    lobby.game_mut().force_end();
    assert_eq!(balance(&ledger, CREATOR), 900);
    assert_eq!(balance(&ledger, BOB), 1_100);

    let settlement = lobby.settlement().unwrap();
    assert_eq!(settlement.pool, 200);
    assert_eq!(settlement.credited, vec![BOB.player_id]);
    assert_eq!(lobby.escrowed(), 0);
}

#[test]
fn test_tie_splits_pool() {
    let (mut lobby, ledger) = lobby(100, vec![8, 8, 3]);
    lobby.add(BOB).unwrap();
    lobby.add(CAROL).unwrap();
    lobby.start_game(CREATOR).unwrap();

    let dice = lobby.game_mut().as_dice_mut().unwrap();
    for player in [CREATOR, BOB, CAROL] {
        dice.roll(player);
    }

    assert_eq!(balance(&ledger, CREATOR), 1_050);
    assert_eq!(balance(&ledger, BOB), 1_050);
    assert_eq!(balance(&ledger, CAROL), 900);
}

#[test]
fn test_uneven_split_rounds_down() {
    let (mut lobby, ledger) = lobby(101, vec![8, 8, 3]);
    lobby.add(BOB).unwrap();
    lobby.add(CAROL).unwrap();
    lobby.start_game(CREATOR).unwrap();

    let dice = lobby.game_mut().as_dice_mut().unwrap();
    for player in [CREATOR, BOB, CAROL] {
        dice.roll(player);
    }

    // 303 split two ways: 151 each, 1 left over
    let settlement = lobby.settlement().unwrap();
    assert_eq!(settlement.pool, 303);
    assert_eq!(settlement.share, 151);
    assert_eq!(settlement.unpaid, 1);
    assert_eq!(balance(&ledger, CREATOR), 1_050);
    assert_eq!(balance(&ledger, BOB), 1_050);
    assert_eq!(balance(&ledger, CAROL), 899);

    let total: u64 = [CREATOR, BOB, CAROL]
        .iter()
        .map(|player| balance(&ledger, *player))
        .sum();
    assert_eq!(total + settlement.unpaid, 3_000);
}

#[test]
fn test_bot_winner_share_is_not_paid() {
    // The bot rolls 12 when it's seated at start, the humans can't beat it
    let (mut lobby, ledger) = lobby(100, vec![12, 4, 5]);
    lobby.add(Player::bot(50)).unwrap();
    lobby.add(BOB).unwrap();
    assert_eq!(lobby.escrowed(), 200);
    lobby.start_game(CREATOR).unwrap();

    let dice = lobby.game_mut().as_dice_mut().unwrap();
    dice.roll(CREATOR);
    dice.roll(BOB);

    assert_eq!(lobby.game().result().unwrap().winners(), &[Player::bot(50)]);
    assert_eq!(balance(&ledger, CREATOR), 900);
    assert_eq!(balance(&ledger, BOB), 900);
    assert_eq!(lobby.settlement().unwrap().unpaid, 200);
}

#[test]
fn test_timeout_without_rolls_refunds_everyone() {
    let (mut lobby, ledger) = lobby(250, vec![]);
    lobby.add(BOB).unwrap();
    lobby.start_game(CREATOR).unwrap();

    lobby.expire().unwrap();
    assert!(lobby.settlement().unwrap().refunded);
    assert_eq!(balance(&ledger, CREATOR), 1_000);
    assert_eq!(balance(&ledger, BOB), 1_000);
}

#[test]
fn test_clear_twice_refunds_once() {
    let (mut lobby, ledger) = lobby(100, vec![]);
    lobby.add(BOB).unwrap();
    lobby.add(CAROL).unwrap();

    assert_eq!(lobby.clear().unwrap(), 3);
    assert_eq!(lobby.clear().unwrap(), 0);
    assert!(!lobby.remove(BOB));
    assert_eq!(lobby.add(BOB), Err(LobbyError::Cleared));
    for player in [CREATOR, BOB, CAROL] {
        assert_eq!(balance(&ledger, player), 1_000);
    }

    let movements = ledger
        .entries_for(GUILD, BOB.player_id)
        .unwrap()
        .into_iter()
        .filter(|entry| entry.amount == 100)
        .count();
    // One debit, one refund
    assert_eq!(movements, 2);
}

#[test]
fn test_remove_many_counts_actual_removals() {
    let (mut lobby, ledger) = lobby(100, vec![]);
    lobby.add(BOB).unwrap();
    lobby.add(CAROL).unwrap();

    let removed = lobby.remove_many(&[BOB, BOB, CREATOR, Player::human(9)]);
    assert_eq!(removed, 1);
    assert_eq!(balance(&ledger, BOB), 1_000);
    assert_eq!(lobby.escrowed(), 200);
}

#[test]
fn test_roster_frozen_after_start() {
    let (mut lobby, _) = lobby(0, vec![]);
    lobby.add(BOB).unwrap();
    lobby.start_game(CREATOR).unwrap();

    assert_eq!(lobby.add(CAROL), Err(LobbyError::AlreadyStarted));
    assert_eq!(lobby.leave(BOB), Err(LobbyError::AlreadyStarted));
    assert!(!lobby.remove(BOB));
    assert_eq!(lobby.remove_many(&[BOB]), 0);
    assert_eq!(lobby.clear().unwrap(), 0);
    assert_eq!(lobby.start_game(CREATOR), Err(LobbyError::AlreadyStarted));
}

//! Bunker integration tests.
//!
//! Full games run by a master: nominations, votes, exclusions and the
//! automatic end once half of the group is out.

use guild_arcade::game::{
    BunkerGame, Game, GameState, Player, ScriptedRandom,
    bunker::{AttributeKind, BunkerPhase},
    random::seeded,
    vision_listener,
};
use std::sync::{Arc, Mutex};

const MASTER: Player = Player::human(100);

fn started(players: u64) -> BunkerGame {
    let mut game = BunkerGame::new(MASTER, seeded(42));
    let mut roster = vec![MASTER];
    roster.extend((1..=players).map(Player::human));
    game.add_players(roster).unwrap();
    game.start().unwrap();
    game
}

/// Nominate `target`, have every survivor vote for it and close the vote.
fn vote_out(game: &mut BunkerGame, target: Player) {
    assert!(game.accept_add_to_vote(target));
    assert!(game.accept_start_vote());
    for voter in game.survivors() {
        assert!(game.accept_anonim_vote(voter, target));
        assert!(game.accept_make_vote(voter));
    }
    assert!(game.accept_end_vote(MASTER));

    let leader = game.last_vote().and_then(|outcome| outcome.leader());
    assert_eq!(leader, Some(target));
    assert!(game.accept_exclude(target));
}

#[test]
fn test_seven_players_end_after_third_exclusion() {
    let mut game = started(6);
    assert_eq!(game.survivors().len(), 6);

    vote_out(&mut game, Player::human(1));
    vote_out(&mut game, Player::human(2));
    assert_eq!(game.state(), GameState::WaitForInput);

    vote_out(&mut game, Player::human(3));
    assert_eq!(game.state(), GameState::End);
    assert_eq!(*game.phase(), BunkerPhase::Ended);

    let result = game.result().unwrap();
    assert_eq!(
        result.winners(),
        &[Player::human(4), Player::human(5), Player::human(6)]
    );
    assert_eq!(
        result.losers(),
        &[Player::human(1), Player::human(2), Player::human(3)]
    );
    assert!(!result.is_winner(&MASTER));
}

#[test]
fn test_only_master_closes_the_vote() {
    let mut game = started(4);
    let alice = Player::human(1);
    game.accept_add_to_vote(alice);
    game.accept_start_vote();

    assert!(!game.accept_end_vote(alice));
    assert!(game.is_voting());
    assert!(game.accept_end_vote(MASTER));
    assert!(!game.is_voting());
    assert!(game.nominees().is_empty());

    // Everyone still inside counts as having voted
    let outcome = game.last_vote().unwrap();
    assert_eq!(outcome.voted.len(), 4);
    assert_eq!(outcome.leader(), None);
}

#[test]
fn test_changing_a_choice_before_voting() {
    let mut game = started(4);
    let (alice, bob, carol) = (Player::human(1), Player::human(2), Player::human(3));
    game.accept_add_to_vote(alice);
    game.accept_add_to_vote(bob);
    game.accept_start_vote();

    assert!(game.accept_anonim_vote(carol, alice));
    assert!(game.accept_anonim_vote(carol, bob));
    assert!(game.accept_make_vote(carol));
    assert!(!game.accept_make_vote(carol));
    assert!(!game.accept_anonim_vote(carol, alice));
    // Not a nominee
    assert!(!game.accept_anonim_vote(alice, carol));
    // The master doesn't vote
    assert!(!game.accept_anonim_vote(MASTER, alice));

    let vote = game.current_vote().unwrap();
    assert_eq!(vote.tallies()[&bob], 1);
    assert_eq!(vote.tallies()[&alice], 0);
    assert_eq!(vote.choice_of(&carol), Some(bob));
}

#[test]
fn test_new_vote_clears_previous_tallies() {
    let mut game = started(4);
    let alice = Player::human(1);
    vote_out(&mut game, alice);

    let bob = Player::human(2);
    game.accept_add_to_vote(bob);
    game.accept_start_vote();
    assert!(game.last_vote().is_none());
    assert_eq!(game.current_vote().unwrap().tallies()[&bob], 0);
}

#[test]
fn test_reveals_notify_vision_listeners() {
    let mut game = started(3);
    let notified = Arc::new(Mutex::new(0usize));
    let counter = Arc::clone(&notified);
    game.on_vision_change(vision_listener(move |_| *counter.lock().unwrap() += 1));

    let alice = Player::human(1);
    assert!(game.accept_submit_attribute(alice, Some(AttributeKind::Profession)));
    assert!(!game.accept_submit_attribute(alice, Some(AttributeKind::Profession)));
    assert!(!game.accept_submit_attribute(alice, None));
    assert!(!game.accept_submit_attribute(MASTER, Some(AttributeKind::Hobby)));
    assert_eq!(*notified.lock().unwrap(), 1);

    let card = game.card_of(&alice).unwrap();
    assert!(card.is_revealed(AttributeKind::Profession));
    assert_eq!(card.hidden().len(), AttributeKind::ALL.len() - 1);
}

#[test]
fn test_force_end_mid_vote() {
    let mut game = BunkerGame::new(MASTER, Box::new(ScriptedRandom::default()));
    game.add_players(vec![MASTER, Player::human(1), Player::human(2), Player::human(3)])
        .unwrap();
    game.start().unwrap();
    game.accept_add_to_vote(Player::human(1));
    game.accept_start_vote();

    game.force_end();
    assert!(game.current_vote().is_none());
    assert!(game.nominees().is_empty());
    assert_eq!(game.result().unwrap().winners().len(), 3);
    assert!(game.result().unwrap().losers().is_empty());

    // Nothing is accepted after the end
    assert!(!game.accept_add_to_vote(Player::human(2)));
    assert!(!game.accept_submit_attribute(Player::human(2), Some(AttributeKind::Fact)));
}

//! Omaha stage progression, sweeps and showdown.

use std::collections::HashSet;

use cardhall_cards::{standard_cards, Card, CardId, Deck, HandCategory, Suit, DECK_SIZE};
use cardhall_game::{Engine, EngineConfig, OmahaGame, Rejection, TimerFired, TimerRequest};
use cardhall_protocol::{GameAction, GameView, OmahaStage, PlayerId};
use rand::rngs::StdRng;
use rand::SeedableRng;

// =========================================================================
// Helpers
// =========================================================================

fn c(code: &str) -> Card {
    let (rank, suit) = code.split_at(code.len() - 1);
    let rank: u8 = match rank {
        "T" => 10,
        "J" => 11,
        "Q" => 12,
        "K" => 13,
        "A" => 14,
        n => n.parse().unwrap(),
    };
    let suit = match suit {
        "H" => Suit::Hearts,
        "D" => Suit::Diamonds,
        "C" => Suit::Clubs,
        _ => Suit::Spades,
    };
    Card::from_id(CardId((suit.index() * 13) as u8 + rank - 2)).unwrap()
}

fn pid(name: &str) -> PlayerId {
    PlayerId::from(name)
}

fn players(n: usize) -> Vec<PlayerId> {
    ["a", "b", "c", "d", "e"][..n].iter().map(|n| pid(n)).collect()
}

/// Deals `holes` round-robin, then burns and reveals `board` in order.
/// Burn cards come from the unused remainder.
fn deck_for(holes: &[[&str; 4]], board: [&str; 5]) -> Deck {
    let mut dealt = Vec::new();
    for round in 0..4 {
        for hole in holes {
            dealt.push(c(hole[round]));
        }
    }
    let board: Vec<Card> = board.iter().map(|code| c(code)).collect();
    let used: HashSet<CardId> = dealt.iter().chain(&board).map(|card| card.id).collect();
    let mut rest = standard_cards()
        .into_iter()
        .filter(|card| !used.contains(&card.id));

    let mut cards = dealt;
    cards.extend(rest.next());
    cards.extend(&board[..3]);
    cards.extend(rest.next());
    cards.push(board[3]);
    cards.extend(rest.next());
    cards.push(board[4]);
    cards.extend(rest);
    Deck::from_cards(cards)
}

fn discard(game: &mut OmahaGame, who: &str, card: &str, now_ms: u64) -> Result<(), Rejection> {
    let action = GameAction::Discard { card_id: c(card).id };
    game.apply(&pid(who), &action, now_ms, &mut StdRng::seed_from_u64(0))
}

/// Discards the first card of every pending player's hand.
fn discard_all(game: &mut OmahaGame, now_ms: u64) {
    for player in game.pending() {
        let card = game.hand(&player).unwrap()[0].id;
        let action = GameAction::Discard { card_id: card };
        game.apply(&player, &action, now_ms, &mut StdRng::seed_from_u64(0))
            .unwrap();
    }
}

fn assert_conserved(game: &OmahaGame) {
    let ids = game.census();
    assert_eq!(ids.len(), DECK_SIZE);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), DECK_SIZE);
}

fn seeded(n: usize) -> OmahaGame {
    let mut rng = StdRng::seed_from_u64(42);
    OmahaGame::new(1, &players(n), EngineConfig::default(), 0, &mut rng).unwrap()
}

// =========================================================================
// Stage gating
// =========================================================================

#[test]
fn test_stage_waits_for_every_pending_player() {
    let mut game = seeded(3);

    for player in ["a", "b"] {
        let card = game.hand(&pid(player)).unwrap()[0].id;
        let action = GameAction::Discard { card_id: card };
        game.apply(&pid(player), &action, 5_000, &mut StdRng::seed_from_u64(0))
            .unwrap();
        assert_eq!(game.stage(), OmahaStage::DiscardToTurn);
        assert_eq!(game.board().len(), 3);
        assert_conserved(&game);
    }
    assert_eq!(game.pending(), vec![pid("c")]);

    discard_all(&mut game, 5_000);
    assert_eq!(game.stage(), OmahaStage::DiscardToRiver);
    assert_eq!(game.board().len(), 4);
    assert_eq!(game.burn_len(), 2);
    assert_eq!(game.pending().len(), 3);
    assert_eq!(game.deadline(&pid("a")), Some(25_000));
    assert_conserved(&game);
}

#[test]
fn test_second_discard_in_same_stage_rejected() {
    let mut game = seeded(2);
    let first = game.hand(&pid("a")).unwrap()[0];
    let second = game.hand(&pid("a")).unwrap()[1];
    game.apply(
        &pid("a"),
        &GameAction::Discard { card_id: first.id },
        0,
        &mut StdRng::seed_from_u64(0),
    )
    .unwrap();

    let result = game.apply(
        &pid("a"),
        &GameAction::Discard { card_id: second.id },
        0,
        &mut StdRng::seed_from_u64(0),
    );
    assert_eq!(result, Err(Rejection::NotPending));
    assert_eq!(game.hand(&pid("a")).unwrap().len(), 3);
    assert_eq!(game.muck_len(), 1);
}

#[test]
fn test_durak_action_is_wrong_variant() {
    let mut game = seeded(2);
    let result = game.apply(&pid("a"), &GameAction::TakeCards, 0, &mut StdRng::seed_from_u64(0));
    assert_eq!(result, Err(Rejection::WrongVariant));
}

#[test]
fn test_full_hand_reaches_showdown_with_five_board_cards() {
    let mut game = seeded(3);
    discard_all(&mut game, 0);
    discard_all(&mut game, 0);

    assert_eq!(game.stage(), OmahaStage::Showdown);
    assert_eq!(game.board().len(), 5);
    assert_eq!(game.burn_len(), 3);
    assert_eq!(game.muck_len(), 6);
    assert!(!game.winners().is_empty());
    assert!(game.winning_score().is_some());
    assert!(game.is_finished());
    assert_eq!(game.timer(), TimerRequest::Idle);
    assert_conserved(&game);

    let card = game.hand(&pid("a")).unwrap()[0].id;
    let result = game.apply(
        &pid("a"),
        &GameAction::Discard { card_id: card },
        0,
        &mut StdRng::seed_from_u64(0),
    );
    assert_eq!(result, Err(Rejection::GameOver));
}

// =========================================================================
// Showdown
// =========================================================================

#[test]
fn test_board_royal_flush_splits_between_all_players() {
    let deck = deck_for(
        &[["2H", "3H", "4D", "5D"], ["2C", "3C", "4C", "6D"]],
        ["AS", "KS", "QS", "JS", "TS"],
    );
    let mut game =
        OmahaGame::with_deck(1, &players(2), deck, EngineConfig::default(), 0).unwrap();
    discard(&mut game, "a", "2H", 0).unwrap();
    discard(&mut game, "b", "2C", 0).unwrap();
    discard(&mut game, "a", "3H", 0).unwrap();
    discard(&mut game, "b", "3C", 0).unwrap();

    assert_eq!(game.board(), &[c("AS"), c("KS"), c("QS"), c("JS"), c("TS")]);
    assert_eq!(game.winners(), &[pid("a"), pid("b")]);
    assert_eq!(
        game.winning_score().map(|s| s.category),
        Some(HandCategory::StraightFlush)
    );
}

#[test]
fn test_quads_beat_two_pair() {
    let deck = deck_for(
        &[["KS", "KC", "3H", "5H"], ["AH", "AD", "QC", "JC"]],
        ["KH", "KD", "7C", "4S", "2D"],
    );
    let mut game =
        OmahaGame::with_deck(1, &players(2), deck, EngineConfig::default(), 0).unwrap();
    discard(&mut game, "a", "3H", 0).unwrap();
    discard(&mut game, "b", "QC", 0).unwrap();
    discard(&mut game, "a", "5H", 0).unwrap();
    discard(&mut game, "b", "JC", 0).unwrap();

    assert_eq!(game.winners(), &[pid("a")]);
    assert_eq!(
        game.winning_score().map(|s| s.category),
        Some(HandCategory::FourOfAKind)
    );

    let GameView::Omaha(view) = game.view(&pid("b")) else {
        panic!("expected omaha view");
    };
    assert_eq!(view.winners, vec![pid("a")]);
    assert_eq!(view.winning_category, Some(HandCategory::FourOfAKind));
    assert!(view.pending_discards.is_empty());
}

// =========================================================================
// Sweep
// =========================================================================

#[test]
fn test_sweep_before_deadline_does_nothing() {
    let mut game = seeded(2);
    let mut rng = StdRng::seed_from_u64(9);
    let result = game.on_timer(TimerFired::Sweep, 19_999, &mut rng);
    assert_eq!(result, Err(Rejection::NothingDue));
    assert_eq!(game.pending().len(), 2);
}

#[test]
fn test_sweep_auto_discards_only_overdue_players() {
    let mut game = seeded(3);
    let mut rng = StdRng::seed_from_u64(9);
    let card = game.hand(&pid("a")).unwrap()[0].id;
    game.apply(&pid("a"), &GameAction::Discard { card_id: card }, 1_000, &mut rng)
        .unwrap();

    game.on_timer(TimerFired::Sweep, 20_000, &mut rng).unwrap();
    assert_eq!(game.stage(), OmahaStage::DiscardToRiver);
    for player in players(3) {
        assert_eq!(game.hand(&player).unwrap().len(), 3);
        assert_eq!(game.deadline(&player), Some(40_000));
    }
    assert_conserved(&game);
}

#[test]
fn test_sweep_does_not_run_into_next_stage() {
    let mut game = seeded(2);
    let mut rng = StdRng::seed_from_u64(9);

    game.on_timer(TimerFired::Sweep, 20_000, &mut rng).unwrap();
    assert_eq!(game.stage(), OmahaStage::DiscardToRiver);
    assert_eq!(game.muck_len(), 2);

    // A repeated sweep at the same instant finds nothing new to do.
    let result = game.on_timer(TimerFired::Sweep, 20_000, &mut rng);
    assert_eq!(result, Err(Rejection::NothingDue));
    assert_eq!(game.muck_len(), 2);

    game.on_timer(TimerFired::Sweep, 40_000, &mut rng).unwrap();
    assert_eq!(game.stage(), OmahaStage::Showdown);
    assert_eq!(
        game.on_timer(TimerFired::Sweep, 60_000, &mut rng),
        Err(Rejection::GameOver)
    );
    assert_conserved(&game);
}

#[test]
fn test_alarm_is_stale_for_omaha() {
    let mut game = seeded(2);
    let fired = TimerFired::Alarm(cardhall_game::TimerTicket { game: 1, epoch: 1 });
    let result = game.on_timer(fired, 20_000, &mut StdRng::seed_from_u64(0));
    assert_eq!(result, Err(Rejection::StaleTimer));
}

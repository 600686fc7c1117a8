use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::cards::{Suit, KING};
use crate::rules::AutoMove;

fn c(rank: u8, suit: Suit) -> Card {
    Card::new(rank, suit)
}

fn settings(kind: GameKind) -> Settings {
    Settings {
        last_game: kind,
        replay_on_win: false,
        ..Settings::seeded(7)
    }
}

fn vegas(deal_three: bool) -> Settings {
    Settings {
        vegas: true,
        deal_three,
        ..settings(GameKind::Klondike)
    }
}

/// Swaps in an empty table so a test can lay out its own position.
fn clear_table(game: &mut Game) {
    game.table = Table::new(game.rules.build_anchors(), game.settings.auto_move);
}

fn place(game: &mut Game, anchor: usize, cards: &[Card]) {
    for &card in cards {
        game.table.anchor_mut(anchor).add_card(card);
    }
}

/// One random legal action followed by everything it sets off.
fn random_step(game: &mut Game, rng: &mut StdRng) {
    if rng.gen_bool(0.2) {
        game.deal();
    } else {
        let from = rng.gen_range(0..game.anchors().len());
        if game.lift(from) {
            let drops = game.legal_drops();
            if drops.is_empty() {
                game.release();
            } else {
                let to = drops[rng.gen_range(0..drops.len())];
                assert!(game.drop_on(to));
            }
        }
    }
    game.settle();
}

#[test]
fn klondike_deals_the_classic_layout() {
    let mut game = Game::new(settings(GameKind::Klondike));
    for (n, pile) in (6..=12).enumerate() {
        assert_eq!(game.anchors()[pile].count(), n + 1);
        assert_eq!(game.anchors()[pile].hidden_count(), n);
    }
    assert_eq!(game.anchors()[0].count(), 24);
    assert!(game.history().is_empty());
    game.check_conservation().unwrap();

    assert!(game.deal());
    assert_eq!(game.anchors()[0].count(), 21);
    assert_eq!(game.anchors()[1].count(), 3);
    assert_eq!(game.history().len(), 1);
    assert_eq!(game.stats().get("SolitaireNormalDeal3").attempts, 1);
}

#[test]
fn every_variant_deals_a_full_deck() {
    for kind in GameKind::ALL {
        let game = Game::new(settings(kind));
        assert_eq!(game.kind(), kind);
        game.check_conservation().unwrap();
        let total: usize = game.anchors().iter().map(CardAnchor::count).sum();
        assert_eq!(total, game.rules.card_count());
    }
}

#[test]
fn seeded_games_repeat() {
    let a = Game::new(settings(GameKind::Freecell));
    let b = Game::new(settings(GameKind::Freecell));
    assert_eq!(a.anchors(), b.anchors());
}

#[test]
fn tapping_the_stock_deals() {
    let mut game = Game::new(settings(GameKind::Klondike));
    assert!(!game.tap(6));
    assert!(game.tap(0));
    assert_eq!(game.anchors()[1].count(), 3);
}

#[test]
fn undo_of_deal_restores_the_stock() {
    let mut game = Game::new(settings(GameKind::Klondike));
    let before = game.anchors().to_vec();
    game.deal();
    game.deal();
    assert!(game.undo());
    assert!(game.undo());
    assert!(!game.undo());
    assert_eq!(game.anchors(), &before[..]);
}

#[test]
fn illegal_drop_keeps_cards_held() {
    let mut game = Game::new(settings(GameKind::Klondike));
    let top = *game.anchors()[6].top().unwrap();
    assert!(game.lift(6));
    assert!(!game.drop_on(0));
    assert_eq!(game.held(), Some((6, &[top][..])));
    assert!(!game.drop_on(6));
    assert_eq!(game.held(), None);
    assert_eq!(game.anchors()[6].top(), Some(&top));
    assert!(game.history().is_empty());
}

#[test]
fn waste_lifts_only_its_top_card() {
    let mut game = Game::new(settings(GameKind::Klondike));
    assert!(!game.lift(0));
    assert!(game.deal());
    let top = *game.anchors()[1].top().unwrap();
    assert!(game.lift(1));
    assert_eq!(game.held(), Some((1, &[top][..])));
    assert_eq!(game.anchors()[1].count(), 2);
}

#[test]
fn commands_wait_while_cards_are_held() {
    let mut game = Game::new(settings(GameKind::Klondike));
    assert!(game.lift(7));
    assert!(!game.deal());
    assert!(!game.lift(8));
    game.release();
    assert!(game.deal());
}

#[test]
fn fling_chains_smart_moves() {
    let mut game = Game::new(settings(GameKind::Klondike));
    clear_table(&mut game);
    place(&mut game, 6, &[c(1, Suit::Hearts)]);
    place(&mut game, 7, &[c(KING, Suit::Spades), c(2, Suit::Hearts)]);
    game.table.anchor_mut(7).set_hidden_count(1);
    place(&mut game, 8, &[c(3, Suit::Hearts)]);

    assert!(game.lift(6));
    assert!(game.fling());
    assert!(game.in_flight().is_some());
    game.settle();

    assert_eq!(game.anchors()[2].count(), 3);
    assert!(game.anchors()[6].is_empty());
    assert_eq!(game.anchors()[7].hidden_count(), 0);
    assert_eq!(game.history().len(), 3);
    assert!(!game.table.was_fling());
}

#[test]
fn fling_without_auto_move_sinks_one_card() {
    let mut game = Game::new(Settings {
        auto_move: AutoMove::Never,
        ..settings(GameKind::Klondike)
    });
    clear_table(&mut game);
    place(&mut game, 6, &[c(1, Suit::Clubs)]);
    place(&mut game, 7, &[c(2, Suit::Clubs)]);

    assert!(game.lift(6));
    assert!(game.fling());
    game.settle();
    assert_eq!(game.anchors()[2].count(), 1);
    assert_eq!(game.anchors()[7].count(), 1);
}

#[test]
fn fling_only_follows_up_flings() {
    let mut game = Game::new(Settings {
        auto_move: AutoMove::FlingOnly,
        ..settings(GameKind::Klondike)
    });
    clear_table(&mut game);
    place(&mut game, 6, &[c(1, Suit::Clubs)]);
    place(&mut game, 7, &[c(2, Suit::Clubs)]);
    place(&mut game, 8, &[c(1, Suit::Hearts)]);
    place(&mut game, 9, &[c(2, Suit::Hearts)]);

    // a plain drop onto a foundation does not pull anything in
    assert!(game.lift(8));
    assert!(game.drop_on(2));
    game.settle();
    assert_eq!(game.anchors()[9].count(), 1);

    assert!(game.lift(6));
    assert!(game.fling());
    game.settle();
    assert!(game.anchors()[7].is_empty());
    assert!(game.anchors()[9].is_empty());
}

#[test]
fn unflingable_card_goes_back() {
    let mut game = Game::new(settings(GameKind::Klondike));
    clear_table(&mut game);
    place(&mut game, 6, &[c(5, Suit::Clubs)]);
    assert!(game.lift(6));
    assert!(!game.fling());
    assert_eq!(game.anchors()[6].top(), Some(&c(5, Suit::Clubs)));
    assert!(game.history().is_empty());
}

#[test]
fn freecell_run_length_follows_free_spaces() {
    let mut game = Game::new(settings(GameKind::Freecell));
    clear_table(&mut game);
    place(
        &mut game,
        8,
        &[
            c(KING, Suit::Spades),
            c(12, Suit::Hearts),
            c(11, Suit::Clubs),
            c(10, Suit::Diamonds),
            c(9, Suit::Clubs),
        ],
    );
    place(&mut game, 9, &[c(11, Suit::Spades)]);
    for (hold, rank) in (0..4).zip(2..) {
        place(&mut game, hold, &[c(rank, Suit::Hearts)]);
    }
    for (pile, rank) in (10..16).zip(2..) {
        place(&mut game, pile, &[c(rank, Suit::Spades)]);
    }
    assert_eq!(game.free_spaces(), 0);
    assert_eq!(game.movable_count(8), 1);

    game.table.anchor_mut(0).pop_card();
    assert_eq!(game.free_spaces(), 1);
    assert_eq!(game.movable_count(8), 2);
    assert!(!game.lift_count(8, 3));

    assert!(game.lift(8));
    assert_eq!(game.legal_drops(), vec![9]);
    assert!(game.drop_on(9));
    assert_eq!(game.anchors()[9].count(), 3);
    assert_eq!(game.anchors()[8].top(), Some(&c(11, Suit::Clubs)));
}

#[test]
fn spider_deals_one_card_per_pile() {
    let mut game = Game::new(settings(GameKind::Spider));
    let before = game.anchors().to_vec();
    for pile in 0..10 {
        let expected = if pile < 4 { 6 } else { 5 };
        assert_eq!(game.anchors()[pile].count(), expected);
        assert_eq!(game.anchors()[pile].visible_count(), 1);
    }
    assert_eq!(game.status().as_deref(), Some("5 deals left"));

    assert!(game.deal());
    assert!(game.is_busy());
    game.settle();
    assert!(!game.is_busy());
    assert_eq!(game.anchors()[10].count(), 40);
    for pile in 0..10 {
        assert_eq!(game.anchors()[pile].count(), before[pile].count() + 1);
    }
    assert_eq!(game.history().len(), 1);
    assert_eq!(game.status().as_deref(), Some("4 deals left"));

    assert!(game.undo());
    assert_eq!(game.anchors(), &before[..]);
}

fn spider_one_card_from_winning(replay_on_win: bool) -> Game {
    let mut game = Game::new(Settings {
        spider_suits: SuitCount::One,
        replay_on_win,
        ..settings(GameKind::Spider)
    });
    clear_table(&mut game);
    let run: Vec<Card> = (1..=KING).rev().map(|rank| c(rank, Suit::Clubs)).collect();
    for _ in 0..7 {
        place(&mut game, 11, &run);
    }
    place(&mut game, 0, &run[..12]);
    place(&mut game, 1, &run[12..]);
    game
}

#[test]
fn spider_completed_run_wins() {
    let mut game = spider_one_card_from_winning(false);
    assert!(game.lift(1));
    assert!(game.drop_on(0));
    assert!(game.is_won());
    assert_eq!(game.anchors()[11].count(), 104);
    assert!(game.anchors()[0].is_empty());
    assert_eq!(game.history().len(), 2);
    assert!(game.take_notices().contains(&Notice::Won));

    let stats = game.stats().get("Spider1Suit");
    assert_eq!((stats.attempts, stats.wins), (1, 1));
    assert!(!game.undo());
}

#[test]
fn win_replays_back_to_the_same_table() {
    let mut expected = spider_one_card_from_winning(false);
    assert!(expected.lift(1) && expected.drop_on(0));
    let won = expected.anchors().to_vec();

    let mut game = spider_one_card_from_winning(true);
    assert!(game.lift(1));
    assert!(game.drop_on(0));
    assert!(game.is_replaying());
    assert!(game.in_flight().is_some());
    assert!(!game.undo());

    game.settle();
    assert!(!game.is_replaying());
    assert!(!game.table.ignores_events());
    assert_eq!(game.anchors(), &won[..]);
    assert_eq!(game.history().len(), 2);
}

#[test]
fn replay_rebuilds_a_played_game() {
    let mut game = Game::new(settings(GameKind::Klondike));
    let mut rng = StdRng::seed_from_u64(5);
    for _ in 0..120 {
        random_step(&mut game, &mut rng);
    }
    let played = game.anchors().to_vec();
    let moves = game.history().clone();

    game.replay.start(&mut game.table);
    game.settle();
    assert_eq!(game.anchors(), &played[..]);
    assert_eq!(game.history(), &moves);
    game.check_conservation().unwrap();
}

#[test]
fn saved_history_replays_to_the_live_table() {
    for kind in GameKind::ALL {
        let mut game = Game::new(settings(kind));
        let mut rng = StdRng::seed_from_u64(21);
        for _ in 0..120 {
            random_step(&mut game, &mut rng);
        }
        let json = game.save().unwrap();
        let played = game.anchors().to_vec();

        let mut restored = Game::from_save(&json, settings(kind));
        assert_eq!(restored.history(), game.history(), "{kind} restore");
        restored.replay.start(&mut restored.table);
        restored.settle();
        assert!(!restored.is_replaying());
        assert_eq!(restored.anchors(), &played[..], "{kind} replay");
        assert_eq!(restored.history(), game.history(), "{kind} history");
        restored.check_conservation().unwrap();
    }
}

#[test]
fn undo_walks_back_through_every_state() {
    for kind in GameKind::ALL {
        let mut game = Game::new(settings(kind));
        let mut rng = StdRng::seed_from_u64(11);
        let mut states: HashMap<usize, Vec<CardAnchor>> = HashMap::new();
        states.insert(0, game.anchors().to_vec());

        for _ in 0..150 {
            random_step(&mut game, &mut rng);
            game.check_conservation().unwrap();
            states.insert(game.history().len(), game.anchors().to_vec());
        }
        assert!(!game.history().is_empty(), "{kind} made no moves");

        while game.undo() {
            if let Some(state) = states.get(&game.history().len()) {
                assert_eq!(game.anchors(), &state[..], "{kind} after undo");
            }
        }
        assert!(game.history().is_empty());
        assert_eq!(game.anchors(), &states[&0][..]);
    }
}

#[test]
fn restart_returns_to_the_deal() {
    let mut game = Game::new(settings(GameKind::FortyThieves));
    let dealt = game.anchors().to_vec();
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..40 {
        random_step(&mut game, &mut rng);
    }
    game.restart();
    assert_eq!(game.anchors(), &dealt[..]);
    assert!(game.history().is_empty());
}

#[test]
fn vegas_deal_one_runs_out() {
    let mut game = Game::new(vegas(false));
    assert_eq!(game.score(), Some(-52));
    assert_eq!(game.status().as_deref(), Some("-$52"));
    for _ in 0..24 {
        assert!(game.deal());
    }
    assert!(game.is_stock_done());
    assert!(game.take_notices().contains(&Notice::StockDone));
    assert!(!game.deal());
}

#[test]
fn undoing_a_redeal_gives_it_back() {
    let mut game = Game::new(vegas(true));
    assert_eq!(game.rules.rules_extra(), 2);
    for _ in 0..8 {
        assert!(game.deal());
    }
    assert!(game.anchors()[0].is_empty());
    let waste = game.anchors()[1].clone();

    assert!(game.deal());
    assert_eq!(game.rules.rules_extra(), 1);
    assert_eq!(game.anchors()[0].count(), 24);

    assert!(game.undo());
    assert_eq!(game.rules.rules_extra(), 2);
    assert_eq!(game.anchors()[1], waste);
}

#[test]
fn vegas_score_carries_into_the_next_game() {
    let mut game = Game::new(vegas(true));
    game.new_game(GameKind::Klondike);
    assert_eq!(game.score(), Some(-104));

    game.new_game(GameKind::Freecell);
    assert_eq!(game.score(), None);
    assert_eq!(game.settings().last_game, GameKind::Freecell);
}

#[test]
fn leaving_a_scored_game_keeps_its_best_score() {
    let mut game = Game::new(vegas(true));
    clear_table(&mut game);
    place(&mut game, 2, &[c(1, Suit::Clubs), c(2, Suit::Clubs), c(3, Suit::Clubs)]);
    assert_eq!(game.score(), Some(-37));

    game.new_game(GameKind::Freecell);
    let stats = game.stats().get("SolitaireVegasDeal3");
    assert_eq!(stats.best_score, -37);
    assert_eq!(stats.wins, 0);

    game.new_game(GameKind::Klondike);
    assert_eq!(game.stats().get("Freecell").best_score, -52);
}

#[test]
fn status_changes_are_announced() {
    let mut game = Game::new(settings(GameKind::FortyThieves));
    assert_eq!(game.status().as_deref(), Some("64 cards left"));
    assert!(game.take_notices().is_empty());
    assert!(game.deal());
    assert!(game
        .take_notices()
        .contains(&Notice::StatusChanged("63 cards left".to_string())));
}

#[test]
fn clock_stops_while_paused() {
    let mut game = Game::new(settings(GameKind::Freecell));
    game.tick(250);
    game.pause();
    game.tick(1000);
    assert!(game.is_paused());
    assert!(!game.lift(8));
    game.resume();
    game.tick(250);
    assert_eq!(game.elapsed_ms(), 500);
}

#[test]
fn save_and_restore_round_trip() {
    let mut game = Game::new(vegas(true));
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..60 {
        random_step(&mut game, &mut rng);
    }
    game.tick(4321);
    let json = game.save().unwrap();

    let restored = Game::from_save(&json, vegas(false));
    assert_eq!(restored.anchors(), game.anchors());
    assert_eq!(restored.history(), game.history());
    assert_eq!(restored.game_type(), "SolitaireVegasDeal3");
    assert_eq!(restored.score(), game.score());
    assert_eq!(restored.rules.rules_extra(), game.rules.rules_extra());
    assert_eq!(restored.elapsed_ms(), 4321);
}

#[test]
fn spider_save_keeps_the_suit_count() {
    let mut game = Game::new(Settings {
        spider_suits: SuitCount::Two,
        ..settings(GameKind::Spider)
    });
    let json = game.save().unwrap();
    let restored = Game::from_save(&json, settings(GameKind::Klondike));
    assert_eq!(restored.game_type(), "Spider2Suit");
    assert_eq!(restored.anchors(), game.anchors());
}

#[test]
fn unusable_save_starts_a_new_game() {
    let game = Game::from_save("{ not a save", settings(GameKind::Freecell));
    assert_eq!(game.kind(), GameKind::Freecell);
    assert!(game.history().is_empty());
    game.check_conservation().unwrap();
}

#[test]
fn duplicated_card_in_save_is_rejected() {
    let mut game = Game::new(settings(GameKind::Freecell));
    let mut snapshot = game.snapshot();
    snapshot.value[1] = snapshot.value[0];
    snapshot.suit[1] = snapshot.suit[0];
    let err = match Game::restore(&snapshot, settings(GameKind::Freecell)) {
        Ok(_) => panic!("restore accepted a duplicated card"),
        Err(err) => err,
    };
    assert!(err.to_string().contains("complete deck"));
}

fn restore_error(snapshot: &Snapshot, settings: Settings) -> String {
    match Game::restore(snapshot, settings) {
        Ok(_) => panic!("restore accepted a broken save"),
        Err(err) => format!("{err:#}"),
    }
}

#[test]
fn save_with_an_impossible_history_is_rejected() {
    let mut game = Game::new(settings(GameKind::Klondike));
    assert!(game.deal());
    let mut snapshot = game.snapshot();
    snapshot.move_count[0] = 60;
    assert!(restore_error(&snapshot, settings(GameKind::Klondike)).contains("takes 60 cards back"));

    let json = snapshot.to_json().unwrap();
    let mut restored = Game::from_save(&json, settings(GameKind::Klondike));
    assert!(restored.history().is_empty());
    assert!(!restored.undo());
    restored.restart();
    restored.check_conservation().unwrap();
}

#[test]
fn save_with_impossible_redeals_is_rejected() {
    let mut game = Game::new(vegas(true));
    assert!(game.deal());
    let snapshot = game.snapshot();
    assert!(Game::restore(&snapshot, vegas(true)).is_ok());

    for extra in [7, 3, -3] {
        let mut bad = snapshot.clone();
        bad.rules_extra = extra;
        assert!(restore_error(&bad, vegas(true)).contains("is not valid"), "extra {extra}");
    }

    // unlimited redeals would make this a normal game, not the saved Vegas one
    let mut normal = snapshot.clone();
    normal.rules_extra = -1;
    assert!(restore_error(&normal, vegas(true)).contains("restored as"));

    let mut freecell = Game::new(settings(GameKind::Freecell)).snapshot();
    freecell.rules_extra = 1;
    let json = freecell.to_json().unwrap();
    let fallback = Game::from_save(&json, settings(GameKind::Freecell));
    assert!(fallback.history().is_empty());
    assert_eq!(fallback.rules.rules_extra(), 0);
}

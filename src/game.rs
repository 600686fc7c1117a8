use std::collections::HashMap;

use anyhow::{bail, ensure, Context};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::anchor::{AnchorKind, CardAnchor};
use crate::cards::{new_standard_deck, Card, Deck, SuitCount};
use crate::event::Event;
use crate::moves::{Move, MoveHistory};
use crate::rules::{create_rules, GameKind, Rules};
use crate::settings::Settings;
use crate::snapshot::Snapshot;
use crate::stats::Stats;
use crate::table::{Table, Transfer};

use self::replay::Replay;

/// Something the presentation layer should react to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Won,
    ScoreChanged(i32),
    StatusChanged(String),
    /// The stock can no longer be dealt from.
    StockDone,
}

/// Cards lifted off a pile and not yet dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Held {
    from: usize,
    cards: Vec<Card>,
}

/// One game session: the table, its rules, and everything the player can
/// ask of them.
pub struct Game {
    rules: Box<dyn Rules>,
    table: Table,
    settings: Settings,
    rng: StdRng,
    stats: Stats,
    held: Option<Held>,
    replay: Replay,
    notices: Vec<Notice>,
    elapsed_ms: u64,
    paused: bool,
    attempt_marked: bool,
    win_recorded: bool,
    winning_score: Option<i32>,
    last_score: i32,
    last_status: Option<String>,
    stock_done: bool,
}

impl Game {
    /// Deals a fresh game of `settings.last_game`.
    pub fn new(settings: Settings) -> Game {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let kind = settings.last_game;
        let rules = create_rules(kind, &settings);
        let table = Table::new(rules.build_anchors(), settings.auto_move);
        let mut game = Game::assemble(rules, table, settings, rng);
        game.deal_fresh();
        game
    }

    /// Restores a saved game, or deals a new one when the save is unusable.
    pub fn from_save(json: &str, settings: Settings) -> Game {
        let restored = Snapshot::from_json(json)
            .and_then(|snapshot| Game::restore(&snapshot, settings.clone()));
        match restored {
            Ok(game) => game,
            Err(err) => {
                warn!("discarding saved game: {err:#}");
                Game::new(settings)
            }
        }
    }

    pub fn restore(snapshot: &Snapshot, settings: Settings) -> anyhow::Result<Game> {
        let settings = settings_for_save(settings, snapshot);
        let mut rules = create_rules(snapshot.game, &settings);
        let anchors = rules.build_anchors();
        snapshot.validate(snapshot.game, anchors.len(), rules.card_count())?;

        ensure!(
            rules.accepts_rules_extra(snapshot.rules_extra),
            "rules extra {} is not valid for {}",
            snapshot.rules_extra,
            rules.pretty_game_type()
        );

        let mut table = Table::new(anchors, settings.auto_move);
        snapshot.apply(&mut table)?;
        rules.restore(&table, snapshot.rules_extra, snapshot.score);
        ensure!(
            rules.game_type() == snapshot.game_type,
            "saved as {} but restored as {}",
            snapshot.game_type,
            rules.game_type()
        );

        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut game = Game::assemble(rules, table, settings, rng);
        game.check_conservation()
            .context("saved cards do not form a complete deck")?;
        game.elapsed_ms = snapshot.elapsed_ms;
        game.attempt_marked = !game.table.history().is_empty();
        game.sync_notices();
        game.notices.clear();
        info!(
            "restored {} with {} moves",
            game.rules.pretty_game_type(),
            game.table.history().len()
        );
        Ok(game)
    }

    fn assemble(rules: Box<dyn Rules>, table: Table, settings: Settings, rng: StdRng) -> Game {
        Game {
            rules,
            table,
            settings,
            rng,
            stats: Stats::default(),
            held: None,
            replay: Replay::default(),
            notices: Vec::new(),
            elapsed_ms: 0,
            paused: false,
            attempt_marked: false,
            win_recorded: false,
            winning_score: None,
            last_score: 0,
            last_status: None,
            stock_done: false,
        }
    }

    pub fn with_stats(mut self, stats: Stats) -> Game {
        self.stats = stats;
        self
    }

    fn deal_fresh(&mut self) {
        let (decks, suits) = self.rules.deck();
        let mut deck = Deck::new(decks, suits, &mut self.rng);
        let was_ignoring = self.table.set_ignore_events(true);
        self.rules.deal(&mut self.table, &mut deck);
        self.table.set_ignore_events(was_ignoring);
        debug_assert!(deck.is_empty(), "{} cards left undealt", deck.len());
        info!("dealt {}", self.rules.pretty_game_type());
        self.sync_notices();
        self.notices.clear();
    }

    /// Starts over with a new deal of `kind`. A Vegas score carries over
    /// into the next game of the same type.
    pub fn new_game(&mut self, kind: GameKind) {
        if let Some(score) = self.score().filter(|_| !self.win_recorded) {
            self.stats.record_score(self.rules.game_type(), score);
        }
        let carried = self.rules.has_score().then(|| {
            let score = self.winning_score.unwrap_or(self.rules.score(&self.table));
            (self.rules.game_type(), score)
        });

        self.settings.last_game = kind;
        self.rules = create_rules(kind, &self.settings);
        if let Some((game_type, score)) = carried {
            if game_type == self.rules.game_type() {
                self.rules.set_carry_over_score(score);
            }
        }
        self.table = Table::new(self.rules.build_anchors(), self.settings.auto_move);
        self.held = None;
        self.replay = Replay::default();
        self.elapsed_ms = 0;
        self.paused = false;
        self.attempt_marked = false;
        self.win_recorded = false;
        self.winning_score = None;
        self.deal_fresh();
    }

    /// Re-reads the preferences that apply mid-game. The rest take effect
    /// with the next deal.
    pub fn refresh_settings(&mut self, settings: Settings) {
        self.table.set_auto_move(settings.auto_move);
        self.settings = settings;
    }

    // ---- queries ----

    pub fn kind(&self) -> GameKind {
        self.rules.kind()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn anchors(&self) -> &[CardAnchor] {
        self.table.anchors()
    }

    pub fn history(&self) -> &MoveHistory {
        self.table.history()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn score(&self) -> Option<i32> {
        self.rules.has_score().then(|| self.rules.score(&self.table))
    }

    pub fn status(&self) -> Option<String> {
        self.rules.status(&self.table)
    }

    pub fn game_type(&self) -> &'static str {
        self.rules.game_type()
    }

    pub fn pretty_game_type(&self) -> &'static str {
        self.rules.pretty_game_type()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn is_won(&self) -> bool {
        self.table.is_won()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_replaying(&self) -> bool {
        self.replay.is_playing()
    }

    pub fn is_stock_done(&self) -> bool {
        self.rules.is_stock_done(&self.table)
    }

    pub fn in_flight(&self) -> Option<&Transfer> {
        self.table.in_flight()
    }

    /// The lifted cards, bottom first, with the pile they came from.
    pub fn held(&self) -> Option<(usize, &[Card])> {
        self.held.as_ref().map(|h| (h.from, h.cards.as_slice()))
    }

    pub fn free_spaces(&self) -> usize {
        self.rules.count_free_spaces(&self.table)
    }

    pub fn movable_count(&self, anchor: usize) -> usize {
        self.table.anchor(anchor).movable_count(self.free_spaces())
    }

    /// Piles that would accept the held cards.
    pub fn legal_drops(&self) -> Vec<usize> {
        let Some(held) = &self.held else {
            return Vec::new();
        };
        let free = self.free_spaces();
        self.anchors()
            .iter()
            .filter(|a| a.number() != held.from && a.can_drop(&held.cards, free))
            .map(CardAnchor::number)
            .collect()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Something is still moving or waiting to be processed.
    pub fn is_busy(&self) -> bool {
        self.table.in_flight().is_some()
            || self.table.has_event()
            || self.rules.is_dealing()
            || self.replay.is_playing()
    }

    fn can_play(&self) -> bool {
        !self.paused && !self.is_busy() && !self.table.is_won()
    }

    // ---- commands ----

    /// Asks the rules to deal. Returns whether a move was made.
    pub fn deal(&mut self) -> bool {
        if !self.can_play() || self.held.is_some() {
            return false;
        }
        let before = self.table.history().len();
        self.table.alert(Event::Deal);
        self.after_command();
        self.table.history().len() != before
    }

    /// Tapping the stock deals; other piles ignore taps.
    pub fn tap(&mut self, anchor: usize) -> bool {
        match self.table.anchors().get(anchor).map(CardAnchor::kind) {
            Some(AnchorKind::DealFrom) => self.deal(),
            _ => false,
        }
    }

    /// Lifts the whole movable run of `anchor`.
    pub fn lift(&mut self, anchor: usize) -> bool {
        if !self.can_play() || self.held.is_some() || anchor >= self.anchors().len() {
            return false;
        }
        let free = self.free_spaces();
        let pile = self.table.anchor_mut(anchor);
        let cards = match pile.kind() {
            AnchorKind::Generic(_) => pile.take_card_stack(free),
            _ => pile.try_take_top().into_iter().collect(),
        };
        if cards.is_empty() {
            return false;
        }
        debug!("lifted {} card(s) from {anchor}", cards.len());
        self.held = Some(Held { from: anchor, cards });
        true
    }

    /// Lifts the top `count` cards of the movable run of `anchor`.
    pub fn lift_count(&mut self, anchor: usize, count: usize) -> bool {
        if !self.can_play() || self.held.is_some() || anchor >= self.anchors().len() {
            return false;
        }
        if count == 0 || count > self.movable_count(anchor) {
            return false;
        }
        let cards = self.table.anchor_mut(anchor).take_top(count);
        debug!("lifted {count} card(s) from {anchor}");
        self.held = Some(Held { from: anchor, cards });
        true
    }

    /// Drops the held cards on `target`. An illegal drop changes nothing
    /// and the cards stay held.
    pub fn drop_on(&mut self, target: usize) -> bool {
        let Some(held) = &self.held else {
            return false;
        };
        if target == held.from {
            self.release();
            return false;
        }
        if target >= self.anchors().len() {
            return false;
        }
        if !self.table.anchor(target).can_drop(&held.cards, self.free_spaces()) {
            return false;
        }
        let Some(Held { from, cards }) = self.held.take() else {
            return false;
        };
        let unhide = self.table.anchor_mut(from).unhide_top_card();
        self.table.push_move(Move::new(from, target, cards.len(), false, unhide));
        for card in cards {
            self.table.add_card(target, card);
        }
        self.after_command();
        true
    }

    /// Puts the held cards back where they came from.
    pub fn release(&mut self) {
        if let Some(Held { from, cards }) = self.held.take() {
            for card in cards {
                self.table.anchor_mut(from).add_card(card);
            }
        }
    }

    /// Sends a single held card to a foundation that takes it. Longer runs
    /// are released instead.
    pub fn fling(&mut self) -> bool {
        let Some(held) = self.held.take() else {
            return false;
        };
        if held.cards.len() != 1 {
            self.held = Some(held);
            self.release();
            return false;
        }
        let flung = self.rules.fling(&mut self.table, held.from, held.cards[0]);
        self.after_command();
        flung
    }

    pub fn undo(&mut self) -> bool {
        if !self.can_play() || self.held.is_some() {
            return false;
        }
        let Some(mv) = self.table.undo() else {
            return false;
        };
        if mv.add_deal_count() {
            self.rules.add_deal_count();
        }
        self.after_command();
        true
    }

    /// Undoes every move back to the deal.
    pub fn restart(&mut self) {
        self.release();
        self.settle();
        self.table.clear_events();
        while let Some(mv) = self.table.undo() {
            if mv.add_deal_count() {
                self.rules.add_deal_count();
            }
        }
        self.table.clear_won();
        self.win_recorded = false;
        self.winning_score = None;
        self.after_command();
    }

    /// Completes everything in flight and stops the clock.
    pub fn pause(&mut self) {
        self.settle();
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn tick(&mut self, ms: u64) {
        if !self.paused && !self.table.is_won() {
            self.elapsed_ms += ms;
        }
    }

    /// Called by the presentation layer once a transfer has been shown.
    pub fn transfer_complete(&mut self) -> bool {
        if self.table.in_flight().is_none() {
            return false;
        }
        if self.replay.is_playing() {
            self.replay.step_landed(&mut self.table);
        } else {
            self.table.land_transfer();
            self.after_command();
        }
        true
    }

    /// Runs every pending transfer and event to completion.
    pub fn settle(&mut self) {
        loop {
            if self.transfer_complete() {
                continue;
            }
            if self.table.has_event() && !self.table.ignores_events() {
                self.after_command();
                continue;
            }
            break;
        }
    }

    /// Drains the event slot through the rules.
    pub fn handle_events(&mut self) {
        while let Some(event) = self.table.take_event() {
            debug!("processing {event:?}");
            self.rules.process(event, &mut self.table);
        }
    }

    pub fn snapshot(&mut self) -> Snapshot {
        self.release();
        self.settle();
        Snapshot::capture(self.rules.as_ref(), &self.table, self.elapsed_ms)
    }

    pub fn save(&mut self) -> anyhow::Result<String> {
        self.snapshot().to_json()
    }

    fn after_command(&mut self) {
        self.handle_events();
        if !self.attempt_marked && !self.table.history().is_empty() {
            self.attempt_marked = true;
            self.stats.record_attempt(self.rules.game_type());
        }
        if self.table.is_won() && !self.win_recorded {
            self.on_win();
        }
        self.sync_notices();
        if cfg!(debug_assertions) {
            if let Err(err) = self.check_conservation() {
                error!("{err:#}");
            }
        }
    }

    fn on_win(&mut self) {
        self.win_recorded = true;
        self.winning_score = self.score();
        self.stats
            .record_win(self.rules.game_type(), self.elapsed_ms, self.winning_score);
        self.notices.push(Notice::Won);
        if self.settings.replay_on_win {
            self.replay.start(&mut self.table);
        }
    }

    fn sync_notices(&mut self) {
        if let Some(score) = self.score() {
            if score != self.last_score {
                self.last_score = score;
                self.notices.push(Notice::ScoreChanged(score));
            }
        }
        let status = self.status();
        if status != self.last_status {
            self.last_status = status.clone();
            if let Some(status) = status {
                self.notices.push(Notice::StatusChanged(status));
            }
        }
        let done = self.is_stock_done();
        if done && !self.stock_done {
            self.notices.push(Notice::StockDone);
        }
        self.stock_done = done;
    }

    /// Every card of the configured decks is somewhere, exactly once per
    /// copy.
    pub fn check_conservation(&self) -> anyhow::Result<()> {
        let mut found = self.table.census();
        if let Some(held) = &self.held {
            for card in &held.cards {
                *found.entry(*card).or_insert(0) += 1;
            }
        }
        let (decks, suits) = self.rules.deck();
        let mut expected: HashMap<Card, usize> = HashMap::new();
        for card in new_standard_deck(decks, suits) {
            *expected.entry(card).or_insert(0) += 1;
        }

        for (card, &want) in &expected {
            let have = found.get(card).copied().unwrap_or(0);
            if have < want {
                bail!("missing card {card}: {have} of {want}");
            }
        }
        for (card, &have) in &found {
            let want = expected.get(card).copied().unwrap_or(0);
            if have > want {
                bail!("extra card {card}: {have} of {want}");
            }
        }
        Ok(())
    }
}

/// Settings matching the game type a save was made with.
fn settings_for_save(mut settings: Settings, snapshot: &Snapshot) -> Settings {
    match snapshot.game_type.as_str() {
        "SolitaireNormalDeal1" | "SolitaireVegasDeal1" => settings.deal_three = false,
        "SolitaireNormalDeal3" | "SolitaireVegasDeal3" => settings.deal_three = true,
        "Spider1Suit" => settings.spider_suits = SuitCount::One,
        "Spider2Suit" => settings.spider_suits = SuitCount::Two,
        "Spider4Suit" => settings.spider_suits = SuitCount::Four,
        _ => {}
    }
    settings
}

mod replay;

#[cfg(test)]
mod tests;

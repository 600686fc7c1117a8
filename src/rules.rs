//! Per-variant rule engines and the sink logic they share.

mod forty_thieves;
mod freecell;
mod klondike;
mod spider;

use std::fmt;
use std::ops::RangeInclusive;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::anchor::CardAnchor;
use crate::cards::{Card, Deck, SuitCount, RANKS};
use crate::event::Event;
use crate::moves::Move;
use crate::settings::Settings;
use crate::table::Table;

pub use self::forty_thieves::FortyThieves;
pub use self::freecell::Freecell;
pub use self::klondike::Klondike;
pub use self::spider::Spider;

pub const CARDS_PER_DECK: usize = 52;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    #[default]
    Klondike,
    Spider,
    Freecell,
    FortyThieves,
}

impl GameKind {
    pub const ALL: [GameKind; 4] = [
        GameKind::Klondike,
        GameKind::Spider,
        GameKind::Freecell,
        GameKind::FortyThieves,
    ];
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            GameKind::Klondike => "Klondike",
            GameKind::Spider => "Spider",
            GameKind::Freecell => "Freecell",
            GameKind::FortyThieves => "Forty Thieves",
        };
        f.write_str(name)
    }
}

/// When a growing foundation pulls further cards in by itself.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutoMove {
    #[default]
    Always,
    /// Only while following up a fling.
    FlingOnly,
    Never,
}

/// One solitaire variant: its piles, its deal, and its reactions to events.
pub trait Rules {
    fn kind(&self) -> GameKind;

    /// Empty piles in the variant's fixed order; anchor `i` has number `i`.
    fn build_anchors(&self) -> Vec<CardAnchor>;

    /// Number of standard decks and suits the variant plays with.
    fn deck(&self) -> (usize, SuitCount);

    fn card_count(&self) -> usize {
        self.deck().0 * CARDS_PER_DECK
    }

    /// Lays out a fresh game. Events are ignored while dealing.
    fn deal(&mut self, table: &mut Table, deck: &mut Deck);

    /// Whether a saved `rules_extra` is one this variant can produce.
    fn accepts_rules_extra(&self, extra: i32) -> bool {
        extra == 0
    }

    /// Rebuilds variant state after the piles were restored from a save.
    fn restore(&mut self, _table: &Table, _extra: i32, _score: i32) {}

    fn process(&mut self, event: Event, table: &mut Table);

    /// Foundations in the order they are tried.
    fn foundations(&self) -> RangeInclusive<usize>;

    /// Sends a single lifted card towards the foundations. The card goes
    /// back to `from` when no foundation takes it.
    fn fling(&mut self, table: &mut Table, from: usize, card: Card) -> bool {
        if self.foundations().any(|f| table.anchor(f).drop_single_card(&card)) {
            table.alert(Event::Fling { anchor: from, card });
            return true;
        }
        table.anchor_mut(from).add_card(card);
        false
    }

    fn count_free_spaces(&self, _table: &Table) -> usize {
        0
    }

    /// The variant's persisted extra, e.g. Klondike redeals left.
    fn rules_extra(&self) -> i32 {
        0
    }

    /// Hands one redeal back after a restock is undone.
    fn add_deal_count(&mut self) {}

    fn set_carry_over_score(&mut self, _score: i32) {}

    fn has_score(&self) -> bool {
        false
    }

    fn score(&self, _table: &Table) -> i32 {
        0
    }

    /// Short status line, e.g. "3 deals left".
    fn status(&self, _table: &Table) -> Option<String> {
        None
    }

    /// Key used for statistics and saves.
    fn game_type(&self) -> &'static str;

    fn pretty_game_type(&self) -> &'static str;

    /// The stock can never produce another card.
    fn is_stock_done(&self, _table: &Table) -> bool {
        false
    }

    /// A multi-step deal is still running.
    fn is_dealing(&self) -> bool {
        false
    }
}

pub fn create_rules(kind: GameKind, settings: &Settings) -> Box<dyn Rules> {
    match kind {
        GameKind::Klondike => Box::new(Klondike::new(settings.deal_three, settings.vegas)),
        GameKind::Spider => Box::new(Spider::new(settings.spider_suits)),
        GameKind::Freecell => Box::new(Freecell::new()),
        GameKind::FortyThieves => Box::new(FortyThieves::new()),
    }
}

pub(crate) fn foundations_full(table: &Table, foundations: RangeInclusive<usize>) -> bool {
    foundations.map(|f| table.anchor(f).count()).all(|n| n == RANKS as usize)
}

/// Stack-add handling for variants with ace-up foundations: win when all
/// are complete, otherwise keep auto-moving if the setting allows.
pub(crate) fn foundation_grew(
    table: &mut Table,
    foundations: RangeInclusive<usize>,
    anchor: usize,
) {
    if !foundations.contains(&anchor) {
        return;
    }
    if foundations_full(table, foundations) {
        table.signal_win();
        return;
    }
    match table.auto_move() {
        AutoMove::Always => table.alert(Event::SmartMove),
        AutoMove::FlingOnly if table.was_fling() => table.alert(Event::SmartMove),
        _ => table.set_was_fling(false),
    }
}

/// Sends `card`, already off `from`, to the first foundation that takes it.
pub(crate) fn try_to_sink_card(
    table: &mut Table,
    from: usize,
    card: Card,
    foundations: RangeInclusive<usize>,
) -> bool {
    for f in foundations {
        if table.anchor(f).drop_single_card(&card) {
            let unhide = table.anchor_mut(from).unhide_top_card();
            table.push_move(Move::new(from, f, 1, false, unhide));
            table.start_transfer(vec![card], f, None);
            return true;
        }
    }
    false
}

pub(crate) fn try_to_sink(
    table: &mut Table,
    from: usize,
    foundations: RangeInclusive<usize>,
) -> bool {
    if table.anchor(from).visible_count() == 0 {
        return false;
    }
    let card = table.anchor_mut(from).pop_card();
    if try_to_sink_card(table, from, card, foundations) {
        return true;
    }
    table.anchor_mut(from).add_card(card);
    false
}

/// Sinks at most one card, trying `sources` in order. The next stack-add
/// keeps the chain going.
pub(crate) fn smart_move(
    table: &mut Table,
    sources: impl IntoIterator<Item = usize>,
    foundations: RangeInclusive<usize>,
) {
    for source in sources {
        if try_to_sink(table, source, foundations.clone()) {
            debug!("smart move from {source}");
            return;
        }
    }
    table.set_was_fling(false);
}

pub(crate) fn process_fling(
    table: &mut Table,
    from: usize,
    card: Card,
    foundations: RangeInclusive<usize>,
) {
    table.set_was_fling(true);
    if !try_to_sink_card(table, from, card, foundations) {
        table.anchor_mut(from).add_card(card);
        table.set_was_fling(false);
    }
}

/// Moves every remaining deck card onto `stock`.
pub(crate) fn fill_stock(table: &mut Table, stock: usize, deck: &mut Deck) {
    while let Some(card) = deck.pop_card() {
        table.anchor_mut(stock).add_card(card);
    }
}

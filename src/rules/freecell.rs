use std::ops::{Range, RangeInclusive};

use crate::anchor::policy::{Display, Pack, PilePolicy, Sequence, StartRule, SuitRule};
use crate::anchor::CardAnchor;
use crate::cards::{Deck, SuitCount};
use crate::event::Event;
use crate::table::Table;

use super::{foundation_grew, process_fling, smart_move, GameKind, Rules};

const HOLDS: Range<usize> = 0..4;
const FOUNDATIONS: RangeInclusive<usize> = 4..=7;
const TABLEAU: Range<usize> = 8..16;

#[derive(Debug, Default)]
pub struct Freecell;

impl Freecell {
    pub fn new() -> Freecell {
        Freecell
    }
}

impl Rules for Freecell {
    fn kind(&self) -> GameKind {
        GameKind::Freecell
    }

    fn build_anchors(&self) -> Vec<CardAnchor> {
        let pile = PilePolicy::default()
            .start(StartRule::Any)
            .seq(Sequence::Descending)
            .suit(SuitRule::AlternatingColor)
            .behavior(Pack::LimitByFreeCells)
            .display(Display::All);

        HOLDS
            .map(CardAnchor::freecell_hold)
            .chain(FOUNDATIONS.map(CardAnchor::seq_sink))
            .chain(TABLEAU.map(|i| CardAnchor::generic(i, pile)))
            .collect()
    }

    fn deck(&self) -> (usize, SuitCount) {
        (1, SuitCount::Four)
    }

    fn deal(&mut self, table: &mut Table, deck: &mut Deck) {
        for pile in TABLEAU.cycle() {
            let Some(card) = deck.pop_card() else {
                break;
            };
            table.anchor_mut(pile).add_card(card);
        }
    }

    fn process(&mut self, event: Event, table: &mut Table) {
        match event {
            Event::StackAdd(anchor) => foundation_grew(table, FOUNDATIONS, anchor),
            Event::Fling { anchor, card } => process_fling(table, anchor, card, FOUNDATIONS),
            Event::SmartMove => smart_move(table, HOLDS.chain(TABLEAU), FOUNDATIONS),
            Event::Deal | Event::DealNext(_) => {}
        }
    }

    fn foundations(&self) -> RangeInclusive<usize> {
        FOUNDATIONS
    }

    /// Empty holding cells plus empty tableau piles.
    fn count_free_spaces(&self, table: &Table) -> usize {
        HOLDS
            .chain(TABLEAU)
            .filter(|&i| table.anchor(i).is_empty())
            .count()
    }

    fn game_type(&self) -> &'static str {
        "Freecell"
    }

    fn pretty_game_type(&self) -> &'static str {
        "Freecell"
    }
}

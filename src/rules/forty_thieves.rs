use std::ops::{Range, RangeInclusive};

use crate::anchor::policy::{Display, Pack, PilePolicy, Sequence, SuitRule};
use crate::anchor::CardAnchor;
use crate::cards::{Deck, SuitCount};
use crate::event::Event;
use crate::moves::Move;
use crate::table::Table;

use super::{fill_stock, foundation_grew, process_fling, smart_move, GameKind, Rules};

const TABLEAU: Range<usize> = 0..10;
const FOUNDATIONS: RangeInclusive<usize> = 10..=17;
const STOCK: usize = 18;
const WASTE: usize = 19;
const CARDS_PER_PILE: usize = 4;

/// Forty Thieves: two decks, forty cards dealt face up, one stock pass.
#[derive(Debug, Default)]
pub struct FortyThieves;

impl FortyThieves {
    pub fn new() -> FortyThieves {
        FortyThieves
    }
}

impl Rules for FortyThieves {
    fn kind(&self) -> GameKind {
        GameKind::FortyThieves
    }

    fn build_anchors(&self) -> Vec<CardAnchor> {
        let pile = PilePolicy::default()
            .seq(Sequence::Descending)
            .suit(SuitRule::SameSuit)
            .wrap(false)
            .pickup(Pack::LimitByFreeCells)
            .dropoff(Pack::Multi)
            .display(Display::All);

        let mut anchors: Vec<CardAnchor> = TABLEAU
            .map(|i| CardAnchor::generic(i, pile))
            .chain(FOUNDATIONS.map(CardAnchor::seq_sink))
            .collect();
        anchors.push(CardAnchor::deal_from(STOCK));
        anchors.push(CardAnchor::deal_to(WASTE, 1));
        anchors
    }

    fn deck(&self) -> (usize, SuitCount) {
        (2, SuitCount::Four)
    }

    fn deal(&mut self, table: &mut Table, deck: &mut Deck) {
        for pile in TABLEAU {
            for _ in 0..CARDS_PER_PILE {
                if let Some(card) = deck.pop_card() {
                    table.anchor_mut(pile).add_card(card);
                }
            }
        }
        fill_stock(table, STOCK, deck);
    }

    fn process(&mut self, event: Event, table: &mut Table) {
        match event {
            Event::Deal => {
                if table.anchor(STOCK).is_empty() {
                    return;
                }
                let card = table.anchor_mut(STOCK).pop_card();
                table.add_card(WASTE, card);
                table.push_move(Move::new(STOCK, WASTE, 1, true, false));
            }
            Event::StackAdd(anchor) => foundation_grew(table, FOUNDATIONS, anchor),
            Event::Fling { anchor, card } => process_fling(table, anchor, card, FOUNDATIONS),
            Event::SmartMove => smart_move(table, TABLEAU, FOUNDATIONS),
            Event::DealNext(_) => {}
        }
    }

    fn foundations(&self) -> RangeInclusive<usize> {
        FOUNDATIONS
    }

    fn count_free_spaces(&self, table: &Table) -> usize {
        TABLEAU.filter(|&i| table.anchor(i).is_empty()).count()
    }

    fn status(&self, table: &Table) -> Option<String> {
        let left = table.anchor(STOCK).count();
        Some(if left == 1 {
            "1 card left".to_string()
        } else {
            format!("{left} cards left")
        })
    }

    fn game_type(&self) -> &'static str {
        "Forty Thieves"
    }

    fn pretty_game_type(&self) -> &'static str {
        "Forty Thieves"
    }

    fn is_stock_done(&self, table: &Table) -> bool {
        table.anchor(STOCK).is_empty()
    }
}

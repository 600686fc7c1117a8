use std::ops::{Range, RangeInclusive};

use log::debug;

use crate::anchor::policy::{Display, Pack, PilePolicy, Sequence, SuitRule};
use crate::anchor::CardAnchor;
use crate::cards::{Card, Deck, SuitCount, ACE, RANKS};
use crate::event::Event;
use crate::moves::Move;
use crate::table::Table;

use super::{fill_stock, GameKind, Rules};

const TABLEAU: Range<usize> = 0..10;
const STOCK: usize = 10;
const COMPLETED: usize = 11;
const INITIAL_DEAL: usize = 54;
const RUN: usize = RANKS as usize;

/// Spider with one, two or four suits over two decks.
#[derive(Debug)]
pub struct Spider {
    suits: SuitCount,
    still_dealing: bool,
}

impl Spider {
    pub fn new(suits: SuitCount) -> Spider {
        Spider {
            suits,
            still_dealing: false,
        }
    }

    /// Whether the top thirteen cards run King down to Ace in one suit.
    fn completes_run(cards: &[Card]) -> bool {
        let Some(top) = cards.last() else {
            return false;
        };
        if cards.len() < RUN || top.rank != ACE {
            return false;
        }
        cards[cards.len() - RUN..]
            .iter()
            .rev()
            .zip(ACE..)
            .all(|(card, rank)| card.rank == rank && card.suit == top.suit)
    }

    fn extract_run(&self, table: &mut Table, anchor: usize) {
        let pile = table.anchor(anchor);
        if pile.visible_count() < RUN || !Spider::completes_run(pile.cards()) {
            return;
        }
        for _ in 0..RUN {
            let card = table.anchor_mut(anchor).pop_card();
            table.anchor_mut(COMPLETED).add_card(card);
        }
        let unhide = table.anchor_mut(anchor).unhide_top_card();
        table.push_move(Move::new(anchor, COMPLETED, RUN, true, unhide));
        debug!("completed run lifted from {anchor}");

        if table.anchor(COMPLETED).count() == self.card_count() {
            table.signal_win();
        }
    }
}

impl Rules for Spider {
    fn kind(&self) -> GameKind {
        GameKind::Spider
    }

    fn build_anchors(&self) -> Vec<CardAnchor> {
        let pile = PilePolicy::default()
            .build_seq(Sequence::Descending)
            .build_suit(SuitRule::Any)
            .move_seq(Sequence::Descending)
            .move_suit(SuitRule::SameSuit)
            .behavior(Pack::Multi)
            .display(Display::Mix)
            .deal_hack(true);

        let mut anchors: Vec<CardAnchor> = TABLEAU.map(|i| CardAnchor::generic(i, pile)).collect();
        anchors.push(CardAnchor::deal_from(STOCK));
        anchors.push(CardAnchor::deal_to(COMPLETED, 1));
        anchors
    }

    fn deck(&self) -> (usize, SuitCount) {
        (2, self.suits)
    }

    fn deal(&mut self, table: &mut Table, deck: &mut Deck) {
        self.still_dealing = false;
        for pile in TABLEAU.cycle().take(INITIAL_DEAL) {
            if let Some(card) = deck.pop_card() {
                let anchor = table.anchor_mut(pile);
                anchor.add_card(card);
                anchor.set_hidden_count(anchor.count() - 1);
            }
        }
        fill_stock(table, STOCK, deck);
    }

    fn process(&mut self, event: Event, table: &mut Table) {
        match event {
            Event::StackAdd(anchor) => {
                self.extract_run(table, anchor);
                if self.still_dealing {
                    table.alert(Event::DealNext(anchor + 1));
                }
            }
            Event::Deal => {
                let stock = table.anchor(STOCK).count();
                if stock == 0 || self.still_dealing {
                    return;
                }
                let count = stock.min(TABLEAU.len());
                let card = table.anchor_mut(STOCK).pop_card();
                table.push_move(Move::range(STOCK, TABLEAU.start, TABLEAU.start + count - 1, 1));
                table.start_transfer(vec![card], TABLEAU.start, None);
                self.still_dealing = true;
            }
            Event::DealNext(anchor) => {
                if !table.anchor(STOCK).is_empty() && TABLEAU.contains(&anchor) {
                    let card = table.anchor_mut(STOCK).pop_card();
                    table.start_transfer(vec![card], anchor, None);
                } else {
                    self.still_dealing = false;
                }
            }
            Event::Fling { anchor, card } => table.anchor_mut(anchor).add_card(card),
            Event::SmartMove => {}
        }
    }

    fn foundations(&self) -> RangeInclusive<usize> {
        COMPLETED..=COMPLETED
    }

    fn fling(&mut self, table: &mut Table, from: usize, card: Card) -> bool {
        table.anchor_mut(from).add_card(card);
        false
    }

    fn status(&self, table: &Table) -> Option<String> {
        let deals = table.anchor(STOCK).count() / TABLEAU.len();
        Some(if deals == 1 {
            "1 deal left".to_string()
        } else {
            format!("{deals} deals left")
        })
    }

    fn game_type(&self) -> &'static str {
        match self.suits {
            SuitCount::One => "Spider1Suit",
            SuitCount::Two => "Spider2Suit",
            SuitCount::Four => "Spider4Suit",
        }
    }

    fn pretty_game_type(&self) -> &'static str {
        match self.suits {
            SuitCount::One => "Spider One Suit",
            SuitCount::Two => "Spider Two Suit",
            SuitCount::Four => "Spider Four Suit",
        }
    }

    fn is_stock_done(&self, table: &Table) -> bool {
        table.anchor(STOCK).is_empty()
    }

    fn is_dealing(&self) -> bool {
        self.still_dealing
    }
}

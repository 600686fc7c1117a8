use std::ops::RangeInclusive;

use log::debug;

use crate::anchor::policy::{Display, Pack, PilePolicy, Sequence, StartRule, SuitRule};
use crate::anchor::CardAnchor;
use crate::cards::{Deck, SuitCount};
use crate::event::Event;
use crate::moves::Move;
use crate::table::Table;

use super::{fill_stock, foundation_grew, process_fling, smart_move, GameKind, Rules};

const STOCK: usize = 0;
const WASTE: usize = 1;
const FOUNDATIONS: RangeInclusive<usize> = 2..=5;
const TABLEAU: RangeInclusive<usize> = 6..=12;

/// Unlimited redeals.
const NORMAL_STYLE: i32 = -1;
const VEGAS_BUY_IN: i32 = 52;
const VEGAS_PER_CARD: i32 = 5;

/// Classic Klondike, dealing one or three cards, with optional Vegas
/// scoring.
#[derive(Debug)]
pub struct Klondike {
    deal_three: bool,
    vegas: bool,
    /// Redeals left, or [`NORMAL_STYLE`].
    deals_remaining: i32,
    carry_over_score: i32,
}

impl Klondike {
    pub fn new(deal_three: bool, vegas: bool) -> Klondike {
        Klondike {
            deal_three,
            vegas,
            deals_remaining: NORMAL_STYLE,
            carry_over_score: 0,
        }
    }

    fn is_vegas(&self) -> bool {
        self.deals_remaining != NORMAL_STYLE
    }

    /// Redeals a Vegas game starts with.
    fn vegas_redeals(&self) -> i32 {
        if self.deal_three {
            2
        } else {
            0
        }
    }

    fn deal_size(&self) -> usize {
        if self.deal_three {
            3
        } else {
            1
        }
    }

    fn foundation_score(table: &Table) -> i32 {
        FOUNDATIONS
            .map(|f| table.anchor(f).count() as i32 * VEGAS_PER_CARD)
            .sum::<i32>()
            - VEGAS_BUY_IN
    }

    fn turn_stock(&mut self, table: &mut Table) {
        if table.anchor(STOCK).is_empty() {
            if table.anchor(WASTE).is_empty() || self.deals_remaining == 0 {
                return;
            }
            let add_deal_count = self.deals_remaining > 0;
            if add_deal_count {
                self.deals_remaining -= 1;
            }
            let mut count = 0;
            while !table.anchor(WASTE).is_empty() {
                let card = table.anchor_mut(WASTE).pop_card();
                table.add_card(STOCK, card);
                count += 1;
            }
            debug!("restocked {count} cards, {} redeals left", self.deals_remaining);
            table.push_move(Move::redeal(WASTE, STOCK, count, add_deal_count));
        } else {
            let count = self.deal_size().min(table.anchor(STOCK).count());
            for _ in 0..count {
                let card = table.anchor_mut(STOCK).pop_card();
                table.add_card(WASTE, card);
            }
            table.push_move(Move::new(STOCK, WASTE, count, true, false));
        }
    }
}

impl Rules for Klondike {
    fn kind(&self) -> GameKind {
        GameKind::Klondike
    }

    fn build_anchors(&self) -> Vec<CardAnchor> {
        let pile = PilePolicy::default()
            .start(StartRule::KingOnly)
            .seq(Sequence::Descending)
            .suit(SuitRule::AlternatingColor)
            .wrap(false)
            .behavior(Pack::Multi)
            .display(Display::Mix);

        let mut anchors = vec![
            CardAnchor::deal_from(STOCK),
            CardAnchor::deal_to(WASTE, self.deal_size()),
        ];
        anchors.extend(FOUNDATIONS.map(CardAnchor::seq_sink));
        anchors.extend(TABLEAU.map(|i| CardAnchor::generic(i, pile)));
        anchors
    }

    fn deck(&self) -> (usize, SuitCount) {
        (1, SuitCount::Four)
    }

    fn deal(&mut self, table: &mut Table, deck: &mut Deck) {
        for (n, pile) in TABLEAU.enumerate() {
            for _ in 0..=n {
                if let Some(card) = deck.pop_card() {
                    table.anchor_mut(pile).add_card(card);
                }
            }
            table.anchor_mut(pile).set_hidden_count(n);
        }
        fill_stock(table, STOCK, deck);

        if self.vegas {
            self.deals_remaining = self.vegas_redeals();
        } else {
            self.deals_remaining = NORMAL_STYLE;
        }
    }

    fn accepts_rules_extra(&self, extra: i32) -> bool {
        extra == NORMAL_STYLE || (0..=self.vegas_redeals()).contains(&extra)
    }

    fn restore(&mut self, table: &Table, extra: i32, score: i32) {
        self.deals_remaining = extra;
        self.vegas = self.is_vegas();
        if self.is_vegas() {
            self.carry_over_score = score - Klondike::foundation_score(table);
        }
    }

    fn process(&mut self, event: Event, table: &mut Table) {
        match event {
            Event::Deal => self.turn_stock(table),
            Event::StackAdd(anchor) => foundation_grew(table, FOUNDATIONS, anchor),
            Event::Fling { anchor, card } => process_fling(table, anchor, card, FOUNDATIONS),
            Event::SmartMove => smart_move(table, TABLEAU, FOUNDATIONS),
            Event::DealNext(_) => {}
        }
    }

    fn foundations(&self) -> RangeInclusive<usize> {
        FOUNDATIONS
    }

    fn rules_extra(&self) -> i32 {
        self.deals_remaining
    }

    fn add_deal_count(&mut self) {
        if self.is_vegas() {
            self.deals_remaining += 1;
        }
    }

    fn set_carry_over_score(&mut self, score: i32) {
        self.carry_over_score = score;
    }

    fn has_score(&self) -> bool {
        self.is_vegas()
    }

    fn score(&self, table: &Table) -> i32 {
        if !self.is_vegas() {
            return 0;
        }
        self.carry_over_score + Klondike::foundation_score(table)
    }

    fn status(&self, table: &Table) -> Option<String> {
        if !self.is_vegas() {
            return None;
        }
        let score = self.score(table);
        Some(if score < 0 {
            format!("-${}", -score)
        } else {
            format!("${score}")
        })
    }

    fn game_type(&self) -> &'static str {
        match (self.vegas, self.deal_three) {
            (false, true) => "SolitaireNormalDeal3",
            (false, false) => "SolitaireNormalDeal1",
            (true, true) => "SolitaireVegasDeal3",
            (true, false) => "SolitaireVegasDeal1",
        }
    }

    fn pretty_game_type(&self) -> &'static str {
        match (self.vegas, self.deal_three) {
            (false, true) => "Solitaire Dealing Three Cards",
            (false, false) => "Solitaire Dealing One Card",
            (true, true) => "Vegas Solitaire Dealing Three Cards",
            (true, false) => "Vegas Solitaire Dealing One Card",
        }
    }

    fn is_stock_done(&self, table: &Table) -> bool {
        self.deals_remaining == 0 && table.anchor(STOCK).is_empty()
    }
}

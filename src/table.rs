//! The shared board state every variant operates on.

use std::collections::HashMap;
use std::mem;

use log::{debug, info, warn};

use crate::anchor::CardAnchor;
use crate::cards::Card;
use crate::event::{Event, EventPoster};
use crate::moves::{Move, MoveHistory};
use crate::rules::AutoMove;

/// Cards on their way to a pile. The move that put them here is already in
/// the history; landing only adds them to `to`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub cards: Vec<Card>,
    pub to: usize,
    /// Pile whose top card is revealed once the cards land.
    pub reveal: Option<usize>,
}

pub struct Table {
    anchors: Vec<CardAnchor>,
    history: MoveHistory,
    events: EventPoster,
    ignore_events: bool,
    auto_move: AutoMove,
    was_fling: bool,
    in_flight: Option<Transfer>,
    won: bool,
}

impl Table {
    pub fn new(anchors: Vec<CardAnchor>, auto_move: AutoMove) -> Table {
        debug_assert!(anchors.iter().enumerate().all(|(i, a)| a.number() == i));
        Table {
            anchors,
            history: MoveHistory::new(),
            events: EventPoster::new(),
            ignore_events: false,
            auto_move,
            was_fling: false,
            in_flight: None,
            won: false,
        }
    }

    pub fn anchors(&self) -> &[CardAnchor] {
        &self.anchors
    }

    pub fn anchor(&self, index: usize) -> &CardAnchor {
        &self.anchors[index]
    }

    pub fn anchor_mut(&mut self, index: usize) -> &mut CardAnchor {
        &mut self.anchors[index]
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut MoveHistory {
        &mut self.history
    }

    pub fn push_move(&mut self, mv: Move) {
        self.history.push(mv);
    }

    pub fn ignores_events(&self) -> bool {
        self.ignore_events
    }

    /// Returns the previous setting so callers can restore it.
    pub fn set_ignore_events(&mut self, ignore: bool) -> bool {
        mem::replace(&mut self.ignore_events, ignore)
    }

    pub fn auto_move(&self) -> AutoMove {
        self.auto_move
    }

    pub fn set_auto_move(&mut self, auto_move: AutoMove) {
        self.auto_move = auto_move;
        self.was_fling = false;
    }

    pub fn was_fling(&self) -> bool {
        self.was_fling
    }

    pub fn set_was_fling(&mut self, was_fling: bool) {
        self.was_fling = was_fling;
    }

    /// Adds `card` to a pile and raises a stack-add event if that pile
    /// reports growth.
    pub fn add_card(&mut self, index: usize, card: Card) {
        self.anchors[index].add_card(card);
        if self.anchors[index].fires_stack_add() {
            self.alert(Event::StackAdd(index));
        }
    }

    /// Posts `event` for later processing. A swallowed or displaced event
    /// that carries a card puts the card back where it came from.
    pub fn alert(&mut self, event: Event) {
        if self.ignore_events {
            self.return_carried_card(event);
            return;
        }
        if let Some(evicted) = self.events.post(event) {
            debug!("{evicted:?} replaced by {event:?}");
            if evicted.carried_card().is_some() {
                warn!("dropped {evicted:?} before it was handled");
            }
            self.return_carried_card(evicted);
        }
    }

    fn return_carried_card(&mut self, event: Event) {
        if let Some((index, card)) = event.carried_card() {
            self.anchors[index].add_card(card);
        }
    }

    /// Next event to process, or `None` while events are ignored.
    pub fn take_event(&mut self) -> Option<Event> {
        if self.ignore_events {
            return None;
        }
        self.events.take()
    }

    pub fn has_event(&self) -> bool {
        self.events.has_event()
    }

    pub fn clear_events(&mut self) {
        if let Some(event) = self.events.clear() {
            self.return_carried_card(event);
        }
    }

    /// Sends cards on their way. A transfer still in flight lands first.
    pub fn start_transfer(&mut self, cards: Vec<Card>, to: usize, reveal: Option<usize>) {
        self.land_transfer();
        debug!("transfer {} card(s) to {to}", cards.len());
        self.in_flight = Some(Transfer { cards, to, reveal });
    }

    /// Completes the pending transfer, if any.
    pub fn land_transfer(&mut self) -> bool {
        let Some(transfer) = self.in_flight.take() else {
            return false;
        };
        debug!("landed {} card(s) on {}", transfer.cards.len(), transfer.to);
        for card in transfer.cards {
            self.add_card(transfer.to, card);
        }
        if let Some(index) = transfer.reveal {
            self.anchors[index].unhide_top_card();
        }
        true
    }

    pub fn in_flight(&self) -> Option<&Transfer> {
        self.in_flight.as_ref()
    }

    pub fn signal_win(&mut self) {
        if !self.won {
            info!("game won after {} moves", self.history.len());
        }
        self.won = true;
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    pub fn clear_won(&mut self) {
        self.won = false;
    }

    /// Pops the latest move and puts its cards back exactly as they were.
    /// No events fire while doing so.
    pub fn undo(&mut self) -> Option<Move> {
        let mv = self.history.pop()?;
        debug!("undo {mv:?}");
        let was_ignoring = self.set_ignore_events(true);

        let mut displaced = Vec::with_capacity(mv.count() * (mv.to_end() - mv.to_begin() + 1));
        for to in mv.targets() {
            for _ in 0..mv.count() {
                displaced.push(self.anchors[to].pop_card());
            }
        }

        let from = &mut self.anchors[mv.from()];
        if mv.unhide() {
            let hidden = from.hidden_count() + 1;
            from.set_hidden_count(hidden);
        }
        if mv.invert() {
            displaced.into_iter().for_each(|card| from.add_card(card));
        } else {
            displaced.into_iter().rev().for_each(|card| from.add_card(card));
        }

        self.set_ignore_events(was_ignoring);
        Some(mv)
    }

    /// Count of every card on the table, in flight, or riding a pending
    /// event.
    pub fn census(&self) -> HashMap<Card, usize> {
        let mut counts = HashMap::new();
        let on_table = self.anchors.iter().flat_map(|a| a.cards().iter().copied());
        let moving = self.in_flight.iter().flat_map(|t| t.cards.iter().copied());
        let pending = self
            .events
            .peek()
            .and_then(|e| e.carried_card())
            .map(|(_, card)| card);
        for card in on_table.chain(moving).chain(pending) {
            *counts.entry(card).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::policy::{Pack, PilePolicy, Sequence, SuitRule};
    use crate::cards::Suit;

    fn c(rank: u8, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    fn table() -> Table {
        let pile = PilePolicy::default()
            .seq(Sequence::Descending)
            .suit(SuitRule::AlternatingColor)
            .behavior(Pack::Multi);
        Table::new(
            vec![
                CardAnchor::generic(0, pile),
                CardAnchor::generic(1, pile),
                CardAnchor::seq_sink(2),
                CardAnchor::deal_from(3),
            ],
            AutoMove::Always,
        )
    }

    #[test]
    fn sink_growth_raises_stack_add() {
        let mut table = table();
        table.add_card(0, c(5, Suit::Clubs));
        assert!(!table.has_event());
        table.add_card(2, c(1, Suit::Clubs));
        assert_eq!(table.take_event(), Some(Event::StackAdd(2)));
    }

    #[test]
    fn ignored_events_are_swallowed() {
        let mut table = table();
        table.set_ignore_events(true);
        table.add_card(2, c(1, Suit::Clubs));
        assert!(!table.has_event());
        let card = c(1, Suit::Hearts);
        table.alert(Event::Fling { anchor: 1, card });
        assert_eq!(table.anchor(1).top(), Some(&card));
    }

    #[test]
    fn displaced_fling_returns_its_card() {
        let mut table = table();
        let card = c(1, Suit::Hearts);
        table.alert(Event::Fling { anchor: 0, card });
        assert!(table.anchor(0).is_empty());
        assert_eq!(table.census().get(&card), Some(&1));
        table.alert(Event::SmartMove);
        assert_eq!(table.anchor(0).top(), Some(&card));
        assert_eq!(table.take_event(), Some(Event::SmartMove));
    }

    #[test]
    fn undo_plain_move_restores_order_and_hidden() {
        let mut table = table();
        for card in [c(9, Suit::Clubs), c(8, Suit::Hearts), c(7, Suit::Spades)] {
            table.anchor_mut(0).add_card(card);
        }
        table.anchor_mut(0).set_hidden_count(1);
        let before = table.anchor(0).clone();

        let run = table.anchor_mut(0).take_top(2);
        let unhide = table.anchor_mut(0).unhide_top_card();
        assert!(unhide);
        table.push_move(Move::new(0, 1, 2, false, unhide));
        for card in run {
            table.add_card(1, card);
        }

        assert!(table.undo().is_some());
        assert_eq!(table.anchor(0), &before);
        assert!(table.anchor(1).is_empty());
        assert!(table.history().is_empty());
    }

    #[test]
    fn undo_inverted_move_restores_stock_order() {
        let mut table = table();
        for rank in 1..=5 {
            table.anchor_mut(3).add_card(c(rank, Suit::Spades));
        }
        let before = table.anchor(3).clone();
        for _ in 0..3 {
            let card = table.anchor_mut(3).pop_card();
            table.add_card(1, card);
        }
        table.push_move(Move::new(3, 1, 3, true, false));
        table.undo();
        assert_eq!(table.anchor(3), &before);
    }

    #[test]
    fn undo_range_move_refills_source() {
        let mut table = table();
        for rank in [4, 6, 9] {
            table.anchor_mut(3).add_card(c(rank, Suit::Diamonds));
        }
        let before = table.anchor(3).clone();
        for to in 0..2 {
            let card = table.anchor_mut(3).pop_card();
            table.anchor_mut(to).add_card(card);
        }
        table.push_move(Move::range(3, 0, 1, 1));
        table.undo();
        assert_eq!(table.anchor(3), &before);
        assert!(table.anchor(0).is_empty() && table.anchor(1).is_empty());
    }

    #[test]
    fn transfer_lands_and_fires() {
        let mut table = table();
        table.start_transfer(vec![c(1, Suit::Hearts)], 2, None);
        assert!(table.in_flight().is_some());
        assert_eq!(table.census().values().sum::<usize>(), 1);
        assert!(table.land_transfer());
        assert!(!table.land_transfer());
        assert_eq!(table.anchor(2).count(), 1);
        assert_eq!(table.take_event(), Some(Event::StackAdd(2)));
    }

    #[test]
    fn new_transfer_lands_the_previous_one() {
        let mut table = table();
        table.start_transfer(vec![c(3, Suit::Clubs)], 0, None);
        table.start_transfer(vec![c(4, Suit::Clubs)], 1, None);
        assert_eq!(table.anchor(0).count(), 1);
        assert_eq!(table.in_flight().map(|t| t.to), Some(1));
    }
}

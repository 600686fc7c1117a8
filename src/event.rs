//! Deferred rule reactions.

use std::fmt;

use circular_buffer::CircularBuffer;

use crate::cards::Card;

/// Something the rules react to once the current operation has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The player asked for a deal.
    Deal,
    /// A card landed on a pile that reports growth.
    StackAdd(usize),
    /// A single card was flung from `anchor` towards the foundations. The
    /// card travels with the event and is off the table meanwhile.
    Fling { anchor: usize, card: Card },
    /// Sink one more card if any pile can.
    SmartMove,
    /// Continue a pile-by-pile deal at this anchor.
    DealNext(usize),
}

impl Event {
    /// The card this event holds off the table, with the anchor it came from.
    pub fn carried_card(&self) -> Option<(usize, Card)> {
        match *self {
            Event::Fling { anchor, card } => Some((anchor, card)),
            _ => None,
        }
    }
}

/// Single pending-event slot. Posting over an unhandled event replaces it:
/// the rules only ever need one follow-up at a time.
pub struct EventPoster {
    slot: CircularBuffer<1, Event>,
}

impl Default for EventPoster {
    fn default() -> Self {
        EventPoster {
            slot: CircularBuffer::new(),
        }
    }
}

impl fmt::Debug for EventPoster {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventPoster")
            .field("pending", &self.slot.front())
            .finish()
    }
}

impl EventPoster {
    pub fn new() -> EventPoster {
        EventPoster::default()
    }

    /// Stores `event`, returning the event it replaced, if any.
    pub fn post(&mut self, event: Event) -> Option<Event> {
        let evicted = if self.slot.is_full() {
            self.slot.pop_front()
        } else {
            None
        };
        self.slot.push_back(event);
        evicted
    }

    /// Reads and clears the slot in one step, so a handler may post again.
    pub fn take(&mut self) -> Option<Event> {
        self.slot.pop_front()
    }

    pub fn peek(&self) -> Option<&Event> {
        self.slot.front()
    }

    pub fn has_event(&self) -> bool {
        !self.slot.is_empty()
    }

    pub fn clear(&mut self) -> Option<Event> {
        self.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Suit;

    #[test]
    fn last_post_wins() {
        let mut poster = EventPoster::new();
        assert_eq!(poster.post(Event::StackAdd(3)), None);
        assert_eq!(poster.post(Event::SmartMove), Some(Event::StackAdd(3)));
        assert!(poster.has_event());
        assert_eq!(poster.take(), Some(Event::SmartMove));
        assert!(!poster.has_event());
        assert_eq!(poster.take(), None);
    }

    #[test]
    fn handler_may_repost_after_take() {
        let mut poster = EventPoster::new();
        poster.post(Event::DealNext(1));
        let handled = poster.take();
        assert_eq!(handled, Some(Event::DealNext(1)));
        assert_eq!(poster.post(Event::DealNext(2)), None);
        assert_eq!(poster.take(), Some(Event::DealNext(2)));
    }

    #[test]
    fn only_flings_carry_cards() {
        let card = Card::new(1, Suit::Spades);
        assert_eq!(Event::Fling { anchor: 7, card }.carried_card(), Some((7, card)));
        assert_eq!(Event::Deal.carried_card(), None);
        assert_eq!(Event::StackAdd(2).carried_card(), None);
    }
}

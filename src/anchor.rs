//! Piles of cards ("anchors") and their legality predicates.

pub mod policy;

use crate::cards::Card;

use self::policy::PilePolicy;

/// Most cards a single pile can ever hold (two full decks).
pub const MAX_CARDS: usize = 104;

/// The structurally distinct pile types. Everything configurable lives in
/// [`PilePolicy`] under `Generic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    /// Face-down stock. Cannot be picked up; tapping it requests a deal.
    DealFrom,
    /// Face-up waste showing its last `showing` cards fanned.
    DealTo { showing: usize },
    /// Foundation: same suit, Ace upwards, one card at a time.
    SeqSink,
    /// Freecell holding cell for a single card.
    FreecellHold,
    Generic(PilePolicy),
}

/// One pile: cards bottom to top, the bottom `hidden` of them face down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardAnchor {
    number: usize,
    kind: AnchorKind,
    cards: Vec<Card>,
    hidden: usize,
}

impl CardAnchor {
    pub fn new(number: usize, kind: AnchorKind) -> CardAnchor {
        CardAnchor {
            number,
            kind,
            cards: Vec::new(),
            hidden: 0,
        }
    }

    pub fn deal_from(number: usize) -> CardAnchor {
        CardAnchor::new(number, AnchorKind::DealFrom)
    }

    pub fn deal_to(number: usize, showing: usize) -> CardAnchor {
        CardAnchor::new(number, AnchorKind::DealTo { showing })
    }

    pub fn seq_sink(number: usize) -> CardAnchor {
        CardAnchor::new(number, AnchorKind::SeqSink)
    }

    pub fn freecell_hold(number: usize) -> CardAnchor {
        CardAnchor::new(number, AnchorKind::FreecellHold)
    }

    pub fn generic(number: usize, policy: PilePolicy) -> CardAnchor {
        CardAnchor::new(number, AnchorKind::Generic(policy))
    }

    /// Index of this pile in its variant's anchor array.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn kind(&self) -> AnchorKind {
        self.kind
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn count(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn hidden_count(&self) -> usize {
        self.hidden
    }

    pub fn visible_count(&self) -> usize {
        self.cards.len() - self.hidden
    }

    pub fn top(&self) -> Option<&Card> {
        self.cards.last()
    }

    pub fn set_hidden_count(&mut self, count: usize) {
        assert!(
            count <= self.cards.len(),
            "anchor {}: hidden count {count} exceeds {} cards",
            self.number,
            self.cards.len()
        );
        self.hidden = count;
    }

    /// Pushes `card` on top without any legality check.
    pub fn add_card(&mut self, card: Card) {
        assert!(self.cards.len() < MAX_CARDS, "anchor {} overflowed", self.number);
        self.cards.push(card);
    }

    /// Removes the top card. Popping an empty pile is a caller bug.
    pub fn pop_card(&mut self) -> Card {
        let card = self
            .cards
            .pop()
            .unwrap_or_else(|| panic!("pop from empty anchor {}", self.number));
        self.hidden = self.hidden.min(self.cards.len());
        card
    }

    /// Pops the top card when this pile lets cards be picked up directly.
    pub fn try_take_top(&mut self) -> Option<Card> {
        match self.kind {
            AnchorKind::DealFrom => None,
            _ if self.visible_count() == 0 => None,
            _ => self.cards.pop(),
        }
    }

    /// Pops the top `count` cards, returned bottom first.
    pub fn take_top(&mut self, count: usize) -> Vec<Card> {
        assert!(
            count <= self.visible_count(),
            "anchor {}: cannot take {count} of {} visible cards",
            self.number,
            self.visible_count()
        );
        self.cards.split_off(self.cards.len() - count)
    }

    /// Cards from the top that may be lifted together.
    pub fn movable_count(&self, free_spaces: usize) -> usize {
        match self.kind {
            AnchorKind::DealFrom => 0,
            AnchorKind::Generic(policy) => {
                policy.movable_run(&self.cards[self.hidden..], free_spaces)
            }
            _ => self.visible_count().min(1),
        }
    }

    /// Pops exactly [`CardAnchor::movable_count`] cards, bottom of the run
    /// first.
    pub fn take_card_stack(&mut self, free_spaces: usize) -> Vec<Card> {
        let count = self.movable_count(free_spaces);
        self.take_top(count)
    }

    /// Whether the held run (bottom card first) may be dropped here.
    pub fn can_drop(&self, held: &[Card], free_spaces: usize) -> bool {
        let Some(bottom) = held.first() else {
            return false;
        };
        match self.kind {
            AnchorKind::DealFrom | AnchorKind::DealTo { .. } => false,
            AnchorKind::SeqSink => held.len() == 1 && self.drop_single_card(bottom),
            AnchorKind::FreecellHold => self.cards.is_empty() && held.len() == 1,
            AnchorKind::Generic(policy) => {
                policy.accepts_count(held.len(), self.cards.is_empty(), free_spaces)
                    && policy.can_build(self.top(), bottom)
            }
        }
    }

    /// Whether a single card may be auto-sunk here. Only foundations say yes.
    pub fn drop_single_card(&self, card: &Card) -> bool {
        if self.kind != AnchorKind::SeqSink {
            return false;
        }
        match self.top() {
            None => card.is_ace(),
            Some(top) => card.suit == top.suit && card.rank == top.rank + 1,
        }
    }

    /// Reveals one card once every remaining card is hidden.
    pub fn unhide_top_card(&mut self) -> bool {
        if matches!(self.kind, AnchorKind::DealTo { .. }) {
            return false;
        }
        if !self.cards.is_empty() && self.hidden > 0 && self.hidden == self.cards.len() {
            self.hidden -= 1;
            return true;
        }
        false
    }

    /// Whether adding a card here raises a stack-add event.
    pub fn fires_stack_add(&self) -> bool {
        match self.kind {
            AnchorKind::SeqSink => true,
            AnchorKind::Generic(policy) => policy.deal_hack,
            _ => false,
        }
    }

    pub fn is_face_up(&self, index: usize) -> bool {
        match self.kind {
            AnchorKind::DealFrom => false,
            AnchorKind::Generic(policy) => policy.face_up(index, self.cards.len(), self.hidden),
            _ => index >= self.hidden,
        }
    }

    /// The cards a drawing layer shows: the fanned tail of a waste pile,
    /// the top card of single-card piles, the whole pile otherwise.
    pub fn fanned(&self) -> &[Card] {
        let shown = match self.kind {
            AnchorKind::DealTo { showing } => showing,
            AnchorKind::Generic(_) => self.cards.len(),
            _ => 1,
        };
        &self.cards[self.cards.len().saturating_sub(shown)..]
    }
}

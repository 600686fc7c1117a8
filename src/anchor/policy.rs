//! Declarative pile behaviour for [`AnchorKind::Generic`](super::AnchorKind).
//!
//! A policy is nine independent axes chosen when a variant lays out its
//! table. The interpreters here are pure: they see cards and counts, never
//! the pile itself.

use crate::cards::{Card, Suit, ACE, KING};

/// What an empty pile may accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartRule {
    Any,
    KingOnly,
}

/// Rank relation between a card and the card it sits on.
///
/// Directions read bottom to top: `Descending` means every card is one
/// rank below the card beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    Any,
    /// Either direction, decided separately for every pair.
    Either,
    Ascending,
    Descending,
}

/// Suit relation between a card and the card it sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuitRule {
    Any,
    AlternatingColor,
    DifferentSuit,
    SameColor,
    SameSuit,
}

/// Pickup and dropoff packing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pack {
    /// No interaction allowed.
    None,
    One,
    Multi,
    Fixed,
    /// Run length bounded by the free spaces on the table.
    LimitByFreeCells,
}

/// Which cards are drawn face up. Rendering hint only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    All,
    Hide,
    /// Hidden prefix face down, the rest face up.
    Mix,
    /// Only the top card face up.
    One,
}

fn follows(next: u8, prev: u8, wrap: bool) -> bool {
    next == prev + 1 || (wrap && prev == KING && next == ACE)
}

impl Sequence {
    /// Whether `upper` may sit directly on `lower`.
    pub fn permits(self, lower: u8, upper: u8, wrap: bool) -> bool {
        match self {
            Sequence::Any => true,
            Sequence::Ascending => follows(upper, lower, wrap),
            Sequence::Descending => follows(lower, upper, wrap),
            Sequence::Either => follows(upper, lower, wrap) || follows(lower, upper, wrap),
        }
    }
}

impl SuitRule {
    pub fn permits(self, lower: Suit, upper: Suit) -> bool {
        match self {
            SuitRule::Any => true,
            SuitRule::AlternatingColor => lower.is_opposite_color(upper),
            SuitRule::DifferentSuit => lower != upper,
            SuitRule::SameColor => !lower.is_opposite_color(upper),
            SuitRule::SameSuit => lower == upper,
        }
    }
}

/// Full configuration of a generic pile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PilePolicy {
    pub start: StartRule,
    pub build_seq: Sequence,
    pub build_suit: SuitRule,
    pub build_wrap: bool,
    pub move_seq: Sequence,
    pub move_suit: SuitRule,
    pub move_wrap: bool,
    pub pickup: Pack,
    pub dropoff: Pack,
    pub display: Display,
    /// Every card added raises a stack-add event, dealt cards included.
    pub deal_hack: bool,
}

impl Default for PilePolicy {
    fn default() -> Self {
        PilePolicy {
            start: StartRule::Any,
            build_seq: Sequence::Any,
            build_suit: SuitRule::Any,
            build_wrap: false,
            move_seq: Sequence::Any,
            move_suit: SuitRule::Any,
            move_wrap: false,
            pickup: Pack::None,
            dropoff: Pack::None,
            display: Display::All,
            deal_hack: false,
        }
    }
}

impl PilePolicy {
    pub fn start(mut self, start: StartRule) -> Self {
        self.start = start;
        self
    }

    /// Sets the build and move sequence together.
    pub fn seq(mut self, seq: Sequence) -> Self {
        self.build_seq = seq;
        self.move_seq = seq;
        self
    }

    pub fn build_seq(mut self, seq: Sequence) -> Self {
        self.build_seq = seq;
        self
    }

    pub fn move_seq(mut self, seq: Sequence) -> Self {
        self.move_seq = seq;
        self
    }

    /// Sets the build and move suit rule together.
    pub fn suit(mut self, suit: SuitRule) -> Self {
        self.build_suit = suit;
        self.move_suit = suit;
        self
    }

    pub fn build_suit(mut self, suit: SuitRule) -> Self {
        self.build_suit = suit;
        self
    }

    pub fn move_suit(mut self, suit: SuitRule) -> Self {
        self.move_suit = suit;
        self
    }

    pub fn wrap(mut self, wrap: bool) -> Self {
        self.build_wrap = wrap;
        self.move_wrap = wrap;
        self
    }

    /// Sets pickup and dropoff together.
    pub fn behavior(mut self, pack: Pack) -> Self {
        self.pickup = pack;
        self.dropoff = pack;
        self
    }

    pub fn pickup(mut self, pack: Pack) -> Self {
        self.pickup = pack;
        self
    }

    pub fn dropoff(mut self, pack: Pack) -> Self {
        self.dropoff = pack;
        self
    }

    pub fn display(mut self, display: Display) -> Self {
        self.display = display;
        self
    }

    pub fn deal_hack(mut self, hack: bool) -> Self {
        self.deal_hack = hack;
        self
    }

    /// Whether `incoming` may be built on `top`. An empty pile only
    /// consults the start rule.
    pub fn can_build(&self, top: Option<&Card>, incoming: &Card) -> bool {
        let Some(top) = top else {
            return match self.start {
                StartRule::Any => true,
                StartRule::KingOnly => incoming.is_king(),
            };
        };
        self.build_seq.permits(top.rank, incoming.rank, self.build_wrap)
            && self.build_suit.permits(top.suit, incoming.suit)
    }

    /// Length of the liftable run at the top of `visible`, after pickup
    /// clamping.
    pub fn movable_run(&self, visible: &[Card], free_spaces: usize) -> usize {
        if visible.is_empty() || self.pickup == Pack::None {
            return 0;
        }
        let run = 1 + visible
            .windows(2)
            .rev()
            .take_while(|pair| {
                self.move_seq.permits(pair[0].rank, pair[1].rank, self.move_wrap)
                    && self.move_suit.permits(pair[0].suit, pair[1].suit)
            })
            .count();
        match self.pickup {
            Pack::None => 0,
            Pack::One => run.min(1),
            Pack::Multi | Pack::Fixed => run,
            Pack::LimitByFreeCells => run.min(free_spaces + 1),
        }
    }

    /// Dropoff gate, consulted before [`PilePolicy::can_build`].
    pub fn accepts_count(&self, count: usize, target_empty: bool, free_spaces: usize) -> bool {
        match self.dropoff {
            Pack::None => false,
            Pack::One => count == 1,
            Pack::Multi | Pack::Fixed => count > 0,
            // an empty target is itself one of the free spaces
            Pack::LimitByFreeCells => count > 0 && (!target_empty || count <= free_spaces),
        }
    }

    pub fn face_up(&self, index: usize, len: usize, hidden: usize) -> bool {
        match self.display {
            Display::All => true,
            Display::Hide => false,
            Display::Mix => index >= hidden,
            Display::One => index + 1 == len,
        }
    }
}

//! Utilities for creating cards and decks

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const RANKS: u8 = 13;
pub const ACE: u8 = 1;
pub const QUEEN: u8 = 12;
pub const KING: u8 = 13;

/// Card suits. The discriminants are persisted in snapshots and the
/// colour test relies on their parity: even suits are black, odd are red.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Suit {
    Clubs = 0,
    Diamonds = 1,
    Spades = 2,
    Hearts = 3,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Spades, Suit::Hearts];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Option<Suit> {
        Suit::ALL.get(index as usize).copied()
    }

    pub fn is_red(self) -> bool {
        self.index() & 1 == 1
    }

    /// True when the two suits are of opposite colour.
    pub fn is_opposite_color(self, other: Suit) -> bool {
        self.index().abs_diff(other.index()) % 2 == 1
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Suit::Clubs => "♣",
            Suit::Diamonds => "♦",
            Suit::Spades => "♠",
            Suit::Hearts => "♥",
        }
    }
}

/// A playing card with a rank and a suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    /// The rank of the card, from 1 (Ace) to 13 (King).
    pub rank: u8,

    pub suit: Suit,
}

impl Card {
    pub fn new(rank: u8, suit: Suit) -> Card {
        debug_assert!((ACE..=KING).contains(&rank), "rank {rank} out of range");
        Card { rank, suit }
    }

    pub fn is_ace(&self) -> bool {
        self.rank == ACE
    }

    pub fn is_king(&self) -> bool {
        self.rank == KING
    }

    pub fn rank_str(&self) -> &'static str {
        const RANK_STRINGS: [&str; RANKS as usize + 1] =
            ["?", "A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K"];
        RANK_STRINGS.get(self.rank as usize).copied().unwrap_or("?")
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank_str(), self.suit.symbol())
    }
}

/// How many distinct suits a deck is built from. Fewer suits are made up
/// for with more copies, so the card total stays the same.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SuitCount {
    One,
    Two,
    #[default]
    Four,
}

impl SuitCount {
    pub fn suits(self) -> u8 {
        match self {
            SuitCount::One => 1,
            SuitCount::Two => 2,
            SuitCount::Four => 4,
        }
    }

    /// Copies of each restricted-suit deck needed to reach full deck size.
    fn multiplier(self) -> usize {
        4 / self.suits() as usize
    }
}

/// Creates the unshuffled cards of `decks` standard decks restricted to
/// `suit_count` suits.
///
/// # Returns
///
/// `decks * 52` cards, ordered deck by deck, suit by suit, Ace to King.
pub fn new_standard_deck(decks: usize, suit_count: SuitCount) -> Vec<Card> {
    let copies = decks * suit_count.multiplier();
    let suits = &Suit::ALL[..suit_count.suits() as usize];
    (0..copies)
        .flat_map(|_| suits.iter())
        .flat_map(|&suit| (ACE..=KING).map(move |rank| Card { rank, suit }))
        .collect()
}

/// A shuffled deck consumed from the back by [`Deck::pop_card`].
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn new<R: Rng + ?Sized>(decks: usize, suit_count: SuitCount, rng: &mut R) -> Deck {
        let mut cards = new_standard_deck(decks, suit_count);
        cards.shuffle(rng);
        Deck { cards }
    }

    pub fn pop_card(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }
}

//! Versioned save state of one game session.

use anyhow::{bail, ensure, Context};
use serde::{Deserialize, Serialize};

use crate::anchor::MAX_CARDS;
use crate::cards::{Card, Suit, ACE, KING};
use crate::moves::{Move, FLAG_UNHIDE};
use crate::rules::{GameKind, Rules};
use crate::table::Table;

pub const SAVE_VERSION: u32 = 1;

/// Pile contents as parallel arrays, and the move history top of stack
/// first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub game: GameKind,
    pub game_type: String,
    pub anchor_count: usize,
    pub card_count: usize,
    pub anchor_card_count: Vec<usize>,
    pub anchor_hidden_count: Vec<usize>,
    pub value: Vec<u8>,
    pub suit: Vec<u8>,
    pub rules_extra: i32,
    pub score: i32,
    pub elapsed_ms: u64,
    pub move_from: Vec<usize>,
    pub move_to_begin: Vec<usize>,
    pub move_to_end: Vec<usize>,
    pub move_count: Vec<usize>,
    pub move_flags: Vec<u8>,
}

impl Snapshot {
    /// Records a settled table: nothing in flight, nothing held.
    pub fn capture(rules: &dyn Rules, table: &Table, elapsed_ms: u64) -> Snapshot {
        let anchors = table.anchors();
        let cards: Vec<&Card> = anchors.iter().flat_map(|a| a.cards()).collect();
        let moves: Vec<&Move> = table.history().iter().rev().collect();

        Snapshot {
            version: SAVE_VERSION,
            game: rules.kind(),
            game_type: rules.game_type().to_string(),
            anchor_count: anchors.len(),
            card_count: cards.len(),
            anchor_card_count: anchors.iter().map(|a| a.count()).collect(),
            anchor_hidden_count: anchors.iter().map(|a| a.hidden_count()).collect(),
            value: cards.iter().map(|c| c.rank).collect(),
            suit: cards.iter().map(|c| c.suit.index()).collect(),
            rules_extra: rules.rules_extra(),
            score: rules.score(table),
            elapsed_ms,
            move_from: moves.iter().map(|m| m.from()).collect(),
            move_to_begin: moves.iter().map(|m| m.to_begin()).collect(),
            move_to_end: moves.iter().map(|m| m.to_end()).collect(),
            move_count: moves.iter().map(|m| m.count()).collect(),
            move_flags: moves.iter().map(|m| m.flags()).collect(),
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string(self).context("failed to encode snapshot")
    }

    pub fn from_json(json: &str) -> anyhow::Result<Snapshot> {
        let snapshot: Snapshot = serde_json::from_str(json).context("failed to decode snapshot")?;
        ensure!(
            snapshot.version == SAVE_VERSION,
            "snapshot version {} is not {SAVE_VERSION}",
            snapshot.version
        );
        Ok(snapshot)
    }

    /// Checks the snapshot against the shape a variant expects.
    pub fn validate(
        &self,
        game: GameKind,
        anchor_count: usize,
        card_count: usize,
    ) -> anyhow::Result<()> {
        ensure!(
            self.version == SAVE_VERSION,
            "snapshot version {} is not {SAVE_VERSION}",
            self.version
        );
        ensure!(self.game == game, "snapshot is for {}, not {game}", self.game);
        ensure!(
            self.anchor_count == anchor_count,
            "expected {anchor_count} anchors, found {}",
            self.anchor_count
        );
        ensure!(
            self.card_count == card_count,
            "expected {card_count} cards, found {}",
            self.card_count
        );
        ensure!(
            self.anchor_card_count.len() == anchor_count
                && self.anchor_hidden_count.len() == anchor_count,
            "anchor arrays do not cover {anchor_count} anchors"
        );
        ensure!(
            self.anchor_card_count.iter().sum::<usize>() == card_count,
            "anchor card counts do not add up to {card_count}"
        );
        ensure!(
            self.value.len() == card_count && self.suit.len() == card_count,
            "card arrays do not hold {card_count} cards"
        );
        let counts = self.anchor_card_count.iter().zip(&self.anchor_hidden_count);
        for (i, (&count, &hidden)) in counts.enumerate() {
            ensure!(hidden <= count, "anchor {i} hides {hidden} of {count} cards");
        }

        let moves = self.move_from.len();
        ensure!(
            [&self.move_to_begin, &self.move_to_end, &self.move_count]
                .iter()
                .all(|v| v.len() == moves)
                && self.move_flags.len() == moves,
            "move history arrays differ in length"
        );
        for i in 0..moves {
            let (from, begin, end) =
                (self.move_from[i], self.move_to_begin[i], self.move_to_end[i]);
            ensure!(
                from < anchor_count && begin <= end && end < anchor_count,
                "move {i} ({from} -> {begin}..={end}) is out of range"
            );
        }
        self.check_history()
    }

    /// Walks the history from the top of the stack, undoing each move on
    /// the pile counts alone, so every saved move can really be undone.
    fn check_history(&self) -> anyhow::Result<()> {
        let mut cards = self.anchor_card_count.clone();
        let mut hidden = self.anchor_hidden_count.clone();
        for i in 0..self.move_from.len() {
            let (from, count) = (self.move_from[i], self.move_count[i]);
            for to in self.move_to_begin[i]..=self.move_to_end[i] {
                ensure!(
                    cards[to] >= count,
                    "move {i} takes {count} cards back from anchor {to}, which holds {}",
                    cards[to]
                );
                cards[to] -= count;
                hidden[to] = hidden[to].min(cards[to]);
            }
            if self.move_flags[i] & FLAG_UNHIDE != 0 {
                ensure!(
                    hidden[from] < cards[from],
                    "move {i} hides a card on anchor {from}, which has none showing"
                );
                hidden[from] += 1;
            }
            let targets = self.move_to_end[i] - self.move_to_begin[i] + 1;
            cards[from] += count * targets;
            ensure!(cards[from] <= MAX_CARDS, "move {i} overfills anchor {from}");
        }
        Ok(())
    }

    /// Cards in anchor order, bottom to top.
    pub fn cards(&self) -> anyhow::Result<Vec<Card>> {
        self.value
            .iter()
            .zip(&self.suit)
            .map(|(&rank, &suit)| -> anyhow::Result<Card> {
                if !(ACE..=KING).contains(&rank) {
                    bail!("card rank {rank} out of range");
                }
                let suit = Suit::from_index(suit).with_context(|| format!("unknown suit {suit}"))?;
                Ok(Card::new(rank, suit))
            })
            .collect()
    }

    /// The move history, oldest move first.
    pub fn history(&self) -> Vec<Move> {
        (0..self.move_from.len())
            .rev()
            .map(|i| {
                Move::from_parts(
                    self.move_from[i],
                    self.move_to_begin[i],
                    self.move_to_end[i],
                    self.move_count[i],
                    self.move_flags[i],
                )
            })
            .collect()
    }

    /// Fills empty piles and history from a validated snapshot.
    pub fn apply(&self, table: &mut Table) -> anyhow::Result<()> {
        ensure!(table.anchors().iter().all(|a| a.is_empty()), "table already holds cards");
        let mut cards = self.cards()?.into_iter();
        let counts = self.anchor_card_count.iter().zip(&self.anchor_hidden_count);
        for (i, (&count, &hidden)) in counts.enumerate() {
            let anchor = table.anchor_mut(i);
            for card in cards.by_ref().take(count) {
                anchor.add_card(card);
            }
            anchor.set_hidden_count(hidden);
        }

        table.history_mut().clear();
        for mv in self.history() {
            table.push_move(mv);
        }
        Ok(())
    }
}

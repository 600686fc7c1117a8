use log::{error, info};

use crate::moves::Move;
use crate::table::Table;

/// Plays a finished game back from the deal, one transfer per move.
#[derive(Debug, Default)]
pub struct Replay {
    /// Next move on top.
    pending: Vec<Move>,
    playing: bool,
}

impl Replay {
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Undoes the whole history and starts moving it forward again. Range
    /// moves are split into one card per target pile.
    pub fn start(&mut self, table: &mut Table) {
        self.pending.clear();
        table.set_ignore_events(true);
        while let Some(mv) = table.history().peek().copied() {
            self.pending.extend(mv.flatten().into_iter().rev());
            table.undo();
        }
        info!("replaying {} moves", self.pending.len());
        self.playing = true;
        self.play_next(table);
    }

    /// Lands the current step and starts the next one.
    pub fn step_landed(&mut self, table: &mut Table) {
        table.land_transfer();
        self.play_next(table);
    }

    fn play_next(&mut self, table: &mut Table) {
        let next = if self.playing { self.pending.pop() } else { None };
        let Some(mv) = next else {
            self.finish(table);
            return;
        };
        if mv.is_range() {
            error!("invalid move {mv:?} in replay, aborting");
            self.finish(table);
            return;
        }

        let from = mv.from();
        let mut cards: Vec<_> = (0..mv.count())
            .map(|_| table.anchor_mut(from).pop_card())
            .collect();
        if !mv.invert() {
            cards.reverse();
        }
        table.push_move(mv);
        table.start_transfer(cards, mv.to_begin(), mv.unhide().then_some(from));
    }

    fn finish(&mut self, table: &mut Table) {
        if self.playing {
            info!("replay finished");
        }
        self.playing = false;
        self.pending.clear();
        table.set_ignore_events(false);
    }
}

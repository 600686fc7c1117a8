//! Reversible board transitions and the history they are kept in.

use std::ops::RangeInclusive;

/// Undo re-adds the displaced cards in pop order instead of reversing them.
pub const FLAG_INVERT: u8 = 0x1;
/// Undo hides one more card on the source pile before re-adding.
pub const FLAG_UNHIDE: u8 = 0x2;
/// Undo hands back one redeal to the variant.
pub const FLAG_ADD_DEAL_COUNT: u8 = 0x4;

/// One reversible transition: `count` cards from `from` onto each pile in
/// `to_begin..=to_end`. Only multi-pile deals use a real range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    from: usize,
    to_begin: usize,
    to_end: usize,
    count: usize,
    flags: u8,
}

impl Move {
    pub fn new(from: usize, to: usize, count: usize, invert: bool, unhide: bool) -> Move {
        let mut flags = 0;
        if invert {
            flags |= FLAG_INVERT;
        }
        if unhide {
            flags |= FLAG_UNHIDE;
        }
        Move::from_parts(from, to, to, count, flags)
    }

    /// A move that also consumed one redeal when `add_deal_count` is set.
    pub fn redeal(from: usize, to: usize, count: usize, add_deal_count: bool) -> Move {
        let mut mv = Move::new(from, to, count, true, false);
        if add_deal_count {
            mv.flags |= FLAG_ADD_DEAL_COUNT;
        }
        mv
    }

    /// `count` cards to every pile from `to_begin` through `to_end`.
    pub fn range(from: usize, to_begin: usize, to_end: usize, count: usize) -> Move {
        Move::from_parts(from, to_begin, to_end, count, 0)
    }

    pub fn from_parts(
        from: usize,
        to_begin: usize,
        to_end: usize,
        count: usize,
        flags: u8,
    ) -> Move {
        assert!(to_begin <= to_end, "move range {to_begin}..={to_end} is reversed");
        Move {
            from,
            to_begin,
            to_end,
            count,
            flags,
        }
    }

    pub fn from(&self) -> usize {
        self.from
    }

    pub fn to_begin(&self) -> usize {
        self.to_begin
    }

    pub fn to_end(&self) -> usize {
        self.to_end
    }

    pub fn targets(&self) -> RangeInclusive<usize> {
        self.to_begin..=self.to_end
    }

    pub fn is_range(&self) -> bool {
        self.to_begin != self.to_end
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn invert(&self) -> bool {
        self.flags & FLAG_INVERT != 0
    }

    pub fn unhide(&self) -> bool {
        self.flags & FLAG_UNHIDE != 0
    }

    pub fn add_deal_count(&self) -> bool {
        self.flags & FLAG_ADD_DEAL_COUNT != 0
    }

    /// Splits a range move into one plain single-card move per target,
    /// in the order the cards were dealt.
    pub fn flatten(&self) -> Vec<Move> {
        if !self.is_range() {
            return vec![*self];
        }
        self.targets()
            .map(|to| Move::new(self.from, to, 1, false, false))
            .collect()
    }
}

/// LIFO of applied moves. Unbounded so a whole game can be undone and
/// replayed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveHistory {
    moves: Vec<Move>,
}

impl MoveHistory {
    pub fn new() -> MoveHistory {
        MoveHistory::default()
    }

    pub fn push(&mut self, mv: Move) {
        log::debug!("push {mv:?}");
        self.moves.push(mv);
    }

    pub fn pop(&mut self) -> Option<Move> {
        self.moves.pop()
    }

    pub fn peek(&self) -> Option<&Move> {
        self.moves.last()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }

    /// Oldest move first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Move> {
        self.moves.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_are_independent_bits() {
        let mv = Move::new(6, 2, 1, false, true);
        assert!(!mv.invert() && mv.unhide() && !mv.add_deal_count());
        assert_eq!(mv.flags(), FLAG_UNHIDE);

        let restock = Move::redeal(1, 0, 20, true);
        assert!(restock.invert() && !restock.unhide() && restock.add_deal_count());
        assert_eq!(restock.flags(), FLAG_INVERT | FLAG_ADD_DEAL_COUNT);

        assert!(!Move::redeal(1, 0, 20, false).add_deal_count());
    }

    #[test]
    fn range_flattens_in_deal_order() {
        let deal = Move::range(10, 0, 3, 1);
        assert!(deal.is_range());
        let steps = deal.flatten();
        assert_eq!(steps.len(), 4);
        assert_eq!(steps.iter().map(Move::to_begin).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert!(steps.iter().all(|m| m.from() == 10 && m.count() == 1 && m.flags() == 0));

        let single = Move::new(3, 4, 2, true, false);
        assert_eq!(single.flatten(), vec![single]);
    }

    #[test]
    #[should_panic(expected = "reversed")]
    fn reversed_range_is_rejected() {
        Move::from_parts(10, 5, 2, 1, 0);
    }

    #[test]
    fn history_is_lifo() {
        let mut history = MoveHistory::new();
        history.push(Move::new(0, 1, 3, true, false));
        history.push(Move::new(6, 7, 1, false, false));
        assert_eq!(history.len(), 2);
        assert_eq!(history.peek().map(Move::from), Some(6));
        assert_eq!(history.pop().map(|m| m.to_begin()), Some(7));
        assert_eq!(history.iter().next().map(Move::count), Some(3));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.pop(), None);
    }
}

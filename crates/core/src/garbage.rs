//! Garbage module - buffered incoming attack lines
//!
//! Incoming lines are only counted when received. They are pushed into the grid
//! at a lock that ends the combo chain, after the board had its chance to cancel
//! them with its own attack.
//!
//! Lines are inserted in batches sharing one hole column. When a batch runs out
//! a new hole column and a new batch size (1-4) are rolled.

use rand::Rng;

use crate::board::Board;

/// Largest batch of garbage lines sharing one hole column
pub const MAX_BATCH: u32 = 4;

/// Result of pushing pending garbage into a board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GarbageApplied {
    /// Rows actually inserted
    pub inserted: u32,
    /// A row could not be inserted because the top row was occupied
    pub topped_out: bool,
}

/// Per-board pending garbage counter and current batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GarbageQueue {
    pending: u32,
    hole: u8,
    batch_remaining: u32,
}

impl GarbageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines waiting to be inserted
    pub fn pending(&self) -> u32 {
        self.pending
    }

    /// Hole column of the batch in progress
    pub fn hole(&self) -> u8 {
        self.hole
    }

    pub fn receive(&mut self, lines: u32) {
        self.pending = self.pending.saturating_add(lines);
    }

    /// Offset `attack` against pending lines; returns the attack left to send
    pub fn cancel(&mut self, attack: u32) -> u32 {
        let cancelled = attack.min(self.pending);
        self.pending -= cancelled;
        attack - cancelled
    }

    /// Insert every pending line into `board`.
    ///
    /// Pending lines are consumed even if the board tops out part way.
    pub fn apply(&mut self, board: &mut Board, rng: &mut impl Rng) -> GarbageApplied {
        let mut result = GarbageApplied::default();
        let lines = std::mem::take(&mut self.pending);

        for _ in 0..lines {
            if board.top_row_occupied() {
                result.topped_out = true;
                break;
            }
            if self.batch_remaining == 0 {
                self.hole = rng.random_range(0..board.width());
                self.batch_remaining = rng.random_range(1..=MAX_BATCH);
                tracing::trace!(
                    hole = self.hole,
                    batch = self.batch_remaining,
                    "new garbage batch"
                );
            }
            board.push_garbage_row(self.hole);
            self.batch_remaining -= 1;
            result.inserted += 1;
        }

        result
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_cancel_reduces_pending_first() {
        let mut queue = GarbageQueue::new();
        queue.receive(3);
        assert_eq!(queue.cancel(2), 0);
        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.cancel(4), 3);
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_apply_inserts_rows_with_single_hole() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let mut board = Board::default();
        let mut queue = GarbageQueue::new();
        queue.receive(2);

        let applied = queue.apply(&mut board, &mut rng);
        assert_eq!(applied.inserted, 2);
        assert!(!applied.topped_out);
        assert_eq!(queue.pending(), 0);

        for y in [18i8, 19] {
            let holes = (0..10)
                .filter(|&x| board.get(x, y) == Some(BlockKind::Empty))
                .count();
            assert_eq!(holes, 1);
        }
    }

    #[test]
    fn test_batch_shares_hole_column() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut board = Board::default();
        let mut queue = GarbageQueue::new();

        // The first row starts a batch of at least one line; follow-ups within
        // the batch reuse the same column.
        queue.receive(1);
        queue.apply(&mut board, &mut rng);
        let hole = queue.hole();
        let left = queue.batch_remaining;

        queue.receive(left);
        queue.apply(&mut board, &mut rng);
        for y in (20 - 1 - left as i8)..20 {
            assert_eq!(board.get(hole as i8, y), Some(BlockKind::Empty));
        }
    }

    #[test]
    fn test_apply_tops_out_when_top_row_occupied() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut board = Board::default();
        board.set(0, 0, BlockKind::Garbage);
        let mut queue = GarbageQueue::new();
        queue.receive(2);

        let applied = queue.apply(&mut board, &mut rng);
        assert!(applied.topped_out);
        assert_eq!(applied.inserted, 0);
        assert_eq!(queue.pending(), 0);
    }
}

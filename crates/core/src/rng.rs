//! RNG module - seeded piece generation
//!
//! Every board that starts from the same seed must draw the same pieces, so the
//! piece stream is driven by a tiny LCG that is trivially reproducible on every
//! client. The 7-bag sits on top of it: one of each shape, Fisher-Yates shuffled,
//! drawn until empty and then refilled.

use arrayvec::ArrayVec;

use crate::types::{PieceKind, NEXT_QUEUE_LEN};

const LCG_MUL: u64 = 9301;
const LCG_INC: u64 = 49297;
const LCG_MOD: u64 = 233280;

/// Linear congruential generator producing values in `[0, 1)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PseudoRandom {
    state: u64,
}

impl PseudoRandom {
    /// Create a generator from any integer seed.
    ///
    /// The recurrence only depends on `seed mod 233280`, so the seed is reduced
    /// up front (Euclidean, so negative seeds behave too).
    pub fn new(seed: i64) -> Self {
        Self {
            state: seed.rem_euclid(LCG_MOD as i64) as u64,
        }
    }

    /// Advance and return the next value in `[0, 1)`
    pub fn next(&mut self) -> f64 {
        self.state = (self.state * LCG_MUL + LCG_INC) % LCG_MOD;
        self.state as f64 / LCG_MOD as f64
    }

    /// Uniform index in `0..bound` (bound must be non-zero)
    pub fn next_index(&mut self, bound: usize) -> usize {
        let idx = (self.next() * bound as f64) as usize;
        idx.min(bound - 1)
    }
}

/// 7-bag over a [`PseudoRandom`] stream
#[derive(Debug, Clone)]
pub struct SevenBag {
    bag: ArrayVec<PieceKind, 7>,
    rng: PseudoRandom,
}

impl SevenBag {
    pub fn new(seed: i64) -> Self {
        Self {
            bag: ArrayVec::new(),
            rng: PseudoRandom::new(seed),
        }
    }

    /// Fisher-Yates from the last index down
    fn refill(&mut self) {
        self.bag.clear();
        self.bag.extend(PieceKind::ALL);
        for i in (1..self.bag.len()).rev() {
            let j = self.rng.next_index(i + 1);
            self.bag.swap(i, j);
        }
        tracing::trace!(bag = ?self.bag, "new bag");
    }

    /// Draw the next piece, refilling when the bag is empty
    pub fn draw(&mut self) -> PieceKind {
        if self.bag.is_empty() {
            self.refill();
        }
        // Pieces come off the end of the shuffled bag.
        match self.bag.pop() {
            Some(kind) => kind,
            None => PieceKind::I,
        }
    }

    /// Pieces left in the current bag, next draw last
    pub fn remaining(&self) -> &[PieceKind] {
        &self.bag
    }
}

/// Bag-backed preview queue of upcoming pieces
#[derive(Debug, Clone)]
pub struct PieceQueue {
    bag: SevenBag,
    next: ArrayVec<PieceKind, NEXT_QUEUE_LEN>,
    seed: i64,
}

impl PieceQueue {
    pub fn new(seed: i64) -> Self {
        let mut bag = SevenBag::new(seed);
        let mut next = ArrayVec::new();
        while !next.is_full() {
            next.push(bag.draw());
        }
        Self { bag, next, seed }
    }

    /// Pop the head of the queue and append a freshly drawn piece to the tail
    pub fn pop(&mut self) -> PieceKind {
        let head = self.next.remove(0);
        self.next.push(self.bag.draw());
        head
    }

    pub fn peek(&self) -> PieceKind {
        self.next[0]
    }

    pub fn preview(&self) -> &[PieceKind] {
        &self.next
    }

    /// Seed this queue was built from
    pub fn seed(&self) -> i64 {
        self.seed
    }
}

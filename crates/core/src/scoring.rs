//! Scoring module - line clear score, combo, back-to-back and attack power
//!
//! Rules:
//! - Combo is `-1` with no active chain, `0` on the first clear of a chain and
//!   increments on every following clearing lock. A non-clearing lock resets it.
//! - A difficult clear is a 4-line clear or any spin clear. Two difficult clears
//!   in a row apply the back-to-back bonus; an ordinary clear ends the chain.
//! - A spin that clears nothing scores [`SPIN_MINI_SCORE`] and leaves combo and
//!   back-to-back untouched.
//! - Attack is computed once per lock: base table + back-to-back bonus +
//!   `combo / 2`.

use crate::types::{
    SpinKind, B2B_ATTACK_BONUS, LINE_ATTACK, LINE_SCORES, SPIN_ATTACK, SPIN_MINI_SCORE,
    SPIN_SCORES,
};

/// Combo value meaning "no active chain"
pub const NO_COMBO: i32 = -1;

/// Result of evaluating one lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClearOutcome {
    pub lines: u32,
    pub spin: SpinKind,
    /// Points added to the score by this lock
    pub points: u32,
    /// Attack lines produced before cancellation against pending garbage
    pub attack: u32,
    /// Combo counter after this lock
    pub combo: i32,
    /// Back-to-back status after this lock
    pub back_to_back: bool,
    /// Whether this lock continued a back-to-back chain
    pub b2b_applied: bool,
    /// Zero-line spin bonus
    pub mini: bool,
}

/// Base points for a clear (0 when nothing cleared)
pub fn base_score(lines: u32, spin: SpinKind) -> u32 {
    let lines = lines.min(4) as usize;
    match spin {
        SpinKind::TSpin if (1..=3).contains(&lines) => SPIN_SCORES[lines],
        _ => LINE_SCORES[lines],
    }
}

/// Base attack for a clear, before bonuses
pub fn base_attack(lines: u32, spin: SpinKind) -> u32 {
    let lines = lines.min(4) as usize;
    match spin {
        SpinKind::TSpin if (1..=3).contains(&lines) => SPIN_ATTACK[lines],
        _ => LINE_ATTACK[lines],
    }
}

pub fn is_difficult(lines: u32, spin: SpinKind) -> bool {
    lines >= 4 || (lines > 0 && spin.is_spin())
}

/// Combo bonus attack (`combo / 2` for combo >= 1)
pub fn combo_attack(combo: i32) -> u32 {
    if combo > 0 {
        (combo / 2) as u32
    } else {
        0
    }
}

/// Evaluate a lock that removed `lines` rows, given the chain state before it
pub fn evaluate_lock(lines: u32, spin: SpinKind, combo: i32, back_to_back: bool) -> ClearOutcome {
    if lines == 0 {
        if spin.is_spin() {
            return ClearOutcome {
                lines,
                spin,
                points: SPIN_MINI_SCORE,
                attack: 0,
                combo,
                back_to_back,
                b2b_applied: false,
                mini: true,
            };
        }
        return ClearOutcome {
            lines,
            spin,
            points: 0,
            attack: 0,
            combo: NO_COMBO,
            back_to_back,
            b2b_applied: false,
            mini: false,
        };
    }

    let combo = combo.saturating_add(1);
    let difficult = is_difficult(lines, spin);
    let b2b_applied = difficult && back_to_back;

    let mut attack = base_attack(lines, spin);
    if b2b_applied {
        attack += B2B_ATTACK_BONUS;
    }
    attack += combo_attack(combo);

    ClearOutcome {
        lines,
        spin,
        points: base_score(lines, spin),
        attack,
        combo,
        back_to_back: difficult,
        b2b_applied,
        mini: false,
    }
}

/// Running score and chain state for one board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreState {
    pub score: u32,
    pub lines: u32,
    pub combo: i32,
    pub back_to_back: bool,
}

impl ScoreState {
    pub fn new() -> Self {
        Self {
            score: 0,
            lines: 0,
            combo: NO_COMBO,
            back_to_back: false,
        }
    }

    /// Apply a lock result and return its outcome
    pub fn record_lock(&mut self, lines: u32, spin: SpinKind) -> ClearOutcome {
        let outcome = evaluate_lock(lines, spin, self.combo, self.back_to_back);
        self.score = self.score.saturating_add(outcome.points);
        self.lines += lines;
        self.combo = outcome.combo;
        self.back_to_back = outcome.back_to_back;
        outcome
    }
}

impl Default for ScoreState {
    fn default() -> Self {
        Self::new()
    }
}

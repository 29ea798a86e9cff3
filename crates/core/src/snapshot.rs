//! Snapshot module - plain board state exported for sync and display

use crate::game_state::Tetromino;
use crate::types::{PieceKind, Rotation, SkillId, NEXT_QUEUE_LEN, SKILL_SLOTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
}

impl From<Tetromino> for ActiveSnapshot {
    fn from(value: Tetromino) -> Self {
        Self {
            kind: value.kind,
            rotation: value.rotation,
            x: value.x,
            y: value.y,
        }
    }
}

/// Active effect switches as seen by renderers
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EffectsSnapshot {
    pub inverted_vertical: bool,
    pub inverted_horizontal: bool,
    pub color_flash: bool,
    pub jump_board: bool,
    pub speed_multiplier: f32,
}

/// Point-in-time view of one board, used for state sync
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    /// Rows of numeric block ids, top row first
    pub board: Vec<Vec<u8>>,
    pub active: Option<ActiveSnapshot>,
    pub ghost_y: Option<i8>,
    pub hold: Option<PieceKind>,
    pub can_hold: bool,
    pub next_queue: [PieceKind; NEXT_QUEUE_LEN],
    pub score: u32,
    pub lines: u32,
    pub combo: i32,
    pub back_to_back: bool,
    pub pending_garbage: u32,
    pub skills: [Option<SkillId>; SKILL_SLOTS],
    /// Active modifiers with their remaining seconds
    pub modifiers: Vec<(SkillId, f32)>,
    pub effects: EffectsSnapshot,
    /// Seconds left in the match, `None` without a limit
    pub remaining_secs: Option<u32>,
    pub danger: bool,
    pub game_over: bool,
    pub seed: i64,
}

impl BoardSnapshot {
    pub fn playable(&self) -> bool {
        !self.game_over && self.active.is_some()
    }
}

//! Per-board tuning values

use crate::types::{BASE_DROP_MS, BOARD_HEIGHT, BOARD_WIDTH, LOCK_DELAY_MS};

/// Board configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub width: u8,
    pub height: u8,
    /// Gravity interval at speed multiplier 1
    pub base_drop_ms: u32,
    pub lock_delay_ms: u32,
    /// Chance to acquire a skill card on each clearing lock
    pub skill_chance: f64,
    /// Seconds without scoring before a skill card is granted
    pub catch_up_secs: u32,
    /// Match length in seconds, `None` for no limit
    pub match_secs: Option<u32>,
    /// Practice boards have no time limit, no skill acquisition and restart on top-out
    pub practice: bool,
    /// The board is in danger when the stack reaches this many rows from the top
    pub danger_rows: u8,
}

impl GameConfig {
    pub fn practice() -> Self {
        Self {
            match_secs: None,
            practice: true,
            ..Self::default()
        }
    }

    /// Effective match length after the practice override
    pub fn time_limit(&self) -> Option<u32> {
        if self.practice {
            None
        } else {
            self.match_secs
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: BOARD_WIDTH,
            height: BOARD_HEIGHT,
            base_drop_ms: BASE_DROP_MS,
            lock_delay_ms: LOCK_DELAY_MS,
            skill_chance: 0.2,
            catch_up_secs: 30,
            match_secs: Some(120),
            practice: false,
            danger_rows: 5,
        }
    }
}

//! Core board simulation - pure, deterministic, and testable
//!
//! This crate contains the rules of one player's board: piece generation,
//! rotation, locking, scoring, incoming garbage and skill modifiers. It has no
//! networking or I/O. Two boards built from the same seed draw the same pieces.
//!
//! # Module Structure
//!
//! - [`board`]: grid storage, collision, line clears and garbage rows
//! - [`pieces`]: tetromino shapes, matrix rotation and wall-kick tables
//! - [`rng`]: seeded LCG, 7-bag and the preview queue
//! - [`scoring`]: score, combo, back-to-back and attack power
//! - [`garbage`]: buffered incoming lines with batched hole columns
//! - [`modifier`]: timed skill effects and the per-board pipeline
//! - [`skills`]: skill card slots
//! - [`config`]: per-board tuning values
//! - [`game_state`]: the board state machine tying everything together
//! - [`snapshot`]: point-in-time board export for state sync
//!
//! # Example
//!
//! ```
//! use chaos_tetris_core::{CastTarget, GameState};
//! use chaos_tetris_types::GameAction;
//!
//! let mut game = GameState::new(12345);
//! game.start();
//!
//! game.apply_action(GameAction::MoveRight);
//! game.apply_action(GameAction::RotateCw);
//! game.apply_action(GameAction::HardDrop);
//! game.tick(16);
//!
//! // Nothing to cast yet: empty slots are a no-op
//! assert_eq!(game.use_skill(0, CastTarget::SelfBoard), None);
//! assert_eq!(game.board().filled_count(), 4);
//! ```
//!
//! # Timing
//!
//! - Call [`GameState::tick`](game_state::GameState::tick) with elapsed time,
//!   typically every 16ms.
//! - Gravity steps every 1000ms divided by the speed multiplier.
//! - A blocked downward step arms a 500ms lock delay; a successful move or
//!   rotation cancels it.
//! - Every full second the match timer counts down and the catch-up skill
//!   timer advances.

pub mod board;
pub mod config;
pub mod game_state;
pub mod garbage;
pub mod modifier;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod skills;
pub mod snapshot;

pub use chaos_tetris_types as types;

pub use board::Board;
pub use config::GameConfig;
pub use game_state::{BoardEvent, BoardPhase, CastTarget, GameOverReason, GameState, Tetromino};
pub use garbage::GarbageQueue;
pub use modifier::{ControlInversion, EffectState, Modifier, ModifierPipeline, ModifierTarget};
pub use pieces::{get_shape, try_rotate};
pub use rng::{PieceQueue, PseudoRandom, SevenBag};
pub use scoring::{evaluate_lock, ClearOutcome, ScoreState};
pub use skills::SkillInventory;
pub use snapshot::{ActiveSnapshot, BoardSnapshot};

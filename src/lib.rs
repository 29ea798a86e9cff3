//! Chaos Tetris (workspace facade crate).
//!
//! Re-exports the member crates under stable names:
//! `chaos_tetris::{types, core, room}`. The implementation lives in dedicated
//! crates under `crates/`.

pub use chaos_tetris_core as core;
pub use chaos_tetris_room as room;
pub use chaos_tetris_types as types;

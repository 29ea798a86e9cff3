//! Shared types module - data structures and constants used by every crate
//!
//! Everything here is plain data with no external dependencies, so the same
//! definitions can be used by the board simulation, the room orchestrator and
//! the wire protocol.
//!
//! # Board Dimensions
//!
//! Default playfield dimensions (configurable per board):
//!
//! - **Width**: 10 columns (indexed 0-9)
//! - **Height**: 20 rows (indexed 0-19, row 0 at the top)
//! - Rows above row 0 form the hidden spawn buffer.
//!
//! # Timing Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_MS` | 16 | Fixed timestep interval (~60 FPS) |
//! | `BASE_DROP_MS` | 1000 | Gravity interval without modifiers |
//! | `LOCK_DELAY_MS` | 500 | Grace period before a resting piece locks |
//! | `SECOND_MS` | 1000 | Period of the bookkeeping tick |
//!
//! # Examples
//!
//! ```
//! use chaos_tetris_types::{BlockKind, PieceKind, Rotation, SkillId, BOARD_WIDTH};
//!
//! let piece = PieceKind::from_str("t").unwrap();
//! assert_eq!(BlockKind::from(piece).id(), 6);
//!
//! assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
//! assert_eq!(SkillId::from_str("dig_hole"), Some(SkillId::DigHole));
//! assert_eq!(BOARD_WIDTH, 10);
//! ```

/// Default board width in cells
pub const BOARD_WIDTH: u8 = 10;

/// Default board height in cells
pub const BOARD_HEIGHT: u8 = 20;

/// Fixed timestep interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Gravity interval at normal speed (one row per second)
pub const BASE_DROP_MS: u32 = 1000;

/// Lock delay when a downward step collides
pub const LOCK_DELAY_MS: u32 = 500;

/// Period of the slow bookkeeping tick (timer countdown, catch-up check)
pub const SECOND_MS: u32 = 1000;

/// Number of upcoming pieces kept in the preview queue
pub const NEXT_QUEUE_LEN: usize = 5;

/// Number of skill card slots per player
pub const SKILL_SLOTS: usize = 3;

/// Tetromino piece kinds.
///
/// The declaration order is the bag order: bag index `i` maps to `PieceKind::ALL[i]`.
/// Changing it changes every seeded piece sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl PieceKind {
    /// All kinds in bag order
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::J,
        PieceKind::L,
        PieceKind::O,
        PieceKind::S,
        PieceKind::T,
        PieceKind::Z,
    ];

    /// Parse piece kind from string (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "j" => Some(PieceKind::J),
            "l" => Some(PieceKind::L),
            "o" => Some(PieceKind::O),
            "s" => Some(PieceKind::S),
            "t" => Some(PieceKind::T),
            "z" => Some(PieceKind::Z),
            _ => None,
        }
    }

    /// Convert to lowercase string
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "i",
            PieceKind::J => "j",
            PieceKind::L => "l",
            PieceKind::O => "o",
            PieceKind::S => "s",
            PieceKind::T => "t",
            PieceKind::Z => "z",
        }
    }

    /// Display color used by renderers
    pub fn color(&self) -> &'static str {
        match self {
            PieceKind::I => "cyan",
            PieceKind::J => "blue",
            PieceKind::L => "orange",
            PieceKind::O => "yellow",
            PieceKind::S => "green",
            PieceKind::T => "purple",
            PieceKind::Z => "red",
        }
    }

    /// Index into [`PieceKind::ALL`]
    pub fn bag_index(&self) -> usize {
        match self {
            PieceKind::I => 0,
            PieceKind::J => 1,
            PieceKind::L => 2,
            PieceKind::O => 3,
            PieceKind::S => 4,
            PieceKind::T => 5,
            PieceKind::Z => 6,
        }
    }
}

/// Content of a single board cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlockKind {
    #[default]
    Empty,
    Piece(PieceKind),
    Garbage,
}

impl BlockKind {
    pub fn is_empty(&self) -> bool {
        matches!(self, BlockKind::Empty)
    }

    /// Numeric block id used on the wire (0 = empty, 1-7 = pieces, 8 = garbage)
    pub fn id(&self) -> u8 {
        match self {
            BlockKind::Empty => 0,
            BlockKind::Piece(PieceKind::I) => 1,
            BlockKind::Piece(PieceKind::J) => 2,
            BlockKind::Piece(PieceKind::L) => 3,
            BlockKind::Piece(PieceKind::O) => 4,
            BlockKind::Piece(PieceKind::S) => 5,
            BlockKind::Piece(PieceKind::T) => 6,
            BlockKind::Piece(PieceKind::Z) => 7,
            BlockKind::Garbage => 8,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(BlockKind::Empty),
            1..=7 => Some(BlockKind::Piece(PieceKind::ALL[(id - 1) as usize])),
            8 => Some(BlockKind::Garbage),
            _ => None,
        }
    }
}

impl From<PieceKind> for BlockKind {
    fn from(kind: PieceKind) -> Self {
        BlockKind::Piece(kind)
    }
}

/// Rotation states (North = spawn orientation, state 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    North,
    East,
    South,
    West,
}

impl Rotation {
    /// Rotate clockwise
    pub fn rotate_cw(&self) -> Self {
        match self {
            Rotation::North => Rotation::East,
            Rotation::East => Rotation::South,
            Rotation::South => Rotation::West,
            Rotation::West => Rotation::North,
        }
    }

    /// Rotate counter-clockwise
    pub fn rotate_ccw(&self) -> Self {
        match self {
            Rotation::North => Rotation::West,
            Rotation::West => Rotation::South,
            Rotation::South => Rotation::East,
            Rotation::East => Rotation::North,
        }
    }

    pub fn rotate(&self, direction: RotateDirection) -> Self {
        match direction {
            RotateDirection::Clockwise => self.rotate_cw(),
            RotateDirection::CounterClockwise => self.rotate_ccw(),
        }
    }

    /// Rotation state as an integer in 0..4
    pub fn index(&self) -> usize {
        match self {
            Rotation::North => 0,
            Rotation::East => 1,
            Rotation::South => 2,
            Rotation::West => 3,
        }
    }

    /// Parse from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "north" | "n" => Some(Rotation::North),
            "east" | "e" => Some(Rotation::East),
            "south" | "s" => Some(Rotation::South),
            "west" | "w" => Some(Rotation::West),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Rotation::North => "north",
            Rotation::East => "east",
            Rotation::South => "south",
            Rotation::West => "west",
        }
    }
}

/// Direction of a single-step move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Left,
    Right,
    Down,
}

impl MoveDirection {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "left" => Some(MoveDirection::Left),
            "right" => Some(MoveDirection::Right),
            "down" => Some(MoveDirection::Down),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoveDirection::Left => "left",
            MoveDirection::Right => "right",
            MoveDirection::Down => "down",
        }
    }

    /// Cell offset `(dx, dy)` for this direction
    pub fn offset(&self) -> (i8, i8) {
        match self {
            MoveDirection::Left => (-1, 0),
            MoveDirection::Right => (1, 0),
            MoveDirection::Down => (0, 1),
        }
    }
}

/// Direction of a 90° rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RotateDirection {
    Clockwise,
    CounterClockwise,
}

impl RotateDirection {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "clockwise" | "cw" => Some(RotateDirection::Clockwise),
            "counter-clockwise" | "ccw" => Some(RotateDirection::CounterClockwise),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RotateDirection::Clockwise => "clockwise",
            RotateDirection::CounterClockwise => "counter-clockwise",
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            RotateDirection::Clockwise => RotateDirection::CounterClockwise,
            RotateDirection::CounterClockwise => RotateDirection::Clockwise,
        }
    }
}

/// Player inputs that can be applied to a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    /// Move piece one cell left
    MoveLeft,
    /// Move piece one cell right
    MoveRight,
    /// Move piece one cell down (starts lock delay when blocked)
    SoftDrop,
    /// Drop piece to its resting row and lock
    HardDrop,
    /// Rotate piece 90° clockwise
    RotateCw,
    /// Rotate piece 90° counter-clockwise
    RotateCcw,
    /// Swap with the hold slot (once per spawn)
    Hold,
}

impl GameAction {
    /// Parse action from string
    ///
    /// # Examples
    ///
    /// ```
    /// use chaos_tetris_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("moveLeft"), Some(GameAction::MoveLeft));
    /// assert_eq!(GameAction::from_str("hardDrop"), Some(GameAction::HardDrop));
    /// assert_eq!(GameAction::from_str("pause"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveleft" => Some(GameAction::MoveLeft),
            "moveright" => Some(GameAction::MoveRight),
            "softdrop" => Some(GameAction::SoftDrop),
            "harddrop" => Some(GameAction::HardDrop),
            "rotatecw" => Some(GameAction::RotateCw),
            "rotateccw" => Some(GameAction::RotateCcw),
            "hold" => Some(GameAction::Hold),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::MoveLeft => "moveLeft",
            GameAction::MoveRight => "moveRight",
            GameAction::SoftDrop => "softDrop",
            GameAction::HardDrop => "hardDrop",
            GameAction::RotateCw => "rotateCw",
            GameAction::RotateCcw => "rotateCcw",
            GameAction::Hold => "hold",
        }
    }
}

/// Skill identities. Each skill maps to exactly one modifier kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkillId {
    ReverseV,
    ReverseH,
    DigHole,
    ColorFlash,
    JumpBoard,
    SpeedBoost,
}

/// Who a skill is meant for by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillTarget {
    SelfBoard,
    Opponent,
}

/// Static description of a skill card
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkillCard {
    pub id: SkillId,
    pub name: &'static str,
    pub description: &'static str,
    /// Effect duration in seconds; `0.0` means one-shot
    pub duration_secs: f32,
    pub target: SkillTarget,
}

impl SkillId {
    pub const ALL: [SkillId; 6] = [
        SkillId::ReverseV,
        SkillId::ReverseH,
        SkillId::DigHole,
        SkillId::ColorFlash,
        SkillId::JumpBoard,
        SkillId::SpeedBoost,
    ];

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reverse_v" => Some(SkillId::ReverseV),
            "reverse_h" => Some(SkillId::ReverseH),
            "dig_hole" => Some(SkillId::DigHole),
            "color_flash" => Some(SkillId::ColorFlash),
            "jump_board" => Some(SkillId::JumpBoard),
            "speed_boost" => Some(SkillId::SpeedBoost),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SkillId::ReverseV => "reverse_v",
            SkillId::ReverseH => "reverse_h",
            SkillId::DigHole => "dig_hole",
            SkillId::ColorFlash => "color_flash",
            SkillId::JumpBoard => "jump_board",
            SkillId::SpeedBoost => "speed_boost",
        }
    }

    /// Static card for this skill
    pub fn card(&self) -> SkillCard {
        match self {
            SkillId::ReverseV => SkillCard {
                id: *self,
                name: "Vertical Reverse",
                description: "Opponent board reversed (8s)",
                duration_secs: 8.0,
                target: SkillTarget::Opponent,
            },
            SkillId::ReverseH => SkillCard {
                id: *self,
                name: "Horizontal Reverse",
                description: "Opponent board control reversed (8s)",
                duration_secs: 8.0,
                target: SkillTarget::Opponent,
            },
            SkillId::DigHole => SkillCard {
                id: *self,
                name: "Dig Hole",
                description: "Opponent board dig 4 holes (1 time)",
                duration_secs: 0.0,
                target: SkillTarget::Opponent,
            },
            SkillId::ColorFlash => SkillCard {
                id: *self,
                name: "Color Flash",
                description: "Opponent board color flash (20s)",
                duration_secs: 20.0,
                target: SkillTarget::Opponent,
            },
            SkillId::JumpBoard => SkillCard {
                id: *self,
                name: "Jump Board",
                description: "Opponent board jump (10s)",
                duration_secs: 10.0,
                target: SkillTarget::Opponent,
            },
            SkillId::SpeedBoost => SkillCard {
                id: *self,
                name: "Speed Boost",
                description: "Opponent board speed boost (10s)",
                duration_secs: 10.0,
                target: SkillTarget::Opponent,
            },
        }
    }
}

/// Spin detection result for the last successful rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpinKind {
    #[default]
    None,
    /// Pivot piece rotated into a slot with 3 of 4 diagonal corners occupied
    TSpin,
}

impl SpinKind {
    pub fn is_spin(&self) -> bool {
        matches!(self, SpinKind::TSpin)
    }
}

/// Line clear base score table (index = lines cleared)
pub const LINE_SCORES: [u32; 5] = [0, 100, 300, 500, 800];

/// Spin clear base score table (index = lines cleared, 4 lines falls back to `LINE_SCORES`)
pub const SPIN_SCORES: [u32; 4] = [0, 800, 1200, 1600];

/// Score for a spin that clears no lines
pub const SPIN_MINI_SCORE: u32 = 400;

/// Attack for a plain clear (index = lines cleared)
pub const LINE_ATTACK: [u32; 5] = [0, 0, 1, 2, 4];

/// Attack for a spin clear (index = lines cleared, 4 lines uses `LINE_ATTACK`)
pub const SPIN_ATTACK: [u32; 4] = [0, 2, 4, 6];

/// Extra attack for a difficult clear continuing back-to-back
pub const B2B_ATTACK_BONUS: u32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_roundtrip_covers_all_kinds() {
        for id in 0..=8u8 {
            let block = BlockKind::from_id(id).unwrap();
            assert_eq!(block.id(), id);
        }
        assert_eq!(BlockKind::from_id(9), None);
    }

    #[test]
    fn test_bag_index_matches_all_order() {
        for (i, kind) in PieceKind::ALL.iter().enumerate() {
            assert_eq!(kind.bag_index(), i);
        }
    }

    #[test]
    fn test_skill_names_parse() {
        for skill in SkillId::ALL {
            assert_eq!(SkillId::from_str(skill.as_str()), Some(skill));
        }
        assert_eq!(SkillId::DigHole.card().duration_secs, 0.0);
    }

    #[test]
    fn test_rotate_direction_strings() {
        assert_eq!(
            RotateDirection::from_str("counter-clockwise"),
            Some(RotateDirection::CounterClockwise)
        );
        assert_eq!(RotateDirection::Clockwise.reversed(), RotateDirection::CounterClockwise);
        assert_eq!(Rotation::West.rotate(RotateDirection::Clockwise), Rotation::North);
    }
}

//! Pieces module - tetromino shapes and wall-kick rotation
//!
//! Each shape lives in a square bounding box (2x2 for O, 4x4 for I, 3x3 for the
//! rest). Rotation is a 90° matrix rotation of that box, so rotation states are
//! derived from the spawn shape instead of being tabulated.
//!
//! Kick offsets are `(dx, dy)` with `dy` pointing *up*; they are applied as
//! `(x + dx, y - dy)` in board coordinates where y grows downward.

use crate::types::{PieceKind, RotateDirection, Rotation};

/// Offset of a single mino relative to the bounding box origin
pub type MinoOffset = (i8, i8);

/// Four mino offsets inside the bounding box
pub type PieceShape = [MinoOffset; 4];

/// Side length of the bounding box for a piece kind
pub fn box_size(kind: PieceKind) -> i8 {
    match kind {
        PieceKind::I => 4,
        PieceKind::O => 2,
        _ => 3,
    }
}

/// Spawn-orientation shape
pub fn spawn_shape(kind: PieceKind) -> PieceShape {
    match kind {
        PieceKind::I => [(0, 1), (1, 1), (2, 1), (3, 1)],
        PieceKind::J => [(0, 0), (0, 1), (1, 1), (2, 1)],
        PieceKind::L => [(2, 0), (0, 1), (1, 1), (2, 1)],
        PieceKind::O => [(0, 0), (1, 0), (0, 1), (1, 1)],
        PieceKind::S => [(1, 0), (2, 0), (0, 1), (1, 1)],
        PieceKind::T => [(1, 0), (0, 1), (1, 1), (2, 1)],
        PieceKind::Z => [(0, 0), (1, 0), (1, 1), (2, 1)],
    }
}

/// Rotate a shape 90° inside an `n`x`n` box
pub fn rotate_shape(shape: &PieceShape, n: i8, direction: RotateDirection) -> PieceShape {
    let mut out = *shape;
    for (dst, &(x, y)) in out.iter_mut().zip(shape.iter()) {
        *dst = match direction {
            RotateDirection::Clockwise => (n - 1 - y, x),
            RotateDirection::CounterClockwise => (y, n - 1 - x),
        };
    }
    out
}

/// Shape for a piece kind in a given rotation state
pub fn get_shape(kind: PieceKind, rotation: Rotation) -> PieceShape {
    let n = box_size(kind);
    let mut shape = spawn_shape(kind);
    for _ in 0..rotation.index() {
        shape = rotate_shape(&shape, n, RotateDirection::Clockwise);
    }
    shape
}

/// Five kick candidates per starting rotation state
pub type KickTable = [[(i8, i8); 5]; 4];

const I_KICKS_CW: KickTable = [
    [(0, 0), (-2, 0), (1, 0), (-2, -1), (1, 2)],
    [(0, 0), (-1, 0), (2, 0), (-1, 2), (2, -1)],
    [(0, 0), (2, 0), (-1, 0), (2, 1), (-1, -2)],
    [(0, 0), (1, 0), (-2, 0), (1, -2), (-2, 1)],
];

const I_KICKS_CCW: KickTable = [
    [(0, 0), (-1, 0), (2, 0), (-1, 2), (2, -1)],
    [(0, 0), (2, 0), (-1, 0), (2, -1), (-1, 2)],
    [(0, 0), (1, 0), (-2, 0), (1, -2), (-2, 1)],
    [(0, 0), (-2, 0), (1, 0), (-2, 1), (1, -2)],
];

const JLSTZ_KICKS_CW: KickTable = [
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
];

const JLSTZ_KICKS_CCW: KickTable = [
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    [(0, 0), (1, 0), (1, -1), (0, 2), (1, 2)],
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
    [(0, 0), (-1, 0), (-1, -1), (0, 2), (-1, 2)],
];

/// Kick candidates for rotating `kind` out of `from` in `direction`
pub fn kicks(
    kind: PieceKind,
    from: Rotation,
    direction: RotateDirection,
) -> &'static [(i8, i8); 5] {
    let table = match (kind, direction) {
        (PieceKind::I, RotateDirection::Clockwise) => &I_KICKS_CW,
        (PieceKind::I, RotateDirection::CounterClockwise) => &I_KICKS_CCW,
        (_, RotateDirection::Clockwise) => &JLSTZ_KICKS_CW,
        (_, RotateDirection::CounterClockwise) => &JLSTZ_KICKS_CCW,
    };
    &table[from.index()]
}

/// Successful rotation placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationResult {
    pub rotation: Rotation,
    pub x: i8,
    pub y: i8,
    /// Index of the kick candidate that fit (0 = no kick)
    pub kick_index: usize,
}

/// Try to rotate a piece, testing each kick candidate in order.
///
/// `is_free(x, y)` reports whether a board cell may hold a mino.
/// Returns `None` when every candidate collides.
pub fn try_rotate(
    kind: PieceKind,
    rotation: Rotation,
    x: i8,
    y: i8,
    direction: RotateDirection,
    is_free: impl Fn(i8, i8) -> bool,
) -> Option<RotationResult> {
    let new_rotation = rotation.rotate(direction);
    let new_shape = get_shape(kind, new_rotation);

    for (kick_index, &(dx, dy)) in kicks(kind, rotation, direction).iter().enumerate() {
        let test_x = x + dx;
        let test_y = y - dy;

        let fits = new_shape
            .iter()
            .all(|&(mx, my)| is_free(test_x + mx, test_y + my));

        if fits {
            return Some(RotationResult {
                rotation: new_rotation,
                x: test_x,
                y: test_y,
                kick_index,
            });
        }
    }

    None
}

/// Spawn column for a piece on a board of `board_width` columns
pub fn spawn_x(kind: PieceKind, board_width: u8) -> i8 {
    (board_width / 2) as i8 - box_size(kind) / 2
}

/// Spawn row: one row into the hidden buffer above the board
pub const SPAWN_Y: i8 = -1;

//! Pieces and generator tests - rotation, kicks, seeded bags

use std::collections::HashSet;

use chaos_tetris::core::pieces::{get_shape, spawn_x, try_rotate};
use chaos_tetris::core::{Board, PieceQueue, PseudoRandom, SevenBag};
use chaos_tetris::types::{BlockKind, PieceKind, RotateDirection, Rotation};

#[test]
fn test_t_piece_shapes() {
    assert_eq!(get_shape(PieceKind::T, Rotation::North), [(1, 0), (0, 1), (1, 1), (2, 1)]);
    let east = get_shape(PieceKind::T, Rotation::East);
    let mut sorted = east.to_vec();
    sorted.sort();
    assert_eq!(sorted, vec![(1, 0), (1, 1), (1, 2), (2, 1)]);
}

#[test]
fn test_four_rotations_return_to_start() {
    let board = Board::default();
    for kind in PieceKind::ALL {
        for direction in [RotateDirection::Clockwise, RotateDirection::CounterClockwise] {
            let (mut rot, mut x, mut y) = (Rotation::North, 3, 5);
            for _ in 0..4 {
                let is_free = |cx, cy| board.is_free(cx, cy);
                let r = try_rotate(kind, rot, x, y, direction, is_free).unwrap();
                assert_eq!(r.kick_index, 0, "{:?} needed a kick in open space", kind);
                rot = r.rotation;
                x = r.x;
                y = r.y;
            }
            assert_eq!((rot, x, y), (Rotation::North, 3, 5), "{:?} {:?}", kind, direction);
        }
    }
}

#[test]
fn test_rotation_against_wall_kicks() {
    // Vertical I flush against the left wall: rotating back to horizontal must kick right
    let board = Board::default();
    let r = try_rotate(PieceKind::I, Rotation::East, -2, 5, RotateDirection::Clockwise, |x, y| {
        board.is_free(x, y)
    })
    .unwrap();
    assert!(r.kick_index > 0);
    assert_eq!(r.rotation, Rotation::South);
    let shape = get_shape(PieceKind::I, Rotation::South);
    assert!(shape.iter().all(|&(mx, my)| board.is_free(r.x + mx, r.y + my)));
}

#[test]
fn test_fully_blocked_rotation_fails() {
    let mut board = Board::new(10, 6);
    for y in 0..6 {
        for x in 0..10 {
            board.set(x, y, BlockKind::Garbage);
        }
    }
    board.set(4, 3, BlockKind::Empty);
    let r = try_rotate(PieceKind::T, Rotation::North, 3, 2, RotateDirection::Clockwise, |x, y| {
        board.is_free(x, y)
    });
    assert_eq!(r, None);
}

#[test]
fn test_spawn_column_is_centred() {
    assert_eq!(spawn_x(PieceKind::I, 10), 3);
    assert_eq!(spawn_x(PieceKind::O, 10), 4);
    assert_eq!(spawn_x(PieceKind::T, 10), 4);
}

#[test]
fn test_same_seed_same_sequence() {
    for seed in [0, 1, 42, 233_279, 1_700_000_000_000, -5] {
        let mut a = SevenBag::new(seed);
        let mut b = SevenBag::new(seed);
        for _ in 0..50 {
            assert_eq!(a.draw(), b.draw());
        }
    }
}

#[test]
fn test_each_bag_is_a_permutation() {
    let mut bag = SevenBag::new(98765);
    for _ in 0..10 {
        let drawn: HashSet<PieceKind> = (0..7).map(|_| bag.draw()).collect();
        assert_eq!(drawn.len(), 7);
    }
}

#[test]
fn test_lcg_stays_in_unit_interval() {
    let mut rng = PseudoRandom::new(-123);
    for _ in 0..1000 {
        let v = rng.next();
        assert!((0.0..1.0).contains(&v));
    }
}

#[test]
fn test_queue_preview_advances() {
    let mut queue = PieceQueue::new(7);
    let preview: Vec<PieceKind> = queue.preview().to_vec();
    assert_eq!(preview.len(), 5);

    assert_eq!(queue.pop(), preview[0]);
    assert_eq!(&queue.preview()[..4], &preview[1..]);
    assert_eq!(queue.seed(), 7);
}

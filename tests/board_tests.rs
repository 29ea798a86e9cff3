//! Board tests - grid storage, line clears and garbage rows

use chaos_tetris::core::Board;
use chaos_tetris::types::{BlockKind, PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

fn fill_row_except(board: &mut Board, y: i8, hole: Option<i8>) {
    for x in 0..board.width() as i8 {
        if Some(x) != hole {
            board.set(x, y, BlockKind::Garbage);
        }
    }
}

#[test]
fn test_board_new_empty() {
    let board = Board::default();
    assert_eq!(board.width(), BOARD_WIDTH);
    assert_eq!(board.height(), BOARD_HEIGHT);
    assert_eq!(board.filled_count(), 0);
    assert_eq!(board.highest_occupied_row(), None);
}

#[test]
fn test_board_get_out_of_bounds() {
    let board = Board::default();

    assert_eq!(board.get(-1, 0), None);
    assert_eq!(board.get(0, -1), None);
    assert_eq!(board.get(BOARD_WIDTH as i8, 0), None);
    assert_eq!(board.get(0, BOARD_HEIGHT as i8), None);
}

#[test]
fn test_collision_rules() {
    let mut board = Board::new(6, 8);
    board.set(2, 7, BlockKind::Piece(PieceKind::T));

    // Above the top is free, walls and floor are not
    assert!(board.is_free(0, -3));
    assert!(!board.is_free(-1, -3));
    assert!(!board.is_free(6, 0));
    assert!(!board.is_free(0, 8));
    assert!(!board.is_free(2, 7));
    assert!(board.is_free(3, 7));
}

#[test]
fn test_clear_keeps_partial_rows_in_order() {
    let mut board = Board::default();
    fill_row_except(&mut board, 19, None);
    fill_row_except(&mut board, 18, Some(4));
    fill_row_except(&mut board, 17, None);
    board.set(7, 16, BlockKind::Piece(PieceKind::L));

    assert_eq!(board.clear_full_rows(), 2);

    // Row 18 (hole at 4) falls to 19, the lone L block to 18
    assert_eq!(board.get(4, 19), Some(BlockKind::Empty));
    assert_eq!(board.get(0, 19), Some(BlockKind::Garbage));
    assert_eq!(board.get(7, 18), Some(BlockKind::Piece(PieceKind::L)));
    assert_eq!(board.filled_count(), 10);
}

#[test]
fn test_garbage_row_shifts_stack_up() {
    let mut board = Board::default();
    board.set(3, 19, BlockKind::Piece(PieceKind::O));

    assert!(board.push_garbage_row(5));
    assert_eq!(board.get(3, 18), Some(BlockKind::Piece(PieceKind::O)));
    assert_eq!(board.get(5, 19), Some(BlockKind::Empty));
    let garbage = (0..10).filter(|&x| board.get(x, 19) == Some(BlockKind::Garbage)).count();
    assert_eq!(garbage, 9);
}

#[test]
fn test_garbage_refused_when_top_occupied() {
    let mut board = Board::default();
    board.set(0, 0, BlockKind::Garbage);
    let before = board.clone();

    assert!(!board.push_garbage_row(1));
    assert_eq!(board, before);
}

#[test]
fn test_id_rows_round_trip() {
    let mut board = Board::new(4, 3);
    board.set(0, 2, BlockKind::Piece(PieceKind::I));
    board.set(3, 2, BlockKind::Garbage);

    let rows = board.to_id_rows();
    assert_eq!(rows, vec![vec![0, 0, 0, 0], vec![0, 0, 0, 0], vec![1, 0, 0, 8]]);
    assert_eq!(Board::from_id_rows(&rows), board);
}

//! Board module - manages the game grid
//!
//! The board is a `width` x `height` grid (10x20 by default) where each cell is a
//! [`BlockKind`]. Cells are kept in a flat row-major vector.
//!
//! Coordinates: (x, y) with x growing to the right and y growing downward, row 0
//! at the top. Negative rows are the hidden spawn buffer: they are always free
//! for collision purposes but can never hold a block.

use crate::types::{BlockKind, PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

/// The game board using flat vector storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: u8,
    height: u8,
    /// Row-major cells (y * width + x)
    cells: Vec<BlockKind>,
}

impl Board {
    /// Create an empty board with the given dimensions
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            cells: vec![BlockKind::Empty; width as usize * height as usize],
        }
    }

    #[inline(always)]
    fn index(&self, x: i8, y: i8) -> Option<usize> {
        if x < 0 || x >= self.width as i8 || y < 0 || y >= self.height as i8 {
            return None;
        }
        Some((y as usize) * (self.width as usize) + (x as usize))
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// Get cell at position (x, y), `None` if out of bounds
    pub fn get(&self, x: i8, y: i8) -> Option<BlockKind> {
        self.index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y); returns false if out of bounds
    pub fn set(&mut self, x: i8, y: i8, block: BlockKind) -> bool {
        match self.index(x, y) {
            Some(idx) => {
                self.cells[idx] = block;
                true
            }
            None => false,
        }
    }

    /// Whether a mino may occupy (x, y).
    ///
    /// Columns outside the board and rows below the floor collide. Rows above
    /// the top are free.
    pub fn is_free(&self, x: i8, y: i8) -> bool {
        if x < 0 || x >= self.width as i8 || y >= self.height as i8 {
            return false;
        }
        if y < 0 {
            return true;
        }
        matches!(self.get(x, y), Some(BlockKind::Empty))
    }

    /// Within bounds and holding a block
    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        matches!(self.get(x, y), Some(block) if !block.is_empty())
    }

    fn row(&self, y: usize) -> &[BlockKind] {
        let w = self.width as usize;
        &self.cells[y * w..(y + 1) * w]
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        y < self.height as usize && self.row(y).iter().all(|c| !c.is_empty())
    }

    pub fn is_row_empty(&self, y: usize) -> bool {
        y >= self.height as usize || self.row(y).iter().all(|c| c.is_empty())
    }

    /// Remove every full row, shift the rest down and refill the top with empty
    /// rows. Returns the number of rows removed.
    pub fn clear_full_rows(&mut self) -> usize {
        let width = self.width as usize;
        let height = self.height as usize;
        let mut write_y = height;
        let mut cleared = 0;

        for read_y in (0..height).rev() {
            if self.is_row_full(read_y) {
                cleared += 1;
                continue;
            }
            write_y -= 1;
            if write_y != read_y {
                self.cells
                    .copy_within(read_y * width..(read_y + 1) * width, write_y * width);
            }
        }

        for cell in &mut self.cells[..write_y * width] {
            *cell = BlockKind::Empty;
        }

        cleared
    }

    /// Write piece minos into the grid.
    ///
    /// Minos above row 0 are dropped. Returns false if any mino was above the
    /// visible area, which callers treat as a lock-out.
    pub fn merge_piece(&mut self, shape: &[(i8, i8)], x: i8, y: i8, kind: PieceKind) -> bool {
        let mut inside = true;
        for &(dx, dy) in shape {
            let py = y + dy;
            if py < 0 {
                inside = false;
                continue;
            }
            self.set(x + dx, py, BlockKind::Piece(kind));
        }
        inside
    }

    /// Whether the topmost visible row holds any block
    pub fn top_row_occupied(&self) -> bool {
        !self.is_row_empty(0)
    }

    /// Shift everything up by one row and fill the bottom row with garbage,
    /// leaving `hole` empty. Returns false (board untouched) if the top row
    /// is occupied.
    pub fn push_garbage_row(&mut self, hole: u8) -> bool {
        if self.top_row_occupied() {
            return false;
        }
        let width = self.width as usize;
        let len = self.cells.len();
        self.cells.copy_within(width..len, 0);
        for (x, cell) in self.cells[len - width..].iter_mut().enumerate() {
            *cell = if x == hole as usize {
                BlockKind::Empty
            } else {
                BlockKind::Garbage
            };
        }
        true
    }

    /// Index of the highest row holding any block
    pub fn highest_occupied_row(&self) -> Option<u8> {
        (0..self.height as usize)
            .find(|&y| !self.is_row_empty(y))
            .map(|y| y as u8)
    }

    /// Occupied cells at or below `min_row`
    pub fn occupied_cells_from(&self, min_row: u8) -> Vec<(i8, i8)> {
        let mut out = Vec::new();
        for y in min_row..self.height {
            for x in 0..self.width {
                if self.is_occupied(x as i8, y as i8) {
                    out.push((x as i8, y as i8));
                }
            }
        }
        out
    }

    /// Count of non-empty cells
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }

    pub fn cells(&self) -> &[BlockKind] {
        &self.cells
    }

    /// Grid as numeric block ids, one `Vec` per row
    pub fn to_id_rows(&self) -> Vec<Vec<u8>> {
        (0..self.height as usize)
            .map(|y| self.row(y).iter().map(BlockKind::id).collect())
            .collect()
    }

    pub fn clear(&mut self) {
        self.cells.fill(BlockKind::Empty);
    }

    /// Build a board from rows of block ids (unknown ids become empty)
    pub fn from_id_rows(rows: &[Vec<u8>]) -> Self {
        let height = rows.len() as u8;
        let width = rows.first().map(|r| r.len()).unwrap_or(0) as u8;
        let mut board = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, &id) in row.iter().enumerate().take(width as usize) {
                board.set(
                    x as i8,
                    y as i8,
                    BlockKind::from_id(id).unwrap_or_default(),
                );
            }
        }
        board
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BOARD_WIDTH, BOARD_HEIGHT)
    }
}

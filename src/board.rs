use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidReplay;

pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 64;
pub const BOARD_CELLS: usize = BOARD_WIDTH * BOARD_HEIGHT;

/// Occupancy grid stored as one bit column per x coordinate.
///
/// Bit `y` of `cols[x]` is the cell `(x, y)`; row 0 is the floor.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<bool>>", into = "Vec<Vec<bool>>")]
pub struct Board {
    pub cols: [u64; BOARD_WIDTH],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cells outside the grid count as occupied.
    pub fn occupied(&self, (x, y): (i8, i8)) -> bool {
        x < 0
            || BOARD_WIDTH as i8 <= x
            || y < 0
            || BOARD_HEIGHT as i8 <= y
            || self.cols[x as usize] & (1u64 << y) != 0
    }

    /// Cells outside the 10 x 64 grid are left untouched.
    pub fn set(&mut self, x: usize, y: usize, filled: bool) {
        if y >= BOARD_HEIGHT {
            return;
        }
        let Some(col) = self.cols.get_mut(x) else {
            return;
        };
        if filled {
            *col |= 1u64 << y;
        } else {
            *col &= !(1u64 << y);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cols.iter().all(|col| *col == 0)
    }

    /// Index of the first empty row above the highest filled cell of column `x`.
    /// Zero for columns past the right edge.
    pub fn height_of(&self, x: usize) -> u32 {
        u64::BITS - self.column_bits(x).leading_zeros()
    }

    pub fn max_height(&self) -> u32 {
        (0..BOARD_WIDTH).map(|x| self.height_of(x)).max().unwrap_or(0)
    }

    pub fn filled_cells(&self) -> u32 {
        self.cols.iter().map(|col| col.count_ones()).sum()
    }

    pub fn column_bits(&self, x: usize) -> u64 {
        self.cols.get(x).copied().unwrap_or(0)
    }

    /// Column-major `[10, 64]` occupancy as floats.
    pub fn features(&self) -> [f32; BOARD_CELLS] {
        let mut out = [0.0; BOARD_CELLS];
        self.write_features(&mut out, BOARD_HEIGHT);
        out
    }

    /// Column-major occupancy of the lowest `rows` rows of every column.
    pub fn features_truncated(&self, rows: usize) -> Vec<f32> {
        let rows = rows.min(BOARD_HEIGHT);
        let mut out = vec![0.0; BOARD_WIDTH * rows];
        self.write_features(&mut out, rows);
        out
    }

    fn write_features(&self, out: &mut [f32], rows: usize) {
        debug_assert_eq!(out.len(), BOARD_WIDTH * rows);
        for (x, col) in self.cols.iter().enumerate() {
            let base = x * rows;
            for y in 0..rows {
                if col & (1u64 << y) != 0 {
                    out[base + y] = 1.0;
                }
            }
        }
    }
}

impl TryFrom<Vec<Vec<bool>>> for Board {
    type Error = InvalidReplay;

    fn try_from(columns: Vec<Vec<bool>>) -> Result<Self, Self::Error> {
        if columns.len() != BOARD_WIDTH {
            return Err(InvalidReplay::BoardWidth(columns.len()));
        }
        let mut board = Board::new();
        for (x, column) in columns.iter().enumerate() {
            if column.len() > BOARD_HEIGHT {
                return Err(InvalidReplay::BoardHeight {
                    column: x,
                    height: column.len(),
                });
            }
            for (y, filled) in column.iter().enumerate() {
                if *filled {
                    board.cols[x] |= 1u64 << y;
                }
            }
        }
        Ok(board)
    }
}

impl From<Board> for Vec<Vec<bool>> {
    fn from(board: Board) -> Self {
        board
            .cols
            .iter()
            .map(|col| (0..BOARD_HEIGHT).map(|y| col & (1u64 << y) != 0).collect())
            .collect()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let top = self.max_height().max(1) as usize;
        for y in (0..top).rev() {
            for x in 0..BOARD_WIDTH {
                let glyph = if self.cols[x] & (1u64 << y) != 0 {
                    '#'
                } else {
                    '.'
                };
                write!(f, "{glyph}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

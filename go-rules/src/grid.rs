use arrayvec::ArrayVec;
use serde::{Deserialize, Serialize};

use crate::Point;
use crate::error::GoError;

pub const MIN_BOARD_SIZE: u8 = 2;
pub const MAX_BOARD_SIZE: u8 = 25;

/// Column letters used by GTP vertices. `I` is skipped.
const COLUMN_LETTERS: &[u8] = b"ABCDEFGHJKLMNOPQRSTUVWXYZ";

/// Geometry of the board: dimensions, adjacency and point/index conversion.
///
/// Points are `(col, row)` with `(0, 0)` in the top-left corner. GTP vertices
/// count rows from the bottom, so `(0, rows - 1)` is `A1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    cols: u8,
    rows: u8,
}

impl Grid {
    pub fn new(cols: u8, rows: u8) -> Result<Self, GoError> {
        let valid = MIN_BOARD_SIZE..=MAX_BOARD_SIZE;
        if !valid.contains(&cols) || !valid.contains(&rows) {
            return Err(GoError::InvalidBoardSize { cols, rows });
        }
        Ok(Grid { cols, rows })
    }

    pub fn square(size: u8) -> Result<Self, GoError> {
        Self::new(size, size)
    }

    pub fn cols(&self) -> u8 {
        self.cols
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    pub fn is_square(&self) -> bool {
        self.cols == self.rows
    }

    pub fn area(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    pub fn on_board(&self, (col, row): Point) -> bool {
        col < self.cols && row < self.rows
    }

    pub fn check(&self, point: Point) -> Result<Point, GoError> {
        if self.on_board(point) {
            Ok(point)
        } else {
            Err(GoError::NotOnBoard(point))
        }
    }

    #[inline]
    pub fn index(&self, (col, row): Point) -> usize {
        row as usize * self.cols as usize + col as usize
    }

    #[inline]
    pub fn point(&self, index: usize) -> Point {
        let cols = self.cols as usize;
        ((index % cols) as u8, (index / cols) as u8)
    }

    /// All points in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> + use<> {
        let (cols, rows) = (self.cols, self.rows);
        (0..rows).flat_map(move |row| (0..cols).map(move |col| (col, row)))
    }

    /// The 4-connected neighbors that are on the board.
    pub fn neighbors(&self, (col, row): Point) -> ArrayVec<Point, 4> {
        let mut result = ArrayVec::new();
        if col > 0 {
            result.push((col - 1, row));
        }
        if col + 1 < self.cols {
            result.push((col + 1, row));
        }
        if row > 0 {
            result.push((col, row - 1));
        }
        if row + 1 < self.rows {
            result.push((col, row + 1));
        }
        result
    }

    /// GTP vertex name, e.g. `D4`.
    pub fn vertex(&self, (col, row): Point) -> String {
        let letter = COLUMN_LETTERS[col as usize] as char;
        format!("{}{}", letter, self.rows - row)
    }

    /// Parses a GTP vertex name. Case-insensitive; `pass` is not a vertex.
    pub fn parse_vertex(&self, text: &str) -> Option<Point> {
        let text = text.trim();
        let mut chars = text.chars();
        let letter = chars.next()?.to_ascii_uppercase();
        let col = COLUMN_LETTERS.iter().position(|&c| c as char == letter)?;
        let number: u8 = chars.as_str().parse().ok()?;
        if number == 0 || number > self.rows {
            return None;
        }
        let point = (u8::try_from(col).ok()?, self.rows - number);
        self.on_board(point).then_some(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsupported_sizes() {
        assert!(Grid::new(1, 9).is_err());
        assert!(Grid::new(9, 26).is_err());
        assert_eq!(
            Grid::new(0, 0),
            Err(GoError::InvalidBoardSize { cols: 0, rows: 0 })
        );
        assert!(Grid::new(5, 3).is_ok());
    }

    #[test]
    fn index_round_trip() {
        let grid = Grid::new(5, 3).unwrap();
        for point in grid.points() {
            assert_eq!(grid.point(grid.index(point)), point);
        }
        assert_eq!(grid.points().count(), 15);
    }

    #[test]
    fn corner_edge_and_center_neighbors() {
        let grid = Grid::square(9).unwrap();
        assert_eq!(grid.neighbors((0, 0)).len(), 2);
        assert_eq!(grid.neighbors((4, 0)).len(), 3);
        assert_eq!(grid.neighbors((4, 4)).len(), 4);
        assert!(grid.neighbors((8, 8)).contains(&(7, 8)));
    }

    #[test]
    fn vertices_skip_i_and_count_from_bottom() {
        let grid = Grid::square(19).unwrap();
        assert_eq!(grid.vertex((0, 18)), "A1");
        assert_eq!(grid.vertex((8, 0)), "J19");
        assert_eq!(grid.vertex((3, 15)), "D4");
        assert_eq!(grid.parse_vertex("d4"), Some((3, 15)));
        assert_eq!(grid.parse_vertex("J19"), Some((8, 0)));
        assert_eq!(grid.parse_vertex("I5"), None);
        assert_eq!(grid.parse_vertex("A20"), None);
        assert_eq!(grid.parse_vertex("pass"), None);
    }
}

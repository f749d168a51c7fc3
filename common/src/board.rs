//! Board geometry and the minefield that holds the true mine layout.

use std::collections::BTreeSet;
use std::fmt::Write;

use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A (row, column) coordinate on the board.
///
/// Ordered by row, then column, so sets of cells iterate top-left first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell { row, col }
    }
}

/// Board dimensions. Bounds every neighbour enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardSize {
    pub height: usize,
    pub width: usize,
}

impl BoardSize {
    pub const fn new(height: usize, width: usize) -> Self {
        BoardSize { height, width }
    }

    pub fn area(&self) -> usize {
        self.height * self.width
    }

    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.height && cell.col < self.width
    }

    /// Every cell on the board in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + use<> {
        (0..self.height)
            .cartesian_product(0..self.width)
            .map(Cell::from)
    }

    /// The in-bounds cells adjacent to `cell`, diagonals included.
    /// Corners have 3 neighbours, edges 5, interior cells 8.
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + use<> {
        let (height, width) = (self.height as isize, self.width as isize);
        (-1isize..=1)
            .cartesian_product(-1isize..=1)
            .filter(|&(dr, dc)| dr != 0 || dc != 0)
            .filter_map(move |(dr, dc)| {
                let row = cell.row as isize + dr;
                let col = cell.col as isize + dc;
                (row >= 0 && row < height && col >= 0 && col < width)
                    .then(|| Cell::new(row as usize, col as usize))
            })
    }

    pub(crate) fn check(&self, cell: Cell) -> Result<Cell> {
        if self.contains(cell) {
            Ok(cell)
        } else {
            Err(Error::OutOfBounds { cell, size: *self })
        }
    }
}

/// The board the agent plays against: knows where the mines are and answers
/// neighbour-count queries truthfully.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minefield {
    size: BoardSize,
    mines: BTreeSet<Cell>,
    /// Mines the player has flagged so far.
    mines_found: BTreeSet<Cell>,
}

impl Minefield {
    /// Places exactly `mines` mines uniformly at random.
    pub fn random<R: Rng + ?Sized>(size: BoardSize, mines: usize, rng: &mut R) -> Result<Self> {
        if size.area() == 0 {
            return Err(Error::EmptyBoard);
        }
        if mines >= size.area() {
            return Err(Error::TooManyMines {
                mines,
                area: size.area(),
            });
        }

        let mines = rand::seq::index::sample(rng, size.area(), mines)
            .into_iter()
            .map(|index| Cell::new(index / size.width, index % size.width))
            .collect();

        Ok(Minefield {
            size,
            mines,
            mines_found: BTreeSet::new(),
        })
    }

    /// Builds a fixed layout.
    pub fn from_mines(size: BoardSize, mines: impl IntoIterator<Item = Cell>) -> Result<Self> {
        if size.area() == 0 {
            return Err(Error::EmptyBoard);
        }
        let mines = mines
            .into_iter()
            .map(|cell| size.check(cell))
            .collect::<Result<BTreeSet<_>>>()?;
        if mines.len() >= size.area() {
            return Err(Error::TooManyMines {
                mines: mines.len(),
                area: size.area(),
            });
        }

        Ok(Minefield {
            size,
            mines,
            mines_found: BTreeSet::new(),
        })
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    pub fn mines(&self) -> &BTreeSet<Cell> {
        &self.mines
    }

    pub fn mines_found(&self) -> &BTreeSet<Cell> {
        &self.mines_found
    }

    pub fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }

    /// Number of mines among the neighbours of `cell`, not counting the cell itself.
    pub fn nearby_mines(&self, cell: Cell) -> u8 {
        self.size
            .neighbors(cell)
            .filter(|neighbor| self.is_mine(*neighbor))
            .count() as u8
    }

    /// Records a mine found by the player.
    pub fn flag(&mut self, cell: Cell) {
        self.mines_found.insert(cell);
    }

    /// All mines have been flagged.
    pub fn won(&self) -> bool {
        self.mines_found == self.mines
    }

    /// Text grid of the true layout, `X` marking mines.
    pub fn render(&self) -> String {
        let rule = format!("{}-\n", "--".repeat(self.size.width));
        let mut out = String::new();
        for row in 0..self.size.height {
            out.push_str(&rule);
            for col in 0..self.size.width {
                let mark = if self.is_mine(Cell::new(row, col)) { 'X' } else { ' ' };
                let _ = write!(out, "|{mark}");
            }
            out.push_str("|\n");
        }
        out.push_str(&rule);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_neighbor_counts() {
        let size = BoardSize::new(3, 3);
        assert_eq!(size.neighbors(Cell::new(0, 0)).count(), 3);
        assert_eq!(size.neighbors(Cell::new(1, 1)).count(), 8);
        assert_eq!(size.neighbors(Cell::new(0, 1)).count(), 5);
        assert!(size.neighbors(Cell::new(1, 1)).all(|c| c != Cell::new(1, 1)));
    }

    #[test]
    fn test_neighbors_on_a_single_row() {
        let size = BoardSize::new(1, 4);
        let neighbors: Vec<Cell> = size.neighbors(Cell::new(0, 1)).collect();
        assert_eq!(neighbors, vec![Cell::new(0, 0), Cell::new(0, 2)]);
    }

    #[test]
    fn test_cells_are_row_major() {
        let size = BoardSize::new(2, 3);
        let cells: Vec<Cell> = size.cells().collect();
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], Cell::new(0, 0));
        assert_eq!(cells[3], Cell::new(1, 0));
        assert!(cells.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_random_places_exact_mine_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let field = Minefield::random(BoardSize::new(8, 8), 10, &mut rng).unwrap();
        assert_eq!(field.mines().len(), 10);
        assert!(field.mines().iter().all(|c| field.size().contains(*c)));
    }

    #[test]
    fn test_random_rejects_full_board() {
        let mut rng = StdRng::seed_from_u64(7);
        let err = Minefield::random(BoardSize::new(3, 3), 9, &mut rng).unwrap_err();
        assert_eq!(err, Error::TooManyMines { mines: 9, area: 9 });
        let err = Minefield::random(BoardSize::new(0, 3), 0, &mut rng).unwrap_err();
        assert_eq!(err, Error::EmptyBoard);
    }

    #[test]
    fn test_from_mines_rejects_out_of_bounds() {
        let err = Minefield::from_mines(BoardSize::new(2, 2), [Cell::new(2, 0)]).unwrap_err();
        assert!(matches!(err, Error::OutOfBounds { .. }));
    }

    #[test]
    fn test_nearby_mines() {
        let field = Minefield::from_mines(
            BoardSize::new(3, 3),
            [Cell::new(0, 0), Cell::new(0, 1)],
        )
        .unwrap();
        assert_eq!(field.nearby_mines(Cell::new(1, 1)), 2);
        assert_eq!(field.nearby_mines(Cell::new(0, 0)), 1);
        assert_eq!(field.nearby_mines(Cell::new(2, 2)), 0);
    }

    #[test]
    fn test_won_once_every_mine_is_flagged() {
        let mut field =
            Minefield::from_mines(BoardSize::new(2, 2), [Cell::new(0, 0), Cell::new(1, 1)])
                .unwrap();
        assert!(!field.won());
        field.flag(Cell::new(0, 0));
        assert!(!field.won());
        field.flag(Cell::new(1, 1));
        assert!(field.won());
    }

    #[test]
    fn test_render() {
        let field = Minefield::from_mines(BoardSize::new(1, 2), [Cell::new(0, 1)]).unwrap();
        assert_eq!(field.render(), "-----\n| |X|\n-----\n");
    }
}

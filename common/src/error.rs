//! Error types for the minesweeper agent.

use thiserror::Error;

use crate::board::{BoardSize, Cell};

/// Errors surfaced to callers of the agent, the board and the game driver.
///
/// Inconsistencies found while inferring are not errors: they are logged and
/// the offending knowledge is dropped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// Every cell that is neither played nor a known mine has been used up.
    /// The caller should have declared the game won before asking again.
    #[error("no unplayed cell is left that is not a known mine")]
    Exhausted,

    #[error("cell ({}, {}) is outside the {}x{} board", cell.row, cell.col, size.height, size.width)]
    OutOfBounds { cell: Cell, size: BoardSize },

    #[error("{mines} mines do not fit on a board of {area} cells (at least one cell must be safe)")]
    TooManyMines { mines: usize, area: usize },

    #[error("board dimensions must be non-zero")]
    EmptyBoard,

    #[error("game already over")]
    GameOver,
}

pub type Result<T> = std::result::Result<T, Error>;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::Cell;

/// A logical statement about the board: exactly `count` of `cells` are mines.
///
/// `cells` only ever shrinks, as its members become known mines or known
/// safe cells. Equality is structural, so two sentences over the same cells
/// with the same count are the same fact however they were derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Sentence {
    cells: BTreeSet<Cell>,
    count: usize,
}

/// Raised when an update leaves a sentence claiming fewer than zero mines,
/// or more mines than it has cells. Only reachable on inconsistent clues.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("contradictory sentence {sentence}: {reason}")]
pub struct Contradiction {
    pub sentence: String,
    pub reason: &'static str,
}

impl Contradiction {
    fn new(sentence: &Sentence, reason: &'static str) -> Self {
        Contradiction {
            sentence: sentence.to_string(),
            reason,
        }
    }
}

impl Sentence {
    pub fn new(cells: impl IntoIterator<Item = Cell>, count: usize) -> Self {
        Sentence {
            cells: cells.into_iter().collect(),
            count,
        }
    }

    pub fn cells(&self) -> &BTreeSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn is_consistent(&self) -> bool {
        self.count <= self.cells.len()
    }

    /// If every remaining cell must be a mine, all of them; otherwise none.
    pub fn known_mines(&self) -> BTreeSet<Cell> {
        if self.count > 0 && self.cells.len() == self.count {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// If no remaining cell can be a mine, all of them; otherwise none.
    pub fn known_safe(&self) -> BTreeSet<Cell> {
        if self.count == 0 {
            self.cells.clone()
        } else {
            BTreeSet::new()
        }
    }

    /// Removes a cell known to be a mine, accounting for it in `count`.
    /// No-op when the cell is not part of this sentence.
    pub fn mark_mine(&mut self, cell: Cell) -> Result<(), Contradiction> {
        if !self.cells.remove(&cell) {
            return Ok(());
        }
        match self.count.checked_sub(1) {
            Some(count) => {
                self.count = count;
                Ok(())
            }
            None => Err(Contradiction::new(self, "a mine among cells claimed safe")),
        }
    }

    /// Removes a cell known to be safe. No-op when the cell is absent.
    pub fn mark_safe(&mut self, cell: Cell) -> Result<(), Contradiction> {
        if self.cells.remove(&cell) && !self.is_consistent() {
            return Err(Contradiction::new(self, "more mines than cells"));
        }
        Ok(())
    }

    /// Subset inference. When `subset.cells` is a strict subset of
    /// `self.cells`, the cells outside it must hold the remaining mines:
    /// `{self - subset} = self.count - subset.count`.
    ///
    /// Returns `None` when `subset` is not a strict subset.
    pub fn subtract(&self, subset: &Sentence) -> Option<Result<Sentence, Contradiction>> {
        if subset.cells.len() >= self.cells.len() || !subset.cells.is_subset(&self.cells) {
            return None;
        }

        let cells: BTreeSet<Cell> = self.cells.difference(&subset.cells).copied().collect();
        let derived = match self.count.checked_sub(subset.count) {
            Some(count) => Sentence { cells, count },
            None => {
                return Some(Err(Contradiction {
                    sentence: format!("{self} minus {subset}"),
                    reason: "negative mine count",
                }));
            }
        };

        if derived.is_consistent() {
            Some(Ok(derived))
        } else {
            Some(Err(Contradiction::new(&derived, "more mines than cells")))
        }
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "({}, {})", cell.row, cell.col)?;
        }
        write!(f, "}} = {}", self.count)
    }
}

use rand::Rng;
use rand::prelude::IndexedRandom;

use crate::board::Cell;
use crate::error::{Error, Result};
use crate::knowledge::KnowledgeBase;

/// Picks the next cell to play from what the knowledge base has proven.
/// Never mutates the knowledge base.
pub struct MoveSelector<'a> {
    knowledge: &'a KnowledgeBase,
}

impl<'a> MoveSelector<'a> {
    pub fn new(knowledge: &'a KnowledgeBase) -> Self {
        MoveSelector { knowledge }
    }

    /// The lowest (row, then column) cell proven safe and not yet played.
    pub fn safe_move(&self) -> Option<Cell> {
        self.knowledge
            .safes()
            .difference(self.knowledge.moves_made())
            .next()
            .copied()
    }

    /// Cells that are neither played nor known to be mines, in row-major order.
    pub fn candidates(&self) -> Vec<Cell> {
        let kb = self.knowledge;
        kb.size()
            .cells()
            .filter(|cell| !kb.moves_made().contains(cell) && !kb.mines().contains(cell))
            .collect()
    }

    /// A uniformly random cell among the candidates. The same `rng` state
    /// always picks the same cell.
    pub fn random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Cell> {
        self.candidates()
            .choose(rng)
            .copied()
            .ok_or(Error::Exhausted)
    }
}

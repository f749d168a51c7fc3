use std::collections::BTreeSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::board::{BoardSize, Cell};
use crate::error::Result;
use crate::knowledge::KnowledgeBase;
use crate::selector::MoveSelector;

/// The player. Turns clues from the board into knowledge and knowledge into
/// moves.
///
/// Randomness is passed in per call, so an agent holds no state besides what
/// it knows and can be serialized whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    knowledge: KnowledgeBase,
}

impl Agent {
    pub fn new(size: BoardSize) -> Self {
        Agent {
            knowledge: KnowledgeBase::new(size),
        }
    }

    pub fn size(&self) -> BoardSize {
        self.knowledge.size()
    }

    /// Records that `cell` was played safely and that `count` of its
    /// neighbours are mines. Call once per revealed cell.
    pub fn add_knowledge(&mut self, cell: Cell, count: u8) {
        self.knowledge.add_knowledge(cell, count.into());
    }

    /// A cell known to be safe that has not been played yet, if any.
    pub fn make_safe_move(&self) -> Option<Cell> {
        MoveSelector::new(&self.knowledge).safe_move()
    }

    /// A random cell that is neither played nor a known mine.
    ///
    /// Fails with [`Error::Exhausted`](crate::Error::Exhausted) once no such
    /// cell remains.
    pub fn make_random_move<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Cell> {
        MoveSelector::new(&self.knowledge).random_move(rng)
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn safes(&self) -> &BTreeSet<Cell> {
        self.knowledge.safes()
    }

    pub fn mines(&self) -> &BTreeSet<Cell> {
        self.knowledge.mines()
    }

    pub fn moves_made(&self) -> &BTreeSet<Cell> {
        self.knowledge.moves_made()
    }
}

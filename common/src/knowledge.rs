//! The knowledge base: sentences about the board plus the facts they imply.

use std::collections::{BTreeSet, HashSet};
use std::mem;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::board::{BoardSize, Cell};
use crate::sentence::{Contradiction, Sentence};

/// Upper bound on inference passes per board cell. Reaching it means the
/// fixed-point loop stopped converging, which is a bug, not bad input.
const MAX_PASSES_PER_CELL: usize = 4;

/// Everything the agent knows: the sentences gathered from revealed cells,
/// and the cells proven safe, proven to be mines, or already played.
///
/// Invariants, restored at the end of every public operation:
/// - `safes` and `mines` are disjoint
/// - no sentence mentions a cell in `safes` or `mines`
/// - every sentence has `count <= cells.len()`
/// - every played cell is in `safes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    size: BoardSize,
    sentences: Vec<Sentence>,
    moves_made: BTreeSet<Cell>,
    safes: BTreeSet<Cell>,
    mines: BTreeSet<Cell>,
}

impl KnowledgeBase {
    pub fn new(size: BoardSize) -> Self {
        KnowledgeBase {
            size,
            sentences: Vec::new(),
            moves_made: BTreeSet::new(),
            safes: BTreeSet::new(),
            mines: BTreeSet::new(),
        }
    }

    pub fn size(&self) -> BoardSize {
        self.size
    }

    pub fn sentences(&self) -> &[Sentence] {
        &self.sentences
    }

    pub fn moves_made(&self) -> &BTreeSet<Cell> {
        &self.moves_made
    }

    pub fn safes(&self) -> &BTreeSet<Cell> {
        &self.safes
    }

    pub fn mines(&self) -> &BTreeSet<Cell> {
        &self.mines
    }

    /// Records `cell` as a mine and removes it from every sentence.
    ///
    /// Returns whether this was a new fact. A cell already proven safe is
    /// refused: that can only come from inconsistent clues.
    pub fn mark_mine(&mut self, cell: Cell) -> bool {
        if self.mines.contains(&cell) {
            return false;
        }
        if self.safes.contains(&cell) {
            tracing::warn!(row = cell.row, col = cell.col, "refusing to mark a safe cell as a mine");
            return false;
        }

        tracing::debug!(row = cell.row, col = cell.col, "found mine");
        self.mines.insert(cell);
        self.update_sentences(|sentence| sentence.mark_mine(cell));
        true
    }

    /// Records `cell` as safe and removes it from every sentence.
    ///
    /// Returns whether this was a new fact. A cell already proven to be a
    /// mine is refused.
    pub fn mark_safe(&mut self, cell: Cell) -> bool {
        if self.safes.contains(&cell) {
            return false;
        }
        if self.mines.contains(&cell) {
            tracing::warn!(row = cell.row, col = cell.col, "refusing to mark a mine as safe");
            return false;
        }

        tracing::trace!(row = cell.row, col = cell.col, "found safe cell");
        self.safes.insert(cell);
        self.update_sentences(|sentence| sentence.mark_safe(cell));
        true
    }

    /// Takes in the clue revealed by playing `cell`: `count` of its
    /// neighbours are mines. Runs inference to a fixed point before
    /// returning.
    pub fn add_knowledge(&mut self, cell: Cell, count: usize) {
        tracing::debug!(row = cell.row, col = cell.col, count, "adding knowledge");

        self.moves_made.insert(cell);
        // The board just revealed it, so it is safe whatever we believed.
        if self.mines.remove(&cell) {
            tracing::warn!(row = cell.row, col = cell.col, "played cell was believed to be a mine");
        }
        self.mark_safe(cell);

        if let Some(sentence) = self.neighbor_sentence(cell, count) {
            self.sentences.push(sentence);
        }

        self.infer();

        debug_assert!(
            self.check_invariants().is_empty(),
            "knowledge base invariants violated: {:?}",
            self.check_invariants()
        );
    }

    /// The sentence for a fresh clue, over the neighbours that are still
    /// unresolved. Neighbours already known to be mines are taken out of the
    /// count.
    fn neighbor_sentence(&self, cell: Cell, count: usize) -> Option<Sentence> {
        let (mines, unresolved): (Vec<Cell>, Vec<Cell>) = self
            .size
            .neighbors(cell)
            .filter(|n| !self.moves_made.contains(n) && !self.safes.contains(n))
            .partition(|n| self.mines.contains(n));

        let Some(remaining) = count.checked_sub(mines.len()) else {
            tracing::warn!(
                row = cell.row,
                col = cell.col,
                count,
                known_mines = mines.len(),
                "clue is lower than the mines already known around it, ignoring it"
            );
            return None;
        };

        let sentence = Sentence::new(unresolved, remaining);
        if !sentence.is_consistent() {
            tracing::warn!(%sentence, "clue is higher than the unresolved neighbours, ignoring it");
            return None;
        }
        if sentence.is_empty() {
            return None;
        }
        Some(sentence)
    }

    /// Applies every rule until a full pass learns nothing new.
    fn infer(&mut self) {
        let max_passes = MAX_PASSES_PER_CELL * self.size.area().max(1);
        for pass in 1..=max_passes {
            if !self.inference_pass() {
                tracing::trace!(
                    pass,
                    sentences = self.sentences.len(),
                    mines = self.mines.len(),
                    safes = self.safes.len(),
                    "reached fixed point"
                );
                return;
            }
        }

        tracing::error!(max_passes, sentences = self.sentences.len(), "inference did not converge");
        panic!("inference did not reach a fixed point within {max_passes} passes");
    }

    /// One pass over the knowledge base. Returns whether anything new was
    /// learned: a mine, a safe cell or a derived sentence.
    fn inference_pass(&mut self) -> bool {
        let mut changed = false;

        let mines: BTreeSet<Cell> = self.sentences.iter().flat_map(Sentence::known_mines).collect();
        for cell in mines {
            changed |= self.mark_mine(cell);
        }

        let safes: BTreeSet<Cell> = self.sentences.iter().flat_map(Sentence::known_safe).collect();
        for cell in safes {
            changed |= self.mark_safe(cell);
        }

        self.prune();

        let derived = self.derive_from_subsets();
        if !derived.is_empty() {
            tracing::trace!(count = derived.len(), "derived sentences from subsets");
            self.sentences.extend(derived);
            changed = true;
        }

        changed
    }

    /// Drops sentences with no cells left and exact duplicates.
    fn prune(&mut self) {
        self.sentences.retain(|sentence| {
            if !sentence.is_empty() {
                return true;
            }
            if sentence.count() != 0 {
                tracing::warn!(%sentence, "empty sentence still claims mines");
            }
            false
        });

        self.sentences = mem::take(&mut self.sentences).into_iter().unique().collect();
    }

    /// For every pair where one sentence's cells are a strict subset of the
    /// other's, the difference. Only sentences not already known are returned.
    fn derive_from_subsets(&self) -> Vec<Sentence> {
        let known: HashSet<&Sentence> = self.sentences.iter().collect();

        self.sentences
            .iter()
            .tuple_combinations::<(_, _)>()
            .flat_map(|(a, b)| [a.subtract(b), b.subtract(a)])
            .flatten()
            .filter_map(|derived| match derived {
                Ok(sentence) => Some(sentence),
                Err(contradiction) => {
                    tracing::warn!(%contradiction, "discarding derived sentence");
                    None
                }
            })
            .filter(|sentence| !sentence.is_empty() && !known.contains(sentence))
            .unique()
            .collect()
    }

    /// Applies `update` to every sentence, dropping the ones it finds
    /// contradictory.
    fn update_sentences(&mut self, mut update: impl FnMut(&mut Sentence) -> Result<(), Contradiction>) {
        self.sentences.retain_mut(|sentence| match update(sentence) {
            Ok(()) => true,
            Err(contradiction) => {
                tracing::warn!(%contradiction, "dropping sentence");
                false
            }
        });
    }

    /// Describes every violated invariant. Empty when the knowledge base is sound.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for cell in self.safes.intersection(&self.mines) {
            violations.push(format!("({}, {}) is both safe and a mine", cell.row, cell.col));
        }
        for cell in self.moves_made.difference(&self.safes) {
            violations.push(format!("played cell ({}, {}) is not marked safe", cell.row, cell.col));
        }
        for sentence in &self.sentences {
            if !sentence.is_consistent() {
                violations.push(format!("{sentence} has more mines than cells"));
            }
            if let Some(cell) = sentence
                .cells()
                .iter()
                .find(|cell| self.safes.contains(cell) || self.mines.contains(cell))
            {
                violations.push(format!(
                    "{sentence} still mentions resolved cell ({}, {})",
                    cell.row, cell.col
                ));
            }
        }

        violations
    }
}

//! Exhaustive entailment check backed by a SAT solver.
//!
//! The agent's rules are incomplete by design, so the oracle is not a
//! player: it answers, for every hidden cell, whether the clues revealed so
//! far force it to be a mine, force it to be safe, or leave it open. Any fact
//! the agent holds must be one the oracle can prove.

use std::collections::{BTreeMap, HashMap};

use itertools::Itertools;
use varisat::{CnfFormula, ExtendFormula, Lit, Solver, Var};

use crate::board::{BoardSize, Cell};

/// Constraints with at most this many literals are encoded by enumerating
/// combinations; larger ones use a sequential counter.
const NAIVE_ENCODING_LIMIT: usize = 10;

/// What the clues say about one hidden cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeducedState {
    /// Every layout consistent with the clues has a mine here.
    ForcedMine,
    /// No layout consistent with the clues has a mine here.
    ForcedSafe,
    /// Consistent layouts exist either way.
    Undetermined,
}

/// The revealed clues of one board, ready for analysis.
#[derive(Debug, Clone)]
pub struct Oracle {
    size: BoardSize,
    clues: BTreeMap<Cell, u8>,
    total_mines: Option<usize>,
}

impl Oracle {
    pub fn new(size: BoardSize) -> Self {
        Oracle {
            size,
            clues: BTreeMap::new(),
            total_mines: None,
        }
    }

    /// Also require the hidden cells to hold exactly `total` mines.
    pub fn with_total_mines(mut self, total: usize) -> Self {
        self.total_mines = Some(total);
        self
    }

    /// A revealed, safe `cell` with `count` mines around it.
    pub fn add_clue(&mut self, cell: Cell, count: u8) {
        self.clues.insert(cell, count);
    }

    pub fn with_clues(mut self, clues: impl IntoIterator<Item = (Cell, u8)>) -> Self {
        self.clues.extend(clues);
        self
    }

    /// Deduces the state of every hidden cell. Fails if no mine layout
    /// satisfies the clues.
    pub fn analyze(&self) -> anyhow::Result<BTreeMap<Cell, DeducedState>> {
        let mut formula = CnfFormula::new();

        // One variable per hidden cell; true means mine.
        let vars: HashMap<Cell, Var> = self
            .size
            .cells()
            .filter(|cell| !self.clues.contains_key(cell))
            .map(|cell| (cell, formula.new_var()))
            .collect();
        let mine = |cell: &Cell| vars.get(cell).map(|&var| Lit::from_var(var, true));

        for (&cell, &count) in &self.clues {
            let lits: Vec<Lit> = self.size.neighbors(cell).filter_map(|n| mine(&n)).collect();
            exactly(&mut formula, &lits, count.into());
        }

        if let Some(total) = self.total_mines {
            let lits: Vec<Lit> = self.size.cells().filter_map(|cell| mine(&cell)).collect();
            exactly(&mut formula, &lits, total);
        }

        let mut solver = Solver::new();
        solver.add_formula(&formula);

        if !solver.solve()? {
            anyhow::bail!("clues are inconsistent: no mine layout satisfies them");
        }

        let mut deductions = BTreeMap::new();
        for (&cell, &var) in &vars {
            let as_mine = Lit::from_var(var, true);
            let can_be_mine = satisfiable_with(&mut solver, as_mine)?;
            let can_be_safe = satisfiable_with(&mut solver, !as_mine)?;

            let state = match (can_be_mine, can_be_safe) {
                (true, true) => DeducedState::Undetermined,
                (true, false) => DeducedState::ForcedMine,
                (false, true) => DeducedState::ForcedSafe,
                (false, false) => anyhow::bail!("cell ({}, {}) can be neither", cell.row, cell.col),
            };
            deductions.insert(cell, state);
        }

        Ok(deductions)
    }
}

fn satisfiable_with(solver: &mut Solver, assumption: Lit) -> anyhow::Result<bool> {
    solver.assume(&[assumption]);
    let result = solver.solve();
    solver.assume(&[]);
    Ok(result?)
}

/// Exactly `k` of `lits` are true.
fn exactly(formula: &mut CnfFormula, lits: &[Lit], k: usize) {
    at_most(formula, lits, k);
    at_least(formula, lits, k);
}

fn at_most(formula: &mut CnfFormula, lits: &[Lit], k: usize) {
    if k >= lits.len() {
        return;
    }
    if k == 0 {
        for &lit in lits {
            formula.add_clause(&[!lit]);
        }
        return;
    }

    if lits.len() <= NAIVE_ENCODING_LIMIT {
        // no k + 1 of them may all be true
        for combo in lits.iter().copied().combinations(k + 1) {
            let clause: Vec<Lit> = combo.into_iter().map(|lit| !lit).collect();
            formula.add_clause(&clause);
        }
    } else {
        sequential_counter(formula, lits, k);
    }
}

fn at_least(formula: &mut CnfFormula, lits: &[Lit], k: usize) {
    if k == 0 {
        return;
    }
    if k > lits.len() {
        formula.add_clause(&[]);
        return;
    }

    // at least k true is at most n - k false
    let negated: Vec<Lit> = lits.iter().map(|&lit| !lit).collect();
    at_most(formula, &negated, lits.len() - k);
}

/// Sinz's sequential counter for "at most k of lits", 0 < k < lits.len().
///
/// `s[i][j]` holds when at least `j + 1` of the first `i + 1` literals are
/// true.
fn sequential_counter(formula: &mut CnfFormula, lits: &[Lit], k: usize) {
    let n = lits.len();
    let s: Vec<Vec<Lit>> = (0..n - 1)
        .map(|_| (0..k).map(|_| formula.new_lit()).collect())
        .collect();

    formula.add_clause(&[!lits[0], s[0][0]]);
    for j in 1..k {
        formula.add_clause(&[!s[0][j]]);
    }

    for i in 1..n - 1 {
        formula.add_clause(&[!lits[i], s[i][0]]);
        formula.add_clause(&[!s[i - 1][0], s[i][0]]);
        for j in 1..k {
            formula.add_clause(&[!lits[i], !s[i - 1][j - 1], s[i][j]]);
            formula.add_clause(&[!s[i - 1][j], s[i][j]]);
        }
        formula.add_clause(&[!lits[i], !s[i - 1][k - 1]]);
    }

    formula.add_clause(&[!lits[n - 1], !s[n - 2][k - 1]]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: usize, col: usize) -> Cell {
        Cell::new(row, col)
    }

    #[test]
    fn test_symmetric_clue_is_undetermined() {
        // 1x3 strip, middle revealed as 1: either end could hold the mine
        let oracle = Oracle::new(BoardSize::new(1, 3)).with_clues([(cell(0, 1), 1)]);
        let deductions = oracle.analyze().unwrap();
        assert_eq!(deductions.len(), 2);
        assert_eq!(deductions[&cell(0, 0)], DeducedState::Undetermined);
        assert_eq!(deductions[&cell(0, 2)], DeducedState::Undetermined);
    }

    #[test]
    fn test_total_mine_count_resolves_more() {
        let oracle = Oracle::new(BoardSize::new(1, 3))
            .with_clues([(cell(0, 1), 0)])
            .with_total_mines(0);
        let deductions = oracle.analyze().unwrap();
        assert!(deductions.values().all(|&s| s == DeducedState::ForcedSafe));
    }

    #[test]
    fn test_forced_mine_and_safe() {
        // 1x4 strip with a mine at (0, 3)
        let oracle = Oracle::new(BoardSize::new(1, 4)).with_clues([(cell(0, 0), 0), (cell(0, 2), 1)]);
        let deductions = oracle.analyze().unwrap();
        assert_eq!(deductions[&cell(0, 1)], DeducedState::ForcedSafe);
        assert_eq!(deductions[&cell(0, 3)], DeducedState::ForcedMine);
    }

    #[test]
    fn test_inconsistent_clues_fail() {
        let oracle = Oracle::new(BoardSize::new(1, 2)).with_clues([(cell(0, 0), 2)]);
        assert!(oracle.analyze().is_err());
    }

    #[test]
    fn test_sequential_counter_matches_naive_encoding() {
        // 4x4 board with no clues and a global count large enough to use the
        // sequential counter: every cell is open
        let oracle = Oracle::new(BoardSize::new(4, 4)).with_total_mines(3);
        let deductions = oracle.analyze().unwrap();
        assert_eq!(deductions.len(), 16);
        assert!(deductions.values().all(|&s| s == DeducedState::Undetermined));

        // one clue of 8 around the centre of a 3x4 board forces the whole ring
        let oracle = Oracle::new(BoardSize::new(3, 4))
            .with_clues([(cell(1, 1), 8)])
            .with_total_mines(8);
        let deductions = oracle.analyze().unwrap();
        for n in BoardSize::new(3, 4).neighbors(cell(1, 1)) {
            assert_eq!(deductions[&n], DeducedState::ForcedMine);
        }
        assert_eq!(deductions[&cell(0, 3)], DeducedState::ForcedSafe);
        assert_eq!(deductions[&cell(2, 3)], DeducedState::ForcedSafe);
    }
}

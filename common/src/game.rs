use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agent::Agent;
use crate::board::{Cell, Minefield};
use crate::config::GameConfig;
use crate::error::{Error, Result};
use crate::oracle::{DeducedState, Oracle};

/// Represents the current state of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Playing,
    Won,
    Lost,
}

/// How the agent came to choose a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Proven safe by inference.
    Safe,
    /// Guessed, for lack of a proven safe cell.
    Random,
}

/// One move played by [`Game::step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub cell: Cell,
    pub kind: MoveKind,
    /// The neighbour count revealed, or `None` if the cell was a mine.
    pub revealed: Option<u8>,
    pub state: GameState,
}

/// An agent playing against a minefield.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    field: Minefield,
    agent: Agent,
    /// Every cell revealed so far with its neighbour count.
    revealed: BTreeMap<Cell, u8>,
    state: GameState,
}

impl Game {
    pub fn new(field: Minefield) -> Self {
        Game {
            agent: Agent::new(field.size()),
            field,
            revealed: BTreeMap::new(),
            state: GameState::Playing,
        }
    }

    /// A game on a random layout drawn from `rng`.
    pub fn from_config<R: Rng + ?Sized>(config: &GameConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;
        Ok(Game::new(Minefield::random(config.size(), config.mines, rng)?))
    }

    pub fn field(&self) -> &Minefield {
        &self.field
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn revealed(&self) -> &BTreeMap<Cell, u8> {
        &self.revealed
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Every cell that is not a mine has been revealed.
    pub fn all_safe_revealed(&self) -> bool {
        self.revealed.len() == self.field.size().area() - self.field.mines().len()
    }

    /// Lets the agent pick a cell (a proven safe one if it has any) and
    /// reveals it.
    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Step> {
        if self.state != GameState::Playing {
            return Err(Error::GameOver);
        }

        let (cell, kind) = match self.agent.make_safe_move() {
            Some(cell) => (cell, MoveKind::Safe),
            None => (self.agent.make_random_move(rng)?, MoveKind::Random),
        };
        tracing::debug!(row = cell.row, col = cell.col, ?kind, "agent moves");

        let revealed = self.reveal_cell(cell)?;
        Ok(Step {
            cell,
            kind,
            revealed,
            state: self.state,
        })
    }

    /// Steps until the game is won or lost.
    pub fn play<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<GameState> {
        while self.state == GameState::Playing {
            self.step(rng)?;
        }
        Ok(self.state)
    }

    /// Reveals `cell`, feeding its clue to the agent. Returns the clue, or
    /// `None` if the cell was a mine and the game is lost.
    ///
    /// Revealing an already revealed cell returns its clue and changes
    /// nothing.
    pub fn reveal_cell(&mut self, cell: Cell) -> Result<Option<u8>> {
        let cell = self.field.size().check(cell)?;
        if let Some(&count) = self.revealed.get(&cell) {
            return Ok(Some(count));
        }
        if self.state != GameState::Playing {
            return Err(Error::GameOver);
        }

        if self.field.is_mine(cell) {
            tracing::info!(row = cell.row, col = cell.col, "hit a mine");
            self.state = GameState::Lost;
            return Ok(None);
        }

        let count = self.field.nearby_mines(cell);
        self.revealed.insert(cell, count);
        self.agent.add_knowledge(cell, count);

        for &mine in self.agent.mines() {
            self.field.flag(mine);
        }

        if self.field.won() || self.all_safe_revealed() {
            tracing::info!(moves = self.revealed.len(), "game won");
            self.state = GameState::Won;
        }

        Ok(Some(count))
    }

    /// Cells the agent claims to know that the revealed clues do not force.
    /// Empty when every deduction so far is sound.
    pub fn audit(&self) -> anyhow::Result<Vec<Cell>> {
        let deductions = Oracle::new(self.field.size())
            .with_clues(self.revealed.iter().map(|(&cell, &count)| (cell, count)))
            .analyze()?;

        let forced = |cell: &Cell, expected: DeducedState| {
            self.revealed.contains_key(cell)
                || deductions.get(cell).is_some_and(|&state| state == expected)
        };

        let unsound: Vec<Cell> = self
            .agent
            .mines()
            .iter()
            .filter(|cell| !forced(*cell, DeducedState::ForcedMine))
            .chain(
                self.agent
                    .safes()
                    .iter()
                    .filter(|cell| !forced(*cell, DeducedState::ForcedSafe)),
            )
            .copied()
            .collect();

        for cell in &unsound {
            tracing::warn!(row = cell.row, col = cell.col, "deduction not entailed by the clues");
        }

        let missed = deductions
            .iter()
            .filter(|(cell, state)| match state {
                DeducedState::ForcedMine => !self.agent.mines().contains(*cell),
                DeducedState::ForcedSafe => !self.agent.safes().contains(*cell),
                DeducedState::Undetermined => false,
            })
            .count();
        tracing::debug!(missed, "facts the clues force that the agent has not found");

        Ok(unsound)
    }

    pub fn to_bytes(&self) -> anyhow::Result<Vec<u8>> {
        Ok(bcs::to_bytes(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        Ok(bcs::from_bytes(bytes)?)
    }
}

//! Game configuration.

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::board::BoardSize;
use crate::error::{Error, Result};

/// Board dimensions, mine count and random seed for one game.
///
/// ```
/// use minesweeper_ai::GameConfig;
///
/// let config = GameConfig::new(16, 16, 40).with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub height: usize,
    pub width: usize,
    pub mines: usize,
    /// Seed for the layout and for random moves. `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            height: 8,
            width: 8,
            mines: 8,
            seed: None,
        }
    }
}

impl GameConfig {
    pub fn new(height: usize, width: usize, mines: usize) -> Self {
        Self {
            height,
            width,
            mines,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn size(&self) -> BoardSize {
        BoardSize::new(self.height, self.width)
    }

    /// The board must be non-empty and keep at least one safe cell.
    pub fn validate(&self) -> Result<()> {
        if self.height == 0 || self.width == 0 {
            return Err(Error::EmptyBoard);
        }
        let area = self.size().area();
        if self.mines >= area {
            return Err(Error::TooManyMines {
                mines: self.mines,
                area,
            });
        }
        Ok(())
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

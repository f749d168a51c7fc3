//! A Minesweeper player that reasons with logical sentences.
//!
//! Every revealed cell yields a sentence "exactly `count` of these cells are
//! mines". The [`KnowledgeBase`] keeps those sentences, resolves cells that a
//! sentence alone decides, and derives new sentences by subtracting one from
//! another whenever its cells are a strict subset. The [`Agent`] plays a cell
//! proven safe when it has one and guesses otherwise.

pub mod agent;
pub mod board;
pub mod config;
pub mod error;
pub mod game;
pub mod knowledge;
pub mod oracle;
pub mod selector;
pub mod sentence;

pub use agent::Agent;
pub use board::{BoardSize, Cell, Minefield};
pub use config::GameConfig;
pub use error::{Error, Result};
pub use game::{Game, GameState, MoveKind, Step};
pub use knowledge::KnowledgeBase;
pub use oracle::{DeducedState, Oracle};
pub use selector::MoveSelector;
pub use sentence::{Contradiction, Sentence};

//! Game engines and algorithm step-log generators behind the minigames panel.
//!
//! Every engine owns its state and is driven by explicit calls: user input
//! maps to a mutator, timers map to a `tick`/`settle` call. Randomness always
//! flows from a caller-provided seed so the same seed replays the same game.

use rand::SeedableRng;

pub use error::*;
pub use playback::*;
pub use types::*;

pub mod pathfinding;
pub mod snake;
pub mod sorting;
pub mod sudoku;
pub mod tictactoe;
pub mod twenty48;

mod error;
mod playback;
mod types;

/// Random generator used by every engine in this crate.
pub type GameRng = rand::rngs::SmallRng;

pub fn seeded_rng(seed: u64) -> GameRng {
    GameRng::seed_from_u64(seed)
}

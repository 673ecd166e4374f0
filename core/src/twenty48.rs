use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

pub const GRID_SIZE: usize = 4;
pub const WINNING_TILE: u32 = 2048;
pub const NEW_TILE_VALUE: u32 = 2;
pub const FOUR_TILE_PROBABILITY: f64 = 0.1;

/// A numbered tile. Ids are unique within a game so the view can animate
/// tiles as they slide; merged tiles get a fresh id.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: u32,
    pub value: u32,
    /// Produced by a merge during the last move.
    pub merged: bool,
    /// Spawned after the last move.
    pub spawned: bool,
}

impl Tile {
    fn settled(self) -> Self {
        Self {
            merged: false,
            spawned: false,
            ..self
        }
    }
}

type Line = [Option<Tile>; GRID_SIZE];

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    #[default]
    Playing,
    /// Waiting for [`Game2048::settle`] to spawn the next tile.
    Sliding,
    Over,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub moved: bool,
    pub score_gained: u32,
    /// The winning tile was formed for the first time by this move.
    pub reached_goal: bool,
}

impl MoveOutcome {
    pub const fn has_update(self) -> bool {
        self.moved
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Game2048 {
    cells: Array2<Option<Tile>>,
    next_id: u32,
    score: u32,
    has_won: bool,
    keep_playing: bool,
    state: GameState,
    #[serde(skip, default = "default_rng")]
    rng: GameRng,
}

fn default_rng() -> GameRng {
    seeded_rng(0)
}

impl Game2048 {
    /// Fresh game with two spawned tiles.
    pub fn new(seed: u64) -> Self {
        let mut game = Self::empty(seed);
        game.spawn_tile();
        game.spawn_tile();
        game
    }

    fn empty(seed: u64) -> Self {
        Self {
            cells: Array2::from_elem((GRID_SIZE, GRID_SIZE), None),
            next_id: 1,
            score: 0,
            has_won: false,
            keep_playing: false,
            state: GameState::Playing,
            rng: seeded_rng(seed),
        }
    }

    /// Builds a game from tile values in row-major order, `0` meaning empty.
    pub fn from_values(values: [[u32; GRID_SIZE]; GRID_SIZE], seed: u64) -> Self {
        let mut game = Self::empty(seed);
        for (row, line) in values.iter().enumerate() {
            for (col, &value) in line.iter().enumerate() {
                if value != 0 {
                    let id = game.take_id();
                    game.cells[[row, col]] = Some(Tile {
                        id,
                        value,
                        merged: false,
                        spawned: false,
                    });
                }
            }
        }
        game
    }

    pub fn tile_at(&self, (row, col): Coord2) -> Option<Tile> {
        self.cells
            .get((row as usize, col as usize))
            .copied()
            .flatten()
    }

    pub fn values(&self) -> [[u32; GRID_SIZE]; GRID_SIZE] {
        let mut out = [[0; GRID_SIZE]; GRID_SIZE];
        for ((row, col), cell) in self.cells.indexed_iter() {
            out[row][col] = cell.map_or(0, |tile| tile.value);
        }
        out
    }

    /// Tiles with their `(row, col)` position, for rendering.
    pub fn tiles(&self) -> impl Iterator<Item = (Coord2, Tile)> + '_ {
        self.cells.indexed_iter().filter_map(|((row, col), cell)| {
            cell.map(|tile| ((row as Coord, col as Coord), tile))
        })
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn has_won(&self) -> bool {
        self.has_won
    }

    /// Won and the player has not chosen to keep going yet.
    pub fn shows_win(&self) -> bool {
        self.has_won && !self.keep_playing
    }

    pub fn continue_after_win(&mut self) -> bool {
        let changed = self.shows_win();
        self.keep_playing = true;
        changed
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_over(&self) -> bool {
        matches!(self.state, GameState::Over)
    }

    pub fn total_value(&self) -> u32 {
        self.cells.iter().flatten().map(|tile| tile.value).sum()
    }

    pub fn highest_tile(&self) -> u32 {
        self.cells
            .iter()
            .flatten()
            .map(|tile| tile.value)
            .max()
            .unwrap_or(0)
    }

    /// Slides and merges every line towards `direction` without spawning.
    /// A no-op move leaves the game untouched.
    pub fn slide(&mut self, direction: Direction) -> Result<MoveOutcome> {
        if self.is_over() {
            return Err(GameError::AlreadyEnded);
        }
        if matches!(self.state, GameState::Sliding) {
            self.settle();
            if self.is_over() {
                return Err(GameError::AlreadyEnded);
            }
        }

        let mut next = self.cells.mapv(|cell| cell.map(Tile::settled));
        let mut outcome = MoveOutcome::default();

        for index in 0..GRID_SIZE {
            let line = read_line(&next, direction, index);
            let (merged, gained, changed) = self.compress_and_merge(line);
            outcome.moved |= changed;
            outcome.score_gained += gained;
            write_line(&mut next, direction, index, merged);
        }

        if !outcome.moved {
            return Ok(outcome);
        }

        if !self.has_won && next.iter().flatten().any(|tile| tile.value >= WINNING_TILE) {
            self.has_won = true;
            outcome.reached_goal = true;
            log::debug!("winning tile reached");
        }

        self.cells = next;
        self.score += outcome.score_gained;
        self.state = GameState::Sliding;
        Ok(outcome)
    }

    /// Spawns the tile owed by the last slide and checks for game over.
    pub fn settle(&mut self) {
        if !matches!(self.state, GameState::Sliding) {
            return;
        }
        self.cells.mapv_inplace(|cell| cell.map(Tile::settled));
        self.spawn_tile();
        self.state = if self.has_moves() {
            GameState::Playing
        } else {
            log::debug!("no moves left, final score {}", self.score);
            GameState::Over
        };
    }

    /// [`Self::slide`] followed by [`Self::settle`] when anything moved.
    pub fn shift(&mut self, direction: Direction) -> Result<MoveOutcome> {
        let outcome = self.slide(direction)?;
        self.settle();
        Ok(outcome)
    }

    pub fn has_moves(&self) -> bool {
        if self.cells.iter().any(Option::is_none) {
            return true;
        }
        let value = |row: usize, col: usize| self.cells[[row, col]].map(|tile| tile.value);
        (0..GRID_SIZE).any(|row| {
            (0..GRID_SIZE).any(|col| {
                (col + 1 < GRID_SIZE && value(row, col) == value(row, col + 1))
                    || (row + 1 < GRID_SIZE && value(row, col) == value(row + 1, col))
            })
        })
    }

    pub fn reset(&mut self) {
        let seed = self.rng.random();
        *self = Self::new(seed);
    }

    fn take_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn spawn_tile(&mut self) -> bool {
        let empty: Vec<(usize, usize)> = self
            .cells
            .indexed_iter()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index)
            .collect();
        if empty.is_empty() {
            return false;
        }

        let index = empty[self.rng.random_range(0..empty.len())];
        let value = if self.rng.random_bool(FOUR_TILE_PROBABILITY) {
            NEW_TILE_VALUE * 2
        } else {
            NEW_TILE_VALUE
        };
        let id = self.take_id();
        self.cells[index] = Some(Tile {
            id,
            value,
            merged: false,
            spawned: true,
        });
        true
    }

    /// Packs tiles to the front of the line, merging equal neighbours once.
    fn compress_and_merge(&mut self, line: Line) -> (Line, u32, bool) {
        let tiles: Vec<Tile> = line.iter().flatten().copied().collect();
        let mut out: Line = [None; GRID_SIZE];
        let mut gained = 0;
        let mut slot = 0;
        let mut i = 0;

        while i < tiles.len() {
            let tile = tiles[i];
            match tiles.get(i + 1) {
                Some(next) if next.value == tile.value => {
                    let value = tile.value * 2;
                    out[slot] = Some(Tile {
                        id: self.take_id(),
                        value,
                        merged: true,
                        spawned: false,
                    });
                    gained += value;
                    i += 2;
                }
                _ => {
                    out[slot] = Some(tile);
                    i += 1;
                }
            }
            slot += 1;
        }

        let values = |line: &Line| line.map(|cell| cell.map(|tile| tile.value));
        let changed = values(&line) != values(&out);
        (out, gained, changed)
    }
}

/// Reads line `index` ordered so that position 0 is the edge tiles move towards.
fn read_line(cells: &Array2<Option<Tile>>, direction: Direction, index: usize) -> Line {
    let mut line: Line = [None; GRID_SIZE];
    for (pos, cell) in line.iter_mut().enumerate() {
        *cell = cells[line_coords(direction, index, pos)];
    }
    line
}

fn write_line(cells: &mut Array2<Option<Tile>>, direction: Direction, index: usize, line: Line) {
    for (pos, cell) in line.into_iter().enumerate() {
        cells[line_coords(direction, index, pos)] = cell;
    }
}

fn line_coords(direction: Direction, index: usize, pos: usize) -> [usize; 2] {
    let last = GRID_SIZE - 1;
    match direction {
        Direction::Left => [index, pos],
        Direction::Right => [index, last - pos],
        Direction::Up => [pos, index],
        Direction::Down => [last - pos, index],
    }
}

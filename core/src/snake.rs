use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnakeConfig {
    pub cols: Coord,
    pub rows: Coord,
    pub tick_ms_start: u32,
    pub tick_ms_min: u32,
    /// Foods eaten between two speed-ups.
    pub speed_up_every: u32,
    pub speed_step_ms: u32,
}

impl SnakeConfig {
    pub const LARGE: Self = Self::with_size(18, 24);
    pub const PREVIEW: Self = Self::with_size(12, 16);

    pub const fn with_size(cols: Coord, rows: Coord) -> Self {
        Self {
            cols,
            rows,
            tick_ms_start: 140,
            tick_ms_min: 70,
            speed_up_every: 5,
            speed_step_ms: 10,
        }
    }

    pub const fn total_cells(&self) -> usize {
        self.cols as usize * self.rows as usize
    }
}

impl Default for SnakeConfig {
    fn default() -> Self {
        Self::LARGE
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SnakeState {
    #[default]
    Ready,
    Running,
    Crashed,
    /// The snake fills the whole board.
    Cleared,
}

impl SnakeState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Crashed | Self::Cleared)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Moved,
    Ate,
    HitWall,
    HitSelf,
    Cleared,
}

impl TickOutcome {
    pub const fn ends_game(self) -> bool {
        matches!(self, Self::HitWall | Self::HitSelf | Self::Cleared)
    }
}

/// Snake positions are `(x, y)` with the origin in the top-left corner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnakeGame {
    config: SnakeConfig,
    /// Head first.
    body: VecDeque<Coord2>,
    food: Option<Coord2>,
    heading: Direction,
    pending: Direction,
    foods_eaten: u32,
    state: SnakeState,
    #[serde(skip, default = "default_rng")]
    rng: GameRng,
}

fn default_rng() -> GameRng {
    seeded_rng(0)
}

impl SnakeGame {
    pub fn new(config: SnakeConfig, seed: u64) -> Self {
        let mut rng = seeded_rng(seed);
        let body = initial_body(&config);
        let food = pick_food(&config, &body, &mut rng);
        Self {
            config,
            body,
            food,
            heading: Direction::Up,
            pending: Direction::Up,
            foods_eaten: 0,
            state: SnakeState::Ready,
            rng,
        }
    }

    pub fn config(&self) -> &SnakeConfig {
        &self.config
    }

    pub fn body(&self) -> impl Iterator<Item = Coord2> + '_ {
        self.body.iter().copied()
    }

    pub fn head(&self) -> Coord2 {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn food(&self) -> Option<Coord2> {
        self.food
    }

    pub fn heading(&self) -> Direction {
        self.heading
    }

    pub fn state(&self) -> SnakeState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    /// One point per food.
    pub fn score(&self) -> u32 {
        self.foods_eaten
    }

    pub fn occupies(&self, coords: Coord2) -> bool {
        self.body.contains(&coords)
    }

    pub fn start(&mut self) {
        if matches!(self.state, SnakeState::Ready) {
            self.state = SnakeState::Running;
        }
    }

    /// Queues a turn for the next tick. Reversing onto the neck is ignored.
    pub fn request_direction(&mut self, direction: Direction) -> bool {
        if self.is_finished() || direction.is_opposite(self.heading) {
            return false;
        }
        let changed = self.pending != direction;
        self.pending = direction;
        changed
    }

    pub fn tick_interval_ms(&self) -> u32 {
        let SnakeConfig {
            tick_ms_start,
            tick_ms_min,
            speed_up_every,
            speed_step_ms,
            ..
        } = self.config;
        let steps = self.foods_eaten / speed_up_every.max(1);
        tick_ms_start
            .saturating_sub(steps.saturating_mul(speed_step_ms))
            .clamp(tick_ms_min, tick_ms_start)
    }

    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.is_finished() {
            return Err(GameError::AlreadyEnded);
        }
        self.start();

        let direction = self.pending;
        let bounds = (self.config.cols, self.config.rows);
        let Some(next) = direction.apply(self.head(), bounds) else {
            self.state = SnakeState::Crashed;
            return Ok(TickOutcome::HitWall);
        };

        let will_eat = self.food == Some(next);
        // The tail cell frees up this tick unless the snake grows.
        let check_len = if will_eat {
            self.body.len()
        } else {
            self.body.len() - 1
        };
        if self.body.iter().take(check_len).any(|&pos| pos == next) {
            self.state = SnakeState::Crashed;
            return Ok(TickOutcome::HitSelf);
        }

        self.heading = direction;
        self.body.push_front(next);
        if !will_eat {
            self.body.pop_back();
            return Ok(TickOutcome::Moved);
        }

        self.foods_eaten += 1;
        self.food = pick_food(&self.config, &self.body, &mut self.rng);
        if self.food.is_none() {
            self.state = SnakeState::Cleared;
            return Ok(TickOutcome::Cleared);
        }
        log::trace!("snake ate, length {}", self.body.len());
        Ok(TickOutcome::Ate)
    }

    pub fn reset(&mut self) {
        let seed = self.rng.random();
        *self = Self::new(self.config, seed);
    }
}

fn initial_body(config: &SnakeConfig) -> VecDeque<Coord2> {
    let cx = config.cols / 2;
    let cy = config.rows / 2;
    (0..3)
        .map(|offset| (cx, cy.saturating_add(offset).min(config.rows.saturating_sub(1))))
        .collect()
}

/// Uniformly random free cell, `None` when the snake covers the board.
fn pick_food(config: &SnakeConfig, body: &VecDeque<Coord2>, rng: &mut GameRng) -> Option<Coord2> {
    let free: Vec<Coord2> = (0..config.rows)
        .flat_map(|y| (0..config.cols).map(move |x| (x, y)))
        .filter(|pos| !body.contains(pos))
        .collect();
    if free.is_empty() {
        return None;
    }
    Some(free[rng.random_range(0..free.len())])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game_with(config: SnakeConfig, body: &[Coord2], food: Option<Coord2>) -> SnakeGame {
        let mut game = SnakeGame::new(config, 0);
        game.body = body.iter().copied().collect();
        game.food = food;
        game
    }

    #[test]
    fn initial_snake_is_centered_and_food_is_free() {
        for seed in 0..200 {
            let game = SnakeGame::new(SnakeConfig::LARGE, seed);
            assert_eq!(game.body().collect::<Vec<_>>(), vec![(9, 12), (9, 13), (9, 14)]);
            let food = game.food().unwrap();
            assert!(!game.occupies(food));
            assert!(food.0 < 18 && food.1 < 24);
        }
    }

    #[test]
    fn moves_up_and_hits_the_wall() {
        let mut game = SnakeGame::new(SnakeConfig::with_size(5, 5), 3);
        game.food = None;
        let mut outcome = game.tick().unwrap();
        assert_eq!(outcome, TickOutcome::Moved);
        assert_eq!(game.head(), (2, 1));
        while outcome == TickOutcome::Moved {
            outcome = game.tick().unwrap();
        }
        assert_eq!(outcome, TickOutcome::HitWall);
        assert_eq!(game.state(), SnakeState::Crashed);
        assert_eq!(game.tick(), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn eating_grows_and_scores() {
        let mut game = game_with(
            SnakeConfig::with_size(6, 6),
            &[(2, 3), (2, 4), (2, 5)],
            Some((2, 2)),
        );
        assert_eq!(game.tick().unwrap(), TickOutcome::Ate);
        assert_eq!(game.len(), 4);
        assert_eq!(game.score(), 1);
        assert!(!game.occupies(game.food().unwrap()));
    }

    #[test]
    fn reversal_is_ignored() {
        let mut game = SnakeGame::new(SnakeConfig::LARGE, 1);
        assert!(!game.request_direction(Direction::Down));
        assert!(game.request_direction(Direction::Left));
        // Still heading up until the next tick.
        assert!(!game.request_direction(Direction::Down));
    }

    #[test]
    fn chasing_the_tail_is_allowed_but_biting_is_not() {
        // Square loop: head at (1,1), moving down follows the tail out of (1,2).
        let body = [(1, 1), (2, 1), (2, 2), (1, 2)];
        let mut game = game_with(SnakeConfig::with_size(4, 4), &body, None);
        game.heading = Direction::Left;
        game.pending = Direction::Down;
        assert_eq!(game.tick().unwrap(), TickOutcome::Moved);

        let body = [(1, 1), (2, 1), (2, 2), (1, 2), (0, 2)];
        let mut game = game_with(SnakeConfig::with_size(4, 4), &body, None);
        game.heading = Direction::Left;
        game.pending = Direction::Down;
        assert_eq!(game.tick().unwrap(), TickOutcome::HitSelf);
    }

    #[test]
    fn speed_ramps_down_to_minimum() {
        let mut game = SnakeGame::new(SnakeConfig::LARGE, 1);
        assert_eq!(game.tick_interval_ms(), 140);
        game.foods_eaten = 5;
        assert_eq!(game.tick_interval_ms(), 130);
        game.foods_eaten = 34;
        assert_eq!(game.tick_interval_ms(), 80);
        game.foods_eaten = 500;
        assert_eq!(game.tick_interval_ms(), 70);
    }

    #[test]
    fn filling_the_board_clears_the_game() {
        let body = [(0, 1), (1, 1), (1, 0)];
        let mut game = game_with(SnakeConfig::with_size(2, 2), &body, Some((0, 0)));
        game.heading = Direction::Left;
        game.pending = Direction::Up;
        assert_eq!(game.tick().unwrap(), TickOutcome::Cleared);
        assert_eq!(game.state(), SnakeState::Cleared);
    }
}

use bitflags::bitflags;
use ndarray::Array2;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::*;

pub const SIZE: usize = 9;
pub const BOX: usize = 3;
pub const MAX_STRIKES: u8 = 3;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub const fn cells_to_remove(self) -> usize {
        match self {
            Self::Easy => 35,
            Self::Medium => 45,
            Self::Hard => 55,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

bitflags! {
    /// Set of Sudoku digits, bit `n` standing for digit `n`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Digits: u16 {
        const ONE   = 1 << 1;
        const TWO   = 1 << 2;
        const THREE = 1 << 3;
        const FOUR  = 1 << 4;
        const FIVE  = 1 << 5;
        const SIX   = 1 << 6;
        const SEVEN = 1 << 7;
        const EIGHT = 1 << 8;
        const NINE  = 1 << 9;
    }
}

impl Digits {
    pub fn of(digit: u8) -> Self {
        if (1..=9).contains(&digit) {
            Self::from_bits_truncate(1 << digit)
        } else {
            Self::empty()
        }
    }

    pub fn count(self) -> u32 {
        self.bits().count_ones()
    }

    pub fn digits(self) -> impl Iterator<Item = u8> {
        (1..=9).filter(move |&digit| self.contains(Self::of(digit)))
    }
}

/// 9×9 board indexed by `(row, col)`; `None` is an empty cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cells: Array2<Option<u8>>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::empty()
    }
}

impl Grid {
    pub fn empty() -> Self {
        Self {
            cells: Array2::default((SIZE, SIZE)),
        }
    }

    /// Builds a grid from rows of digits, `0` meaning empty.
    pub fn from_rows(rows: [[u8; SIZE]; SIZE]) -> Result<Self> {
        let mut grid = Self::empty();
        for (row, values) in rows.iter().enumerate() {
            for (col, &value) in values.iter().enumerate() {
                let value = (value != 0).then_some(value);
                grid.set((row as Coord, col as Coord), value)?;
            }
        }
        Ok(grid)
    }

    fn check_coords((row, col): Coord2) -> Result<()> {
        if usize::from(row) < SIZE && usize::from(col) < SIZE {
            Ok(())
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn get(&self, coords: Coord2) -> Option<u8> {
        self.cells.get(coords.to_nd_index()).copied().flatten()
    }

    pub fn set(&mut self, coords: Coord2, value: Option<u8>) -> Result<()> {
        Self::check_coords(coords)?;
        if value.is_some_and(|digit| !(1..=9).contains(&digit)) {
            return Err(GameError::InvalidValue);
        }
        self.cells[coords.to_nd_index()] = value;
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord2, Option<u8>)> + '_ {
        self.cells
            .indexed_iter()
            .map(|((row, col), &value)| ((row as Coord, col as Coord), value))
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_none()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.empty_count() == 0
    }

    /// Digits already used in the row, column or box of `coords`, not counting the cell itself.
    fn used_digits(&self, (row, col): Coord2) -> Digits {
        let (row, col) = (usize::from(row), usize::from(col));
        let (box_row, box_col) = (row - row % BOX, col - col % BOX);
        let mut used = Digits::empty();
        for i in 0..SIZE {
            if i != col {
                used |= self.cells[[row, i]].map_or(Digits::empty(), Digits::of);
            }
            if i != row {
                used |= self.cells[[i, col]].map_or(Digits::empty(), Digits::of);
            }
            let (r, c) = (box_row + i / BOX, box_col + i % BOX);
            if (r, c) != (row, col) {
                used |= self.cells[[r, c]].map_or(Digits::empty(), Digits::of);
            }
        }
        used
    }

    pub fn is_valid_placement(&self, coords: Coord2, digit: u8) -> bool {
        Self::check_coords(coords).is_ok()
            && (1..=9).contains(&digit)
            && !self.used_digits(coords).contains(Digits::of(digit))
    }

    pub fn candidates(&self, coords: Coord2) -> Digits {
        if Self::check_coords(coords).is_err() {
            return Digits::empty();
        }
        Digits::all().difference(self.used_digits(coords))
    }

    /// Complete grid with no repeated digit in any row, column or box.
    pub fn is_valid_solution(&self) -> bool {
        self.iter()
            .all(|(coords, value)| value.is_some_and(|digit| self.is_valid_placement(coords, digit)))
    }

    fn first_empty(&self) -> Option<Coord2> {
        self.iter().find(|(_, value)| value.is_none()).map(|(coords, _)| coords)
    }

    /// Empty cell with the fewest candidates.
    fn most_constrained(&self) -> Option<(Coord2, Digits)> {
        self.iter()
            .filter(|(_, value)| value.is_none())
            .map(|(coords, _)| (coords, self.candidates(coords)))
            .min_by_key(|(_, digits)| digits.count())
    }
}

/// Fills every empty cell with a randomized backtracking search.
pub fn fill_grid<R: Rng>(grid: &mut Grid, rng: &mut R) -> bool {
    let Some(coords) = grid.first_empty() else {
        return true;
    };
    let mut digits: Vec<u8> = (1..=9).collect();
    digits.shuffle(rng);
    for digit in digits {
        if grid.is_valid_placement(coords, digit) {
            grid.cells[coords.to_nd_index()] = Some(digit);
            if fill_grid(grid, rng) {
                return true;
            }
            grid.cells[coords.to_nd_index()] = None;
        }
    }
    false
}

/// Solves `grid` in place. Leaves it untouched when no solution exists.
pub fn solve(grid: &mut Grid) -> bool {
    let Some((coords, candidates)) = grid.most_constrained() else {
        return true;
    };
    for digit in candidates.digits() {
        grid.cells[coords.to_nd_index()] = Some(digit);
        if solve(grid) {
            return true;
        }
    }
    grid.cells[coords.to_nd_index()] = None;
    false
}

/// Counts solutions, stopping once `limit` is reached.
pub fn count_solutions(grid: &Grid, limit: usize) -> usize {
    fn walk(grid: &mut Grid, limit: usize, found: &mut usize) {
        if *found >= limit {
            return;
        }
        let Some((coords, candidates)) = grid.most_constrained() else {
            *found += 1;
            return;
        };
        for digit in candidates.digits() {
            grid.cells[coords.to_nd_index()] = Some(digit);
            walk(grid, limit, found);
            if *found >= limit {
                break;
            }
        }
        grid.cells[coords.to_nd_index()] = None;
    }

    let mut scratch = grid.clone();
    let mut found = 0;
    walk(&mut scratch, limit, &mut found);
    found
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub puzzle: Grid,
    pub solution: Grid,
}

pub fn generate<R: Rng>(difficulty: Difficulty, rng: &mut R) -> Puzzle {
    let mut solution = Grid::empty();
    let filled = fill_grid(&mut solution, rng);
    debug_assert!(filled, "an empty grid always has a solution");

    let mut cells: Vec<Coord2> = solution.iter().map(|(coords, _)| coords).collect();
    cells.shuffle(rng);

    let mut puzzle = solution.clone();
    for &coords in cells.iter().take(difficulty.cells_to_remove()) {
        puzzle.cells[coords.to_nd_index()] = None;
    }
    log::debug!(
        "generated {} sudoku with {} empty cells",
        difficulty.label(),
        puzzle.empty_count()
    );

    Puzzle { puzzle, solution }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SudokuState {
    #[default]
    Playing,
    Solved,
    Failed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EditOutcome {
    NoChange,
    Changed,
    /// Wrong digit, carrying the strike count so far.
    Strike(u8),
    Solved,
    Failed,
}

impl EditOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::NoChange)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Highlight {
    Selected,
    SameNumber,
    Related,
    None,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SudokuGame {
    difficulty: Difficulty,
    puzzle: Grid,
    solution: Grid,
    current: Grid,
    incorrect: Array2<bool>,
    selected: Option<Coord2>,
    strikes: u8,
    state: SudokuState,
    #[serde(skip, default = "default_rng")]
    rng: GameRng,
}

fn default_rng() -> GameRng {
    seeded_rng(0)
}

impl SudokuGame {
    pub fn new(difficulty: Difficulty, seed: u64) -> Self {
        let mut rng = seeded_rng(seed);
        let Puzzle { puzzle, solution } = generate(difficulty, &mut rng);
        Self {
            difficulty,
            current: puzzle.clone(),
            puzzle,
            solution,
            incorrect: Array2::default((SIZE, SIZE)),
            selected: None,
            strikes: 0,
            state: SudokuState::Playing,
            rng,
        }
    }

    pub fn new_game(&mut self, difficulty: Difficulty) {
        let seed = self.rng.random();
        *self = Self::new(difficulty, seed);
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn state(&self) -> SudokuState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        !matches!(self.state, SudokuState::Playing)
    }

    pub fn strikes(&self) -> u8 {
        self.strikes
    }

    pub fn selected(&self) -> Option<Coord2> {
        self.selected
    }

    pub fn value(&self, coords: Coord2) -> Option<u8> {
        self.current.get(coords)
    }

    pub fn current(&self) -> &Grid {
        &self.current
    }

    pub fn solution(&self) -> &Grid {
        &self.solution
    }

    pub fn is_given(&self, coords: Coord2) -> bool {
        self.puzzle.get(coords).is_some()
    }

    pub fn is_incorrect(&self, coords: Coord2) -> bool {
        self.incorrect
            .get(coords.to_nd_index())
            .copied()
            .unwrap_or(false)
    }

    fn ensure_playing(&self) -> Result<()> {
        if self.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }

    /// Selects an editable cell by pointer.
    pub fn select(&mut self, coords: Coord2) -> Result<EditOutcome> {
        self.ensure_playing()?;
        Grid::check_coords(coords)?;
        if self.is_given(coords) {
            return Err(GameError::GivenCell);
        }
        if self.selected == Some(coords) {
            return Ok(EditOutcome::NoChange);
        }
        self.selected = Some(coords);
        Ok(EditOutcome::Changed)
    }

    /// Keyboard navigation; may land on given cells and stops at the board edge.
    pub fn move_selection(&mut self, direction: Direction) -> Result<EditOutcome> {
        self.ensure_playing()?;
        let Some((row, col)) = self.selected else {
            return Ok(EditOutcome::NoChange);
        };
        let (dx, dy) = direction.delta();
        let last = (SIZE - 1) as i16;
        let next = (
            (i16::from(row) + i16::from(dy)).clamp(0, last) as Coord,
            (i16::from(col) + i16::from(dx)).clamp(0, last) as Coord,
        );
        if next == (row, col) {
            return Ok(EditOutcome::NoChange);
        }
        self.selected = Some(next);
        Ok(EditOutcome::Changed)
    }

    fn editable_selection(&self) -> Result<Coord2> {
        self.ensure_playing()?;
        let coords = self.selected.ok_or(GameError::NoSelection)?;
        if self.is_given(coords) {
            return Err(GameError::GivenCell);
        }
        Ok(coords)
    }

    /// Writes `digit` into the selected cell, checked against the solution.
    pub fn input(&mut self, digit: u8) -> Result<EditOutcome> {
        if !(1..=9).contains(&digit) {
            return Err(GameError::InvalidValue);
        }
        let coords = self.editable_selection()?;
        self.current.set(coords, Some(digit))?;

        let index = coords.to_nd_index();
        if self.solution.get(coords) != Some(digit) {
            self.incorrect[index] = true;
            self.strikes += 1;
            if self.strikes >= MAX_STRIKES {
                self.state = SudokuState::Failed;
                return Ok(EditOutcome::Failed);
            }
            return Ok(EditOutcome::Strike(self.strikes));
        }

        self.incorrect[index] = false;
        if self.current == self.solution {
            self.state = SudokuState::Solved;
            return Ok(EditOutcome::Solved);
        }
        Ok(EditOutcome::Changed)
    }

    pub fn clear(&mut self) -> Result<EditOutcome> {
        let coords = self.editable_selection()?;
        if self.current.get(coords).is_none() {
            return Ok(EditOutcome::NoChange);
        }
        self.current.set(coords, None)?;
        self.incorrect[coords.to_nd_index()] = false;
        Ok(EditOutcome::Changed)
    }

    pub fn highlight(&self, coords: Coord2) -> Highlight {
        let Some(selected) = self.selected else {
            return Highlight::None;
        };
        if coords == selected {
            return Highlight::Selected;
        }
        if let Some(value) = self.current.get(selected)
            && self.current.get(coords) == Some(value)
        {
            return Highlight::SameNumber;
        }

        let box_of = |(row, col): Coord2| (usize::from(row) / BOX, usize::from(col) / BOX);
        if coords.0 == selected.0 || coords.1 == selected.1 || box_of(coords) == box_of(selected) {
            Highlight::Related
        } else {
            Highlight::None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_editable(game: &SudokuGame) -> Coord2 {
        game.current()
            .iter()
            .find(|&(coords, _)| !game.is_given(coords))
            .map(|(coords, _)| coords)
            .unwrap()
    }

    fn wrong_digit(game: &SudokuGame, coords: Coord2) -> u8 {
        let right = game.solution().get(coords).unwrap();
        right % 9 + 1
    }

    #[test]
    fn generated_solutions_are_valid() {
        let mut rng = seeded_rng(7);
        for _ in 0..20 {
            let mut grid = Grid::empty();
            assert!(fill_grid(&mut grid, &mut rng));
            assert!(grid.is_valid_solution());
        }
    }

    #[test]
    fn removes_exact_cell_count_and_refills_to_solution() {
        let mut rng = seeded_rng(11);
        for difficulty in Difficulty::ALL {
            for _ in 0..5 {
                let Puzzle { puzzle, solution } = generate(difficulty, &mut rng);
                assert_eq!(puzzle.empty_count(), difficulty.cells_to_remove());

                let mut refilled = puzzle.clone();
                for (coords, value) in puzzle.iter() {
                    if value.is_none() {
                        refilled.set(coords, solution.get(coords)).unwrap();
                    } else {
                        assert_eq!(value, solution.get(coords));
                    }
                }
                assert!(refilled.is_valid_solution());
            }
        }
    }

    #[test]
    fn solver_completes_generated_puzzles() {
        let mut rng = seeded_rng(3);
        let Puzzle { puzzle, .. } = generate(Difficulty::Hard, &mut rng);
        assert!(count_solutions(&puzzle, 2) >= 1);

        let mut solved = puzzle.clone();
        assert!(solve(&mut solved));
        assert!(solved.is_valid_solution());
        for (coords, value) in puzzle.iter().filter(|(_, value)| value.is_some()) {
            assert_eq!(solved.get(coords), value);
        }
    }

    #[test]
    fn single_gap_has_exactly_one_solution() {
        let mut rng = seeded_rng(8);
        let Puzzle { solution, .. } = generate(Difficulty::Easy, &mut rng);
        let mut puzzle = solution.clone();
        puzzle.set((4, 4), None).unwrap();
        puzzle.set((0, 8), None).unwrap();

        assert_eq!(count_solutions(&puzzle, 2), 1);
        assert!(solve(&mut puzzle));
        assert_eq!(puzzle, solution);
    }

    #[test]
    fn contradictory_grid_has_no_solution() {
        let mut rows = [[0; SIZE]; SIZE];
        rows[0] = [1, 2, 3, 4, 5, 6, 7, 8, 0];
        rows[1][8] = 9;
        let mut grid = Grid::from_rows(rows).unwrap();
        assert!(grid.candidates((0, 8)).is_empty());
        assert_eq!(count_solutions(&grid, 2), 0);
        let before = grid.clone();
        assert!(!solve(&mut grid));
        assert_eq!(grid, before);
    }

    #[test]
    fn empty_grid_has_many_solutions() {
        assert_eq!(count_solutions(&Grid::empty(), 3), 3);
    }

    #[test]
    fn candidates_exclude_row_column_and_box() {
        let mut rows = [[0; SIZE]; SIZE];
        rows[0][1] = 1;
        rows[4][0] = 2;
        rows[2][2] = 3;
        rows[8][8] = 4;
        let grid = Grid::from_rows(rows).unwrap();
        let candidates = grid.candidates((0, 0));
        assert_eq!(candidates.count(), 6);
        assert!(candidates.contains(Digits::FOUR));
        assert!(!candidates.contains(Digits::ONE | Digits::TWO));
        assert_eq!(Grid::from_rows([[10; SIZE]; SIZE]), Err(GameError::InvalidValue));
    }

    #[test]
    fn given_cells_cannot_be_selected_or_edited() {
        let mut game = SudokuGame::new(Difficulty::Easy, 5);
        let given = game
            .current()
            .iter()
            .find(|&(coords, _)| game.is_given(coords))
            .map(|(coords, _)| coords)
            .unwrap();
        assert_eq!(game.select(given), Err(GameError::GivenCell));
        assert_eq!(game.input(3), Err(GameError::NoSelection));
        assert_eq!(game.select((9, 0)), Err(GameError::InvalidCoords));
    }

    #[test]
    fn arrow_keys_clamp_to_the_board() {
        let mut game = SudokuGame::new(Difficulty::Medium, 9);
        assert_eq!(game.move_selection(Direction::Up).unwrap(), EditOutcome::NoChange);

        let start = first_editable(&game);
        game.select(start).unwrap();
        for _ in 0..12 {
            game.move_selection(Direction::Down).unwrap();
            game.move_selection(Direction::Right).unwrap();
        }
        assert_eq!(game.selected(), Some((8, 8)));
        assert_eq!(game.move_selection(Direction::Down).unwrap(), EditOutcome::NoChange);
    }

    #[test]
    fn three_strikes_fail_the_game() {
        let mut game = SudokuGame::new(Difficulty::Easy, 21);
        let coords = first_editable(&game);
        game.select(coords).unwrap();
        let wrong = wrong_digit(&game, coords);

        assert_eq!(game.input(wrong).unwrap(), EditOutcome::Strike(1));
        assert!(game.is_incorrect(coords));
        assert_eq!(game.clear().unwrap(), EditOutcome::Changed);
        assert!(!game.is_incorrect(coords));
        assert_eq!(game.input(wrong).unwrap(), EditOutcome::Strike(2));
        assert_eq!(game.input(wrong).unwrap(), EditOutcome::Failed);
        assert_eq!(game.state(), SudokuState::Failed);
        assert_eq!(game.input(1), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn filling_every_cell_correctly_solves() {
        let mut game = SudokuGame::new(Difficulty::Easy, 4);
        let empty: Vec<Coord2> = game
            .current()
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(coords, _)| coords)
            .collect();

        let (last, rest) = empty.split_last().unwrap();
        for &coords in rest {
            game.select(coords).unwrap();
            let digit = game.solution().get(coords).unwrap();
            assert_eq!(game.input(digit).unwrap(), EditOutcome::Changed);
        }
        game.select(*last).unwrap();
        let digit = game.solution().get(*last).unwrap();
        assert_eq!(game.input(digit).unwrap(), EditOutcome::Solved);
        assert!(game.is_finished());
    }

    #[test]
    fn highlight_follows_selection() {
        let mut game = SudokuGame::new(Difficulty::Hard, 2);
        assert_eq!(game.highlight((0, 0)), Highlight::None);

        let coords = first_editable(&game);
        game.select(coords).unwrap();
        assert_eq!(game.highlight(coords), Highlight::Selected);
        let (row, col) = coords;
        assert_eq!(game.highlight((row, (col + 4) % 9)), Highlight::Related);
        assert_eq!(game.highlight(((row + 4) % 9, col)), Highlight::Related);

        let digit = game.solution().get(coords).unwrap();
        game.input(digit).unwrap();
        let twin = game
            .current()
            .iter()
            .find(|&(other, value)| other != coords && value == Some(digit))
            .map(|(other, _)| other);
        if let Some(twin) = twin {
            assert_eq!(game.highlight(twin), Highlight::SameNumber);
        }
    }

    #[test]
    fn new_game_resets_progress() {
        let mut game = SudokuGame::new(Difficulty::Easy, 1);
        let coords = first_editable(&game);
        game.select(coords).unwrap();
        let wrong = wrong_digit(&game, coords);
        game.input(wrong).unwrap();

        game.new_game(Difficulty::Hard);
        assert_eq!(game.strikes(), 0);
        assert_eq!(game.selected(), None);
        assert_eq!(game.difficulty(), Difficulty::Hard);
        assert_eq!(game.current().empty_count(), 55);
    }
}

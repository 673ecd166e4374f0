use serde::{Deserialize, Serialize};

use crate::*;

pub const CELL_COUNT: usize = 9;

const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// The human always plays `X`, the AI always plays `O`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub const HUMAN: Mark = Mark::X;
    pub const AI: Mark = Mark::O;

    pub const fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::X => "X",
            Self::O => "O",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    cells: [Option<Mark>; CELL_COUNT],
}

impl Board {
    pub const fn empty() -> Self {
        Self {
            cells: [None; CELL_COUNT],
        }
    }

    pub fn from_cells(cells: [Option<Mark>; CELL_COUNT]) -> Self {
        Self { cells }
    }

    pub fn cell(&self, index: usize) -> Option<Mark> {
        self.cells.get(index).copied().flatten()
    }

    pub fn cells(&self) -> &[Option<Mark>; CELL_COUNT] {
        &self.cells
    }

    pub fn place(&mut self, index: usize, mark: Mark) -> Result<()> {
        let cell = self.cells.get_mut(index).ok_or(GameError::InvalidCoords)?;
        if cell.is_some() {
            return Err(GameError::CellOccupied);
        }
        *cell = Some(mark);
        Ok(())
    }

    fn with(mut self, index: usize, mark: Mark) -> Self {
        self.cells[index] = Some(mark);
        self
    }

    pub fn winning_line(&self) -> Option<[usize; 3]> {
        LINES.into_iter().find(|&[a, b, c]| {
            self.cells[a].is_some() && self.cells[a] == self.cells[b] && self.cells[a] == self.cells[c]
        })
    }

    pub fn winner(&self) -> Option<Mark> {
        self.winning_line().and_then(|[a, _, _]| self.cells[a])
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_none())
            .map(|(index, _)| index)
    }

    pub fn outcome(&self) -> Outcome {
        match self.winner() {
            Some(mark) => Outcome::Won(mark),
            None if self.is_full() => Outcome::Draw,
            None => Outcome::InProgress,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    InProgress,
    Won(Mark),
    Draw,
}

impl Outcome {
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

fn minimax(board: Board, ai: Mark, depth: i32, maximizing: bool) -> i32 {
    match board.winner() {
        Some(mark) if mark == ai => return 10 - depth,
        Some(_) => return depth - 10,
        None if board.is_full() => return 0,
        None => {}
    }

    let mover = if maximizing { ai } else { ai.other() };
    let scores = board
        .empty_cells()
        .map(|index| minimax(board.with(index, mover), ai, depth + 1, !maximizing));

    if maximizing {
        scores.max().unwrap_or(0)
    } else {
        scores.min().unwrap_or(0)
    }
}

/// Full-depth minimax score of playing `index` for `ai`.
pub fn move_score(board: &Board, ai: Mark, index: usize) -> i32 {
    minimax(board.with(index, ai), ai, 0, false)
}

/// Best cell for `ai`, preferring faster wins and slower losses. Ties go to
/// the lowest index. `None` when the game is already decided.
pub fn best_move(board: &Board, ai: Mark) -> Option<usize> {
    if board.outcome().is_finished() {
        return None;
    }

    let mut best: Option<(usize, i32)> = None;
    for index in board.empty_cells() {
        let score = move_score(board, ai, index);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
    }
    best.map(|(index, _)| index)
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub player: u32,
    pub ai: u32,
    pub draws: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayOutcome {
    NoChange,
    Placed(Outcome),
}

impl PlayOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Placed(_))
    }
}

/// Human versus AI session with alternating starting player and a running tally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicTacToe {
    board: Board,
    next: Mark,
    player_starts: bool,
    scores: Scoreboard,
}

impl Default for TicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

impl TicTacToe {
    pub fn new() -> Self {
        Self {
            board: Board::empty(),
            next: Mark::HUMAN,
            player_starts: true,
            scores: Scoreboard::default(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn next(&self) -> Mark {
        self.next
    }

    pub fn player_starts(&self) -> bool {
        self.player_starts
    }

    pub fn scores(&self) -> Scoreboard {
        self.scores
    }

    pub fn outcome(&self) -> Outcome {
        self.board.outcome()
    }

    pub fn is_ai_turn(&self) -> bool {
        self.next == Mark::AI && !self.outcome().is_finished()
    }

    pub fn play(&mut self, index: usize) -> Result<PlayOutcome> {
        self.place(index, Mark::HUMAN)
    }

    /// Lets the AI take its turn. Returns the chosen cell, if any.
    pub fn ai_move(&mut self) -> Result<Option<usize>> {
        if !self.is_ai_turn() {
            return Ok(None);
        }
        let Some(index) = best_move(&self.board, Mark::AI) else {
            return Ok(None);
        };
        self.place(index, Mark::AI)?;
        log::debug!("ai plays cell {}", index);
        Ok(Some(index))
    }

    /// Clears the board and hands the first move to whoever did not start last time.
    pub fn reset(&mut self) {
        self.player_starts = !self.player_starts;
        self.board = Board::empty();
        self.next = if self.player_starts {
            Mark::HUMAN
        } else {
            Mark::AI
        };
    }

    fn place(&mut self, index: usize, mark: Mark) -> Result<PlayOutcome> {
        if self.outcome().is_finished() {
            return Err(GameError::AlreadyEnded);
        }
        if self.next != mark {
            return Err(GameError::NotYourTurn);
        }

        self.board.place(index, mark)?;
        self.next = mark.other();

        let outcome = self.outcome();
        match outcome {
            Outcome::Won(Mark::X) => self.scores.player += 1,
            Outcome::Won(Mark::O) => self.scores.ai += 1,
            Outcome::Draw => self.scores.draws += 1,
            Outcome::InProgress => {}
        }
        Ok(PlayOutcome::Placed(outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use Mark::*;

    fn board(cells: &str) -> Board {
        let mut out = [None; CELL_COUNT];
        for (cell, ch) in out.iter_mut().zip(cells.chars()) {
            *cell = match ch {
                'X' => Some(X),
                'O' => Some(O),
                _ => None,
            };
        }
        Board::from_cells(out)
    }

    #[test]
    fn detects_rows_columns_and_diagonals() {
        assert_eq!(board("XXX......").winner(), Some(X));
        assert_eq!(board("O..O..O..").winner(), Some(O));
        assert_eq!(board("..X.X.X..").winning_line(), Some([2, 4, 6]));
        assert_eq!(board("XOXXOOOXX").outcome(), Outcome::Draw);
        assert_eq!(board("XO.......").outcome(), Outcome::InProgress);
    }

    #[test]
    fn takes_immediate_win() {
        assert_eq!(best_move(&board("OO.XX...."), O), Some(2));
    }

    #[test]
    fn blocks_opponent_win() {
        assert_eq!(best_move(&board("XX..O...."), O), Some(2));
    }

    #[test]
    fn no_move_on_finished_board() {
        assert_eq!(best_move(&board("XXXOO...."), O), None);
        assert_eq!(best_move(&board("XOXXOOOXX"), O), None);
    }

    fn collect_ai_positions(board: Board, to_move: Mark, out: &mut Vec<Board>) {
        if board.outcome().is_finished() {
            return;
        }
        if to_move == O {
            out.push(board);
        }
        for index in board.empty_cells() {
            collect_ai_positions(board.with(index, to_move), to_move.other(), out);
        }
    }

    #[test]
    fn best_move_is_never_worse_than_any_alternative() {
        let mut positions = Vec::new();
        collect_ai_positions(Board::empty(), X, &mut positions);
        collect_ai_positions(Board::empty(), O, &mut positions);
        positions.sort_by_key(|b| b.cells.map(|c| c.map_or(0u8, |m| m as u8 + 1)));
        positions.dedup();

        for position in positions {
            let chosen = best_move(&position, O).unwrap();
            let chosen_score = move_score(&position, O, chosen);
            let best_possible = position
                .empty_cells()
                .map(|index| move_score(&position, O, index))
                .max()
                .unwrap();
            assert_eq!(chosen_score, best_possible, "{:?}", position);
            if best_possible >= 0 {
                assert!(chosen_score >= 0, "picked a losing move in {:?}", position);
            }
        }
    }

    fn human_never_wins(game: &TicTacToe) {
        if game.outcome().is_finished() {
            assert_ne!(game.outcome(), Outcome::Won(X), "{:?}", game.board());
            return;
        }
        if game.is_ai_turn() {
            let mut next = game.clone();
            next.ai_move().unwrap();
            human_never_wins(&next);
        } else {
            for index in game.board().empty_cells() {
                let mut next = game.clone();
                next.play(index).unwrap();
                human_never_wins(&next);
            }
        }
    }

    #[test]
    fn ai_never_loses_a_full_game() {
        let mut game = TicTacToe::new();
        human_never_wins(&game);
        game.reset();
        assert!(game.is_ai_turn());
        human_never_wins(&game);
    }

    #[test]
    fn session_rejects_out_of_turn_and_finished_moves() {
        let mut game = TicTacToe::new();
        assert_eq!(
            game.play(0).unwrap(),
            PlayOutcome::Placed(Outcome::InProgress)
        );
        assert_eq!(game.play(1), Err(GameError::NotYourTurn));
        assert_eq!(game.ai_move().unwrap(), Some(4));
        assert_eq!(game.play(4), Err(GameError::CellOccupied));
        assert_eq!(game.play(9), Err(GameError::InvalidCoords));
    }

    #[test]
    fn scoreboard_counts_each_game_once() {
        let mut game = TicTacToe::new();
        while !game.outcome().is_finished() {
            if game.is_ai_turn() {
                game.ai_move().unwrap();
            } else {
                let index = game.board().empty_cells().next().unwrap();
                game.play(index).unwrap();
            }
        }
        let scores = game.scores();
        assert_eq!(scores.player + scores.ai + scores.draws, 1);
        assert_eq!(game.play(0), Err(GameError::AlreadyEnded));

        game.reset();
        assert!(!game.player_starts());
        assert_eq!(game.next(), Mark::AI);
        assert_eq!(game.scores(), scores);
    }

    #[test]
    fn saved_session_resumes_where_it_stopped() {
        let mut game = TicTacToe::new();
        game.play(0).unwrap();
        game.ai_move().unwrap();

        let saved = serde_json::to_string(&game).unwrap();
        let mut restored: TicTacToe = serde_json::from_str(&saved).unwrap();
        assert_eq!(restored, game);
        assert!(!restored.is_ai_turn());
        assert_eq!(restored.play(4), Err(GameError::CellOccupied));
    }
}

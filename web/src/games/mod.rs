use minigames_core::Direction;
use minigames_protocol::ScoreSubmission;
use wasm_bindgen::JsCast;
use web_sys::{KeyboardEvent, TouchEvent};
use yew::prelude::*;

pub(crate) use leaderboard::LeaderboardView;
pub(crate) use pathfinding::PathfindingView;
pub(crate) use snake::SnakeView;
pub(crate) use sorting::SortingView;
pub(crate) use sudoku::SudokuView;
pub(crate) use tictactoe::TicTacToeView;
pub(crate) use twenty48::Twenty48View;

mod leaderboard;
mod pathfinding;
mod snake;
mod sorting;
mod sudoku;
mod tictactoe;
mod twenty48;

#[derive(Properties, Clone, PartialEq)]
pub(crate) struct GameProps {
    pub seed: u64,
    #[prop_or_default]
    pub on_score: Callback<ScoreSubmission>,
}

/// Listens for `keydown` on the window while the returned listener is alive.
pub(crate) fn keydown_listener(callback: Callback<KeyboardEvent>) -> gloo::events::EventListener {
    use gloo::events::{EventListener, EventListenerOptions};

    EventListener::new_with_options(
        &gloo::utils::window(),
        "keydown",
        EventListenerOptions::enable_prevent_default(),
        move |event| {
            if let Some(event) = event.dyn_ref::<KeyboardEvent>() {
                callback.emit(event.clone());
            }
        },
    )
}

pub(crate) const fn arrow_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "↑",
        Direction::Down => "↓",
        Direction::Left => "←",
        Direction::Right => "→",
    }
}

/// First touch point of a touch event, in client pixels.
pub(crate) fn touch_point(event: &TouchEvent) -> Option<(f64, f64)> {
    let touches = event.changed_touches();
    let touch = touches.get(0)?;
    Some((f64::from(touch.client_x()), f64::from(touch.client_y())))
}

/// Direction of a swipe from `start` to `end`, if it travelled at least
/// `threshold` pixels.
pub(crate) fn swipe(start: (f64, f64), end: (f64, f64), threshold: f64) -> Option<Direction> {
    Direction::from_swipe(end.0 - start.0, end.1 - start.1, threshold)
}

/// Submits a finished game's score exactly once.
#[derive(Debug, Default)]
pub(crate) struct ScoreLatch {
    submitted: bool,
}

impl ScoreLatch {
    pub(crate) fn submit(&mut self, on_score: &Callback<ScoreSubmission>, submission: ScoreSubmission) {
        if self.submitted {
            return;
        }
        self.submitted = true;
        log::debug!("game over, submitting {:?}", submission);
        on_score.emit(submission);
    }

    pub(crate) fn rearm(&mut self) {
        self.submitted = false;
    }
}

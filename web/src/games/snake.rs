use gloo::events::EventListener;
use minigames_core::snake::{SnakeConfig, SnakeGame, SnakeState};
use minigames_core::{Coord2, Direction};
use minigames_protocol::{GameId, ScoreSubmission};
use web_sys::{KeyboardEvent, TouchEvent};
use yew::prelude::*;

use super::{GameProps, ScoreLatch, arrow_label, keydown_listener, swipe, touch_point};
use crate::settings::BestScores;
use crate::ticker::Ticker;
use crate::utils::is_narrow_viewport;

/// Shortest swipe, in pixels, that turns the snake.
const SWIPE_THRESHOLD: f64 = 40.;

pub(crate) enum Msg {
    Key(KeyboardEvent),
    TouchStart(TouchEvent),
    TouchEnd(TouchEvent),
    Turn(Direction),
    Tick,
    TogglePause,
    NewGame,
}

pub(crate) struct SnakeView {
    game: SnakeGame,
    best: u32,
    paused: bool,
    touch_start: Option<(f64, f64)>,
    ticker: Ticker,
    latch: ScoreLatch,
    _keydown: EventListener,
}

impl SnakeView {
    /// Keeps the timer period in step with the snake's speed.
    fn sync_ticker(&mut self, ctx: &Context<Self>) {
        let wanted = matches!(self.game.state(), SnakeState::Running) && !self.paused;
        if !wanted {
            self.ticker.stop();
            return;
        }
        let period = self.game.tick_interval_ms();
        if self.ticker.period_ms() != Some(period) {
            log::trace!("snake tick every {} ms", period);
            let link = ctx.link().clone();
            self.ticker.start(period, move || link.send_message(Msg::Tick));
        }
    }

    fn turn(&mut self, ctx: &Context<Self>, direction: Direction) -> bool {
        if self.game.is_finished() {
            return false;
        }
        self.paused = false;
        let turned = self.game.request_direction(direction);
        let starting = matches!(self.game.state(), SnakeState::Ready);
        self.game.start();
        self.sync_ticker(ctx);
        turned || starting
    }

    fn cell_class(&self, pos: Coord2) -> Classes {
        if pos == self.game.head() {
            classes!("cell", "head")
        } else if self.game.occupies(pos) {
            classes!("cell", "body")
        } else if self.game.food() == Some(pos) {
            classes!("cell", "food")
        } else {
            classes!("cell")
        }
    }
}

impl Component for SnakeView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let config = if is_narrow_viewport() {
            SnakeConfig::PREVIEW
        } else {
            SnakeConfig::LARGE
        };
        Self {
            game: SnakeGame::new(config, ctx.props().seed),
            best: BestScores::record(|best| &mut best.snake, 0),
            paused: false,
            touch_start: None,
            ticker: Ticker::default(),
            latch: ScoreLatch::default(),
            _keydown: keydown_listener(ctx.link().callback(Msg::Key)),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Key(event) if event.key() == " " => {
                event.prevent_default();
                ctx.link().send_message(Msg::TogglePause);
                false
            }
            Msg::Key(event) => {
                let Some(direction) = Direction::from_key(&event.key()) else {
                    return false;
                };
                event.prevent_default();
                self.turn(ctx, direction)
            }
            Msg::TouchStart(event) => {
                self.touch_start = touch_point(&event);
                false
            }
            Msg::TouchEnd(event) => {
                let ends = self.touch_start.take().zip(touch_point(&event));
                match ends.and_then(|(start, end)| swipe(start, end, SWIPE_THRESHOLD)) {
                    Some(direction) => self.turn(ctx, direction),
                    None => false,
                }
            }
            Msg::Turn(direction) => self.turn(ctx, direction),
            Msg::Tick => {
                if self.paused {
                    return false;
                }
                match self.game.tick() {
                    Ok(outcome) if outcome.ends_game() => {
                        log::debug!("snake over: {:?}, score {}", outcome, self.game.score());
                        self.best = BestScores::record(|best| &mut best.snake, self.game.score());
                        let submission =
                            ScoreSubmission::new(GameId::Snake, self.game.score().into());
                        self.latch.submit(&ctx.props().on_score, submission);
                    }
                    Ok(_) => {}
                    Err(err) => log::debug!("tick ignored: {}", err),
                }
                self.sync_ticker(ctx);
                true
            }
            Msg::TogglePause => {
                if !matches!(self.game.state(), SnakeState::Running) {
                    return false;
                }
                self.paused = !self.paused;
                self.sync_ticker(ctx);
                true
            }
            Msg::NewGame => {
                self.ticker.stop();
                self.game.reset();
                self.paused = false;
                self.latch.rearm();
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let SnakeConfig { cols, rows, .. } = *self.game.config();
        let ontouchstart = ctx.link().callback(Msg::TouchStart);
        let ontouchend = ctx.link().callback(Msg::TouchEnd);
        let status = match self.game.state() {
            SnakeState::Ready => "Press an arrow key or swipe to start",
            SnakeState::Running if self.paused => "Paused",
            SnakeState::Running => "",
            SnakeState::Crashed => "Game over",
            SnakeState::Cleared => "Board cleared!",
        };

        html! {
            <div class="snake">
                <nav>
                    <aside>{"Score "}<strong>{self.game.score()}</strong></aside>
                    <aside>{"Best "}<strong>{self.best.max(self.game.score())}</strong></aside>
                    <button onclick={ctx.link().callback(|_| Msg::TogglePause)}>
                        {if self.paused { "Resume" } else { "Pause" }}
                    </button>
                    <button onclick={ctx.link().callback(|_| Msg::NewGame)}>{"New game"}</button>
                </nav>
                <p class="status">{status}</p>
                <table class={classes!(self.game.is_finished().then_some("finished"))} {ontouchstart} {ontouchend}>
                    {
                        for (0..rows).map(|y| html! {
                            <tr>
                                { for (0..cols).map(|x| html! { <td class={self.cell_class((x, y))}/> }) }
                            </tr>
                        })
                    }
                </table>
                <div class="arrows">
                    {
                        for Direction::ALL.into_iter().map(|direction| {
                            let onclick = ctx.link().callback(move |_| Msg::Turn(direction));
                            html! { <button {onclick}>{arrow_label(direction)}</button> }
                        })
                    }
                </div>
            </div>
        }
    }
}

use gloo::events::EventListener;
use minigames_core::Direction;
use minigames_core::twenty48::{GRID_SIZE, Game2048};
use minigames_protocol::{GameId, ScoreSubmission};
use web_sys::{KeyboardEvent, TouchEvent};
use yew::prelude::*;

use super::{GameProps, ScoreLatch, arrow_label, keydown_listener, swipe, touch_point};
use crate::settings::BestScores;
use crate::ticker::Ticker;

const SETTLE_DELAY_MS: u32 = 150;
/// Shortest swipe, in pixels, that slides the board.
const SWIPE_THRESHOLD: f64 = 50.;

pub(crate) enum Msg {
    Key(KeyboardEvent),
    TouchStart(TouchEvent),
    TouchEnd(TouchEvent),
    Slide(Direction),
    Settle,
    KeepPlaying,
    NewGame,
}

pub(crate) struct Twenty48View {
    game: Game2048,
    best: u32,
    touch_start: Option<(f64, f64)>,
    settle_timer: Ticker,
    latch: ScoreLatch,
    _keydown: EventListener,
}

impl Twenty48View {
    fn slide(&mut self, ctx: &Context<Self>, direction: Direction) -> bool {
        match self.game.slide(direction) {
            Ok(outcome) if outcome.has_update() => {
                let link = ctx.link().clone();
                self.settle_timer
                    .once(SETTLE_DELAY_MS, move || link.send_message(Msg::Settle));
                true
            }
            Ok(_) => false,
            Err(err) => {
                log::debug!("rejected slide {:?}: {}", direction, err);
                false
            }
        }
    }

    fn finish_if_over(&mut self, ctx: &Context<Self>) {
        if self.game.is_over() {
            self.best = BestScores::record(|best| &mut best.twenty48, self.game.score());
            let submission = ScoreSubmission::new(GameId::Twenty48, self.game.score().into());
            self.latch.submit(&ctx.props().on_score, submission);
        }
    }
}

impl Component for Twenty48View {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let on_key = ctx.link().callback(Msg::Key);
        Self {
            game: Game2048::new(ctx.props().seed),
            best: BestScores::record(|best| &mut best.twenty48, 0),
            touch_start: None,
            settle_timer: Ticker::default(),
            latch: ScoreLatch::default(),
            _keydown: keydown_listener(on_key),
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Key(event) => {
                let Some(direction) = Direction::from_key(&event.key()) else {
                    return false;
                };
                event.prevent_default();
                self.slide(ctx, direction)
            }
            Msg::TouchStart(event) => {
                self.touch_start = touch_point(&event);
                false
            }
            Msg::TouchEnd(event) => {
                let ends = self.touch_start.take().zip(touch_point(&event));
                match ends.and_then(|(start, end)| swipe(start, end, SWIPE_THRESHOLD)) {
                    Some(direction) => self.slide(ctx, direction),
                    None => false,
                }
            }
            Msg::Slide(direction) => self.slide(ctx, direction),
            Msg::Settle => {
                self.settle_timer.stop();
                self.game.settle();
                self.finish_if_over(ctx);
                true
            }
            Msg::KeepPlaying => self.game.continue_after_win(),
            Msg::NewGame => {
                self.settle_timer.stop();
                self.game.reset();
                self.latch.rearm();
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let ontouchstart = ctx.link().callback(Msg::TouchStart);
        let ontouchend = ctx.link().callback(Msg::TouchEnd);

        html! {
            <div class="twenty48">
                <nav>
                    <aside>{"Score "}<strong>{self.game.score()}</strong></aside>
                    <aside>{"Best "}<strong>{self.best.max(self.game.score())}</strong></aside>
                    <button onclick={ctx.link().callback(|_| Msg::NewGame)}>{"New game"}</button>
                </nav>
                <div class="grid" {ontouchstart} {ontouchend}>
                    {
                        for (0..GRID_SIZE).flat_map(|row| (0..GRID_SIZE).map(move |col| (row, col))).map(|(row, col)| {
                            let style = format!("grid-row: {}; grid-column: {};", row + 1, col + 1);
                            html! { <div class="slot" {style}/> }
                        })
                    }
                    {
                        for self.game.tiles().map(|((row, col), tile)| {
                            let class = classes!(
                                "tile",
                                format!("tile-{}", tile.value.min(4096)),
                                tile.merged.then_some("merged"),
                                tile.spawned.then_some("spawned"),
                            );
                            let style = format!("grid-row: {}; grid-column: {};", row + 1, col + 1);
                            html! { <div key={tile.id} {class} {style}>{tile.value}</div> }
                        })
                    }
                </div>
                <div class="arrows">
                    {
                        for Direction::ALL.into_iter().map(|direction| {
                            let onclick = ctx.link().callback(move |_| Msg::Slide(direction));
                            html! { <button {onclick}>{arrow_label(direction)}</button> }
                        })
                    }
                </div>
                if self.game.shows_win() {
                    <div class="overlay won">
                        <h3>{"You reached 2048!"}</h3>
                        <button onclick={ctx.link().callback(|_| Msg::KeepPlaying)}>{"Keep going"}</button>
                    </div>
                }
                if self.game.is_over() {
                    <div class="overlay over">
                        <h3>{"Game over"}</h3>
                        <p>{format!("Final score: {}", self.game.score())}</p>
                        <button onclick={ctx.link().callback(|_| Msg::NewGame)}>{"Try again"}</button>
                    </div>
                }
            </div>
        }
    }
}

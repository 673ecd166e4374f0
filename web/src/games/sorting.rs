use minigames_core::sorting::{self, Algorithm, BarRole, MIN_BARS, SortStep};
use minigames_core::{GameRng, Playback, SpeedProfile, StepLog, seeded_rng};
use minigames_protocol::{GameId, ScoreSubmission};
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use super::{GameProps, ScoreLatch};
use crate::settings::{MAX_DELAY_MS, Settings};
use crate::ticker::Ticker;

pub(crate) enum Msg {
    Sort,
    Pause,
    Shuffle,
    Tick,
    SetBars(usize),
    SetDelay(u32),
    SetAlgorithm(Algorithm),
    ToggleExtended,
}

pub(crate) struct SortingView {
    settings: Settings,
    values: Vec<u32>,
    steps: Option<StepLog<SortStep>>,
    playback: Playback,
    ticker: Ticker,
    latch: ScoreLatch,
    rng: GameRng,
}

impl SortingView {
    fn discard_steps(&mut self) {
        self.ticker.stop();
        self.steps = None;
        self.playback = Playback::new(0);
        self.latch.rearm();
    }

    fn current(&self) -> Option<&SortStep> {
        self.steps.as_ref()?.at(self.playback.index())
    }

    /// Adopts the values on screen as the next run's input.
    fn keep_shown_values(&mut self) {
        if let Some(values) = self.current().map(|step| step.values.clone()) {
            self.values = values;
        }
    }

    fn start_ticker(&mut self, ctx: &Context<Self>) {
        let plan = SpeedProfile::SORTING.plan(self.settings.sorting_delay_ms, self.playback.len());
        let link = ctx.link().clone();
        self.ticker.start(plan.delay_ms, move || link.send_message(Msg::Tick));
    }

    fn sort(&mut self, ctx: &Context<Self>) -> bool {
        if self.playback.is_running() {
            return false;
        }
        if self.steps.is_none() || self.playback.is_finished() {
            let steps = sorting::build_steps(self.settings.sorting_algorithm, &self.values);
            log::debug!(
                "{} over {} bars: {} steps",
                self.settings.sorting_algorithm.label(),
                self.values.len(),
                steps.len()
            );
            self.playback = Playback::new(steps.len());
            self.steps = Some(steps);
            self.latch.rearm();
        }
        self.playback.play();
        self.start_ticker(ctx);
        true
    }

    fn tick(&mut self, ctx: &Context<Self>) -> bool {
        let plan = SpeedProfile::SORTING.plan(self.settings.sorting_delay_ms, self.playback.len());
        let moved = self.playback.advance(plan.increment);
        if self.playback.is_finished() {
            self.ticker.stop();
            self.keep_shown_values();
            let submission = ScoreSubmission::new(GameId::Sorting, self.playback.len() as i64);
            self.latch.submit(&ctx.props().on_score, submission);
            return true;
        }
        moved
    }
}

impl Component for SortingView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let settings = Settings::load();
        let mut rng = seeded_rng(ctx.props().seed);
        let values = sorting::random_values(settings.sorting_bars, &mut rng);
        Self {
            settings,
            values,
            steps: None,
            playback: Playback::new(0),
            ticker: Ticker::default(),
            latch: ScoreLatch::default(),
            rng,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Sort => self.sort(ctx),
            Msg::Pause => {
                self.playback.pause();
                self.ticker.stop();
                true
            }
            Msg::Shuffle => {
                self.discard_steps();
                self.values = sorting::random_values(self.settings.sorting_bars, &mut self.rng);
                true
            }
            Msg::Tick => self.tick(ctx),
            Msg::SetBars(bars) => {
                if self.playback.is_running() {
                    return false;
                }
                self.settings = Settings::update(|settings| settings.sorting_bars = bars);
                self.discard_steps();
                sorting::resize_values(&mut self.values, self.settings.sorting_bars, &mut self.rng);
                true
            }
            Msg::SetDelay(delay_ms) => {
                self.settings = Settings::update(|settings| settings.sorting_delay_ms = delay_ms);
                if self.playback.is_running() {
                    self.start_ticker(ctx);
                }
                true
            }
            Msg::SetAlgorithm(algorithm) => {
                if self.playback.is_running() {
                    return false;
                }
                self.settings = Settings::update(|settings| settings.sorting_algorithm = algorithm);
                self.keep_shown_values();
                self.discard_steps();
                true
            }
            Msg::ToggleExtended => {
                if self.playback.is_running() {
                    return false;
                }
                self.settings =
                    Settings::update(|settings| settings.sorting_extended = !settings.sorting_extended);
                self.discard_steps();
                sorting::resize_values(&mut self.values, self.settings.sorting_bars, &mut self.rng);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let running = self.playback.is_running();
        let step = self.current();
        let values = step.map_or(self.values.as_slice(), |step| step.values.as_slice());
        let max_value = values.iter().copied().max().unwrap_or(1).max(1);

        let on_bars = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::SetBars(input.value_as_number() as usize)
        });
        let on_delay = ctx.link().callback(|e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            Msg::SetDelay(input.value_as_number() as u32)
        });
        let on_algorithm = ctx.link().batch_callback(|e: Event| {
            let select = e.target_dyn_into::<HtmlSelectElement>()?;
            usize::try_from(select.selected_index())
                .ok()
                .and_then(|index| Algorithm::ALL.get(index).copied())
                .map(Msg::SetAlgorithm)
        });

        html! {
            <div class="sorting">
                <nav>
                    <select onchange={on_algorithm} disabled={running}>
                        {
                            for Algorithm::ALL.into_iter().map(|algorithm| html! {
                                <option selected={algorithm == self.settings.sorting_algorithm}>
                                    {algorithm.label()}
                                </option>
                            })
                        }
                    </select>
                    if running {
                        <button onclick={ctx.link().callback(|_| Msg::Pause)}>{"Pause"}</button>
                    } else {
                        <button onclick={ctx.link().callback(|_| Msg::Sort)}>{"Sort"}</button>
                    }
                    <button onclick={ctx.link().callback(|_| Msg::Shuffle)} disabled={running}>{"Shuffle"}</button>
                </nav>
                <div class="controls">
                    <label>
                        {format!("Bars: {}", self.settings.sorting_bars)}
                        <input type="range" min={MIN_BARS.to_string()} max={self.settings.max_bars().to_string()}
                            value={self.settings.sorting_bars.to_string()} oninput={on_bars} disabled={running}/>
                    </label>
                    <label>
                        {format!("Delay: {} ms", self.settings.sorting_delay_ms)}
                        <input type="range" min="0" max={MAX_DELAY_MS.to_string()}
                            value={self.settings.sorting_delay_ms.to_string()} oninput={on_delay}/>
                    </label>
                    <label>
                        <input type="checkbox" checked={self.settings.sorting_extended}
                            onchange={ctx.link().callback(|_| Msg::ToggleExtended)} disabled={running}/>
                        {"More bars"}
                    </label>
                </div>
                <div class="bars">
                    {
                        for values.iter().enumerate().map(|(index, &value)| {
                            let role = step.map_or(BarRole::Idle, |step| step.role(index));
                            let class = classes!(
                                "bar",
                                match role {
                                    BarRole::Sorted => "sorted",
                                    BarRole::Active => "active",
                                    BarRole::Comparing => "comparing",
                                    BarRole::Idle => "idle",
                                },
                            );
                            let style = format!("height: {:.2}%;", f64::from(value) * 100. / f64::from(max_value));
                            html! { <div {class} {style}/> }
                        })
                    }
                </div>
                <p class="status">
                    {format!("Step {} / {}", self.playback.index() + usize::from(!self.playback.is_empty()), self.playback.len())}
                </p>
            </div>
        }
    }
}

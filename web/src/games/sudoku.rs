use gloo::events::EventListener;
use minigames_core::sudoku::{Difficulty, EditOutcome, Highlight, MAX_STRIKES, SIZE, SudokuGame, SudokuState};
use minigames_core::{Coord, Coord2, Direction, Result};
use web_sys::{HtmlSelectElement, KeyboardEvent};
use yew::prelude::*;

use super::keydown_listener;
use crate::settings::Settings;

pub(crate) enum Msg {
    Key(KeyboardEvent),
    Select(Coord2),
    Input(u8),
    Clear,
    NewGame(Difficulty),
}

#[derive(Properties, Clone, PartialEq)]
pub(crate) struct SudokuProps {
    pub seed: u64,
}

pub(crate) struct SudokuView {
    game: SudokuGame,
    _keydown: EventListener,
}

fn apply(result: Result<EditOutcome>) -> bool {
    match result {
        Ok(outcome) => {
            if let EditOutcome::Strike(strikes) = outcome {
                log::debug!("wrong digit, strike {}", strikes);
            }
            outcome.has_update()
        }
        Err(err) => {
            log::debug!("rejected sudoku edit: {}", err);
            false
        }
    }
}

impl Component for SudokuView {
    type Message = Msg;
    type Properties = SudokuProps;

    fn create(ctx: &Context<Self>) -> Self {
        let difficulty = Settings::load().sudoku_difficulty;
        Self {
            game: SudokuGame::new(difficulty, ctx.props().seed),
            _keydown: keydown_listener(ctx.link().callback(Msg::Key)),
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Key(event) => {
                let key = event.key();
                let result = if let Some(direction) = Direction::from_key(&key) {
                    self.game.move_selection(direction)
                } else if let Some(digit) = key.parse::<u8>().ok().filter(|digit| (1..=9).contains(digit)) {
                    self.game.input(digit)
                } else if matches!(key.as_str(), "Backspace" | "Delete" | "0") {
                    self.game.clear()
                } else {
                    return false;
                };
                event.prevent_default();
                apply(result)
            }
            Msg::Select(coords) => apply(self.game.select(coords)),
            Msg::Input(digit) => apply(self.game.input(digit)),
            Msg::Clear => apply(self.game.clear()),
            Msg::NewGame(difficulty) => {
                Settings::update(|settings| settings.sudoku_difficulty = difficulty);
                self.game.new_game(difficulty);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let difficulty = self.game.difficulty();
        let onchange = ctx.link().batch_callback(|e: Event| {
            let select = e.target_dyn_into::<HtmlSelectElement>()?;
            let index = select.selected_index();
            usize::try_from(index)
                .ok()
                .and_then(|index| Difficulty::ALL.get(index).copied())
                .map(Msg::NewGame)
        });
        let status = match self.game.state() {
            SudokuState::Playing => format!("Mistakes: {}/{}", self.game.strikes(), MAX_STRIKES),
            SudokuState::Solved => "Solved!".to_string(),
            SudokuState::Failed => "Too many mistakes".to_string(),
        };

        html! {
            <div class="sudoku">
                <nav>
                    <select {onchange}>
                        {
                            for Difficulty::ALL.into_iter().map(|option| html! {
                                <option selected={option == difficulty}>{option.label()}</option>
                            })
                        }
                    </select>
                    <aside>{status}</aside>
                    <button onclick={ctx.link().callback(move |_| Msg::NewGame(difficulty))}>{"New game"}</button>
                </nav>
                <table class={classes!(self.game.is_finished().then_some("finished"))}>
                    {
                        for (0..SIZE as Coord).map(|row| html! {
                            <tr>
                                {
                                    for (0..SIZE as Coord).map(|col| {
                                        let coords = (row, col);
                                        let class = classes!(
                                            "cell",
                                            self.game.is_given(coords).then_some("given"),
                                            self.game.is_incorrect(coords).then_some("incorrect"),
                                            match self.game.highlight(coords) {
                                                Highlight::Selected => Some("selected"),
                                                Highlight::SameNumber => Some("same"),
                                                Highlight::Related => Some("related"),
                                                Highlight::None => None,
                                            },
                                        );
                                        let onclick = ctx.link().callback(move |_| Msg::Select(coords));
                                        html! {
                                            <td {class} {onclick}>
                                                {self.game.value(coords).map(|digit| Html::from(digit.to_string()))}
                                            </td>
                                        }
                                    })
                                }
                            </tr>
                        })
                    }
                </table>
                <div class="numpad">
                    {
                        for (1..=9u8).map(|digit| {
                            let onclick = ctx.link().callback(move |_| Msg::Input(digit));
                            html! { <button {onclick}>{digit}</button> }
                        })
                    }
                    <button onclick={ctx.link().callback(|_| Msg::Clear)}>{"Erase"}</button>
                </div>
            </div>
        }
    }
}

use minigames_core::tictactoe::{CELL_COUNT, Mark, Outcome, TicTacToe};
use yew::prelude::*;

use crate::ticker::Ticker;
use crate::utils::*;

const AI_DELAY_MS: u32 = 500;

impl StorageKey for TicTacToe {
    const KEY: &'static str = "minigames:tictactoe:v1";
}

pub(crate) enum Msg {
    Play(usize),
    AiTurn,
    Reset,
}

pub(crate) struct TicTacToeView {
    game: TicTacToe,
    ai_timer: Ticker,
}

impl TicTacToeView {
    fn schedule_ai(&mut self, ctx: &Context<Self>) {
        if self.game.is_ai_turn() && !self.ai_timer.is_active() {
            let link = ctx.link().clone();
            self.ai_timer.once(AI_DELAY_MS, move || link.send_message(Msg::AiTurn));
        }
    }

    fn status(&self) -> String {
        match self.game.outcome() {
            Outcome::Won(mark) if mark == Mark::HUMAN => "You win!".to_string(),
            Outcome::Won(_) => "AI wins!".to_string(),
            Outcome::Draw => "Draw!".to_string(),
            Outcome::InProgress if self.game.is_ai_turn() => "AI is thinking...".to_string(),
            Outcome::InProgress => "Your turn".to_string(),
        }
    }
}

impl Component for TicTacToeView {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let mut view = Self {
            game: LocalOrDefault::local_or_default(),
            ai_timer: Ticker::default(),
        };
        view.schedule_ai(ctx);
        view
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        let updated = match msg {
            Msg::Play(index) => match self.game.play(index) {
                Ok(outcome) => outcome.has_update(),
                Err(err) => {
                    log::debug!("rejected move at {}: {}", index, err);
                    false
                }
            },
            Msg::AiTurn => {
                self.ai_timer.stop();
                match self.game.ai_move() {
                    Ok(played) => played.is_some(),
                    Err(err) => {
                        log::debug!("ai could not move: {}", err);
                        false
                    }
                }
            }
            Msg::Reset => {
                self.ai_timer.stop();
                self.game.reset();
                true
            }
        };
        if updated {
            self.game.local_save();
            self.schedule_ai(ctx);
        }
        updated
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let board = self.game.board();
        let winning = board.winning_line();
        let finished = self.game.outcome().is_finished();
        let scores = self.game.scores();

        html! {
            <div class="tictactoe">
                <p class="status">{self.status()}</p>
                <div class={classes!("board", finished.then_some("finished"))}>
                    {
                        for (0..CELL_COUNT).map(|index| {
                            let mark = board.cell(index);
                            let class = classes!(
                                "cell",
                                mark.map(|mark| mark.symbol().to_lowercase()),
                                winning
                                    .is_some_and(|line| line.contains(&index))
                                    .then_some("winning"),
                            );
                            let onclick = ctx.link().callback(move |_| Msg::Play(index));
                            html! {
                                <button {class} {onclick} disabled={mark.is_some() || finished}>
                                    {mark.map_or("", |mark| mark.symbol())}
                                </button>
                            }
                        })
                    }
                </div>
                <table class="scores">
                    <tr><th>{"You"}</th><th>{"AI"}</th><th>{"Draws"}</th></tr>
                    <tr><td>{scores.player}</td><td>{scores.ai}</td><td>{scores.draws}</td></tr>
                </table>
                <button onclick={ctx.link().callback(|_| Msg::Reset)}>{"New game"}</button>
            </div>
        }
    }
}

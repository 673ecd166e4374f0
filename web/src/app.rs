use chrono::Datelike;
use clap::Args;
use minigames_protocol::{DEFAULT_API_BASE, GameId, ScoreSubmission, Submission, User};
use web_sys::HtmlSelectElement;
use yew::prelude::*;

use crate::api::{self, Api};
use crate::games::*;
use crate::utils::{js_random_seed, utc_now};

#[derive(Args, Properties, Debug, Clone, PartialEq)]
pub(crate) struct AppProps {
    /// Force a seed instead of random
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Base URL of the score API
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Card {
    TicTacToe,
    Twenty48,
    Snake,
    Sudoku,
    Sorting,
    Pathfinding,
}

impl Card {
    const ALL: [Card; 6] = [
        Self::TicTacToe,
        Self::Twenty48,
        Self::Snake,
        Self::Sudoku,
        Self::Sorting,
        Self::Pathfinding,
    ];

    const fn title(self) -> &'static str {
        match self {
            Self::TicTacToe => "Tic-tac-toe",
            Self::Twenty48 => "2048",
            Self::Snake => "Snake",
            Self::Sudoku => "Sudoku",
            Self::Sorting => "Sorting",
            Self::Pathfinding => "Pathfinding",
        }
    }

    const fn blurb(self) -> &'static str {
        match self {
            Self::TicTacToe => "Play against a minimax opponent",
            Self::Twenty48 => "Slide and merge tiles to reach 2048",
            Self::Snake => "Eat, grow and speed up",
            Self::Sudoku => "Three difficulties, three strikes",
            Self::Sorting => "Watch five sorting algorithms step by step",
            Self::Pathfinding => "Dijkstra, A* and BFS over a generated road network",
        }
    }

    /// Leaderboard the card reports to, if any.
    const fn game_id(self) -> Option<GameId> {
        match self {
            Self::Twenty48 => Some(GameId::Twenty48),
            Self::Snake => Some(GameId::Snake),
            Self::Sorting => Some(GameId::Sorting),
            Self::Pathfinding => Some(GameId::Pathfinding),
            Self::TicTacToe | Self::Sudoku => None,
        }
    }
}

pub(crate) enum Msg {
    Open(Card),
    Close,
    SignedIn(Option<User>),
    Logout,
    LoggedOut,
    SubmitScore(ScoreSubmission),
    Submitted(GameId, Submission),
    ShowLeaderboard(GameId),
}

pub(crate) struct MinigamesView {
    api: Api,
    seed: u64,
    open: Option<Card>,
    user: Option<User>,
    leaderboard: GameId,
    refresh: u32,
}

impl MinigamesView {
    fn card_seed(&self, card: Card) -> u64 {
        self.seed.wrapping_add(card as u64)
    }

    fn view_user_bar(&self, ctx: &Context<Self>) -> Html {
        html! {
            <header class="user-bar">
                <h2>{"Minigames"}</h2>
                if let Some(user) = &self.user {
                    <span>{format!("Signed in as {}", user.username)}</span>
                    <button onclick={ctx.link().callback(|_| Msg::Logout)}>{"Log out"}</button>
                } else {
                    <span>{"Playing as guest"}</span>
                }
            </header>
        }
    }

    fn view_cards(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="cards">
                {
                    for Card::ALL.into_iter().map(|card| {
                        let class = classes!("card", (self.open == Some(card)).then_some("selected"));
                        html! {
                            <button {class} onclick={ctx.link().callback(move |_| Msg::Open(card))}>
                                <h3>{card.title()}</h3>
                                <p>{card.blurb()}</p>
                            </button>
                        }
                    })
                }
            </div>
        }
    }

    fn view_game(&self, ctx: &Context<Self>, card: Card) -> Html {
        let seed = self.card_seed(card);
        let on_score = ctx.link().callback(Msg::SubmitScore);
        let game = match card {
            Card::TicTacToe => html! { <TicTacToeView/> },
            Card::Twenty48 => html! { <Twenty48View {seed} {on_score}/> },
            Card::Snake => html! { <SnakeView {seed} {on_score}/> },
            Card::Sudoku => html! { <SudokuView {seed}/> },
            Card::Sorting => html! { <SortingView {seed} {on_score}/> },
            Card::Pathfinding => html! { <PathfindingView {seed} {on_score}/> },
        };
        html! {
            <section class="game">
                <nav>
                    <h3>{card.title()}</h3>
                    <button onclick={ctx.link().callback(|_| Msg::Close)}>{"Close"}</button>
                </nav>
                {game}
            </section>
        }
    }

    fn view_leaderboard(&self, ctx: &Context<Self>) -> Html {
        let onchange = ctx.link().batch_callback(|e: Event| {
            let select = e.target_dyn_into::<HtmlSelectElement>()?;
            usize::try_from(select.selected_index())
                .ok()
                .and_then(|index| GameId::ALL.get(index).copied())
                .map(Msg::ShowLeaderboard)
        });
        html! {
            <aside class="scores">
                <select {onchange}>
                    {
                        for GameId::ALL.into_iter().map(|game| html! {
                            <option selected={game == self.leaderboard}>{game.title()}</option>
                        })
                    }
                </select>
                <LeaderboardView api={self.api.clone()} game={self.leaderboard} refresh={self.refresh}/>
            </aside>
        }
    }
}

impl Component for MinigamesView {
    type Message = Msg;
    type Properties = AppProps;

    fn create(ctx: &Context<Self>) -> Self {
        let props = ctx.props();
        let api = api::connect(&props.api);
        let seed = props.seed.unwrap_or_else(js_random_seed);
        log::debug!("seed: {}, api: {}", seed, props.api);

        let session = api.clone();
        ctx.link()
            .send_future(async move { Msg::SignedIn(session.authenticate().await) });

        Self {
            api,
            seed,
            open: None,
            user: None,
            leaderboard: GameId::Twenty48,
            refresh: 0,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Open(card) => {
                if self.open == Some(card) {
                    return false;
                }
                log::debug!("open {:?}", card);
                self.open = Some(card);
                if let Some(game) = card.game_id() {
                    self.leaderboard = game;
                }
                true
            }
            Msg::Close => self.open.take().is_some(),
            Msg::SignedIn(user) => {
                log::debug!("session: {:?}", user);
                self.user = user;
                true
            }
            Msg::Logout => {
                let api = self.api.clone();
                ctx.link().send_future(async move {
                    if let Err(err) = api.logout().await {
                        log::warn!("Logout failed: {}", err);
                    }
                    Msg::LoggedOut
                });
                false
            }
            Msg::LoggedOut => self.user.take().is_some(),
            Msg::SubmitScore(submission) => {
                let api = self.api.clone();
                ctx.link().send_future(async move {
                    let outcome = api.submit_score(submission).await;
                    Msg::Submitted(submission.game, outcome)
                });
                false
            }
            Msg::Submitted(game, outcome) => {
                if !outcome.is_accepted() {
                    return false;
                }
                if outcome == Submission::AcceptedAfterRetry {
                    // the retry re-authenticated, pick up the session
                    let api = self.api.clone();
                    ctx.link()
                        .send_future(async move { Msg::SignedIn(api.authenticate().await) });
                }
                self.refresh = self.refresh.wrapping_add(1);
                self.leaderboard == game
            }
            Msg::ShowLeaderboard(game) => {
                let changed = self.leaderboard != game;
                self.leaderboard = game;
                changed
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        html! {
            <div class="minigames">
                { self.view_user_bar(ctx) }
                { self.view_cards(ctx) }
                if let Some(card) = self.open {
                    { self.view_game(ctx, card) }
                }
                { self.view_leaderboard(ctx) }
                <footer>{format!("© {} George Richmond", utc_now().year())}</footer>
            </div>
        }
    }
}

use minigames_protocol::{GameId, ScoreEntry, ScoreQuery};
use yew::prelude::*;

use crate::api::Api;

pub(crate) enum Msg {
    Loaded(ScoreQuery, Vec<ScoreEntry>),
    Previous,
    Next,
}

#[derive(Properties, Clone, PartialEq)]
pub(crate) struct LeaderboardProps {
    pub api: Api,
    pub game: GameId,
    /// Bumped after a submission to re-fetch the current page.
    #[prop_or_default]
    pub refresh: u32,
}

pub(crate) struct LeaderboardView {
    query: ScoreQuery,
    entries: Vec<ScoreEntry>,
    loading: bool,
}

impl LeaderboardView {
    fn fetch(&mut self, ctx: &Context<Self>, query: ScoreQuery) {
        self.loading = true;
        let api = ctx.props().api.clone();
        ctx.link().send_future(async move {
            let entries = api.scores(query).await;
            Msg::Loaded(query, entries)
        });
    }
}

impl Component for LeaderboardView {
    type Message = Msg;
    type Properties = LeaderboardProps;

    fn create(ctx: &Context<Self>) -> Self {
        let query = ScoreQuery::first_page(ctx.props().game);
        let mut view = Self {
            query,
            entries: Vec::new(),
            loading: false,
        };
        view.fetch(ctx, query);
        view
    }

    fn changed(&mut self, ctx: &Context<Self>, old_props: &Self::Properties) -> bool {
        let props = ctx.props();
        if props.game != old_props.game {
            self.query = ScoreQuery::first_page(props.game);
            self.entries.clear();
        }
        self.fetch(ctx, self.query);
        true
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Loaded(query, entries) => {
                // a slower reply for another game or page
                if query != self.query {
                    return false;
                }
                self.loading = false;
                self.entries = entries;
                true
            }
            Msg::Previous => {
                if self.query.page == 0 {
                    return false;
                }
                self.query = self.query.previous();
                self.fetch(ctx, self.query);
                true
            }
            Msg::Next => {
                self.query = self.query.next();
                self.fetch(ctx, self.query);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let first_rank = self.query.page * self.query.size + 1;
        let has_next = self.entries.len() as u32 >= self.query.size;

        html! {
            <section class={classes!("leaderboard", self.loading.then_some("loading"))}>
                <h3>{format!("{} leaderboard", self.query.game.title())}</h3>
                if self.entries.is_empty() {
                    <p class="empty">
                        { if self.loading { "Loading scores…" } else { "No scores yet" } }
                    </p>
                } else {
                    <table>
                        <tr><th>{"#"}</th><th>{"Player"}</th><th>{"Score"}</th><th>{"Date"}</th></tr>
                        {
                            for self.entries.iter().zip(first_rank..).map(|(entry, rank)| html! {
                                <tr>
                                    <td>{rank}</td>
                                    <td>{&entry.username}</td>
                                    <td>{entry.score}</td>
                                    <td>{entry.display_date()}</td>
                                </tr>
                            })
                        }
                    </table>
                }
                <nav>
                    <button onclick={ctx.link().callback(|_| Msg::Previous)}
                        disabled={self.query.page == 0}>{"Previous"}</button>
                    <span>{format!("Page {}", self.query.page + 1)}</span>
                    <button onclick={ctx.link().callback(|_| Msg::Next)} disabled={!has_next}>{"Next"}</button>
                </nav>
            </section>
        }
    }
}

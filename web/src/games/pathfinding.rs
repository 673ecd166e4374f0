use std::rc::Rc;

use minigames_core::pathfinding::search::{self, Algorithm, SearchStep};
use minigames_core::pathfinding::traffic::{self, TrafficSim};
use minigames_core::pathfinding::{
    Graph, MAP_HEIGHT, MAP_WIDTH, NetworkConfig, NetworkGenerator, NodeId, Point, RandomNetworkGenerator,
};
use minigames_core::{GameRng, Playback, SpeedProfile, StepLog, seeded_rng};
use minigames_protocol::{GameId, ScoreSubmission};
use rand::Rng;
use web_sys::{Element, HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use super::{GameProps, ScoreLatch};
use crate::settings::{MAX_DELAY_MS, MAX_NODES, MIN_NODES, Settings};
use crate::ticker::Ticker;

/// Taps further than this from every node are ignored, in map units.
const TAP_RADIUS: f64 = 4.;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum TapMode {
    Start,
    Goal,
}

pub(crate) enum Msg {
    Tap(MouseEvent),
    SetTapMode(TapMode),
    Run,
    Pause,
    ClearRun,
    Regenerate,
    Tick,
    TrafficTick,
    SetAlgorithm(Algorithm),
    SetNodes(usize),
    SetDelay(u32),
    SetSparse(u8),
    SetMedium(u8),
    SetDensity(usize),
    ToggleGridCity,
    ToggleTraffic,
}

pub(crate) struct PathfindingView {
    settings: Settings,
    graph: Rc<Graph>,
    start: Option<NodeId>,
    goal: Option<NodeId>,
    tap_mode: TapMode,
    steps: Option<StepLog<SearchStep>>,
    playback: Playback,
    ticker: Ticker,
    traffic: Option<TrafficSim>,
    traffic_ticker: Ticker,
    latch: ScoreLatch,
    rng: GameRng,
    map_ref: NodeRef,
}

fn generate(settings: &Settings, seed: u64) -> Graph {
    let config = NetworkConfig::for_nodes(settings.node_count())
        .with_distribution(settings.sparse_percent, settings.medium_percent);
    RandomNetworkGenerator::new(seed).generate(&config)
}

/// Default endpoints on the left and right of the map.
fn default_endpoints(graph: &Graph) -> (Option<NodeId>, Option<NodeId>) {
    let start = graph.closest_node(Point::new(MAP_WIDTH * 0.1, MAP_HEIGHT / 2.));
    let goal = graph
        .closest_node(Point::new(MAP_WIDTH * 0.9, MAP_HEIGHT / 2.))
        .filter(|&goal| Some(goal) != start);
    (start, goal)
}

impl PathfindingView {
    fn discard_run(&mut self) {
        self.ticker.stop();
        self.steps = None;
        self.playback = Playback::new(0);
        self.latch.rearm();
    }

    fn regenerate(&mut self, ctx: &Context<Self>) {
        self.discard_run();
        let seed = self.rng.random();
        let graph = generate(&self.settings, seed);
        log::debug!(
            "network: {} nodes, {} roads",
            graph.node_count(),
            graph.edge_count()
        );
        (self.start, self.goal) = default_endpoints(&graph);
        self.graph = Rc::new(graph);
        self.sync_traffic(ctx);
    }

    fn sync_traffic(&mut self, ctx: &Context<Self>) {
        self.traffic_ticker.stop();
        self.traffic = None;
        if !self.settings.traffic {
            return;
        }
        let seed = self.rng.random();
        self.traffic = Some(TrafficSim::new(&self.graph, self.settings.traffic_density, seed));
        let link = ctx.link().clone();
        self.traffic_ticker
            .start(traffic::TICK_MS, move || link.send_message(Msg::TrafficTick));
    }

    fn current(&self) -> Option<&SearchStep> {
        self.steps.as_ref()?.at(self.playback.index())
    }

    fn start_ticker(&mut self, ctx: &Context<Self>) {
        let plan = SpeedProfile::PATHFINDING.plan(self.settings.path_delay_ms, self.playback.len());
        let link = ctx.link().clone();
        self.ticker.start(plan.delay_ms, move || link.send_message(Msg::Tick));
    }

    fn run(&mut self, ctx: &Context<Self>) -> bool {
        if self.playback.is_running() {
            return false;
        }
        let (Some(start), Some(goal)) = (self.start, self.goal) else {
            log::debug!("pick a start and a goal first");
            return false;
        };
        if self.steps.is_none() || self.playback.is_finished() {
            let algorithm = self.settings.path_algorithm;
            match search::build_steps(&self.graph, algorithm, start, goal) {
                Ok(steps) => {
                    self.playback = Playback::new(steps.len());
                    self.steps = Some(steps);
                    self.latch.rearm();
                }
                Err(err) => {
                    log::warn!("Could not search from {} to {}: {}", start, goal, err);
                    return false;
                }
            }
        }
        self.playback.play();
        self.start_ticker(ctx);
        true
    }

    fn tick(&mut self, ctx: &Context<Self>) -> bool {
        let plan = SpeedProfile::PATHFINDING.plan(self.settings.path_delay_ms, self.playback.len());
        let moved = self.playback.advance(plan.increment);
        if self.playback.is_finished() {
            self.ticker.stop();
            let submission = ScoreSubmission::new(GameId::Pathfinding, self.playback.len() as i64);
            self.latch.submit(&ctx.props().on_score, submission);
            return true;
        }
        moved
    }

    fn tap(&mut self, event: &MouseEvent) -> bool {
        if self.playback.is_running() {
            return false;
        }
        let Some(map) = self.map_ref.cast::<Element>() else {
            return false;
        };
        let rect = map.get_bounding_client_rect();
        if rect.width() <= 0. || rect.height() <= 0. {
            return false;
        }
        let point = Point::new(
            (f64::from(event.client_x()) - rect.left()) / rect.width() * MAP_WIDTH,
            (f64::from(event.client_y()) - rect.top()) / rect.height() * MAP_HEIGHT,
        );
        let Some(node) = self
            .graph
            .closest_node(point)
            .filter(|&node| self.graph.position(node).is_some_and(|pos| pos.distance(point) <= TAP_RADIUS))
        else {
            return false;
        };

        log::debug!("tap {:?} on {}", self.tap_mode, node);
        match self.tap_mode {
            TapMode::Start => {
                self.start = Some(node);
                self.tap_mode = TapMode::Goal;
            }
            TapMode::Goal => {
                self.goal = Some(node);
                self.tap_mode = TapMode::Start;
            }
        }
        self.discard_run();
        true
    }

    /// Applies a network setting and rebuilds the map.
    fn reconfigure(&mut self, ctx: &Context<Self>, change: impl FnOnce(&mut Settings)) -> bool {
        if self.playback.is_running() {
            return false;
        }
        self.settings = Settings::update(change);
        self.regenerate(ctx);
        true
    }

    fn view_map(&self, ctx: &Context<Self>) -> Html {
        let step = self.current();
        let in_path = |node: NodeId| step.is_some_and(|step| step.path.contains(&node));
        let node_radius = if self.graph.node_count() > 500 { 0.35 } else { 0.9 };

        let edges = self.graph.edges().iter().map(|edge| {
            let (Some(a), Some(b)) = (self.graph.position(edge.from), self.graph.position(edge.to)) else {
                return html! {};
            };
            let class = classes!(
                "edge",
                step.is_some_and(|step| step.path_edges.contains(&edge.id)).then_some("path"),
                step.is_some_and(|step| step.active_edge == Some(edge.id)).then_some("active"),
            );
            html! {
                <line {class} x1={a.x.to_string()} y1={a.y.to_string()} x2={b.x.to_string()} y2={b.y.to_string()}/>
            }
        });

        let nodes = self.graph.nodes().iter().map(|node| {
            let id = node.id;
            let class = classes!(
                "node",
                (self.start == Some(id)).then_some("start"),
                (self.goal == Some(id)).then_some("goal"),
                in_path(id).then_some("path"),
                step.is_some_and(|step| step.current == Some(id)).then_some("current"),
                step.is_some_and(|step| step.frontier.contains(id)).then_some("frontier"),
                step.is_some_and(|step| step.visited.contains(id)).then_some("visited"),
            );
            let marked = self.start == Some(id) || self.goal == Some(id);
            let r = if marked { node_radius * 1.8 } else { node_radius };
            html! {
                <circle {class} cx={node.pos.x.to_string()} cy={node.pos.y.to_string()} r={r.to_string()}>
                    <title>
                        {step.and_then(|step| step.distance(id)).map_or_else(
                            || id.to_string(),
                            |distance| format!("{} ({:.1})", id, distance),
                        )}
                    </title>
                </circle>
            }
        });

        let vehicles = self.traffic.iter().flat_map(|sim| sim.vehicles()).filter_map(|vehicle| {
            let pos = TrafficSim::position(&self.graph, vehicle)?;
            let class = classes!("vehicle", vehicle.waiting.then_some("waiting"));
            Some(html! {
                <rect {class} x={(pos.x - 0.6).to_string()} y={(pos.y - 0.6).to_string()} width="1.2" height="1.2"/>
            })
        });

        let view_box = format!("0 0 {} {}", MAP_WIDTH, MAP_HEIGHT);
        html! {
            <svg ref={self.map_ref.clone()} class="map" viewBox={view_box} onclick={ctx.link().callback(Msg::Tap)}>
                <g class="edges">{ for edges }</g>
                <g class="vehicles">{ for vehicles }</g>
                <g class="nodes">{ for nodes }</g>
            </svg>
        }
    }

    fn view_controls(&self, ctx: &Context<Self>) -> Html {
        let running = self.playback.is_running();
        let settings = &self.settings;

        let on_algorithm = ctx.link().batch_callback(|e: Event| {
            let select = e.target_dyn_into::<HtmlSelectElement>()?;
            usize::try_from(select.selected_index())
                .ok()
                .and_then(|index| Algorithm::ALL.get(index).copied())
                .map(Msg::SetAlgorithm)
        });
        let range_value = |e: &Event| e.target_unchecked_into::<HtmlInputElement>().value_as_number();
        let on_nodes = ctx.link().callback(move |e: Event| Msg::SetNodes(range_value(&e) as usize));
        let on_delay = ctx.link().callback(move |e: InputEvent| Msg::SetDelay(range_value(&e) as u32));
        let on_sparse = ctx.link().callback(move |e: Event| Msg::SetSparse(range_value(&e) as u8));
        let on_medium = ctx.link().callback(move |e: Event| Msg::SetMedium(range_value(&e) as u8));
        let on_density = ctx.link().callback(move |e: Event| Msg::SetDensity(range_value(&e) as usize));

        html! {
            <>
                <nav>
                    <select onchange={on_algorithm} disabled={running}>
                        {
                            for Algorithm::ALL.into_iter().map(|algorithm| html! {
                                <option selected={algorithm == settings.path_algorithm}>{algorithm.label()}</option>
                            })
                        }
                    </select>
                    if running {
                        <button onclick={ctx.link().callback(|_| Msg::Pause)}>{"Pause"}</button>
                    } else {
                        <button onclick={ctx.link().callback(|_| Msg::Run)}
                            disabled={self.start.is_none() || self.goal.is_none()}>{"Run"}</button>
                    }
                    <button onclick={ctx.link().callback(|_| Msg::ClearRun)} disabled={running}>{"Clear"}</button>
                    <button onclick={ctx.link().callback(|_| Msg::Regenerate)} disabled={running}>{"New map"}</button>
                </nav>
                <div class="controls">
                    <span class="tap-mode">
                        {"Tap sets: "}
                        <button class={classes!((self.tap_mode == TapMode::Start).then_some("selected"))}
                            onclick={ctx.link().callback(|_| Msg::SetTapMode(TapMode::Start))}>{"Start"}</button>
                        <button class={classes!((self.tap_mode == TapMode::Goal).then_some("selected"))}
                            onclick={ctx.link().callback(|_| Msg::SetTapMode(TapMode::Goal))}>{"Goal"}</button>
                    </span>
                    <label>
                        {format!("Nodes: {}", settings.path_nodes)}
                        <input type="range" min={MIN_NODES.to_string()} max={MAX_NODES.to_string()}
                            value={settings.path_nodes.to_string()} onchange={on_nodes}
                            disabled={running || settings.grid_city}/>
                    </label>
                    <label>
                        {format!("Delay: {} ms", settings.path_delay_ms)}
                        <input type="range" min="0" max={MAX_DELAY_MS.to_string()}
                            value={settings.path_delay_ms.to_string()} oninput={on_delay}/>
                    </label>
                    <label>
                        {format!("Sparse: {}%", settings.sparse_percent)}
                        <input type="range" min="0" max="100"
                            value={settings.sparse_percent.to_string()} onchange={on_sparse} disabled={running}/>
                    </label>
                    <label>
                        {format!("Medium: {}%", settings.medium_percent)}
                        <input type="range" min="0" max={(100 - settings.sparse_percent).to_string()}
                            value={settings.medium_percent.to_string()} onchange={on_medium} disabled={running}/>
                    </label>
                    <label>
                        <input type="checkbox" checked={settings.grid_city} disabled={running}
                            onchange={ctx.link().callback(|_| Msg::ToggleGridCity)}/>
                        {"Grid city"}
                    </label>
                    <label>
                        <input type="checkbox" checked={settings.traffic}
                            onchange={ctx.link().callback(|_| Msg::ToggleTraffic)}/>
                        {"Traffic"}
                    </label>
                    if settings.traffic {
                        <label>
                            {format!("Vehicles: {}", settings.traffic_density)}
                            <input type="range" min="1" max={traffic::MAX_DENSITY.to_string()}
                                value={settings.traffic_density.to_string()} onchange={on_density}/>
                        </label>
                    }
                </div>
            </>
        }
    }
}

impl Component for PathfindingView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let settings = Settings::load();
        let mut rng = seeded_rng(ctx.props().seed);
        let graph = generate(&settings, rng.random());
        let (start, goal) = default_endpoints(&graph);
        let mut view = Self {
            settings,
            graph: Rc::new(graph),
            start,
            goal,
            tap_mode: TapMode::Start,
            steps: None,
            playback: Playback::new(0),
            ticker: Ticker::default(),
            traffic: None,
            traffic_ticker: Ticker::default(),
            latch: ScoreLatch::default(),
            rng,
            map_ref: NodeRef::default(),
        };
        view.sync_traffic(ctx);
        view
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Tap(event) => self.tap(&event),
            Msg::SetTapMode(mode) => {
                let changed = self.tap_mode != mode;
                self.tap_mode = mode;
                changed
            }
            Msg::Run => self.run(ctx),
            Msg::Pause => {
                self.playback.pause();
                self.ticker.stop();
                true
            }
            Msg::ClearRun => {
                self.discard_run();
                true
            }
            Msg::Regenerate => {
                if self.playback.is_running() {
                    return false;
                }
                self.regenerate(ctx);
                true
            }
            Msg::Tick => self.tick(ctx),
            Msg::TrafficTick => match self.traffic.as_mut() {
                Some(sim) => {
                    sim.tick(&self.graph);
                    true
                }
                None => false,
            },
            Msg::SetAlgorithm(algorithm) => {
                if self.playback.is_running() {
                    return false;
                }
                self.settings = Settings::update(|settings| settings.path_algorithm = algorithm);
                self.discard_run();
                true
            }
            Msg::SetNodes(nodes) => self.reconfigure(ctx, |settings| settings.path_nodes = nodes),
            Msg::SetSparse(percent) => {
                self.reconfigure(ctx, |settings| settings.sparse_percent = percent)
            }
            Msg::SetMedium(percent) => {
                self.reconfigure(ctx, |settings| settings.medium_percent = percent)
            }
            Msg::ToggleGridCity => {
                self.reconfigure(ctx, |settings| settings.grid_city = !settings.grid_city)
            }
            Msg::SetDelay(delay_ms) => {
                self.settings = Settings::update(|settings| settings.path_delay_ms = delay_ms);
                if self.playback.is_running() {
                    self.start_ticker(ctx);
                }
                true
            }
            Msg::SetDensity(density) => {
                self.settings = Settings::update(|settings| settings.traffic_density = density);
                self.sync_traffic(ctx);
                true
            }
            Msg::ToggleTraffic => {
                self.settings = Settings::update(|settings| settings.traffic = !settings.traffic);
                self.sync_traffic(ctx);
                true
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let status = match self.current() {
            Some(step) => step.message(),
            None => match (self.start, self.goal) {
                (None, _) => "Tap a node to set the start".to_string(),
                (_, None) => "Tap a node to set the goal".to_string(),
                _ => "Ready".to_string(),
            },
        };
        let cost = self
            .current()
            .filter(|step| step.found_path())
            .and_then(|step| self.graph.path_cost(&step.path));

        html! {
            <div class="pathfinding">
                { self.view_controls(ctx) }
                { self.view_map(ctx) }
                <p class="status">
                    {status}
                    if let Some(cost) = cost {
                        {format!(" · cost {:.1}", cost)}
                    }
                    {format!(" · step {} / {}", self.playback.index() + usize::from(!self.playback.is_empty()), self.playback.len())}
                </p>
            </div>
        }
    }
}

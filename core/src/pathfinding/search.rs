//! Instrumented graph searches producing replayable step logs.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::*;
use crate::{GameError, Result, StepLog};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    #[default]
    Dijkstra,
    AStar,
    Bfs,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Self::Dijkstra, Self::AStar, Self::Bfs];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dijkstra => "Dijkstra",
            Self::AStar => "A* (A-star)",
            Self::Bfs => "BFS (unweighted)",
        }
    }
}

/// What happened in a step, rendered as the status line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchEvent {
    Start(Algorithm),
    StartIsGoal,
    Visit(NodeId),
    ReachedGoal(NodeId),
    Relax { from: NodeId, to: NodeId },
    Consider { from: NodeId, to: NodeId },
    Update(NodeId),
    Dequeue(NodeId),
    Discover(NodeId),
    /// `algorithm` is `None` for the trivial start-equals-goal run.
    Done {
        algorithm: Option<Algorithm>,
        found: bool,
    },
}

impl fmt::Display for SearchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use SearchEvent::*;
        match *self {
            Start(Algorithm::Dijkstra) => f.write_str("Start"),
            Start(Algorithm::AStar) => f.write_str("Start (A*)"),
            Start(Algorithm::Bfs) => f.write_str("Start (BFS)"),
            StartIsGoal => f.write_str("Start = Goal"),
            Visit(_) => f.write_str("Visit node"),
            ReachedGoal(_) => f.write_str("Reached goal"),
            Relax { from, to } => write!(f, "Relax {} → {}", from, to),
            Consider { from, to } => write!(f, "Consider {} → {}", from, to),
            Update(to) => write!(f, "Update best path to {}", to),
            Dequeue(_) => f.write_str("Dequeue node"),
            Discover(to) => write!(f, "Discover {}", to),
            Done {
                algorithm: None, ..
            } => f.write_str("Done"),
            Done { found: false, .. } => f.write_str("Done: no path"),
            Done {
                algorithm: Some(Algorithm::Dijkstra),
                ..
            } => f.write_str("Done: shortest path found"),
            Done { .. } => f.write_str("Done: path found"),
        }
    }
}

/// Snapshot of a search. Distances are shared between steps until they change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchStep {
    pub current: Option<NodeId>,
    pub frontier: NodeSet,
    pub visited: NodeSet,
    /// Best-known distance per node, absent for unweighted search.
    pub distances: Option<Arc<[f64]>>,
    pub active_edge: Option<EdgeId>,
    pub path: Vec<NodeId>,
    pub path_edges: Vec<EdgeId>,
    pub done: bool,
    pub event: SearchEvent,
}

impl SearchStep {
    pub fn message(&self) -> String {
        self.event.to_string()
    }

    pub fn distance(&self, node: NodeId) -> Option<f64> {
        let distance = *self.distances.as_ref()?.get(node.index())?;
        distance.is_finite().then_some(distance)
    }

    pub fn found_path(&self) -> bool {
        self.done && !self.path.is_empty()
    }
}

pub fn build_steps(
    graph: &Graph,
    algorithm: Algorithm,
    start: NodeId,
    goal: NodeId,
) -> Result<StepLog<SearchStep>> {
    check_nodes(graph, start, goal)?;
    let mut search = Search::new(graph, start, goal, true);
    if start == goal {
        search.trivial();
    } else {
        search.run(algorithm);
    }
    log::debug!(
        "{} from {} to {} took {} steps",
        algorithm.label(),
        start,
        goal,
        search.steps.len()
    );
    Ok(StepLog::new(search.steps))
}

/// Path found by `algorithm` without recording steps. Empty when unreachable.
pub fn shortest_path(
    graph: &Graph,
    algorithm: Algorithm,
    start: NodeId,
    goal: NodeId,
) -> Result<Vec<NodeId>> {
    check_nodes(graph, start, goal)?;
    if start == goal {
        return Ok(vec![start]);
    }
    let mut search = Search::new(graph, start, goal, false);
    search.run(algorithm);
    Ok(search.reconstruct_path())
}

/// Fewest-roads path, empty when unreachable or either node is unknown.
pub fn shortest_hop_path(graph: &Graph, start: NodeId, goal: NodeId) -> Vec<NodeId> {
    if check_nodes(graph, start, goal).is_err() {
        return Vec::new();
    }
    let mut prev: Vec<Option<NodeId>> = vec![None; graph.node_count()];
    let mut seen = NodeSet::with_capacity(graph.node_count());
    let mut queue = VecDeque::from([start]);
    seen.insert(start);
    while let Some(node) = queue.pop_front() {
        if node == goal {
            break;
        }
        for neighbor in graph.neighbors(node) {
            if seen.insert(neighbor.to) {
                prev[neighbor.to.index()] = Some(node);
                queue.push_back(neighbor.to);
            }
        }
    }
    reconstruct(&prev, start, goal)
}

fn check_nodes(graph: &Graph, start: NodeId, goal: NodeId) -> Result<()> {
    if graph.contains(start) && graph.contains(goal) {
        Ok(())
    } else {
        Err(GameError::UnknownNode)
    }
}

/// Walks predecessors back from `goal`; empty when the chain never reaches `start`.
fn reconstruct(prev: &[Option<NodeId>], start: NodeId, goal: NodeId) -> Vec<NodeId> {
    let mut path = vec![goal];
    let mut node = goal;
    while node != start {
        match prev[node.index()] {
            Some(parent) if path.len() <= prev.len() => {
                path.push(parent);
                node = parent;
            }
            _ => return Vec::new(),
        }
    }
    path.reverse();
    path
}

struct Search<'a> {
    graph: &'a Graph,
    start: NodeId,
    goal: NodeId,
    record: bool,
    steps: Vec<SearchStep>,
    frontier: NodeSet,
    visited: NodeSet,
    dist: Vec<f64>,
    /// `dist` as of the last snapshot, `None` once it has changed since.
    shared_dist: Option<Arc<[f64]>>,
    prev: Vec<Option<NodeId>>,
}

impl<'a> Search<'a> {
    fn new(graph: &'a Graph, start: NodeId, goal: NodeId, record: bool) -> Self {
        let len = graph.node_count();
        Self {
            graph,
            start,
            goal,
            record,
            steps: Vec::new(),
            frontier: NodeSet::with_capacity(len),
            visited: NodeSet::with_capacity(len),
            dist: vec![f64::INFINITY; len],
            shared_dist: None,
            prev: vec![None; len],
        }
    }

    fn run(&mut self, algorithm: Algorithm) {
        match algorithm {
            Algorithm::Dijkstra => self.best_first(algorithm, |_| 0.),
            Algorithm::AStar => {
                let graph = self.graph;
                let goal = self.goal;
                self.best_first(algorithm, move |node| {
                    graph.distance(node, goal).unwrap_or(0.)
                })
            }
            Algorithm::Bfs => self.breadth_first(),
        }
    }

    fn set_dist(&mut self, node: NodeId, value: f64) {
        self.dist[node.index()] = value;
        self.shared_dist = None;
    }

    fn distances(&mut self) -> Arc<[f64]> {
        self.shared_dist
            .get_or_insert_with(|| Arc::from(self.dist.as_slice()))
            .clone()
    }

    fn push(&mut self, event: SearchEvent, current: Option<NodeId>, weighted: bool) {
        self.push_with(event, current, weighted, None, None);
    }

    fn push_with(
        &mut self,
        event: SearchEvent,
        current: Option<NodeId>,
        weighted: bool,
        active_edge: Option<EdgeId>,
        also_frontier: Option<NodeId>,
    ) {
        if !self.record {
            return;
        }
        let mut frontier = self.frontier.clone();
        if let Some(extra) = also_frontier {
            frontier.insert(extra);
        }
        let distances = weighted.then(|| self.distances());
        self.steps.push(SearchStep {
            current,
            frontier,
            visited: self.visited.clone(),
            distances,
            active_edge,
            path: Vec::new(),
            path_edges: Vec::new(),
            done: false,
            event,
        });
    }

    fn reconstruct_path(&self) -> Vec<NodeId> {
        reconstruct(&self.prev, self.start, self.goal)
    }

    fn finish(&mut self, algorithm: Algorithm, weighted: bool) {
        if !self.record {
            return;
        }
        let path = self.reconstruct_path();
        let path_edges = self.graph.edges_for_path(&path);
        let distances = weighted.then(|| self.distances());
        self.steps.push(SearchStep {
            current: Some(self.goal),
            frontier: NodeSet::default(),
            visited: self.visited.clone(),
            distances,
            active_edge: None,
            done: true,
            event: SearchEvent::Done {
                algorithm: Some(algorithm),
                found: !path.is_empty(),
            },
            path,
            path_edges,
        });
    }

    fn trivial(&mut self) {
        self.frontier.insert(self.start);
        self.visited.insert(self.start);
        self.push(SearchEvent::StartIsGoal, Some(self.start), false);
        self.steps.push(SearchStep {
            current: None,
            frontier: NodeSet::default(),
            visited: self.visited.clone(),
            distances: None,
            active_edge: None,
            path: vec![self.start],
            path_edges: Vec::new(),
            done: true,
            event: SearchEvent::Done {
                algorithm: None,
                found: true,
            },
        });
    }

    /// Dijkstra and A*: repeatedly expands the frontier node with the lowest
    /// `dist + heuristic`, scanning the frontier linearly.
    fn best_first(&mut self, algorithm: Algorithm, heuristic: impl Fn(NodeId) -> f64) {
        let (start, goal) = (self.start, self.goal);
        let mut priority = vec![f64::INFINITY; self.graph.node_count()];
        self.set_dist(start, 0.);
        priority[start.index()] = heuristic(start);
        self.frontier.insert(start);
        self.push(SearchEvent::Start(algorithm), Some(start), true);

        loop {
            let lowest = self
                .frontier
                .iter()
                .min_by(|a, b| priority[a.index()].total_cmp(&priority[b.index()]));
            let Some(node) = lowest else {
                break;
            };
            self.frontier.remove(node);
            if !self.visited.insert(node) {
                continue;
            }

            let event = if node == goal {
                SearchEvent::ReachedGoal(node)
            } else {
                SearchEvent::Visit(node)
            };
            self.push(event, Some(node), true);
            if node == goal {
                break;
            }

            let graph = self.graph;
            for neighbor in graph.neighbors(node) {
                let to = neighbor.to;
                if self.visited.contains(to) {
                    continue;
                }
                let candidate = self.dist[node.index()] + neighbor.weight;
                let probe = match algorithm {
                    Algorithm::AStar => SearchEvent::Consider { from: node, to },
                    _ => SearchEvent::Relax { from: node, to },
                };
                self.push_with(probe, Some(node), true, Some(neighbor.edge), Some(to));

                self.frontier.insert(to);
                if candidate < self.dist[to.index()] {
                    self.set_dist(to, candidate);
                    self.prev[to.index()] = Some(node);
                    priority[to.index()] = candidate + heuristic(to);
                    self.push_with(
                        SearchEvent::Update(to),
                        Some(node),
                        true,
                        Some(neighbor.edge),
                        None,
                    );
                }
            }
        }

        self.finish(algorithm, true);
    }

    fn breadth_first(&mut self) {
        let (start, goal) = (self.start, self.goal);
        let mut queue = VecDeque::from([start]);
        self.visited.insert(start);
        self.frontier.insert(start);
        self.push(SearchEvent::Start(Algorithm::Bfs), Some(start), false);

        while let Some(node) = queue.pop_front() {
            self.frontier.remove(node);
            let event = if node == goal {
                SearchEvent::ReachedGoal(node)
            } else {
                SearchEvent::Dequeue(node)
            };
            self.push(event, Some(node), false);
            if node == goal {
                break;
            }

            let graph = self.graph;
            for neighbor in graph.neighbors(node) {
                let to = neighbor.to;
                if !self.visited.insert(to) {
                    continue;
                }
                self.prev[to.index()] = Some(node);
                queue.push_back(to);
                self.frontier.insert(to);
                self.push_with(
                    SearchEvent::Discover(to),
                    Some(node),
                    false,
                    Some(neighbor.edge),
                    None,
                );
            }
        }

        self.finish(Algorithm::Bfs, false);
    }
}

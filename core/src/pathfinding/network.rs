use hashbrown::HashSet;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use super::*;
use crate::seeded_rng;

pub const MAP_WIDTH: f64 = 100.;
pub const MAP_HEIGHT: f64 = 60.;
const MARGIN: f64 = 2.5;

pub const DEFAULT_NODES: usize = 40;
pub const GRID_CITY_NODES: usize = 2000;

/// Layout and degree parameters for a generated road network.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub node_count: usize,
    pub max_edge_distance: f64,
    pub min_node_spacing: f64,
    /// Percentage of nodes that get one or two roads.
    pub sparse_percent: u8,
    /// Percentage of nodes that get three or four roads; the rest get five.
    pub medium_percent: u8,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::for_nodes(DEFAULT_NODES)
    }
}

impl NetworkConfig {
    pub fn for_nodes(node_count: usize) -> Self {
        let (max_edge_distance, min_node_spacing) = match node_count {
            1000.. => (12., 0.8),
            200.. => (12., 2.),
            100.. => (12., 3.),
            _ => (20., 10.),
        };
        Self {
            node_count,
            max_edge_distance,
            min_node_spacing,
            sparse_percent: 85,
            medium_percent: 10,
        }
    }

    pub fn with_distribution(mut self, sparse_percent: u8, medium_percent: u8) -> Self {
        self.sparse_percent = sparse_percent.min(100);
        self.medium_percent = medium_percent.min(100 - self.sparse_percent);
        self
    }

    pub fn dense_percent(&self) -> u8 {
        100u8.saturating_sub(self.sparse_percent.saturating_add(self.medium_percent))
    }

    fn grid_multiplier(&self) -> f64 {
        if self.node_count >= 1000 { 2.5 } else { 1.8 }
    }

    fn target_degree<R: Rng>(&self, rng: &mut R) -> usize {
        let sparse_cutoff = f64::from(self.sparse_percent) / 100.;
        let medium_cutoff = sparse_cutoff + f64::from(self.medium_percent) / 100.;
        let roll: f64 = rng.random();
        if roll < sparse_cutoff {
            if rng.random_bool(0.6) { 1 } else { 2 }
        } else if roll < medium_cutoff {
            if rng.random_bool(0.5) { 3 } else { 4 }
        } else {
            5
        }
    }
}

/// Proper crossing test. Segments that share an endpoint never cross.
pub fn segments_intersect(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    if p1 == p3 || p1 == p4 || p2 == p3 || p2 == p4 {
        return false;
    }
    let ccw = |a: Point, b: Point, c: Point| (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x);
    ccw(p1, p3, p4) != ccw(p2, p3, p4) && ccw(p1, p2, p3) != ccw(p1, p2, p4)
}

pub trait NetworkGenerator {
    fn generate(self, config: &NetworkConfig) -> Graph;
}

/// Jittered-grid node placement, nearest-neighbour roads without crossings,
/// then bridges until the network is a single component.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomNetworkGenerator {
    seed: u64,
}

impl RandomNetworkGenerator {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl NetworkGenerator for RandomNetworkGenerator {
    fn generate(self, config: &NetworkConfig) -> Graph {
        let mut rng = seeded_rng(self.seed);

        let positions = place_nodes(config, &mut rng);
        if positions.len() < config.node_count {
            log::warn!(
                "Network only fits {} of {} requested nodes",
                positions.len(),
                config.node_count
            );
        }

        let mut roads = Roads::new(&positions);
        for index in 0..positions.len() {
            let target = config.target_degree(&mut rng);
            roads.connect_nearest(NodeId(index as u32), target, config.max_edge_distance);
        }
        let bridges = roads.bridge_components();
        log::debug!(
            "generated network with {} nodes, {} roads, {} bridges",
            positions.len(),
            roads.links.len(),
            bridges
        );

        let Roads { links, .. } = roads;
        match Graph::new(positions, links) {
            Ok(graph) => graph,
            Err(err) => {
                log::warn!("Generated network was invalid: {}", err);
                Graph::default()
            }
        }
    }
}

fn place_nodes<R: Rng>(config: &NetworkConfig, rng: &mut R) -> Vec<Point> {
    let count = config.node_count;
    if count == 0 {
        return Vec::new();
    }

    let cols = (count as f64 * config.grid_multiplier()).sqrt().ceil() as usize;
    let rows = count.div_ceil(cols);
    let cell_width = (MAP_WIDTH - 2. * MARGIN) / cols as f64;
    let cell_height = (MAP_HEIGHT - 2. * MARGIN) / rows as f64;

    let mut cells: Vec<(usize, usize)> = (0..rows)
        .flat_map(|row| (0..cols).map(move |col| (row, col)))
        .collect();
    cells.shuffle(rng);

    let mut positions: Vec<Point> = Vec::with_capacity(count);
    for (row, col) in cells {
        if positions.len() >= count {
            break;
        }
        let jitter = 0.5 + rng.random::<f64>() * 0.3;
        let jitter_x = (rng.random::<f64>() - 0.5) * cell_width * jitter;
        let jitter_y = (rng.random::<f64>() - 0.5) * cell_height * jitter;
        let x = col as f64 * cell_width + MARGIN + cell_width / 2. + jitter_x;
        let y = row as f64 * cell_height + MARGIN + cell_height / 2. + jitter_y;
        let candidate = Point::new(
            x.clamp(MARGIN, MAP_WIDTH - MARGIN),
            y.clamp(MARGIN, MAP_HEIGHT - MARGIN),
        );

        let too_close = positions
            .iter()
            .any(|existing| existing.distance(candidate) < config.min_node_spacing);
        if !too_close {
            positions.push(candidate);
        }
    }
    positions
}

struct Roads<'a> {
    positions: &'a [Point],
    links: Vec<(NodeId, NodeId)>,
    keys: HashSet<(NodeId, NodeId)>,
}

impl<'a> Roads<'a> {
    fn new(positions: &'a [Point]) -> Self {
        Self {
            positions,
            links: Vec::new(),
            keys: HashSet::new(),
        }
    }

    fn pos(&self, id: NodeId) -> Point {
        self.positions[id.index()]
    }

    fn crosses_existing(&self, a: NodeId, b: NodeId) -> bool {
        let (pa, pb) = (self.pos(a), self.pos(b));
        self.links
            .iter()
            .any(|&(c, d)| segments_intersect(pa, pb, self.pos(c), self.pos(d)))
    }

    fn add(&mut self, a: NodeId, b: NodeId) -> bool {
        if !self.keys.insert(edge_key(a, b)) {
            return false;
        }
        self.links.push((a, b));
        true
    }

    /// Links `node` to up to `target` nearest nodes within `max_distance`.
    fn connect_nearest(&mut self, node: NodeId, target: usize, max_distance: f64) {
        let origin = self.pos(node);
        let mut by_distance: Vec<(f64, NodeId)> = (0..self.positions.len())
            .map(|index| NodeId(index as u32))
            .filter(|&other| other != node)
            .map(|other| (origin.distance(self.pos(other)), other))
            .filter(|&(distance, _)| distance <= max_distance)
            .collect();
        by_distance.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut added = 0;
        for (_, other) in by_distance {
            if added >= target {
                break;
            }
            if self.keys.contains(&edge_key(node, other)) || self.crosses_existing(node, other) {
                continue;
            }
            if self.add(node, other) {
                added += 1;
            }
        }
    }

    /// Joins consecutive components with their closest non-crossing pair of
    /// nodes, or their closest pair if every candidate crosses a road.
    fn bridge_components(&mut self) -> usize {
        let mut sets = UnionFind::new(self.positions.len());
        for &(a, b) in &self.links {
            sets.union(a, b);
        }
        let groups = sets.groups();

        let mut bridges = 0;
        for pair in groups.windows(2) {
            let mut candidates: Vec<(f64, NodeId, NodeId)> = pair[0]
                .iter()
                .flat_map(|&a| pair[1].iter().map(move |&b| (a, b)))
                .map(|(a, b)| (self.pos(a).distance(self.pos(b)), a, b))
                .collect();
            candidates.sort_by(|x, y| x.0.total_cmp(&y.0));

            let chosen = candidates
                .iter()
                .find(|&&(_, a, b)| !self.crosses_existing(a, b))
                .or(candidates.first());
            if let Some(&(_, a, b)) = chosen
                && self.add(a, b)
            {
                bridges += 1;
            }
        }
        bridges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate(nodes: usize, seed: u64) -> Graph {
        RandomNetworkGenerator::new(seed).generate(&NetworkConfig::for_nodes(nodes))
    }

    #[test]
    fn config_scales_with_node_count() {
        assert_eq!(NetworkConfig::for_nodes(40).max_edge_distance, 20.);
        assert_eq!(NetworkConfig::for_nodes(40).min_node_spacing, 10.);
        assert_eq!(NetworkConfig::for_nodes(100).min_node_spacing, 3.);
        assert_eq!(NetworkConfig::for_nodes(500).min_node_spacing, 2.);
        assert_eq!(NetworkConfig::for_nodes(2000).min_node_spacing, 0.8);
        assert_eq!(NetworkConfig::for_nodes(2000).max_edge_distance, 12.);

        let config = NetworkConfig::default().with_distribution(90, 50);
        assert_eq!((config.medium_percent, config.dense_percent()), (10, 0));
    }

    #[test]
    fn segments_cross_only_properly() {
        let p = Point::new;
        assert!(segments_intersect(p(0., 0.), p(4., 4.), p(0., 4.), p(4., 0.)));
        assert!(!segments_intersect(p(0., 0.), p(1., 1.), p(3., 0.), p(4., 1.)));
        assert!(!segments_intersect(p(0., 0.), p(4., 4.), p(4., 4.), p(8., 0.)));
    }

    #[test]
    fn generated_networks_are_connected() {
        for (nodes, seed) in [(20, 1), (40, 2), (40, 3), (100, 4), (250, 5)] {
            let graph = generate(nodes, seed);
            assert!(graph.node_count() > 0);
            assert!(graph.is_connected(), "{} nodes, seed {}", nodes, seed);
        }
    }

    #[test]
    fn nodes_stay_on_the_map_and_apart() {
        let config = NetworkConfig::for_nodes(60);
        let graph = RandomNetworkGenerator::new(8).generate(&config);
        for node in graph.nodes() {
            assert!((MARGIN..=MAP_WIDTH - MARGIN).contains(&node.pos.x));
            assert!((MARGIN..=MAP_HEIGHT - MARGIN).contains(&node.pos.y));
            for other in graph.nodes().iter().filter(|o| o.id != node.id) {
                assert!(node.pos.distance(other.pos) >= config.min_node_spacing);
            }
        }
    }

    #[test]
    fn roads_are_unique_and_never_loop() {
        let graph = generate(80, 12);
        let mut keys = HashSet::new();
        for edge in graph.edges() {
            assert_ne!(edge.from, edge.to);
            assert!(keys.insert(edge.key()));
        }
    }

    #[test]
    fn same_seed_same_network() {
        assert_eq!(generate(50, 77), generate(50, 77));
        assert_ne!(generate(50, 77), generate(50, 78));
    }

    #[test]
    fn empty_config_gives_empty_graph() {
        let graph = generate(0, 1);
        assert!(graph.is_empty());
        assert!(graph.is_connected());
    }
}

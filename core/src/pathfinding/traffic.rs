//! Toy traffic: vehicles drive shortest-hop routes between map edges and give
//! way at nodes by priority.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::search::shortest_hop_path;
use super::*;
use crate::{GameRng, seeded_rng};

pub const TICK_MS: u32 = 50;
pub const DEFAULT_DENSITY: usize = 10;
pub const MAX_DENSITY: usize = 50;

/// Progress is counted in tenths of a road.
const FULL_ROAD: u8 = 10;
const HOLD_AT: u8 = 9;

/// Nodes close to the map border, where vehicles enter and leave.
pub fn is_boundary(pos: Point) -> bool {
    pos.x < 15. || pos.x > 85. || pos.y < 10. || pos.y > 47.
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u32,
    pub current: NodeId,
    pub goal: NodeId,
    pub path: Vec<NodeId>,
    pub path_index: usize,
    /// Lower numbers go first.
    pub priority: u32,
    pub waiting: bool,
    progress: u8,
}

impl Vehicle {
    pub fn next_node(&self) -> Option<NodeId> {
        self.path.get(self.path_index + 1).copied()
    }

    pub fn has_arrived(&self) -> bool {
        self.path_index + 1 >= self.path.len()
    }

    /// Fraction of the current road already driven.
    pub fn progress(&self) -> f64 {
        f64::from(self.progress) / f64::from(FULL_ROAD)
    }

    fn heads_into(&self, node: NodeId) -> bool {
        !self.waiting && self.next_node() == Some(node)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrafficSim {
    vehicles: Vec<Vehicle>,
    boundary: Vec<NodeId>,
    #[serde(skip, default = "default_rng")]
    rng: GameRng,
}

fn default_rng() -> GameRng {
    seeded_rng(0)
}

impl TrafficSim {
    /// Spawns `density` vehicles, none when the graph has no boundary nodes.
    pub fn new(graph: &Graph, density: usize, seed: u64) -> Self {
        let boundary: Vec<NodeId> = graph
            .nodes()
            .iter()
            .filter(|node| is_boundary(node.pos))
            .map(|node| node.id)
            .collect();
        let mut sim = Self {
            vehicles: Vec::with_capacity(density),
            boundary,
            rng: seeded_rng(seed),
        };
        if sim.boundary.is_empty() {
            log::warn!("No boundary nodes, traffic stays empty");
            return sim;
        }
        for id in 0..density as u32 {
            let vehicle = sim.spawn(graph, id);
            sim.vehicles.push(vehicle);
        }
        sim
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn len(&self) -> usize {
        self.vehicles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vehicles.is_empty()
    }

    fn spawn(&mut self, graph: &Graph, id: u32) -> Vehicle {
        let start = self.boundary[self.rng.random_range(0..self.boundary.len())];
        let goal = self.boundary[self.rng.random_range(0..self.boundary.len())];
        let mut path = shortest_hop_path(graph, start, goal);
        if path.is_empty() {
            path.push(start);
        }
        Vehicle {
            id,
            current: start,
            goal,
            path,
            path_index: 0,
            priority: id,
            waiting: false,
            progress: 0,
        }
    }

    /// Whether `vehicle` may enter `target`, judged against the previous tick.
    /// Only vehicles with a lower priority number can block it.
    fn may_enter(vehicle: &Vehicle, target: NodeId, snapshot: &[Vehicle]) -> bool {
        !snapshot.iter().any(|other| {
            other.id != vehicle.id
                && other.priority < vehicle.priority
                && (other.current == target || other.heads_into(target))
        })
    }

    /// Advances every vehicle by a tenth of a road.
    pub fn tick(&mut self, graph: &Graph) {
        let snapshot = self.vehicles.clone();
        for index in 0..self.vehicles.len() {
            let vehicle = &snapshot[index];
            if vehicle.has_arrived() {
                let respawned = self.spawn(graph, vehicle.id);
                self.vehicles[index] = respawned;
                continue;
            }
            let Some(next) = vehicle.next_node() else {
                continue;
            };

            let moved = &mut self.vehicles[index];
            let progress = (vehicle.progress + 1).min(FULL_ROAD);
            if progress < FULL_ROAD {
                moved.progress = progress;
                moved.waiting = false;
            } else if Self::may_enter(vehicle, next, &snapshot) {
                moved.path_index += 1;
                moved.current = next;
                moved.progress = 0;
                moved.waiting = false;
            } else {
                moved.progress = HOLD_AT;
                moved.waiting = true;
            }
        }
    }

    /// Drawing position, interpolated along the current road.
    pub fn position(graph: &Graph, vehicle: &Vehicle) -> Option<Point> {
        let here = graph.position(vehicle.current)?;
        match vehicle.next_node().and_then(|next| graph.position(next)) {
            Some(there) if vehicle.progress > 0 => Some(here.lerp(there, vehicle.progress())),
            _ => Some(here),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Border nodes 0 and 2 joined through the centre node 1.
    fn corridor() -> Graph {
        Graph::new(
            vec![Point::new(5., 30.), Point::new(50., 30.), Point::new(95., 30.)],
            vec![(NodeId(0), NodeId(1)), (NodeId(1), NodeId(2))],
        )
        .unwrap()
    }

    fn vehicle(id: u32, path: &[u32], waiting: bool) -> Vehicle {
        Vehicle {
            id,
            current: NodeId(path[0]),
            goal: NodeId(path[path.len() - 1]),
            path: path.iter().copied().map(NodeId).collect(),
            path_index: 0,
            priority: id,
            waiting,
            progress: 0,
        }
    }

    #[test]
    fn vehicles_start_and_end_on_the_boundary() {
        let graph = RandomNetworkGenerator::new(3).generate(&NetworkConfig::for_nodes(60));
        let sim = TrafficSim::new(&graph, 12, 7);
        assert_eq!(sim.len(), 12);
        for vehicle in sim.vehicles() {
            assert!(is_boundary(graph.position(vehicle.current).unwrap()));
            assert!(is_boundary(graph.position(vehicle.goal).unwrap()));
            assert_eq!(vehicle.path.first(), Some(&vehicle.current));
            assert_eq!(vehicle.path.last(), Some(&vehicle.goal));
        }
    }

    #[test]
    fn no_boundary_means_no_traffic() {
        let graph = Graph::new(vec![Point::new(50., 30.)], Vec::new()).unwrap();
        assert!(TrafficSim::new(&graph, 5, 1).is_empty());
    }

    #[test]
    fn vehicle_reaches_next_node_after_ten_ticks() {
        let graph = corridor();
        let mut sim = TrafficSim::new(&graph, 0, 1);
        sim.vehicles.push(vehicle(0, &[0, 1, 2], false));

        for _ in 0..9 {
            sim.tick(&graph);
        }
        let v = &sim.vehicles()[0];
        assert_eq!(v.current, NodeId(0));
        let pos = TrafficSim::position(&graph, v).unwrap();
        assert!((pos.x - 45.5).abs() < 1e-9);

        sim.tick(&graph);
        let v = &sim.vehicles()[0];
        assert_eq!(v.current, NodeId(1));
        assert_eq!(v.progress(), 0.);
        assert_eq!(TrafficSim::position(&graph, v), graph.position(NodeId(1)));
    }

    #[test]
    fn lower_priority_gives_way() {
        let graph = corridor();
        let mut sim = TrafficSim::new(&graph, 0, 1);
        // Vehicle 0 sits on node 1 while vehicle 1 is about to drive into it.
        let parked = vehicle(0, &[1, 2], false);
        let mut arriving = vehicle(1, &[0, 1, 2], false);
        arriving.progress = 9;
        sim.vehicles = vec![parked, arriving];

        sim.tick(&graph);
        let waiting = &sim.vehicles()[1];
        assert!(waiting.waiting);
        assert_eq!(waiting.progress(), 0.9);
        assert_eq!(waiting.current, NodeId(0));
        assert!(!sim.vehicles()[0].waiting);
    }

    #[test]
    fn highest_priority_never_waits() {
        let snapshot = vec![vehicle(0, &[0, 1], false), vehicle(1, &[2, 1], false)];
        assert!(TrafficSim::may_enter(&snapshot[0], NodeId(1), &snapshot));
        assert!(!TrafficSim::may_enter(&snapshot[1], NodeId(1), &snapshot));

        // A waiting vehicle does not claim the node it is heading into.
        let snapshot = vec![vehicle(0, &[0, 1], true), vehicle(1, &[2, 1], false)];
        assert!(TrafficSim::may_enter(&snapshot[1], NodeId(1), &snapshot));
    }

    #[test]
    fn arrived_vehicles_respawn_with_same_id() {
        let graph = corridor();
        let mut sim = TrafficSim::new(&graph, 0, 4);
        sim.vehicles.push(vehicle(3, &[2], false));
        sim.tick(&graph);
        let v = &sim.vehicles()[0];
        assert_eq!(v.id, 3);
        assert_eq!(v.priority, 3);
        assert!(v.current == NodeId(0) || v.current == NodeId(2));
    }

    #[test]
    fn every_vehicle_keeps_moving() {
        let graph = RandomNetworkGenerator::new(11).generate(&NetworkConfig::for_nodes(50));
        let mut sim = TrafficSim::new(&graph, 8, 5);
        let mut waited = vec![0u32; sim.len()];
        let mut longest_wait = vec![0u32; sim.len()];
        let mut moves = vec![0u32; sim.len()];

        for _ in 0..2000 {
            let before = sim.vehicles().to_vec();
            sim.tick(&graph);
            for (index, (old, new)) in before.iter().zip(sim.vehicles()).enumerate() {
                assert_eq!(old.id, new.id);
                if new.current != old.current || new.progress != old.progress {
                    moves[index] += 1;
                }
                if new.waiting {
                    waited[index] += 1;
                    longest_wait[index] = longest_wait[index].max(waited[index]);
                } else {
                    waited[index] = 0;
                }
            }
        }

        for (index, vehicle) in sim.vehicles().iter().enumerate() {
            assert!(moves[index] > 100, "vehicle {} barely moved", vehicle.id);
            assert!(longest_wait[index] < 500, "vehicle {} stuck", vehicle.id);
        }
        assert_eq!(longest_wait[0], 0);
    }

    #[test]
    fn respawned_vehicles_keep_id_and_get_a_new_route() {
        let graph = RandomNetworkGenerator::new(13).generate(&NetworkConfig::for_nodes(60));
        let mut sim = TrafficSim::new(&graph, 10, 9);
        let mut respawns = 0;

        for _ in 0..1000 {
            let before = sim.vehicles().to_vec();
            sim.tick(&graph);
            for (old, new) in before.iter().zip(sim.vehicles()) {
                if !old.has_arrived() {
                    continue;
                }
                respawns += 1;
                assert_eq!(new.id, old.id);
                assert_eq!(new.priority, old.priority);
                assert_eq!(new.path_index, 0);
                assert_eq!(new.progress(), 0.);
                assert!(!new.waiting);
                assert_eq!(new.path.first(), Some(&new.current));
                assert_eq!(new.path.last(), Some(&new.goal));
                assert!(is_boundary(graph.position(new.current).unwrap()));
                assert!(is_boundary(graph.position(new.goal).unwrap()));
                for pair in new.path.windows(2) {
                    assert!(graph.edge_between(pair[0], pair[1]).is_some());
                }
            }
        }
        assert!(respawns >= 10);
    }

    #[test]
    fn long_runs_keep_vehicles_on_the_network() {
        let graph = RandomNetworkGenerator::new(11).generate(&NetworkConfig::for_nodes(50));
        let mut sim = TrafficSim::new(&graph, 15, 2);
        for _ in 0..500 {
            sim.tick(&graph);
        }
        assert_eq!(sim.len(), 15);
        assert!(sim.vehicles()[0].priority == 0);
        for v in sim.vehicles() {
            assert!(graph.contains(v.current));
            assert!(TrafficSim::position(&graph, v).is_some());
        }
    }
}

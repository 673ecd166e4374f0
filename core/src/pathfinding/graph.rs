use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl EdgeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// Position in map units, `x` in `0..100` and `y` in `0..60`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Point at fraction `t` of the way to `other`.
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub pos: Point,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
}

impl Edge {
    /// Endpoints in ascending order, identifying the road regardless of direction.
    pub fn key(&self) -> (NodeId, NodeId) {
        edge_key(self.from, self.to)
    }

    pub fn connects(&self, node: NodeId) -> bool {
        self.from == node || self.to == node
    }
}

pub fn edge_key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub to: NodeId,
    pub weight: f64,
    pub edge: EdgeId,
}

pub type Neighbors = SmallVec<[Neighbor; 6]>;

/// Undirected road network weighted by Euclidean length. Immutable once built.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    adjacency: Vec<Neighbors>,
}

impl Graph {
    /// Builds a graph from node positions, node `i` getting id `N{i}`, and
    /// undirected links between them.
    pub fn new(positions: Vec<Point>, links: Vec<(NodeId, NodeId)>) -> Result<Self> {
        let nodes: Vec<Node> = positions
            .into_iter()
            .enumerate()
            .map(|(index, pos)| Node {
                id: NodeId(index as u32),
                pos,
            })
            .collect();

        let mut adjacency = vec![Neighbors::new(); nodes.len()];
        let mut edges = Vec::with_capacity(links.len());
        for (index, (from, to)) in links.into_iter().enumerate() {
            let (Some(a), Some(b)) = (nodes.get(from.index()), nodes.get(to.index())) else {
                return Err(GameError::UnknownNode);
            };
            let id = EdgeId(index as u32);
            let weight = a.pos.distance(b.pos);
            adjacency[from.index()].push(Neighbor { to, weight, edge: id });
            adjacency[to.index()].push(Neighbor {
                to: from,
                weight,
                edge: id,
            });
            edges.push(Edge { id, from, to });
        }

        Ok(Self {
            nodes,
            edges,
            adjacency,
        })
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn position(&self, id: NodeId) -> Option<Point> {
        self.node(id).map(|node| node.pos)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    /// Empty for unknown nodes.
    pub fn neighbors(&self, id: NodeId) -> &[Neighbor] {
        self.adjacency
            .get(id.index())
            .map(Neighbors::as_slice)
            .unwrap_or_default()
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.neighbors(id).len()
    }

    pub fn distance(&self, a: NodeId, b: NodeId) -> Option<f64> {
        Some(self.position(a)?.distance(self.position(b)?))
    }

    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.neighbors(a)
            .iter()
            .find(|neighbor| neighbor.to == b)
            .map(|neighbor| neighbor.edge)
    }

    /// Roads joining consecutive path nodes, skipping pairs with no direct road.
    pub fn edges_for_path(&self, path: &[NodeId]) -> Vec<EdgeId> {
        path.windows(2)
            .filter_map(|pair| self.edge_between(pair[0], pair[1]))
            .collect()
    }

    /// Total road length of `path`, `None` when two consecutive nodes are not adjacent.
    pub fn path_cost(&self, path: &[NodeId]) -> Option<f64> {
        path.windows(2).try_fold(0.0, |total, pair| {
            let neighbor = self.neighbors(pair[0]).iter().find(|n| n.to == pair[1])?;
            Some(total + neighbor.weight)
        })
    }

    pub fn closest_node(&self, point: Point) -> Option<NodeId> {
        self.nodes
            .iter()
            .min_by(|a, b| a.pos.distance(point).total_cmp(&b.pos.distance(point)))
            .map(|node| node.id)
    }

    pub fn components(&self) -> UnionFind {
        let mut sets = UnionFind::new(self.nodes.len());
        for edge in &self.edges {
            sets.union(edge.from, edge.to);
        }
        sets
    }

    pub fn component_count(&self) -> usize {
        self.components().count()
    }

    pub fn is_connected(&self) -> bool {
        self.component_count() <= 1
    }
}

/// Disjoint sets over node ids with path halving and union by size.
#[derive(Clone, Debug)]
pub struct UnionFind {
    parent: Vec<u32>,
    size: Vec<u32>,
    count: usize,
}

impl UnionFind {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len as u32).collect(),
            size: vec![1; len],
            count: len,
        }
    }

    pub fn find(&mut self, node: NodeId) -> NodeId {
        let mut x = node.index();
        while self.parent[x] as usize != x {
            let grandparent = self.parent[self.parent[x] as usize];
            self.parent[x] = grandparent;
            x = grandparent as usize;
        }
        NodeId(x as u32)
    }

    /// Merges the sets of `a` and `b`. Returns whether they were separate.
    pub fn union(&mut self, a: NodeId, b: NodeId) -> bool {
        let (ra, rb) = (self.find(a).index(), self.find(b).index());
        if ra == rb {
            return false;
        }
        let (big, small) = if self.size[ra] >= self.size[rb] {
            (ra, rb)
        } else {
            (rb, ra)
        };
        self.parent[small] = big as u32;
        self.size[big] += self.size[small];
        self.count -= 1;
        true
    }

    pub fn connected(&mut self, a: NodeId, b: NodeId) -> bool {
        self.find(a) == self.find(b)
    }

    /// Number of disjoint sets.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Members of every set, ordered by their smallest node id.
    pub fn groups(&mut self) -> Vec<Vec<NodeId>> {
        let mut slot_of_root: Vec<Option<usize>> = vec![None; self.parent.len()];
        let mut groups: Vec<Vec<NodeId>> = Vec::with_capacity(self.count);
        for index in 0..self.parent.len() {
            let node = NodeId(index as u32);
            let root = self.find(node).index();
            let slot = *slot_of_root[root].get_or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(node);
        }
        groups
    }
}

/// Growable bitset of node ids. Equality ignores spare capacity.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NodeSet {
    words: Vec<u64>,
}

impl PartialEq for NodeSet {
    fn eq(&self, other: &Self) -> bool {
        self.used_words() == other.used_words()
    }
}

impl Eq for NodeSet {}

impl Hash for NodeSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.used_words().hash(state);
    }
}

impl NodeSet {
    /// Words up to the last non-empty one.
    fn used_words(&self) -> &[u64] {
        let used = self.words.iter().rposition(|&w| w != 0).map_or(0, |last| last + 1);
        &self.words[..used]
    }

    pub fn with_capacity(nodes: usize) -> Self {
        Self {
            words: vec![0; nodes.div_ceil(64)],
        }
    }

    fn locate(id: NodeId) -> (usize, u64) {
        (id.index() / 64, 1 << (id.index() % 64))
    }

    /// Returns whether the id was newly added. Grows the set as needed.
    pub fn insert(&mut self, id: NodeId) -> bool {
        let (word, bit) = Self::locate(id);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let fresh = self.words[word] & bit == 0;
        self.words[word] |= bit;
        fresh
    }

    pub fn remove(&mut self, id: NodeId) -> bool {
        let (word, bit) = Self::locate(id);
        match self.words.get_mut(word) {
            Some(w) if *w & bit != 0 => {
                *w &= !bit;
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        let (word, bit) = Self::locate(id);
        self.words.get(word).is_some_and(|w| w & bit != 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    pub fn is_subset(&self, other: &NodeSet) -> bool {
        self.words.iter().enumerate().all(|(index, &w)| {
            let o = other.words.get(index).copied().unwrap_or(0);
            w & !o == 0
        })
    }

    /// Ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.words.iter().enumerate().flat_map(|(index, &word)| {
            let mut rest = word;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros();
                rest &= rest - 1;
                Some(NodeId(index as u32 * 64 + bit))
            })
        })
    }
}

impl FromIterator<NodeId> for NodeSet {
    fn from_iter<I: IntoIterator<Item = NodeId>>(iter: I) -> Self {
        let mut set = NodeSet::default();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

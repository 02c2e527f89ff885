//! One namespace's knowledge graph
//!
//! A directed multigraph over entity names. Each triplet owns exactly one
//! edge, so parallel facts between the same pair stay individually
//! addressable by id.

use brandmem_core::{KGTriplet, TripletId};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Edge payload: which triplet the edge belongs to
#[derive(Debug, Clone)]
struct EdgeData {
    triplet_id: TripletId,
    /// Insertion sequence, for stable traversal order
    seq: u64,
}

#[derive(Debug, Clone)]
struct StoredTriplet {
    edge: EdgeIndex,
    triplet: KGTriplet,
}

/// Directed multigraph of entities for a single namespace
#[derive(Debug, Default)]
pub struct NamespaceGraph {
    graph: StableDiGraph<String, EdgeData>,
    nodes: HashMap<String, NodeIndex>,
    triplets: HashMap<TripletId, StoredTriplet>,
    /// Triplet ids in first-insertion order
    order: Vec<TripletId>,
    next_seq: u64,
}

impl NamespaceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&mut self, entity: &str) -> NodeIndex {
        if let Some(&idx) = self.nodes.get(entity) {
            return idx;
        }
        let idx = self.graph.add_node(entity.to_string());
        self.nodes.insert(entity.to_string(), idx);
        idx
    }

    /// Insert a triplet, replacing any previous triplet with the same id.
    /// Returns true when an existing triplet was replaced.
    pub fn insert(&mut self, triplet: KGTriplet) -> bool {
        let replaced = match self.triplets.remove(&triplet.id) {
            Some(old) => {
                self.graph.remove_edge(old.edge);
                true
            }
            None => {
                self.order.push(triplet.id.clone());
                false
            }
        };

        let source = self.node(&triplet.subject);
        let target = self.node(&triplet.object);
        let data = EdgeData {
            triplet_id: triplet.id.clone(),
            seq: self.next_seq,
        };
        self.next_seq += 1;
        let edge = self.graph.add_edge(source, target, data);
        self.triplets
            .insert(triplet.id.clone(), StoredTriplet { edge, triplet });
        replaced
    }

    pub fn get(&self, id: &TripletId) -> Option<&KGTriplet> {
        self.triplets.get(id).map(|s| &s.triplet)
    }

    pub fn entity_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn triplet_count(&self) -> usize {
        self.triplets.len()
    }

    /// All triplets in first-insertion order
    pub fn triplets(&self) -> Vec<KGTriplet> {
        self.order
            .iter()
            .filter_map(|id| self.get(id).cloned())
            .collect()
    }

    pub fn entities(&self) -> BTreeSet<String> {
        self.nodes.keys().cloned().collect()
    }

    pub fn predicates(&self) -> BTreeSet<String> {
        self.triplets
            .values()
            .map(|s| s.triplet.predicate.clone())
            .collect()
    }

    /// Edges touching `node`, outgoing before incoming, each in insertion order
    fn incident_edges(&self, node: NodeIndex) -> Vec<(TripletId, NodeIndex)> {
        let mut out = Vec::new();
        for direction in [Direction::Outgoing, Direction::Incoming] {
            let mut edges: Vec<_> = self
                .graph
                .edges_directed(node, direction)
                .map(|e| {
                    let other = if direction == Direction::Outgoing {
                        e.target()
                    } else {
                        e.source()
                    };
                    (e.weight().seq, e.weight().triplet_id.clone(), other)
                })
                .collect();
            edges.sort_by_key(|(seq, _, _)| *seq);
            out.extend(edges.into_iter().map(|(_, id, other)| (id, other)));
        }
        out
    }

    /// Breadth-first expansion in both edge directions.
    ///
    /// Returns every distinct triplet traversed within `max_hops` hops.
    pub fn neighbors(&self, entity: &str, max_hops: usize) -> Vec<KGTriplet> {
        let Some(&start) = self.nodes.get(entity) else {
            return Vec::new();
        };

        let mut result = Vec::new();
        let mut seen_edges: HashSet<TripletId> = HashSet::new();
        let mut visited: HashSet<NodeIndex> = HashSet::from([start]);
        let mut frontier = vec![start];

        for _ in 0..max_hops {
            let mut next = Vec::new();
            for &node in &frontier {
                for (id, other) in self.incident_edges(node) {
                    if !seen_edges.insert(id.clone()) {
                        continue;
                    }
                    if let Some(t) = self.get(&id) {
                        result.push(t.clone());
                    }
                    if visited.insert(other) {
                        next.push(other);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        result
    }

    /// Every simple directed path from `source` to `target` of at most
    /// `max_length` edges, as triplet sequences
    pub fn paths(&self, source: &str, target: &str, max_length: usize) -> Vec<Vec<KGTriplet>> {
        let (Some(&from), Some(&to)) = (self.nodes.get(source), self.nodes.get(target)) else {
            return Vec::new();
        };
        if from == to || max_length == 0 {
            return Vec::new();
        }

        let mut paths = Vec::new();
        let mut on_path = HashSet::from([from]);
        let mut edges = Vec::new();
        self.walk(from, to, max_length, &mut on_path, &mut edges, &mut paths);
        paths
    }

    fn walk(
        &self,
        at: NodeIndex,
        to: NodeIndex,
        remaining: usize,
        on_path: &mut HashSet<NodeIndex>,
        edges: &mut Vec<TripletId>,
        paths: &mut Vec<Vec<KGTriplet>>,
    ) {
        let mut outgoing: Vec<_> = self
            .graph
            .edges_directed(at, Direction::Outgoing)
            .map(|e| (e.weight().seq, e.weight().triplet_id.clone(), e.target()))
            .collect();
        outgoing.sort_by_key(|(seq, _, _)| *seq);

        for (_, id, next) in outgoing {
            if on_path.contains(&next) {
                continue;
            }
            edges.push(id);
            if next == to {
                paths.push(edges.iter().filter_map(|id| self.get(id).cloned()).collect());
            } else if remaining > 1 {
                on_path.insert(next);
                self.walk(next, to, remaining - 1, on_path, edges, paths);
                on_path.remove(&next);
            }
            edges.pop();
        }
    }
}

// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Feedback loop detection over the diagram graph.
//!
//! Flows are not plain arcs here: each Flow becomes a proxy vertex sitting
//! between its two ends, so Links that attach to a Flow can take part in
//! loops through it.  A bidirectional Flow gets a second proxy for the
//! reverse direction.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;
use smallvec::{SmallVec, smallvec};
use tracing::trace;

use crate::config::CanvasConfig;
use crate::datamodel::{Edge, EdgeClass, EdgeId, EdgeKind, Endpoint, Node, NodeId, Polarity};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowPort {
    Forward,
    Reverse,
}

/// A vertex of the graph loops are searched in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "ref")]
pub enum LoopNode {
    Real(NodeId),
    FlowProxy { edge: EdgeId, port: FlowPort },
}

impl LoopNode {
    pub fn member(&self) -> LoopMember {
        match self {
            LoopNode::Real(id) => LoopMember::Node(id.clone()),
            LoopNode::FlowProxy { edge, .. } => LoopMember::Flow(edge.clone()),
        }
    }

    pub fn is_real(&self) -> bool {
        matches!(self, LoopNode::Real(_))
    }
}

/// A loop participant as the user sees it: proxies are reported as the Flow
/// they stand for.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "ref")]
pub enum LoopMember {
    Node(NodeId),
    Flow(EdgeId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopClass {
    Direct,
    Standard,
    Complex,
}

impl LoopClass {
    fn of(real_nodes: usize, config: &CanvasConfig) -> Self {
        if real_nodes <= config.direct_loop_max_nodes {
            LoopClass::Direct
        } else if real_nodes >= config.complex_loop_min_nodes {
            LoopClass::Complex
        } else {
            LoopClass::Standard
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopPolarity {
    Reinforcing, // even number of negative links
    Balancing,   // odd number of negative links
    Undetermined,
}

impl LoopPolarity {
    fn prefix(self) -> &'static str {
        match self {
            LoopPolarity::Reinforcing => "r",
            LoopPolarity::Balancing => "b",
            LoopPolarity::Undetermined => "u",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackLoop {
    pub id: String,
    pub nodes: Vec<LoopNode>,
    pub members: Vec<LoopMember>,
    /// `edges[i]` is traversed from `nodes[i]` to `nodes[i + 1]`, wrapping.
    pub edges: Vec<EdgeId>,
    pub real_node_count: usize,
    pub class: LoopClass,
    pub polarity: LoopPolarity,
}

impl FeedbackLoop {
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.members
            .iter()
            .any(|m| matches!(m, LoopMember::Node(n) if n == id))
    }

    pub fn traverses_edge(&self, id: &EdgeId) -> bool {
        self.edges.contains(id)
    }

    /// The loop as a path of labels, closed back on its first member.
    pub fn format_path(&self, nodes: &[Node], edges: &[Edge]) -> String {
        if self.members.is_empty() {
            return String::new();
        }

        let label = |member: &LoopMember| -> String {
            match member {
                LoopMember::Node(id) => nodes
                    .iter()
                    .find(|n| &n.id == id)
                    .map(|n| n.label.clone())
                    .unwrap_or_else(|| id.to_string()),
                LoopMember::Flow(id) => edges
                    .iter()
                    .find(|e| &e.id == id)
                    .and_then(|e| e.data.label.clone())
                    .unwrap_or_else(|| id.to_string()),
            }
        };

        let mut path: Vec<String> = self.members.iter().map(&label).collect();
        path.push(label(&self.members[0]));
        path.join(" -> ")
    }
}

#[derive(Clone, Debug)]
struct CausalArc {
    to: usize,
    edge: EdgeId,
    polarity: Option<Polarity>,
    /// Comes from a bidirectional Link, so the arc also exists reversed.
    reciprocal: bool,
}

/// The augmented directed multigraph loops are enumerated in.
#[derive(Clone, Debug, Default)]
pub struct CausalGraph {
    vertices: Vec<LoopNode>,
    adjacency: Vec<SmallVec<[CausalArc; 4]>>,
}

struct PendingArc {
    from: LoopNode,
    to: LoopNode,
    edge: EdgeId,
    polarity: Option<Polarity>,
    reciprocal: bool,
}

/// A raw circuit: the vertices in visiting order, and for each the index of
/// the arc taken out of it.
struct Circuit {
    vertices: Vec<usize>,
    arcs: Vec<usize>,
}

impl CausalGraph {
    pub fn build(nodes: &[Node], edges: &[Edge]) -> Self {
        let present: HashSet<&NodeId> = nodes.iter().map(|n| &n.id).collect();
        // None: a node reference to something missing.  Some(None): a side
        // that is not a node and contributes no arc.
        let side = |endpoint: &Endpoint| -> Option<Option<LoopNode>> {
            match endpoint {
                Endpoint::Node(id) if present.contains(id) => {
                    Some(Some(LoopNode::Real(id.clone())))
                }
                Endpoint::Node(_) => None,
                _ => Some(None),
            }
        };

        let mut pending: Vec<PendingArc> = vec![];
        let mut proxies: HashMap<&EdgeId, SmallVec<[LoopNode; 2]>> = HashMap::new();

        for edge in edges.iter().filter(|e| e.kind == EdgeKind::Flow) {
            if !matches!(edge.class(), EdgeClass::Ordinary | EdgeClass::Clouded) {
                continue;
            }
            let (Some(source), Some(target)) = (side(&edge.source), side(&edge.target)) else {
                continue;
            };

            let mut ports = vec![(FlowPort::Forward, source.clone(), target.clone())];
            if edge.data.bidirectional {
                ports.push((FlowPort::Reverse, target, source));
            }

            let entry = proxies.entry(&edge.id).or_default();
            for (port, from, to) in ports {
                let proxy = LoopNode::FlowProxy {
                    edge: edge.id.clone(),
                    port,
                };
                // material moving along a flow counts as positive influence
                if let Some(from) = from {
                    pending.push(PendingArc {
                        from,
                        to: proxy.clone(),
                        edge: edge.id.clone(),
                        polarity: Some(Polarity::Positive),
                        reciprocal: false,
                    });
                }
                if let Some(to) = to {
                    pending.push(PendingArc {
                        from: proxy.clone(),
                        to,
                        edge: edge.id.clone(),
                        polarity: Some(Polarity::Positive),
                        reciprocal: false,
                    });
                }
                entry.push(proxy);
            }
        }

        for edge in edges.iter().filter(|e| e.kind == EdgeKind::Link) {
            let (from, to) = edge.directed_endpoints();
            let pairs: SmallVec<[(LoopNode, LoopNode); 2]> = match edge.class() {
                EdgeClass::Ordinary => match (side(from), side(to)) {
                    (Some(Some(f)), Some(Some(t))) => smallvec![(f, t)],
                    _ => continue,
                },
                EdgeClass::FlowAttached => match (from, to) {
                    (Endpoint::Node(_), Endpoint::Flow(flow)) => {
                        let (Some(Some(d)), Some(ports)) = (side(from), proxies.get(flow)) else {
                            continue;
                        };
                        ports.iter().map(|p| (d.clone(), p.clone())).collect()
                    }
                    (Endpoint::Flow(flow), Endpoint::Node(_)) => {
                        let (Some(Some(d)), Some(ports)) = (side(to), proxies.get(flow)) else {
                            continue;
                        };
                        ports.iter().map(|p| (p.clone(), d.clone())).collect()
                    }
                    _ => continue,
                },
                _ => continue,
            };

            let bidirectional = edge.data.bidirectional;
            for (f, t) in pairs {
                if bidirectional {
                    pending.push(PendingArc {
                        from: t.clone(),
                        to: f.clone(),
                        edge: edge.id.clone(),
                        polarity: edge.data.polarity,
                        reciprocal: true,
                    });
                }
                pending.push(PendingArc {
                    from: f,
                    to: t,
                    edge: edge.id.clone(),
                    polarity: edge.data.polarity,
                    reciprocal: bidirectional,
                });
            }
        }

        pending.retain(|arc| arc.from != arc.to);

        let vertices: Vec<LoopNode> = pending
            .iter()
            .flat_map(|arc| [arc.from.clone(), arc.to.clone()])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index: HashMap<&LoopNode, usize> =
            vertices.iter().enumerate().map(|(i, v)| (v, i)).collect();

        let mut adjacency: Vec<SmallVec<[CausalArc; 4]>> = vec![SmallVec::new(); vertices.len()];
        for arc in &pending {
            let (Some(&from), Some(&to)) = (index.get(&arc.from), index.get(&arc.to)) else {
                continue;
            };
            adjacency[from].push(CausalArc {
                to,
                edge: arc.edge.clone(),
                polarity: arc.polarity,
                reciprocal: arc.reciprocal,
            });
        }

        CausalGraph {
            vertices,
            adjacency,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn arc_count(&self) -> usize {
        self.adjacency.iter().map(|arcs| arcs.len()).sum()
    }

    /// Every elementary circuit, each reported once per distinct arc
    /// sequence, starting from its lowest-ordered vertex.
    fn circuits(&self) -> Vec<Circuit> {
        let mut circuits = vec![];
        let mut on_path = vec![false; self.vertices.len()];
        for start in 0..self.vertices.len() {
            let mut path = vec![start];
            let mut taken = vec![];
            on_path[start] = true;
            self.dfs_circuits(start, start, &mut path, &mut taken, &mut on_path, &mut circuits);
            on_path[start] = false;
        }
        circuits
    }

    fn dfs_circuits(
        &self,
        start: usize,
        current: usize,
        path: &mut Vec<usize>,
        taken: &mut Vec<usize>,
        on_path: &mut [bool],
        circuits: &mut Vec<Circuit>,
    ) {
        for (i, arc) in self.adjacency[current].iter().enumerate() {
            if arc.to == start {
                if path.len() > 1 {
                    let mut arcs = taken.clone();
                    arcs.push(i);
                    circuits.push(Circuit {
                        vertices: path.clone(),
                        arcs,
                    });
                }
            } else if arc.to > start && !on_path[arc.to] {
                // only visit vertices after start so each circuit is found
                // from exactly one start
                on_path[arc.to] = true;
                path.push(arc.to);
                taken.push(i);
                self.dfs_circuits(start, arc.to, path, taken, on_path, circuits);
                taken.pop();
                path.pop();
                on_path[arc.to] = false;
            }
        }
    }

    fn arc(&self, vertex: usize, slot: usize) -> &CausalArc {
        &self.adjacency[vertex][slot]
    }

    /// Deduplicated, classified and labelled feedback loops.
    pub fn find_loops(&self, config: &CanvasConfig) -> Vec<FeedbackLoop> {
        let circuits = self.circuits();
        let raw_count = circuits.len();

        let mut seen: HashSet<Vec<(LoopMember, EdgeId)>> = HashSet::new();
        let mut keyed: Vec<(Vec<(LoopMember, EdgeId)>, FeedbackLoop)> = vec![];

        for circuit in circuits {
            let arcs: Vec<&CausalArc> = circuit
                .vertices
                .iter()
                .zip(&circuit.arcs)
                .map(|(&v, &slot)| self.arc(v, slot))
                .collect();
            let nodes: Vec<LoopNode> = circuit
                .vertices
                .iter()
                .map(|&v| self.vertices[v].clone())
                .collect();
            let members: Vec<LoopMember> = nodes.iter().map(LoopNode::member).collect();
            let edges: Vec<EdgeId> = arcs.iter().map(|a| a.edge.clone()).collect();

            let sequence: Vec<(LoopMember, EdgeId)> =
                members.iter().cloned().zip(edges.iter().cloned()).collect();
            let mut key = canonical_rotation(&sequence);
            if arcs.iter().all(|a| a.reciprocal) {
                let reversed = canonical_rotation(&reverse_sequence(&sequence));
                key = key.min(reversed);
            }
            if !seen.insert(key.clone()) {
                continue;
            }

            let real_node_count = nodes
                .iter()
                .filter_map(|n| match n {
                    LoopNode::Real(id) => Some(id),
                    _ => None,
                })
                .collect::<HashSet<_>>()
                .len();

            let polarity = loop_polarity(&arcs);
            keyed.push((
                key,
                FeedbackLoop {
                    id: String::new(),
                    nodes,
                    members,
                    edges,
                    real_node_count,
                    class: LoopClass::of(real_node_count, config),
                    polarity,
                },
            ));
        }

        keyed.sort_by(|a, b| a.0.cmp(&b.0));
        let mut loops: Vec<FeedbackLoop> = keyed.into_iter().map(|(_, l)| l).collect();
        assign_loop_ids(&mut loops);

        trace!(
            vertices = self.vertex_count(),
            arcs = self.arc_count(),
            circuits = raw_count,
            loops = loops.len(),
            "enumerated feedback loops"
        );
        loops
    }
}

fn canonical_rotation<T: Ord + Clone>(sequence: &[T]) -> Vec<T> {
    (0..sequence.len())
        .map(|i| {
            sequence[i..]
                .iter()
                .chain(&sequence[..i])
                .cloned()
                .collect::<Vec<T>>()
        })
        .min()
        .unwrap_or_default()
}

/// The same circuit walked the other way.  Pairs are (vertex, edge leaving
/// it), so the edges shift by one position.
fn reverse_sequence<T: Clone, E: Clone>(sequence: &[(T, E)]) -> Vec<(T, E)> {
    let n = sequence.len();
    (0..n)
        .map(|k| {
            let vertex = sequence[(n - k) % n].0.clone();
            let edge = sequence[(2 * n - k - 1) % n].1.clone();
            (vertex, edge)
        })
        .collect()
}

fn loop_polarity(arcs: &[&CausalArc]) -> LoopPolarity {
    let mut negatives = 0;
    for arc in arcs {
        match arc.polarity {
            Some(Polarity::Negative) => negatives += 1,
            Some(Polarity::Positive) => {}
            None => return LoopPolarity::Undetermined,
        }
    }
    if negatives % 2 == 0 {
        LoopPolarity::Reinforcing
    } else {
        LoopPolarity::Balancing
    }
}

/// Numbers loops per polarity in their (already sorted) order.
fn assign_loop_ids(loops: &mut [FeedbackLoop]) {
    let mut counters: HashMap<&'static str, usize> = HashMap::new();
    for feedback_loop in loops.iter_mut() {
        let prefix = feedback_loop.polarity.prefix();
        let counter = counters.entry(prefix).or_insert(0);
        *counter += 1;
        feedback_loop.id = format!("{prefix}{counter}");
    }
}

/// Feedback loops in a snapshot of nodes and edges, classified with the
/// default thresholds.
pub fn find_cycles(nodes: &[Node], edges: &[Edge]) -> Vec<FeedbackLoop> {
    find_cycles_with(nodes, edges, &CanvasConfig::default())
}

pub fn find_cycles_with(
    nodes: &[Node],
    edges: &[Edge],
    config: &CanvasConfig,
) -> Vec<FeedbackLoop> {
    CausalGraph::build(nodes, edges).find_loops(config)
}

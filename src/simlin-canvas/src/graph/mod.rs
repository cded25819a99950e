// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! The canonical collection of nodes and edges.
//!
//! Every mutation goes through a method on [`GraphModel`] and leaves the
//! model consistent: no two ordinary edges of one kind join the same pair
//! of nodes, no edge refers to a removed node, and no Link hangs off a
//! removed Flow.  Requests that would break those rules are turned into
//! no-ops and reported as [`Effect::Rejected`].

mod ops;
mod route;

use tracing::debug;

use crate::common::Result;
use crate::config::CanvasConfig;
use crate::datamodel::{
    Edge, EdgeClass, EdgeId, EdgeKind, EdgePatch, Endpoint, Node, NodeId, NodeKind, NodePatch,
    Point, Side, Size,
};
use crate::loops::{FeedbackLoop, find_cycles_with};
use crate::model_err;
use crate::uid::{IdAllocator, LabelSequence};

pub use ops::Operation;
pub use route::EdgeRoute;

/// Why an operation left the model untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// An ordinary edge from a node to itself.
    SelfLoop,
    /// The connection (or, for clouded flows, the id) already exists.
    Duplicate(EdgeId),
    /// A different connection already uses this edge id.
    IdInUse(EdgeId),
    /// The endpoints do not form an edge this model can store.
    Unsupported,
    /// A Link names a Flow that does not exist.
    DanglingFlow(EdgeId),
    /// The endpoint being moved is not a cloud.
    NotACloud(EdgeId, Side),
    /// Another node already holds this label.
    LabelInUse(String),
    /// Every generated label is live.
    LabelsExhausted,
}

/// What an operation did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    NodeAdded(NodeId),
    NodeUpdated(NodeId),
    NodeRemoved(NodeId),
    EdgeAdded(EdgeId),
    EdgeUpdated(EdgeId),
    EdgeRemoved(EdgeId),
    /// A reverse-direction edge was folded into `existing`; the submitted
    /// edge, with its payload, was dropped.
    MadeBidirectional {
        existing: EdgeId,
        discarded: EdgeId,
    },
    Rejected(Rejection),
    /// The operation named an element that is not in the model.
    NotFound(String),
}

fn rejected(reason: Rejection) -> Effect {
    debug!(?reason, "operation rejected");
    Effect::Rejected(reason)
}

fn not_found(id: impl ToString) -> Effect {
    let id = id.to_string();
    debug!(%id, "operation target not found");
    Effect::NotFound(id)
}

#[derive(Clone, Debug, Default)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    ids: IdAllocator,
    labels: LabelSequence,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// A model whose generated ids start counting at `seed`.
    pub fn with_seed(seed: u64) -> Self {
        GraphModel {
            ids: IdAllocator::new(seed),
            ..Default::default()
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| &e.id == id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edge(id).is_some()
    }

    fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    fn edge_mut(&mut self, id: &EdgeId) -> Option<&mut Edge> {
        self.edges.iter_mut().find(|e| &e.id == id)
    }

    /// Inserts a node whose id and label the caller already reserved.
    pub fn add_node(&mut self, node: Node) -> Effect {
        self.labels.reserve(&node.label);
        let id = node.id.clone();
        self.nodes.push(node);
        Effect::NodeAdded(id)
    }

    /// Allocates a fresh id and label and inserts the node.
    pub fn create_node(&mut self, kind: NodeKind, position: Point) -> Result<NodeId> {
        let label = self.labels.next()?;
        let nodes = &self.nodes;
        let id = self.ids.alloc_node(|id| nodes.iter().any(|n| &n.id == id));
        self.nodes.push(Node::new(id.clone(), kind, label, position));
        Ok(id)
    }

    pub fn rename_node(&mut self, id: &NodeId, label: &str) -> Result<()> {
        let Some(current) = self.node(id).map(|n| n.label.clone()) else {
            return model_err!(DoesNotExist, id.to_string());
        };
        if current == label {
            return Ok(());
        }
        if self.labels.is_live(label) {
            return model_err!(DuplicateLabel, label.to_string());
        }

        self.labels.release(&current);
        self.labels.reserve(label);
        if let Some(node) = self.node_mut(id) {
            node.label = label.to_string();
        }
        Ok(())
    }

    pub fn move_node(&mut self, id: &NodeId, position: Point) -> Effect {
        match self.node_mut(id) {
            Some(node) => {
                node.position = position;
                Effect::NodeUpdated(id.clone())
            }
            None => not_found(id),
        }
    }

    /// Records the size the renderer measured for a node.
    pub fn resize_node(&mut self, id: &NodeId, size: Size) -> Effect {
        match self.node_mut(id) {
            Some(node) => {
                node.size = Some(size);
                Effect::NodeUpdated(id.clone())
            }
            None => not_found(id),
        }
    }

    pub fn update_node_data(&mut self, id: &NodeId, patch: NodePatch) -> Effect {
        match self.node_mut(id) {
            Some(node) => {
                node.data.merge(patch);
                Effect::NodeUpdated(id.clone())
            }
            None => not_found(id),
        }
    }

    /// Removes the node and every edge attached to it.  Links hanging off a
    /// Flow removed this way go as well.
    pub fn remove_node(&mut self, id: &NodeId) -> Vec<Effect> {
        let (removed, kept): (Vec<Node>, Vec<Node>) = std::mem::take(&mut self.nodes)
            .into_iter()
            .partition(|n| &n.id == id);
        self.nodes = kept;

        if removed.is_empty() {
            return vec![not_found(id)];
        }
        for node in &removed {
            self.labels.release(&node.label);
        }

        let mut effects = vec![Effect::NodeRemoved(id.clone())];
        let (incident, kept): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| e.touches_node(id));
        self.edges = kept;

        let flows: Vec<EdgeId> = incident
            .iter()
            .filter(|e| e.kind == EdgeKind::Flow)
            .map(|e| e.id.clone())
            .collect();
        effects.extend(incident.into_iter().map(|e| Effect::EdgeRemoved(e.id)));
        effects.extend(self.remove_links_on_flows(&flows));

        debug!(node = %id, removed = effects.len() - 1, "removed node and incident edges");
        effects
    }

    /// Builds an edge with a freshly allocated id, without inserting it.
    pub fn new_edge(&mut self, kind: EdgeKind, source: Endpoint, target: Endpoint) -> Edge {
        let edges = &self.edges;
        let id = self.ids.alloc_edge(|id| edges.iter().any(|e| &e.id == id));
        Edge::new(id, kind, source, target)
    }

    pub fn connect(&mut self, kind: EdgeKind, source: Endpoint, target: Endpoint) -> Effect {
        let edge = self.new_edge(kind, source, target);
        self.add_edge(edge)
    }

    pub fn add_edge(&mut self, edge: Edge) -> Effect {
        match edge.class() {
            EdgeClass::Unsupported => rejected(Rejection::Unsupported),
            EdgeClass::Clouded => {
                if self.contains_edge(&edge.id) {
                    return rejected(Rejection::Duplicate(edge.id));
                }
                let id = edge.id.clone();
                self.edges.push(edge);
                Effect::EdgeAdded(id)
            }
            EdgeClass::Ordinary => {
                if edge.source == edge.target {
                    return rejected(Rejection::SelfLoop);
                }
                self.merge_or_insert(edge)
            }
            EdgeClass::FlowAttached => {
                let flow_id = edge
                    .source
                    .flow_id()
                    .or_else(|| edge.target.flow_id())
                    .cloned();
                if let Some(flow_id) = flow_id {
                    let is_flow = self
                        .edge(&flow_id)
                        .is_some_and(|e| e.kind == EdgeKind::Flow);
                    if !is_flow {
                        return rejected(Rejection::DanglingFlow(flow_id));
                    }
                }
                self.merge_or_insert(edge)
            }
        }
    }

    /// Duplicate and reverse-promotion rules shared by ordinary and
    /// flow-attached edges.  Endpoints compare as tagged values, so a Link
    /// on a Flow matches on the (node, flow) pair.
    fn merge_or_insert(&mut self, edge: Edge) -> Effect {
        if let Some(existing) = self.edges.iter().find(|e| e.same_connection(&edge)) {
            return rejected(Rejection::Duplicate(existing.id.clone()));
        }

        if let Some(existing) = self.edges.iter_mut().find(|e| e.reverse_connection(&edge)) {
            existing.data.bidirectional = true;
            debug!(existing = %existing.id, discarded = %edge.id, "merged reverse edge");
            return Effect::MadeBidirectional {
                existing: existing.id.clone(),
                discarded: edge.id,
            };
        }

        if self.contains_edge(&edge.id) {
            return rejected(Rejection::IdInUse(edge.id));
        }

        let id = edge.id.clone();
        self.edges.push(edge);
        Effect::EdgeAdded(id)
    }

    /// Removes the edge; removing a Flow also removes every Link attached
    /// to it.
    pub fn remove_edge(&mut self, id: &EdgeId) -> Vec<Effect> {
        let Some(pos) = self.edges.iter().position(|e| &e.id == id) else {
            return vec![not_found(id)];
        };

        let removed = self.edges.remove(pos);
        let mut effects = vec![Effect::EdgeRemoved(removed.id.clone())];
        if removed.kind == EdgeKind::Flow {
            effects.extend(self.remove_links_on_flows(std::slice::from_ref(&removed.id)));
        }
        effects
    }

    fn remove_links_on_flows(&mut self, flows: &[EdgeId]) -> Vec<Effect> {
        if flows.is_empty() {
            return vec![];
        }
        let (attached, kept): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| flows.iter().any(|f| e.references_flow(f)));
        self.edges = kept;

        if !attached.is_empty() {
            debug!(count = attached.len(), "removed links attached to removed flows");
        }
        attached
            .into_iter()
            .map(|e| Effect::EdgeRemoved(e.id))
            .collect()
    }

    /// Swaps an edge's direction.  Endpoints and the per-side angle
    /// overrides move together; handle names stay where they are.  Links
    /// attached to a Flow toggle their `reversed` flag instead.
    pub fn reverse_edge_direction(&mut self, id: &EdgeId) -> Effect {
        let Some(edge) = self.edge_mut(id) else {
            return not_found(id);
        };

        if edge.class() == EdgeClass::FlowAttached {
            edge.data.reversed = !edge.data.reversed;
        } else {
            std::mem::swap(&mut edge.source, &mut edge.target);
            std::mem::swap(&mut edge.data.source_angle, &mut edge.data.target_angle);
        }
        Effect::EdgeUpdated(id.clone())
    }

    pub fn update_edge_data(&mut self, id: &EdgeId, patch: EdgePatch) -> Effect {
        match self.edge_mut(id) {
            Some(edge) => {
                edge.data.merge(patch);
                Effect::EdgeUpdated(id.clone())
            }
            None => not_found(id),
        }
    }

    /// Drops angle overrides and the curve offset, making the edge straight.
    pub fn clear_edge_geometry(&mut self, id: &EdgeId) -> Effect {
        match self.edge_mut(id) {
            Some(edge) => {
                edge.data.source_angle = None;
                edge.data.target_angle = None;
                edge.data.curve_offset = None;
                Effect::EdgeUpdated(id.clone())
            }
            None => not_found(id),
        }
    }

    pub fn move_cloud(&mut self, id: &EdgeId, side: Side, position: Point) -> Effect {
        let Some(edge) = self.edge_mut(id) else {
            return not_found(id);
        };
        match edge.endpoint_mut(side) {
            Endpoint::Cloud(p) => {
                *p = position;
                Effect::EdgeUpdated(id.clone())
            }
            _ => rejected(Rejection::NotACloud(id.clone(), side)),
        }
    }

    /// Feedback loops in the current snapshot.
    pub fn find_loops(&self, config: &CanvasConfig) -> Vec<FeedbackLoop> {
        find_cycles_with(&self.nodes, &self.edges, config)
    }
}

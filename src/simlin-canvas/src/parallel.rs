// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use crate::config::CanvasConfig;
use crate::datamodel::{Edge, EdgeId, EdgeKind, NodeId};

/// Lateral offset for an edge that shares both of its nodes with an edge of
/// the other kind, so a Link and a Flow between the same two nodes do not
/// draw on top of each other.
///
/// Links go to the positive side and Flows to the negative side of the
/// canonical `min(id) -> max(id)` direction, whichever way each edge runs.
/// Use [`to_edge_frame`] before handing the value to
/// [`connection_points`](crate::geometry::connection_points).  Returns 0.0
/// when no separation is needed.
pub fn compute_parallel_offset(
    edge_id: &EdgeId,
    source: &NodeId,
    target: &NodeId,
    kind: EdgeKind,
    edges: &[Edge],
    config: &CanvasConfig,
) -> f64 {
    if source == target {
        return 0.0;
    }

    let shares_pair_with_other_kind = edges.iter().any(|edge| {
        if &edge.id == edge_id || edge.kind != kind.opposite() {
            return false;
        }
        match edge.node_pair() {
            Some((s, t)) => (s == source && t == target) || (s == target && t == source),
            None => false,
        }
    });

    if !shares_pair_with_other_kind {
        return 0.0;
    }

    match kind {
        EdgeKind::Link => config.parallel_offset,
        EdgeKind::Flow => -config.parallel_offset,
    }
}

/// Converts a canonical offset into the `source -> target` frame of an edge.
pub fn to_edge_frame(offset: f64, source: &NodeId, target: &NodeId) -> f64 {
    if source > target { -offset } else { offset }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datamodel::Endpoint;

    fn link(id: &str, s: &str, t: &str) -> Edge {
        Edge::link(id, Endpoint::node(s), Endpoint::node(t))
    }

    fn flow(id: &str, s: &str, t: &str) -> Edge {
        Edge::flow(id, Endpoint::node(s), Endpoint::node(t))
    }

    fn offset_of(edge: &Edge, edges: &[Edge]) -> f64 {
        let (s, t) = edge.node_pair().unwrap();
        compute_parallel_offset(
            &edge.id,
            s,
            t,
            edge.kind,
            edges,
            &CanvasConfig::default(),
        )
    }

    #[test]
    fn test_no_offset_when_alone() {
        let edges = vec![link("l1", "a", "b")];
        assert_eq!(offset_of(&edges[0], &edges), 0.0);
    }

    #[test]
    fn test_no_offset_for_same_kind() {
        let edges = vec![link("l1", "a", "b"), link("l2", "b", "a")];
        assert_eq!(offset_of(&edges[0], &edges), 0.0);
    }

    #[test]
    fn test_link_and_flow_are_symmetric() {
        let edges = vec![link("l1", "a", "b"), flow("f1", "a", "b")];
        let l = offset_of(&edges[0], &edges);
        let f = offset_of(&edges[1], &edges);
        assert_eq!(l, 8.0);
        assert_eq!(f, -8.0);
        assert_eq!(l, -f);
    }

    #[test]
    fn test_direction_does_not_change_side() {
        let edges = vec![link("l1", "a", "b"), flow("f1", "b", "a")];
        assert_eq!(offset_of(&edges[0], &edges), 8.0);
        assert_eq!(offset_of(&edges[1], &edges), -8.0);

        let edges = vec![link("l1", "b", "a"), flow("f1", "a", "b")];
        assert_eq!(offset_of(&edges[0], &edges), 8.0);
        assert_eq!(offset_of(&edges[1], &edges), -8.0);
    }

    #[test]
    fn test_to_edge_frame() {
        let (a, b) = (NodeId::from("a"), NodeId::from("b"));
        assert_eq!(to_edge_frame(8.0, &a, &b), 8.0);
        assert_eq!(to_edge_frame(8.0, &b, &a), -8.0);
        assert_eq!(to_edge_frame(0.0, &b, &a), 0.0);
    }

    #[test]
    fn test_other_pairs_ignored() {
        let edges = vec![
            link("l1", "a", "b"),
            flow("f1", "a", "c"),
            Edge::link("l2", Endpoint::node("a"), Endpoint::flow("f1")),
        ];
        assert_eq!(offset_of(&edges[0], &edges), 0.0);
    }
}

// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use serde::Serialize;

use super::GraphModel;
use crate::config::CanvasConfig;
use crate::datamodel::{Edge, EdgeId, EdgeKind, Endpoint};
use crate::geometry::{
    Anchor, AngleOverrides, ConnectionPoints, EdgePath, Silhouette, connection_points, edge_path,
};
use crate::parallel::{compute_parallel_offset, to_edge_frame};

/// Everything a renderer needs to draw one edge.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct EdgeRoute {
    /// Start and end, in the direction influence travels.
    pub points: ConnectionPoints,
    pub path: EdgePath,
    /// Lateral separation applied because a parallel edge of the other kind
    /// shares both nodes, relative to the `min(id) -> max(id)` direction.
    pub offset: f64,
}

#[derive(Serialize)]
struct WireRoute {
    #[serde(flatten)]
    points: ConnectionPoints,
    offset: f64,
    #[serde(rename = "arrowAngle")]
    arrow_angle: f64,
}

impl Serialize for EdgeRoute {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireRoute {
            points: self.points,
            offset: self.offset,
            arrow_angle: self.path.arrow_angle(),
        }
        .serialize(serializer)
    }
}

impl GraphModel {
    /// Resolved geometry for an edge, or `None` if the edge or anything it
    /// attaches to is missing from the model.
    pub fn edge_route(&self, id: &EdgeId, config: &CanvasConfig) -> Option<EdgeRoute> {
        let edge = self.edge(id)?;
        self.route(edge, config)
    }

    /// Routes for every edge that can currently be resolved, in model order.
    pub fn edge_routes(&self, config: &CanvasConfig) -> Vec<(EdgeId, EdgeRoute)> {
        self.edges
            .iter()
            .filter_map(|edge| Some((edge.id.clone(), self.route(edge, config)?)))
            .collect()
    }

    fn route(&self, edge: &Edge, config: &CanvasConfig) -> Option<EdgeRoute> {
        let (from, to) = edge.directed_endpoints();
        let source = self.anchor(from, config)?;
        let target = self.anchor(to, config)?;

        let (offset, lateral) = match edge.node_pair() {
            Some((s, t)) => {
                let offset =
                    compute_parallel_offset(&edge.id, s, t, edge.kind, &self.edges, config);
                (offset, to_edge_frame(offset, s, t))
            }
            None => (0.0, 0.0),
        };

        let overrides = AngleOverrides::from_edge_data(&edge.data);
        let points = connection_points(&source, &target, lateral, Some(&overrides), config);
        let path = edge_path(&points, edge.data.curve_offset, config);

        Some(EdgeRoute {
            points,
            path,
            offset,
        })
    }

    fn anchor(&self, endpoint: &Endpoint, config: &CanvasConfig) -> Option<Anchor> {
        match endpoint {
            Endpoint::Node(id) => Some(Anchor::Shape(Silhouette::of(self.node(id)?, config))),
            Endpoint::Cloud(p) => Some(Anchor::Fixed(*p)),
            Endpoint::Flow(id) => {
                // links attach at the flow's valve, halfway along its path;
                // flows never end on flows, so this recursion is one level deep
                let flow = self.edge(id)?;
                if flow.kind != EdgeKind::Flow {
                    return None;
                }
                let route = self.route(flow, config)?;
                Some(Anchor::Fixed(route.path.midpoint()))
            }
        }
    }
}

// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::CanvasConfig;

/// A position or displacement in logical diagram coordinates (y grows down).
#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Angle from `self` to `other` in radians, in [-pi, pi].
    pub fn angle_to(self, other: Self) -> f64 {
        let delta = other - self;
        delta.y.atan2(delta.x)
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        self + (other - self) * t
    }
}

impl Add for Point {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Point {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<f64> for Point {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                $name(id.to_string())
            }
        }
    };
}

string_id!(NodeId);
string_id!(EdgeId);

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Accumulator, drawn as a rectangle.
    Stock,
    /// Formula or constant, drawn as an ellipse.
    Variable,
}

/// Opaque, user-editable text attached to a node.  The equation is never
/// interpreted here.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodeData {
    pub equation: Option<String>,
    pub units: Option<String>,
    pub documentation: Option<String>,
    pub attributes: Map<String, Value>,
}

/// Partial update for [`NodeData`]; `None` fields leave the current value.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NodePatch {
    pub equation: Option<String>,
    pub units: Option<String>,
    pub documentation: Option<String>,
    pub attributes: Map<String, Value>,
}

impl NodeData {
    pub fn merge(&mut self, patch: NodePatch) {
        if let Some(equation) = patch.equation {
            self.equation = Some(equation);
        }
        if let Some(units) = patch.units {
            self.units = Some(units);
        }
        if let Some(documentation) = patch.documentation {
            self.documentation = Some(documentation);
        }
        self.attributes.extend(patch.attributes);
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,
    kind: NodeKind,
    /// Top-left corner.
    pub position: Point,
    /// Measured size as reported by the renderer, if any.
    pub size: Option<Size>,
    pub label: String,
    #[serde(default)]
    pub data: NodeData,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, label: impl Into<String>, position: Point) -> Self {
        Node {
            id,
            kind,
            position,
            size: None,
            label: label.into(),
            data: NodeData::default(),
        }
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Measured size, or the per-kind default for unmeasured nodes.
    pub fn effective_size(&self, config: &CanvasConfig) -> Size {
        self.size.unwrap_or_else(|| config.default_size(self.kind))
    }

    pub fn center(&self, config: &CanvasConfig) -> Point {
        let size = self.effective_size(config);
        Point::new(
            self.position.x + size.width / 2.0,
            self.position.y + size.height / 2.0,
        )
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Information influence, drawn dashed.
    Link,
    /// Material transfer, may end in a cloud.
    Flow,
}

impl EdgeKind {
    pub fn opposite(self) -> Self {
        match self {
            EdgeKind::Link => EdgeKind::Flow,
            EdgeKind::Flow => EdgeKind::Link,
        }
    }
}

/// One end of an edge.  Links may terminate on a Flow edge; Flows may
/// terminate on an open cloud at a fixed canvas position.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "ref")]
pub enum Endpoint {
    Node(NodeId),
    Cloud(Point),
    Flow(EdgeId),
}

impl Endpoint {
    pub fn node(id: impl Into<String>) -> Self {
        Endpoint::Node(NodeId::new(id))
    }

    pub fn flow(id: impl Into<String>) -> Self {
        Endpoint::Flow(EdgeId::new(id))
    }

    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Endpoint::Node(id) => Some(id),
            _ => None,
        }
    }

    pub fn flow_id(&self) -> Option<&EdgeId> {
        match self {
            Endpoint::Flow(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_cloud(&self) -> bool {
        matches!(self, Endpoint::Cloud(_))
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Source,
    Target,
}

/// Polarity of a causal link.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Positive, // increase in source causes increase in target
    Negative, // increase in source causes decrease in target
}

#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgeData {
    pub label: Option<String>,
    pub documentation: Option<String>,
    /// Flow rate text; opaque.
    pub equation: Option<String>,
    pub polarity: Option<Polarity>,
    pub bidirectional: bool,
    /// Direction toggle for Links attached to a Flow.
    pub reversed: bool,
    /// Floating-handle attachment angles in radians.
    pub source_angle: Option<f64>,
    pub target_angle: Option<f64>,
    /// Manual displacement of the bezier control points.
    pub curve_offset: Option<Point>,
    pub attributes: Map<String, Value>,
}

/// Partial update for [`EdgeData`]; `None` fields leave the current value.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EdgePatch {
    pub label: Option<String>,
    pub documentation: Option<String>,
    pub equation: Option<String>,
    pub polarity: Option<Polarity>,
    pub bidirectional: Option<bool>,
    pub source_angle: Option<f64>,
    pub target_angle: Option<f64>,
    pub curve_offset: Option<Point>,
    pub attributes: Map<String, Value>,
}

impl EdgeData {
    pub fn merge(&mut self, patch: EdgePatch) {
        if let Some(label) = patch.label {
            self.label = Some(label);
        }
        if let Some(documentation) = patch.documentation {
            self.documentation = Some(documentation);
        }
        if let Some(equation) = patch.equation {
            self.equation = Some(equation);
        }
        if let Some(polarity) = patch.polarity {
            self.polarity = Some(polarity);
        }
        if let Some(bidirectional) = patch.bidirectional {
            self.bidirectional = bidirectional;
        }
        if let Some(angle) = patch.source_angle {
            self.source_angle = Some(angle);
        }
        if let Some(angle) = patch.target_angle {
            self.target_angle = Some(angle);
        }
        if let Some(offset) = patch.curve_offset {
            self.curve_offset = Some(offset);
        }
        self.attributes.extend(patch.attributes);
    }
}

/// How an edge's endpoints are interpreted by the graph model.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum EdgeClass {
    /// Node to node.
    Ordinary,
    /// A Link with one side on a node and the other on a Flow edge.
    FlowAttached,
    /// A Flow with one side on a node and the other on a cloud.
    Clouded,
    /// Any other combination; never stored.
    Unsupported,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub kind: EdgeKind,
    pub source: Endpoint,
    pub target: Endpoint,
    /// Fixed attachment sockets on the node shapes.  These name sockets, not
    /// directions, so they stay put when the edge is reversed.
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
    #[serde(default)]
    pub data: EdgeData,
}

impl Edge {
    pub fn new(id: EdgeId, kind: EdgeKind, source: Endpoint, target: Endpoint) -> Self {
        Edge {
            id,
            kind,
            source,
            target,
            source_handle: None,
            target_handle: None,
            data: EdgeData::default(),
        }
    }

    pub fn link(id: &str, source: Endpoint, target: Endpoint) -> Self {
        Edge::new(EdgeId::from(id), EdgeKind::Link, source, target)
    }

    pub fn flow(id: &str, source: Endpoint, target: Endpoint) -> Self {
        Edge::new(EdgeId::from(id), EdgeKind::Flow, source, target)
    }

    pub fn class(&self) -> EdgeClass {
        use Endpoint::*;
        match (self.kind, &self.source, &self.target) {
            (_, Node(_), Node(_)) => EdgeClass::Ordinary,
            (EdgeKind::Link, Node(_), Flow(_)) | (EdgeKind::Link, Flow(_), Node(_)) => {
                EdgeClass::FlowAttached
            }
            (EdgeKind::Flow, Node(_), Cloud(_)) | (EdgeKind::Flow, Cloud(_), Node(_)) => {
                EdgeClass::Clouded
            }
            _ => EdgeClass::Unsupported,
        }
    }

    pub fn endpoint(&self, side: Side) -> &Endpoint {
        match side {
            Side::Source => &self.source,
            Side::Target => &self.target,
        }
    }

    pub fn endpoint_mut(&mut self, side: Side) -> &mut Endpoint {
        match side {
            Side::Source => &mut self.source,
            Side::Target => &mut self.target,
        }
    }

    /// Source and target in the direction influence travels, honouring the
    /// `reversed` toggle of flow-attached Links.
    pub fn directed_endpoints(&self) -> (&Endpoint, &Endpoint) {
        if self.data.reversed && self.class() == EdgeClass::FlowAttached {
            (&self.target, &self.source)
        } else {
            (&self.source, &self.target)
        }
    }

    /// Both node ids, for node-to-node edges.
    pub fn node_pair(&self) -> Option<(&NodeId, &NodeId)> {
        match (&self.source, &self.target) {
            (Endpoint::Node(s), Endpoint::Node(t)) => Some((s, t)),
            _ => None,
        }
    }

    pub fn touches_node(&self, id: &NodeId) -> bool {
        self.source.node_id() == Some(id) || self.target.node_id() == Some(id)
    }

    pub fn references_flow(&self, id: &EdgeId) -> bool {
        self.source.flow_id() == Some(id) || self.target.flow_id() == Some(id)
    }

    /// Same kind, same endpoints, same effective direction.
    pub fn same_connection(&self, other: &Edge) -> bool {
        let (source, target) = self.directed_endpoints();
        let (other_source, other_target) = other.directed_endpoints();
        self.kind == other.kind && source == other_source && target == other_target
    }

    /// Same kind, endpoints swapped in effective direction.
    pub fn reverse_connection(&self, other: &Edge) -> bool {
        let (source, target) = self.directed_endpoints();
        let (other_source, other_target) = other.directed_endpoints();
        self.kind == other.kind && source == other_target && target == other_source
    }
}

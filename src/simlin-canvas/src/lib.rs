// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Editing core for stock and flow diagrams: the node and edge graph, the
//! geometry edges are drawn with, and feedback loop detection.

#![forbid(unsafe_code)]

pub mod common;
pub mod config;
pub mod constants;
pub mod datamodel;
pub mod geometry;
pub mod graph;
pub mod loops;
pub mod parallel;
pub mod uid;

pub use self::common::{Error, ErrorCode, ErrorKind, Result};
pub use self::config::CanvasConfig;
pub use self::datamodel::{
    Edge, EdgeClass, EdgeData, EdgeId, EdgeKind, EdgePatch, Endpoint, Node, NodeData, NodeId,
    NodeKind, NodePatch, Point, Polarity, Side, Size,
};
pub use self::geometry::{
    Anchor, AngleOverrides, ConnectionPoints, EdgePath, Silhouette, boundary_point,
    connection_points, edge_path, handle_angle, resolve_connection_points,
};
pub use self::graph::{EdgeRoute, Effect, GraphModel, Operation, Rejection};
pub use self::loops::{
    CausalGraph, FeedbackLoop, FlowPort, LoopClass, LoopMember, LoopNode, LoopPolarity,
    find_cycles, find_cycles_with,
};
pub use self::parallel::{compute_parallel_offset, to_edge_frame};

// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::datamodel::{NodeKind, Size};

/// Tunables shared by the geometry resolver, the parallel-edge offset
/// calculator and the loop classifier.
///
/// All dimensions are in logical diagram units (not pixels).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    // Fallback sizes for nodes the renderer has not measured yet
    pub stock_width: f64,
    pub stock_height: f64,
    pub variable_width: f64,
    pub variable_height: f64,

    /// Distance edges stop short of a node's stroke.
    pub border_offset: f64,
    /// Curve offsets with both components below this are drawn straight.
    pub curve_epsilon: f64,
    /// Lateral separation between a Link and a Flow sharing two nodes.
    pub parallel_offset: f64,

    /// Loops with at most this many real nodes are badged as direct feedback.
    pub direct_loop_max_nodes: usize,
    /// Loops with at least this many real nodes are badged as complex.
    pub complex_loop_min_nodes: usize,
}

impl CanvasConfig {
    pub fn default_size(&self, kind: NodeKind) -> Size {
        match kind {
            NodeKind::Stock => Size::new(self.stock_width, self.stock_height),
            NodeKind::Variable => Size::new(self.variable_width, self.variable_height),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            stock_width: STOCK_WIDTH,
            stock_height: STOCK_HEIGHT,
            variable_width: VARIABLE_WIDTH,
            variable_height: VARIABLE_HEIGHT,
            border_offset: BORDER_OFFSET,
            curve_epsilon: CURVE_EPSILON,
            parallel_offset: PARALLEL_OFFSET,
            direct_loop_max_nodes: DIRECT_LOOP_MAX_NODES,
            complex_loop_min_nodes: COMPLEX_LOOP_MIN_NODES,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CanvasConfig::default();

        assert!((config.stock_width - 45.0).abs() < f64::EPSILON);
        assert!((config.stock_height - 35.0).abs() < f64::EPSILON);
        assert!((config.variable_width - 18.0).abs() < f64::EPSILON);
        assert!((config.variable_height - 18.0).abs() < f64::EPSILON);

        assert!((config.border_offset - 2.0).abs() < f64::EPSILON);
        assert!((config.curve_epsilon - 0.5).abs() < f64::EPSILON);
        assert!((config.parallel_offset - 8.0).abs() < f64::EPSILON);

        assert_eq!(config.direct_loop_max_nodes, 2);
        assert_eq!(config.complex_loop_min_nodes, 6);
    }

    #[test]
    fn test_default_size_by_kind() {
        let config = CanvasConfig::default();
        assert_eq!(config.default_size(NodeKind::Stock), Size::new(45.0, 35.0));
        assert_eq!(config.default_size(NodeKind::Variable), Size::new(18.0, 18.0));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: CanvasConfig =
            serde_json::from_str(r#"{"parallel_offset": 4.0}"#).unwrap();
        assert!((config.parallel_offset - 4.0).abs() < f64::EPSILON);
        assert!((config.stock_width - 45.0).abs() < f64::EPSILON);
        assert_eq!(config.complex_loop_min_nodes, 6);
    }
}

// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::f64::consts::FRAC_PI_2;

pub const STOCK_WIDTH: f64 = 45.0;
pub const STOCK_HEIGHT: f64 = 35.0;
pub const AUX_RADIUS: f64 = 9.0;
pub const VARIABLE_WIDTH: f64 = 2.0 * AUX_RADIUS;
pub const VARIABLE_HEIGHT: f64 = 2.0 * AUX_RADIUS;
pub const BORDER_OFFSET: f64 = 2.0;
pub const CURVE_EPSILON: f64 = 0.5;
pub const PARALLEL_OFFSET: f64 = 8.0;
/// Used whenever two anchors share a center: straight up in screen space.
pub const DEFAULT_ANGLE: f64 = -FRAC_PI_2;
pub const DIRECT_LOOP_MAX_NODES: usize = 2;
pub const COMPLEX_LOOP_MIN_NODES: usize = 6;

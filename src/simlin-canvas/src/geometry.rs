// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

//! Where edges meet node silhouettes.
//!
//! Angles are radians in screen space (y grows downward), so `pi / 2`
//! points at the bottom of a node.  Nothing here ever returns NaN: degenerate
//! inputs resolve to [`DEFAULT_ANGLE`] or to the anchor's center.

use float_cmp::approx_eq;
use serde::{Deserialize, Serialize};

use crate::common::{is_zero, opposite_theta, rad_to_deg, square};
use crate::config::CanvasConfig;
use crate::constants::DEFAULT_ANGLE;
use crate::datamodel::{EdgeData, Node, NodeKind, Point, Size};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Shape {
    Rectangle,
    Ellipse,
}

impl Shape {
    pub fn of(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Stock => Shape::Rectangle,
            NodeKind::Variable => Shape::Ellipse,
        }
    }
}

/// The outline of a node as the resolver sees it.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Silhouette {
    pub center: Point,
    pub size: Size,
    pub shape: Shape,
}

impl Silhouette {
    pub fn of(node: &Node, config: &CanvasConfig) -> Self {
        Silhouette {
            center: node.center(config),
            size: node.effective_size(config),
            shape: Shape::of(node.kind()),
        }
    }

    pub fn rectangle(center: Point, size: Size) -> Self {
        Silhouette {
            center,
            size,
            shape: Shape::Rectangle,
        }
    }

    pub fn ellipse(center: Point, size: Size) -> Self {
        Silhouette {
            center,
            size,
            shape: Shape::Ellipse,
        }
    }
}

/// Something an edge end can attach to: a node outline, or a fixed canvas
/// point such as a cloud or a flow valve.
#[derive(Copy, Clone, PartialEq, Debug)]
pub enum Anchor {
    Shape(Silhouette),
    Fixed(Point),
}

impl Anchor {
    pub fn center(&self) -> Point {
        match self {
            Anchor::Shape(s) => s.center,
            Anchor::Fixed(p) => *p,
        }
    }

    fn attach(&self, angle: f64, border: f64) -> Point {
        match self {
            Anchor::Shape(s) => boundary_point(s, angle, border),
            Anchor::Fixed(p) => *p,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
pub struct ConnectionPoints {
    pub sx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl ConnectionPoints {
    pub fn new(source: Point, target: Point) -> Self {
        ConnectionPoints {
            sx: source.x,
            sy: source.y,
            tx: target.x,
            ty: target.y,
        }
    }

    pub fn source(&self) -> Point {
        Point::new(self.sx, self.sy)
    }

    pub fn target(&self) -> Point {
        Point::new(self.tx, self.ty)
    }
}

/// Per-edge attachment angles set by dragging a floating handle.
#[derive(Copy, Clone, PartialEq, Debug, Default)]
pub struct AngleOverrides {
    pub source: Option<f64>,
    pub target: Option<f64>,
}

impl AngleOverrides {
    pub fn from_edge_data(data: &EdgeData) -> Self {
        AngleOverrides {
            source: data.source_angle,
            target: data.target_angle,
        }
    }
}

fn sanitize_angle(angle: f64) -> f64 {
    if angle.is_finite() {
        angle
    } else {
        DEFAULT_ANGLE
    }
}

/// Angle of the ray from `from` to `to`, or [`DEFAULT_ANGLE`] when the two
/// points coincide.
pub fn center_angle(from: Point, to: Point) -> f64 {
    let delta = to - from;
    if !delta.x.is_finite() || !delta.y.is_finite() {
        return DEFAULT_ANGLE;
    }
    if approx_eq!(f64, delta.length(), 0.0, epsilon = 1e-9) {
        return DEFAULT_ANGLE;
    }
    from.angle_to(to)
}

/// Angle to store for a floating handle dragged to `pointer`.
pub fn handle_angle(center: Point, pointer: Point) -> f64 {
    center_angle(center, pointer)
}

/// Intersection of the ray leaving the silhouette's center at `angle` with
/// its outline, pushed a further `border` along the ray.
pub fn boundary_point(silhouette: &Silhouette, angle: f64, border: f64) -> Point {
    let theta = sanitize_angle(angle);
    let (sin, cos) = theta.sin_cos();
    let w = silhouette.size.width / 2.0;
    let h = silhouette.size.height / 2.0;
    let c = silhouette.center;

    if is_zero(w) || is_zero(h) || !w.is_finite() || !h.is_finite() {
        return Point::new(c.x + border * cos, c.y + border * sin);
    }

    let (x, y) = match silhouette.shape {
        Shape::Rectangle => {
            // |tan(theta)| <= h / w, rearranged to avoid dividing by cos
            if sin.abs() * w <= cos.abs() * h {
                (w.copysign(cos), w * sin / cos.abs())
            } else {
                (h * cos / sin.abs(), h.copysign(sin))
            }
        }
        Shape::Ellipse => {
            let t = 1.0 / (square(cos) / square(w) + square(sin) / square(h)).sqrt();
            (t * cos, t * sin)
        }
    };

    Point::new(c.x + x + border * cos, c.y + y + border * sin)
}

fn resolve_angle(stored: Option<f64>, straight: f64) -> f64 {
    match stored {
        Some(angle) if angle.is_finite() => angle,
        _ => straight,
    }
}

/// Start and end of an edge between two anchors.
///
/// The straight-line angle between centers is used on each side unless
/// `overrides` carries a stored angle for it.  A non-zero `offset`
/// displaces both ends along the perpendicular of the source-to-target
/// direction (positive is to the left of travel in screen space).
pub fn connection_points(
    source: &Anchor,
    target: &Anchor,
    offset: f64,
    overrides: Option<&AngleOverrides>,
    config: &CanvasConfig,
) -> ConnectionPoints {
    let overrides = overrides.copied().unwrap_or_default();
    let theta = center_angle(source.center(), target.center());

    let source_angle = resolve_angle(overrides.source, theta);
    let target_angle = resolve_angle(overrides.target, opposite_theta(theta));

    let mut start = source.attach(source_angle, config.border_offset);
    let mut end = target.attach(target_angle, config.border_offset);

    if offset.is_finite() && !is_zero(offset) {
        let (sin, cos) = theta.sin_cos();
        let perpendicular = Point::new(sin, -cos) * offset;
        start = start + perpendicular;
        end = end + perpendicular;
    }

    ConnectionPoints::new(start, end)
}

/// Entry point used by the editor surface; see [`connection_points`].
pub fn resolve_connection_points(
    source: &Anchor,
    target: &Anchor,
    offset: Option<f64>,
    overrides: Option<&AngleOverrides>,
    config: &CanvasConfig,
) -> ConnectionPoints {
    connection_points(source, target, offset.unwrap_or(0.0), overrides, config)
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum EdgePath {
    Straight {
        start: Point,
        end: Point,
    },
    Bezier {
        start: Point,
        c1: Point,
        c2: Point,
        end: Point,
    },
}

impl EdgePath {
    pub fn start(&self) -> Point {
        match self {
            EdgePath::Straight { start, .. } | EdgePath::Bezier { start, .. } => *start,
        }
    }

    pub fn end(&self) -> Point {
        match self {
            EdgePath::Straight { end, .. } | EdgePath::Bezier { end, .. } => *end,
        }
    }

    pub fn midpoint(&self) -> Point {
        match *self {
            EdgePath::Straight { start, end } => start.lerp(end, 0.5),
            EdgePath::Bezier { start, c1, c2, end } => {
                (start + end) * 0.125 + (c1 + c2) * 0.375
            }
        }
    }

    /// Direction of travel at the end of the path, in degrees, for
    /// orienting arrowheads.
    pub fn arrow_angle(&self) -> f64 {
        let from = match *self {
            EdgePath::Straight { start, .. } => start,
            EdgePath::Bezier { start, c2, end, .. } => {
                if approx_eq!(f64, (end - c2).length(), 0.0, epsilon = 1e-9) {
                    start
                } else {
                    c2
                }
            }
        };
        rad_to_deg(center_angle(from, self.end()))
    }
}

/// Path between already resolved end points.  Offsets whose components are
/// both within `curve_epsilon` of zero give a straight segment.
pub fn edge_path(
    points: &ConnectionPoints,
    curve_offset: Option<Point>,
    config: &CanvasConfig,
) -> EdgePath {
    let start = points.source();
    let end = points.target();

    let offset = match curve_offset {
        Some(o)
            if o.x.is_finite()
                && o.y.is_finite()
                && (o.x.abs() >= config.curve_epsilon || o.y.abs() >= config.curve_epsilon) =>
        {
            o
        }
        _ => return EdgePath::Straight { start, end },
    };

    EdgePath::Bezier {
        start,
        c1: start.lerp(end, 1.0 / 3.0) + offset,
        c2: start.lerp(end, 2.0 / 3.0) + offset,
        end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const EPS: f64 = 1e-9;

    fn near(a: Point, b: Point) -> bool {
        approx_eq!(f64, a.x, b.x, epsilon = 1e-6) && approx_eq!(f64, a.y, b.y, epsilon = 1e-6)
    }

    fn rect(w: f64, h: f64) -> Silhouette {
        Silhouette::rectangle(Point::default(), Size::new(w, h))
    }

    #[test]
    fn test_rectangle_axis_points() {
        let r = rect(100.0, 50.0);
        assert!(near(boundary_point(&r, 0.0, 2.0), Point::new(52.0, 0.0)));
        assert!(near(boundary_point(&r, FRAC_PI_2, 2.0), Point::new(0.0, 27.0)));
        assert!(near(boundary_point(&r, PI, 2.0), Point::new(-52.0, 0.0)));
        assert!(near(boundary_point(&r, -FRAC_PI_2, 2.0), Point::new(0.0, -27.0)));
    }

    #[test]
    fn test_rectangle_corner_regions() {
        let r = rect(100.0, 50.0);
        // 45 degrees is steeper than the 1:2 aspect ratio, so the bottom edge is hit
        let p = boundary_point(&r, FRAC_PI_4, 0.0);
        assert!(near(p, Point::new(25.0, 25.0)));

        // a shallow ray hits the right edge
        let theta = (0.25f64).atan();
        let p = boundary_point(&r, theta, 0.0);
        assert!(near(p, Point::new(50.0, 12.5)));
    }

    #[test]
    fn test_ellipse_points() {
        let e = Silhouette::ellipse(Point::new(10.0, 10.0), Size::new(100.0, 50.0));
        assert!(near(boundary_point(&e, 0.0, 2.0), Point::new(62.0, 10.0)));
        assert!(near(boundary_point(&e, FRAC_PI_2, 2.0), Point::new(10.0, 37.0)));

        let circle = Silhouette::ellipse(Point::default(), Size::new(18.0, 18.0));
        let p = boundary_point(&circle, FRAC_PI_4, 2.0);
        assert!((p.length() - 11.0).abs() < EPS);
    }

    #[test]
    fn test_degenerate_inputs_never_nan() {
        let zero = rect(0.0, 0.0);
        let p = boundary_point(&zero, 0.0, 2.0);
        assert!(near(p, Point::new(2.0, 0.0)));

        let r = rect(100.0, 50.0);
        let p = boundary_point(&r, f64::NAN, 0.0);
        assert!(p.x.is_finite() && p.y.is_finite());
        // NaN falls back to straight up
        assert!(near(p, Point::new(0.0, -25.0)));
    }

    #[test]
    fn test_center_angle_coincident_is_default() {
        let p = Point::new(3.0, 4.0);
        assert_eq!(center_angle(p, p), DEFAULT_ANGLE);
        assert!((center_angle(Point::default(), Point::new(0.0, 1.0)) - FRAC_PI_2).abs() < EPS);
    }

    #[test]
    fn test_connection_points_between_shapes() {
        let config = CanvasConfig::default();
        let a = Anchor::Shape(Silhouette::rectangle(Point::new(0.0, 0.0), Size::new(40.0, 20.0)));
        let b = Anchor::Shape(Silhouette::ellipse(Point::new(100.0, 0.0), Size::new(20.0, 20.0)));
        let pts = connection_points(&a, &b, 0.0, None, &config);
        assert!(near(pts.source(), Point::new(22.0, 0.0)));
        assert!(near(pts.target(), Point::new(88.0, 0.0)));
    }

    #[test]
    fn test_connection_points_fixed_anchor() {
        let config = CanvasConfig::default();
        let stock = Anchor::Shape(Silhouette::rectangle(Point::default(), Size::new(40.0, 20.0)));
        let cloud = Anchor::Fixed(Point::new(0.0, 100.0));
        let pts = connection_points(&cloud, &stock, 0.0, None, &config);
        // the cloud end is the fixed point itself
        assert!(near(pts.source(), Point::new(0.0, 100.0)));
        assert!(near(pts.target(), Point::new(0.0, 12.0)));
    }

    #[test]
    fn test_connection_points_coincident_centers() {
        let config = CanvasConfig::default();
        let a = Anchor::Shape(rect(40.0, 20.0));
        let pts = connection_points(&a, &a, 0.0, None, &config);
        assert!(pts.sx.is_finite() && pts.sy.is_finite());
        assert!(pts.tx.is_finite() && pts.ty.is_finite());
        assert!(near(pts.source(), Point::new(0.0, -12.0)));
    }

    #[test]
    fn test_connection_points_offset_is_perpendicular() {
        let config = CanvasConfig::default();
        let a = Anchor::Fixed(Point::new(0.0, 0.0));
        let b = Anchor::Fixed(Point::new(100.0, 0.0));
        let pts = connection_points(&a, &b, 8.0, None, &config);
        assert!(near(pts.source(), Point::new(0.0, -8.0)));
        assert!(near(pts.target(), Point::new(100.0, -8.0)));

        let pts = connection_points(&a, &b, -8.0, None, &config);
        assert!(near(pts.source(), Point::new(0.0, 8.0)));
    }

    #[test]
    fn test_angle_overrides() {
        let config = CanvasConfig::default();
        let a = Anchor::Shape(Silhouette::ellipse(Point::default(), Size::new(20.0, 20.0)));
        let b = Anchor::Shape(Silhouette::ellipse(Point::new(100.0, 0.0), Size::new(20.0, 20.0)));

        let overrides = AngleOverrides {
            source: Some(FRAC_PI_2),
            target: None,
        };
        let pts = connection_points(&a, &b, 0.0, Some(&overrides), &config);
        assert!(near(pts.source(), Point::new(0.0, 12.0)));
        // the side without an override keeps the straight-line angle
        assert!(near(pts.target(), Point::new(88.0, 0.0)));

        let bogus = AngleOverrides {
            source: Some(f64::INFINITY),
            target: None,
        };
        let pts = connection_points(&a, &b, 0.0, Some(&bogus), &config);
        assert!(near(pts.source(), Point::new(12.0, 0.0)));
    }

    #[test]
    fn test_handle_angle() {
        let c = Point::new(10.0, 10.0);
        assert!((handle_angle(c, Point::new(20.0, 10.0))).abs() < EPS);
        assert_eq!(handle_angle(c, c), DEFAULT_ANGLE);
    }

    #[test]
    fn test_edge_path_straight_for_tiny_offset() {
        let config = CanvasConfig::default();
        let pts = ConnectionPoints::new(Point::new(0.0, 0.0), Point::new(90.0, 0.0));
        assert!(matches!(edge_path(&pts, None, &config), EdgePath::Straight { .. }));
        let tiny = Some(Point::new(0.1, -0.2));
        assert!(matches!(edge_path(&pts, tiny, &config), EdgePath::Straight { .. }));

        let path = edge_path(&pts, Some(Point::new(0.0, 30.0)), &config);
        match path {
            EdgePath::Bezier { c1, c2, .. } => {
                assert!(near(c1, Point::new(30.0, 30.0)));
                assert!(near(c2, Point::new(60.0, 30.0)));
            }
            EdgePath::Straight { .. } => panic!("expected a curve"),
        }
        assert!(near(path.midpoint(), Point::new(45.0, 22.5)));
    }

    #[test]
    fn test_arrow_angle() {
        let config = CanvasConfig::default();
        let pts = ConnectionPoints::new(Point::new(0.0, 0.0), Point::new(0.0, 50.0));
        let path = edge_path(&pts, None, &config);
        assert!((path.arrow_angle() - 90.0).abs() < EPS);
        assert!(near(path.midpoint(), Point::new(0.0, 25.0)));

        let zero = ConnectionPoints::default();
        let path = edge_path(&zero, None, &config);
        assert!((path.arrow_angle() + 90.0).abs() < EPS);
    }
}

// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use simlin_canvas::{
    CanvasConfig, Edge, EdgeId, EdgeKind, Effect, Endpoint, GraphModel, LoopClass, LoopMember,
    NodeId, NodeKind, Operation, Point, Rejection,
};

fn create(model: &mut GraphModel, kind: NodeKind, x: f64, y: f64) -> NodeId {
    model
        .create_node(kind, Point::new(x, y))
        .expect("labels available")
}

/// population -> births (flow from a cloud) with birth rate feeding the flow
/// and population feeding back into it.
fn population_model() -> (GraphModel, NodeId, NodeId, EdgeId) {
    let mut model = GraphModel::new();
    let population = create(&mut model, NodeKind::Stock, 300.0, 100.0);
    let rate = create(&mut model, NodeKind::Variable, 150.0, 250.0);

    let births = model.new_edge(
        EdgeKind::Flow,
        Endpoint::Cloud(Point::new(50.0, 117.5)),
        Endpoint::Node(population.clone()),
    );
    let births_id = births.id.clone();
    assert_eq!(model.add_edge(births), Effect::EdgeAdded(births_id.clone()));

    let effects = model.apply_changes(vec![
        Operation::Connect {
            kind: EdgeKind::Link,
            source: Endpoint::Node(rate.clone()),
            target: Endpoint::Flow(births_id.clone()),
        },
        Operation::Connect {
            kind: EdgeKind::Link,
            source: Endpoint::Node(population.clone()),
            target: Endpoint::Flow(births_id.clone()),
        },
    ]);
    assert!(effects.iter().all(|e| matches!(e, Effect::EdgeAdded(_))));

    (model, population, rate, births_id)
}

#[test]
fn population_feedback_loop() {
    let (model, population, _, births) = population_model();
    let loops = model.find_loops(&CanvasConfig::default());
    assert_eq!(loops.len(), 1);

    let l = &loops[0];
    assert_eq!(
        l.members,
        vec![LoopMember::Node(population), LoopMember::Flow(births)]
    );
    assert_eq!(l.class, LoopClass::Direct);
    assert_eq!(l.format_path(model.nodes(), model.edges()), "A -> e1 -> A");
}

#[test]
fn deleting_stock_clears_everything_attached() {
    let (mut model, population, rate, _) = population_model();
    let effects = model.apply_changes(vec![Operation::RemoveNode {
        id: population.clone(),
    }]);

    // node, its flow, and both links riding on the flow
    assert_eq!(effects.len(), 4);
    assert!(model.edges().is_empty());
    assert!(model.node(&rate).is_some());
    assert!(model.find_loops(&CanvasConfig::default()).is_empty());
}

#[test]
fn batch_skips_deltas_for_removed_entities() {
    let (mut model, population, rate, births) = population_model();
    let effects = model.apply_changes(vec![
        Operation::RemoveEdge { id: births.clone() },
        Operation::ReverseEdge {
            id: EdgeId::from("e2"),
        },
        Operation::MoveNode {
            id: rate.clone(),
            position: Point::new(10.0, 10.0),
        },
        Operation::MoveCloud {
            id: births,
            side: simlin_canvas::Side::Source,
            position: Point::default(),
        },
    ]);

    assert_eq!(effects[0], Effect::EdgeRemoved(EdgeId::from("e1")));
    assert!(effects.contains(&Effect::NotFound("e2".to_string())));
    assert!(effects.contains(&Effect::NodeUpdated(rate.clone())));
    assert_eq!(effects.last(), Some(&Effect::NotFound("e1".to_string())));
    assert_eq!(model.node(&rate).unwrap().position, Point::new(10.0, 10.0));
    assert!(model.node(&population).is_some());
}

#[test]
fn reverse_then_duplicate_is_noop() {
    let mut model = GraphModel::new();
    let a = create(&mut model, NodeKind::Variable, 0.0, 0.0);
    let b = create(&mut model, NodeKind::Variable, 100.0, 0.0);

    model.add_edge(Edge::link("l1", Endpoint::Node(a.clone()), Endpoint::Node(b.clone())));
    model.reverse_edge_direction(&EdgeId::from("l1"));

    let effect = model.add_edge(Edge::link(
        "l2",
        Endpoint::Node(b.clone()),
        Endpoint::Node(a.clone()),
    ));
    assert_eq!(
        effect,
        Effect::Rejected(Rejection::Duplicate(EdgeId::from("l1")))
    );

    let effect = model.add_edge(Edge::link("l3", Endpoint::Node(a), Endpoint::Node(b)));
    assert!(matches!(effect, Effect::MadeBidirectional { .. }));
    assert_eq!(model.edges().len(), 1);
    assert_eq!(model.find_loops(&CanvasConfig::default()).len(), 1);
}

#[test]
fn routes_follow_dragged_nodes() {
    let config = CanvasConfig::default();
    let (mut model, population, rate, births) = population_model();

    let before = model.edge_route(&EdgeId::from("e2"), &config).unwrap();
    model.move_node(&rate, Point::new(150.0, 400.0));
    let after = model.edge_route(&EdgeId::from("e2"), &config).unwrap();
    assert!(after.points.sy > before.points.sy);
    // the link still ends at the valve, which did not move
    assert_eq!(after.points.target(), before.points.target());

    model.move_node(&population, Point::new(600.0, 100.0));
    let flow = model.edge_route(&births, &config).unwrap();
    assert_eq!(flow.points.source(), Point::new(50.0, 117.5));
    let moved = model.edge_route(&EdgeId::from("e2"), &config).unwrap();
    assert!(moved.points.tx > after.points.tx);
}

#[test]
fn labels_stay_unique_across_edits() {
    let mut model = GraphModel::new();
    let ids: Vec<NodeId> = (0..30)
        .map(|i| create(&mut model, NodeKind::Stock, i as f64, 0.0))
        .collect();
    model.remove_node(&ids[1]);
    let next = create(&mut model, NodeKind::Stock, 0.0, 0.0);
    // "B" was freed but the sequence moves forward before reusing
    assert_eq!(model.node(&next).unwrap().label, "AE");

    let mut labels: Vec<&str> = model.nodes().iter().map(|n| n.label.as_str()).collect();
    labels.sort();
    labels.dedup();
    assert_eq!(labels.len(), model.nodes().len());
}

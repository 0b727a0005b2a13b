// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end tests: editing, reconstructing, compiling and running graphs.

use ordoplay_script_graph::kinds::{Branch, Constant, Entry, Print, Select, TypeCast};
use ordoplay_script_graph::{
    create_script_registry, ClassTable, ConnectionError, ExecutionContext, ExecutionError, ExecutionOwner,
    ExecutionSettings, Graph, InitContext, NodeId, NodeRecord, ObjectRef, PinDirection, PinRef, PropertyChange,
    ScriptBuild, StepEngine, Variant, VariantType,
};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn classes() -> ClassTable {
    let mut table = ClassTable::new();
    table
        .register("Node", "Object")
        .register("CanvasItem", "Node")
        .register("Node2D", "CanvasItem")
        .register("Sprite2D", "Node2D")
        .register("Resource", "Object");
    table
}

fn owner() -> ExecutionOwner {
    ExecutionOwner::new(Arc::new(classes()))
}

fn output(graph: &Graph, node: NodeId, name: &str) -> PinRef {
    graph.pin_ref(node, name, PinDirection::Output).unwrap()
}

fn input(graph: &Graph, node: NodeId, name: &str) -> PinRef {
    graph.pin_ref(node, name, PinDirection::Input).unwrap()
}

fn link(graph: &mut Graph, from: (NodeId, &str), to: (NodeId, &str)) {
    let from = output(graph, from.0, from.1);
    let to = input(graph, to.0, to.1);
    graph.link(from, to).unwrap();
}

#[test]
fn test_data_input_accepts_one_link() {
    let mut graph = Graph::new("Script");
    let first = graph.spawn(Constant::new(Variant::Int(1)), &InitContext::new());
    let second = graph.spawn(Constant::new(Variant::Int(2)), &InitContext::new());
    let select = graph.spawn(Select::new(VariantType::Int), &InitContext::new());

    link(&mut graph, (first, "value"), (select, "a"));
    let second_out = output(&graph, second, "value");
    let a = input(&graph, select, "a");
    assert_eq!(graph.link(second_out, a), Err(ConnectionError::InputOccupied(a)));
    assert_eq!(graph.connection_count(), 1);
}

#[test]
fn test_select_retype_keeps_links() {
    init_tracing();
    let mut graph = Graph::new("Script");
    let a_src = graph.spawn(Constant::new(Variant::Int(1)), &InitContext::new());
    let b_src = graph.spawn(Constant::new(Variant::Int(2)), &InitContext::new());
    let select = graph.spawn(Select::new(VariantType::Int), &InitContext::new());
    let print = graph.spawn(Print::default(), &InitContext::new());
    link(&mut graph, (a_src, "value"), (select, "a"));
    link(&mut graph, (b_src, "value"), (select, "b"));
    link(&mut graph, (select, "result"), (print, "text"));

    assert!(graph.change_pin_types(select, VariantType::String).unwrap());

    let node = graph.node(select).unwrap();
    for name in ["a", "b", "result"] {
        let pin = node.find_pin(name, None).unwrap();
        assert_eq!(pin.pin_type(), VariantType::String, "{name}");
        assert_eq!(pin.connections().len(), 1, "{name}");
    }
    assert_eq!(node.find_pin("a", None).unwrap().default_value(), &Variant::from(""));
    assert_eq!(graph.connection_count(), 3);

    // The peers point at the new pins
    let a = input(&graph, select, "a");
    assert_eq!(graph.pin(output(&graph, a_src, "value")).unwrap().connections(), &[a]);
}

#[test]
fn test_constant_retype_follows_default_rule() {
    let mut graph = Graph::new("Script");
    let constant = graph.spawn(Constant::new(Variant::Int(3)), &InitContext::new());
    let select = graph.spawn(Select::default(), &InitContext::new());
    let print = graph.spawn(Print::default(), &InitContext::new());
    link(&mut graph, (constant, "value"), (select, "a"));

    // Int converts to Float: the link survives
    graph.change_pin_types(constant, VariantType::Float).unwrap();
    assert_eq!(graph.connection_count(), 1);
    assert_eq!(
        graph.node(constant).unwrap().kind().get_property("value"),
        Some(Variant::Float(3.0))
    );

    // Float does not convert to Color: the link is dropped on both sides
    graph.change_pin_types(constant, VariantType::Color).unwrap();
    assert_eq!(graph.connection_count(), 0);
    assert!(!graph.pin(input(&graph, select, "a")).unwrap().has_any_connections());

    // Unrelated nodes are untouched
    assert!(!graph.node(print).unwrap().has_any_connections());
}

#[test]
fn test_remove_pin_severs_both_sides() {
    let mut graph = Graph::new("Script");
    let entry = graph.spawn(Entry, &InitContext::new());
    let first = graph.spawn(Print::default(), &InitContext::new());
    let second = graph.spawn(Print::default(), &InitContext::new());
    link(&mut graph, (entry, "ExecOut"), (first, "ExecIn"));
    link(&mut graph, (first, "ExecOut"), (second, "ExecIn"));

    let exec_in = input(&graph, first, "ExecIn");
    graph.remove_pin(exec_in).unwrap();
    assert!(!graph.pin(output(&graph, entry, "ExecOut")).unwrap().has_any_connections());
    assert_eq!(graph.connection_count(), 1);
    assert_eq!(graph.node(first).unwrap().find_pin("text", None).unwrap().index(), 0);
}

#[test]
fn test_cast_step() {
    let mut graph = Graph::new("Script");
    let cast = graph.spawn(TypeCast::default(), &InitContext::new().with_class_name("Node2D"));
    let build = ScriptBuild::build(&graph, owner()).unwrap();
    let compiled = build.get(cast).unwrap();

    let sprite = Variant::from(ObjectRef::new(1, "Sprite2D"));
    let mut context = ExecutionContext::new(vec![sprite.clone()], 1);
    assert_eq!(compiled.step(&mut context), 0);
    assert_eq!(context.output(0), Some(&sprite));

    let mut context = ExecutionContext::new(vec![Variant::from(ObjectRef::new(2, "Resource"))], 1);
    assert_eq!(compiled.step(&mut context), 1);
    assert_eq!(context.output(0), None);

    // The target is frozen at compile time
    graph.set_node_property(cast, "type", &Variant::from("Resource")).unwrap();
    let mut context = ExecutionContext::new(vec![sprite], 1);
    assert_eq!(compiled.step(&mut context), 0);
    assert!(compiled.is_stale(&graph));
}

#[test]
fn test_select_step() {
    let mut graph = Graph::new("Script");
    let select = graph.spawn(Select::new(VariantType::String), &InitContext::new());
    let build = ScriptBuild::build(&graph, owner()).unwrap();
    let compiled = build.get(select).unwrap();

    let mut context = ExecutionContext::new(vec!["x".into(), "y".into(), Variant::Bool(true)], 1);
    assert_eq!(compiled.step(&mut context), 0);
    assert_eq!(context.output(0), Some(&Variant::from("x")));

    let mut context = ExecutionContext::new(vec!["x".into(), "y".into(), Variant::Bool(false)], 1);
    assert_eq!(compiled.step(&mut context), 0);
    assert_eq!(context.output(0), Some(&Variant::from("y")));
}

#[test]
fn test_run_branch_cast_print() {
    init_tracing();
    let mut graph = Graph::new("Script");
    let entry = graph.spawn(Entry, &InitContext::new());
    let condition = graph.spawn(Constant::new(Variant::Bool(true)), &InitContext::new());
    let branch = graph.spawn(Branch, &InitContext::new());
    let object = graph.spawn(
        Constant::new(Variant::from(ObjectRef::new(9, "Sprite2D"))),
        &InitContext::new(),
    );
    let cast = graph.spawn(TypeCast::new("Node"), &InitContext::new());
    let is_node = graph.spawn(Print::new("is a node"), &InitContext::new());
    let not_node = graph.spawn(Print::new("not a node"), &InitContext::new());

    link(&mut graph, (entry, "ExecOut"), (branch, "ExecIn"));
    link(&mut graph, (condition, "value"), (branch, "condition"));
    link(&mut graph, (branch, "true"), (cast, "ExecIn"));
    link(&mut graph, (object, "value"), (cast, "instance"));
    link(&mut graph, (cast, "yes"), (is_node, "ExecIn"));
    link(&mut graph, (cast, "no"), (not_node, "ExecIn"));

    let mut build = ScriptBuild::build(&graph, owner()).unwrap();
    let lines = build.owner().output().clone();
    let mut engine = StepEngine::new(&graph, &mut build, ExecutionSettings::default());
    let summary = engine.run(entry).unwrap();

    assert_eq!(summary.path, vec![entry, branch, cast, is_node]);
    assert_eq!(lines.lines(), vec!["is a node".to_string()]);
    assert_eq!(
        engine.output_value(output(&graph, cast, "output")),
        Some(&Variant::from(ObjectRef::new(9, "Sprite2D")))
    );
}

#[test]
fn test_stale_instance_after_reconstruct() {
    let mut graph = Graph::new("Script");
    let entry = graph.spawn(Entry, &InitContext::new());
    let print = graph.spawn(Print::new("before"), &InitContext::new());
    link(&mut graph, (entry, "ExecOut"), (print, "ExecIn"));
    let mut build = ScriptBuild::build(&graph, owner()).unwrap();

    assert_eq!(
        graph.set_node_property(print, "text", &Variant::from("after")).unwrap(),
        PropertyChange::PinsChanged
    );
    assert_eq!(graph.connection_count(), 1);

    let result = StepEngine::new(&graph, &mut build, ExecutionSettings::default()).run(entry);
    assert!(matches!(result, Err(ExecutionError::StaleInstance(node)) if node == print));

    build.refresh(&graph).unwrap();
    let lines = build.owner().output().clone();
    StepEngine::new(&graph, &mut build, ExecutionSettings::default())
        .run(entry)
        .unwrap();
    assert_eq!(lines.lines(), vec!["after".to_string()]);
}

#[test]
fn test_autowire_cast_adopts_class() {
    init_tracing();
    let mut graph = Graph::new("Script");
    let object = graph.spawn(
        Constant::new(Variant::from(ObjectRef::new(3, "Sprite2D"))),
        &InitContext::new(),
    );
    let cast = graph.spawn(TypeCast::default(), &InitContext::new());
    assert_eq!(graph.node(cast).unwrap().title(), "Cast To Object");

    assert_eq!(graph.autowire(object, cast).unwrap(), 1);
    let node = graph.node(cast).unwrap();
    assert_eq!(node.title(), "Cast To Sprite2D");
    assert_eq!(node.kind_as::<TypeCast>().unwrap().target_type(), "Sprite2D");
    assert_eq!(node.find_pin("output", None).unwrap().label(), "as Sprite2D");
    // The link survived the reconstruction triggered by the new class
    assert!(node.find_pin("instance", None).unwrap().has_any_connections());
    assert_eq!(graph.resolve_type_class(output(&graph, cast, "output")), "Sprite2D");
}

#[test]
fn test_records_rebuild_runnable_graph() {
    let mut graph = Graph::new("Script");
    let entry = graph.spawn(Entry, &InitContext::new());
    let a = graph.spawn(Constant::new(Variant::from("picked")), &InitContext::new());
    let select = graph.spawn(Select::new(VariantType::String), &InitContext::new());
    let print = graph.spawn(Print::default(), &InitContext::new());
    link(&mut graph, (entry, "ExecOut"), (print, "ExecIn"));
    link(&mut graph, (a, "value"), (select, "a"));
    link(&mut graph, (select, "result"), (print, "text"));
    let pick_a = input(&graph, select, "pick_a");
    graph.set_pin_default_value(pick_a, Variant::Bool(true)).unwrap();

    let text = ron::ser::to_string(&graph.to_records()).unwrap();
    let records: Vec<NodeRecord> = ron::from_str(&text).unwrap();
    let restored = Graph::from_records("Restored", &records, &create_script_registry()).unwrap();

    let mut build = ScriptBuild::build(&restored, owner()).unwrap();
    let lines = build.owner().output().clone();
    StepEngine::new(&restored, &mut build, ExecutionSettings::default())
        .run(entry)
        .unwrap();
    assert_eq!(lines.lines(), vec!["picked".to_string()]);
}

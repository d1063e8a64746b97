//! End-to-end editing sessions driven through JSON prototypes and configuration.
mod common;
use nodeweave::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;

const PROTOTYPES: &str = r#"[
    {
        "idName": "source",
        "displayName": "Source",
        "category": "io",
        "ports": [{"idName": "out", "direction": "output", "dataType": "number", "allowMultipleLinks": true}],
        "fields": [{"idName": "value", "dataType": "number", "default": 0}]
    },
    {
        "idName": "sum",
        "displayName": "Sum",
        "category": "math",
        "ports": [
            {"idName": "a", "direction": "input", "dataType": "number"},
            {"idName": "b", "direction": "input", "dataType": "number"},
            {"idName": "out", "direction": "output", "dataType": "number", "allowMultipleLinks": true}
        ]
    },
    {
        "idName": "router",
        "ports": [{"idName": "in", "direction": "input", "kind": "control"}]
    }
]"#;

const CONFIG: &str = r#"{
    "eventHistoryLimit": 500,
    "maxZoom": 2.0,
    "dynamicPortPrototypes": ["router"],
    "pasteOffset": [0, 0]
}"#;

fn session() -> GraphStore {
    let registry = PrototypeRegistry::from_json_str(PROTOTYPES).unwrap();
    let config = EditorConfig::from_json_str(CONFIG).unwrap();
    GraphStore::builder()
        .with_config(config)
        .with_prototypes(&registry)
        .with_id_generator(SequentialIds::new("e"))
        .build()
        .unwrap()
}

fn port_of(store: &GraphStore, node: &str, name: &str) -> String {
    common::port(store, node, name)
}

#[test]
fn test_full_editing_session() {
    let mut store = session();
    let received = Rc::new(RefCell::new(Vec::new()));
    {
        let received = Rc::clone(&received);
        store.subscribe(move |envelope| received.borrow_mut().push(envelope.event().name()));
    }

    let x = common::add(&mut store, "source", 0.0, 0.0);
    let y = common::add(&mut store, "source", 0.0, 200.0);
    let sum = common::add(&mut store, "sum", 300.0, 100.0);
    let router = common::add(&mut store, "router", 600.0, 100.0);

    let (x_out, y_out) = (port_of(&store, &x, "out"), port_of(&store, &y, "out"));
    let (sum_a, sum_b, sum_out) = (
        port_of(&store, &sum, "a"),
        port_of(&store, &sum, "b"),
        port_of(&store, &sum, "out"),
    );
    assert!(store.add_link(&x, &x_out, &sum, &sum_a).is_some());
    assert!(store.add_link(&y, &y_out, &sum, &sum_b).is_some());
    assert!(store.add_link(&y, &y_out, &sum, &sum_a).is_none(), "sum.a is taken");

    store
        .add_dynamic_port(&router, "total", "number", "Total", PortDirection::Input)
        .unwrap();
    assert!(store.add_link(&sum, &sum_out, &router, "total").is_some());

    for id in [&x, &y, &sum, &router] {
        common::render(&mut store, id);
    }

    // Rubber-band the two sources and the sum, then frame them.
    store.set_selection_area(Some(Rect::from_corners(
        Point::new(-20.0, -20.0),
        Point::new(320.0, 260.0),
    )));
    let selected = store.select_by_area();
    assert_eq!(selected, vec![x.clone(), y.clone(), sum.clone()]);
    let framed = store.focus_on(&selected).unwrap();
    assert!(framed.contains(Point::new(400.0, 250.0)));
    assert!(store.viewport().zoom <= 2.0);

    // Duplicate the selection away from the originals and save.
    let copies = store.duplicate_selection(Point::new(0.0, 600.0)).unwrap();
    assert_eq!(copies.len(), 3);
    assert_eq!(store.link_count(), 3 + 2);

    let saved = store.to_json(true).unwrap();

    // Reload into a fresh session and compare.
    let mut reloaded = session();
    let report = reloaded.load_json_str(&saved).unwrap();
    assert_eq!(report.loaded.len(), 7);
    assert!(report.skipped.is_empty());
    assert_eq!(reloaded.link_count(), store.link_count());
    assert!(reloaded.node(&router).unwrap().ports["total"].is_dynamic);
    assert_eq!(reloaded.to_json(true).unwrap(), saved);

    // Removing the sum severs all three of its links on both sides.
    store.remove_nodes([&sum]);
    assert!(store
        .nodes()
        .flat_map(|n| n.links())
        .all(|l| !l.touches(&sum)));
    assert!(store.node(&router).unwrap().ports["total"].links.is_empty());

    let received = received.borrow();
    assert_eq!(received.first(), Some(&"AddNode"));
    assert_eq!(received.last(), Some(&"RemoveNodes"));
    assert_eq!(received.len(), store.events().history().count());
}

#[test]
fn test_session_with_uuid_identifiers() {
    let registry = PrototypeRegistry::from_json_str(PROTOTYPES).unwrap();
    let mut store = GraphStore::builder().with_prototypes(&registry).build().unwrap();

    let a = common::add(&mut store, "source", 0.0, 0.0);
    let b = common::add(&mut store, "sum", 100.0, 0.0);
    let a_out = port_of(&store, &a, "out");
    let b_a = port_of(&store, &b, "a");
    let link = store.add_link(&a, &a_out, &b, &b_a).unwrap();

    for id in [&a, &b, &link.id, &a_out, &b_a] {
        assert_eq!(id.len(), 36, "{} is not a hyphenated uuid", id);
    }

    store.select_by_ids([&a, &b]);
    let payload = store.copy_selection().unwrap();
    let pasted = store.paste_selection(&payload, None);
    assert_eq!(pasted.len(), 2);
    assert!(pasted.iter().all(|id| *id != a && *id != b));
}

#[test]
fn test_field_values_follow_declared_types() {
    let mut store = session();
    let x = common::add(&mut store, "source", 0.0, 0.0);
    let field = store.node(&x).unwrap().field_by_name("value").unwrap().id.clone();

    assert_eq!(
        store.node(&x).unwrap().fields[&field].value,
        FieldValue::Number(0.0)
    );
    store.set_field_value(&x, &field, FieldValue::Number(12.0)).unwrap();
    assert!(store.set_field_value(&x, &field, "twelve".into()).is_err());

    let saved = store.to_json(false).unwrap();
    assert!(saved.contains("12.0"));
}

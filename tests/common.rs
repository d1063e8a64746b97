//! Common test utilities for building prototypes and stores.
use nodeweave::prelude::*;

/// The "format" prototype: one single-link data input, one multi-link data output
/// and a string field.
#[allow(dead_code)]
pub fn format_prototype() -> NodePrototype {
    NodePrototype::new("format")
        .with_display_name("Format")
        .with_port(PortPrototype::input("in", "any"))
        .with_port(PortPrototype::output("out", "string").multiple())
        .with_field(FieldPrototype::new("pattern", "string", "{}".into()))
}

/// A prototype with a numeric field whose execution callback doubles the field value.
#[allow(dead_code)]
pub fn double_prototype() -> NodePrototype {
    NodePrototype::new("double")
        .with_category("math")
        .with_port(PortPrototype::input("x", "number"))
        .with_port(PortPrototype::output("y", "number").multiple())
        .with_field(FieldPrototype::new("value", "number", 1.0.into()))
        .with_execute(|node| {
            let value = node
                .field_by_name("value")
                .and_then(|f| f.value.as_f64())
                .unwrap_or(0.0);
            FieldValue::Number(value * 2.0)
        })
}

/// A prototype that may grow ports at runtime.
#[allow(dead_code)]
pub fn script_prototype() -> NodePrototype {
    NodePrototype::new("script")
        .with_port(PortPrototype::input("trigger", "any").control())
        .with_field(FieldPrototype::new("source", "string", "".into()))
}

/// An emitter that may only grow dynamic outputs.
#[allow(dead_code)]
pub fn emitter_prototype() -> NodePrototype {
    NodePrototype::new("emitter").with_port(PortPrototype::output("out", "any").multiple())
}

/// A builder with every test prototype registered, deterministic `n1, n2, ...` ids and
/// dynamic ports enabled for "script" and (outputs only) "emitter".
#[allow(dead_code)]
pub fn builder() -> GraphStoreBuilder {
    let config = EditorConfig {
        dynamic_port_prototypes: vec!["script".to_string(), "emitter".to_string()],
        no_dynamic_input_prototypes: vec!["emitter".to_string()],
        ..EditorConfig::default()
    };
    GraphStore::builder()
        .with_config(config)
        .with_prototype(format_prototype())
        .with_prototype(double_prototype())
        .with_prototype(script_prototype())
        .with_prototype(emitter_prototype())
        .with_id_generator(SequentialIds::new("n"))
}

#[allow(dead_code)]
pub fn store() -> GraphStore {
    builder().build().expect("test configuration is valid")
}

/// Adds a node and returns its id.
#[allow(dead_code)]
pub fn add(store: &mut GraphStore, prototype: &str, x: f64, y: f64) -> String {
    store
        .add_node(prototype, Point::new(x, y))
        .expect("prototype is registered")
        .id
        .clone()
}

/// Instance id of the port created from the port prototype `name`.
#[allow(dead_code)]
pub fn port(store: &GraphStore, node: &str, name: &str) -> String {
    store
        .node(node)
        .and_then(|n| n.port_by_name(name))
        .map(|p| p.id.clone())
        .expect("port exists")
}

/// Links `from.out` to `to.in` on two "format" nodes.
#[allow(dead_code)]
pub fn connect(store: &mut GraphStore, from: &str, to: &str) -> Link {
    let out = port(store, from, "out");
    let input = port(store, to, "in");
    store
        .add_link(from, &out, to, &input)
        .expect("link is valid")
}

/// Reports a 100x50 rendered rectangle at the node's offset.
#[allow(dead_code)]
pub fn render(store: &mut GraphStore, node: &str) {
    let offset = store.node(node).expect("node exists").offset;
    store
        .on_node_rendered(RenderedNode {
            node_id: node.to_string(),
            rect: Rect::from_origin_size(offset, Size::new(100.0, 50.0)),
            port_offsets: Vec::new(),
        })
        .expect("node exists");
}

/// Names of every event recorded in the bus history, oldest first.
#[allow(dead_code)]
pub fn event_names(store: &GraphStore) -> Vec<&'static str> {
    store.events().history().map(|e| e.event().name()).collect()
}

/// Every link referenced by any port of any node.
#[allow(dead_code)]
pub fn port_links(store: &GraphStore) -> Vec<Link> {
    store
        .nodes()
        .flat_map(|n| n.ports.values())
        .flat_map(|p| p.links.iter().cloned())
        .collect()
}

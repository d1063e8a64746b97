//! Tests for copy, cut, paste and duplicate, including the async clipboard paths.
mod common;
use ahash::AHashSet;
use common::{add, connect, event_names, port_links};
use nodeweave::codec::{self, NodeDocument, PortDocument};
use nodeweave::prelude::*;
use tokio_test::block_on;

/// `a -> b -> c`, with `a` and `b` selected and `c` left out.
fn linked_pair_with_bystander() -> (GraphStore, String, String, String) {
    let mut store = common::store();
    let a = add(&mut store, "format", 100.0, 100.0);
    let b = add(&mut store, "format", 300.0, 150.0);
    let c = add(&mut store, "format", 500.0, 150.0);
    connect(&mut store, &a, &b);
    connect(&mut store, &b, &c);
    store.select_by_ids([&a, &b]);
    (store, a, b, c)
}

/// Every link of the listed nodes has both endpoints among them and on the named ports.
fn assert_link_consistent(store: &GraphStore, ids: &[String]) {
    let set: AHashSet<&String> = ids.iter().collect();
    for id in ids {
        let node = store.node(id).unwrap();
        for link in node.links() {
            assert!(set.contains(&link.from) && set.contains(&link.to));
            let from = &store.node(&link.from).unwrap().ports[&link.from_port];
            let to = &store.node(&link.to).unwrap().ports[&link.to_port];
            assert!(from.links.contains(link) && to.links.contains(link));
            assert_eq!(store.link(&link.id), Some(link));
        }
    }
}

/// The port entry created from the port prototype `name`, with its id.
fn port_entry<'a>(doc: &'a mut NodeDocument, name: &str) -> (String, &'a mut PortDocument) {
    doc.ports
        .iter_mut()
        .find(|(_, p)| p.id_name == name)
        .map(|(id, p)| (id.clone(), p))
        .unwrap()
}

/// Every cached link is held by both endpoint ports, and every port link is cached.
fn assert_graph_consistent(store: &GraphStore) {
    for link in store.links() {
        let from = &store.node(&link.from).unwrap().ports[&link.from_port];
        let to = &store.node(&link.to).unwrap().ports[&link.to_port];
        assert!(from.links.contains(link), "{} missing on its output", link.id);
        assert!(to.links.contains(link), "{} missing on its input", link.id);
    }
    for link in port_links(store) {
        assert_eq!(store.link(&link.id), Some(&link));
    }
}

#[test]
fn test_copy_drops_links_leaving_the_selection() {
    let (store, a, b, c) = linked_pair_with_bystander();
    let payload = store.copy_selection().unwrap();
    let docs = codec::parse_document(&payload).unwrap();

    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, a);
    assert_eq!(docs[1].id, b);

    let links: Vec<_> = docs.iter().flat_map(|d| d.links()).collect();
    assert_eq!(links.len(), 2, "the a -> b link appears once per endpoint");
    assert!(links.iter().all(|l| l.from == a && l.to == b));
    assert!(docs.iter().all(|d| d.id != c && d.links().all(|l| !l.touches(&c))));
    assert!(docs.iter().all(|d| !d.state.is_selected));
}

#[test]
fn test_copy_offsets_are_relative_to_group() {
    let (store, ..) = linked_pair_with_bystander();
    let (docs, origin) = store.copy_nodes(store.selected_ids()).unwrap();
    assert_eq!(origin, Point::new(100.0, 100.0));
    assert_eq!(docs[0].offset, Point::ZERO);
    assert_eq!(docs[1].offset, Point::new(200.0, 50.0));
}

#[test]
fn test_copy_uses_rendered_bounds() {
    let (mut store, a, b, _) = linked_pair_with_bystander();
    store
        .on_node_rendered(RenderedNode {
            node_id: a.clone(),
            rect: Rect::from_corners(Point::new(90.0, 80.0), Point::new(190.0, 130.0)),
            port_offsets: Vec::new(),
        })
        .unwrap();
    common::render(&mut store, &b);

    let (docs, origin) = store.copy_nodes([&a, &b]).unwrap();
    assert_eq!(origin, Point::new(90.0, 80.0));
    assert_eq!(docs[0].offset, Point::new(10.0, 20.0));
}

#[test]
fn test_paste_twice_yields_disjoint_subgraphs() {
    let (mut store, a, b, c) = linked_pair_with_bystander();
    let payload = store.copy_selection().unwrap();

    let first = store.paste_selection(&payload, Some(Point::new(1000.0, 1000.0)));
    let second = store.paste_selection(&payload, Some(Point::new(2000.0, 1000.0)));

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    let originals = [a.clone(), b.clone(), c.clone()];
    let all: AHashSet<&String> = originals.iter().chain(&first).chain(&second).collect();
    assert_eq!(all.len(), 7, "identifiers never overlap");

    assert_link_consistent(&store, &first);
    assert_link_consistent(&store, &second);
    assert_eq!(store.link_count(), 4);

    // Port and field identifiers are fresh too.
    let old_ports: AHashSet<&String> = store.node(&a).unwrap().ports.keys().collect();
    let new_node = store.node(&first[0]).unwrap();
    assert!(new_node.ports.keys().all(|p| !old_ports.contains(p)));
    assert!(new_node
        .fields
        .keys()
        .all(|f| !store.node(&a).unwrap().fields.contains_key(f)));

    assert_eq!(new_node.offset, Point::new(1000.0, 1000.0));
    assert_eq!(
        store.node(&second[1]).unwrap().offset,
        Point::new(2200.0, 1050.0)
    );
    assert_eq!(store.selected_ids(), second);
}

#[test]
fn test_paste_preserves_structure() {
    let (mut store, a, ..) = linked_pair_with_bystander();
    let field = store.node(&a).unwrap().field_by_name("pattern").unwrap().id.clone();
    store.set_field_value(&a, &field, "custom".into()).unwrap();
    let payload = store.copy_selection().unwrap();

    let pasted = store.paste_selection(&payload, Some(Point::ZERO));
    let copy = store.node(&pasted[0]).unwrap();
    let original = store.node(&a).unwrap();
    assert_eq!(copy.prototype_name(), original.prototype_name());
    assert_eq!(
        copy.field_by_name("pattern").unwrap().value,
        FieldValue::from("custom")
    );
    assert_eq!(copy.ports.len(), original.ports.len());
    assert_eq!(copy.links().count(), 1);
}

#[test]
fn test_paste_defaults_to_viewport_centre() {
    let (mut store, ..) = linked_pair_with_bystander();
    let payload = store.copy_selection().unwrap();
    let pasted = store.paste_selection(&payload, None);
    assert_eq!(
        store.node(&pasted[0]).unwrap().offset,
        Point::new(660.0, 380.0)
    );
}

#[test]
fn test_paste_emits_events() {
    let (mut store, ..) = linked_pair_with_bystander();
    let payload = store.copy_selection().unwrap();
    let before = store.events().history().count();
    store.paste_selection(&payload, Some(Point::ZERO));
    assert_eq!(
        event_names(&store)[before..],
        ["AddNode", "AddNode", "AddLink", "Selection"]
    );
}

#[test]
fn test_malformed_payload_is_a_noop() {
    let (mut store, ..) = linked_pair_with_bystander();
    let nodes = store.node_count();
    let links = port_links(&store);
    let events = store.events().history().count();

    assert!(store.paste_selection("definitely not json", None).is_empty());
    assert!(store.paste_selection("{\"id\": 1}", None).is_empty());

    assert_eq!(store.node_count(), nodes);
    assert_eq!(port_links(&store), links);
    assert_eq!(store.events().history().count(), events);
}

#[test]
fn test_unknown_prototype_aborts_whole_paste() {
    let (mut store, ..) = linked_pair_with_bystander();
    let payload = store.copy_selection().unwrap();
    let mut docs = codec::parse_document(&payload).unwrap();
    docs[1].id_name = "fromTheFuture".to_string();
    let tampered = codec::write_document(&docs, false).unwrap();

    assert!(store.paste_selection(&tampered, None).is_empty());
    assert_eq!(store.node_count(), 3);
}

#[test]
fn test_paste_drops_link_listed_on_one_endpoint() {
    let (mut store, ..) = linked_pair_with_bystander();
    let mut docs = codec::parse_document(&store.copy_selection().unwrap()).unwrap();
    port_entry(&mut docs[1], "in").1.links.clear();
    let payload = codec::write_document(&docs, false).unwrap();
    let before = store.events().history().count();

    let pasted = store.paste_selection(&payload, Some(Point::ZERO));
    assert_eq!(pasted.len(), 2);
    assert!(pasted
        .iter()
        .all(|id| store.node(id).unwrap().links().next().is_none()));
    assert_eq!(store.link_count(), 2, "only the original links remain");
    assert_graph_consistent(&store);
    assert!(!event_names(&store)[before..].contains(&"AddLink"));
}

#[test]
fn test_paste_drops_reversed_and_over_capacity_links() {
    let mut store = common::store();
    let a = add(&mut store, "format", 0.0, 0.0);
    let b = add(&mut store, "format", 200.0, 0.0);
    let c = add(&mut store, "format", 0.0, 200.0);
    connect(&mut store, &a, &b);
    let (mut docs, _) = store.copy_nodes([&a, &b, &c]).unwrap();

    // A second link into the single-link `b.in`, listed on both of its endpoints.
    let (b_in, _) = port_entry(&mut docs[1], "in");
    let (c_out, _) = port_entry(&mut docs[2], "out");
    let extra = Link {
        id: "extra".to_string(),
        from: c.clone(),
        from_port: c_out.clone(),
        to: b.clone(),
        to_port: b_in.clone(),
    };
    port_entry(&mut docs[1], "in").1.links.push(extra.clone());
    port_entry(&mut docs[2], "out").1.links.push(extra);

    // A link running from an input to an output, also listed on both endpoints.
    let (c_in, _) = port_entry(&mut docs[2], "in");
    let (a_out, _) = port_entry(&mut docs[0], "out");
    let reversed = Link {
        id: "reversed".to_string(),
        from: c.clone(),
        from_port: c_in,
        to: a.clone(),
        to_port: a_out,
    };
    port_entry(&mut docs[2], "in").1.links.push(reversed.clone());
    port_entry(&mut docs[0], "out").1.links.push(reversed);

    let payload = codec::write_document(&docs, false).unwrap();
    let pasted = store.paste_selection(&payload, Some(Point::ZERO));
    assert_eq!(pasted.len(), 3);

    let b_copy = store.node(&pasted[1]).unwrap();
    assert_eq!(b_copy.port_by_name("in").unwrap().links.len(), 1);
    assert_eq!(b_copy.port_by_name("in").unwrap().links[0].from, pasted[0]);
    let c_copy = store.node(&pasted[2]).unwrap();
    assert!(c_copy.links().next().is_none());
    assert_eq!(store.link_count(), 2);
    assert_graph_consistent(&store);
}

#[test]
fn test_duplicate_node_ids_abort_paste() {
    let (mut store, a, ..) = linked_pair_with_bystander();
    let (docs, _) = store.copy_nodes([&a]).unwrap();
    let twice = vec![docs[0].clone(), docs[0].clone()];
    let payload = codec::write_document(&twice, false).unwrap();
    let events = store.events().history().count();

    assert!(store.paste_selection(&payload, None).is_empty());
    assert_eq!(store.node_count(), 3);
    assert_eq!(store.events().history().count(), events);
}

#[test]
fn test_copy_after_move_without_render() {
    let mut store = common::store();
    let a = add(&mut store, "format", 100.0, 100.0);
    store
        .on_node_rendered(RenderedNode {
            node_id: a.clone(),
            rect: Rect::from_corners(Point::new(90.0, 80.0), Point::new(190.0, 130.0)),
            port_offsets: Vec::new(),
        })
        .unwrap();
    store.set_node_offset(&a, Point::new(200.0, 200.0)).unwrap();

    let (docs, origin) = store.copy_nodes([&a]).unwrap();
    assert_eq!(origin, Point::new(190.0, 180.0));
    assert_eq!(docs[0].offset, Point::new(10.0, 20.0));

    let pasted = store.paste_selection(
        &codec::write_document(&docs, false).unwrap(),
        Some(Point::new(1000.0, 0.0)),
    );
    assert_eq!(
        store.node(&pasted[0]).unwrap().offset,
        Point::new(1010.0, 20.0)
    );
}

#[test]
fn test_paste_remaps_dynamic_ports() {
    let mut store = common::store();
    let s = add(&mut store, "script", 0.0, 0.0);
    let f = add(&mut store, "format", 200.0, 0.0);
    store
        .add_dynamic_port(&s, "result", "string", "Result", PortDirection::Output)
        .unwrap();
    let f_in = common::port(&store, &f, "in");
    store.add_link(&s, "result", &f, &f_in).unwrap();
    store.select_by_ids([&s, &f]);

    let payload = store.copy_selection().unwrap();
    let pasted = store.paste_selection(&payload, None);
    let copy = store.node(&pasted[0]).unwrap();

    let dynamic: Vec<_> = copy.ports.values().filter(|p| p.is_dynamic).collect();
    assert_eq!(dynamic.len(), 1);
    assert_ne!(dynamic[0].id, "result");
    assert_eq!(dynamic[0].prototype.id_name, "result");
    assert_eq!(dynamic[0].links.len(), 1);
    assert_eq!(dynamic[0].links[0].from_port, dynamic[0].id);
    assert_link_consistent(&store, &pasted);
}

#[test]
fn test_cut_selection() {
    let (mut store, a, b, c) = linked_pair_with_bystander();
    let payload = store.cut_selection().unwrap();

    assert!(!store.contains_node(&a) && !store.contains_node(&b));
    assert!(store.contains_node(&c));
    assert!(port_links(&store).is_empty());
    assert!(store.selection().is_empty());

    let pasted = store.paste_selection(&payload, None);
    assert_eq!(pasted.len(), 2);
    assert_link_consistent(&store, &pasted);
}

#[test]
fn test_duplicate_selection() {
    let (mut store, a, b, _) = linked_pair_with_bystander();
    let copies = store.duplicate_selection(Point::new(30.0, 30.0)).unwrap();

    assert_eq!(copies.len(), 2);
    assert_eq!(
        store.node(&copies[0]).unwrap().offset,
        Point::new(130.0, 130.0)
    );
    assert_eq!(
        store.node(&copies[1]).unwrap().offset,
        Point::new(330.0, 180.0)
    );
    assert_eq!(store.selected_ids(), copies);
    assert!(!store.node(&a).unwrap().state.is_selected);
    assert!(!copies.contains(&b));
    assert_link_consistent(&store, &copies);

    store.clear_selection();
    assert!(store.duplicate_selection(Point::ZERO).unwrap().is_empty());
}

#[test]
fn test_async_copy_and_paste() {
    let (mut store, ..) = linked_pair_with_bystander();
    let mut clipboard = MemoryClipboard::new();

    let copied = block_on(store.copy_to(&mut clipboard)).unwrap();
    assert_eq!(copied, 2);
    assert!(clipboard.contents().is_some());

    let pasted = block_on(store.paste_from(&mut clipboard, Some(Point::ZERO))).unwrap();
    assert_eq!(pasted.len(), 2);
    assert_eq!(store.node_count(), 5);
}

#[test]
fn test_async_cut_keeps_nodes_when_clipboard_fails() {
    let (mut store, a, b, _) = linked_pair_with_bystander();
    let mut clipboard = MemoryClipboard::unavailable();

    let err = block_on(store.cut_to(&mut clipboard)).unwrap_err();
    assert!(matches!(err, ClipboardError::Unavailable(_)));
    assert!(store.contains_node(&a) && store.contains_node(&b));
    assert_eq!(store.link_count(), 2);
    assert_eq!(store.selected_ids(), vec![a, b]);
}

#[test]
fn test_async_cut_and_paste_round_trip() {
    let (mut store, a, b, _) = linked_pair_with_bystander();
    let mut clipboard = MemoryClipboard::new();

    let removed = block_on(store.cut_to(&mut clipboard)).unwrap();
    assert_eq!(removed, vec![a, b]);
    assert_eq!(store.node_count(), 1);

    let pasted = block_on(store.paste_from(&mut clipboard, None)).unwrap();
    assert_eq!(pasted.len(), 2);
    assert_eq!(store.node_count(), 3);
}

#[test]
fn test_async_paste_from_empty_clipboard() {
    let mut store = common::store();
    let mut clipboard = MemoryClipboard::new();
    assert!(matches!(
        block_on(store.paste_from(&mut clipboard, None)),
        Err(ClipboardError::Empty)
    ));

    clipboard.set_contents("garbage");
    assert_eq!(block_on(store.paste_from(&mut clipboard, None)), Ok(Vec::new()));
}

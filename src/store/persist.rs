use super::{GraphStore, generate_id};
use crate::codec::{self, NodeDocument};
use crate::error::CodecError;
use crate::events::GraphEvent;
use crate::model::{Link, NodeInstance};
use itertools::Itertools;
use tracing::{info, warn};

/// Outcome of loading a persisted document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct LoadReport {
    /// Ids of nodes now in the graph.
    pub loaded: Vec<String>,
    /// Ids of document nodes that could not be rebuilt, with the reason.
    pub skipped: Vec<(String, CodecError)>,
    /// Link ids dropped because an endpoint did not survive the load.
    pub pruned_links: Vec<String>,
}

impl GraphStore {
    /// Persisted form of the whole graph, in node insertion order.
    pub fn to_document(&self) -> Result<Vec<NodeDocument>, CodecError> {
        self.nodes
            .values()
            .map(|node| codec::encode_node(node, &self.marshalers))
            .collect()
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, CodecError> {
        codec::write_document(&self.to_document()?, pretty)
    }

    /// Rebuilds a single node from its document against this store's registry.
    pub fn decode_node(&mut self, doc: &NodeDocument) -> Result<NodeInstance, CodecError> {
        let ids = &mut *self.ids;
        let (nodes, links) = (&self.nodes, &self.links);
        codec::decode_node(
            doc,
            &self.registry,
            &self.dynamic_ports,
            &self.marshalers,
            || generate_id(&mut *ids, nodes, links),
        )
    }

    /// Replaces the current graph with the document's nodes.
    ///
    /// Nodes whose prototypes (or port/field prototypes) are not registered are logged and
    /// skipped. Links that lose an endpoint in the process are removed from the surviving
    /// side, so every remaining link is present on both of its ports.
    pub fn load_document(&mut self, docs: Vec<NodeDocument>) -> LoadReport {
        self.clear();

        let mut report = LoadReport::default();
        for doc in &docs {
            match self.decode_node(doc) {
                Ok(node) => {
                    report.loaded.push(node.id.clone());
                    self.nodes.insert(node.id.clone(), node);
                }
                Err(e) => {
                    warn!(node = %doc.id, prototype = %doc.id_name, error = %e, "skipping node");
                    report.skipped.push((doc.id.clone(), e));
                }
            }
        }

        report.pruned_links = self.rebuild_link_cache();
        for id in &report.loaded {
            self.events.emit(GraphEvent::AddNode {
                node_id: id.clone(),
            });
        }
        info!(
            loaded = report.loaded.len(),
            skipped = report.skipped.len(),
            pruned_links = report.pruned_links.len(),
            "loaded graph document"
        );
        report
    }

    pub fn load_json_str(&mut self, json: &str) -> Result<LoadReport, CodecError> {
        let docs = codec::parse_document(json)?;
        Ok(self.load_document(docs))
    }

    /// Removes every node and link. Prototypes, configuration and viewport are kept.
    pub fn clear(&mut self) {
        let ids: Vec<String> = self.nodes.keys().cloned().collect();
        self.nodes.clear();
        self.links.clear();
        self.spatial.clear();
        self.selection = Default::default();
        if !ids.is_empty() {
            self.events.emit(GraphEvent::RemoveNodes { node_ids: ids });
        }
    }

    /// Rebuilds the link cache from the ports, dropping any link not present on both of its
    /// endpoints. Returns the ids of dropped links.
    pub(crate) fn rebuild_link_cache(&mut self) -> Vec<String> {
        let (valid, pruned): (Vec<Link>, Vec<Link>) = self
            .nodes
            .values()
            .flat_map(|n| n.links())
            .cloned()
            .partition(|link| {
                [(&link.from, &link.from_port), (&link.to, &link.to_port)]
                    .into_iter()
                    .all(|(n, p)| {
                        self.nodes
                            .get(n)
                            .and_then(|n| n.ports.get(p))
                            .is_some_and(|p| p.links.iter().any(|l| l.id == link.id))
                    })
            });
        let pruned: Vec<String> = pruned.into_iter().map(|l| l.id).unique().collect();

        for node in self.nodes.values_mut() {
            for port in node.ports.values_mut() {
                port.links.retain(|l| !pruned.contains(&l.id));
            }
        }
        self.links.clear();
        for link in valid {
            self.links.entry(link.id.clone()).or_insert(link);
        }
        if !pruned.is_empty() {
            warn!(count = pruned.len(), "pruned links with a missing endpoint");
        }
        pruned
    }
}

//! Copy, cut, paste and duplicate for node subsets.
//!
//! A payload is a JSON array of node documents whose offsets are relative to the
//! group's top-left corner and whose links never leave the copied set. Pasting
//! assigns every node, port, field and link a fresh identifier in a single pass
//! before anything is rebuilt, so references inside one payload stay consistent.

use crate::codec::{self, NodeDocument};
use crate::error::{ClipboardError, CodecError};
use crate::events::GraphEvent;
use crate::geometry::{Point, Rect};
use crate::model::{Link, NodeInstance, PortDirection, PortInstance};
use crate::store::GraphStore;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;
use std::future::Future;
use tracing::{debug, warn};

/// Host clipboard access. Reads and writes may suspend.
pub trait ClipboardProvider {
    fn write_text(&mut self, text: String) -> impl Future<Output = Result<(), ClipboardError>>;
    fn read_text(&mut self) -> impl Future<Output = Result<String, ClipboardError>>;
}

/// Process-local clipboard, also usable to simulate an unavailable host clipboard.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Option<String>,
    unavailable: bool,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard whose every access fails with `ClipboardError::Unavailable`.
    pub fn unavailable() -> Self {
        Self {
            contents: None,
            unavailable: true,
        }
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    pub fn set_contents(&mut self, text: impl Into<String>) {
        self.contents = Some(text.into());
    }
}

impl ClipboardProvider for MemoryClipboard {
    async fn write_text(&mut self, text: String) -> Result<(), ClipboardError> {
        if self.unavailable {
            return Err(ClipboardError::Unavailable("clipboard disabled".to_string()));
        }
        self.contents = Some(text);
        Ok(())
    }

    async fn read_text(&mut self) -> Result<String, ClipboardError> {
        if self.unavailable {
            return Err(ClipboardError::Unavailable("clipboard disabled".to_string()));
        }
        self.contents.clone().ok_or(ClipboardError::Empty)
    }
}

/// Old identifier to new identifier, built completely before any document is rewritten.
///
/// Port and field ids are only unique within their node, so they are keyed by
/// `(node, id)`. Node and link ids are global.
#[derive(Debug, Default)]
struct IdRemap {
    nodes: AHashMap<String, String>,
    ports: AHashMap<(String, String), String>,
    fields: AHashMap<(String, String), String>,
    links: AHashMap<String, String>,
}

impl IdRemap {
    fn build(docs: &[NodeDocument], mut fresh: impl FnMut() -> String) -> Self {
        let mut remap = IdRemap::default();
        for doc in docs {
            remap.nodes.insert(doc.id.clone(), fresh());
            for (port_id, port) in &doc.ports {
                remap
                    .ports
                    .insert((doc.id.clone(), port_id.clone()), fresh());
                for link in &port.links {
                    if !remap.links.contains_key(&link.id) {
                        remap.links.insert(link.id.clone(), fresh());
                    }
                }
            }
            for field_id in doc.fields.keys() {
                remap
                    .fields
                    .insert((doc.id.clone(), field_id.clone()), fresh());
            }
        }
        remap
    }

    /// `None` when an endpoint is outside the payload.
    fn link(&self, link: &Link) -> Option<Link> {
        Some(Link {
            id: self.links.get(&link.id)?.clone(),
            from: self.nodes.get(&link.from)?.clone(),
            from_port: self
                .ports
                .get(&(link.from.clone(), link.from_port.clone()))?
                .clone(),
            to: self.nodes.get(&link.to)?.clone(),
            to_port: self
                .ports
                .get(&(link.to.clone(), link.to_port.clone()))?
                .clone(),
        })
    }

    fn rewrite(&self, doc: &NodeDocument, translate: Point) -> NodeDocument {
        let mut out = doc.clone();
        out.id = self.nodes[&doc.id].clone();
        out.offset = doc.offset + translate;
        out.state.is_selected = false;
        out.ports = doc
            .ports
            .iter()
            .map(|(port_id, port)| {
                let mut port = port.clone();
                port.links = port.links.iter().filter_map(|l| self.link(l)).collect();
                (self.ports[&(doc.id.clone(), port_id.clone())].clone(), port)
            })
            .collect();
        out.fields = doc
            .fields
            .iter()
            .map(|(field_id, field)| {
                (
                    self.fields[&(doc.id.clone(), field_id.clone())].clone(),
                    field.clone(),
                )
            })
            .collect();
        out
    }
}

/// Keeps the links of rebuilt payload nodes that are listed on both endpoints, run from an
/// output port to an input port and fit each port's cardinality. Every other link is
/// removed from every port. Returns the kept links and the ids of the dropped ones.
fn reconcile_links(nodes: &mut [NodeInstance]) -> (Vec<Link>, Vec<String>) {
    let candidates: Vec<Link> = nodes
        .iter()
        .flat_map(|n| n.links())
        .unique_by(|l| l.id.clone())
        .cloned()
        .collect();

    let mut kept: Vec<Link> = Vec::new();
    let mut dropped = Vec::new();
    {
        fn port_of<'a>(
            nodes: &'a [NodeInstance],
            position: &AHashMap<&str, usize>,
            node: &str,
            port: &str,
        ) -> Option<&'a PortInstance> {
            position.get(node).and_then(|&i| nodes[i].ports.get(port))
        }

        let view: &[NodeInstance] = nodes;
        let position: AHashMap<&str, usize> = view
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect();
        let mut occupied: AHashSet<(String, String)> = AHashSet::new();

        for link in candidates {
            let (Some(from), Some(to)) = (
                port_of(view, &position, &link.from, &link.from_port),
                port_of(view, &position, &link.to, &link.to_port),
            ) else {
                dropped.push(link.id);
                continue;
            };
            let from_key = (link.from.clone(), link.from_port.clone());
            let to_key = (link.to.clone(), link.to_port.clone());

            let listed = from.links.contains(&link) && to.links.contains(&link);
            let directed = from.direction() == PortDirection::Output
                && to.direction() == PortDirection::Input;
            let duplicate = kept
                .iter()
                .any(|k| k.connects(&link.from, &link.from_port, &link.to, &link.to_port));
            let fits = (from.prototype.allow_multiple_links || !occupied.contains(&from_key))
                && (to.prototype.allow_multiple_links || !occupied.contains(&to_key));

            if listed && directed && !duplicate && fits {
                occupied.insert(from_key);
                occupied.insert(to_key);
                kept.push(link);
            } else {
                dropped.push(link.id);
            }
        }
    }

    let keep: AHashSet<Link> = kept.iter().cloned().collect();
    for node in nodes.iter_mut() {
        for port in node.ports.values_mut() {
            let mut seen = AHashSet::new();
            port.links
                .retain(|l| keep.contains(l) && seen.insert(l.id.clone()));
        }
    }
    (kept, dropped)
}

impl GraphStore {
    /// Documents for `ids` with offsets relative to the group's top-left corner, transient
    /// state reset and links leaving the group dropped. Also returns that corner.
    pub fn copy_nodes<I, S>(&self, ids: I) -> Result<(Vec<NodeDocument>, Point), CodecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let wanted: AHashSet<String> = ids.into_iter().map(|s| s.as_ref().to_string()).collect();
        let nodes: Vec<_> = self
            .nodes
            .values()
            .filter(|n| wanted.contains(&n.id))
            .collect();

        let group = Rect::bounding(nodes.iter().map(|n| {
            self.spatial
                .rect_of(&n.id)
                .unwrap_or_else(|| Rect::from_corners(n.offset, n.offset))
        }));
        let origin = group.map(|r| r.min).unwrap_or(Point::ZERO);

        let mut docs = Vec::with_capacity(nodes.len());
        for node in nodes {
            let mut doc = codec::encode_node(node, &self.marshalers)?;
            doc.offset = doc.offset - origin;
            doc.state.is_selected = false;
            for port in doc.ports.values_mut() {
                port.links
                    .retain(|l| wanted.contains(&l.from) && wanted.contains(&l.to));
            }
            docs.push(doc);
        }
        Ok((docs, origin))
    }

    /// Serialized payload for the current selection.
    pub fn copy_selection(&self) -> Result<String, CodecError> {
        let (docs, _) = self.copy_nodes(self.selection.ids())?;
        codec::write_document(&docs, false)
    }

    /// Copies the selection and removes it. Nothing is removed if the copy fails.
    pub fn cut_selection(&mut self) -> Result<String, CodecError> {
        let payload = self.copy_selection()?;
        let ids = self.selected_ids();
        self.remove_nodes(&ids);
        self.clear_selection();
        Ok(payload)
    }

    /// Inserts a payload with fresh identifiers, its top-left corner at `target` (or the
    /// viewport centre shifted by the configured paste offset). The pasted nodes become
    /// the selection. Returns their ids.
    ///
    /// A malformed payload, or one naming an unregistered prototype, pastes nothing.
    pub fn paste_selection(&mut self, payload: &str, target: Option<Point>) -> Vec<String> {
        let base = target.unwrap_or_else(|| self.viewport.center() + self.config.paste_offset);
        self.paste_at(payload, base)
    }

    /// Copies the selection and pastes it `offset` away from the original group.
    pub fn duplicate_selection(&mut self, offset: Point) -> Result<Vec<String>, CodecError> {
        let (docs, origin) = self.copy_nodes(self.selection.ids())?;
        if docs.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.insert_payload(docs, origin + offset))
    }

    fn paste_at(&mut self, payload: &str, base: Point) -> Vec<String> {
        match codec::parse_document(payload) {
            Ok(docs) => self.insert_payload(docs, base),
            Err(e) => {
                warn!(error = %e, "ignoring malformed clipboard payload");
                Vec::new()
            }
        }
    }

    fn insert_payload(&mut self, docs: Vec<NodeDocument>, base: Point) -> Vec<String> {
        if let Some(missing) = docs.iter().find(|d| !self.registry.contains(&d.id_name)) {
            warn!(prototype = %missing.id_name, "paste aborted: unknown node prototype");
            return Vec::new();
        }
        if !docs.iter().map(|d| &d.id).all_unique() {
            warn!("paste aborted: payload lists the same node id more than once");
            return Vec::new();
        }

        let remap = IdRemap::build(&docs, || self.fresh_id());
        let rewritten: Vec<NodeDocument> = docs.iter().map(|d| remap.rewrite(d, base)).collect();

        // Rebuild everything before touching the graph so a failure leaves it unchanged.
        let mut nodes = Vec::with_capacity(rewritten.len());
        for doc in &rewritten {
            match self.decode_node(doc) {
                Ok(node) => nodes.push(node),
                Err(e) => {
                    warn!(node = %doc.id, error = %e, "paste aborted: node could not be rebuilt");
                    return Vec::new();
                }
            }
        }

        let (links, dropped) = reconcile_links(&mut nodes);
        if !dropped.is_empty() {
            warn!(count = dropped.len(), "dropped inconsistent links from pasted payload");
        }

        let ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
        for node in nodes {
            self.nodes.insert(node.id.clone(), node);
        }
        for link in &links {
            self.links.insert(link.id.clone(), link.clone());
        }

        for id in &ids {
            self.events.emit(GraphEvent::AddNode {
                node_id: id.clone(),
            });
        }
        for link in &links {
            self.events.emit(GraphEvent::AddLink {
                link_id: link.id.clone(),
                from: link.from.clone(),
                from_port: link.from_port.clone(),
                to: link.to.clone(),
                to_port: link.to_port.clone(),
            });
        }
        debug!(nodes = ids.len(), links = links.len(), "pasted nodes");
        self.select_by_ids(&ids);
        ids
    }

    /// Writes the selection to `clipboard`. Returns the number of nodes copied.
    pub async fn copy_to<C: ClipboardProvider>(
        &self,
        clipboard: &mut C,
    ) -> Result<usize, ClipboardError> {
        let payload = self.copy_selection()?;
        clipboard.write_text(payload).await?;
        Ok(self.selection.len())
    }

    /// Copies the selection to `clipboard`, then removes it. If the clipboard write fails the
    /// graph is left untouched. Returns the removed ids.
    pub async fn cut_to<C: ClipboardProvider>(
        &mut self,
        clipboard: &mut C,
    ) -> Result<Vec<String>, ClipboardError> {
        let payload = self.copy_selection()?;
        clipboard.write_text(payload).await?;
        let ids = self.selected_ids();
        self.remove_nodes(&ids);
        self.clear_selection();
        Ok(ids)
    }

    /// Reads a payload from `clipboard` and pastes it. The paste position is fixed before
    /// the read; the exclusive borrow keeps the graph from changing while it is pending.
    pub async fn paste_from<C: ClipboardProvider>(
        &mut self,
        clipboard: &mut C,
        target: Option<Point>,
    ) -> Result<Vec<String>, ClipboardError> {
        let base = target.unwrap_or_else(|| self.viewport.center() + self.config.paste_offset);
        let payload = clipboard.read_text().await?;
        Ok(self.paste_at(&payload, base))
    }
}

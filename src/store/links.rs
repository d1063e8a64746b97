use super::GraphStore;
use crate::error::{EntityKind, GraphError};
use crate::events::GraphEvent;
use crate::model::{Link, PortDirection};
use tracing::debug;

impl GraphStore {
    /// Connects two ports, returning `None` when the link would be invalid.
    ///
    /// `None` covers a missing node or port, two ports with the same direction, a
    /// single-link port that is already connected, and a duplicate of an existing link.
    /// The endpoints may be given in either order; the stored link always runs from the
    /// output port to the input port.
    pub fn add_link(
        &mut self,
        from: &str,
        from_port: &str,
        to: &str,
        to_port: &str,
    ) -> Option<Link> {
        let a = self.nodes.get(from)?.ports.get(from_port)?;
        let b = self.nodes.get(to)?.ports.get(to_port)?;
        if a.direction() == b.direction() {
            return None;
        }

        let (out_node, out_port, in_node, in_port) = if a.direction() == PortDirection::Output {
            (from, from_port, to, to_port)
        } else {
            (to, to_port, from, from_port)
        };
        let (out, inp) = if a.direction() == PortDirection::Output {
            (a, b)
        } else {
            (b, a)
        };

        if out
            .links
            .iter()
            .any(|l| l.connects(out_node, out_port, in_node, in_port))
        {
            return None;
        }
        if !out.accepts_link() || !inp.accepts_link() {
            return None;
        }

        let link = Link {
            id: self.fresh_id(),
            from: out_node.to_string(),
            from_port: out_port.to_string(),
            to: in_node.to_string(),
            to_port: in_port.to_string(),
        };
        self.attach(&link);

        debug!(link = %link.id, from = out_node, to = in_node, "added link");
        self.events.emit(GraphEvent::AddLink {
            link_id: link.id.clone(),
            from: link.from.clone(),
            from_port: link.from_port.clone(),
            to: link.to.clone(),
            to_port: link.to_port.clone(),
        });
        Some(link)
    }

    /// Removes every link on one port, from both endpoints and the link cache.
    pub fn remove_links(&mut self, node_id: &str, port_id: &str) -> Result<Vec<Link>, GraphError> {
        let node = self.try_node(node_id)?;
        if !node.ports.contains_key(port_id) {
            return Err(GraphError::not_found(EntityKind::Port, port_id));
        }
        Ok(self.sever_port(node_id, port_id, true))
    }

    /// Removes a single link by id from both endpoints. `None` if no such link exists.
    pub fn remove_link(&mut self, link_id: &str) -> Option<Link> {
        let link = self.links.get(link_id)?.clone();
        self.detach(&link);
        debug!(link = link_id, "removed link");
        self.events.emit(GraphEvent::RemoveLinks {
            key: link_id.to_string(),
            link_ids: vec![link_id.to_string()],
        });
        Some(link)
    }

    /// Detaches every link on a port. With `always_emit` unset, an already empty port emits
    /// nothing, which keeps node removal from flooding the bus.
    pub(crate) fn sever_port(&mut self, node_id: &str, port_id: &str, always_emit: bool) -> Vec<Link> {
        let links = self
            .nodes
            .get(node_id)
            .and_then(|n| n.ports.get(port_id))
            .map(|p| p.links.clone())
            .unwrap_or_default();

        for link in &links {
            self.detach(link);
        }

        if always_emit || !links.is_empty() {
            debug!(node = node_id, port = port_id, count = links.len(), "removed port links");
            self.events.emit(GraphEvent::RemoveLinks {
                key: format!("{}-{}", node_id, port_id),
                link_ids: links.iter().map(|l| l.id.clone()).collect(),
            });
        }
        links
    }

    /// Adds `link` to both endpoint ports and the cache. Both ports must exist.
    pub(crate) fn attach(&mut self, link: &Link) {
        for (node_id, port_id) in [(&link.from, &link.from_port), (&link.to, &link.to_port)] {
            if let Some(port) = self
                .nodes
                .get_mut(node_id)
                .and_then(|n| n.ports.get_mut(port_id))
            {
                port.links.push(link.clone());
            }
        }
        self.links.insert(link.id.clone(), link.clone());
    }

    /// Removes `link` from both endpoint ports and the cache.
    pub(crate) fn detach(&mut self, link: &Link) {
        for (node_id, port_id) in [(&link.from, &link.from_port), (&link.to, &link.to_port)] {
            if let Some(port) = self
                .nodes
                .get_mut(node_id)
                .and_then(|n| n.ports.get_mut(port_id))
            {
                port.links.retain(|l| l.id != link.id);
            }
        }
        self.links.shift_remove(&link.id);
    }
}

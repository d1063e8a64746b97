use super::prototype::{FieldPrototype, NodePrototype, PortDirection, PortPrototype};
use super::value::FieldValue;
use crate::geometry::Point;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A directed connection `(from, from_port) -> (to, to_port)`.
///
/// A link is stored by value in both endpoint ports; neither side owns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub from: String,
    pub from_port: String,
    pub to: String,
    pub to_port: String,
}

impl Link {
    /// True when this link runs along the same directed endpoint pair.
    pub fn connects(&self, from: &str, from_port: &str, to: &str, to_port: &str) -> bool {
        self.from == from && self.from_port == from_port && self.to == to && self.to_port == to_port
    }

    /// True when either endpoint is on the given node.
    pub fn touches(&self, node_id: &str) -> bool {
        self.from == node_id || self.to == node_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PortInstance {
    pub id: String,
    pub prototype: PortPrototype,
    pub links: Vec<Link>,
    /// Position relative to the node, reported by the view after rendering.
    pub offset: Point,
    pub is_dynamic: bool,
}

impl PortInstance {
    pub fn new(id: String, prototype: PortPrototype, is_dynamic: bool) -> Self {
        Self {
            id,
            prototype,
            links: Vec::new(),
            offset: Point::ZERO,
            is_dynamic,
        }
    }

    pub fn direction(&self) -> PortDirection {
        self.prototype.direction
    }

    /// Whether one more link may be attached without breaking cardinality.
    pub fn accepts_link(&self) -> bool {
        self.prototype.allow_multiple_links || self.links.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInstance {
    pub id: String,
    pub prototype: FieldPrototype,
    pub value: FieldValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeState {
    /// Transient: never persisted, always false after a load or paste.
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default)]
    pub is_collapsed: bool,
}

/// A concrete node in the graph, created from a registered prototype.
#[derive(Debug, Clone)]
pub struct NodeInstance {
    pub id: String,
    pub prototype: Arc<NodePrototype>,
    pub ports: IndexMap<String, PortInstance>,
    pub fields: IndexMap<String, FieldInstance>,
    pub offset: Point,
    pub state: NodeState,
}

impl NodeInstance {
    /// Instantiates every declared port and field, drawing fresh identifiers from `next_id`.
    pub(crate) fn from_prototype(
        id: String,
        prototype: Arc<NodePrototype>,
        offset: Point,
        mut next_id: impl FnMut() -> String,
    ) -> Self {
        let ports = prototype
            .ports
            .iter()
            .map(|p| {
                let port = PortInstance::new(next_id(), p.clone(), false);
                (port.id.clone(), port)
            })
            .collect();
        let fields = prototype
            .fields
            .iter()
            .map(|f| {
                let field = FieldInstance {
                    id: next_id(),
                    prototype: f.clone(),
                    value: f.default.clone(),
                };
                (field.id.clone(), field)
            })
            .collect();

        Self {
            id,
            prototype,
            ports,
            fields,
            offset,
            state: NodeState::default(),
        }
    }

    pub fn prototype_name(&self) -> &str {
        &self.prototype.id_name
    }

    /// First port instantiated from the port prototype named `id_name`.
    pub fn port_by_name(&self, id_name: &str) -> Option<&PortInstance> {
        self.ports.values().find(|p| p.prototype.id_name == id_name)
    }

    pub fn field_by_name(&self, id_name: &str) -> Option<&FieldInstance> {
        self.fields.values().find(|f| f.prototype.id_name == id_name)
    }

    /// Every link attached to any of this node's ports. A link between two ports of the
    /// same node is yielded twice.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.ports.values().flat_map(|p| p.links.iter())
    }
}

//! Conversion between graph entities and the persisted JSON document.

pub mod document;
pub mod marshal;

pub use document::*;
pub use marshal::*;

use crate::error::{CodecError, EntityKind, GraphError};
use crate::model::{
    DynamicPortPolicy, DynamicPortPrototype, FieldInstance, NodeInstance, NodeState,
    PortDirection, PortInstance, PrototypeRegistry,
};
use indexmap::IndexMap;
use tracing::warn;

/// Parses a JSON array of node documents.
pub fn parse_document(json: &str) -> Result<Vec<NodeDocument>, CodecError> {
    serde_json::from_str(json).map_err(|e| CodecError::Json(e.to_string()))
}

pub fn write_document(nodes: &[NodeDocument], pretty: bool) -> Result<String, CodecError> {
    let result = if pretty {
        serde_json::to_string_pretty(nodes)
    } else {
        serde_json::to_string(nodes)
    };
    result.map_err(|e| CodecError::Json(e.to_string()))
}

/// Converts a node into its persisted form. `is_selected` is always written as false.
pub fn encode_node(
    node: &NodeInstance,
    marshalers: &MarshalerTable,
) -> Result<NodeDocument, CodecError> {
    let ports = node
        .ports
        .values()
        .map(|port| {
            let doc = PortDocument {
                id_name: port.prototype.id_name.clone(),
                links: port.links.clone(),
                is_dynamic: port.is_dynamic,
                data_type: port.is_dynamic.then(|| port.prototype.data_type.clone()),
                display_name: if port.is_dynamic {
                    port.prototype.display_name.clone()
                } else {
                    None
                },
                direction: port.is_dynamic.then_some(port.prototype.direction),
            };
            (port.id.clone(), doc)
        })
        .collect();

    let mut fields = IndexMap::with_capacity(node.fields.len());
    for field in node.fields.values() {
        let marshaler = marshalers.get(&field.prototype.data_type)?;
        fields.insert(
            field.id.clone(),
            FieldDocument {
                id_name: field.prototype.id_name.clone(),
                data: marshaler.to_persisted(&field.value)?,
            },
        );
    }

    Ok(NodeDocument {
        id: node.id.clone(),
        id_name: node.prototype.id_name.clone(),
        ports,
        fields,
        state: NodeState {
            is_selected: false,
            is_collapsed: node.state.is_collapsed,
        },
        offset: node.offset,
    })
}

/// Rebuilds a node from its persisted form.
///
/// Fails with `NotFound` when the node, a static port or a field references a prototype
/// that is not registered. Dynamic ports on prototypes outside the dynamic-port allow-list
/// are dropped with a warning. Ports and fields the prototype declares but the document
/// lacks are instantiated fresh with identifiers from `next_id`.
pub fn decode_node(
    doc: &NodeDocument,
    registry: &PrototypeRegistry,
    policy: &DynamicPortPolicy,
    marshalers: &MarshalerTable,
    mut next_id: impl FnMut() -> String,
) -> Result<NodeInstance, CodecError> {
    let prototype = registry.get(&doc.id_name)?;

    let mut ports = IndexMap::with_capacity(doc.ports.len());
    for (port_id, port_doc) in &doc.ports {
        let mut port = if port_doc.is_dynamic {
            if !policy.allows(&prototype.id_name) {
                warn!(
                    node = %doc.id,
                    port = %port_id,
                    prototype = %prototype.id_name,
                    "dropping dynamic port on a prototype without dynamic port support"
                );
                continue;
            }
            let direction = port_doc
                .direction
                .unwrap_or_else(|| infer_direction(&doc.id, port_id, port_doc));
            let dynamic = DynamicPortPrototype {
                id_name: port_doc.id_name.clone(),
                data_type: port_doc
                    .data_type
                    .clone()
                    .unwrap_or_else(|| crate::model::ANY_TYPE.to_string()),
                display_name: port_doc
                    .display_name
                    .clone()
                    .unwrap_or_else(|| port_doc.id_name.clone()),
                direction,
            };
            PortInstance::new(port_id.clone(), dynamic.to_port_prototype(), true)
        } else {
            let port_prototype = prototype.port(&port_doc.id_name).ok_or_else(|| {
                GraphError::not_found(EntityKind::PortPrototype, port_doc.id_name.as_str())
            })?;
            PortInstance::new(port_id.clone(), port_prototype.clone(), false)
        };
        port.links = port_doc.links.clone();
        ports.insert(port_id.clone(), port);
    }

    for declared in &prototype.ports {
        let present = ports
            .values()
            .any(|p: &PortInstance| !p.is_dynamic && p.prototype.id_name == declared.id_name);
        if !present {
            let port = PortInstance::new(next_id(), declared.clone(), false);
            ports.insert(port.id.clone(), port);
        }
    }

    let mut fields = IndexMap::with_capacity(doc.fields.len());
    for (field_id, field_doc) in &doc.fields {
        let field_prototype = prototype.field(&field_doc.id_name).ok_or_else(|| {
            GraphError::not_found(EntityKind::FieldPrototype, field_doc.id_name.as_str())
        })?;
        let value = marshalers
            .get(&field_prototype.data_type)?
            .from_persisted(&field_doc.data)?;
        fields.insert(
            field_id.clone(),
            FieldInstance {
                id: field_id.clone(),
                prototype: field_prototype.clone(),
                value,
            },
        );
    }

    for declared in &prototype.fields {
        let present = fields
            .values()
            .any(|f: &FieldInstance| f.prototype.id_name == declared.id_name);
        if !present {
            let id = next_id();
            fields.insert(
                id.clone(),
                FieldInstance {
                    id,
                    prototype: declared.clone(),
                    value: declared.default.clone(),
                },
            );
        }
    }

    Ok(NodeInstance {
        id: doc.id.clone(),
        prototype,
        ports,
        fields,
        offset: doc.offset,
        state: NodeState {
            is_selected: false,
            is_collapsed: doc.state.is_collapsed,
        },
    })
}

/// Older documents carry no direction for dynamic ports; a port that is the source of one
/// of its links is an output, anything else an input.
fn infer_direction(node_id: &str, port_id: &str, port: &PortDocument) -> PortDirection {
    let is_source = port
        .links
        .iter()
        .any(|l| l.from == node_id && l.from_port == port_id);
    if is_source {
        PortDirection::Output
    } else {
        PortDirection::Input
    }
}

use super::GraphStore;
use crate::error::{EntityKind, GraphError};
use crate::model::{DynamicPortPrototype, PortDirection, PortInstance};
use tracing::debug;

impl GraphStore {
    /// Adds a runtime port to a node whose prototype is on the dynamic-port allow-list.
    ///
    /// Adding a port id that already exists on the node is a no-op.
    pub fn add_dynamic_port(
        &mut self,
        node_id: &str,
        port_id: &str,
        data_type: &str,
        display_name: &str,
        direction: PortDirection,
    ) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| GraphError::not_found(EntityKind::Node, node_id))?;
        self.dynamic_ports
            .check(&node.prototype.id_name, direction)?;
        if node.ports.contains_key(port_id) {
            return Ok(());
        }

        let prototype = DynamicPortPrototype {
            id_name: port_id.to_string(),
            data_type: data_type.to_string(),
            display_name: display_name.to_string(),
            direction,
        };
        node.ports.insert(
            port_id.to_string(),
            PortInstance::new(port_id.to_string(), prototype.to_port_prototype(), true),
        );
        debug!(node = node_id, port = port_id, ?direction, "added dynamic port");
        Ok(())
    }

    /// Severs and removes a dynamic port. Static ports cannot be removed.
    pub fn remove_dynamic_port(&mut self, node_id: &str, port_id: &str) -> Result<(), GraphError> {
        let port = self
            .try_node(node_id)?
            .ports
            .get(port_id)
            .ok_or_else(|| GraphError::not_found(EntityKind::Port, port_id))?;
        if !port.is_dynamic {
            return Err(GraphError::UnsupportedOperation(format!(
                "port '{}' is declared by the node prototype and cannot be removed",
                port_id
            )));
        }

        self.sever_port(node_id, port_id, false);
        if let Some(node) = self.nodes.get_mut(node_id) {
            node.ports.shift_remove(port_id);
        }
        debug!(node = node_id, port = port_id, "removed dynamic port");
        Ok(())
    }

    /// Whether nodes of `prototype` may receive dynamic ports.
    pub fn supports_dynamic_ports(&self, prototype: &str) -> bool {
        self.dynamic_ports.allows(prototype)
    }
}

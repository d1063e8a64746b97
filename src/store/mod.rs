//! The graph store: system of record for nodes, ports, fields and links.
//!
//! Every mutation runs to completion synchronously and then emits its event, so a
//! subscriber never observes a half-applied change. The spatial index and the link
//! cache are derived from the node map and may be rebuilt at any time.

use crate::codec::{DataMarshaler, MarshalerTable};
use crate::config::EditorConfig;
use crate::error::{ConfigError, EntityKind, GraphError};
use crate::events::{EventBus, EventEnvelope, GraphEvent, SubscriptionId};
use crate::geometry::{Point, Rect};
use crate::id::{IdGenerator, UuidIds};
use crate::model::{
    DynamicPortPolicy, FieldValue, Link, NodeInstance, NodePrototype, PrototypeRegistry,
};
use crate::spatial::SpatialIndex;
use ahash::RandomState;
use indexmap::IndexMap;
use tracing::{debug, warn};

mod dynamic;
mod links;
mod persist;
mod selection;
mod viewport;

pub use persist::LoadReport;
pub use selection::SelectionState;
pub use viewport::Viewport;

pub(crate) type NodeMap = IndexMap<String, NodeInstance, RandomState>;
pub(crate) type LinkMap = IndexMap<String, Link, RandomState>;

/// Draws identifiers until one is free among the current nodes and links.
pub(crate) fn generate_id(ids: &mut dyn IdGenerator, nodes: &NodeMap, links: &LinkMap) -> String {
    loop {
        let id = ids.next_id();
        if !nodes.contains_key(&id) && !links.contains_key(&id) {
            return id;
        }
        warn!(id = %id, "identifier generator produced an id already in use, retrying");
    }
}

/// What the view reports after laying out a node.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNode {
    pub node_id: String,
    /// World-space bounding rectangle of the rendered node.
    pub rect: Rect,
    /// Port id to position relative to the node.
    pub port_offsets: Vec<(String, Point)>,
}

pub struct GraphStore {
    pub(crate) config: EditorConfig,
    pub(crate) registry: PrototypeRegistry,
    pub(crate) dynamic_ports: DynamicPortPolicy,
    pub(crate) marshalers: MarshalerTable,
    pub(crate) ids: Box<dyn IdGenerator>,
    pub(crate) nodes: NodeMap,
    /// Render cache of every link, keyed by link id.
    pub(crate) links: LinkMap,
    pub(crate) spatial: SpatialIndex,
    pub(crate) events: EventBus,
    pub(crate) selection: SelectionState,
    pub(crate) viewport: Viewport,
}

pub struct GraphStoreBuilder {
    config: EditorConfig,
    prototypes: Vec<NodePrototype>,
    ids: Box<dyn IdGenerator>,
    marshalers: MarshalerTable,
}

impl GraphStoreBuilder {
    pub fn new() -> Self {
        Self {
            config: EditorConfig::default(),
            prototypes: Vec::new(),
            ids: Box::new(UuidIds),
            marshalers: MarshalerTable::with_defaults(),
        }
    }

    pub fn with_config(mut self, config: EditorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_prototype(mut self, prototype: NodePrototype) -> Self {
        self.prototypes.push(prototype);
        self
    }

    pub fn with_prototypes(mut self, registry: &PrototypeRegistry) -> Self {
        self.prototypes
            .extend(registry.iter().map(|p| p.as_ref().clone()));
        self
    }

    /// Adds `prototype` to the dynamic-port allow-list.
    pub fn with_dynamic_ports(mut self, prototype: &str) -> Self {
        if !self
            .config
            .dynamic_port_prototypes
            .iter()
            .any(|p| p == prototype)
        {
            self.config
                .dynamic_port_prototypes
                .push(prototype.to_string());
        }
        self
    }

    pub fn with_id_generator<G: IdGenerator + 'static>(mut self, ids: G) -> Self {
        self.ids = Box::new(ids);
        self
    }

    pub fn with_marshaler(mut self, marshaler: Box<dyn DataMarshaler>) -> Self {
        self.marshalers.register(marshaler);
        self
    }

    pub fn build(self) -> Result<GraphStore, ConfigError> {
        self.config.validate()?;

        let mut registry = PrototypeRegistry::new();
        for prototype in self.prototypes {
            registry.register(prototype);
        }
        let dynamic_ports = DynamicPortPolicy::new(
            self.config.dynamic_port_prototypes.iter().cloned(),
            self.config.no_dynamic_input_prototypes.iter().cloned(),
        );

        Ok(GraphStore {
            events: EventBus::new(self.config.event_history_limit),
            viewport: Viewport::new(self.config.viewport_size),
            config: self.config,
            registry,
            dynamic_ports,
            marshalers: self.marshalers,
            ids: self.ids,
            nodes: NodeMap::default(),
            links: LinkMap::default(),
            spatial: SpatialIndex::new(),
            selection: SelectionState::default(),
        })
    }
}

impl Default for GraphStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    pub fn builder() -> GraphStoreBuilder {
        GraphStoreBuilder::new()
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn registry(&self) -> &PrototypeRegistry {
        &self.registry
    }

    pub fn marshalers(&self) -> &MarshalerTable {
        &self.marshalers
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.spatial
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe<F>(&mut self, subscriber: F) -> SubscriptionId
    where
        F: FnMut(&mut EventEnvelope) + 'static,
    {
        self.events.subscribe(subscriber)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Idempotent: a prototype whose name is already registered is ignored.
    pub fn register_prototype(&mut self, prototype: NodePrototype) -> bool {
        self.registry.register(prototype)
    }

    pub fn node(&self, id: &str) -> Option<&NodeInstance> {
        self.nodes.get(id)
    }

    pub fn try_node(&self, id: &str) -> Result<&NodeInstance, GraphError> {
        self.nodes
            .get(id)
            .ok_or_else(|| GraphError::not_found(EntityKind::Node, id))
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeInstance> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Every link in the graph, in creation order.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn link(&self, id: &str) -> Option<&Link> {
        self.links.get(id)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub(crate) fn fresh_id(&mut self) -> String {
        generate_id(&mut *self.ids, &self.nodes, &self.links)
    }

    /// Creates a node from a registered prototype, with every field at its default.
    pub fn add_node(
        &mut self,
        prototype_name: &str,
        offset: Point,
    ) -> Result<&NodeInstance, GraphError> {
        let prototype = self.registry.get(prototype_name)?;
        let id = self.fresh_id();
        let node = {
            let ids = &mut *self.ids;
            let (nodes, links) = (&self.nodes, &self.links);
            NodeInstance::from_prototype(id.clone(), prototype, offset, || {
                generate_id(&mut *ids, nodes, links)
            })
        };

        debug!(node = %id, prototype = prototype_name, "added node");
        self.nodes.insert(id.clone(), node);
        self.events.emit(GraphEvent::AddNode {
            node_id: id.clone(),
        });
        self.try_node(&id)
    }

    /// Removes nodes after severing every link on their ports. Unknown ids are skipped.
    pub fn remove_nodes<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = Vec::new();
        for id in ids {
            let id = id.as_ref();
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            let port_ids: Vec<String> = node.ports.keys().cloned().collect();
            for port_id in port_ids {
                self.sever_port(id, &port_id, false);
            }
            self.spatial.remove(id);
            self.selection.remove(id);
            self.nodes.shift_remove(id);
            removed.push(id.to_string());
        }

        if removed.is_empty() {
            return;
        }
        debug!(count = removed.len(), "removed nodes");
        self.events.emit(GraphEvent::RemoveNodes { node_ids: removed });
    }

    /// Moves a node and shifts its last rendered rectangle by the same delta. Emits nothing:
    /// the view driving the move already knows.
    pub fn set_node_offset(&mut self, id: &str, offset: Point) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::not_found(EntityKind::Node, id))?;
        let delta = offset - node.offset;
        node.offset = offset;
        if let Some(rect) = self.spatial.rect_of(id) {
            self.spatial.insert(id, rect.translate(delta));
        }
        Ok(())
    }

    /// Replaces a field's value after checking it against the field's declared data type.
    pub fn set_field_value(
        &mut self,
        node_id: &str,
        field_id: &str,
        value: FieldValue,
    ) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or_else(|| GraphError::not_found(EntityKind::Node, node_id))?;
        let field = node
            .fields
            .get_mut(field_id)
            .ok_or_else(|| GraphError::not_found(EntityKind::Field, field_id))?;
        if !value.conforms_to(&field.prototype.data_type) {
            return Err(GraphError::TypeMismatch {
                field: field.prototype.id_name.clone(),
                expected: field.prototype.data_type.clone(),
                found: value,
            });
        }
        debug!(node = node_id, field = field_id, value = %value, "set field value");
        field.value = value;
        Ok(())
    }

    /// Runs the prototype's execution callback on the node. `None` when the prototype has none.
    pub fn execute_node(&self, id: &str) -> Result<Option<FieldValue>, GraphError> {
        let node = self.try_node(id)?;
        Ok(node.prototype.execute.as_ref().map(|execute| execute(node)))
    }

    /// Render-complete callback: the only way the view writes into the spatial index.
    pub fn on_node_rendered(&mut self, rendered: RenderedNode) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&rendered.node_id)
            .ok_or_else(|| GraphError::not_found(EntityKind::Node, rendered.node_id.as_str()))?;
        for (port_id, offset) in rendered.port_offsets {
            if let Some(port) = node.ports.get_mut(&port_id) {
                port.offset = offset;
            }
        }
        self.spatial.insert(&rendered.node_id, rendered.rect);
        Ok(())
    }
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("prototypes", &self.registry.len())
            .field("nodes", &self.nodes.len())
            .field("links", &self.links.len())
            .field("selected", &self.selection.len())
            .field("viewport", &self.viewport)
            .finish()
    }
}

use super::instance::NodeInstance;
use super::prototype::{NodePrototype, PortDirection};
use super::value::FieldValue;
use crate::error::{CodecError, EntityKind, GraphError};
use ahash::{AHashSet, RandomState};
use indexmap::IndexMap;
use std::sync::Arc;
use tracing::debug;

/// Name-keyed table of node prototypes. Insertion order is kept for listing.
#[derive(Debug, Clone, Default)]
pub struct PrototypeRegistry {
    prototypes: IndexMap<String, Arc<NodePrototype>, RandomState>,
}

impl PrototypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON array of prototype definitions. Execution callbacks are not representable
    /// in JSON; attach them afterwards with `attach_execute`.
    pub fn from_json_str(json: &str) -> Result<Self, CodecError> {
        let prototypes: Vec<NodePrototype> =
            serde_json::from_str(json).map_err(|e| CodecError::Json(e.to_string()))?;
        let mut registry = Self::new();
        for prototype in prototypes {
            registry.register(prototype);
        }
        Ok(registry)
    }

    /// Inserts a prototype unless one with the same name exists. Returns whether it was inserted.
    pub fn register(&mut self, prototype: NodePrototype) -> bool {
        if self.prototypes.contains_key(&prototype.id_name) {
            return false;
        }
        debug!(prototype = %prototype.id_name, "registered node prototype");
        self.prototypes
            .insert(prototype.id_name.clone(), Arc::new(prototype));
        true
    }

    /// Sets the execution callback of a registered prototype. Nodes created earlier keep the
    /// prototype they were created from.
    pub fn attach_execute<F>(&mut self, id_name: &str, execute: F) -> Result<(), GraphError>
    where
        F: Fn(&NodeInstance) -> FieldValue + Send + Sync + 'static,
    {
        let slot = self
            .prototypes
            .get_mut(id_name)
            .ok_or_else(|| GraphError::not_found(EntityKind::Prototype, id_name))?;
        let updated = slot.as_ref().clone().with_execute(execute);
        *slot = Arc::new(updated);
        Ok(())
    }

    pub fn get(&self, id_name: &str) -> Result<Arc<NodePrototype>, GraphError> {
        self.prototypes
            .get(id_name)
            .cloned()
            .ok_or_else(|| GraphError::not_found(EntityKind::Prototype, id_name))
    }

    pub fn contains(&self, id_name: &str) -> bool {
        self.prototypes.contains_key(id_name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.prototypes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<NodePrototype>> {
        self.prototypes.values()
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}

/// Which prototypes may grow ports at runtime, and which of those may not grow inputs.
#[derive(Debug, Clone, Default)]
pub struct DynamicPortPolicy {
    allowed: AHashSet<String>,
    no_inputs: AHashSet<String>,
}

impl DynamicPortPolicy {
    pub fn new<I, J>(allowed: I, no_inputs: J) -> Self
    where
        I: IntoIterator<Item = String>,
        J: IntoIterator<Item = String>,
    {
        Self {
            allowed: allowed.into_iter().collect(),
            no_inputs: no_inputs.into_iter().collect(),
        }
    }

    pub fn allows(&self, prototype: &str) -> bool {
        self.allowed.contains(prototype)
    }

    /// Fails with `UnsupportedOperation` when `prototype` may not receive a dynamic port
    /// in `direction`.
    pub fn check(&self, prototype: &str, direction: PortDirection) -> Result<(), GraphError> {
        if !self.allows(prototype) {
            return Err(GraphError::UnsupportedOperation(format!(
                "node prototype '{}' does not support dynamic ports",
                prototype
            )));
        }
        if direction == PortDirection::Input && self.no_inputs.contains(prototype) {
            return Err(GraphError::UnsupportedOperation(format!(
                "node prototype '{}' does not support dynamic input ports",
                prototype
            )));
        }
        Ok(())
    }
}

use crate::model::FieldValue;
use std::fmt;
use thiserror::Error;

/// The kind of entity a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Prototype,
    PortPrototype,
    FieldPrototype,
    Node,
    Port,
    Field,
    Link,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Prototype => "node prototype",
            EntityKind::PortPrototype => "port prototype",
            EntityKind::FieldPrototype => "field prototype",
            EntityKind::Node => "node",
            EntityKind::Port => "port",
            EntityKind::Field => "field",
            EntityKind::Link => "link",
        };
        f.write_str(name)
    }
}

/// Errors raised by graph store mutations and lookups.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Field '{field}' expects a value of type '{expected}', but received '{found}'")]
    TypeMismatch {
        field: String,
        expected: String,
        found: FieldValue,
    },
}

impl GraphError {
    pub(crate) fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        GraphError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Returns true for lookups that failed because an entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::NotFound { .. })
    }
}

/// Errors raised while converting between the graph and its persisted document.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Failed to parse graph document: {0}")]
    Json(String),

    #[error("No marshaler registered for data type '{0}'")]
    MissingMarshaler(String),

    #[error("Could not marshal value of data type '{data_type}': {message}")]
    Marshal { data_type: String, message: String },

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Errors raised by clipboard transfers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClipboardError {
    #[error("Clipboard is unavailable: {0}")]
    Unavailable(String),

    #[error("Clipboard is empty")]
    Empty,

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors raised while loading or validating an editor configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to parse editor configuration: {0}")]
    Parse(String),

    #[error("Invalid editor configuration: {0}")]
    Invalid(String),
}

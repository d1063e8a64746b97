//! Prelude module for convenient imports
//!
//! Re-exports the types most editor integrations touch. Import this module to get the
//! store, the model and the error types without naming each path.
//!
//! # Example
//!
//! ```rust,no_run
//! use nodeweave::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let prototypes = std::fs::read_to_string("path/to/prototypes.json")?;
//! let document = std::fs::read_to_string("path/to/graph.json")?;
//!
//! let registry = PrototypeRegistry::from_json_str(&prototypes)?;
//! let mut store = GraphStore::builder().with_prototypes(&registry).build()?;
//! let report = store.load_json_str(&document)?;
//!
//! println!("Loaded {} nodes, skipped {}", report.loaded.len(), report.skipped.len());
//! # Ok(())
//! # }
//! ```

// Store and its state
pub use crate::store::{GraphStore, GraphStoreBuilder, LoadReport, RenderedNode, Viewport};

// Graph model
pub use crate::model::{
    FieldPrototype, FieldValue, Link, NodeInstance, NodePrototype, PortDirection, PortKind,
    PortPrototype, PrototypeRegistry,
};

// Events
pub use crate::events::{EventEnvelope, GraphEvent, SubscriptionId};

// Persistence and clipboard
pub use crate::clipboard::{ClipboardProvider, MemoryClipboard};
pub use crate::codec::{DataMarshaler, MarshalerTable, NodeDocument};

// Geometry, configuration and identifiers
pub use crate::config::EditorConfig;
pub use crate::geometry::{Point, Rect, Size};
pub use crate::id::{IdGenerator, SequentialIds, UuidIds};

// Error types
pub use crate::error::{ClipboardError, CodecError, ConfigError, GraphError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

//! # Nodeweave - Node Graph Editor Core
//!
//! **Nodeweave** is the model layer of a visual node-graph editor. It owns the graph of
//! nodes, typed ports, fields and links, keeps a grid spatial index in step with what the
//! view has rendered, and broadcasts every mutation on an event bus so a UI can redraw
//! exactly what changed. It draws nothing itself.
//!
//! ## Core Workflow
//!
//! 1.  **Describe Your Nodes**: Build `NodePrototype`s in code or load them from JSON with
//!     `PrototypeRegistry::from_json_str`.
//! 2.  **Build a Store**: Use `GraphStore::builder` to register prototypes, choose an
//!     identifier generator and apply an `EditorConfig`.
//! 3.  **Edit**: Add nodes and links, select, drag, collapse, pan and zoom. Subscribe to the
//!     event bus to learn about each change.
//! 4.  **Persist and Exchange**: Serialize the graph to its JSON document, or copy and paste
//!     node subsets through a `ClipboardProvider`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nodeweave::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let format = NodePrototype::new("format")
//!         .with_display_name("Format")
//!         .with_port(PortPrototype::input("value", "any"))
//!         .with_port(PortPrototype::output("text", "string").multiple())
//!         .with_field(FieldPrototype::new("pattern", "string", "{}".into()));
//!
//!     let mut store = GraphStore::builder()
//!         .with_prototype(format)
//!         .with_id_generator(SequentialIds::new("n"))
//!         .build()?;
//!
//!     store.subscribe(|envelope| println!("event: {}", envelope.event().name()));
//!
//!     let a = store.add_node("format", Point::new(0.0, 0.0))?.id.clone();
//!     let b = store.add_node("format", Point::new(300.0, 0.0))?.id.clone();
//!
//!     let text = store.node(&a).and_then(|n| n.port_by_name("text")).map(|p| p.id.clone());
//!     let value = store.node(&b).and_then(|n| n.port_by_name("value")).map(|p| p.id.clone());
//!     if let (Some(text), Some(value)) = (text, value) {
//!         store.add_link(&a, &text, &b, &value);
//!     }
//!
//!     println!("{}", store.to_json(true)?);
//!     Ok(())
//! }
//! ```

pub mod clipboard;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod id;
pub mod model;
pub mod prelude;
pub mod spatial;
pub mod store;

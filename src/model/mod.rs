//! Prototypes, instances and links: the entities a graph store owns.

pub mod instance;
pub mod prototype;
pub mod registry;
pub mod value;

pub use instance::*;
pub use prototype::*;
pub use registry::*;
pub use value::*;

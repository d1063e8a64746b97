//! Identifier service for nodes, ports, fields and links.

use uuid::Uuid;

/// Produces identifiers that are unique for the lifetime of a graph store.
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// Random v4 UUIDs. The default for interactive sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// `prefix` followed by a monotonically increasing counter (`n1`, `n2`, ...).
///
/// Deterministic, which makes it the generator of choice for tests and tools.
/// Identifiers are never reused, so the generator must not be shared between
/// stores that will later exchange documents.
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

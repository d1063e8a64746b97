use crate::geometry::Point;
use crate::model::{Link, NodeState, PortDirection};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

fn is_false(b: &bool) -> bool {
    !*b
}

/// Persisted form of one node. A graph document is an ordered `Vec<NodeDocument>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDocument {
    pub id: String,
    pub id_name: String,
    #[serde(default)]
    pub ports: IndexMap<String, PortDocument>,
    #[serde(default)]
    pub fields: IndexMap<String, FieldDocument>,
    #[serde(default)]
    pub state: NodeState,
    #[serde(default)]
    pub offset: Point,
}

impl NodeDocument {
    /// Every link listed on any port of this node. A link between two ports of the same
    /// node appears twice.
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.ports.values().flat_map(|p| p.links.iter())
    }
}

/// Persisted form of one port.
///
/// The type, display name and direction entries are only written for dynamic ports; static
/// ports take them from their prototype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortDocument {
    pub id_name: String,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_dynamic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<PortDirection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDocument {
    pub id_name: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

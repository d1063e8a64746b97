use super::instance::NodeInstance;
use super::value::{ANY_TYPE, FieldValue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Callback a host attaches to a prototype to run a node. Opaque to the store.
pub type ExecuteFn = Arc<dyn Fn(&NodeInstance) -> FieldValue + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PortDirection {
    Input,
    Output,
}

impl PortDirection {
    pub fn opposite(self) -> Self {
        match self {
            PortDirection::Input => PortDirection::Output,
            PortDirection::Output => PortDirection::Input,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PortKind {
    #[default]
    Data,
    Control,
}

fn any_type() -> String {
    ANY_TYPE.to_string()
}

/// Template for one port of a node prototype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortPrototype {
    pub id_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    pub direction: PortDirection,
    #[serde(default)]
    pub kind: PortKind,
    #[serde(default = "any_type")]
    pub data_type: String,
    #[serde(default)]
    pub allow_multiple_links: bool,
}

impl PortPrototype {
    pub fn new(id_name: &str, direction: PortDirection, data_type: &str) -> Self {
        Self {
            id_name: id_name.to_string(),
            display_name: None,
            direction,
            kind: PortKind::Data,
            data_type: data_type.to_string(),
            allow_multiple_links: false,
        }
    }

    pub fn input(id_name: &str, data_type: &str) -> Self {
        Self::new(id_name, PortDirection::Input, data_type)
    }

    pub fn output(id_name: &str, data_type: &str) -> Self {
        Self::new(id_name, PortDirection::Output, data_type)
    }

    pub fn control(mut self) -> Self {
        self.kind = PortKind::Control;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.allow_multiple_links = true;
        self
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }
}

/// A port created at runtime rather than declared by the node prototype.
///
/// Dynamic inputs accept a single link, dynamic outputs fan out.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicPortPrototype {
    pub id_name: String,
    pub data_type: String,
    pub display_name: String,
    pub direction: PortDirection,
}

impl DynamicPortPrototype {
    pub fn to_port_prototype(&self) -> PortPrototype {
        PortPrototype {
            id_name: self.id_name.clone(),
            display_name: Some(self.display_name.clone()),
            direction: self.direction,
            kind: PortKind::Data,
            data_type: self.data_type.clone(),
            allow_multiple_links: self.direction == PortDirection::Output,
        }
    }
}

/// Template for one editable field of a node prototype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldPrototype {
    pub id_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default = "any_type")]
    pub data_type: String,
    #[serde(default)]
    pub default: FieldValue,
}

impl FieldPrototype {
    pub fn new(id_name: &str, data_type: &str, default: FieldValue) -> Self {
        Self {
            id_name: id_name.to_string(),
            display_name: None,
            data_type: data_type.to_string(),
            default,
        }
    }
}

/// Immutable template from which node instances are created.
///
/// Registered once per session and looked up by `id_name`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePrototype {
    pub id_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ports: Vec<PortPrototype>,
    #[serde(default)]
    pub fields: Vec<FieldPrototype>,
    #[serde(skip)]
    pub execute: Option<ExecuteFn>,
}

impl NodePrototype {
    pub fn new(id_name: &str) -> Self {
        Self {
            id_name: id_name.to_string(),
            display_name: id_name.to_string(),
            category: None,
            description: None,
            ports: Vec::new(),
            fields: Vec::new(),
            execute: None,
        }
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = name.to_string();
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn with_port(mut self, port: PortPrototype) -> Self {
        self.ports.push(port);
        self
    }

    pub fn with_field(mut self, field: FieldPrototype) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_execute<F>(mut self, execute: F) -> Self
    where
        F: Fn(&NodeInstance) -> FieldValue + Send + Sync + 'static,
    {
        self.execute = Some(Arc::new(execute));
        self
    }

    pub fn port(&self, id_name: &str) -> Option<&PortPrototype> {
        self.ports.iter().find(|p| p.id_name == id_name)
    }

    pub fn field(&self, id_name: &str) -> Option<&FieldPrototype> {
        self.fields.iter().find(|f| f.id_name == id_name)
    }
}

impl fmt::Debug for NodePrototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePrototype")
            .field("id_name", &self.id_name)
            .field("display_name", &self.display_name)
            .field("category", &self.category)
            .field("ports", &self.ports)
            .field("fields", &self.fields)
            .field("execute", &self.execute.is_some())
            .finish()
    }
}

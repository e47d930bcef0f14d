//! Typed, attribute-style navigation over stored configuration.

use serde_json::{Map, Value};

/// A snapshot of one position in the configuration tree.
///
/// Mappings become [`Node::Branch`] so lookups can keep walking; everything
/// else, arrays included, is a [`Node::Scalar`] leaf. Branch children keep the
/// order of the stored mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Value),
    Branch(Vec<(String, Node)>),
}

impl Node {
    /// Builds a node from a stored value, converting nested mappings recursively.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Node::Branch(
                map.iter()
                    .map(|(key, value)| (key.clone(), Node::from_value(value)))
                    .collect(),
            ),
            other => Node::Scalar(other.clone()),
        }
    }

    /// Child named `segment`, if this is a branch that has one.
    pub fn get(&self, segment: &str) -> Option<&Node> {
        match self {
            Node::Branch(children) => children
                .iter()
                .find(|(name, _)| name == segment)
                .map(|(_, node)| node),
            Node::Scalar(_) => None,
        }
    }

    /// Walks a `separator`-joined path below this node.
    pub fn navigate(&self, path: &str, separator: &str) -> Option<&Node> {
        if separator.is_empty() {
            return self.get(path);
        }
        path.split(separator)
            .try_fold(self, |node, segment| node.get(segment))
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Node::Scalar(value) => Some(value),
            Node::Branch(_) => None,
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Node::Branch(_))
    }

    /// Converts back into a plain value.
    pub fn into_value(self) -> Value {
        match self {
            Node::Scalar(value) => value,
            Node::Branch(children) => Value::Object(
                children
                    .into_iter()
                    .map(|(key, node)| (key, node.into_value()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }
}

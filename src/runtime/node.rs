use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Placeholder used when a node is constructed without an identifier.
pub const NULL_IDENTIFIER: &str = "Null Identifier";

/// DAG 节点标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIdentifier(String);

impl NodeIdentifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Substitutes the placeholder for a missing identifier.
    pub fn ensure(identifier: Option<NodeIdentifier>) -> Self {
        match identifier {
            Some(id) => id,
            None => {
                warn!("Node constructed without an identifier, using '{}'", NULL_IDENTIFIER);
                Self::new(NULL_IDENTIFIER)
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn is_placeholder(&self) -> bool {
        self.0 == NULL_IDENTIFIER
    }
}

impl fmt::Display for NodeIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeIdentifier {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for NodeIdentifier {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// RDF terms and the take-once slot that owns a term inside a statement or result row.
use std::fmt;

use serde::{Deserialize, Serialize};

/// A typed RDF term.
///
/// The serde form is the term object of the SPARQL 1.1 JSON results format,
/// so nodes can be written into result documents and read from JSON-lines
/// datasets without a separate mapping layer.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    #[serde(rename = "uri")]
    Uri { value: String },
    #[serde(rename = "bnode")]
    Blank { value: String },
    #[serde(rename = "literal")]
    Literal {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
        #[serde(default, rename = "xml:lang", skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
}

impl Node {
    pub fn uri(value: impl Into<String>) -> Self {
        Node::Uri {
            value: value.into(),
        }
    }

    pub fn blank(value: impl Into<String>) -> Self {
        Node::Blank {
            value: value.into(),
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Node::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Node::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Node::Literal {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    /// Lexical value without any type or language decoration.
    pub fn value(&self) -> &str {
        match self {
            Node::Uri { value } | Node::Blank { value } | Node::Literal { value, .. } => value,
        }
    }

    pub fn is_uri(&self) -> bool {
        matches!(self, Node::Uri { .. })
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Node::Blank { .. })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Node::Literal { .. })
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Uri { value } => write!(f, "<{value}>"),
            Node::Blank { value } => write!(f, "_:{value}"),
            Node::Literal {
                value,
                datatype,
                language,
            } => {
                write!(f, "{value:?}")?;
                if let Some(language) = language {
                    write!(f, "@{language}")?;
                } else if let Some(datatype) = datatype {
                    write!(f, "^^<{datatype}>")?;
                }
                Ok(())
            }
        }
    }
}

/// Exclusive owner of at most one node.
///
/// `take` is the only way to move the node out and always leaves the slot
/// empty, so a second extraction yields `None` instead of a second owner.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeSlot(Option<Node>);

impl NodeSlot {
    pub fn new(node: Option<Node>) -> Self {
        Self(node)
    }

    pub fn empty() -> Self {
        Self(None)
    }

    pub fn take(&mut self) -> Option<Node> {
        self.0.take()
    }

    pub fn get(&self) -> Option<&Node> {
        self.0.as_ref()
    }

    /// Stores `node`, returning whatever the slot held before.
    pub fn put(&mut self, node: Node) -> Option<Node> {
        self.0.replace(node)
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl From<Node> for NodeSlot {
    fn from(node: Node) -> Self {
        Self(Some(node))
    }
}

impl From<Option<Node>> for NodeSlot {
    fn from(node: Option<Node>) -> Self {
        Self(node)
    }
}

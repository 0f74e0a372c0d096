use std::collections::HashSet;
use std::fmt::{self, Display};

/// Handle to a node stored in a [`Document`]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub usize);

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DOMNode {
    pub children: Vec<NodeId>,
    pub node_type: DOMNodeType,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DOMNodeType {
    Element(DOMElement),
    Text(String),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct DOMElement {
    pub tag_name: String,
    pub attributes: DOMAttributes,
}

impl DOMElement {
    pub fn new(name: impl Display, attributes: Option<DOMAttributes>) -> Self {
        Self {
            tag_name: name.to_string(),
            attributes: attributes.unwrap_or_default(),
        }
    }
}

/// Attributes in the order they appeared in the source
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct DOMAttributes(pub Vec<(String, String)>);

impl DOMAttributes {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Adds an attribute. A name that is already present keeps its first value.
    ///
    /// Scans the existing attributes; build large sets with `collect` instead.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.get(&name).is_some() {
            return false;
        }
        self.0.push((name, value.into()));
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Keeps the first occurrence of each name, like repeated [`DOMAttributes::insert`] but in
/// linear time.
impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DOMAttributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut seen = HashSet::new();
        let entries = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, _): &(String, String)| seen.insert(k.clone()))
            .collect();
        Self(entries)
    }
}

/// Build [`DOMAttributes`] from `name => value` pairs
#[macro_export]
macro_rules! attributes {
    ($($k:expr => $v:expr),* $(,)?) => {
        <$crate::DOMAttributes as ::core::iter::FromIterator<(&str, &str)>>::from_iter([$(($k, $v)),*])
    };
}

/// A parsed document. Nodes live in an arena and refer to their children by [`NodeId`].
///
/// The arena does not check the links made through [`Document::append_child`], so a
/// hand-built document may contain cycles or shared children. Consumers walking the
/// tree must guard against both.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Document {
    nodes: Vec<DOMNode>,
    root: Option<NodeId>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, node_type: DOMNodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DOMNode {
            children: vec![],
            node_type,
        });
        id
    }

    pub fn create_element(&mut self, name: impl Display, attributes: DOMAttributes) -> NodeId {
        self.push(DOMNodeType::Element(DOMElement::new(name, Some(attributes))))
    }

    pub fn create_text(&mut self, data: impl Into<String>) -> NodeId {
        self.push(DOMNodeType::Text(data.into()))
    }

    /// Appends `child` to the child list of `parent`. Returns false if `parent` does not exist.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        match self.nodes.get_mut(parent.0) {
            Some(node) => {
                node.children.push(child);
                true
            }
            None => false,
        }
    }

    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn get(&self, id: NodeId) -> Option<&DOMNode> {
        self.nodes.get(id.0)
    }

    /// Number of nodes in the arena, attached or not
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

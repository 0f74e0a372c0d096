//! Translation of a [`Document`] tree into a [`JsonValue`] tree

use html::{DOMElement, DOMNodeType, Document, NodeId};
use std::slice;
use tracing::{debug, span, trace, Level};

use crate::config::{
    ClassAttributeHandling, Configuration, EmptyTextNodeHandling, NullValueHandling,
    TextNodeFormat,
};
use crate::error::{Error, Result};
use crate::json::{JsonObject, JsonValue};

/// An element whose children are still being transformed
struct Frame<'d> {
    object: JsonObject,
    children: Vec<JsonValue>,
    remaining: slice::Iter<'d, NodeId>,
    depth: usize,
}

enum Visit<'d> {
    /// A finished value, or `None` for a text node that is dropped
    Leaf(Option<JsonValue>),
    Element(Frame<'d>),
}

/// Walks a document and builds its JSON form according to a validated [`Configuration`]
#[derive(Debug, Clone)]
pub struct Transformer {
    config: Configuration,
}

impl Transformer {
    pub fn new(config: Configuration) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Transform the document starting from its root
    pub fn transform(&self, document: &Document) -> Result<JsonValue> {
        let root = document.root().ok_or(Error::EmptyInput)?;
        self.transform_node(document, root)
    }

    /// Transform the subtree below `root`.
    ///
    /// The walk is a pre-order traversal driven by an explicit stack, so the native stack
    /// does not grow with the tree. Every node may be visited once; reaching a node a second
    /// time means the child links form a cycle or share a node, and the walk stops.
    pub fn transform_node(&self, document: &Document, root: NodeId) -> Result<JsonValue> {
        let span = span!(Level::DEBUG, "Transforming tree", %root);
        let _enter = span.enter();

        let mut visited = vec![false; document.len()];
        let mut stack = match self.visit(document, root, 0, &mut visited, true)? {
            Visit::Leaf(value) => return Ok(value.unwrap_or(JsonValue::Null)),
            Visit::Element(frame) => vec![frame],
        };

        while let Some(mut frame) = stack.pop() {
            match frame.remaining.next() {
                Some(&child) => {
                    let depth = frame.depth + 1;
                    match self.visit(document, child, depth, &mut visited, false)? {
                        Visit::Leaf(value) => {
                            frame.children.extend(value);
                            stack.push(frame);
                        }
                        Visit::Element(next) => {
                            stack.push(frame);
                            stack.push(next);
                        }
                    }
                }
                None => {
                    let value = self.finish(frame);
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(value),
                        None => {
                            debug!(
                                nodes = visited.iter().filter(|v| **v).count(),
                                "Transformed tree"
                            );
                            return Ok(value);
                        }
                    }
                }
            }
        }
        unreachable!("the root frame returns before the stack empties")
    }

    fn visit<'d>(
        &self,
        document: &'d Document,
        id: NodeId,
        depth: usize,
        visited: &mut [bool],
        is_root: bool,
    ) -> Result<Visit<'d>> {
        let node = document.get(id).ok_or(Error::MalformedTree {
            node: id,
            reason: "child refers to a node that does not exist",
        })?;
        if std::mem::replace(&mut visited[id.0], true) {
            return Err(Error::MalformedTree {
                node: id,
                reason: "node is reachable more than once",
            });
        }
        if depth > self.config.max_depth {
            return Err(Error::DepthLimitExceeded(self.config.max_depth));
        }
        trace!(node = %id, depth, "Visiting");

        match &node.node_type {
            DOMNodeType::Text(text) => {
                if !node.children.is_empty() {
                    return Err(Error::MalformedTree {
                        node: id,
                        reason: "text node has children",
                    });
                }
                Ok(Visit::Leaf(self.text(text, is_root)))
            }
            DOMNodeType::Element(element) => Ok(Visit::Element(Frame {
                object: self.open_element(element),
                children: Vec::with_capacity(node.children.len()),
                remaining: node.children.iter(),
                depth,
            })),
        }
    }

    fn text(&self, text: &str, is_root: bool) -> Option<JsonValue> {
        if !is_root
            && self.config.empty_text_nodes == EmptyTextNodeHandling::Ignore
            && text.trim().is_empty()
        {
            return None;
        }
        let text = if self.config.trim_whitespace {
            text.trim()
        } else {
            text
        };
        Some(match self.config.text_nodes {
            TextNodeFormat::String => text.into(),
            TextNodeFormat::Object => {
                let mut object = JsonObject::new();
                object.insert(self.config.text_key.as_str(), text);
                object.into()
            }
        })
    }

    /// The tag and attribute entries of an element's object; children are added by [`Self::finish`]
    fn open_element(&self, element: &DOMElement) -> JsonObject {
        let mut object = JsonObject::new();
        object.insert(self.config.tag_key.as_str(), element.tag_name.as_str());
        if !self.config.include_attributes {
            return object;
        }
        if element.attributes.is_empty() {
            if self.config.null_values == NullValueHandling::Include {
                object.insert(self.config.attributes_key.as_str(), JsonValue::Null);
            }
            return object;
        }
        let attributes: JsonObject = element
            .attributes
            .iter()
            .map(|(name, value)| {
                let value = match self.config.class_attribute {
                    ClassAttributeHandling::Array if name == "class" => JsonValue::Array(
                        value.split_whitespace().map(JsonValue::from).collect(),
                    ),
                    _ => value.into(),
                };
                (name, value)
            })
            .collect();
        object.insert(self.config.attributes_key.as_str(), attributes);
        object
    }

    fn finish(&self, frame: Frame) -> JsonValue {
        let Frame {
            mut object,
            children,
            ..
        } = frame;
        object.insert(self.config.children_key.as_str(), children);
        object.into()
    }
}

/// Transform `document` from its root using `config`
pub fn transform(document: &Document, config: &Configuration) -> Result<JsonValue> {
    Transformer::new(config.clone())?.transform(document)
}

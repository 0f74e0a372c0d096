use crate::error::{Error, Result};

/// Whether text nodes holding only whitespace appear in the output
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum EmptyTextNodeHandling {
    #[default]
    Ignore,
    Include,
}

/// Shape of an emitted text node
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum TextNodeFormat {
    /// `{"text": "..."}`
    #[default]
    Object,
    /// A bare JSON string
    String,
}

/// How the `class` attribute value is emitted
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum ClassAttributeHandling {
    #[default]
    String,
    /// Split on whitespace into an array of class names
    Array,
}

/// Whether absent values are omitted or written as `null`
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum NullValueHandling {
    #[default]
    Ignore,
    Include,
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum OutputFormat {
    #[default]
    Compact,
    Indented,
}

/// Options controlling the shape of the JSON produced from a document.
///
/// Every call receives its configuration explicitly; nothing is read from globals.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Configuration {
    pub include_attributes: bool,
    pub trim_whitespace: bool,
    pub tag_key: String,
    pub children_key: String,
    pub text_key: String,
    pub attributes_key: String,
    pub empty_text_nodes: EmptyTextNodeHandling,
    pub text_nodes: TextNodeFormat,
    pub class_attribute: ClassAttributeHandling,
    pub null_values: NullValueHandling,
    pub output: OutputFormat,
    /// Deepest node allowed below the root (the root is at depth 0)
    pub max_depth: usize,
}

/// Largest accepted `max_depth`. Serializing and dropping a [`JsonValue`](crate::JsonValue)
/// recurse once per level, so deeper output could exhaust the stack.
pub const MAX_DEPTH_LIMIT: usize = html::MAX_NESTING;

pub const DEFAULT_MAX_DEPTH: usize = MAX_DEPTH_LIMIT;

impl Default for Configuration {
    fn default() -> Self {
        Self {
            include_attributes: true,
            trim_whitespace: true,
            tag_key: "tag".into(),
            children_key: "children".into(),
            text_key: "text".into(),
            attributes_key: "attributes".into(),
            empty_text_nodes: EmptyTextNodeHandling::default(),
            text_nodes: TextNodeFormat::default(),
            class_attribute: ClassAttributeHandling::default(),
            null_values: NullValueHandling::default(),
            output: OutputFormat::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Configuration {
    /// Checks that the reserved keys are non-empty and pairwise distinct.
    ///
    /// The attributes key only takes part when attributes are emitted.
    pub fn validate(&self) -> Result<()> {
        let mut keys = vec![
            ("tag", &self.tag_key),
            ("children", &self.children_key),
            ("text", &self.text_key),
        ];
        if self.include_attributes {
            keys.push(("attributes", &self.attributes_key));
        }
        for (i, (name, key)) in keys.iter().enumerate() {
            if key.is_empty() {
                return Err(Error::InvalidConfiguration(format!("{} key is empty", name)));
            }
            if let Some((other, _)) = keys[..i].iter().find(|(_, k)| k == key) {
                return Err(Error::InvalidConfiguration(format!(
                    "{} key and {} key are both {:?}",
                    other, name, key
                )));
            }
        }
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(Error::InvalidConfiguration(format!(
                "max depth must be between 1 and {}",
                MAX_DEPTH_LIMIT
            )));
        }
        Ok(())
    }
}

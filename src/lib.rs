//! Conversion of HTML documents into JSON that mirrors their tree structure.
//!
//! ```text
//! HTML text --html::parse--> Document --Transformer--> JsonValue --json::to_string--> JSON text
//! ```

use tracing::{span, Level};

/// Options for the shape of the output
pub mod config;
pub mod error;
/// Order-preserving JSON model and serialization
pub mod json;
/// Translation of a parsed document into [`JsonValue`]
pub mod transform;

pub use config::Configuration;
pub use error::{Error, Result};
pub use json::{JsonObject, JsonValue};
pub use transform::{transform, Transformer};

/// A reusable converter holding a validated [`Configuration`]
#[derive(Debug, Clone)]
pub struct Jsonizer {
    transformer: Transformer,
}

impl Jsonizer {
    pub fn new(config: Configuration) -> Result<Self> {
        Ok(Self {
            transformer: Transformer::new(config)?,
        })
    }

    pub fn config(&self) -> &Configuration {
        self.transformer.config()
    }

    /// Parse `html` and return its JSON form as a value
    pub fn parse(&self, html: &str) -> Result<JsonValue> {
        let document = html::parse(html)?;
        self.transformer.transform(&document)
    }

    /// Parse `html` and return its JSON form as text
    pub fn parse_to_string(&self, html: &str) -> Result<String> {
        let span = span!(Level::DEBUG, "Jsonizing", bytes = html.len());
        let _enter = span.enter();
        let value = self.parse(html)?;
        json::to_string(&value, self.config().output)
    }
}

/// Parse `html`, transform it with `config` and serialize the result
pub fn parse_to_json_string(html: &str, config: &Configuration) -> Result<String> {
    Jsonizer::new(config.clone())?.parse_to_string(html)
}

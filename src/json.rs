//! In-memory JSON model whose objects keep their insertion order.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use tracing::{span, Level};

use crate::config::OutputFormat;
use crate::error::Result;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum JsonValue {
    Object(JsonObject),
    Array(Vec<JsonValue>),
    String(String),
    Null,
}

impl JsonValue {
    pub fn as_object(&self) -> Option<&JsonObject> {
        match self {
            JsonValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[JsonValue]> {
        match self {
            JsonValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsonValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<String> for JsonValue {
    fn from(s: String) -> Self {
        JsonValue::String(s)
    }
}

impl From<&str> for JsonValue {
    fn from(s: &str) -> Self {
        JsonValue::String(s.to_string())
    }
}

impl From<JsonObject> for JsonValue {
    fn from(obj: JsonObject) -> Self {
        JsonValue::Object(obj)
    }
}

impl From<Vec<JsonValue>> for JsonValue {
    fn from(items: Vec<JsonValue>) -> Self {
        JsonValue::Array(items)
    }
}

/// A JSON object as an ordered list of entries
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct JsonObject(Vec<(String, JsonValue)>);

impl JsonObject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry. An existing key keeps its position and takes the new value.
    ///
    /// Scans the existing entries; build large objects with `collect` instead.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<JsonValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &JsonValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Later duplicates replace the value of the first occurrence in place, like repeated
/// [`JsonObject::insert`] but in linear time.
impl<K: Into<String>, V: Into<JsonValue>> FromIterator<(K, V)> for JsonObject {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut entries: Vec<(String, JsonValue)> = Vec::new();
        for (k, v) in iter {
            let key = k.into();
            let value = v.into();
            match index.get(&key) {
                Some(&i) => entries[i].1 = value,
                None => {
                    index.insert(key.clone(), entries.len());
                    entries.push((key, value));
                }
            }
        }
        Self(entries)
    }
}

impl Serialize for JsonObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl Serialize for JsonValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            JsonValue::Object(obj) => obj.serialize(serializer),
            JsonValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            JsonValue::String(s) => serializer.serialize_str(s),
            JsonValue::Null => serializer.serialize_unit(),
        }
    }
}

/// Serialize to JSON text, keeping object keys in insertion order
pub fn to_string(value: &JsonValue, format: OutputFormat) -> Result<String> {
    let span = span!(Level::DEBUG, "Serializing JSON");
    let _enter = span.enter();
    let text = match format {
        OutputFormat::Compact => serde_json::to_string(value)?,
        OutputFormat::Indented => serde_json::to_string_pretty(value)?,
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> JsonValue {
        let mut attrs = JsonObject::new();
        attrs.insert("zeta", "1");
        attrs.insert("alpha", "2");
        let mut obj = JsonObject::new();
        obj.insert("tag", "a");
        obj.insert("attributes", attrs);
        obj.insert("nothing", JsonValue::Null);
        obj.insert("children", vec![JsonValue::from("x \"quoted\"\n")]);
        obj.into()
    }

    #[test]
    fn test_compact_keeps_insertion_order() {
        assert_eq!(
            to_string(&sample(), OutputFormat::Compact).unwrap(),
            r#"{"tag":"a","attributes":{"zeta":"1","alpha":"2"},"nothing":null,"children":["x \"quoted\"\n"]}"#
        );
    }

    #[test]
    fn test_indented() {
        let mut obj = JsonObject::new();
        obj.insert("tag", "p");
        obj.insert("children", Vec::<JsonValue>::new());
        assert_eq!(
            to_string(&obj.into(), OutputFormat::Indented).unwrap(),
            "{\n  \"tag\": \"p\",\n  \"children\": []\n}"
        );
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut obj = JsonObject::new();
        obj.insert("a", "1");
        obj.insert("b", "2");
        obj.insert("a", "3");
        assert_eq!(obj.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(obj.get("a"), Some(&JsonValue::from("3")));
        assert_eq!(obj.len(), 2);
        assert_eq!(
            obj.iter().collect::<Vec<_>>(),
            vec![("a", &JsonValue::from("3")), ("b", &JsonValue::from("2"))]
        );
    }

    #[test]
    fn test_collect_matches_insert() {
        let entries: Vec<(String, String)> = (0..20_000)
            .map(|i| (format!("k{}", i), i.to_string()))
            .chain([("k7".to_string(), "late".to_string())])
            .collect();
        let collected: JsonObject = entries.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        assert_eq!(collected.len(), 20_000);
        assert_eq!(collected.keys().nth(7), Some("k7"));
        assert_eq!(collected.get("k7"), Some(&JsonValue::from("late")));

        let mut inserted = JsonObject::new();
        for (k, v) in entries.iter().take(100).chain(entries.last()) {
            inserted.insert(k.as_str(), v.as_str());
        }
        let small: JsonObject = entries.iter().take(100).chain(entries.last()).cloned().collect();
        assert_eq!(small, inserted);
    }

    #[test]
    fn test_parses_back() {
        let text = to_string(&sample(), OutputFormat::Compact).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["attributes"]["alpha"], "2");
        assert_eq!(value["children"][0], "x \"quoted\"\n");
        assert!(value["nothing"].is_null());
    }
}

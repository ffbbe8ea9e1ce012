//! Dot-notation JSON document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON object addressed by dot-notation keys.
///
/// `get("dashboard.layout")` walks nested objects; `set` creates
/// intermediate objects as needed, replacing any non-object value in the
/// way (the document is last-writer-wins, there is nothing to merge).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    root: Map<String, Value>,
}

impl Document {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON value, if it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(root) => Some(Self { root }),
            _ => None,
        }
    }

    /// Returns the document as a JSON value.
    pub fn to_value(&self) -> Value {
        Value::Object(self.root.clone())
    }

    /// Returns `true` if the document has no keys.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Reads the value at a dot-notation key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut current: &Map<String, Value> = &self.root;
        let mut parts = key.split('.').peekable();
        while let Some(part) = parts.next() {
            let value = current.get(part)?;
            if parts.peek().is_none() {
                return Some(value);
            }
            current = value.as_object()?;
        }
        None
    }

    /// Returns `true` if a value exists at the key.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Writes a value at a dot-notation key, creating intermediate
    /// objects as needed.
    pub fn set(&mut self, key: &str, value: Value) {
        let mut current: &mut Map<String, Value> = &mut self.root;
        let mut parts = key.split('.').peekable();
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                current.insert(part.to_string(), value);
                return;
            }
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = entry.as_object_mut().expect("just ensured an object");
        }
    }

    /// Removes and returns the value at a dot-notation key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        match key.rsplit_once('.') {
            None => self.root.remove(key),
            Some((parent, leaf)) => {
                let mut current: &mut Map<String, Value> = &mut self.root;
                for part in parent.split('.') {
                    current = current.get_mut(part)?.as_object_mut()?;
                }
                current.remove(leaf)
            }
        }
    }
}

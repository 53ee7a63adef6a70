//! Ordered output tree with lazy creation of nested maps.

use crate::error::Error;
use crate::value::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    root: Map,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.root.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    pub fn pointer(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        self.root.get(*first)?.pointer(rest)
    }

    /// Returns the map at `path`, creating every missing level on the way.
    ///
    /// Existing maps are reused, so keys keep their first-insertion position.
    /// A non-map value sitting on the path is replaced by an empty map.
    pub fn get_or_create<S: AsRef<str>>(&mut self, path: &[S]) -> &mut Map {
        let mut node = &mut self.root;
        for key in path {
            let slot = node
                .entry(key.as_ref().to_string())
                .or_insert_with(Value::empty_object);
            node = ensure_object(slot);
        }
        node
    }

    /// Replaces whatever lives under `key` with a fresh empty map.
    pub fn reset(&mut self, key: &str) -> &mut Map {
        self.root.insert(key.to_string(), Value::empty_object());
        self.get_or_create(&[key])
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.root)
    }

    pub fn to_json_string(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(&self.root)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(&self.root)?)
    }
}

fn ensure_object(slot: &mut Value) -> &mut Map {
    if !matches!(slot, Value::Object(_)) {
        *slot = Value::empty_object();
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!("slot holds an object"),
    }
}

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::Error;

/// Ordered object type. Keys render in insertion order.
pub type Map = IndexMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    String(String),
    Array(Vec<Value>),
    Object(Map),
}

impl Value {
    pub fn empty_array() -> Self {
        Self::Array(Vec::new())
    }

    pub fn empty_object() -> Self {
        Self::Object(Map::new())
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a nested value by object keys.
    pub fn pointer(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(self, |node, key| node.as_object()?.get(*key))
    }

    pub fn to_json_string(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Renders with two-space indentation.
    pub fn to_json_pretty(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<String>> for Value {
    fn from(values: Vec<String>) -> Self {
        Self::Array(values.into_iter().map(Self::String).collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::value::{Map, Value};

    #[test]
    fn renders_objects_in_insertion_order() {
        let mut map = Map::new();
        map.insert("zeta".to_string(), Value::from("1"));
        map.insert("alpha".to_string(), Value::from(vec!["a".to_string()]));
        map.insert("mid".to_string(), Value::Null);

        let rendered = Value::Object(map)
            .to_json_string()
            .expect("value should render");
        assert_eq!(rendered, r#"{"zeta":"1","alpha":["a"],"mid":null}"#);
    }

    #[test]
    fn pretty_rendering_uses_two_space_indent() {
        let mut map = Map::new();
        map.insert("run".to_string(), Value::from(vec!["echo \"hi\"".to_string()]));

        let rendered = Value::Object(map)
            .to_json_pretty()
            .expect("value should render");
        assert_eq!(rendered, "{\n  \"run\": [\n    \"echo \\\"hi\\\"\"\n  ]\n}");
    }

    #[test]
    fn pointer_walks_nested_objects() {
        let mut user = Map::new();
        user.insert("entrypoint".to_string(), Value::from("app"));
        let mut root = Map::new();
        root.insert("root".to_string(), Value::Object(user));
        let value = Value::Object(root);

        assert_eq!(
            value.pointer(&["root", "entrypoint"]).and_then(Value::as_str),
            Some("app")
        );
        assert!(value.pointer(&["root", "entrypoint", "deeper"]).is_none());
        assert_eq!(value.pointer(&[]), Some(&value));
    }
}

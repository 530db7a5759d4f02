//! Ordered string property bags attached to groups, graphs and nodes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// An insertion-ordered `key -> value` map of display strings.
///
/// Setting a key that already exists overwrites the value but keeps the
/// key's original position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(IndexMap<String, String>);

impl Properties {
    pub fn new() -> Self {
        Properties(IndexMap::new())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (k, v) in iter {
            props.set(k, v);
        }
        props
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_keeps_position() {
        let mut props = Properties::new();
        props.set("a", "1");
        props.set("b", "2");
        props.set("a", "3");

        let pairs: Vec<_> = props.iter().collect();
        assert_eq!(pairs, vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn missing_key_is_none() {
        let props: Properties = [("name", "Foo")].into_iter().collect();
        assert_eq!(props.get("name"), Some("Foo"));
        assert_eq!(props.get("other"), None);
        assert!(!props.contains("other"));
    }

    #[test]
    fn serializes_as_plain_map() {
        let props: Properties = [("x", "1")].into_iter().collect();
        assert_eq!(serde_json::to_string(&props).unwrap(), r#"{"x":"1"}"#);
    }
}

//! Row value abstraction and row identity.
//!
//! The body engine never looks inside a row except through [`RowValue`]:
//! attribute lookup (for keys and cells) and nested children (for tree mode).
//! Row identity is a [`RowKey`], produced by a [`KeyAccessor`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Attribute that carries nested rows when tree mode is enabled.
pub const CHILDREN_ATTR: &str = "children";

/// Trait for accessing application row data.
///
/// Implementations must be cheap to query; the flattener calls `children()`
/// once per visited row on every pass.
pub trait RowValue: Clone + PartialEq {
    /// Returns the attribute value at `name`. Dotted names address nested
    /// attributes (`"address.city"`).
    fn attr(&self, name: &str) -> Option<Value>;

    /// Returns the nested rows, or `None` when the row has no usable
    /// `children` sequence.
    fn children(&self) -> Option<&[Self]>;

    /// True when the row carries a `children` attribute that is not a
    /// sequence. Such rows are treated as leaves.
    fn has_malformed_children(&self) -> bool {
        false
    }
}

impl RowValue for Value {
    fn attr(&self, name: &str) -> Option<Value> {
        if !name.contains('.') {
            return self.get(name).cloned();
        }
        let mut current = self;
        for segment in name.split('.') {
            current = current.get(segment)?;
        }
        Some(current.clone())
    }

    fn children(&self) -> Option<&[Self]> {
        self.get(CHILDREN_ATTR)?.as_array().map(Vec::as_slice)
    }

    fn has_malformed_children(&self) -> bool {
        matches!(self.get(CHILDREN_ATTR), Some(v) if !v.is_array() && !v.is_null())
    }
}

/// Identity of one row across recomputation passes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowKey(String);

impl RowKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key derived from the row's position in the forest (`#0/2/1`).
    pub fn positional(path: &[usize]) -> Self {
        let mut key = String::with_capacity(1 + path.len() * 3);
        key.push('#');
        for (i, index) in path.iter().enumerate() {
            if i > 0 {
                key.push('/');
            }
            key.push_str(&index.to_string());
        }
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for RowKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Derives [`RowKey`]s from rows.
///
/// With a key attribute configured, the key is the attribute's value; rows
/// without that attribute (and every row when no attribute is configured)
/// fall back to a positional key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyAccessor {
    attr: Option<String>,
}

impl KeyAccessor {
    pub fn new(attr: Option<String>) -> Self {
        Self { attr }
    }

    pub fn by_attr(attr: impl Into<String>) -> Self {
        Self { attr: Some(attr.into()) }
    }

    pub fn positional() -> Self {
        Self { attr: None }
    }

    pub fn attr_name(&self) -> Option<&str> {
        self.attr.as_deref()
    }

    /// Returns the key for `row` located at `path` in the forest.
    pub fn key_for<R: RowValue>(&self, row: &R, path: &[usize]) -> RowKey {
        self.attr_key(row).unwrap_or_else(|| RowKey::positional(path))
    }

    /// Returns the key carried by the row itself, if any.
    pub fn attr_key<R: RowValue>(&self, row: &R) -> Option<RowKey> {
        let attr = self.attr.as_deref()?;
        row.attr(attr).as_ref().and_then(key_text).map(RowKey)
    }
}

fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Array(_) | Value::Object(_) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_children_of_json_row() {
        let row = json!({"id": 1, "children": [{"id": 2}, {"id": 3}]});
        assert_eq!(row.children().map(|c| c.len()), Some(2));
        assert!(!row.has_malformed_children());
    }

    #[test]
    fn test_non_array_children_is_leaf() {
        let row = json!({"id": 1, "children": "oops"});
        assert!(row.children().is_none());
        assert!(row.has_malformed_children());

        let null_children = json!({"id": 1, "children": null});
        assert!(null_children.children().is_none());
        assert!(!null_children.has_malformed_children());
    }

    #[test]
    fn test_dotted_attr() {
        let row = json!({"address": {"city": "Oslo"}});
        assert_eq!(row.attr("address.city"), Some(json!("Oslo")));
        assert_eq!(row.attr("address.zip"), None);
    }

    #[test]
    fn test_key_accessor_attr_and_fallback() {
        let keys = KeyAccessor::by_attr("id");
        assert_eq!(keys.key_for(&json!({"id": "a"}), &[0]), RowKey::from("a"));
        assert_eq!(keys.key_for(&json!({"id": 42}), &[0]), RowKey::from("42"));
        assert_eq!(keys.key_for(&json!({"name": "x"}), &[3, 1]), RowKey::from("#3/1"));
    }

    #[test]
    fn test_positional_key() {
        let keys = KeyAccessor::positional();
        assert_eq!(keys.key_for(&json!({"id": "a"}), &[0, 2, 1]).as_str(), "#0/2/1");
    }
}

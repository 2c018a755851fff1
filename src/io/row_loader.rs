//! Loading row data from JSON.
//!
//! Accepts either a top-level array of rows or an object with a `rows`
//! array.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::path::Path;

/// Parses rows from a JSON document.
pub fn load_rows_from_str(json: &str) -> Result<Vec<Value>> {
    let document: Value = serde_json::from_str(json).context("Failed to parse row data")?;
    match document {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut object) => match object.remove("rows") {
            Some(Value::Array(rows)) => Ok(rows),
            Some(other) => bail!("`rows` must be an array, found {}", type_name(&other)),
            None => bail!("Row data object has no `rows` array"),
        },
        other => bail!("Row data must be an array or an object, found {}", type_name(&other)),
    }
}

/// Reads and parses rows from a JSON file.
pub fn load_rows_from_file(path: impl AsRef<Path>) -> Result<Vec<Value>> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read row data {}", path.display()))?;
    load_rows_from_str(&json).with_context(|| format!("Invalid row data in {}", path.display()))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    #[test]
    fn test_top_level_array() {
        let rows = load_rows_from_str(r#"[{"id": 1}, {"id": 2}]"#).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_rows_object() {
        let rows = load_rows_from_str(r#"{"rows": [{"id": 1}]}"#).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_rejects_scalars() {
        let err = load_rows_from_str("42").unwrap_err();
        assert!(err.to_string().contains("a number"));
        assert!(load_rows_from_str(r#"{"rows": "x"}"#).is_err());
        assert!(load_rows_from_str(r#"{"data": []}"#).is_err());
        assert!(load_rows_from_str("not json").is_err());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let path = env::temp_dir().join("rtbody_rows_test.json");
        fs::write(&path, r#"[{"id": "a", "children": [{"id": "b"}]}]"#)?;
        let rows = load_rows_from_file(&path)?;
        assert_eq!(rows.len(), 1);
        fs::remove_file(&path)?;
        Ok(())
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = load_rows_from_file("/definitely/not/here.json").unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }
}

//! The one thread metadata key the workspace core owns.

use agentdesk_files::{WorkspaceError, WorkspaceResult};
use serde_json::{Map, Value};
use tracing::warn;

pub const WORKSPACE_PATH_KEY: &str = "workspacePath";

/// Parse stored metadata. Absent or blank metadata is an empty object.
fn parse_object(metadata: Option<&str>) -> WorkspaceResult<Map<String, Value>> {
    let raw = match metadata.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw,
        _ => return Ok(Map::new()),
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(WorkspaceError::InvalidMetadata(format!(
            "expected an object, found {}",
            json_kind(&other)
        ))),
        Err(e) => Err(WorkspaceError::InvalidMetadata(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// `workspacePath` from thread metadata, if set to a non-empty string.
///
/// Unreadable metadata reads as unbound.
pub fn workspace_path(metadata: Option<&str>) -> Option<String> {
    let mut map = match parse_object(metadata) {
        Ok(map) => map,
        Err(e) => {
            warn!("Ignoring thread metadata: {}", e);
            return None;
        }
    };
    match map.remove(WORKSPACE_PATH_KEY) {
        Some(Value::String(path)) if !path.trim().is_empty() => Some(path),
        _ => None,
    }
}

/// Metadata with `workspacePath` replaced and every other key kept.
///
/// Fails with `InvalidMetadata` rather than overwrite metadata that is not a
/// JSON object.
pub fn with_workspace_path(metadata: Option<&str>, path: Option<&str>) -> WorkspaceResult<String> {
    let mut map = parse_object(metadata)?;
    let value = match path {
        Some(path) => Value::String(path.to_string()),
        None => Value::Null,
    };
    map.insert(WORKSPACE_PATH_KEY.to_string(), value);
    Ok(Value::Object(map).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parsed(metadata: &str) -> Value {
        serde_json::from_str(metadata).unwrap()
    }

    #[test]
    fn test_workspace_path_lookup() {
        assert_eq!(
            workspace_path(Some(r#"{"workspacePath":"/p","x":1}"#)),
            Some("/p".to_string())
        );
        assert_eq!(workspace_path(Some(r#"{"workspacePath":null}"#)), None);
        assert_eq!(workspace_path(Some(r#"{"workspacePath":""}"#)), None);
        assert_eq!(workspace_path(Some("[1,2]")), None);
        assert_eq!(workspace_path(Some("not json")), None);
        assert_eq!(workspace_path(None), None);
    }

    #[test]
    fn test_merge_preserves_other_keys() {
        let merged =
            with_workspace_path(Some(r#"{"pinned":true,"tags":["a"]}"#), Some("/p")).unwrap();
        assert_eq!(
            parsed(&merged),
            json!({ "pinned": true, "tags": ["a"], "workspacePath": "/p" })
        );
    }

    #[test]
    fn test_unbind_writes_null() {
        let merged =
            with_workspace_path(Some(r#"{"workspacePath":"/p","pinned":true}"#), None).unwrap();
        assert_eq!(parsed(&merged), json!({ "workspacePath": null, "pinned": true }));
    }

    #[test]
    fn test_missing_metadata_starts_fresh() {
        let merged = with_workspace_path(None, Some("/p")).unwrap();
        assert_eq!(parsed(&merged), json!({ "workspacePath": "/p" }));

        let merged = with_workspace_path(Some("  "), Some("/p")).unwrap();
        assert_eq!(parsed(&merged), json!({ "workspacePath": "/p" }));
    }

    #[test]
    fn test_unreadable_metadata_is_rejected() {
        let err = with_workspace_path(Some(r#"{"messages":[1,2"#), Some("/p")).unwrap_err();
        assert_eq!(err.code(), "INVALID_METADATA");

        let err = with_workspace_path(Some("\"legacy\""), Some("/p")).unwrap_err();
        assert!(matches!(err, WorkspaceError::InvalidMetadata(_)));
    }
}

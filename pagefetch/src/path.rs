//! Dot-notation lookups into response bodies, i.e. `"paginationInfo.currentPage"`.
//!
//! Lookups are total: a missing segment, a non-container on the way or a
//! value of the wrong type all end in the caller's fallback.
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Walk `root` along `path`. Array elements are addressed by index
/// (`"records.0.id"`).
pub fn resolve<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let segments: Vec<&str> = path.split('.').collect();
    resolve_segments(root, &segments)
}

fn resolve_segments<'a>(value: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let Some((segment, rest)) = segments.split_first() else {
        return Some(value);
    };

    let next = match value {
        Value::Object(map) => map.get(*segment)?,
        Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
        _ => return None,
    };
    resolve_segments(next, rest)
}

/// Value at `path` converted to `T`, or `fallback`.
pub fn resolve_or<T: DeserializeOwned>(root: &Value, path: &str, fallback: T) -> T {
    resolve(root, path)
        .and_then(|value| T::deserialize(value).ok())
        .unwrap_or(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_nested() {
        let obj = json!({"a": {"b": 5}});
        assert_eq!(resolve_or(&obj, "a.b", 0), 5);
        assert_eq!(resolve_or(&obj, "a.c", 0), 0);
        assert_eq!(resolve_or(&obj, "x.y", -1), -1);
        assert_eq!(resolve(&obj, "a"), Some(&json!({"b": 5})));
    }

    #[test]
    fn test_resolve_malformed_root() {
        assert_eq!(resolve_or(&Value::Null, "a.b", 7), 7);
        assert_eq!(resolve_or(&json!(42), "a", 7), 7);
        assert_eq!(resolve_or(&json!("text"), "len", 7), 7);
    }

    #[test]
    fn test_resolve_through_scalar() {
        let obj = json!({"a": 1});
        assert_eq!(resolve(&obj, "a.b"), None);
    }

    #[test]
    fn test_resolve_array_index() {
        let obj = json!({"records": [{"id": 10}, {"id": 11}]});
        assert_eq!(resolve_or(&obj, "records.1.id", 0), 11);
        assert_eq!(resolve_or(&obj, "records.5.id", 0), 0);
        assert_eq!(resolve_or(&obj, "records.first.id", 0), 0);
    }

    #[test]
    fn test_resolve_wrong_type_uses_fallback() {
        let obj = json!({"paginationInfo": {"currentPage": "two", "totalPages": null}});
        assert_eq!(resolve_or(&obj, "paginationInfo.currentPage", 0u64), 0);
        assert_eq!(resolve_or(&obj, "paginationInfo.totalPages", 3u64), 3);
        // a null leaf is still a value when the caller asks for one
        assert_eq!(
            resolve_or(&obj, "paginationInfo.totalPages", json!(1)),
            Value::Null
        );
    }

    #[test]
    fn test_resolve_sequence() {
        let obj = json!({"records": [1, 2, 3]});
        let records: Vec<Value> = resolve_or(&obj, "records", Vec::new());
        assert_eq!(records, vec![json!(1), json!(2), json!(3)]);

        let missing: Vec<Value> = resolve_or(&obj, "items", Vec::new());
        assert!(missing.is_empty());
    }

    #[test]
    fn test_empty_path() {
        let obj = json!({"a": 1});
        assert_eq!(resolve(&obj, ""), None);
        assert_eq!(resolve(&json!({"": 2}), ""), Some(&json!(2)));
    }
}

use serde_json::Value;

/// Resolves a dotted path such as `user.org.id` against a request view.
///
/// Walks one segment at a time and stops at the first missing step. Objects
/// are indexed by key, arrays by numeric segment. A `null` leaf counts as
/// present; a `null` in the middle of the path does not.
pub fn extract_field<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    extract_segments(root, path.split('.'))
}

pub(crate) fn extract_segments<'a, 'p>(
    root: &'a Value,
    segments: impl IntoIterator<Item = &'p str>,
) -> Option<&'a Value> {
    segments
        .into_iter()
        .try_fold(root, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

/// Reads an identifier out of a request value. Strings must be non-empty;
/// numbers are rendered in decimal. Anything else is not an identifier.
pub fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walks_nested_objects() {
        let request = json!({"user": {"org": {"id": "o1"}}});

        assert_eq!(extract_field(&request, "user.org.id"), Some(&json!("o1")));
        assert_eq!(extract_field(&request, "user.org"), Some(&json!({"id": "o1"})));
    }

    #[test]
    fn missing_intermediate_is_silent() {
        let request = json!({"user": {"id": "u1"}});

        assert_eq!(extract_field(&request, "org.id"), None);
        assert_eq!(extract_field(&request, "user.id.length"), None);
    }

    #[test]
    fn null_leaf_is_present_but_null_intermediate_is_not() {
        let request = json!({"role": null, "org": null});

        assert_eq!(extract_field(&request, "role"), Some(&Value::Null));
        assert_eq!(extract_field(&request, "org.id"), None);
    }

    #[test]
    fn arrays_are_indexed_numerically() {
        let request = json!({"teams": [{"id": "t0"}, {"id": "t1"}]});

        assert_eq!(extract_field(&request, "teams.1.id"), Some(&json!("t1")));
        assert_eq!(extract_field(&request, "teams.first.id"), None);
        assert_eq!(extract_field(&request, "teams.7"), None);
    }

    #[test]
    fn ids_come_from_strings_and_numbers() {
        assert_eq!(value_as_id(&json!("u1")), Some("u1".to_string()));
        assert_eq!(value_as_id(&json!(42)), Some("42".to_string()));
        assert_eq!(value_as_id(&json!("")), None);
        assert_eq!(value_as_id(&json!(true)), None);
        assert_eq!(value_as_id(&Value::Null), None);
    }
}

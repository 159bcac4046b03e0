use serde_json::{Map, Value};

use super::extract::extract_field;

/// Key under which the subject id is always present in a built context.
pub const SUBJECT_CONTEXT_KEY: &str = "userId";

/// Builds the check context for one request.
///
/// Starts from `{userId: subject_id}` and copies every declared field that
/// resolves on `request` into the same dotted position, so `org.id` lands at
/// `{org: {id: ..}}`. Fields that do not resolve contribute nothing.
///
/// Paths are applied in declaration order and the last write wins: a scalar
/// standing where a later path needs an object is replaced by an object.
/// Paths rooted at [`SUBJECT_CONTEXT_KEY`] are ignored; the subject id is
/// never overwritten.
pub fn build_context<S: AsRef<str>>(request: &Value, subject_id: &str, fields: &[S]) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert(
        SUBJECT_CONTEXT_KEY.to_string(),
        Value::String(subject_id.to_string()),
    );

    for field in fields {
        let field = field.as_ref();
        if is_subject_rooted(field) {
            continue;
        }
        if let Some(value) = extract_field(request, field) {
            insert_path(&mut context, field, value.clone());
        }
    }

    context
}

/// True when `path` would write into the subject entry of a context.
pub(crate) fn is_subject_rooted(path: &str) -> bool {
    path.split('.').next() == Some(SUBJECT_CONTEXT_KEY)
}

fn insert_path(context: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split('.').collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut current = context;
    for segment in segments {
        let slot = current
            .entry(segment)
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        let Value::Object(next) = slot else {
            return;
        };
        current = next;
    }

    current.insert(leaf.to_string(), value);
}

//! Tri-state field patches.
//!
//! A partial update has to tell "not sent" apart from "sent as null":
//!
//! | wire             | patch            | effect on cached field |
//! |------------------|------------------|------------------------|
//! | key absent       | `None`           | keep                   |
//! | `null`           | `Some(None)`     | clear                  |
//! | value            | `Some(Some(v))`  | overwrite              |
//!
//! Serde models this with `serde_with::rust::double_option`.

use serde_json::{Map, Value};

/// A single field of a partial update.
pub type FieldPatch<T> = Option<Option<T>>;

/// Applies a patch to a nullable field.
pub fn apply_field<T: Clone>(target: &mut Option<T>, patch: &FieldPatch<T>) {
    if let Some(next) = patch {
        *target = next.clone();
    }
}

/// Applies a patch to a non-nullable field; explicit null resets to `T::default()`.
pub fn apply_field_or_default<T: Clone + Default>(target: &mut T, patch: &FieldPatch<T>) {
    if let Some(next) = patch {
        *target = next.clone().unwrap_or_default();
    }
}

/// Applies a patch to a structured (sub-record) field.
///
/// An object patch is overlaid onto the prior sub-record (or a default one)
/// so keys the patch omits survive; explicit null replaces outright.
pub fn merge_structured<R, P, F>(target: &mut Option<R>, patch: &FieldPatch<P>, overlay: F)
where
    R: Default,
    F: FnOnce(&mut R, &P),
{
    match patch {
        None => {}
        Some(None) => *target = None,
        Some(Some(incoming)) => {
            let mut base = target.take().unwrap_or_default();
            overlay(&mut base, incoming);
            *target = Some(base);
        }
    }
}

/// Reads a key from a raw object as a tri-state patch.
///
/// Values that fail `coerce` are dropped (treated as absent), never as null.
pub fn read_field<T>(
    object: &Map<String, Value>,
    key: &str,
    coerce: impl Fn(&Value) -> Option<T>,
) -> FieldPatch<T> {
    match object.get(key) {
        None => None,
        Some(Value::Null) => Some(None),
        Some(value) => coerce(value).map(Some),
    }
}

/// Like [`read_field`] but tries several key aliases in order.
pub fn read_field_any<T>(
    object: &Map<String, Value>,
    keys: &[&str],
    coerce: impl Fn(&Value) -> Option<T>,
) -> FieldPatch<T> {
    keys.iter()
        .find(|key| object.contains_key(**key))
        .and_then(|key| read_field(object, key, &coerce))
}

/// Deep-merges opaque JSON: objects merge key-by-key (incoming wins),
/// anything else replaces.
pub fn merge_json(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(patch)) => {
            for (key, value) in patch {
                match existing.get_mut(key) {
                    Some(slot) => merge_json(slot, value),
                    None => {
                        existing.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_apply_field_tri_state() {
        let mut field = Some(5);
        apply_field(&mut field, &None);
        assert_eq!(field, Some(5));
        apply_field(&mut field, &Some(Some(7)));
        assert_eq!(field, Some(7));
        apply_field(&mut field, &Some(None));
        assert_eq!(field, None);
    }

    #[test]
    fn test_read_field_distinguishes_null_and_absent() {
        let object = json!({"a": null, "b": "x", "c": 3});
        let object = object.as_object().unwrap();
        let as_str = |v: &Value| v.as_str().map(str::to_string);
        assert_eq!(read_field(object, "missing", as_str), None);
        assert_eq!(read_field(object, "a", as_str), Some(None));
        assert_eq!(read_field(object, "b", as_str), Some(Some("x".to_string())));
        // Coercion failure drops the field
        assert_eq!(read_field(object, "c", as_str), None);
    }

    #[test]
    fn test_read_field_any_prefers_first_alias() {
        let object = json!({"ticker_symbol": "SAP", "ticker": "SAP.DE"});
        let object = object.as_object().unwrap();
        let as_str = |v: &Value| v.as_str().map(str::to_string);
        assert_eq!(
            read_field_any(object, &["ticker", "ticker_symbol"], as_str),
            Some(Some("SAP.DE".to_string()))
        );
    }

    #[test]
    fn test_merge_json_deep() {
        let mut target = json!({"a": {"x": 1, "y": 2}, "b": 1});
        merge_json(&mut target, &json!({"a": {"y": 3}, "c": true}));
        assert_eq!(target, json!({"a": {"x": 1, "y": 3}, "b": 1, "c": true}));

        merge_json(&mut target, &json!("replaced"));
        assert_eq!(target, json!("replaced"));
    }
}

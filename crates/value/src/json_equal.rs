use crate::Value;

/// Structural equality between two document values.
///
/// - Numbers compare by value, strings by content; a number never equals a
///   string (`10 != "10"`).
/// - Arrays compare element by element, order matters.
/// - Objects compare by key set, key order does not matter.
/// - Containers backed by the same allocation are equal without being walked.
///
/// # Examples
///
/// ```
/// use json_patch_plus_value::{deep_equal, Value};
/// use serde_json::json;
///
/// let a = Value::from(json!({"foo": [1, 2, 3], "bar": null}));
/// let b = Value::from(json!({"bar": null, "foo": [1, 2, 3]}));
/// let c = Value::from(json!({"foo": [3, 2, 1], "bar": null}));
///
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&a, &c));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    if Value::ptr_eq(a, b) {
        return true;
    }
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,

        (Value::Array(arr_a), Value::Array(arr_b)) => {
            arr_a.len() == arr_b.len()
                && arr_a.iter().zip(arr_b.iter()).all(|(a, b)| deep_equal(a, b))
        }

        (Value::Object(obj_a), Value::Object(obj_b)) => {
            if obj_a.len() != obj_b.len() {
                return false;
            }
            obj_a.iter().all(|(key, val_a)| match obj_b.get(key) {
                Some(val_b) => deep_equal(val_a, val_b),
                None => false,
            })
        }

        // Different types are never equal
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        deep_equal(self, other)
    }
}

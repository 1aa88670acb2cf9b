use crate::{Map, Value};

/// Creates a deep clone of a document value.
///
/// Unlike [`Clone::clone`], which shares every container with the source,
/// this allocates fresh arrays, objects and strings all the way down.
///
/// # Examples
///
/// ```
/// use json_patch_plus_value::{deep_clone, Value};
/// use serde_json::json;
///
/// let original = Value::from(json!({"foo": [1, 2, 3]}));
/// let cloned = deep_clone(&original);
///
/// assert_eq!(original, cloned);
/// assert!(!Value::ptr_eq(&original, &cloned));
/// ```
pub fn deep_clone(value: &Value) -> Value {
    match value {
        Value::Null => Value::Null,
        Value::Bool(b) => Value::Bool(*b),
        Value::Number(n) => Value::Number(*n),
        Value::String(s) => Value::string(&**s),
        Value::Array(arr) => Value::array(arr.iter().map(deep_clone).collect()),
        Value::Object(obj) => {
            let mut new_obj = Map::with_capacity(obj.len());
            for (key, val) in obj.iter() {
                new_obj.insert(key.clone(), deep_clone(val));
            }
            Value::object(new_obj)
        }
    }
}

impl Value {
    /// See [`deep_clone`].
    pub fn deep_clone(&self) -> Value {
        deep_clone(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clone_scalars() {
        for j in [json!(null), json!(true), json!(42), json!(-1.5), json!("foo")] {
            let value = Value::from(j);
            assert_eq!(deep_clone(&value), value);
        }
    }

    #[test]
    fn clone_allocates_new_containers() {
        let value = Value::from(json!({"a": {"b": [1, {"c": "d"}]}}));
        let cloned = deep_clone(&value);
        assert_eq!(cloned, value);

        let inner_a = value.get("a").unwrap();
        let inner_b = cloned.get("a").unwrap();
        assert!(!Value::ptr_eq(inner_a, inner_b));
        assert!(!Value::ptr_eq(inner_a.get("b").unwrap(), inner_b.get("b").unwrap()));
    }

    #[test]
    fn clone_preserves_key_order() {
        let value = Value::from(json!({"z": 1, "a": 2, "m": 3}));
        let cloned = deep_clone(&value);
        let keys: Vec<&str> = cloned.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }
}

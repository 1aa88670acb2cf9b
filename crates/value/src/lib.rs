//! Document value model for json-patch-plus.
//!
//! [`Value`] is a JSON-shaped tree whose strings and containers are reference
//! counted. Cloning a value is O(1) and shares the whole subtree; mutable
//! access to a container goes through [`Rc::make_mut`], so a container is
//! duplicated only when somebody else still holds it. Patch application builds
//! on this to get copy-on-write along modified paths while every untouched
//! subtree stays shared with the original document.
//!
//! # Example
//!
//! ```
//! use json_patch_plus_value::Value;
//! use serde_json::json;
//!
//! let original = Value::from(json!({"a": {"b": 1}, "c": [1, 2]}));
//! let mut copy = original.clone();
//!
//! copy.as_object_mut().unwrap().insert("d".into(), Value::from(true));
//!
//! // The original is untouched, the untouched subtree is still shared.
//! assert_eq!(original.as_object().unwrap().len(), 2);
//! assert!(Value::ptr_eq(
//!     original.get("c").unwrap(),
//!     copy.get("c").unwrap(),
//! ));
//! ```

use std::rc::Rc;

pub mod json_clone;
pub mod json_equal;
pub mod serde_bridge;

pub use json_clone::deep_clone;
pub use json_equal::deep_equal;

/// Ordered object map; insertion order is preserved for round-trip fidelity.
pub type Map = indexmap::IndexMap<String, Value>;

/// A JSON document value.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Array(Rc<Vec<Value>>),
    Object(Rc<Map>),
}

impl Value {
    /// Builds a string value.
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    /// Builds an array value from owned elements.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(items))
    }

    /// Builds an object value from an owned map.
    pub fn object(map: Map) -> Self {
        Value::Object(Rc::new(map))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// A number with no fractional part.
    pub fn is_integer(&self) -> bool {
        match self {
            Value::Number(n) => n.is_finite() && n.trunc() == *n,
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Mutable access to an array, cloning the container first if it is shared.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(arr) => Some(Rc::make_mut(arr)),
            _ => None,
        }
    }

    /// Mutable access to an object, cloning the container first if it is shared.
    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Value::Object(map) => Some(Rc::make_mut(map)),
            _ => None,
        }
    }

    /// Object member lookup; `None` for non-objects.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Returns `true` if both values are containers (or strings) backed by the
    /// same allocation.
    pub fn ptr_eq(a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Runtime type name as used by `test_type`. Integers report `"number"`;
    /// see [`Value::is_integer`].
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    /// JavaScript-style truthiness: `null`, `false`, `0`, `NaN` and `""` are
    /// falsy, everything else (including empty containers) is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }

    /// `Some((map, text))` for an object shaped like `{"text": "...", ...}`.
    pub fn as_text_node(&self) -> Option<(&Map, &str)> {
        let map = self.as_object()?;
        let text = map.get("text")?.as_str()?;
        Some((map, text))
    }

    /// `Some((map, children))` for an object shaped like `{"children": [...], ...}`.
    pub fn as_element_node(&self) -> Option<(&Map, &Vec<Value>)> {
        let map = self.as_object()?;
        let children = map.get("children")?.as_array()?;
        Some((map, children))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Value::object(map)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::array(iter.into_iter().collect())
    }
}

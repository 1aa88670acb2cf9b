//! Tree navigation by path.
//!
//! [`find`] and [`get`] read. [`find_mut`] and [`find_parent_mut`] write
//! through `Rc::make_mut`, so every container on the walked path that is
//! shared with another tree is cloned before it is handed out, and nothing
//! else is.

use std::rc::Rc;

use json_patch_plus_value::Value;

use crate::{parse_index, ArrayIndex, JsonPointerError};

/// A reference to a (possibly missing) location in a document.
///
/// `obj` is the container holding the location and `key` the last path step;
/// both are `None` for the root. `val` is `None` when the container exists but
/// has nothing at `key` yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reference<'a> {
    pub val: Option<&'a Value>,
    pub obj: Option<&'a Value>,
    pub key: Option<&'a str>,
}

impl Reference<'_> {
    /// Check if this reference points into an array.
    pub fn is_array_reference(&self) -> bool {
        matches!(self.obj, Some(Value::Array(_)))
    }

    /// Check if this reference points into an object.
    pub fn is_object_reference(&self) -> bool {
        matches!(self.obj, Some(Value::Object(_)))
    }
}

fn child<'a>(container: &'a Value, step: &str) -> Result<&'a Value, JsonPointerError> {
    match container {
        Value::Object(map) => map.get(step).ok_or(JsonPointerError::NotFound),
        Value::Array(arr) => {
            let idx = parse_index(step, arr.len())?.element_position(arr.len())?;
            Ok(&arr[idx])
        }
        _ => Err(JsonPointerError::NotFound),
    }
}

fn child_mut<'a>(container: &'a mut Value, step: &str) -> Result<&'a mut Value, JsonPointerError> {
    match container {
        Value::Object(map) => {
            // Check before `make_mut` so a failed lookup never clones anything.
            if !map.contains_key(step) {
                return Err(JsonPointerError::NotFound);
            }
            Rc::make_mut(map)
                .get_mut(step)
                .ok_or(JsonPointerError::NotFound)
        }
        Value::Array(arr) => {
            let len = arr.len();
            let idx = parse_index(step, len)?.element_position(len)?;
            Ok(&mut Rc::make_mut(arr)[idx])
        }
        _ => Err(JsonPointerError::NotFound),
    }
}

/// Resolve `path` strictly.
///
/// # Errors
///
/// - `NotFound` - a key is missing or a step walks into a scalar
/// - `InvalidIndex` - a non-canonical array index (`01`, `1e0`, `x`)
/// - `IndexOutOfBounds` - an array index outside `[0, len - 1]`, or `-`
///
/// # Example
///
/// ```
/// use json_patch_plus_json_pointer::{find, parse_json_pointer, JsonPointerError};
/// use json_patch_plus_value::Value;
/// use serde_json::json;
///
/// let doc = Value::from(json!({"a": [10, 20]}));
/// assert_eq!(find(&doc, &parse_json_pointer("/a/1")), Ok(&Value::from(20)));
/// assert!(matches!(
///     find(&doc, &parse_json_pointer("/a/2")),
///     Err(JsonPointerError::IndexOutOfBounds { .. })
/// ));
/// ```
pub fn find<'a>(val: &'a Value, path: &[String]) -> Result<&'a Value, JsonPointerError> {
    path.iter().try_fold(val, |current, step| child(current, step))
}

/// Lenient lookup: `None` wherever [`find`] would fail.
pub fn get<'a>(val: &'a Value, path: &[String]) -> Option<&'a Value> {
    find(val, path).ok()
}

/// Resolve the container of the last step, allowing the last step itself to
/// be missing.
///
/// # Errors
///
/// Any error [`find`] reports for the parent path, plus `InvalidIndex` /
/// lower-bound errors for a malformed last step into an array. A last step
/// past the end of an array yields `val: None`, like a missing key.
pub fn find_reference<'a>(
    val: &'a Value,
    path: &'a [String],
) -> Result<Reference<'a>, JsonPointerError> {
    let Some((key, parent_path)) = path.split_last() else {
        return Ok(Reference {
            val: Some(val),
            obj: None,
            key: None,
        });
    };
    let obj = find(val, parent_path)?;
    let leaf = match obj {
        Value::Object(map) => map.get(key.as_str()),
        Value::Array(arr) => match parse_index(key, arr.len())? {
            ArrayIndex::At(idx) => arr.get(idx),
            ArrayIndex::End => None,
        },
        _ => return Err(JsonPointerError::NotFound),
    };
    Ok(Reference {
        val: leaf,
        obj: Some(obj),
        key: Some(key.as_str()),
    })
}

/// Mutable counterpart of [`find`], cloning shared containers on the way.
pub fn find_mut<'a>(val: &'a mut Value, path: &[String]) -> Result<&'a mut Value, JsonPointerError> {
    let mut current = val;
    for step in path {
        current = child_mut(current, step)?;
    }
    Ok(current)
}

/// Resolve the parent container of `path` for writing, returning it together
/// with the last path step.
///
/// # Errors
///
/// `NoParent` for the root path, otherwise whatever [`find_mut`] reports for
/// the parent path.
pub fn find_parent_mut<'a, 'p>(
    val: &'a mut Value,
    path: &'p [String],
) -> Result<(&'a mut Value, &'p str), JsonPointerError> {
    let (key, parent_path) = path.split_last().ok_or(JsonPointerError::NoParent)?;
    let parent = find_mut(val, parent_path)?;
    Ok((parent, key.as_str()))
}
